mod clusters;
mod deidentify;
mod subsample;
mod subset;

pub use clusters::{
    ClusterExtraction, ClusterGroup, Clusters, extract_clusters, merge_cluster_groups,
};
pub use deidentify::{Deidentified, deidentify};
pub use subsample::{subsample, subsample_with_rng};
pub use subset::subset;
