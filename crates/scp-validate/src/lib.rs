mod compare;
mod validator;

pub use compare::{compare_cluster_labels, compare_gene_names, compare_identifiers};
pub use validator::PortalFile;
