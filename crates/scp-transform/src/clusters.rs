use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::info;

use scp_ingest::TabularDocument;
use scp_model::{ColumnType, PortalError, Result};

/// Label groupings per group-typed column: column name → label → member
/// cells in row order. Insertion order is observable and preserved.
pub type Clusters = IndexMap<String, IndexMap<String, Vec<String>>>;

/// The groupings read from one metadata-shaped file, plus its cell list.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClusterExtraction {
    pub clusters: Clusters,
    pub cells: Vec<String>,
}

/// A named cluster group: groupings from its own cluster file and from the
/// shared metadata file.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterGroup {
    pub cells: Vec<String>,
    pub cluster_file: Clusters,
    pub metadata_file: Clusters,
}

/// Read the group-typed columns of a metadata-shaped file and build
/// label → member-cell groupings.
///
/// Rows whose label for a column is in `excluded_labels` are skipped for that
/// column. The cell list is collected exactly once, from the first group
/// column processed.
pub fn extract_clusters(
    path: &Path,
    delimiter: u8,
    excluded_labels: &[String],
) -> Result<ClusterExtraction> {
    let document = TabularDocument::new(path, delimiter);
    let mut rows = Vec::new();
    for record in document.records()? {
        rows.push(record?);
    }
    if rows.len() < 2 {
        return Err(PortalError::Format(format!(
            "{} is missing the name and type header rows",
            path.display()
        )));
    }
    let names = &rows[0];
    let types = &rows[1];

    let mut extraction = ClusterExtraction::default();
    let mut got_all_cells = false;
    for (column, token) in types.iter().enumerate() {
        if token.parse::<ColumnType>() != Ok(ColumnType::Group) {
            continue;
        }
        let name = names
            .get(column)
            .cloned()
            .unwrap_or_else(|| format!("column_{column}"));
        let labels = extraction.clusters.entry(name).or_default();
        for row in &rows[2..] {
            let Some(label) = row.get(column) else {
                continue;
            };
            let label = label.trim();
            if excluded_labels.iter().any(|excluded| excluded == label) {
                continue;
            }
            let Some(cell) = row.first() else {
                continue;
            };
            if !got_all_cells {
                extraction.cells.push(cell.clone());
            }
            labels
                .entry(label.to_string())
                .or_default()
                .push(cell.clone());
        }
        got_all_cells = true;
    }
    Ok(extraction)
}

/// Extract cluster groupings for each named group's own file and for the
/// shared metadata file, then apply the caller's label ordering.
///
/// With a non-empty `label_order`, every label mapping is rekeyed to that
/// order; a listed label absent from a mapping is an error. An empty order
/// leaves natural insertion order in place.
pub fn merge_cluster_groups(
    groups: &[(String, PathBuf)],
    metadata_path: &Path,
    delimiter: u8,
    excluded_labels: &[String],
    label_order: &[String],
) -> Result<IndexMap<String, ClusterGroup>> {
    let metadata = extract_clusters(metadata_path, delimiter, excluded_labels)?;

    let mut merged = IndexMap::new();
    for (group_name, path) in groups {
        info!("cluster group: {group_name}");
        let extraction = extract_clusters(path, delimiter, excluded_labels)?;
        let mut group = ClusterGroup {
            cells: extraction.cells,
            cluster_file: extraction.clusters,
            metadata_file: metadata.clusters.clone(),
        };
        info!("from metadata file:");
        order_labels(&mut group.metadata_file, label_order)?;
        info!("from cluster file:");
        order_labels(&mut group.cluster_file, label_order)?;
        merged.insert(group_name.clone(), group);
    }
    Ok(merged)
}

/// Rekey each label mapping to `ordered` and report per-label cell counts.
fn order_labels(clusters: &mut Clusters, ordered: &[String]) -> Result<()> {
    for (column, labels) in clusters.iter_mut() {
        if !ordered.is_empty() {
            let mut reordered = IndexMap::with_capacity(labels.len());
            for label in ordered {
                let cells = labels.shift_remove(label).ok_or_else(|| {
                    PortalError::Config(format!(
                        "ordered label \"{label}\" was not found in group column \"{column}\""
                    ))
                })?;
                reordered.insert(label.clone(), cells);
            }
            *labels = reordered;
        }
        for (label, cells) in labels.iter() {
            info!("cells in {column}/{label}: {}", cells.len());
        }
    }
    Ok(())
}
