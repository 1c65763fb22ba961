use std::collections::BTreeSet;

use tracing::{error, info};

use scp_model::{Result, ValidationIssue};

use crate::validator::PortalFile;

/// Compare the identifier sets of two files.
///
/// Reports a count mismatch and, separately, the identifiers unique to each
/// side. Neither file is mutated; findings are returned for the caller to
/// attach where it sees fit.
pub fn compare_identifiers(a: &PortalFile, b: &PortalFile) -> Vec<ValidationIssue> {
    info!(
        "comparing {} vs {}",
        a.path().display(),
        b.path().display()
    );
    let mut issues = Vec::new();
    let set_a: BTreeSet<&str> = a.identifiers().iter().map(String::as_str).collect();
    let set_b: BTreeSet<&str> = b.identifiers().iter().map(String::as_str).collect();
    // Counts compare distinct names; repeated occurrences are the per-file
    // duplicate check's finding, not a cross-file one.
    if set_a.len() != set_b.len() {
        let message = format!(
            "expected the same number of names in both files: {} had {} unique names, {} had {}",
            a.path().display(),
            set_a.len(),
            b.path().display(),
            set_b.len()
        );
        error!("{message}");
        issues.push(ValidationIssue::error(message));
    }
    for (own, other, file) in [(&set_a, &set_b, a), (&set_b, &set_a, b)] {
        let unique: Vec<&str> = own.difference(other).copied().collect();
        if !unique.is_empty() {
            let message = format!(
                "names unique to {}: {}",
                file.path().display(),
                unique.join(",")
            );
            error!("{message}");
            issues.push(ValidationIssue::error(message));
        }
    }
    issues
}

/// Every gene in a gene list must exist in the expression matrix.
pub fn compare_gene_names(
    gene_list: &PortalFile,
    expression: &PortalFile,
) -> Result<Vec<ValidationIssue>> {
    let expression_genes: BTreeSet<String> = expression.gene_names()?.into_iter().collect();
    let mut issues = Vec::new();
    for gene in gene_list.gene_names()? {
        if !expression_genes.contains(&gene) {
            let message = format!(
                "{gene} is a gene in the gene list file but was not found in the expression file"
            );
            error!("{message}");
            issues.push(ValidationIssue::error(message));
        }
    }
    Ok(issues)
}

/// Every group label named by a gene list header must exist among the
/// metadata file's group-column values.
pub fn compare_cluster_labels(
    gene_list: &PortalFile,
    metadata: &PortalFile,
) -> Result<Vec<ValidationIssue>> {
    let metadata_labels = metadata.group_labels()?;
    let mut issues = Vec::new();
    for label in gene_list.group_labels()? {
        if !metadata_labels.contains(&label) {
            let message = format!(
                "the group/cluster label {label} was not found in the metadata file"
            );
            error!("{message}");
            issues.push(ValidationIssue::error(message));
        }
    }
    Ok(issues)
}
