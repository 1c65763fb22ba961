//! Command implementations wiring the core crates to the CLI surface.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use scp_model::{FileKind, ValidationReport};
use scp_transform::{deidentify, merge_cluster_groups, subsample, subset};
use scp_validate::{
    PortalFile, compare_cluster_labels, compare_gene_names, compare_identifiers,
};

use crate::cli::{CheckArgs, ClustersArgs, DeidentifyArgs, SubsampleArgs, SubsetArgs};

#[derive(Serialize)]
struct CheckReportPayload<'a> {
    schema: &'static str,
    schema_version: u32,
    generated_at: String,
    files: Vec<&'a ValidationReport>,
    cross_file: &'a ValidationReport,
}

const REPORT_SCHEMA: &str = "scp-tools.check-report";
const REPORT_SCHEMA_VERSION: u32 = 1;

/// Validate every supplied file and cross-check identifiers between them.
/// Returns whether any error was found.
pub fn run_check(args: &CheckArgs) -> Result<bool> {
    let delimiter = args.delimiter.delimiter;
    let mut metadata = open_optional(FileKind::Metadata, args.metadata.as_ref(), delimiter)?;
    let mut coordinates = Vec::new();
    for path in &args.coordinates {
        coordinates.push(open_one(FileKind::Coordinates, path, delimiter)?);
    }
    let mut expression = open_optional(FileKind::Expression, args.expression.as_ref(), delimiter)?;
    let mut gene_lists = Vec::new();
    for path in &args.gene_lists {
        gene_lists.push(open_one(FileKind::GeneList, path, delimiter)?);
    }

    let mut has_errors = false;
    for file in metadata
        .iter_mut()
        .chain(coordinates.iter_mut())
        .chain(expression.iter_mut())
        .chain(gene_lists.iter_mut())
    {
        has_errors |= file.check()?;
    }

    if args.repair_expression
        && let Some(expression) = &expression
        && let Some(repaired) = expression.repair_expression_header()?
    {
        info!("wrote repaired expression matrix {}", repaired.display());
    }

    // Every pair of cell-bearing files must agree on its cell names.
    let mut cross_file = ValidationReport::new("cross-file");
    let cell_files: Vec<&PortalFile> = metadata
        .iter()
        .chain(coordinates.iter())
        .chain(expression.iter())
        .collect();
    for (index, left) in cell_files.iter().enumerate() {
        for right in &cell_files[index + 1..] {
            for issue in compare_identifiers(left, right) {
                cross_file.push(issue);
            }
        }
    }
    for gene_list in &gene_lists {
        if let Some(expression) = &expression {
            for issue in compare_gene_names(gene_list, expression)? {
                cross_file.push(issue);
            }
        }
        if let Some(metadata) = &metadata {
            for issue in compare_cluster_labels(gene_list, metadata)? {
                cross_file.push(issue);
            }
        }
    }
    has_errors |= cross_file.has_errors();

    if let Some(path) = &args.report_json {
        let files: Vec<&ValidationReport> = metadata
            .iter()
            .chain(coordinates.iter())
            .chain(expression.iter())
            .chain(gene_lists.iter())
            .map(PortalFile::report)
            .collect();
        let payload = CheckReportPayload {
            schema: REPORT_SCHEMA,
            schema_version: REPORT_SCHEMA_VERSION,
            generated_at: Utc::now().to_rfc3339(),
            files,
            cross_file: &cross_file,
        };
        let json = serde_json::to_string_pretty(&payload)?;
        std::fs::write(path, format!("{json}\n"))
            .with_context(|| format!("write report: {}", path.display()))?;
        info!("wrote check report {}", path.display());
    }
    Ok(has_errors)
}

pub fn run_deidentify(args: &DeidentifyArgs) -> Result<()> {
    let file = open_one(args.kind.into(), &args.file, args.delimiter.delimiter)?;
    match deidentify(&file, None)? {
        Some(result) => {
            info!(
                "wrote {} with mapping file {}",
                result.file.display(),
                result.mapping_file.display()
            );
        }
        None => info!("nothing to deidentify in {}", args.file.display()),
    }
    Ok(())
}

pub fn run_subset(args: &SubsetArgs) -> Result<()> {
    let file = open_one(args.kind.into(), &args.file, args.delimiter.delimiter)?;
    let keep = args.keep.iter().cloned().collect();
    match subset(&file, &keep)? {
        Some(path) => info!("wrote subset file {}", path.display()),
        None => info!("nothing to subset in {}", args.file.display()),
    }
    Ok(())
}

/// Selected cell names are printed one per line so they can be piped back
/// into `subset --keep`.
pub fn run_subsample(args: &SubsampleArgs) -> Result<()> {
    let file = open_one(FileKind::Metadata, &args.file, args.delimiter.delimiter)?;
    let selected = subsample(&file, args.count, &args.group_column)?;
    for name in selected {
        println!("{name}");
    }
    Ok(())
}

pub fn run_clusters(args: &ClustersArgs) -> Result<()> {
    let mut groups: Vec<(String, PathBuf)> = Vec::with_capacity(args.groups.len());
    for raw in &args.groups {
        let Some((name, path)) = raw.split_once('=') else {
            bail!("--group must be given as NAME=PATH, received \"{raw}\"");
        };
        groups.push((name.to_string(), PathBuf::from(path)));
    }

    let merged = merge_cluster_groups(
        &groups,
        &args.metadata,
        args.delimiter.delimiter,
        &args.excluded_labels,
        &args.ordered_labels,
    )?;
    let json = serde_json::to_string_pretty(&merged)?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))
                .with_context(|| format!("write cluster groups: {}", path.display()))?;
            info!("wrote cluster groups {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn open_one(kind: FileKind, path: &PathBuf, delimiter: u8) -> Result<PortalFile> {
    PortalFile::open(kind, path, delimiter)
        .with_context(|| format!("open {} file {}", kind.as_str(), path.display()))
}

fn open_optional(
    kind: FileKind,
    path: Option<&PathBuf>,
    delimiter: u8,
) -> Result<Option<PortalFile>> {
    path.map(|path| open_one(kind, path, delimiter)).transpose()
}
