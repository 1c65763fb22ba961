//! CLI argument definitions for the portal file tools.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use scp_model::FileKind;

#[derive(Parser)]
#[command(
    name = "scp-tools",
    version,
    about = "Portal file tools - validate and transform upload files",
    long_about = "Validate expression matrices, cell metadata, cluster coordinates and gene \
                  lists destined for the visualization portal, and derive per-cluster cell \
                  groupings.\n\n\
                  Gzip-compressed inputs (.gz) are handled transparently."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate a set of portal files and cross-check their identifiers.
    Check(CheckArgs),

    /// Replace cell names with synthetic ones and write a recovery mapping.
    Deidentify(DeidentifyArgs),

    /// Write a copy of a file reduced to a given set of cells.
    Subset(SubsetArgs),

    /// Randomly pick cells, stratified by a metadata group column.
    Subsample(SubsampleArgs),

    /// Extract per-cluster cell groupings from cluster and metadata files.
    Clusters(ClustersArgs),
}

#[derive(Args)]
pub struct CheckArgs {
    /// Cell metadata file (NAME + TYPE header rows).
    #[arg(long, value_name = "FILE")]
    pub metadata: Option<PathBuf>,

    /// Cluster coordinate file(s) (NAME, X, Y and optional Z).
    #[arg(long = "coordinates", value_name = "FILE")]
    pub coordinates: Vec<PathBuf>,

    /// Expression matrix (GENE corner keyword, cells in the header).
    #[arg(long, value_name = "FILE")]
    pub expression: Option<PathBuf>,

    /// Gene list file(s) (GENE NAMES corner keyword).
    #[arg(long = "gene-list", value_name = "FILE")]
    pub gene_lists: Vec<PathBuf>,

    /// Field delimiter for all files.
    #[command(flatten)]
    pub delimiter: DelimiterArg,

    /// Write a corrected expression matrix when its corner keyword is missing.
    #[arg(long = "repair-expression")]
    pub repair_expression: bool,

    /// Write a JSON report of every finding to this path.
    #[arg(long = "report-json", value_name = "PATH")]
    pub report_json: Option<PathBuf>,
}

#[derive(Args)]
pub struct DeidentifyArgs {
    /// File to deidentify.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Portal file variant of FILE.
    #[arg(long, value_enum)]
    pub kind: FileKindArg,

    #[command(flatten)]
    pub delimiter: DelimiterArg,
}

#[derive(Args)]
pub struct SubsetArgs {
    /// File to subset.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Portal file variant of FILE.
    #[arg(long, value_enum)]
    pub kind: FileKindArg,

    /// Cell names to keep (repeatable).
    #[arg(long = "keep", value_name = "CELL", required = true)]
    pub keep: Vec<String>,

    #[command(flatten)]
    pub delimiter: DelimiterArg,
}

#[derive(Args)]
pub struct SubsampleArgs {
    /// Metadata file to sample from.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Total number of cells to select across all groups.
    #[arg(long, value_name = "N")]
    pub count: usize,

    /// Metadata column whose values stratify the draw.
    #[arg(long = "group-column", value_name = "NAME")]
    pub group_column: String,

    #[command(flatten)]
    pub delimiter: DelimiterArg,
}

#[derive(Args)]
pub struct ClustersArgs {
    /// Named cluster files as NAME=PATH pairs (repeatable).
    #[arg(long = "group", value_name = "NAME=PATH", required = true)]
    pub groups: Vec<String>,

    /// Shared metadata file attached to every group.
    #[arg(long, value_name = "FILE")]
    pub metadata: PathBuf,

    /// Cluster labels to skip entirely (repeatable).
    #[arg(long = "exclude-label", value_name = "LABEL")]
    pub excluded_labels: Vec<String>,

    /// Explicit label ordering applied to every grouping.
    #[arg(long = "ordered-labels", value_name = "LABEL", value_delimiter = ',')]
    pub ordered_labels: Vec<String>,

    /// Write the merged groupings as JSON to this path (default: stdout).
    #[arg(long = "out", value_name = "PATH")]
    pub out: Option<PathBuf>,

    #[command(flatten)]
    pub delimiter: DelimiterArg,
}

#[derive(Args)]
pub struct DelimiterArg {
    /// Field delimiter; single character, default tab.
    #[arg(long, value_name = "CHAR", default_value = "\t", value_parser = parse_delimiter)]
    pub delimiter: u8,
}

fn parse_delimiter(raw: &str) -> Result<u8, String> {
    match raw.as_bytes() {
        [byte] => Ok(*byte),
        _ => Err("delimiter must be a single byte, e.g. '\\t' or ','".to_string()),
    }
}

/// CLI-facing names for the portal file variants.
#[derive(Clone, Copy, ValueEnum)]
pub enum FileKindArg {
    Metadata,
    Coordinates,
    Expression,
    GeneList,
}

impl From<FileKindArg> for FileKind {
    fn from(arg: FileKindArg) -> Self {
        match arg {
            FileKindArg::Metadata => FileKind::Metadata,
            FileKindArg::Coordinates => FileKind::Coordinates,
            FileKindArg::Expression => FileKind::Expression,
            FileKindArg::GeneList => FileKind::GeneList,
        }
    }
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
