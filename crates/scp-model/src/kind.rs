use serde::{Deserialize, Serialize};

use crate::types::{EXPRESSION_CORNER, GENE_LIST_CORNER, METADATA_CORNER};

/// The closed set of portal file variants.
///
/// Each variant carries its own header convention; dispatching on the kind
/// replaces open-ended subclassing since the file-format convention is stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Per-cell annotations: `NAME` column plus typed metadata columns.
    Metadata,
    /// 2D/3D cluster coordinates: `NAME`, `X`, `Y` and optional `Z`.
    Coordinates,
    /// Expression matrix: genes as rows, cells as header columns 1..N.
    Expression,
    /// Gene list for portal visualization: `GENE NAMES` plus label columns.
    GeneList,
}

impl FileKind {
    /// Fixed literal expected in the 0,0 position of the header.
    pub fn corner_keyword(self) -> &'static str {
        match self {
            FileKind::Metadata | FileKind::Coordinates => METADATA_CORNER,
            FileKind::Expression => EXPRESSION_CORNER,
            FileKind::GeneList => GENE_LIST_CORNER,
        }
    }

    /// Whether the second line of the file declares column types.
    pub fn has_type_row(self) -> bool {
        matches!(self, FileKind::Metadata | FileKind::Coordinates)
    }

    /// Number of header rows preceding the data body.
    pub fn header_row_count(self) -> usize {
        if self.has_type_row() { 2 } else { 1 }
    }

    /// Whether row identifiers live in the header (expression matrices name
    /// their cells in header columns 1..N) rather than in column 0.
    pub fn identifiers_in_header(self) -> bool {
        matches!(self, FileKind::Expression)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Metadata => "metadata",
            FileKind::Coordinates => "coordinates",
            FileKind::Expression => "expression",
            FileKind::GeneList => "gene list",
        }
    }

    /// Link to a known-good example file, surfaced when validation fails.
    pub fn demo_link(self) -> &'static str {
        match self {
            FileKind::Metadata => {
                "https://github.com/broadinstitute/single_cell_portal/blob/master/demo_data/metadata_example.txt"
            }
            FileKind::Coordinates => {
                "https://github.com/broadinstitute/single_cell_portal/blob/master/demo_data/coordinates_example.txt"
            }
            FileKind::Expression => {
                "https://github.com/broadinstitute/single_cell_portal/blob/master/demo_data/expression_example.txt"
            }
            FileKind::GeneList => {
                "https://github.com/broadinstitute/single_cell_portal/blob/master/demo_data/genelist_example.txt"
            }
        }
    }
}
