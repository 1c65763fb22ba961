mod error;
mod kind;
mod report;
mod types;

pub use error::{PortalError, Result};
pub use kind::FileKind;
pub use report::{IssueSeverity, ValidationIssue, ValidationReport};
pub use types::{
    CELL_ID_PREFIX, COORDINATES_HEADER, COORDINATES_OPTIONAL_Z, ColumnType, DEFAULT_DELIMITER,
    DEID_TAG, EXPRESSION_CORNER, GENE_LIST_CORNER, MAP_DELIMITER, MAP_TAG, METADATA_CORNER,
    NA_VALUES, PROGRESS_ROW_BLOCK, SUBSET_TAG, TYPE_ROW_ID,
};
