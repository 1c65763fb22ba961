use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier expected in the first field of the type declaration row.
pub const TYPE_ROW_ID: &str = "TYPE";

/// Corner keyword for metadata and coordinate files.
pub const METADATA_CORNER: &str = "NAME";

/// Corner keyword for expression matrices.
pub const EXPRESSION_CORNER: &str = "GENE";

/// Corner keyword for gene list files.
pub const GENE_LIST_CORNER: &str = "GENE NAMES";

/// Required leading columns of a coordinate file header.
pub const COORDINATES_HEADER: [&str; 3] = ["NAME", "X", "Y"];

/// Optional third axis; its presence means a 3D plot downstream.
pub const COORDINATES_OPTIONAL_Z: &str = "Z";

/// Prefix used when minting synthetic identifiers (`cell_0`, `cell_1`, ...).
pub const CELL_ID_PREFIX: &str = "cell";

/// Separator between original and synthetic names in a mapping file line.
pub const MAP_DELIMITER: &str = "\t->\t";

/// Spellings of "not available" accepted in numeric metadata columns.
pub const NA_VALUES: [&str; 4] = ["NA", "nA", "Na", "na"];

pub const DEFAULT_DELIMITER: u8 = b'\t';
pub const DEID_TAG: &str = "_deidentified";
pub const MAP_TAG: &str = "_mapping";
pub const SUBSET_TAG: &str = "_subset";

/// Emit a progress marker every this many data rows when scanning
/// an expression matrix body.
pub const PROGRESS_ROW_BLOCK: u64 = 500;

/// Declared semantic type of a column, from the second header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Group,
}

impl ColumnType {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Group => "group",
        }
    }

    /// All tokens accepted in a type row, for error messages.
    pub fn valid_tokens() -> &'static [&'static str] {
        &["numeric", "group"]
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "numeric" => Ok(ColumnType::Numeric),
            "group" => Ok(ColumnType::Group),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_type_parses_exact_tokens_only() {
        assert_eq!("numeric".parse::<ColumnType>(), Ok(ColumnType::Numeric));
        assert_eq!("group".parse::<ColumnType>(), Ok(ColumnType::Group));
        assert!("Numeric".parse::<ColumnType>().is_err());
        assert!("".parse::<ColumnType>().is_err());
        assert_eq!(
            "cluster".parse::<ColumnType>().unwrap_err(),
            "cluster".to_string()
        );
    }
}
