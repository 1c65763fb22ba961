use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use scp_ingest::{RecordWriter, TabularDocument, create_safe_file_name};
use scp_model::{
    COORDINATES_HEADER, COORDINATES_OPTIONAL_Z, ColumnType, FileKind, NA_VALUES, PROGRESS_ROW_BLOCK,
    PortalError, Result, TYPE_ROW_ID, ValidationIssue, ValidationReport,
};

/// A portal upload file under validation.
///
/// Construction reads the header rows and caches the file's identifiers;
/// every later check streams the document again from a fresh cursor. Checks
/// accumulate findings into a per-instance report and never abort a scan:
/// one run reports the complete set of defects.
pub struct PortalFile {
    kind: FileKind,
    document: TabularDocument,
    header: Vec<String>,
    type_row: Option<Vec<String>>,
    identifiers: Vec<String>,
    report: ValidationReport,
}

impl PortalFile {
    /// Open a file and read its required header rows.
    ///
    /// Fails with [`PortalError::Format`] when the source is empty or ends
    /// before the rows the variant requires; nothing can be validated
    /// without a header.
    pub fn open(kind: FileKind, path: impl Into<PathBuf>, delimiter: u8) -> Result<Self> {
        let path = path.into();
        let document = TabularDocument::new(&path, delimiter);
        let mut records = document.records()?;
        let header = records.next().transpose()?.ok_or_else(|| {
            PortalError::Format(format!(
                "{} has no header row; cannot validate an empty {} file",
                path.display(),
                kind.as_str()
            ))
        })?;
        let type_row = if kind.has_type_row() {
            Some(records.next().transpose()?.ok_or_else(|| {
                PortalError::Format(format!(
                    "{} ends before the type declaration row required of a {} file",
                    path.display(),
                    kind.as_str()
                ))
            })?)
        } else {
            None
        };
        drop(records);

        let identifiers = read_identifiers(kind, &document, &header)?;
        let report = ValidationReport::new(&path);
        Ok(Self {
            kind,
            document,
            header,
            type_row,
            identifiers,
            report,
        })
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        self.document.path()
    }

    pub fn document(&self) -> &TabularDocument {
        &self.document
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn type_row(&self) -> Option<&[String]> {
        self.type_row.as_deref()
    }

    /// Cell names for most variants; gene names for a gene list.
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    pub fn has_errors(&self) -> bool {
        self.report.has_errors()
    }

    fn push_error(&mut self, message: String) {
        error!(file = %self.path().display(), "{message}");
        self.report.push(ValidationIssue::error(message));
    }

    fn push_error_at(&mut self, line: u64, message: String) {
        error!(file = %self.path().display(), line, "{message}");
        self.report.push(ValidationIssue::error_at(line, message));
    }

    fn push_note(&mut self, message: String) {
        info!(file = %self.path().display(), "{message}");
        self.report.push(ValidationIssue::info(message));
    }

    /// Run every check in order (header, body, duplicates) and report whether
    /// any of them found an error. A failing stage never short-circuits the
    /// later ones.
    pub fn check(&mut self) -> Result<bool> {
        info!("checking {}", self.path().display());
        self.check_header()?;
        self.check_body()?;
        self.check_duplicate_identifiers();
        if self.has_errors() {
            error!(
                "the provided file {} had errors; an example file can be found at {}",
                self.path().display(),
                self.kind.demo_link()
            );
        }
        Ok(self.has_errors())
    }

    /// Variant-specific structural checks on the first header row, plus the
    /// type row when the variant declares one.
    pub fn check_header(&mut self) -> Result<()> {
        match self.kind {
            FileKind::Metadata => {
                if self.header[0] != self.kind.corner_keyword() {
                    self.push_error(format!(
                        "expected the first column of the header to be {} but received {}",
                        FileKind::Metadata.corner_keyword(),
                        self.header[0]
                    ));
                }
                if self.header.len() < 2 {
                    self.push_error(
                        "invalid metadata file: need at least a cell ID column and one metadata column"
                            .to_string(),
                    );
                }
                self.check_unique_header();
                self.check_type_row();
            }
            FileKind::Coordinates => {
                if self.header.len() < COORDINATES_HEADER.len() {
                    self.push_error(format!(
                        "expected a file with at least {} columns but received {}",
                        COORDINATES_HEADER.len(),
                        self.header.len()
                    ));
                }
                let mismatches: Vec<String> = COORDINATES_HEADER
                    .iter()
                    .zip(&self.header)
                    .filter(|(expected, received)| received != *expected)
                    .map(|(expected, received)| {
                        format!(
                            "expected the column value \"{expected}\" but received \"{received}\""
                        )
                    })
                    .collect();
                for message in mismatches {
                    self.push_error(message);
                }
                if self.header.iter().any(|name| name == COORDINATES_OPTIONAL_Z) {
                    self.push_note(format!(
                        "a Z coordinate is included in {}; expect a 3D plot to be generated from this file",
                        self.path().display()
                    ));
                }
                self.check_unique_header();
                self.check_type_row();
            }
            FileKind::Expression | FileKind::GeneList => {
                if self.header[0] != self.kind.corner_keyword() {
                    self.push_error(format!(
                        "expected the 0,0 position of the header to be \"{}\" but received \"{}\"",
                        self.kind.corner_keyword(),
                        self.header[0]
                    ));
                }
            }
        }
        Ok(())
    }

    fn check_unique_header(&mut self) {
        let duplicated = duplicates(&self.header);
        if !duplicated.is_empty() {
            self.push_error(format!(
                "duplicate column names were found in the header: {}",
                duplicated.join(",")
            ));
        }
    }

    /// Validate the type declaration row: its length must match the header,
    /// its leading token is fixed, and every other token must be a known
    /// column type. Unrecognized tokens are reported together.
    pub fn check_type_row(&mut self) {
        let Some(type_row) = self.type_row.clone() else {
            return;
        };
        if type_row.len() != self.header.len() {
            self.push_error(format!(
                "expected a type row length of {} but received a length of {}",
                self.header.len(),
                type_row.len()
            ));
        }
        if type_row.first().map(String::as_str) != Some(TYPE_ROW_ID) {
            self.push_error(format!(
                "expected the ID of the second header row to be {} but it was {}",
                TYPE_ROW_ID,
                type_row.first().map(String::as_str).unwrap_or("")
            ));
        }
        let unrecognized: Vec<&str> = type_row
            .iter()
            .skip(1)
            .filter(|token| token.parse::<ColumnType>().is_err())
            .map(String::as_str)
            .collect();
        if !unrecognized.is_empty() {
            self.push_error(format!(
                "the following types are not recognized: {}; please use any of: {}",
                unrecognized.join(","),
                ColumnType::valid_tokens().join(",")
            ));
        }
    }

    /// Stream the data body and validate each row against the variant rules.
    /// Row-level failures are accumulated; the scan always reaches the end of
    /// the file.
    pub fn check_body(&mut self) -> Result<()> {
        let header_rows = self.kind.header_row_count();
        let header_len = self.header.len();
        let column_types = self.column_types();
        let mut records = self.document.records()?;
        for _ in 0..header_rows {
            records.next().transpose()?;
        }

        let mut line = header_rows as u64;
        let mut data_rows = 0u64;
        for record in records {
            let row = record?;
            line += 1;
            data_rows += 1;
            if row.len() != header_len {
                self.push_error_at(
                    line,
                    format!("expected {} columns but received {}", header_len, row.len()),
                );
            }
            match self.kind {
                FileKind::Metadata => self.check_metadata_row(&row, &column_types, line),
                FileKind::Coordinates => self.check_coordinates_row(&row, &column_types, line),
                FileKind::Expression => {
                    self.check_numeric_row(&row, line, false);
                    if data_rows % PROGRESS_ROW_BLOCK == 0 {
                        info!("progress update: line {line}");
                    }
                }
                FileKind::GeneList => self.check_numeric_row(&row, line, true),
            }
        }
        Ok(())
    }

    fn check_metadata_row(&mut self, row: &[String], column_types: &[ColumnType], line: u64) {
        for (index, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                self.push_error_at(
                    line,
                    format!("expected a value for element {}", index + 1),
                );
                continue;
            }
            if NA_VALUES.contains(&cell.as_str()) {
                continue;
            }
            let column_type = column_types.get(index).copied().unwrap_or(ColumnType::Group);
            if column_type == ColumnType::Numeric && cell.parse::<f64>().is_err() {
                self.push_error_at(
                    line,
                    format!("unexpected type for value {cell}; expected type {column_type}"),
                );
            }
        }
    }

    fn check_coordinates_row(&mut self, row: &[String], column_types: &[ColumnType], line: u64) {
        for (index, cell) in row.iter().enumerate() {
            let column_type = column_types.get(index).copied().unwrap_or(ColumnType::Group);
            if column_type == ColumnType::Numeric && cell.parse::<f64>().is_err() {
                self.push_error_at(
                    line,
                    format!("unexpected type for value {cell}; expected type {column_type}"),
                );
            }
        }
    }

    /// Columns 1..N must parse as floats. Gene lists additionally require a
    /// value in every entry.
    fn check_numeric_row(&mut self, row: &[String], line: u64, require_value: bool) {
        for (index, cell) in row.iter().enumerate().skip(1) {
            if cell.is_empty() {
                if require_value {
                    self.push_error_at(
                        line,
                        format!("expected a value for element {}", index + 1),
                    );
                }
                continue;
            }
            if cell.parse::<f64>().is_err() {
                self.push_error_at(
                    line,
                    format!("unexpected value {cell}; expected a numeric value"),
                );
            }
        }
    }

    /// Flag every identifier that occurs more than once.
    pub fn check_duplicate_identifiers(&mut self) -> bool {
        let duplicated = duplicates(&self.identifiers);
        if !duplicated.is_empty() {
            self.push_error(format!(
                "{} has duplicate names: {}",
                self.path().display(),
                duplicated.join(",")
            ));
        }
        self.has_errors()
    }

    /// Declared type of each column. Column 0 holds identifiers and is
    /// implicitly group-typed, as is any column whose declared token is
    /// unrecognized (the type-row check reports those separately).
    fn column_types(&self) -> Vec<ColumnType> {
        match &self.type_row {
            Some(type_row) => type_row
                .iter()
                .map(|token| token.parse().unwrap_or(ColumnType::Group))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Gene names: the first column of the data body for expression and gene
    /// list files.
    pub fn gene_names(&self) -> Result<Vec<String>> {
        let mut records = self.document.records()?;
        for _ in 0..self.kind.header_row_count() {
            records.next().transpose()?;
        }
        let mut names = Vec::new();
        for record in records {
            let row = record?;
            if let Some(first) = row.into_iter().next() {
                names.push(first);
            }
        }
        Ok(names)
    }

    /// Distinct labels observed in group-typed columns (metadata), or the
    /// label columns of a gene list header.
    pub fn group_labels(&self) -> Result<BTreeSet<String>> {
        match self.kind {
            FileKind::GeneList => Ok(self.header.iter().skip(1).cloned().collect()),
            _ => {
                let column_types = self.column_types();
                let mut records = self.document.records()?;
                for _ in 0..self.kind.header_row_count() {
                    records.next().transpose()?;
                }
                let mut labels = BTreeSet::new();
                for record in records {
                    let row = record?;
                    for (index, cell) in row.iter().enumerate().skip(1) {
                        if column_types.get(index) == Some(&ColumnType::Group) {
                            labels.insert(cell.clone());
                        }
                    }
                }
                Ok(labels)
            }
        }
    }

    /// Write a corrected copy of an expression matrix that is missing its
    /// corner keyword: when the first data row is exactly one column wider
    /// than the header, the keyword is inserted as a synthetic first header
    /// token and the body copied unchanged.
    ///
    /// This is an opt-in transform. The in-memory header is left alone so
    /// validation keeps reporting the original defect, and the input file is
    /// never touched.
    pub fn repair_expression_header(&self) -> Result<Option<PathBuf>> {
        if self.kind != FileKind::Expression {
            return Err(PortalError::Config(format!(
                "header repair only applies to expression matrices, not a {} file",
                self.kind.as_str()
            )));
        }
        if self.header[0] == self.kind.corner_keyword() {
            return Ok(None);
        }
        let mut records = self.document.records()?;
        let header = match records.next().transpose()? {
            Some(row) => row,
            None => return Ok(None),
        };
        let Some(first_row) = records.next().transpose()? else {
            return Ok(None);
        };
        if header.len() + 1 != first_row.len() {
            return Ok(None);
        }

        let repaired_path = create_safe_file_name(self.path())?;
        info!(
            "updating the matrix to carry the expression 0,0 element; writing {} without affecting the input",
            repaired_path.display()
        );
        let mut repaired_header = Vec::with_capacity(header.len() + 1);
        repaired_header.push(self.kind.corner_keyword().to_string());
        repaired_header.extend(header);

        let mut writer = RecordWriter::create(&repaired_path, self.document.delimiter())?;
        writer.write_record(&repaired_header)?;
        writer.write_record(&first_row)?;
        for record in records {
            writer.write_record(&record?)?;
        }
        writer.finish()?;
        Ok(Some(repaired_path))
    }
}

/// Collect the identifier list once at open time: the first column of every
/// data row, or for expression matrices the header columns 1..N.
fn read_identifiers(
    kind: FileKind,
    document: &TabularDocument,
    header: &[String],
) -> Result<Vec<String>> {
    if kind.identifiers_in_header() {
        return Ok(header.iter().skip(1).cloned().collect());
    }
    let mut records = document.records()?;
    for _ in 0..kind.header_row_count() {
        records.next().transpose()?;
    }
    let mut identifiers = Vec::new();
    for record in records {
        let row = record?;
        if let Some(first) = row.into_iter().next() {
            identifiers.push(first);
        }
    }
    Ok(identifiers)
}

/// Every item that appears more than once, each reported a single time,
/// sorted for stable output.
pub(crate) fn duplicates(items: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut duplicated = BTreeSet::new();
    for item in items {
        if !seen.insert(item.as_str()) {
            duplicated.insert(item.clone());
        }
    }
    duplicated.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::duplicates;

    #[test]
    fn duplicates_reports_each_repeated_item_once() {
        let items: Vec<String> = ["a", "b", "a", "c", "a", "b"]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(duplicates(&items), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn unique_items_yield_no_duplicates() {
        let items: Vec<String> = ["x", "y", "z"].iter().map(ToString::to_string).collect();
        assert!(duplicates(&items).is_empty());
    }
}
