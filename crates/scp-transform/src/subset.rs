use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::info;

use scp_ingest::{RecordWriter, tag_file_name};
use scp_model::{FileKind, Result, SUBSET_TAG};
use scp_validate::PortalFile;

/// Write a copy of the file reduced to the given identifiers.
///
/// Metadata and coordinate files keep only matching rows; expression
/// matrices keep only matching header columns (the corner keyword column is
/// always retained). Header rows pass through unmodified. Gene lists have no
/// cell identifiers to filter, so they produce a notice and no file.
pub fn subset(file: &PortalFile, keep: &BTreeSet<String>) -> Result<Option<PathBuf>> {
    if file.kind() == FileKind::GeneList {
        info!("gene lists do not contain cell names, so there is nothing to subset");
        return Ok(None);
    }

    let subset_path = tag_file_name(file.path(), SUBSET_TAG)?;
    let mut writer = RecordWriter::create(&subset_path, file.document().delimiter())?;
    let mut records = file.document().records()?;

    if file.kind() == FileKind::Expression {
        let corner = FileKind::Expression.corner_keyword();
        let Some(mut header) = records.next().transpose()? else {
            writer.finish()?;
            return Ok(Some(subset_path));
        };
        let first_row = records.next().transpose()?;
        // Tolerate a matrix missing its corner keyword: align the header with
        // the body before computing the column mask.
        if let Some(row) = &first_row
            && header.len() + 1 == row.len()
            && !header.iter().any(|name| name == corner)
        {
            header.insert(0, corner.to_string());
        }
        let mask: Vec<bool> = header
            .iter()
            .map(|name| name == corner || keep.contains(name))
            .collect();
        writer.write_record(apply_mask(&header, &mask))?;
        if let Some(row) = first_row {
            writer.write_record(apply_mask(&row, &mask))?;
        }
        for record in records {
            writer.write_record(apply_mask(&record?, &mask))?;
        }
    } else {
        for _ in 0..file.kind().header_row_count() {
            if let Some(header_row) = records.next().transpose()? {
                writer.write_record(&header_row)?;
            }
        }
        for record in records {
            let row = record?;
            if row.first().is_some_and(|name| keep.contains(name)) {
                writer.write_record(&row)?;
            }
        }
    }
    writer.finish()?;
    Ok(Some(subset_path))
}

fn apply_mask<'a>(row: &'a [String], mask: &'a [bool]) -> impl Iterator<Item = &'a str> {
    row.iter()
        .enumerate()
        .filter(|(index, _)| mask.get(*index).copied().unwrap_or(false))
        .map(|(_, field)| field.as_str())
}
