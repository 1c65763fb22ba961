use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::info;

use scp_ingest::{RecordWriter, tag_file_name};
use scp_model::{
    CELL_ID_PREFIX, DEID_TAG, FileKind, MAP_DELIMITER, MAP_TAG, PortalError, Result, TYPE_ROW_ID,
};
use scp_validate::PortalFile;

/// Result of a deidentification run: the rewritten copy, the
/// identifier-to-pseudonym mapping used, and the mapping file recording it.
#[derive(Debug, Clone)]
pub struct Deidentified {
    pub file: PathBuf,
    pub mapping: BTreeMap<String, String>,
    pub mapping_file: PathBuf,
}

/// Replace a file's identifiers with synthetic names and write both the
/// rewritten copy and a recovery mapping file. The input is never modified.
///
/// With no caller-supplied mapping, identifiers are assigned `cell_<k>` in
/// first-encounter order starting at zero. A caller-supplied mapping must
/// cover every identifier; a gap fails the operation before any output file
/// is created. Structural header tokens always map to themselves so header
/// rows survive the rewrite. Gene lists carry no cell names, so they produce
/// a notice and no files.
pub fn deidentify(
    file: &PortalFile,
    mapping: Option<BTreeMap<String, String>>,
) -> Result<Option<Deidentified>> {
    if file.kind() == FileKind::GeneList {
        info!("gene lists do not contain cell names, so no deidentification is needed");
        return Ok(None);
    }

    let mut mapping = mapping.unwrap_or_default();
    if mapping.is_empty() {
        for name in file.identifiers() {
            let next = mapping.len();
            mapping
                .entry(name.clone())
                .or_insert_with(|| format!("{CELL_ID_PREFIX}_{next}"));
        }
    }

    // Identity entries keep the fixed header tokens intact when rows are
    // rewritten through the map.
    let mut rewrite = mapping.clone();
    match file.kind() {
        FileKind::Expression => {
            let corner = FileKind::Expression.corner_keyword();
            rewrite.insert(corner.to_string(), corner.to_string());
        }
        _ => {
            let corner = file.kind().corner_keyword();
            rewrite.insert(corner.to_string(), corner.to_string());
            rewrite.insert(TYPE_ROW_ID.to_string(), TYPE_ROW_ID.to_string());
        }
    }

    // Mapping gaps must surface before any output file is created.
    if let Some(missing) = file
        .identifiers()
        .iter()
        .find(|name| !rewrite.contains_key(*name))
    {
        return Err(PortalError::Config(format!(
            "no deidentification mapping entry for \"{missing}\""
        )));
    }

    let deid_path = tag_file_name(file.path(), DEID_TAG)?;
    let mapping_path = tag_file_name(file.path(), MAP_TAG)?;

    let delimiter = file.document().delimiter();
    let mut writer = RecordWriter::create(&deid_path, delimiter)?;
    let mut records = file.document().records()?;
    if file.kind() == FileKind::Expression {
        // Cell names live in the header; the body is copied unchanged.
        if let Some(header) = records.next().transpose()? {
            let rewritten = header
                .iter()
                .map(|name| lookup(&rewrite, name))
                .collect::<Result<Vec<_>>>()?;
            writer.write_record(&rewritten)?;
        }
        for record in records {
            writer.write_record(&record?)?;
        }
    } else {
        for record in records {
            let mut row = record?;
            if !row.is_empty() {
                row[0] = lookup(&rewrite, &row[0])?;
            }
            writer.write_record(&row)?;
        }
    }
    writer.finish()?;

    write_mapping_file(&mapping_path, &rewrite)?;
    Ok(Some(Deidentified {
        file: deid_path,
        mapping,
        mapping_file: mapping_path,
    }))
}

fn lookup(rewrite: &BTreeMap<String, String>, name: &str) -> Result<String> {
    rewrite.get(name).cloned().ok_or_else(|| {
        PortalError::Config(format!("no deidentification mapping entry for \"{name}\""))
    })
}

/// One `original<TAB>-><TAB>synthetic` line per pair, sorted lexicographically
/// by the combined line. The mapping delimiter is fixed and independent of
/// the source file's delimiter.
fn write_mapping_file(path: &PathBuf, rewrite: &BTreeMap<String, String>) -> Result<()> {
    let mut lines: Vec<(String, &String, &String)> = rewrite
        .iter()
        .map(|(original, synthetic)| {
            (
                format!("{original}{MAP_DELIMITER}{synthetic}"),
                original,
                synthetic,
            )
        })
        .collect();
    lines.sort_by(|a, b| a.0.cmp(&b.0));

    let mut writer = RecordWriter::create(path, b'\t')?;
    for (_, original, synthetic) in lines {
        writer.write_record([original.as_str(), "->", synthetic.as_str()])?;
    }
    writer.finish()?;
    Ok(())
}
