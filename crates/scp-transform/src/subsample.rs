use indexmap::IndexMap;
use rand::Rng;
use rand::seq::IndexedRandom;

use scp_model::{PortalError, Result};
use scp_validate::PortalFile;

/// Stratified random subsample of cell identifiers.
///
/// Partitions cells by their value in `group_column`, then draws
/// `round(target / distinct_values)` cells without replacement from each
/// partition, with `.5` ties rounded to the even integer. A partition
/// smaller than its draw fails loudly rather than silently returning fewer
/// cells.
pub fn subsample(file: &PortalFile, target: usize, group_column: &str) -> Result<Vec<String>> {
    subsample_with_rng(file, target, group_column, &mut rand::rng())
}

/// [`subsample`] with a caller-supplied RNG, for reproducible draws.
pub fn subsample_with_rng<R: Rng + ?Sized>(
    file: &PortalFile,
    target: usize,
    group_column: &str,
    rng: &mut R,
) -> Result<Vec<String>> {
    let column = file
        .header()
        .iter()
        .position(|name| name == group_column)
        .ok_or_else(|| {
            PortalError::Config(format!(
                "the metadata group \"{group_column}\" is not in the header of {}; no subsampling will occur",
                file.path().display()
            ))
        })?;

    let mut cells_by_value: IndexMap<String, Vec<String>> = IndexMap::new();
    let mut records = file.document().records()?;
    for _ in 0..file.kind().header_row_count() {
        records.next().transpose()?;
    }
    for record in records {
        let row = record?;
        let (Some(cell), Some(value)) = (row.first(), row.get(column)) else {
            continue;
        };
        cells_by_value
            .entry(value.clone())
            .or_default()
            .push(cell.clone());
    }
    if cells_by_value.is_empty() {
        return Ok(Vec::new());
    }

    let per_group = round_half_to_even(target as f64 / cells_by_value.len() as f64);
    let mut selected = Vec::new();
    for (value, cells) in &cells_by_value {
        if cells.len() < per_group {
            return Err(PortalError::Config(format!(
                "cannot sample {per_group} cells without replacement from group \"{value}\" which has only {}",
                cells.len()
            )));
        }
        selected.extend(cells.choose_multiple(rng, per_group).cloned());
    }
    Ok(selected)
}

/// Nearest-integer rounding with `.5` ties going to the even neighbor, so
/// `4.5` rounds to 4 and `5.5` to 6.
fn round_half_to_even(value: f64) -> usize {
    let floor = value.floor();
    if value - floor == 0.5 {
        let floor = floor as usize;
        if floor % 2 == 0 { floor } else { floor + 1 }
    } else {
        value.round() as usize
    }
}
