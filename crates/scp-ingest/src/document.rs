use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use flate2::read::GzDecoder;

use scp_model::Result;

use crate::writer::is_gzip_path;

/// A delimited text source read as a sequence of string records.
///
/// The document is re-openable: every call to [`TabularDocument::records`]
/// returns a fresh cursor positioned at the start of the file, so consumers
/// never share read state. The document is owned by whoever opened it and is
/// never mutated; all transformations write to new paths.
#[derive(Debug, Clone)]
pub struct TabularDocument {
    path: PathBuf,
    delimiter: u8,
}

impl TabularDocument {
    pub fn new(path: impl Into<PathBuf>, delimiter: u8) -> Self {
        Self {
            path: path.into(),
            delimiter,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Open a fresh cursor at the start of the source.
    ///
    /// A `.gz` extension is decompressed transparently; anything else is read
    /// as plain text. Records are flexible: rows with the wrong column count
    /// are surfaced to the caller rather than rejected here.
    pub fn records(&self) -> Result<RecordIter> {
        let file = File::open(&self.path)?;
        let reader: Box<dyn Read> = if is_gzip_path(&self.path) {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };
        let csv_reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(reader);
        Ok(RecordIter {
            inner: csv_reader.into_records(),
        })
    }
}

/// Sequential cursor over a document's records.
pub struct RecordIter {
    inner: csv::StringRecordsIntoIter<Box<dyn Read>>,
}

impl Iterator for RecordIter {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.inner.next()?;
        Some(
            record
                .map(|fields| fields.iter().map(str::to_string).collect())
                .map_err(Into::into),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn each_records_call_starts_at_the_top() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cells.txt");
        std::fs::write(&path, "NAME\tCLUSTER\nTYPE\tgroup\nP1\ta\n").unwrap();

        let document = TabularDocument::new(&path, b'\t');
        let first: Vec<_> = document.records().unwrap().map(Result::unwrap).collect();
        let second: Vec<_> = document.records().unwrap().map(Result::unwrap).collect();
        assert_eq!(first, second);
        assert_eq!(first[0], vec!["NAME", "CLUSTER"]);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn gz_extension_is_decompressed_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cells.txt.gz");
        let file = File::create(&path).unwrap();
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        encoder.write_all(b"GENE\tC1\ng1\t0.5\n").unwrap();
        encoder.finish().unwrap();

        let document = TabularDocument::new(&path, b'\t');
        let rows: Vec<_> = document.records().unwrap().map(Result::unwrap).collect();
        assert_eq!(rows, vec![vec!["GENE", "C1"], vec!["g1", "0.5"]]);
    }
}
