use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;

use scp_model::Result;

/// Whether a path names a gzip-compressed file.
pub fn is_gzip_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Record-oriented writer for transformation outputs.
///
/// Output compression follows the target path: a `.gz` target is written
/// through a gzip encoder, anything else as plain text. The underlying file
/// is flushed and closed on every exit path via [`RecordWriter::finish`] or
/// drop.
pub struct RecordWriter {
    inner: csv::Writer<Box<dyn Write>>,
}

impl RecordWriter {
    /// Create the target file. The path must be a brand-new name produced by
    /// the safe-naming helpers; inputs are never rewritten in place.
    pub fn create(path: &Path, delimiter: u8) -> Result<Self> {
        let file = File::create(path)?;
        let sink: Box<dyn Write> = if is_gzip_path(path) {
            Box::new(GzEncoder::new(file, Compression::default()))
        } else {
            Box::new(file)
        };
        let inner = WriterBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_writer(sink);
        Ok(Self { inner })
    }

    pub fn write_record<I, T>(&mut self, record: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.inner.write_record(record)?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gz_target_round_trips_through_the_document_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subset.txt.gz");

        let mut writer = RecordWriter::create(&path, b'\t').unwrap();
        writer.write_record(["NAME", "X"]).unwrap();
        writer.write_record(["P1", "0.1"]).unwrap();
        writer.finish().unwrap();

        let document = crate::TabularDocument::new(&path, b'\t');
        let rows: Vec<_> = document.records().unwrap().map(Result::unwrap).collect();
        assert_eq!(rows, vec![vec!["NAME", "X"], vec!["P1", "0.1"]]);
    }
}
