mod document;
mod naming;
mod writer;

pub use document::{RecordIter, TabularDocument};
pub use naming::{create_safe_file_name, tag_file_name};
pub use writer::{RecordWriter, is_gzip_path};
