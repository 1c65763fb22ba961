use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid file structure: {0}")]
    Format(String),
    #[error("cannot derive a safe output name, file already exists: {}", .0.display())]
    Collision(PathBuf),
    #[error("{0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PortalError>;
