//! Crate-wide error taxonomy.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur anywhere in the analyze/update/verify/sync pipeline.
#[derive(Error, Debug)]
pub enum CodeSyncError {
    #[error("path not found: {0}")]
    InputNotFound(PathBuf),

    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    #[error("malformed entry: {0}")]
    MalformedEntry(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    #[error("directory walk error: {0}")]
    Walk(#[from] ignore::Error),
}

pub type Result<T> = std::result::Result<T, CodeSyncError>;
