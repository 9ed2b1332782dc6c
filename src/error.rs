use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum OmmaError {
    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("OMMA request failed: {0}")]
    Http(String),

    #[error("OMMA returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("OMMA fetch error: [{code}] {message}")]
    Registry { code: i32, message: String },

    #[error("no results for query '{0}'")]
    EmptyResult(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("collection is already populated")]
    CollectionPopulated,
}
