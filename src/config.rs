use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::OmmaError;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MongoConfig {
    pub hostname: String,
    pub port: u16,
    pub database: String,
    pub collection: String,
}

impl MongoConfig {
    pub fn load(path: &Path) -> Result<Self, OmmaError> {
        let content =
            fs::read_to_string(path).map_err(|_| OmmaError::ConfigRead(path.to_path_buf()))?;
        serde_json::from_str(&content).map_err(|err| OmmaError::ConfigParse(err.to_string()))
    }

    pub fn uri(&self) -> String {
        format!("mongodb://{}:{}", self.hostname, self.port)
    }
}
