//! Retrieving and saving schema descriptors.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value as JsonValue;
use serde_json::ser::PrettyFormatter;
use tracing::debug;

use crate::error::{Result, TableSchemaError};

/// Timeout for fetching remote descriptors.
const FETCH_TIMEOUT_SECS: u64 = 30;

/// Where a descriptor comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum DescriptorSource {
    /// An in-memory JSON document.
    Inline(JsonValue),
    /// A local JSON file.
    Path(PathBuf),
    /// An `http(s)://` URL.
    Url(String),
}

impl DescriptorSource {
    /// Read the descriptor JSON.
    pub fn retrieve(&self) -> Result<JsonValue> {
        match self {
            DescriptorSource::Inline(json) => Ok(json.clone()),
            DescriptorSource::Path(path) => {
                let file = File::open(path).map_err(|e| TableSchemaError::Io {
                    path: path.clone(),
                    source: e,
                })?;
                serde_json::from_reader(BufReader::new(file)).map_err(|e| {
                    TableSchemaError::Load(format!(
                        "Failed to parse descriptor '{}': {}",
                        path.display(),
                        e
                    ))
                })
            }
            DescriptorSource::Url(url) => fetch(url),
        }
    }
}

impl From<JsonValue> for DescriptorSource {
    fn from(json: JsonValue) -> Self {
        DescriptorSource::Inline(json)
    }
}

impl From<&Path> for DescriptorSource {
    fn from(path: &Path) -> Self {
        DescriptorSource::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for DescriptorSource {
    fn from(path: PathBuf) -> Self {
        DescriptorSource::Path(path)
    }
}

/// Strings starting with `http://` or `https://` are URLs, anything else a
/// path.
impl From<&str> for DescriptorSource {
    fn from(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            DescriptorSource::Url(location.to_string())
        } else {
            DescriptorSource::Path(PathBuf::from(location))
        }
    }
}

fn fetch(url: &str) -> Result<JsonValue> {
    debug!(url, "Fetching remote descriptor");
    let client = Client::builder()
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .build()
        .map_err(|e| TableSchemaError::Load(format!("Failed to create HTTP client: {}", e)))?;

    let response = client
        .get(url)
        .send()
        .map_err(|e| TableSchemaError::Load(format!("Failed to fetch '{}': {}", url, e)))?;

    if !response.status().is_success() {
        return Err(TableSchemaError::Load(format!(
            "Failed to fetch '{}': HTTP {}",
            url,
            response.status()
        )));
    }

    response
        .json::<JsonValue>()
        .map_err(|e| TableSchemaError::Load(format!("Failed to parse descriptor '{}': {}", url, e)))
}

/// Write a value as UTF-8 JSON with 4-space indentation.
pub(crate) fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| TableSchemaError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    let file = File::create(path).map_err(|e| TableSchemaError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;
    writer.flush().map_err(|e| TableSchemaError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_source_from_str() {
        assert_eq!(
            DescriptorSource::from("https://example.com/schema.json"),
            DescriptorSource::Url("https://example.com/schema.json".to_string())
        );
        assert_eq!(
            DescriptorSource::from("schema.json"),
            DescriptorSource::Path(PathBuf::from("schema.json"))
        );
    }

    #[test]
    fn test_save_and_retrieve() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("schema.json");
        let descriptor = json!({"fields": [{"name": "id"}]});

        save_json(&descriptor, &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n    \"fields\""));

        let loaded = DescriptorSource::from(path).retrieve().unwrap();
        assert_eq!(loaded, descriptor);
    }

    #[test]
    fn test_missing_file() {
        let result = DescriptorSource::from("/nonexistent/schema.json").retrieve();
        assert!(matches!(result, Err(TableSchemaError::Io { .. })));
    }

    #[test]
    fn test_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        let result = DescriptorSource::from(path).retrieve();
        assert!(matches!(result, Err(TableSchemaError::Load(_))));
    }
}
