//! This module controls configuration parsing from the end user, providing a
//! convenience mechanism for the rest of the program. Every field has a
//! default, so an absent or empty configuration seeds the local ingestion
//! endpoint with 100 records.
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use http::{
    HeaderMap, HeaderValue, Uri,
    header::{AUTHORIZATION, HeaderName},
};
use serde::Deserialize;

/// Header selecting the destination stream on the ingestion service.
pub const STREAM_HEADER: &str = "x-p-stream";

/// Errors produced by [`Config`]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Error for a serde [`serde_yaml`].
    #[error("Failed to deserialize yaml: {0}")]
    SerdeYaml(#[from] serde_yaml::Error),
    /// Error reading config file
    #[error("Failed to read config file {path:?}: {source}")]
    ReadFile {
        /// File path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: Box<io::Error>,
    },
    /// Configuration parsed but is not usable
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

fn default_target_uri() -> Uri {
    Uri::from_static("http://localhost:8000/api/v1/ingest")
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static(STREAM_HEADER),
        HeaderValue::from_static("dp"),
    );
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_static("Basic YWRtaW46YWRtaW4="),
    );
    headers
}

fn default_total_records() -> u32 {
    100
}

/// Main configuration struct for this program
#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// The URI records are posted to
    #[serde(with = "http_serde::uri", default = "default_target_uri")]
    pub target_uri: Uri,
    /// Headers to include in every request. Replaces the built-in stream
    /// and authorization headers when present. `Content-Type` is always
    /// `application/json` regardless.
    #[serde(with = "http_serde::header_map", default = "default_headers")]
    pub headers: HeaderMap,
    /// The number of records to generate and post
    #[serde(default = "default_total_records")]
    pub total_records: u32,
    /// The seed for random operations, drawn from the OS when absent
    #[serde(default)]
    pub seed: Option<[u8; 32]>,
    /// Record sampling parameters
    #[serde(default)]
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub record: seeder_payload::Config,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_uri: default_target_uri(),
            headers: default_headers(),
            total_records: default_total_records(),
            seed: None,
            record: seeder_payload::Config::default(),
        }
    }
}

impl Config {
    /// Parse and validate a configuration from YAML contents.
    ///
    /// # Errors
    ///
    /// Function will error if the contents are not valid YAML for this
    /// struct or fail validation.
    pub fn from_yaml(contents: &str) -> Result<Self, Error> {
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// See [`Config::from_yaml`]. Also errors if `path` cannot be read.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path).map_err(|source| Error::ReadFile {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;
        Self::from_yaml(&contents)
    }

    /// Check that the configuration describes a runnable seeding session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<(), Error> {
        if self.total_records == 0 {
            return Err(Error::Validation(
                "total_records must be greater than zero".to_string(),
            ));
        }
        if self.target_uri.host().is_none() {
            return Err(Error::Validation(format!(
                "target_uri {} has no host",
                self.target_uri
            )));
        }
        self.record
            .valid()
            .map_err(|reason| Error::Validation(format!("record: {reason}")))
    }
}
