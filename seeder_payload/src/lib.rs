//! The seeder payloads
//!
//! This library supports synthetic log record generation for the seeder
//! project. A [`RecordGenerator`] is anchored to a point in time and produces
//! one [`LogRecord`] per call, each field sampled independently.

#![deny(missing_docs)]
#![allow(clippy::multiple_crate_versions)]

pub use common::config::ConfRange;
pub use record::{Config, Host, LogRecord, RecordGenerator, Timestamp};

pub mod common;
pub mod record;

/// Errors related to record generation and serialization
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Json payload could not be encoded
    #[error("Json payload could not be encoded: {0}")]
    Json(#[from] serde_json::Error),
    /// Timestamp could not be formatted
    #[error("Timestamp could not be formatted: {0}")]
    Format(#[from] time::error::Format),
    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Generate instances of `Self::Output` from a source of randomness.
pub trait Generator<'a> {
    /// The type produced by each call to [`Generator::generate`].
    type Output: 'a;
    /// The failure type of [`Generator::generate`].
    type Error: 'a;

    /// Produce a single `Self::Output`.
    ///
    /// # Errors
    ///
    /// Implementations fail when a sampled value cannot be rendered.
    fn generate<R>(&'a self, rng: &mut R) -> Result<Self::Output, Self::Error>
    where
        R: rand::Rng + ?Sized;
}
