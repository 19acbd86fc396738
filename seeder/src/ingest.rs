//! The ingestion endpoint uploader.
//!
//! Generates one record at a time and posts it to the target, waiting for
//! the full response before the next record is generated. Each response
//! status is written to the caller's sink as `Status Code: <int>`.
//!
//! ## Metrics
//!
//! `requests_sent`: Total number of requests sent
//! `request_ok`: Requests that received a response, labelled by `status_code`
//! `request_failure`: Requests that failed at the transport level
//! `bytes_written`: Total body bytes written
//!

use std::io::Write;

use bytes::Bytes;
use http::{
    HeaderMap, HeaderValue, Method, Request, Uri,
    header::{CONTENT_LENGTH, CONTENT_TYPE},
};
use http_body_util::{BodyExt, Full};
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use metrics::counter;
use rand::{SeedableRng, rngs::StdRng};
use seeder_payload::{Generator, RecordGenerator};
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use crate::config::Config;

#[derive(thiserror::Error, Debug)]
/// Errors produced by [`Ingest`].
pub enum Error {
    /// Record generation or serialization failed.
    #[error("Payload error: {0}")]
    Payload(#[from] seeder_payload::Error),
    /// Wrapper around [`http::Error`].
    #[error("HTTP error: {0}")]
    Http(#[from] http::Error),
    /// Writing a status line failed.
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),
    /// Error making HTTP request
    #[error("Failed to send HTTP request to {uri}: {source}")]
    RequestFailed {
        /// Target URI
        uri: String,
        /// Underlying client error
        #[source]
        source: Box<hyper_util::client::legacy::Error>,
    },
    /// Error reading the response body
    #[error("Failed to read HTTP response from {uri}: {source}")]
    ResponseBody {
        /// Target URI
        uri: String,
        /// Underlying hyper error
        #[source]
        source: Box<hyper::Error>,
    },
}

/// Tally of a completed run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Requests that received a response of any status
    pub requests_sent: u32,
    /// Responses with a status outside 2xx
    pub non_success: u32,
}

/// The ingestion uploader.
///
/// Posts `total_records` records to the target, strictly one in flight.
/// Non-2xx responses are reported and the loop continues; a transport
/// failure ends the run.
#[derive(Debug)]
pub struct Ingest {
    uri: Uri,
    headers: HeaderMap,
    total_records: u32,
    record_gen: RecordGenerator,
    rng: StdRng,
    metric_labels: Vec<(String, String)>,
}

impl Ingest {
    /// Create a new [`Ingest`] instance. Record timestamps fall in the
    /// window closing at `anchor`.
    ///
    /// # Errors
    ///
    /// Creation will fail if the record configuration is invalid.
    pub fn new(config: &Config, anchor: OffsetDateTime) -> Result<Self, Error> {
        let rng = match config.seed {
            Some(seed) => StdRng::from_seed(seed),
            None => StdRng::from_os_rng(),
        };
        let record_gen = RecordGenerator::new(config.record, anchor)?;

        let metric_labels = vec![
            ("component".to_string(), "ingest".to_string()),
            ("target".to_string(), config.target_uri.to_string()),
        ];

        Ok(Self {
            uri: config.target_uri.clone(),
            headers: config.headers.clone(),
            total_records: config.total_records,
            record_gen,
            rng,
            metric_labels,
        })
    }

    fn request(&self, body: Bytes) -> Result<Request<Full<Bytes>>, Error> {
        let mut request = Request::builder()
            .method(Method::POST)
            .uri(&self.uri)
            .header(CONTENT_LENGTH, body.len())
            .body(Full::new(body))?;
        let headers = request.headers_mut();
        for (k, v) in &self.headers {
            headers.append(k.clone(), v.clone());
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(request)
    }

    /// Run [`Ingest`] to completion, writing one status line per response
    /// to `out`.
    ///
    /// # Errors
    ///
    /// Returns an error on the first transport failure, or if a status line
    /// cannot be written. No further requests are made after an error.
    pub async fn spin<W>(mut self, out: &mut W) -> Result<Summary, Error>
    where
        W: Write,
    {
        let client: Client<HttpConnector, Full<Bytes>> = Client::builder(TokioExecutor::new())
            .retry_canceled_requests(false)
            .build_http();
        let labels = &self.metric_labels;
        let mut summary = Summary::default();

        info!(
            "Posting {total} records to {uri}",
            total = self.total_records,
            uri = self.uri
        );
        for idx in 0..self.total_records {
            let record = self.record_gen.generate(&mut self.rng)?;
            let body = Bytes::from(record.to_json()?);
            let body_length = body.len();
            let request = self.request(body)?;

            counter!("requests_sent", labels).increment(1);
            let response = match client.request(request).await {
                Ok(response) => response,
                Err(source) => {
                    error!(
                        "Failed to send HTTP request to {uri}: {source}",
                        uri = self.uri
                    );
                    counter!("request_failure", labels).increment(1);
                    return Err(Error::RequestFailed {
                        uri: self.uri.to_string(),
                        source: Box::new(source),
                    });
                }
            };
            let status = response.status();
            response
                .into_body()
                .collect()
                .await
                .map_err(|source| Error::ResponseBody {
                    uri: self.uri.to_string(),
                    source: Box::new(source),
                })?;

            writeln!(out, "Status Code: {}", status.as_u16())?;

            summary.requests_sent += 1;
            counter!("bytes_written", labels).increment(body_length as u64);
            let mut status_labels = labels.clone();
            status_labels.push(("status_code".to_string(), status.as_u16().to_string()));
            counter!("request_ok", &status_labels).increment(1);

            if status.is_success() {
                debug!("record {idx} ({id}) accepted with {status}", id = record.id);
            } else {
                summary.non_success += 1;
                warn!("record {idx} ({id}) answered with {status}", id = record.id);
            }
        }
        info!(
            "Finished: {sent} requests, {non_success} non-success responses",
            sent = summary.requests_sent,
            non_success = summary.non_success
        );
        Ok(summary)
    }
}
