//! Synthetic log record payload.
//!
//! Each [`LogRecord`] carries four independently sampled fields: a v4 UUID,
//! a timestamp in `DD/Mon/YYYY:HH:MM:SS +0000` layout drawn from a window
//! that ends at the generator's anchor, a dotted-quad host and a small
//! integer value. Records serialize to a flat JSON object.

use std::{fmt, net::Ipv4Addr};

use rand::{Rng, distr::StandardUniform, prelude::Distribution};
use serde::Deserialize;
use time::{Duration, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};
use uuid::Uuid;

use crate::{Error, Generator, common::config::ConfRange};

const SECONDS_PER_DAY: i64 = 86_400;

/// Layout of [`LogRecord::datetime`]. The zone is always rendered as UTC.
pub const DATETIME_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[day]/[month repr:short]/[year]:[hour]:[minute]:[second] +0000"
);

fn default_window_days() -> u16 {
    30
}

fn default_octet() -> ConfRange<u8> {
    ConfRange::Inclusive { min: 1, max: 255 }
}

fn default_value() -> ConfRange<u32> {
    ConfRange::Inclusive { min: 1, max: 100 }
}

/// Configuration for the [`RecordGenerator`].
#[derive(Debug, Deserialize, serde::Serialize, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Width of the timestamp window, in days, ending at the anchor.
    #[serde(default = "default_window_days")]
    pub window_days: u16,
    /// Range every host octet is sampled from.
    #[serde(default = "default_octet")]
    pub octet: ConfRange<u8>,
    /// Range the record value is sampled from.
    #[serde(default = "default_value")]
    pub value: ConfRange<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            octet: default_octet(),
            value: default_value(),
        }
    }
}

impl Config {
    /// Determine whether the passed configuration obeys validation criteria.
    ///
    /// # Errors
    ///
    /// Returns a description of the first violated constraint.
    pub fn valid(&self) -> Result<(), String> {
        if self.window_days == 0 {
            return Err("window_days must be greater than zero".to_string());
        }
        let (octet_valid, reason) = self.octet.valid();
        if !octet_valid {
            return Err(format!("octet is invalid: {reason}"));
        }
        let (value_valid, reason) = self.value.valid();
        if !value_valid {
            return Err(format!("value is invalid: {reason}"));
        }
        Ok(())
    }
}

/// A dotted-quad host address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Host {
    octets: [u8; 4],
}

impl Host {
    fn sample<R>(rng: &mut R, octet: ConfRange<u8>) -> Self
    where
        R: Rng + ?Sized,
    {
        Self {
            octets: [
                octet.sample(rng),
                octet.sample(rng),
                octet.sample(rng),
                octet.sample(rng),
            ],
        }
    }

    /// The four octets of this host, most significant first.
    #[must_use]
    pub fn octets(&self) -> [u8; 4] {
        self.octets
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Ipv4Addr::from(self.octets))
    }
}

impl serde::Serialize for Host {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

/// An instant within a bounded window, at whole-second resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// Render in the `DD/Mon/YYYY:HH:MM:SS +0000` layout.
    ///
    /// # Errors
    ///
    /// Fails if the underlying instant cannot be formatted.
    pub fn format(&self) -> Result<String, Error> {
        Ok(self.0.format(DATETIME_FORMAT)?)
    }

    /// The underlying instant.
    #[must_use]
    pub fn instant(&self) -> OffsetDateTime {
        self.0
    }
}

/// A uniform sample of `[start, start + seconds]` at whole-second resolution.
#[derive(Debug, Clone, Copy)]
struct Window {
    start: OffsetDateTime,
    seconds: i64,
}

impl Distribution<Timestamp> for Window {
    fn sample<R>(&self, rng: &mut R) -> Timestamp
    where
        R: Rng + ?Sized,
    {
        let offset = rng.random_range(0..=self.seconds);
        Timestamp(self.start + Duration::seconds(offset))
    }
}

/// A single synthetic log record.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LogRecord {
    /// Unique identifier, always a v4 UUID.
    pub id: Uuid,
    /// Timestamp in `DD/Mon/YYYY:HH:MM:SS +0000` layout.
    pub datetime: String,
    /// Originating host.
    pub host: Host,
    /// Sampled value.
    pub value: u32,
}

impl LogRecord {
    /// Serialize this record as a JSON object.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<Vec<u8>, Error> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Produces [`LogRecord`] instances whose timestamps fall within a window
/// ending at a fixed anchor.
#[derive(Debug, Clone, Copy)]
pub struct RecordGenerator {
    window: Window,
    octet: ConfRange<u8>,
    value: ConfRange<u32>,
}

impl RecordGenerator {
    /// Create a new [`RecordGenerator`] whose window closes at `anchor`.
    ///
    /// Sub-second precision is dropped from `anchor` so every formatted
    /// timestamp lands inside the window.
    ///
    /// # Errors
    ///
    /// Fails if `config` does not pass validation.
    pub fn new(config: Config, anchor: OffsetDateTime) -> Result<Self, Error> {
        config.valid().map_err(Error::Validation)?;

        let anchor = anchor.to_offset(time::UtcOffset::UTC);
        let anchor = anchor - Duration::nanoseconds(i64::from(anchor.nanosecond()));
        let seconds = i64::from(config.window_days) * SECONDS_PER_DAY;
        let window = Window {
            start: anchor - Duration::seconds(seconds),
            seconds,
        };

        Ok(Self {
            window,
            octet: config.octet,
            value: config.value,
        })
    }

    /// The earliest instant a generated timestamp may take.
    #[must_use]
    pub fn window_start(&self) -> OffsetDateTime {
        self.window.start
    }

    /// The latest instant a generated timestamp may take.
    #[must_use]
    pub fn window_end(&self) -> OffsetDateTime {
        self.window.start + Duration::seconds(self.window.seconds)
    }
}

impl<'a> Generator<'a> for RecordGenerator {
    type Output = LogRecord;
    type Error = Error;

    fn generate<R>(&'a self, rng: &mut R) -> Result<Self::Output, Self::Error>
    where
        R: rand::Rng + ?Sized,
    {
        let timestamp: Timestamp = self.window.sample(rng);
        let host = Host::sample(rng, self.octet);
        let value = self.value.sample(rng);
        let id = uuid::Builder::from_random_bytes(StandardUniform.sample(rng)).into_uuid();

        Ok(LogRecord {
            id,
            datetime: timestamp.format()?,
            host,
            value,
        })
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use proptest::prelude::*;
    use rand::{SeedableRng, rngs::SmallRng};
    use time::{OffsetDateTime, PrimitiveDateTime, macros::datetime};
    use uuid::Version;

    use super::{Config, DATETIME_FORMAT, Host, RecordGenerator};
    use crate::{ConfRange, Generator};

    const ANCHOR: OffsetDateTime = datetime!(2026-10-19 12:34:56.789 UTC);

    fn parse(datetime: &str) -> OffsetDateTime {
        PrimitiveDateTime::parse(datetime, DATETIME_FORMAT)
            .expect("datetime does not match layout")
            .assume_utc()
    }

    #[test]
    fn datetime_layout() {
        let record_gen = RecordGenerator::new(
            Config {
                window_days: 1,
                ..Config::default()
            },
            ANCHOR,
        )
        .expect("valid config");
        assert_eq!(record_gen.window_end(), datetime!(2026-10-19 12:34:56 UTC));
        assert_eq!(record_gen.window_start(), datetime!(2026-10-18 12:34:56 UTC));

        let formatted = super::Timestamp(datetime!(2026-03-07 04:05:06 UTC))
            .format()
            .expect("failed to format");
        assert_eq!(formatted, "07/Mar/2026:04:05:06 +0000");
    }

    #[test]
    fn host_display() {
        let host = Host {
            octets: [1, 22, 203, 255],
        };
        assert_eq!(host.to_string(), "1.22.203.255");
    }

    #[test]
    fn json_shape() {
        let record_gen = RecordGenerator::new(Config::default(), ANCHOR).expect("valid config");
        let mut rng = SmallRng::seed_from_u64(19);
        let record = record_gen.generate(&mut rng).expect("failed to generate");
        let bytes = record.to_json().expect("failed to serialize");
        let value: serde_json::Value = serde_json::from_slice(&bytes).expect("not json");
        let object = value.as_object().expect("not an object");

        assert_eq!(object.len(), 4);
        assert_eq!(object["id"], record.id.to_string());
        assert_eq!(object["datetime"], record.datetime);
        assert_eq!(object["host"], record.host.to_string());
        assert_eq!(object["value"], record.value);
    }

    #[test]
    fn ids_distinct_across_run() {
        let record_gen = RecordGenerator::new(Config::default(), ANCHOR).expect("valid config");
        let mut rng = SmallRng::seed_from_u64(0);
        let ids: HashSet<_> = (0..100)
            .map(|_| record_gen.generate(&mut rng).expect("failed to generate").id)
            .collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn invalid_configs_rejected() {
        let zero_window = Config {
            window_days: 0,
            ..Config::default()
        };
        assert!(RecordGenerator::new(zero_window, ANCHOR).is_err());

        let inverted = Config {
            value: ConfRange::Inclusive { min: 100, max: 1 },
            ..Config::default()
        };
        assert!(RecordGenerator::new(inverted, ANCHOR).is_err());
    }

    #[test]
    fn config_defaults_from_empty_object() {
        let config: Config = serde_json::from_str("{}").expect("failed to deserialize");
        assert_eq!(config, Config::default());
        assert_eq!(config.window_days, 30);
        assert_eq!(config.octet, ConfRange::Inclusive { min: 1, max: 255 });
        assert_eq!(config.value, ConfRange::Inclusive { min: 1, max: 100 });
    }

    proptest! {
        #[test]
        fn records_obey_default_distributions(seed: u64) {
            let record_gen = RecordGenerator::new(Config::default(), ANCHOR).expect("valid config");
            let mut rng = SmallRng::seed_from_u64(seed);

            for _ in 0..16 {
                let record = record_gen.generate(&mut rng).expect("failed to generate");

                let when = parse(&record.datetime);
                prop_assert!(when >= record_gen.window_start());
                prop_assert!(when <= record_gen.window_end());
                prop_assert!(when <= ANCHOR);

                for octet in record.host.octets() {
                    prop_assert!(octet >= 1);
                }
                let parts: Vec<u8> = record
                    .host
                    .to_string()
                    .split('.')
                    .map(|p| p.parse().expect("octet is not a u8"))
                    .collect();
                prop_assert_eq!(parts.len(), 4);

                prop_assert!((1..=100).contains(&record.value));
                prop_assert_eq!(record.id.get_version(), Some(Version::Random));
            }
        }
    }
}
