//! The seeder ingestion seeding tool.
//!
//! This library supports the seeder binary found elsewhere in this project.
//! Configuration lives in [`config`], the uploader that drives records at an
//! ingestion endpoint lives in [`ingest`]. Record generation itself is the
//! business of the `seeder-payload` crate.

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
#![deny(clippy::dbg_macro)]
#![deny(unused_extern_crates)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![allow(clippy::multiple_crate_versions)]

pub mod config;
pub mod ingest;
