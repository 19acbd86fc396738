//! Common types shared by payload generators.

pub mod config;
