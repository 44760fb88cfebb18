//! rolleilookup - Rolleiflex serial number lookup service.
//!
//! Resolves a camera serial number to its production batch (model, year,
//! lenses) from a read-only table of serial ranges, served over HTTP and
//! the command line.

pub mod cli;
pub mod config;
pub mod models;
pub mod repository;
pub mod schema;
pub mod server;
pub mod service;
