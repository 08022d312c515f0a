//! # sndb-core
//!
//! Core types, coordinate parsing, and error types for SNDB.
//!
//! This crate provides the foundational types shared across all SNDB crates:
//! - Sky coordinates and the RA/Dec text parser
//! - Canonical object records with per-field provenance
//! - Observing runs and their deduplicated target lists
//! - Observation files and filename timestamps
//! - The cross-cutting error taxonomy

pub mod coordinate;
pub mod errors;
pub mod observation;
pub mod record;
pub mod run;

pub use coordinate::{Axis, Coordinate, Sexagesimal, SexagesimalUnit, parse_coordinate};
pub use errors::CoreError;
pub use observation::{ObservationFile, ObservationTimestamp};
pub use record::{
    ANONYMOUS_HOST, CatalogSource, ObjectRecord, Provenance, RecordField, known_host, non_blank,
    parse_discovery_date,
};
pub use run::{ObservingRun, RunId, RunKey, TargetList};
