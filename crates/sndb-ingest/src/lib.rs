//! # sndb-ingest
//!
//! Spectrum ingestion for SNDB.
//!
//! - [`associate`]: pair observation files with calibration files
//! - [`header`]: calibration header extraction and the alias table
//! - [`naming`]: candidate names from observation folders
//! - [`matcher`]: identity resolution across catalogs, with host enrichment
//! - [`disambiguation`]: strategies for choosing among coordinate candidates
//! - [`runs`]: observing-run grouping
//! - [`typing`]: SNID re-typing
//! - [`spectrum`]: wavelength coverage and signal-to-noise of spectra
//! - [`photometry`]: light-curve summaries and the photometry book
//! - [`pipeline`]: folder import tying it all together
//! - [`reconcile`]: settling provisional registry names against the catalogs

pub mod associate;
pub mod disambiguation;
pub mod header;
pub mod matcher;
pub mod naming;
pub mod photometry;
pub mod pipeline;
pub mod reconcile;
pub mod runs;
mod snapshot;
pub mod spectrum;
pub mod typing;

pub use associate::{FileAssociator, FilePair, Pairs, best_match, observation_file};
pub use disambiguation::{AcceptNearest, Disambiguation, NonInteractive};
pub use header::{FitsHeader, ObservationHeader};
pub use matcher::{IdentityMatcher, MatchedBy, Resolution};
pub use naming::candidate_name;
pub use photometry::{LightCurve, LightCurveBook, LightCurveSummary, julian_date_to_date, parse_light_curve};
pub use pipeline::{
    FailedFile, ImportReport, ImportedFile, ImportedLightCurve, Importer, PhotometryReport, SkippedFile,
};
pub use reconcile::{
    DEFAULT_PROVISIONAL_PATTERN, FailedRecord, NameReconciler, NameUpdate, ReconcileOptions, ReconcileReport,
    ReconciledName, UntouchedRecord,
};
pub use runs::{RunAggregator, RunSighting};
pub use spectrum::{Spectrum, SpectrumMetrics};
pub use typing::{SnidRunner, TypingError, TypingOutcome, parse_snid_output};
