use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use sndb_core::Axis;
use sndb_ingest::DEFAULT_PROVISIONAL_PATTERN;

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Import every spectrum under a folder.
    Import(ImportArgs),
    /// Attach every light curve under a folder to its object.
    Photometry(PhotometryArgs),
    /// Settle provisional registry names against the catalogs.
    Reconcile(ReconcileArgs),
    /// Resolve a name and/or coordinate to one object.
    Resolve(ResolveArgs),
    /// Parse one RA or Dec string to decimal degrees.
    Coord(CoordArgs),
}

#[derive(Clone, Debug, Args)]
pub struct ImportArgs {
    /// Root folder of the observation tree.
    pub folder: PathBuf,

    /// Also import spectra under details folders.
    #[arg(long)]
    pub details: bool,

    /// Skip spectra without a calibration file instead of reporting them.
    #[arg(long)]
    pub require_calibration: bool,

    /// Offer up to N coordinate candidates for confirmation.
    #[arg(long, value_name = "N")]
    pub interactive: Option<usize>,

    /// Take the nearest coordinate candidate without asking.
    #[arg(long, conflicts_with = "interactive")]
    pub accept_nearest: bool,

    /// Registry snapshot to load before and save after the import.
    #[arg(long, value_name = "PATH")]
    pub registry: Option<PathBuf>,

    /// Re-type each imported spectrum with this SNID executable.
    #[arg(long, value_name = "PROGRAM")]
    pub snid: Option<PathBuf>,
}

#[derive(Clone, Debug, Args)]
pub struct PhotometryArgs {
    /// Root folder holding light-curve files.
    pub folder: PathBuf,

    /// Registry snapshot to load before and save after the import.
    #[arg(long, value_name = "PATH")]
    pub registry: Option<PathBuf>,
}

#[derive(Clone, Debug, Args)]
pub struct ReconcileArgs {
    /// Regular expression selecting registry names to reconcile.
    #[arg(long, default_value = DEFAULT_PROVISIONAL_PATTERN)]
    pub pattern: String,

    /// Replace the registry name instead of recording an alternate name.
    #[arg(long)]
    pub rename: bool,

    /// Also fill absent type, discovery and host fields from the match.
    #[arg(long)]
    pub fill: bool,

    /// Offer up to N inexact coordinate candidates for confirmation.
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub interactive: usize,

    /// Registry snapshot to load before and save after reconciliation.
    #[arg(long, value_name = "PATH")]
    pub registry: Option<PathBuf>,
}

#[derive(Clone, Debug, Args)]
pub struct ResolveArgs {
    /// Object name, e.g. "SN 2011fe".
    #[arg(long)]
    pub name: Option<String>,

    /// Right ascension (sexagesimal or decimal).
    #[arg(long, requires = "dec", allow_hyphen_values = true)]
    pub ra: Option<String>,

    /// Declination (sexagesimal or decimal).
    #[arg(long, requires = "ra", allow_hyphen_values = true)]
    pub dec: Option<String>,

    /// Offer up to N coordinate candidates for confirmation.
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub interactive: usize,

    /// Registry snapshot to resolve against.
    #[arg(long, value_name = "PATH")]
    pub registry: Option<PathBuf>,
}

#[derive(Clone, Debug, Args)]
pub struct CoordArgs {
    /// Coordinate text, e.g. "12:30:49.42" or "-45.5".
    #[arg(allow_hyphen_values = true)]
    pub text: String,

    /// Which axis the text describes.
    #[arg(long, value_enum)]
    pub axis: AxisArg,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum AxisArg {
    Ra,
    Dec,
}

impl From<AxisArg> for Axis {
    fn from(arg: AxisArg) -> Self {
        match arg {
            AxisArg::Ra => Self::Ra,
            AxisArg::Dec => Self::Dec,
        }
    }
}
