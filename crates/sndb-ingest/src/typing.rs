//! Spectral re-typing with SNID.
//!
//! SNID is run as `snid plot=0 inter=0 <spectrum>`. Output without the
//! completion banner means SNID found no template match. A banner-terminated
//! output that cannot be read is an error, not a non-match.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tokio::process::Command;

const BANNER: &str = "Thank you for using SNID! Goodbye.";
const SUBTYPE_SECTION: &str = "Best subtype(s)";
const SUBTYPE_LINES: usize = 10;

/// Result of a successful SNID invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TypingOutcome {
    /// Best types by fraction and slope, comma-joined and deduplicated.
    Match { object_type: String, subtype: String },
    NoMatch,
}

#[derive(Debug, Error)]
pub enum TypingError {
    /// The classifier could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The classifier finished but its report is not in the expected shape.
    #[error("unreadable SNID output: {reason}")]
    Unparsable { reason: String },
}

/// Parse SNID's stdout.
pub fn parse_snid_output(output: &str) -> Result<TypingOutcome, TypingError> {
    if !output.contains(BANNER) {
        return Ok(TypingOutcome::NoMatch);
    }
    let (types, subtypes) = output.split_once(SUBTYPE_SECTION).ok_or_else(|| TypingError::Unparsable {
        reason: format!("no '{SUBTYPE_SECTION}' section"),
    })?;
    let type_lines: Vec<&str> = types.lines().collect();
    let subtype_lines: Vec<&str> = subtypes.lines().take(SUBTYPE_LINES).collect();
    Ok(TypingOutcome::Match {
        object_type: best_by_fraction_and_slope(&type_lines, 2)?,
        subtype: best_by_fraction_and_slope(&subtype_lines, 3)?,
    })
}

/// Column `column` of the lines under `[fraction]` and `[slope]`, joined.
/// A slope line carrying a `NOTE` falls back to the fraction value.
fn best_by_fraction_and_slope(lines: &[&str], column: usize) -> Result<String, TypingError> {
    let fraction = value_under(lines, "[fraction]", column)?;
    let slope_line = line_under(lines, "[slope]")?;
    let slope = if slope_line.contains("NOTE") {
        fraction.clone()
    } else {
        column_of(slope_line, column, "[slope]")?
    };
    let mut best = vec![fraction];
    if !best.contains(&slope) {
        best.push(slope);
    }
    Ok(best.join(","))
}

fn line_under<'a>(lines: &[&'a str], heading: &str) -> Result<&'a str, TypingError> {
    let index = lines
        .iter()
        .position(|line| line.trim() == heading)
        .ok_or_else(|| TypingError::Unparsable {
            reason: format!("no {heading} heading"),
        })?;
    lines.get(index + 1).copied().ok_or_else(|| TypingError::Unparsable {
        reason: format!("nothing under {heading}"),
    })
}

fn value_under(lines: &[&str], heading: &str, column: usize) -> Result<String, TypingError> {
    column_of(line_under(lines, heading)?, column, heading)
}

fn column_of(line: &str, column: usize, heading: &str) -> Result<String, TypingError> {
    line.split_whitespace()
        .nth(column)
        .map(str::to_string)
        .ok_or_else(|| TypingError::Unparsable {
            reason: format!("short line under {heading}: '{}'", line.trim()),
        })
}

/// Runs the SNID executable.
#[derive(Debug, Clone)]
pub struct SnidRunner {
    program: PathBuf,
}

impl Default for SnidRunner {
    fn default() -> Self {
        Self::new("snid")
    }
}

impl SnidRunner {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Classify the ASCII spectrum at `spectrum`.
    pub async fn run(&self, spectrum: &Path) -> Result<TypingOutcome, TypingError> {
        let output = Command::new(&self.program)
            .arg("plot=0")
            .arg("inter=0")
            .arg(spectrum)
            .output()
            .await
            .map_err(|source| TypingError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let outcome = parse_snid_output(&stdout)?;
        tracing::debug!(path = %spectrum.display(), ?outcome, "SNID finished");
        Ok(outcome)
    }
}
