//! Calibration-file header extraction.
//!
//! Reads the primary HDU header of a FITS file (2880-byte blocks of
//! 80-character cards, terminated by `END`) and maps it onto
//! [`ObservationHeader`] through a fixed alias table.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use sndb_core::{Coordinate, CoreError};

const CARD_LEN: usize = 80;
const BLOCK_LEN: usize = 2880;

/// Header values keyed by lowercased keyword, as trimmed text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FitsHeader {
    cards: BTreeMap<String, String>,
}

impl FitsHeader {
    /// Read the primary header of the FITS file at `path`.
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        let context = path.display().to_string();
        let file = File::open(path).map_err(|e| CoreError::data_integrity(&context, e.to_string()))?;
        Self::read(BufReader::new(file), &context)
    }

    /// Read a primary header from `reader`. `context` names the source in
    /// errors.
    pub fn read(mut reader: impl Read, context: &str) -> Result<Self, CoreError> {
        let mut header = Self::default();
        let mut block = [0u8; BLOCK_LEN];
        loop {
            reader.read_exact(&mut block).map_err(|e| {
                CoreError::data_integrity(context, format!("header ends without END card: {e}"))
            })?;
            for card in block.chunks_exact(CARD_LEN) {
                let card = String::from_utf8_lossy(card);
                if card.get(..8).map(str::trim_end) == Some("END") {
                    return Ok(header);
                }
                header.push_card(&card);
            }
        }
    }

    /// Build a header from keyword/value pairs.
    pub fn from_pairs<K: AsRef<str>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            cards: pairs
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
                .collect(),
        }
    }

    fn push_card(&mut self, card: &str) {
        let (Some(keyword), Some("= "), Some(raw)) = (card.get(..8), card.get(8..10), card.get(10..))
        else {
            return;
        };
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return;
        }
        if let Some(value) = card_value(raw) {
            // First occurrence wins, matching FITS readers.
            self.cards.entry(keyword.to_ascii_lowercase()).or_insert(value);
        }
    }

    /// Trimmed value of `keyword` (case-insensitive). Blank values are absent.
    #[must_use]
    pub fn get(&self, keyword: &str) -> Option<&str> {
        self.cards
            .get(&keyword.to_ascii_lowercase())
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// First keyword in `aliases` with a value.
    #[must_use]
    pub fn first_of(&self, aliases: &[&str]) -> Option<&str> {
        aliases.iter().find_map(|alias| self.get(alias))
    }
}

/// Value text of a card after `= `, with strings unquoted and inline
/// comments removed.
fn card_value(raw: &str) -> Option<String> {
    let raw = raw.trim_start();
    if let Some(quoted) = raw.strip_prefix('\'') {
        // '' is an escaped quote inside a string.
        let mut value = String::new();
        let mut chars = quoted.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    value.push('\'');
                    continue;
                }
                return Some(value.trim().to_string());
            }
            value.push(c);
        }
        return None;
    }
    let value = raw.split('/').next().unwrap_or_default().trim();
    Some(value.to_string())
}

/// Logical header fields and their keywords, in priority order.
pub mod aliases {
    pub const OBJECT: &[&str] = &["object"];
    pub const RA: &[&str] = &["ra"];
    pub const DEC: &[&str] = &["dec"];
    pub const DATE: &[&str] = &["date-obs", "date"];
    pub const UTC: &[&str] = &["utc"];
    pub const MJD: &[&str] = &["mjd-obs"];
    pub const EXPOSURE: &[&str] = &["exptime"];
    pub const AIRMASS: &[&str] = &["airmass"];
    pub const OBSERVATORY: &[&str] = &["observat"];
    pub const INSTRUMENT: &[&str] = &["instrume", "telescop"];
    pub const OBSERVER: &[&str] = &["observer"];
    pub const REDUCER: &[&str] = &["reducer"];
    pub const SEEING: &[&str] = &["seeing"];
    pub const POSITION_ANGLE: &[&str] = &["tub"];
    pub const PARALLACTIC_ANGLE: &[&str] = &["opt_pa"];
}

/// Observation metadata from a calibration header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationHeader {
    pub object: Option<String>,
    pub coordinate: Option<Coordinate>,
    pub date: NaiveDate,
    pub utc: Option<String>,
    pub mjd: Option<f64>,
    pub exposure: Option<f64>,
    pub airmass: Option<f64>,
    pub observatory: Option<String>,
    pub instrument: Option<String>,
    pub observer: String,
    pub reducer: Option<String>,
    pub seeing: Option<f64>,
    pub position_angle: Option<f64>,
    pub parallactic_angle: Option<f64>,
}

impl ObservationHeader {
    /// Read and map the header of the file at `path`.
    pub fn read(path: &Path) -> Result<Self, CoreError> {
        Self::from_header(&FitsHeader::open(path)?, &path.display().to_string())
    }

    /// Map raw header values onto logical fields.
    ///
    /// # Errors
    ///
    /// [`CoreError::DataIntegrity`] if `date` or `observer` is missing, the
    /// date is unparsable, or a numeric field is not a number.
    /// [`CoreError::Parse`] if RA/Dec are present but unparsable.
    pub fn from_header(header: &FitsHeader, context: &str) -> Result<Self, CoreError> {
        let text = |aliases: &[&str]| header.first_of(aliases).map(str::to_string);
        let number = |field: &str, aliases: &[&str]| -> Result<Option<f64>, CoreError> {
            header
                .first_of(aliases)
                .map(|v| {
                    v.parse::<f64>().map_err(|_| {
                        CoreError::data_integrity(context, format!("{field} is not a number: '{v}'"))
                    })
                })
                .transpose()
        };

        let date = header_date(header, context)?;
        let observer = text(aliases::OBSERVER)
            .ok_or_else(|| CoreError::data_integrity(context, "missing observer"))?;

        let coordinate = match (header.first_of(aliases::RA), header.first_of(aliases::DEC)) {
            (Some(ra), Some(dec)) => Some(Coordinate::parse(ra, dec)?),
            _ => None,
        };

        let mut observatory = text(aliases::OBSERVATORY);
        let mut instrument = None;
        for alias in aliases::INSTRUMENT {
            let Some(value) = header.get(alias) else {
                continue;
            };
            let value = match remap_instrument(value) {
                Some((name, site)) => {
                    observatory = Some(site.to_string());
                    name.to_string()
                }
                None => value.to_string(),
            };
            instrument.get_or_insert(value);
        }

        Ok(Self {
            object: text(aliases::OBJECT),
            coordinate,
            date,
            utc: text(aliases::UTC),
            mjd: number("mjd", aliases::MJD)?,
            exposure: number("exposure", aliases::EXPOSURE)?,
            airmass: number("airmass", aliases::AIRMASS)?,
            observatory,
            instrument,
            observer,
            reducer: text(aliases::REDUCER),
            seeing: number("seeing", aliases::SEEING)?,
            position_angle: number("position angle", aliases::POSITION_ANGLE)?,
            parallactic_angle: number("parallactic angle", aliases::PARALLACTIC_ANGLE)?,
        })
    }
}

/// Legacy instrument names: returns `(instrument, observatory)`.
#[must_use]
pub fn remap_instrument(value: &str) -> Option<(&'static str, &'static str)> {
    let lower = value.to_lowercase();
    if lower == "shane" || lower == "lick" {
        Some(("Kast", "Lick 3m, Shane"))
    } else if lower.contains("lris") {
        Some(("LRIS", "Keck 1, 10m"))
    } else if lower.contains("deimos") {
        Some(("DEIMOS", "Keck 2, 10m"))
    } else {
        None
    }
}

fn header_date(header: &FitsHeader, context: &str) -> Result<NaiveDate, CoreError> {
    let value = header
        .first_of(aliases::DATE)
        .ok_or_else(|| CoreError::data_integrity(context, "missing observation date"))?;
    parse_header_date(value)
        .ok_or_else(|| CoreError::data_integrity(context, format!("unparsable date '{value}'")))
}

/// ISO-8601 date-times, then bare dates including the pre-2000 `DD/MM/YY`.
fn parse_header_date(value: &str) -> Option<NaiveDate> {
    const DATE_TIMES: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
    const DATES: [&str; 2] = ["%Y-%m-%d", "%d/%m/%y"];
    let value = value.trim();
    DATE_TIMES
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|at| at.date())
        .or_else(|| {
            DATES
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        })
}
