//! Right-ascension / declination text normalization.
//!
//! Accepts decimal degrees (`"210.80208"`) or sexagesimal text in the
//! delimiter styles found in FITS headers and catalog pages
//! (`"14:03:12.5"`, `"14h03m12.5s"`, `"-45d30'00\""`, `"14 03 12.5"`).
//!
//! ## Field assignment
//!
//! The text is split into numeric tokens, each with the delimiter that
//! follows it. A unit suffix names the field directly:
//!
//! | suffix         | field          | unit    |
//! |----------------|----------------|---------|
//! | `h`, `hh`      | hours          | hours   |
//! | `d`, `dd`      | degrees        | degrees |
//! | `m`, `mm`, `'` | minutes        |         |
//! | `s`, `ss`, `"` | seconds        |         |
//!
//! A bare token, or one delimited by `:`, goes into the field right of the
//! right-most filled one. This is ambiguous for partial input (`"12 30"`
//! is read as hours and minutes) and is kept as-is for compatibility with
//! existing registry contents.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// A numeric run plus the delimiter characters that follow it.
static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-+]?[0-9]*\.?[0-9]+[^0-9+\-]*").expect("token regex is valid")
});

/// The numeric prefix of a token.
static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-+]?[0-9]*\.?[0-9]+").expect("number regex is valid"));

/// Which sky axis a coordinate string describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Ra,
    Dec,
}

impl Axis {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ra => "ra",
            Self::Dec => "dec",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit of the leading sexagesimal field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SexagesimalUnit {
    Hours,
    Degrees,
}

/// A sexagesimal value split into its three fields, before unit scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sexagesimal {
    /// `-1.0` if exactly one field was negative, else `1.0`.
    pub sign: f64,
    /// Absolute hour/degree, minute, and second values. Unfilled fields are `0.0`.
    pub values: [f64; 3],
    /// Unit fixed by an `h`/`d` suffix, if one was present.
    pub unit: Option<SexagesimalUnit>,
}

impl Sexagesimal {
    /// `deg + min/60 + sec/3600`, unsigned.
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.values[0] + self.values[1] / 60.0 + self.values[2] / 3600.0
    }
}

/// Split sexagesimal text into its fields.
///
/// # Errors
///
/// Returns [`CoreError::Parse`] if no numeric token is found, if more than
/// one field is negative, or if a token arrives after the seconds field is
/// already filled.
pub fn parse_sexagesimal(text: &str) -> Result<Sexagesimal, CoreError> {
    let lowered = text.to_lowercase();
    let mut parts: [Option<f64>; 3] = [None; 3];
    let mut unit = None;

    for token in TOKEN.find_iter(&lowered) {
        let token = token.as_str();
        let Some(number) = NUMBER.find(token) else {
            continue;
        };
        let value: f64 = number
            .as_str()
            .parse()
            .map_err(|_| CoreError::parse(text, format!("bad number '{}'", number.as_str())))?;
        let suffix = token[number.end()..].trim();

        if suffix.is_empty() {
            fill_right(&mut parts, value).map_err(|reason| CoreError::parse(text, reason))?;
            continue;
        }
        if suffix.contains('h') {
            parts[0] = Some(value);
            unit = Some(SexagesimalUnit::Hours);
        }
        if suffix.contains('d') {
            parts[0] = Some(value);
            unit = Some(SexagesimalUnit::Degrees);
        }
        if suffix.contains('m') || suffix.contains('\'') {
            parts[1] = Some(value);
        }
        if suffix.contains('s') || suffix.contains('"') {
            parts[2] = Some(value);
        }
        if suffix.contains(':') {
            fill_right(&mut parts, value).map_err(|reason| CoreError::parse(text, reason))?;
        }
    }

    if parts.iter().all(Option::is_none) {
        return Err(CoreError::parse(text, "no numeric fields"));
    }

    // `is_sign_negative` keeps the sign of "-00:30:00".
    let negatives = parts
        .iter()
        .flatten()
        .filter(|v| v.is_sign_negative())
        .count();
    if negatives > 1 {
        return Err(CoreError::parse(text, "only one field can be negative"));
    }

    Ok(Sexagesimal {
        sign: if negatives == 1 { -1.0 } else { 1.0 },
        values: parts.map(|p| p.map_or(0.0, f64::abs)),
        unit,
    })
}

/// Put `value` in the field right of the right-most filled one.
fn fill_right(parts: &mut [Option<f64>; 3], value: f64) -> Result<(), &'static str> {
    match parts.iter().rposition(Option::is_some) {
        None => parts[0] = Some(value),
        Some(2) => return Err("too many sexagesimal fields"),
        Some(i) => parts[i + 1] = Some(value),
    }
    Ok(())
}

/// Parse RA or Dec text into decimal degrees.
///
/// Plain real numbers are already degrees and are returned unchanged. RA
/// sexagesimal text is read as hours unless a `d` suffix says degrees.
///
/// # Errors
///
/// Returns [`CoreError::Parse`] for malformed sexagesimal text or a
/// non-finite result.
pub fn parse_coordinate(text: &str, axis: Axis) -> Result<f64, CoreError> {
    let trimmed = text.trim();
    if let Ok(value) = trimmed.parse::<f64>() {
        if value.is_finite() {
            return Ok(value);
        }
        return Err(CoreError::parse(text, "not a finite number"));
    }

    let sexagesimal = parse_sexagesimal(trimmed)?;
    let degrees = match axis {
        Axis::Ra => match sexagesimal.unit.unwrap_or(SexagesimalUnit::Hours) {
            SexagesimalUnit::Hours => 15.0 * sexagesimal.magnitude(),
            SexagesimalUnit::Degrees => sexagesimal.magnitude(),
        },
        Axis::Dec => sexagesimal.sign * sexagesimal.magnitude(),
    };
    if degrees.is_finite() {
        Ok(degrees)
    } else {
        Err(CoreError::parse(text, "not a finite number"))
    }
}

/// A normalized sky position in decimal degrees.
///
/// RA is wrapped into `[0, 360)`; Dec is within `[-90, 90]`. Equality
/// compares degrees only, not the source text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate", into = "RawCoordinate")]
pub struct Coordinate {
    ra_deg: f64,
    dec_deg: f64,
    source_text: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct RawCoordinate {
    ra_deg: f64,
    dec_deg: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = CoreError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Self::from_degrees(raw.ra_deg, raw.dec_deg)
    }
}

impl From<Coordinate> for RawCoordinate {
    fn from(coord: Coordinate) -> Self {
        Self {
            ra_deg: coord.ra_deg,
            dec_deg: coord.dec_deg,
        }
    }
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.ra_deg.to_bits() == other.ra_deg.to_bits()
            && self.dec_deg.to_bits() == other.dec_deg.to_bits()
    }
}

impl Coordinate {
    /// Build a coordinate from decimal degrees.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Parse`] if either value is non-finite or Dec is
    /// outside `[-90, 90]`.
    pub fn from_degrees(ra_deg: f64, dec_deg: f64) -> Result<Self, CoreError> {
        if !ra_deg.is_finite() || !dec_deg.is_finite() {
            return Err(CoreError::parse(
                format!("{ra_deg} {dec_deg}"),
                "non-finite coordinate",
            ));
        }
        if !(-90.0..=90.0).contains(&dec_deg) {
            return Err(CoreError::parse(
                dec_deg.to_string(),
                "declination outside [-90, 90]",
            ));
        }
        let ra_deg = ra_deg.rem_euclid(360.0);
        Ok(Self {
            // rem_euclid can round up to exactly 360.0 for tiny negatives.
            ra_deg: if ra_deg >= 360.0 { 0.0 } else { ra_deg },
            dec_deg,
            source_text: None,
        })
    }

    /// Parse a coordinate from RA and Dec text.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Parse`] if either axis fails to parse or the
    /// result is out of range.
    pub fn parse(ra_text: &str, dec_text: &str) -> Result<Self, CoreError> {
        let ra = parse_coordinate(ra_text, Axis::Ra)?;
        let dec = parse_coordinate(dec_text, Axis::Dec)?;
        let mut coord = Self::from_degrees(ra, dec)?;
        coord.source_text = Some(format!("{} {}", ra_text.trim(), dec_text.trim()));
        Ok(coord)
    }

    #[must_use]
    pub const fn ra_deg(&self) -> f64 {
        self.ra_deg
    }

    #[must_use]
    pub const fn dec_deg(&self) -> f64 {
        self.dec_deg
    }

    /// The text this coordinate was parsed from, if any.
    #[must_use]
    pub fn source_text(&self) -> Option<&str> {
        self.source_text.as_deref()
    }

    /// Flat-sky squared offset `Δra² + Δdec²` in square degrees.
    ///
    /// Only meaningful for small separations away from the poles and the
    /// RA wrap.
    #[must_use]
    pub fn squared_offset(&self, other: &Self) -> f64 {
        let d_ra = self.ra_deg - other.ra_deg;
        let d_dec = self.dec_deg - other.dec_deg;
        d_ra.mul_add(d_ra, d_dec * d_dec)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:+.6})", self.ra_deg, self.dec_deg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn decimal_dec_is_exact() {
        assert_eq!(parse_coordinate("-45.5", Axis::Dec).unwrap(), -45.5);
    }

    #[test]
    fn decimal_ra_is_not_scaled() {
        assert_eq!(parse_coordinate("210.5", Axis::Ra).unwrap(), 210.5);
    }

    #[test]
    fn hms_with_unit_suffixes() {
        let ra = parse_coordinate("14h03m12.5s", Axis::Ra).unwrap();
        let expected = 15.0 * (14.0 + 3.0 / 60.0 + 12.5 / 3600.0);
        assert!((ra - expected).abs() < 1e-6, "{ra} != {expected}");
    }

    #[test]
    fn colon_ra_defaults_to_hours() {
        let ra = parse_coordinate("14:03:12.5", Axis::Ra).unwrap();
        let expected = 15.0 * (14.0 + 3.0 / 60.0 + 12.5 / 3600.0);
        assert!((ra - expected).abs() < 1e-9);
    }

    #[test]
    fn degree_suffix_keeps_ra_in_degrees() {
        let ra = parse_coordinate("210d48m07.5s", Axis::Ra).unwrap();
        let expected = 210.0 + 48.0 / 60.0 + 7.5 / 3600.0;
        assert!((ra - expected).abs() < 1e-9);
    }

    #[rstest]
    #[case("-45:30:00", -45.5)]
    #[case("-45d30'00\"", -45.5)]
    #[case("+45 30 00", 45.5)]
    #[case("-00:30:00", -0.5)]
    #[case("12:30", 12.5)]
    fn dec_sexagesimal_variants(#[case] text: &str, #[case] expected: f64) {
        let dec = parse_coordinate(text, Axis::Dec).unwrap();
        assert!((dec - expected).abs() < 1e-9, "{text}: {dec} != {expected}");
    }

    #[test]
    fn two_negative_fields_rejected() {
        let err = parse_coordinate("-10:-20:30", Axis::Dec).unwrap_err();
        assert!(matches!(err, CoreError::Parse { .. }));
    }

    #[test]
    fn no_numbers_rejected() {
        assert!(parse_coordinate("unknown", Axis::Ra).is_err());
        assert!(parse_coordinate("", Axis::Dec).is_err());
    }

    #[test]
    fn fourth_bare_field_rejected() {
        assert!(parse_coordinate("10 20 30 40", Axis::Dec).is_err());
    }

    #[test]
    fn bare_token_fills_right_of_suffixed_field() {
        let parts = parse_sexagesimal("10m 30").unwrap();
        assert_eq!(parts.values, [0.0, 10.0, 30.0]);
        assert_eq!(parts.unit, None);
    }

    #[test]
    fn non_finite_decimal_rejected() {
        assert!(parse_coordinate("NaN", Axis::Ra).is_err());
        assert!(parse_coordinate("inf", Axis::Dec).is_err());
    }

    #[test]
    fn coordinate_wraps_ra_and_checks_dec() {
        let c = Coordinate::from_degrees(-10.0, 20.0).unwrap();
        assert_eq!(c.ra_deg(), 350.0);
        assert_eq!(Coordinate::from_degrees(360.0, 0.0).unwrap().ra_deg(), 0.0);
        assert!(Coordinate::from_degrees(10.0, 91.0).is_err());
    }

    #[test]
    fn coordinate_parse_keeps_source_text() {
        let c = Coordinate::parse(" 14:03:12.5 ", "-45:30:00").unwrap();
        assert_eq!(c.source_text(), Some("14:03:12.5 -45:30:00"));
        assert!((c.dec_deg() + 45.5).abs() < 1e-12);
    }

    #[test]
    fn squared_offset_is_flat() {
        let a = Coordinate::from_degrees(10.0, 20.0).unwrap();
        let b = Coordinate::from_degrees(13.0, 24.0).unwrap();
        assert!((a.squared_offset(&b) - 25.0).abs() < 1e-12);
        assert_eq!(a.squared_offset(&a), 0.0);
    }

    #[test]
    fn coordinate_equality_ignores_source_text() {
        let parsed = Coordinate::parse("150.0", "-30.0").unwrap();
        let built = Coordinate::from_degrees(150.0, -30.0).unwrap();
        assert_eq!(parsed, built);
    }

    #[test]
    fn coordinate_serde_validates() {
        let json = r#"{"ra_deg": 370.0, "dec_deg": 10.0}"#;
        let c: Coordinate = serde_json::from_str(json).unwrap();
        assert_eq!(c.ra_deg(), 10.0);
        let bad = r#"{"ra_deg": 10.0, "dec_deg": 100.0}"#;
        assert!(serde_json::from_str::<Coordinate>(bad).is_err());
    }
}
