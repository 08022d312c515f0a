//! Console confirmation of coordinate candidates.

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use sndb_catalog::CoordinateMatch;
use sndb_ingest::Disambiguation;

/// Shows each candidate on stderr and asks for a yes/no on stdin, nearest
/// first. The first "y" wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleDisambiguation;

#[async_trait]
impl Disambiguation for ConsoleDisambiguation {
    async fn choose(&self, candidates: &[CoordinateMatch]) -> Option<usize> {
        let lines: Vec<String> = candidates.iter().map(describe).collect();
        let asked = tokio::task::spawn_blocking(move || {
            ask(&lines, io::stdin().lock(), io::stderr().lock())
        })
        .await;
        match asked {
            Ok(Ok(choice)) => choice,
            Ok(Err(e)) => {
                tracing::warn!(%e, "console prompt failed, declining");
                None
            }
            Err(e) => {
                tracing::warn!(%e, "console prompt task failed, declining");
                None
            }
        }
    }
}

fn describe(candidate: &CoordinateMatch) -> String {
    let record = &candidate.record;
    let or_dash = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
    format!(
        "{}  host={}  ra={}  dec={}  date={}  type={}  offset²={:.3e}",
        record.name,
        or_dash(record.host_name.clone()),
        or_dash(record.coordinate.as_ref().map(|c| format!("{:.6}", c.ra_deg()))),
        or_dash(record.coordinate.as_ref().map(|c| format!("{:+.6}", c.dec_deg()))),
        or_dash(record.discovery_date.map(|d| d.to_string())),
        or_dash(record.object_type.clone()),
        candidate.offset_sq,
    )
}

/// Ask about each line in turn. End of input declines the rest.
fn ask(lines: &[String], mut input: impl BufRead, mut out: impl Write) -> io::Result<Option<usize>> {
    for (index, line) in lines.iter().enumerate() {
        write!(out, "[{}/{}] {line}\n  is this the object? [y/N] ", index + 1, lines.len())?;
        out.flush()?;
        let mut answer = String::new();
        if input.read_line(&mut answer)? == 0 {
            writeln!(out)?;
            return Ok(None);
        }
        if matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes") {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sndb_core::{Coordinate, ObjectRecord};

    fn lines() -> Vec<String> {
        vec!["SN 2011fe".to_string(), "SN 2011fg".to_string(), "SN 2011fh".to_string()]
    }

    #[test]
    fn first_yes_wins() {
        let mut out = Vec::new();
        let choice = ask(&lines(), "n\nYes\ny\n".as_bytes(), &mut out).unwrap();
        assert_eq!(choice, Some(1));
        let shown = String::from_utf8(out).unwrap();
        assert!(shown.contains("[2/3] SN 2011fg"));
        assert!(!shown.contains("SN 2011fh"));
    }

    #[test]
    fn eof_declines() {
        let choice = ask(&lines(), "n\n".as_bytes(), io::sink()).unwrap();
        assert_eq!(choice, None);
    }

    #[test]
    fn description_lists_known_fields() {
        let mut record = ObjectRecord::new("SN 2011fe");
        record.coordinate = Some(Coordinate::from_degrees(210.774, 54.274).unwrap());
        record.object_type = Some("Ia".to_string());
        let line = describe(&CoordinateMatch {
            record,
            offset_sq: 0.0001,
        });
        assert!(line.starts_with("SN 2011fe  host=-  ra=210.774000  dec=+54.274000"));
        assert!(line.contains("type=Ia"));
        assert!(line.contains("date=-"));
    }
}
