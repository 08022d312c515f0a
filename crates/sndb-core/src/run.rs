//! Observing runs: one night of observation by one observer.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Separator used when a target list is stored as a single string.
pub const TARGET_SEPARATOR: &str = " | ";

/// Identifier assigned to a run when it is first created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

/// The `(date, observer)` pair that identifies a run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunKey {
    pub date: NaiveDate,
    pub observer: String,
}

/// Ordered, deduplicated list of target names.
///
/// Serializes as the names joined by [`TARGET_SEPARATOR`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TargetList(Vec<String>);

impl TargetList {
    /// Append `name` unless it is already present. Returns whether it was added.
    pub fn insert(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.0.push(name.to_string());
        true
    }

    /// Replace `from` with `to` in place. If `to` is already listed, `from`
    /// is dropped instead. Returns whether `from` was present.
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        let Some(index) = self.0.iter().position(|t| t == from) else {
            return false;
        };
        if self.contains(to) {
            self.0.remove(index);
        } else {
            self.0[index] = to.to_string();
        }
        true
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|t| t == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn joined(&self) -> String {
        self.0.join(TARGET_SEPARATOR)
    }
}

impl From<String> for TargetList {
    fn from(joined: String) -> Self {
        let mut list = Self::default();
        for name in joined.split(TARGET_SEPARATOR.trim()) {
            let name = name.trim();
            if !name.is_empty() {
                list.insert(name);
            }
        }
        list
    }
}

impl From<TargetList> for String {
    fn from(list: TargetList) -> Self {
        list.joined()
    }
}

/// A single observing session.
///
/// Instrument, telescope, seeing, and reducer are captured when the run is
/// created and never updated. Targets only grow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservingRun {
    pub id: RunId,
    pub date: NaiveDate,
    pub observer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telescope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seeing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reducer: Option<String>,
    #[serde(default)]
    pub targets: TargetList,
}

impl ObservingRun {
    #[must_use]
    pub fn key(&self) -> RunKey {
        RunKey {
            date: self.date,
            observer: self.observer.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_list_deduplicates_in_order() {
        let mut targets = TargetList::default();
        assert!(targets.insert("SN 2020abc"));
        assert!(targets.insert("PSN J1234"));
        assert!(!targets.insert("SN 2020abc"));
        assert_eq!(targets.joined(), "SN 2020abc | PSN J1234");
        assert_eq!(targets.len(), 2);
    }

    #[test]
    fn rename_keeps_position_and_dedupes() {
        let mut targets = TargetList::from("PSN J1234 | SN 2016A".to_string());
        assert!(targets.rename("PSN J1234", "SN 2013ab"));
        assert_eq!(targets.joined(), "SN 2013ab | SN 2016A");

        assert!(targets.rename("SN 2013ab", "SN 2016A"));
        assert_eq!(targets.joined(), "SN 2016A");
        assert!(!targets.rename("absent", "x"));
    }

    #[test]
    fn target_list_serializes_joined() {
        let mut targets = TargetList::default();
        targets.insert("SN 2020abc");
        targets.insert("SN 2016A");
        let json = serde_json::to_string(&targets).unwrap();
        assert_eq!(json, r#""SN 2020abc | SN 2016A""#);
        let back: TargetList = serde_json::from_str(&json).unwrap();
        assert_eq!(back, targets);
    }

    #[test]
    fn joined_string_with_duplicates_collapses() {
        let list = TargetList::from("a | b | a".to_string());
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn run_key_matches_fields() {
        let run = ObservingRun {
            id: RunId(7),
            date: NaiveDate::from_ymd_opt(2015, 3, 1).unwrap(),
            observer: "Shivvers".to_string(),
            instrument: Some("Kast".to_string()),
            telescope: None,
            seeing: None,
            reducer: None,
            targets: TargetList::default(),
        };
        assert_eq!(run.key().observer, "Shivvers");
        assert_eq!(run.id.to_string(), "run-7");
    }
}
