//! Dataset module - exercise history as served by `/api/data`

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Exercise name -> points in server order
pub type ExerciseSeries = BTreeMap<String, Vec<DataPoint>>;

/// One aggregated point of an exercise time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Kept verbatim, this is the x-axis key
    pub timestamp: String,
    /// Metric fields (`maxWeight`, `maxOneRepMax`, `totalVolume`, ...)
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl DataPoint {
    pub fn new(timestamp: &str) -> Self {
        Self {
            timestamp: timestamp.to_string(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_metric(mut self, name: &str, value: f64) -> Self {
        self.fields.insert(name.to_string(), Value::from(value));
        self
    }

    /// Numeric value of a metric field, `None` if absent or not a number
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.fields.get(name).and_then(Value::as_f64)
    }

    /// Parsed timestamp for plotting
    pub fn time(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}

/// Parse the timestamp formats the server has been seen to emit.
///
/// RFC 3339 (`2024-01-01T00:00:00-08:00`), `2024-01-01 07:30:00` and plain
/// dates. Naive values are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Per-user record. The server has shipped three layouts over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserRecord {
    /// exercise -> points
    Flat(ExerciseSeries),
    /// grouping key -> exercise -> points
    Grouped(BTreeMap<String, ExerciseSeries>),
    /// one exercise map per grouping, grouping key is the index
    Indexed(Vec<ExerciseSeries>),
}

impl UserRecord {
    /// Points for an exercise under the given grouping.
    ///
    /// Flat records ignore the grouping. Grouped and indexed records need
    /// one; without it (or with an unknown key) the result is empty.
    pub fn series(&self, exercise: &str, grouping: Option<&str>) -> &[DataPoint] {
        let exercises = match (self, grouping) {
            (UserRecord::Flat(exercises), _) => Some(exercises),
            (UserRecord::Grouped(groups), Some(key)) => groups.get(key),
            (UserRecord::Indexed(groups), Some(key)) => {
                key.parse::<usize>().ok().and_then(|i| groups.get(i))
            }
            (_, None) => None,
        };

        exercises
            .and_then(|e| e.get(exercise))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Full dataset: user -> record. Never mutated after the fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExerciseDataset {
    users: BTreeMap<String, UserRecord>,
}

impl ExerciseDataset {
    pub fn new(users: BTreeMap<String, UserRecord>) -> Self {
        Self { users }
    }

    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }

    /// Users in sorted order
    pub fn users(&self) -> impl Iterator<Item = (&str, &UserRecord)> {
        self.users.iter().map(|(name, record)| (name.as_str(), record))
    }

    pub fn user(&self, name: &str) -> Option<&UserRecord> {
        self.users.get(name)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
