//! # Report Model
//!
//! The records a report is rendered from: rubric items and per-student
//! evaluations, as they come out of the data layer.
//!
//! Storage is loose about types. Text columns can be `null`, the literal
//! `"None"`, or a number; levels can be numbers or numeric strings; the level
//! map itself is sometimes stored as a JSON string. Deserialization accepts
//! all of that, and [`ReportInput::normalize`] turns it into a clean
//! [`Snapshot`] before any layout code runs.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

use crate::error::ReportError;

/// Number of proficiency levels per rubric item.
pub const LEVEL_COUNT: usize = 4;

/// Report input as delivered by the data layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportInput {
    /// Overrides the configured report title when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, alias = "configuracion_items")]
    pub items: Vec<RubricItem>,

    #[serde(default, alias = "evaluaciones_alumnos")]
    pub evaluations: Vec<Evaluation>,
}

/// One rubric item: a letter, what it evaluates, and four level descriptors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RubricItem {
    #[serde(rename = "letra", alias = "identifier", default, deserialize_with = "lenient_string")]
    pub identifier: String,
    #[serde(
        rename = "descripcion",
        alias = "description",
        default,
        deserialize_with = "lenient_string"
    )]
    pub description: String,
    #[serde(rename = "nivel_1", alias = "level_1", default, deserialize_with = "lenient_string")]
    pub level_1: String,
    #[serde(rename = "nivel_2", alias = "level_2", default, deserialize_with = "lenient_string")]
    pub level_2: String,
    #[serde(rename = "nivel_3", alias = "level_3", default, deserialize_with = "lenient_string")]
    pub level_3: String,
    #[serde(rename = "nivel_4", alias = "level_4", default, deserialize_with = "lenient_string")]
    pub level_4: String,
}

impl RubricItem {
    pub fn new(identifier: &str, description: &str, levels: [&str; LEVEL_COUNT]) -> Self {
        Self {
            identifier: identifier.to_string(),
            description: description.to_string(),
            level_1: levels[0].to_string(),
            level_2: levels[1].to_string(),
            level_3: levels[2].to_string(),
            level_4: levels[3].to_string(),
        }
    }

    /// Descriptor of `level` (1-based), if it is in range.
    pub fn level_text(&self, level: u8) -> Option<&str> {
        match level {
            1 => Some(&self.level_1),
            2 => Some(&self.level_2),
            3 => Some(&self.level_3),
            4 => Some(&self.level_4),
            _ => None,
        }
    }

    /// The six table fields in column order.
    pub fn fields(&self) -> [&str; 6] {
        [
            &self.identifier,
            &self.description,
            &self.level_1,
            &self.level_2,
            &self.level_3,
            &self.level_4,
        ]
    }

    fn normalized(&self) -> Self {
        Self {
            identifier: clean_text(&self.identifier),
            description: clean_text(&self.description),
            level_1: clean_text(&self.level_1),
            level_2: clean_text(&self.level_2),
            level_3: clean_text(&self.level_3),
            level_4: clean_text(&self.level_4),
        }
    }
}

/// The rubric: items kept sorted by identifier, unique per identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rubric {
    items: Vec<RubricItem>,
}

impl Rubric {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `item`, replacing any item with the same identifier.
    ///
    /// Returns the replaced item.
    pub fn upsert(&mut self, item: RubricItem) -> Result<Option<RubricItem>, ReportError> {
        if item.identifier.trim().is_empty() {
            return Err(ReportError::InvalidInput(
                "rubric item has an empty identifier".to_string(),
            ));
        }
        match self
            .items
            .binary_search_by(|held| held.identifier.cmp(&item.identifier))
        {
            Ok(idx) => Ok(Some(std::mem::replace(&mut self.items[idx], item))),
            Err(idx) => {
                self.items.insert(idx, item);
                Ok(None)
            }
        }
    }

    /// Delete the item with `identifier`.
    pub fn remove(&mut self, identifier: &str) -> Option<RubricItem> {
        let idx = self.position(identifier)?;
        Some(self.items.remove(idx))
    }

    pub fn get(&self, identifier: &str) -> Option<&RubricItem> {
        self.position(identifier).map(|idx| &self.items[idx])
    }

    /// Column index of `identifier` in rubric order.
    pub fn position(&self, identifier: &str) -> Option<usize> {
        self.items
            .binary_search_by(|held| held.identifier.as_str().cmp(identifier))
            .ok()
    }

    pub fn items(&self) -> &[RubricItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A recorded proficiency level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Level {
    /// A level in `1..=4`.
    Selected(u8),
    /// Whatever was stored when it was not a usable level.
    Unrecognized(String),
}

impl Level {
    pub fn selected(&self) -> Option<u8> {
        match self {
            Level::Selected(n) => Some(*n),
            Level::Unrecognized(_) => None,
        }
    }

    fn from_value(value: &Value) -> Self {
        let parsed = match value {
            Value::Number(n) => n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                    .map(|f| f as u64)
            }),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        match parsed {
            Some(n) if (1..=LEVEL_COUNT as u64).contains(&n) => Level::Selected(n as u8),
            _ => Level::Unrecognized(match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Selected(n) => write!(f, "{}", n),
            Level::Unrecognized(raw) => write!(f, "{}", raw),
        }
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Level::Selected(n) => serializer.serialize_u8(*n),
            Level::Unrecognized(raw) => serializer.serialize_str(raw),
        }
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Level::from_value(&value))
    }
}

/// One student's evaluation on one date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Student display string (name plus cohort label).
    #[serde(
        rename = "nombre_alumno",
        alias = "student",
        default,
        deserialize_with = "lenient_string"
    )]
    pub student: String,
    /// Rubric identifier to recorded level.
    #[serde(rename = "puntos", alias = "levels", default, deserialize_with = "lenient_levels")]
    pub levels: BTreeMap<String, Level>,
    /// ISO date (`YYYY-MM-DD`).
    #[serde(rename = "fecha", alias = "date", default, deserialize_with = "lenient_string")]
    pub date: String,
}

impl Evaluation {
    pub fn new(student: &str, date: &str, levels: &[(&str, u8)]) -> Self {
        Self {
            student: student.to_string(),
            levels: levels
                .iter()
                .map(|(id, level)| (id.to_string(), Level::from_value(&Value::from(*level))))
                .collect(),
            date: date.to_string(),
        }
    }

    /// The selected level for `identifier`, if one was recorded and is valid.
    pub fn level_for(&self, identifier: &str) -> Option<u8> {
        self.levels.get(identifier).and_then(Level::selected)
    }

    /// Check the evaluation is ready to be recorded against `rubric`.
    ///
    /// A complete evaluation names a student and has a valid level for
    /// every rubric item.
    pub fn check_complete(&self, rubric: &Rubric) -> Result<(), ReportError> {
        if self.student.trim().is_empty() {
            return Err(ReportError::InvalidInput(
                "evaluation has no student name".to_string(),
            ));
        }
        for item in rubric.items() {
            if self.level_for(&item.identifier).is_none() {
                return Err(ReportError::InvalidInput(format!(
                    "evaluation of '{}' has no level for item '{}'",
                    self.student, item.identifier
                )));
            }
        }
        Ok(())
    }

    fn normalized(&self) -> Self {
        let student = clean_text(&self.student);
        let mut levels = BTreeMap::new();
        for (identifier, level) in &self.levels {
            let identifier = clean_text(identifier);
            if identifier.is_empty() {
                warn!(student = %student, "dropping level recorded under an empty identifier");
                continue;
            }
            if let Level::Unrecognized(raw) = level {
                warn!(
                    student = %student,
                    item = %identifier,
                    value = %raw,
                    "level is not in 1..=4; rendering it without a mark"
                );
            }
            levels.insert(identifier, level.clone());
        }
        Self {
            student,
            levels,
            date: normalize_date(&self.date),
        }
    }
}

/// Which evaluations go into the scorecard section.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DateFilter {
    #[default]
    All,
    /// Exact match on the normalized ISO date.
    On(String),
}

impl DateFilter {
    /// Parse `"all"`, `"todas"`, `"*"` (or an empty string) or an ISO date.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_lowercase().as_str() {
            "" | "all" | "todas" | "todos" | "*" => DateFilter::All,
            _ => DateFilter::On(normalize_date(trimmed)),
        }
    }

    pub fn matches(&self, evaluation: &Evaluation) -> bool {
        match self {
            DateFilter::All => true,
            DateFilter::On(date) => evaluation.date == *date,
        }
    }
}

/// Normalized, read-only input for one render pass.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub title: Option<String>,
    pub rubric: Rubric,
    /// Evaluations ordered by date, ties kept in input order.
    pub evaluations: Vec<Evaluation>,
}

impl Snapshot {
    /// Evaluations selected by `filter`, in report order.
    pub fn filtered<'a>(
        &'a self,
        filter: &'a DateFilter,
    ) -> impl Iterator<Item = &'a Evaluation> + 'a {
        self.evaluations.iter().filter(move |e| filter.matches(e))
    }
}

impl ReportInput {
    /// Parse report input from JSON.
    pub fn from_json(json: &str) -> Result<Self, ReportError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Clean every record once, before layout.
    ///
    /// Text sentinels become empty strings, dates are reduced to
    /// `YYYY-MM-DD`, rubric items are deduplicated by identifier (the last
    /// one wins) and evaluations are ordered by date.
    pub fn normalize(&self) -> Snapshot {
        let mut rubric = Rubric::new();
        for item in &self.items {
            let item = item.normalized();
            let identifier = item.identifier.clone();
            match rubric.upsert(item) {
                Ok(Some(_)) => {
                    warn!(item = %identifier, "duplicate rubric item; keeping the last one")
                }
                Ok(None) => {}
                Err(_) => warn!("skipping rubric item without an identifier"),
            }
        }

        let mut evaluations: Vec<Evaluation> =
            self.evaluations.iter().map(Evaluation::normalized).collect();
        evaluations.sort_by(|a, b| a.date.cmp(&b.date));

        Snapshot {
            title: self
                .title
                .as_deref()
                .map(clean_text)
                .filter(|t| !t.is_empty()),
            rubric,
            evaluations,
        }
    }
}

/// Coerce storage placeholders for "no value" to an empty string.
pub fn clean_text(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed {
        "None" | "none" | "null" | "NULL" | "nan" | "NaN" | "undefined" => String::new(),
        _ => trimmed.to_string(),
    }
}

/// Reduce a stored date or timestamp to its `YYYY-MM-DD` prefix.
fn normalize_date(raw: &str) -> String {
    let trimmed = clean_text(raw);
    let bytes = trimmed.as_bytes();
    let looks_iso = bytes.len() >= 10
        && bytes[..10].iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if looks_iso {
        trimmed[..10].to_string()
    } else {
        trimmed
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    })
}

fn lenient_levels<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, Level>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let object = match value {
        Value::Object(map) => map,
        Value::String(s) if s.trim().is_empty() => return Ok(BTreeMap::new()),
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(Value::Object(map)) => map,
            _ => {
                return Err(serde::de::Error::custom(format!(
                    "level map is a string but not a JSON object: {s}"
                )))
            }
        },
        Value::Null => return Ok(BTreeMap::new()),
        other => {
            return Err(serde::de::Error::custom(format!(
                "expected a map of item to level, got {other}"
            )))
        }
    };
    Ok(object
        .iter()
        .map(|(k, v)| (k.clone(), Level::from_value(v)))
        .collect())
}
