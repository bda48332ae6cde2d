//! Encoding of the `history_data` column.
//!
//! History is stored as a JSON array of objects:
//!
//! ```json
//! [{"temperature":40,"humidity":20,"hydrated":false,
//!   "sweat_volume":2.5,"water_loss":1.8,"body_temperature":38.6}]
//! ```
//!
//! Reading is lenient about what other writers put in the column: a blank or
//! null value is an empty history, and a JSON string holding the array is
//! unwrapped. Earlier versions of the quiz stored the Python `str()` of the
//! history list inside that string, with single-quoted localized keys
//! (`{'温度': 40, '喝水': '否', ...}`); those rows decode as well.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::history::HistorySnapshot;
use crate::simulation::SimulationResult;

#[derive(Debug, Serialize, Deserialize)]
struct HistoryEntryRow {
    #[serde(alias = "温度")]
    temperature: i32,
    #[serde(alias = "湿度")]
    humidity: u8,
    #[serde(alias = "喝水", deserialize_with = "hydration_flag")]
    hydrated: bool,
    #[serde(alias = "出汗量")]
    sweat_volume: f64,
    #[serde(alias = "水分流失")]
    water_loss: f64,
    #[serde(alias = "体温")]
    body_temperature: f64,
}

impl From<&SimulationResult> for HistoryEntryRow {
    fn from(r: &SimulationResult) -> Self {
        Self {
            temperature: r.temperature,
            humidity: r.humidity,
            hydrated: r.hydrated,
            sweat_volume: r.sweat_volume,
            water_loss: r.water_loss,
            body_temperature: r.body_temperature,
        }
    }
}

impl From<HistoryEntryRow> for SimulationResult {
    fn from(row: HistoryEntryRow) -> Self {
        Self {
            temperature: row.temperature,
            humidity: row.humidity,
            hydrated: row.hydrated,
            sweat_volume: row.sweat_volume,
            water_loss: row.water_loss,
            body_temperature: row.body_temperature,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Bool(bool),
    Text(String),
}

fn hydration_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match RawFlag::deserialize(deserializer)? {
        RawFlag::Bool(flag) => Ok(flag),
        RawFlag::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "是" | "yes" | "true" => Ok(true),
            "否" | "no" | "false" => Ok(false),
            other => Err(D::Error::custom(format!("unrecognized hydration flag '{other}'"))),
        },
    }
}

/// Encodes a snapshot for the `history_data` column.
///
/// Fails if any metric is not a finite number, since JSON cannot carry it.
pub fn encode_history(history: &HistorySnapshot) -> Result<String, String> {
    if let Some(pos) = history.iter().position(|r| {
        !(r.sweat_volume.is_finite() && r.water_loss.is_finite() && r.body_temperature.is_finite())
    }) {
        return Err(format!("entry {pos} has a non-finite metric"));
    }

    let rows: Vec<HistoryEntryRow> = history.iter().map(HistoryEntryRow::from).collect();
    serde_json::to_string(&rows).map_err(|e| e.to_string())
}

/// Rewrites a Python literal made of lists, dicts, strings, numbers,
/// `True`, `False` and `None` as JSON text.
fn python_literal_to_json(text: &str) -> Result<String, String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                let mut literal = String::new();
                loop {
                    match chars.next() {
                        None => return Err("unterminated string".to_string()),
                        Some(ch) if ch == c => break,
                        Some('\\') => match chars.next() {
                            Some('n') => literal.push('\n'),
                            Some('t') => literal.push('\t'),
                            Some('r') => literal.push('\r'),
                            Some(escaped) => literal.push(escaped),
                            None => return Err("unterminated escape".to_string()),
                        },
                        Some(ch) => literal.push(ch),
                    }
                }
                out.push_str(&serde_json::to_string(&literal).map_err(|e| e.to_string())?);
            }
            c if c.is_ascii_digit() => {
                out.push(c);
                while let Some(&next) = chars.peek() {
                    if !(next.is_ascii_digit() || matches!(next, '.' | 'e' | 'E' | '+' | '-')) {
                        break;
                    }
                    out.push(next);
                    chars.next();
                }
            }
            c if c.is_ascii_alphabetic() => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if !next.is_ascii_alphanumeric() {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                out.push_str(match word.as_str() {
                    "True" => "true",
                    "False" => "false",
                    "None" => "null",
                    other => return Err(format!("unsupported name '{other}'")),
                });
            }
            c => out.push(c),
        }
    }
    Ok(out)
}

/// Decodes a `history_data` value. A missing value is an empty history.
pub fn decode_history(raw: Option<&str>) -> Result<Vec<SimulationResult>, String> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(Vec::new());
    };

    let value: Value = serde_json::from_str(raw).map_err(|e| format!("not valid JSON: {e}"))?;
    let value = match value {
        Value::Null => return Ok(Vec::new()),
        Value::String(inner) => serde_json::from_str::<Value>(&inner).or_else(|json_err| {
            python_literal_to_json(&inner)
                .and_then(|json| serde_json::from_str::<Value>(&json).map_err(|e| e.to_string()))
                .map_err(|literal_err| {
                    format!(
                        "string-wrapped history is neither JSON ({json_err}) nor a Python literal ({literal_err})"
                    )
                })
        })?,
        other => other,
    };

    let rows: Vec<HistoryEntryRow> =
        serde_json::from_value(value).map_err(|e| format!("unexpected history shape: {e}"))?;
    Ok(rows.into_iter().map(SimulationResult::from).collect())
}
