//! Date-keyed feed parser.
//!
//! Tolerant about missing measurements (they default to `0.0`), strict about
//! structure: any shape or type mismatch fails the whole parse.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{Asteroid, parse_date};

/// Envelope key used by the live API around the date-keyed mapping.
const ENVELOPE_KEY: &str = "near_earth_objects";

/// Parse the raw body returned by the feed endpoint.
pub fn parse_feed(body: &str) -> Result<Vec<Asteroid>> {
    let raw: Value = serde_json::from_str(body)?;
    parse_value(&raw)
}

/// Flatten an already-decoded feed into asteroid records.
///
/// Output follows the key order of the source, then entry order within a
/// key. A repeated `id` keeps its first position but takes the data of its
/// last occurrence.
pub fn parse_value(raw: &Value) -> Result<Vec<Asteroid>> {
    let groups = date_groups(raw)?;

    let mut positions: HashMap<i64, usize> = HashMap::new();
    let mut asteroids: Vec<Asteroid> = Vec::new();

    for (key, entries) in groups {
        let date = parse_date(key)
            .ok_or_else(|| Error::FeedParse(format!("'{key}' is not a YYYY-MM-DD date key")))?;
        let entries = entries
            .as_array()
            .ok_or_else(|| Error::FeedParse(format!("entries for {key} are not an array")))?;

        for entry in entries {
            let asteroid = parse_entry(entry, date)?;
            if let Some(&index) = positions.get(&asteroid.id) {
                debug!(id = asteroid.id, date = %key, "Duplicate feed entry replaces earlier one");
                asteroids[index] = asteroid;
            } else {
                positions.insert(asteroid.id, asteroids.len());
                asteroids.push(asteroid);
            }
        }
    }

    Ok(asteroids)
}

fn date_groups(raw: &Value) -> Result<&Map<String, Value>> {
    let root = raw
        .as_object()
        .ok_or_else(|| Error::FeedParse("feed is not a JSON object".into()))?;

    match root.get(ENVELOPE_KEY) {
        Some(inner) => inner
            .as_object()
            .ok_or_else(|| Error::FeedParse(format!("'{ENVELOPE_KEY}' is not an object"))),
        None => Ok(root),
    }
}

/// The grouping key is authoritative for the date; the entry's own
/// `close_approach_date` is ignored.
fn parse_entry(entry: &Value, date: NaiveDate) -> Result<Asteroid> {
    let obj = entry
        .as_object()
        .ok_or_else(|| Error::FeedParse(format!("entry under {date} is not an object")))?;

    let id = parse_id(obj.get("id"))?;
    let codename = obj
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::FeedParse(format!("asteroid {id}: missing 'name'")))?
        .to_string();

    let absolute_magnitude =
        number_or_zero(obj.get("absolute_magnitude_h"), id, "absolute_magnitude_h")?;
    let estimated_diameter = number_or_zero(
        entry.pointer("/estimated_diameter/kilometers/estimated_diameter_max"),
        id,
        "estimated_diameter",
    )?;

    let approach = first_close_approach(obj.get("close_approach_data"), id)?;
    let relative_velocity = number_or_zero(
        approach.and_then(|a| a.pointer("/relative_velocity/kilometers_per_hour")),
        id,
        "relative_velocity",
    )?;
    let distance_from_earth = number_or_zero(
        approach.and_then(|a| a.pointer("/miss_distance/kilometers")),
        id,
        "miss_distance",
    )?;

    let is_potentially_hazardous = match obj.get("is_potentially_hazardous_asteroid") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(other) => {
            return Err(Error::FeedParse(format!(
                "asteroid {id}: hazard flag is not a boolean: {other}"
            )));
        }
    };

    Ok(Asteroid {
        id,
        codename,
        close_approach_date: date,
        absolute_magnitude,
        estimated_diameter,
        relative_velocity,
        distance_from_earth,
        is_potentially_hazardous,
    })
}

/// The live API sends ids as strings ("3542519"); fixtures often use numbers.
fn parse_id(value: Option<&Value>) -> Result<i64> {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| Error::FeedParse(format!("id {n} is not an integer"))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::FeedParse(format!("id '{s}' is not an integer"))),
        Some(other) => Err(Error::FeedParse(format!("id has unexpected type: {other}"))),
        None => Err(Error::FeedParse("entry has no 'id'".into())),
    }
}

fn first_close_approach(value: Option<&Value>, id: i64) -> Result<Option<&Value>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => Ok(items.first()),
        Some(other) => Err(Error::FeedParse(format!(
            "asteroid {id}: close_approach_data is not an array: {other}"
        ))),
    }
}

/// Read a finite float that may be encoded as a JSON number or a numeric
/// string.
fn number_or_zero(value: Option<&Value>, id: i64, field: &str) -> Result<f64> {
    let number = match value {
        None | Some(Value::Null) => return Ok(0.0),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| Error::FeedParse(format!("asteroid {id}: {field} out of range")))?,
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| {
            Error::FeedParse(format!("asteroid {id}: {field} '{s}' is not a number"))
        })?,
        Some(other) => {
            return Err(Error::FeedParse(format!(
                "asteroid {id}: {field} has unexpected type: {other}"
            )));
        }
    };
    if !number.is_finite() {
        return Err(Error::FeedParse(format!(
            "asteroid {id}: {field} is not finite ({number})"
        )));
    }
    Ok(number)
}
