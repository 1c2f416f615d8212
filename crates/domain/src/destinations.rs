use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;

const MAX_NAME_LENGTH: usize = 200;

/// Canonical destination shape stored on the itinerary. The list order is
/// significant: it is the sole input to day-bucketing.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Destination {
    pub external_id: String,
    pub name: String,
    pub significance: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub date: Option<String>,
    #[serde(default)]
    pub has_nearby_airport: bool,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub cost_per_day: f64,
    pub banner_url: Option<String>,
}

/// Raw destination record as submitted by clients. Field names follow the
/// upstream dataset; unrecognized fields are dropped silently.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDestination {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub significance: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, rename = "Date")]
    pub date: Option<String>,
    #[serde(default, rename = "airportWithin50kmRadius")]
    pub airport_within_50km_radius: bool,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    pub cost_per_day: f64,
    #[serde(default, rename = "image_url")]
    pub image_url: Option<String>,
}

/// One entry of a raw destination batch. Clients may submit records either
/// flat or nested one level; normalization flattens before field mapping.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum RawDestinationEntry {
    Many(Vec<RawDestination>),
    One(RawDestination),
}

/// Flattens a raw batch (preserving relative order) and maps each record to
/// the canonical [`Destination`] shape. Pure and deterministic.
pub fn normalize_destinations(
    entries: Vec<RawDestinationEntry>,
) -> DomainResult<Vec<Destination>> {
    let mut flat = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            RawDestinationEntry::Many(batch) => flat.extend(batch),
            RawDestinationEntry::One(raw) => flat.push(raw),
        }
    }
    flat.into_iter().map(normalize_destination).collect()
}

fn normalize_destination(raw: RawDestination) -> DomainResult<Destination> {
    let external_id = raw.id.trim();
    if external_id.is_empty() {
        return Err(DomainError::Validation("destination id is required".into()));
    }
    let name = raw.name.trim();
    if name.is_empty() {
        return Err(DomainError::Validation(
            "destination name is required".into(),
        ));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(DomainError::Validation(format!(
            "destination name exceeds max length of {MAX_NAME_LENGTH}"
        )));
    }
    if !raw.cost_per_day.is_finite() || raw.cost_per_day < 0.0 {
        return Err(DomainError::Validation(format!(
            "destination cost_per_day must be a non-negative number, got {}",
            raw.cost_per_day
        )));
    }

    Ok(Destination {
        external_id: external_id.to_string(),
        name: name.to_string(),
        significance: raw.significance,
        city: raw.city,
        state: raw.state,
        kind: raw.kind,
        date: raw.date,
        has_nearby_airport: raw.airport_within_50km_radius,
        start_time: raw.start_time,
        end_time: raw.end_time,
        cost_per_day: raw.cost_per_day,
        banner_url: raw.image_url,
    })
}
