//! Beacon sightings and the table of last-seen readings.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::time::{Timestamp, is_expired};

/// One iBeacon proximity reading as delivered by the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeaconSighting {
    pub uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub major: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minor: Option<String>,
    pub distance: f64,
    pub timestamp: Timestamp,
}

impl BeaconSighting {
    /// Build a sighting, treating empty major/minor strings as absent.
    #[must_use]
    pub fn new(
        uuid: impl Into<String>,
        major: Option<String>,
        minor: Option<String>,
        distance: f64,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            major: major.filter(|m| !m.is_empty()),
            minor: minor.filter(|m| !m.is_empty()),
            distance,
            timestamp,
        }
    }

    /// Table and rate-limiter key: `uuid[_major][_minor]`.
    #[must_use]
    pub fn key(&self) -> String {
        let mut key = self.uuid.clone();
        for part in [&self.major, &self.minor].into_iter().flatten() {
            key.push('_');
            key.push_str(part);
        }
        key
    }

    /// Presence device identifier: the uuid without `-`/`_`, uppercased.
    #[must_use]
    pub fn normalized_device_id(&self) -> String {
        self.uuid
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_uppercase)
            .collect()
    }
}

/// Last sighting per beacon key, with age-based eviction.
#[derive(Debug, Clone, Default)]
pub struct BeaconTable {
    sightings: HashMap<String, BeaconSighting>,
}

impl BeaconTable {
    /// Record a sighting, replacing any earlier one with the same key, and
    /// evict sightings older than `ttl` relative to the new one.
    pub fn record(&mut self, sighting: BeaconSighting, ttl: Duration) {
        let now = sighting.timestamp;
        self.sightings
            .retain(|_, seen| !is_expired(seen.timestamp, now, ttl));
        self.sightings.insert(sighting.key(), sighting);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&BeaconSighting> {
        self.sightings.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sightings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sightings.is_empty()
    }

    /// All sightings ordered by key, for stable payloads.
    #[must_use]
    pub fn sightings(&self) -> Vec<&BeaconSighting> {
        let mut all: Vec<_> = self.sightings.values().collect();
        all.sort_by(|a, b| a.key().cmp(&b.key()));
        all
    }

    /// The JSON-encoded list carried in the `_beacons` attribute.
    #[must_use]
    pub fn to_json_list(&self) -> String {
        serde_json::to_string(&self.sightings()).unwrap_or_else(|_| "[]".to_string())
    }
}
