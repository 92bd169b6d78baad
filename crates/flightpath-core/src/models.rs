//! Wire-level data models for route descriptions.

use serde::{Deserialize, Serialize};

/// A named navigational fix. Immutable once registered; states reference
/// waypoints by value and compare them by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Waypoint {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }

    /// Placeholder waypoint carried by unfilled states.
    pub fn null() -> Self {
        Self {
            name: "Null".to_string(),
            latitude: -9999.0,
            longitude: -9999.0,
        }
    }

    pub fn is_null(&self) -> bool {
        self.name == "Null"
    }
}

impl PartialEq for Waypoint {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// A value with an explicit unit ("ft" for altitudes, "minutes" for
/// durations).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Measure {
    pub value: f64,
    pub unit: MeasureUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureUnit {
    Ft,
    Minutes,
}

impl Measure {
    pub fn feet(value: f64) -> Self {
        Self {
            value,
            unit: MeasureUnit::Ft,
        }
    }

    pub fn minutes(value: f64) -> Self {
        Self {
            value,
            unit: MeasureUnit::Minutes,
        }
    }
}

/// The fixed maneuver-name enumeration understood by the route
/// description format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManeuverName {
    #[serde(rename = "SLR")]
    Slr,
    Transit,
    InsideTurn,
    OutsideTurn,
    RaceTrackTurn,
    ProcedureTurn,
    FaamTurn,
    ProfileAscent,
    ProfileDescent,
}

/// One maneuver of a route description. `waypoint1`, `altitude1` and
/// `duration` are omitted when they equal the entry-side value or are
/// unknown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManeuverRecord {
    pub routine: ManeuverName,
    pub waypoint0: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waypoint1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude0: Option<Measure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude1: Option<Measure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Measure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waypoint_equality_is_by_name() {
        let a = Waypoint::new("B", 35.0, 45.0);
        let b = Waypoint::new("B", 0.0, 0.0);
        assert_eq!(a, b);
    }

    #[test]
    fn record_omits_empty_fields() {
        let record = ManeuverRecord {
            routine: ManeuverName::InsideTurn,
            waypoint0: "B".to_string(),
            waypoint1: None,
            altitude0: Some(Measure::feet(10000.0)),
            altitude1: None,
            duration: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["routine"], "InsideTurn");
        assert!(json.get("waypoint1").is_none());
        assert!(json.get("duration").is_none());
    }

    #[test]
    fn slr_name_round_trips() {
        let json = serde_json::json!({ "routine": "SLR", "waypoint0": "A" });
        let record: ManeuverRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.routine, ManeuverName::Slr);
    }
}
