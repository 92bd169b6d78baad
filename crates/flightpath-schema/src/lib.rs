//! Parsing and validation of the route description format.
//!
//! The core engine consumes already-validated [`ManeuverRecord`]s; this
//! crate is the boundary that turns untrusted JSON into them. Structural
//! checks (field types, known maneuver names, measure shape) come from
//! serde; the semantic pass checks units and value ranges.

use flightpath_core::models::{ManeuverRecord, MeasureUnit, Waypoint};

pub type SchemaResult<T> = Result<T, SchemaError>;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("route description is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("maneuver {index}: {field} must be given in {expected}")]
    WrongUnit {
        index: usize,
        field: &'static str,
        expected: &'static str,
    },

    #[error("maneuver {index}: {field} must be a finite non-negative number (got {value})")]
    InvalidValue {
        index: usize,
        field: &'static str,
        value: f64,
    },

    #[error("waypoint {name}: {field} is not a finite coordinate (got {value})")]
    InvalidCoordinate {
        name: String,
        field: &'static str,
        value: f64,
    },

    #[error("waypoint at index {0} has an empty name")]
    EmptyWaypointName(usize),
}

/// Parse and validate a route description: a JSON array of maneuver
/// records.
pub fn parse_route(input: &str) -> SchemaResult<Vec<ManeuverRecord>> {
    let records: Vec<ManeuverRecord> = serde_json::from_str(input)?;
    validate_records(&records)?;
    Ok(records)
}

/// Semantic validation of already-deserialized records.
pub fn validate_records(records: &[ManeuverRecord]) -> SchemaResult<()> {
    for (index, record) in records.iter().enumerate() {
        check_measure(index, "altitude0", record.altitude0, MeasureUnit::Ft)?;
        check_measure(index, "altitude1", record.altitude1, MeasureUnit::Ft)?;
        check_measure(index, "duration", record.duration, MeasureUnit::Minutes)?;
    }
    Ok(())
}

fn check_measure(
    index: usize,
    field: &'static str,
    measure: Option<flightpath_core::models::Measure>,
    expected: MeasureUnit,
) -> SchemaResult<()> {
    let Some(measure) = measure else {
        return Ok(());
    };
    if measure.unit != expected {
        return Err(SchemaError::WrongUnit {
            index,
            field,
            expected: match expected {
                MeasureUnit::Ft => "ft",
                MeasureUnit::Minutes => "minutes",
            },
        });
    }
    if !measure.value.is_finite() || measure.value < 0.0 {
        return Err(SchemaError::InvalidValue {
            index,
            field,
            value: measure.value,
        });
    }
    Ok(())
}

/// Parse and validate a waypoint file: a JSON array of named coordinates.
pub fn parse_waypoints(input: &str) -> SchemaResult<Vec<Waypoint>> {
    let waypoints: Vec<Waypoint> = serde_json::from_str(input)?;
    for (index, waypoint) in waypoints.iter().enumerate() {
        if waypoint.name.is_empty() {
            return Err(SchemaError::EmptyWaypointName(index));
        }
        for (field, value) in [
            ("latitude", waypoint.latitude),
            ("longitude", waypoint.longitude),
        ] {
            if !value.is_finite() {
                return Err(SchemaError::InvalidCoordinate {
                    name: waypoint.name.clone(),
                    field,
                    value,
                });
            }
        }
    }
    Ok(waypoints)
}
