//! Error types for the flight path engine.

use crate::routine::RoutineKind;

pub type RouteResult<T> = Result<T, RouteError>;

/// Failure kinds surfaced by the engine. All are fatal to the operation
/// that raised them; callers adjust inputs and re-attempt.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("entry and exit state cannot both be null")]
    NullEndpoints,

    #[error("state at {waypoint} is already {slot} for another routine")]
    SlotOwned {
        waypoint: String,
        slot: &'static str,
    },

    #[error("routine {kind} not permitted between states {entry} and {exit}")]
    ConstraintUnsatisfied {
        kind: RoutineKind,
        entry: String,
        exit: String,
    },

    #[error("{kind} cannot run from {entry_altitude} ft to {exit_altitude} ft")]
    AltitudeOrder {
        kind: RoutineKind,
        entry_altitude: f64,
        exit_altitude: f64,
    },

    #[error("waypoint {0} is not registered")]
    UnknownWaypoint(String),

    #[error("waypoint {0} already exists")]
    DuplicateWaypoint(String),

    #[error("{kind} requires a single waypoint")]
    SingleWaypointOnly { kind: RoutineKind },

    #[error("{kind} requires a single altitude")]
    SingleAltitudeOnly { kind: RoutineKind },

    #[error("route description contains no maneuvers")]
    EmptyRoute,

    #[error("new routine has no matching state within composite")]
    NoAttachmentPoint,

    #[error("composite does not include this routine")]
    NotAMember,

    #[error("state repair did not settle after {0} hops")]
    PropagationDiverged(usize),
}
