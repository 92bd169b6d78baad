pub mod composite;
pub mod directory;
pub mod error;
pub mod factory;
pub mod graph;
pub mod models;
pub mod performance;
pub mod routine;
pub mod spatial;

pub use composite::CompositeRoutine;
pub use directory::{active_waypoints, WaypointDirectory};
pub use error::{RouteError, RouteResult};
pub use factory::{composite_from_records, routine_from_record};
pub use graph::{RouteGraph, RoutineId, StateId};
pub use models::{ManeuverName, ManeuverRecord, Measure, MeasureUnit, Waypoint};
pub use routine::{reconcile, RoutineKind};
pub use spatial::{haversine_distance_ft, initial_bearing_deg, reciprocal_deg};
