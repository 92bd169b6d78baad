//! Construction of routines and whole routes from validated route
//! description records.

use crate::composite::CompositeRoutine;
use crate::directory::WaypointDirectory;
use crate::error::{RouteError, RouteResult};
use crate::graph::{RouteGraph, RoutineId};
use crate::models::ManeuverRecord;
use crate::routine::RoutineKind;

/// Build one routine from a record: resolve waypoint keys, build the
/// boundary states, construct, run init, and apply an explicit duration
/// override if supplied.
pub fn routine_from_record(
    graph: &mut RouteGraph,
    directory: &WaypointDirectory,
    record: &ManeuverRecord,
) -> RouteResult<RoutineId> {
    let kind = RoutineKind::from_maneuver_name(record.routine);
    let entry_waypoint = directory.resolve(&record.waypoint0)?.clone();

    let routine = if kind.changes_bearing() {
        // Turns happen in place: a second waypoint or altitude is a
        // malformed record.
        if record.waypoint1.is_some() {
            return Err(RouteError::SingleWaypointOnly { kind });
        }
        if record.altitude1.is_some() {
            return Err(RouteError::SingleAltitudeOnly { kind });
        }
        let altitude = record.altitude0.map(|measure| measure.value);
        let entry = graph.new_state(Some(entry_waypoint.clone()), altitude, None);
        let exit = graph.new_state(Some(entry_waypoint), altitude, None);
        graph.new_routine(kind, entry, Some(exit))?
    } else {
        let exit_waypoint = match record.waypoint1.as_deref() {
            Some(name) => Some(directory.resolve(name)?.clone()),
            None => None,
        };
        let entry = graph.new_state(
            Some(entry_waypoint),
            record.altitude0.map(|measure| measure.value),
            None,
        );
        let exit = graph.new_state(
            exit_waypoint,
            record.altitude1.map(|measure| measure.value),
            None,
        );
        graph.new_routine(kind, entry, Some(exit))?
    };

    graph.init_routine(routine)?;
    if let Some(duration) = record.duration {
        graph.set_duration(routine, duration.value);
    }
    Ok(routine)
}

/// Assemble a whole route. Each routine is appended in order; when a
/// routine departs from the waypoint and altitude the chain currently
/// ends at, its entry is merged onto the chain's exit state so no bridging
/// placeholder is needed.
pub fn composite_from_records(
    graph: &mut RouteGraph,
    directory: &WaypointDirectory,
    records: &[ManeuverRecord],
) -> RouteResult<CompositeRoutine> {
    let mut composite: Option<CompositeRoutine> = None;
    for record in records {
        let routine = routine_from_record(graph, directory, record)?;
        match composite {
            None => {
                let entry = graph.routine(routine).entry();
                let mut assembled = CompositeRoutine::new(graph, entry, None)?;
                assembled.append(graph, routine)?;
                composite = Some(assembled);
            }
            Some(ref mut assembled) => {
                let exit = assembled.exit_state(graph);
                let entry = graph.routine(routine).entry();
                if graph.state(exit).waypoint == graph.state(entry).waypoint
                    && graph.state(exit).altitude == graph.state(entry).altitude
                {
                    graph.set_entry_state(routine, exit);
                }
                assembled.append(graph, routine)?;
            }
        }
    }
    composite.ok_or(RouteError::EmptyRoute)
}
