//! Waypoint directory: name -> coordinates, immutable once registered.

use std::collections::BTreeMap;

use crate::composite::CompositeRoutine;
use crate::error::{RouteError, RouteResult};
use crate::graph::RouteGraph;
use crate::models::Waypoint;

/// Explicit, scoped registry of known waypoints. Threaded through factory
/// calls rather than held as ambient state.
#[derive(Debug, Default, Clone)]
pub struct WaypointDirectory {
    waypoints: BTreeMap<String, Waypoint>,
}

impl WaypointDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a waypoint. Fails if the name is already taken.
    pub fn register(&mut self, waypoint: Waypoint) -> RouteResult<()> {
        if self.waypoints.contains_key(&waypoint.name) {
            return Err(RouteError::DuplicateWaypoint(waypoint.name));
        }
        self.waypoints.insert(waypoint.name.clone(), waypoint);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Waypoint> {
        self.waypoints.get(name)
    }

    /// Resolve a name or fail with the offending key.
    pub fn resolve(&self, name: &str) -> RouteResult<&Waypoint> {
        self.lookup(name)
            .ok_or_else(|| RouteError::UnknownWaypoint(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

/// Deduplicated names of every waypoint touched by the given composites.
pub fn active_waypoints(graph: &RouteGraph, composites: &[&CompositeRoutine]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for composite in composites {
        for state in composite.state_sequence(graph) {
            let name = &graph.state(state).waypoint.name;
            if !names.iter().any(|n| n == name) {
                names.push(name.clone());
            }
        }
    }
    names
}
