//! Arena of navigational states and maneuver routines.
//!
//! States and routines are arena records addressed by typed ids, with
//! back-references stored as `Option<RoutineId>`. "Same instance" identity,
//! which the sequencing invariants depend on, is id equality.

use crate::error::{RouteError, RouteResult};
use crate::models::Waypoint;
use crate::routine::RoutineKind;

/// Index of a state in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(pub(crate) usize);

/// Index of a routine in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoutineId(pub(crate) usize);

/// A navigational state: where the aircraft is, how high, and which way it
/// points, plus single-owner back-references to the routine it feeds
/// (`entry_owner`) and the routine that produced it (`exit_owner`).
#[derive(Debug, Clone)]
pub struct StateRecord {
    pub waypoint: Waypoint,
    pub altitude: Option<f64>,
    pub bearing: Option<f64>,
    pub(crate) entry_owner: Option<RoutineId>,
    pub(crate) exit_owner: Option<RoutineId>,
}

impl StateRecord {
    /// True for the unfilled placeholder produced by `RouteGraph::null_state`.
    pub fn is_null(&self) -> bool {
        self.waypoint.is_null() && self.altitude.is_none() && self.bearing.is_none()
    }

    pub fn is_complete(&self) -> bool {
        !self.waypoint.is_null() && self.altitude.is_some() && self.bearing.is_some()
    }
}

/// One maneuver edge between two states.
#[derive(Debug, Clone)]
pub struct RoutineRecord {
    pub(crate) kind: RoutineKind,
    pub(crate) entry: StateId,
    pub(crate) exit: StateId,
    /// Explicit duration override in minutes; always wins over the
    /// per-kind formula.
    pub(crate) duration: Option<f64>,
}

impl RoutineRecord {
    pub fn kind(&self) -> RoutineKind {
        self.kind
    }

    pub fn entry(&self) -> StateId {
        self.entry
    }

    pub fn exit(&self) -> StateId {
        self.exit
    }
}

/// Arena holding every state and routine of a flight path under edit.
#[derive(Debug, Default, Clone)]
pub struct RouteGraph {
    states: Vec<StateRecord>,
    routines: Vec<RoutineRecord>,
}

impl RouteGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- states ----

    pub fn new_state(
        &mut self,
        waypoint: Option<Waypoint>,
        altitude: Option<f64>,
        bearing: Option<f64>,
    ) -> StateId {
        let id = StateId(self.states.len());
        self.states.push(StateRecord {
            waypoint: waypoint.unwrap_or_else(Waypoint::null),
            altitude,
            bearing,
            entry_owner: None,
            exit_owner: None,
        });
        id
    }

    /// Fresh unfilled placeholder state.
    pub fn null_state(&mut self) -> StateId {
        self.new_state(None, None, None)
    }

    /// Structural copy of a state: waypoint, altitude and bearing carry
    /// over, ownership does not. Used by grafts and turn synthesis to fork
    /// a junction into two independently-owned instances.
    pub fn clone_state(&mut self, state: StateId) -> StateId {
        let source = self.state(state).clone();
        let id = StateId(self.states.len());
        self.states.push(StateRecord {
            waypoint: source.waypoint,
            altitude: source.altitude,
            bearing: source.bearing,
            entry_owner: None,
            exit_owner: None,
        });
        id
    }

    pub fn state(&self, id: StateId) -> &StateRecord {
        &self.states[id.0]
    }

    pub(crate) fn state_mut(&mut self, id: StateId) -> &mut StateRecord {
        &mut self.states[id.0]
    }

    pub fn set_waypoint(&mut self, state: StateId, waypoint: Waypoint) {
        self.state_mut(state).waypoint = waypoint;
    }

    pub fn set_altitude(&mut self, state: StateId, altitude: f64) {
        self.state_mut(state).altitude = Some(altitude);
    }

    pub fn set_bearing(&mut self, state: StateId, bearing: f64) {
        self.state_mut(state).bearing = Some(bearing);
    }

    pub fn entry_owner(&self, state: StateId) -> Option<RoutineId> {
        self.state(state).entry_owner
    }

    pub fn exit_owner(&self, state: StateId) -> Option<RoutineId> {
        self.state(state).exit_owner
    }

    // ---- ownership protocol ----

    /// Record `routine` as the maneuver departing from `state`. No-op if
    /// already recorded; a slot held by a null routine may be displaced;
    /// a slot held by another concrete routine is a conflict.
    pub fn set_entry_owner(&mut self, state: StateId, routine: RoutineId) -> RouteResult<()> {
        match self.state(state).entry_owner {
            Some(current) if current == routine => Ok(()),
            Some(current) if self.routine(current).kind != RoutineKind::Null => {
                Err(RouteError::SlotOwned {
                    waypoint: self.state(state).waypoint.name.clone(),
                    slot: "entry",
                })
            }
            _ => {
                self.state_mut(state).entry_owner = Some(routine);
                Ok(())
            }
        }
    }

    /// Record `routine` as the maneuver arriving at `state`. Same rules as
    /// `set_entry_owner`.
    pub fn set_exit_owner(&mut self, state: StateId, routine: RoutineId) -> RouteResult<()> {
        match self.state(state).exit_owner {
            Some(current) if current == routine => Ok(()),
            Some(current) if self.routine(current).kind != RoutineKind::Null => {
                Err(RouteError::SlotOwned {
                    waypoint: self.state(state).waypoint.name.clone(),
                    slot: "exit",
                })
            }
            _ => {
                self.state_mut(state).exit_owner = Some(routine);
                Ok(())
            }
        }
    }

    pub fn clear_entry_owner(&mut self, state: StateId) {
        self.state_mut(state).entry_owner = None;
    }

    pub fn clear_exit_owner(&mut self, state: StateId) {
        self.state_mut(state).exit_owner = None;
    }

    /// Vacate whichever slots of the routine's boundary states still point
    /// at it.
    pub fn detach_routine(&mut self, routine: RoutineId) {
        let (entry, exit) = {
            let record = self.routine(routine);
            (record.entry, record.exit)
        };
        if self.state(entry).entry_owner == Some(routine) {
            self.clear_entry_owner(entry);
        }
        if self.state(exit).exit_owner == Some(routine) {
            self.clear_exit_owner(exit);
        }
    }

    // ---- routines ----

    /// Create a routine edge. The entry state is required to carry data;
    /// a missing exit becomes a fresh placeholder.
    pub fn new_routine(
        &mut self,
        kind: RoutineKind,
        entry: StateId,
        exit: Option<StateId>,
    ) -> RouteResult<RoutineId> {
        match exit {
            None if self.state(entry).is_null() => return Err(RouteError::NullEndpoints),
            Some(exit) if self.state(entry).is_null() && self.state(exit).is_null() => {
                return Err(RouteError::NullEndpoints)
            }
            _ => {}
        }
        let exit = match exit {
            Some(exit) => exit,
            None => self.null_state(),
        };
        let id = RoutineId(self.routines.len());
        self.routines.push(RoutineRecord {
            kind,
            entry,
            exit,
            duration: None,
        });
        Ok(id)
    }

    pub fn routine(&self, id: RoutineId) -> &RoutineRecord {
        &self.routines[id.0]
    }

    pub(crate) fn routine_mut(&mut self, id: RoutineId) -> &mut RoutineRecord {
        &mut self.routines[id.0]
    }

    pub fn set_duration(&mut self, routine: RoutineId, minutes: f64) {
        self.routine_mut(routine).duration = Some(minutes);
    }

    /// Re-point a routine's entry to another state. Ownership is not
    /// transferred; callers re-run `fix_routine_to_state` afterwards.
    pub fn set_entry_state(&mut self, routine: RoutineId, state: StateId) {
        self.routine_mut(routine).entry = state;
    }

    pub fn set_exit_state(&mut self, routine: RoutineId, state: StateId) {
        self.routine_mut(routine).exit = state;
    }

    // ---- propagation ----

    /// A state changed in its role as some routine's entry: repair
    /// backward along the chain. Each hop either satisfies the routine's
    /// check (chain stops) or repairs the far endpoint and continues from
    /// there. Revisiting a routine means two neighbors carry contradictory
    /// repair rules; the cascade fails instead of ping-ponging.
    pub fn entry_update(&mut self, state: StateId) -> RouteResult<()> {
        let mut visited: Vec<RoutineId> = Vec::new();
        let mut current = self.state(state).exit_owner;
        while let Some(routine) = current {
            if visited.contains(&routine) {
                return Err(RouteError::PropagationDiverged(visited.len()));
            }
            visited.push(routine);
            if self.state_check(routine) {
                break;
            }
            let (entry, exit) = {
                let record = self.routine(routine);
                (record.entry, record.exit)
            };
            tracing::trace!(?routine, hops = visited.len(), "repairing entry state backward");
            self.fix_state(routine, exit, entry)?;
            current = self.state(entry).exit_owner;
        }
        Ok(())
    }

    /// Mirror of `entry_update`: a state changed as some routine's exit,
    /// repair forward along the chain.
    pub fn exit_update(&mut self, state: StateId) -> RouteResult<()> {
        let mut visited: Vec<RoutineId> = Vec::new();
        let mut current = self.state(state).entry_owner;
        while let Some(routine) = current {
            if visited.contains(&routine) {
                return Err(RouteError::PropagationDiverged(visited.len()));
            }
            visited.push(routine);
            if self.state_check(routine) {
                break;
            }
            let (entry, exit) = {
                let record = self.routine(routine);
                (record.entry, record.exit)
            };
            tracing::trace!(?routine, hops = visited.len(), "repairing exit state forward");
            self.fix_state(routine, entry, exit)?;
            current = self.state(exit).entry_owner;
        }
        Ok(())
    }
}
