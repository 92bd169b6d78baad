//! Maneuver variants and their dispatch: validity predicates, repair
//! rules, duration formulas, and neighbor constraints.
//!
//! The variant family is a closed tagged set; behavior differences are
//! `match` arms rather than an inheritance chain, which keeps equivalence
//! queries and profile self-replacement simple pattern matches.

use std::fmt;

use crate::error::{RouteError, RouteResult};
use crate::graph::{RouteGraph, RoutineId};
use crate::models::{ManeuverName, ManeuverRecord, Measure};
use crate::performance::{science_true_airspeed, transit_true_airspeed};
use crate::spatial::{haversine_distance_ft, initial_bearing_deg, reciprocal_deg};

/// Climb and descent rate assumed for profile legs, in ft/min.
const PROFILE_RATE_FT_PER_MIN: f64 = 1000.0;

/// Flat duration of every turn variant, in minutes.
const TURN_DURATION_MIN: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutineKind {
    /// Structural placeholder bridging a gap; no maneuver performed.
    Null,
    /// Straight-and-level science run between two waypoints.
    Slr,
    /// Straight-and-level transit between two waypoints, flown faster.
    Transit,
    /// Climb between two waypoints.
    ProfileAscent,
    /// Descent between two waypoints.
    ProfileDescent,
    InsideTurn,
    OutsideTurn,
    RaceTrackTurn,
    ProcedureTurn,
    FaamTurn,
}

impl RoutineKind {
    /// Every concrete maneuver variant (everything except `Null`).
    pub const ALL_CONCRETE: [RoutineKind; 9] = [
        RoutineKind::Slr,
        RoutineKind::Transit,
        RoutineKind::ProfileAscent,
        RoutineKind::ProfileDescent,
        RoutineKind::InsideTurn,
        RoutineKind::OutsideTurn,
        RoutineKind::RaceTrackTurn,
        RoutineKind::ProcedureTurn,
        RoutineKind::FaamTurn,
    ];

    /// Maneuvers that move the aircraft to a different waypoint.
    pub fn changes_waypoint(self) -> bool {
        matches!(
            self,
            RoutineKind::Slr
                | RoutineKind::Transit
                | RoutineKind::ProfileAscent
                | RoutineKind::ProfileDescent
        )
    }

    /// Maneuvers that change heading in place.
    pub fn changes_bearing(self) -> bool {
        matches!(
            self,
            RoutineKind::InsideTurn
                | RoutineKind::OutsideTurn
                | RoutineKind::RaceTrackTurn
                | RoutineKind::ProcedureTurn
                | RoutineKind::FaamTurn
        )
    }

    pub fn is_profile(self) -> bool {
        matches!(self, RoutineKind::ProfileAscent | RoutineKind::ProfileDescent)
    }

    /// Full-reversal turn variants.
    pub fn is_full_turn(self) -> bool {
        matches!(
            self,
            RoutineKind::RaceTrackTurn | RoutineKind::ProcedureTurn | RoutineKind::FaamTurn
        )
    }

    /// The profile variant with the opposite altitude ordering.
    pub fn inverse_profile(self) -> Option<RoutineKind> {
        match self {
            RoutineKind::ProfileAscent => Some(RoutineKind::ProfileDescent),
            RoutineKind::ProfileDescent => Some(RoutineKind::ProfileAscent),
            _ => None,
        }
    }

    /// Per-variant altitude constraint between entry and exit.
    pub fn altitude_check(self, entry_ft: f64, exit_ft: f64) -> bool {
        match self {
            RoutineKind::Null => true,
            RoutineKind::Slr | RoutineKind::Transit => entry_ft == exit_ft,
            RoutineKind::ProfileAscent => entry_ft <= exit_ft,
            RoutineKind::ProfileDescent => entry_ft >= exit_ft,
            kind if kind.changes_bearing() => entry_ft == exit_ft,
            _ => true,
        }
    }

    pub fn maneuver_name(self) -> Option<ManeuverName> {
        match self {
            RoutineKind::Null => None,
            RoutineKind::Slr => Some(ManeuverName::Slr),
            RoutineKind::Transit => Some(ManeuverName::Transit),
            RoutineKind::ProfileAscent => Some(ManeuverName::ProfileAscent),
            RoutineKind::ProfileDescent => Some(ManeuverName::ProfileDescent),
            RoutineKind::InsideTurn => Some(ManeuverName::InsideTurn),
            RoutineKind::OutsideTurn => Some(ManeuverName::OutsideTurn),
            RoutineKind::RaceTrackTurn => Some(ManeuverName::RaceTrackTurn),
            RoutineKind::ProcedureTurn => Some(ManeuverName::ProcedureTurn),
            RoutineKind::FaamTurn => Some(ManeuverName::FaamTurn),
        }
    }

    pub fn from_maneuver_name(name: ManeuverName) -> RoutineKind {
        match name {
            ManeuverName::Slr => RoutineKind::Slr,
            ManeuverName::Transit => RoutineKind::Transit,
            ManeuverName::ProfileAscent => RoutineKind::ProfileAscent,
            ManeuverName::ProfileDescent => RoutineKind::ProfileDescent,
            ManeuverName::InsideTurn => RoutineKind::InsideTurn,
            ManeuverName::OutsideTurn => RoutineKind::OutsideTurn,
            ManeuverName::RaceTrackTurn => RoutineKind::RaceTrackTurn,
            ManeuverName::ProcedureTurn => RoutineKind::ProcedureTurn,
            ManeuverName::FaamTurn => RoutineKind::FaamTurn,
        }
    }
}

impl fmt::Display for RoutineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoutineKind::Null => "NullRoutine",
            RoutineKind::Slr => "SLR",
            RoutineKind::Transit => "Transit",
            RoutineKind::ProfileAscent => "ProfileAscent",
            RoutineKind::ProfileDescent => "ProfileDescent",
            RoutineKind::InsideTurn => "InsideTurn",
            RoutineKind::OutsideTurn => "OutsideTurn",
            RoutineKind::RaceTrackTurn => "RaceTrackTurn",
            RoutineKind::ProcedureTurn => "ProcedureTurn",
            RoutineKind::FaamTurn => "FaamTurn",
        };
        f.write_str(name)
    }
}

/// Which variant should occupy a profile edge for the given altitudes.
/// Applied before re-fixing ownership instead of constructing and
/// discarding replacement objects mid-propagation.
pub fn reconcile(kind: RoutineKind, entry_ft: f64, exit_ft: f64) -> RoutineKind {
    match kind.inverse_profile() {
        Some(inverse) if !kind.altitude_check(entry_ft, exit_ft) => inverse,
        _ => kind,
    }
}

impl RouteGraph {
    /// Pure validity predicate of `kind` over an entry/exit state pair.
    pub fn kind_check(&self, kind: RoutineKind, entry: crate::graph::StateId, exit: crate::graph::StateId) -> bool {
        let entry_state = self.state(entry);
        let exit_state = self.state(exit);
        if kind == RoutineKind::Null {
            return true;
        }
        if kind.changes_waypoint() {
            if entry_state.waypoint == exit_state.waypoint {
                return false;
            }
            return match (entry_state.altitude, exit_state.altitude) {
                (Some(e), Some(x)) => kind.altitude_check(e, x),
                _ => true,
            };
        }
        // Bearing changes happen in place: waypoint and altitude match.
        entry_state.waypoint == exit_state.waypoint && entry_state.altitude == exit_state.altitude
    }

    /// True when the routine's physical constraint is satisfied by its
    /// current endpoints.
    pub fn state_check(&self, routine: RoutineId) -> bool {
        let record = self.routine(routine);
        self.kind_check(record.kind(), record.entry(), record.exit())
    }

    /// One-directional repair: mutate `incorrect` to satisfy the
    /// constraint given `correct`. Never touches `correct`. Profile kinds
    /// re-type themselves instead when the altitude ordering inverted.
    pub fn fix_state(
        &mut self,
        routine: RoutineId,
        correct: crate::graph::StateId,
        incorrect: crate::graph::StateId,
    ) -> RouteResult<()> {
        let kind = self.routine(routine).kind();
        match kind {
            RoutineKind::Null => {}
            RoutineKind::Slr | RoutineKind::Transit => {
                let altitude = self.state(correct).altitude;
                self.state_mut(incorrect).altitude = altitude;
            }
            RoutineKind::ProfileAscent | RoutineKind::ProfileDescent => {
                let (entry, exit) = {
                    let record = self.routine(routine);
                    (record.entry(), record.exit())
                };
                let waypoints_differ =
                    self.state(entry).waypoint != self.state(exit).waypoint;
                if let (true, Some(e), Some(x)) = (
                    waypoints_differ,
                    self.state(entry).altitude,
                    self.state(exit).altitude,
                ) {
                    let settled = reconcile(kind, e, x);
                    if settled != kind {
                        tracing::debug!(%kind, %settled, "profile re-typed to inverse");
                        self.routine_mut(routine).kind = settled;
                    }
                }
            }
            kind if kind.changes_bearing() => {
                let (waypoint, altitude) = {
                    let state = self.state(correct);
                    (state.waypoint.clone(), state.altitude)
                };
                let target = self.state_mut(incorrect);
                target.waypoint = waypoint;
                target.altitude = altitude;
            }
            _ => {}
        }
        Ok(())
    }

    /// Fill a placeholder exit from the entry, then assert the variant's
    /// constraint holds.
    pub fn init_routine(&mut self, routine: RoutineId) -> RouteResult<()> {
        let (kind, entry, exit) = {
            let record = self.routine(routine);
            (record.kind(), record.entry(), record.exit())
        };
        if self.state(exit).is_null() {
            self.fix_state(routine, entry, exit)?;
        }
        if kind.is_profile() {
            if let (Some(e), Some(x)) = (self.state(entry).altitude, self.state(exit).altitude) {
                if !kind.altitude_check(e, x) {
                    return Err(RouteError::AltitudeOrder {
                        kind,
                        entry_altitude: e,
                        exit_altitude: x,
                    });
                }
            }
        }
        if !self.state_check(routine) {
            return Err(RouteError::ConstraintUnsatisfied {
                kind,
                entry: self.state(entry).waypoint.name.clone(),
                exit: self.state(exit).waypoint.name.clone(),
            });
        }
        Ok(())
    }

    /// Claim both boundary ownership slots and repair the exit from the
    /// entry. Waypoint changes then stamp their bearings onto the boundary
    /// states; turns inherit bearings from adjacent waypoint changes.
    pub fn fix_routine_to_state(&mut self, routine: RoutineId) -> RouteResult<()> {
        let (entry, exit) = {
            let record = self.routine(routine);
            (record.entry(), record.exit())
        };
        self.set_exit_owner(exit, routine)?;
        self.set_entry_owner(entry, routine)?;
        self.fix_state(routine, entry, exit)?;

        // Profile repair may have re-typed the routine; read the kind after.
        let kind = self.routine(routine).kind();
        if kind.changes_waypoint() {
            if let Some(bearing) = self.entry_bearing(routine) {
                self.set_bearing(entry, bearing);
            }
            if let Some(bearing) = self.exit_bearing(routine) {
                self.set_bearing(exit, bearing);
            }
        } else if kind.changes_bearing() {
            if let Some(previous) = self.exit_owner(entry) {
                if self.routine(previous).kind().changes_waypoint() {
                    if let Some(bearing) = self.exit_bearing(previous) {
                        self.set_bearing(entry, bearing);
                    }
                }
            }
            if let Some(next) = self.entry_owner(exit) {
                if self.routine(next).kind().changes_waypoint() {
                    if let Some(bearing) = self.entry_bearing(next) {
                        self.set_bearing(exit, bearing);
                    }
                }
            }
        }
        Ok(())
    }

    /// Initial great-circle bearing of the leg, if both waypoints are real.
    pub fn entry_bearing(&self, routine: RoutineId) -> Option<f64> {
        let record = self.routine(routine);
        let entry = &self.state(record.entry()).waypoint;
        let exit = &self.state(record.exit()).waypoint;
        if entry.is_null() || exit.is_null() {
            return None;
        }
        Some(initial_bearing_deg(entry, exit))
    }

    /// Bearing on arrival: reciprocal of the bearing back along the leg.
    pub fn exit_bearing(&self, routine: RoutineId) -> Option<f64> {
        let record = self.routine(routine);
        let entry = &self.state(record.entry()).waypoint;
        let exit = &self.state(record.exit()).waypoint;
        if entry.is_null() || exit.is_null() {
            return None;
        }
        Some(reciprocal_deg(initial_bearing_deg(exit, entry)))
    }

    /// Magnitude of the heading change across a turn, when both bearings
    /// are known.
    pub fn bearing_change(&self, routine: RoutineId) -> Option<f64> {
        let record = self.routine(routine);
        match (
            self.state(record.entry()).bearing,
            self.state(record.exit()).bearing,
        ) {
            (Some(entry), Some(exit)) => Some((entry - exit).abs()),
            _ => None,
        }
    }

    /// Elapsed time of the maneuver in minutes. An explicit override set
    /// at construction always wins; otherwise each variant computes its
    /// own, or `None` when the inputs are incomplete.
    pub fn routine_duration(&self, routine: RoutineId) -> Option<f64> {
        let record = self.routine(routine);
        if let Some(minutes) = record.duration {
            return Some(minutes);
        }
        let entry = self.state(record.entry());
        let exit = self.state(record.exit());
        match record.kind() {
            RoutineKind::Null => None,
            RoutineKind::Slr | RoutineKind::Transit => {
                if entry.waypoint.is_null() || exit.waypoint.is_null() {
                    return None;
                }
                let altitude = match (entry.altitude, exit.altitude) {
                    (Some(altitude), Some(_)) => altitude,
                    _ => return None,
                };
                let speed = match record.kind() {
                    RoutineKind::Transit => transit_true_airspeed(altitude),
                    _ => science_true_airspeed(altitude),
                };
                let distance = haversine_distance_ft(&entry.waypoint, &exit.waypoint);
                Some((distance / speed).ceil())
            }
            RoutineKind::ProfileAscent | RoutineKind::ProfileDescent => {
                match (entry.altitude, exit.altitude) {
                    (Some(e), Some(x)) => Some(((e - x).abs() / PROFILE_RATE_FT_PER_MIN).ceil()),
                    _ => None,
                }
            }
            kind if kind.changes_bearing() => Some(TURN_DURATION_MIN),
            _ => None,
        }
    }

    /// Set both ends of a level leg to the same altitude and cascade the
    /// change through the chain in both directions.
    pub fn set_leg_altitude(&mut self, routine: RoutineId, altitude_ft: f64) -> RouteResult<()> {
        let (entry, exit) = {
            let record = self.routine(routine);
            (record.entry(), record.exit())
        };
        self.set_altitude(entry, altitude_ft);
        self.entry_update(entry)?;
        self.set_altitude(exit, altitude_ft);
        self.exit_update(exit)
    }

    /// Set a profile's entry altitude after validating it against the
    /// current exit altitude, then cascade backward.
    pub fn set_entry_altitude(&mut self, routine: RoutineId, altitude_ft: f64) -> RouteResult<()> {
        let (kind, entry, exit) = {
            let record = self.routine(routine);
            (record.kind(), record.entry(), record.exit())
        };
        if let Some(exit_altitude) = self.state(exit).altitude {
            if !kind.altitude_check(altitude_ft, exit_altitude) {
                return Err(RouteError::AltitudeOrder {
                    kind,
                    entry_altitude: altitude_ft,
                    exit_altitude,
                });
            }
        }
        self.set_altitude(entry, altitude_ft);
        self.entry_update(entry)
    }

    /// Mirror of `set_entry_altitude` for the exit side, cascading forward.
    pub fn set_exit_altitude(&mut self, routine: RoutineId, altitude_ft: f64) -> RouteResult<()> {
        let (kind, entry, exit) = {
            let record = self.routine(routine);
            (record.kind(), record.entry(), record.exit())
        };
        if let Some(entry_altitude) = self.state(entry).altitude {
            if !kind.altitude_check(entry_altitude, altitude_ft) {
                return Err(RouteError::AltitudeOrder {
                    kind,
                    entry_altitude,
                    exit_altitude: altitude_ft,
                });
            }
        }
        self.set_altitude(exit, altitude_ft);
        self.exit_update(exit)
    }

    /// Variants legally allowed to follow this routine. A turn cannot be
    /// followed by another turn.
    pub fn permitted_next_kinds(&self, routine: RoutineId) -> Vec<RoutineKind> {
        let kind = self.routine(routine).kind();
        RoutineKind::ALL_CONCRETE
            .into_iter()
            .filter(|candidate| !(kind.changes_bearing() && candidate.changes_bearing()))
            .collect()
    }

    pub fn permitted_previous_kinds(&self, routine: RoutineId) -> Vec<RoutineKind> {
        // Adjacency rules are symmetric for now.
        self.permitted_next_kinds(routine)
    }

    /// Variants that would also satisfy their constraint over this
    /// routine's current endpoints.
    pub fn equivalent_kinds(&self, routine: RoutineId) -> Vec<RoutineKind> {
        let record = self.routine(routine);
        let (entry, exit) = (record.entry(), record.exit());
        RoutineKind::ALL_CONCRETE
            .into_iter()
            .filter(|&candidate| self.kind_check(candidate, entry, exit))
            .collect()
    }

    /// Re-type the edge to an equivalent variant, keeping endpoints and
    /// ownership.
    pub fn swap_kind(&mut self, routine: RoutineId, kind: RoutineKind) -> RouteResult<()> {
        let (entry, exit) = {
            let record = self.routine(routine);
            (record.entry(), record.exit())
        };
        if !self.kind_check(kind, entry, exit) {
            return Err(RouteError::ConstraintUnsatisfied {
                kind,
                entry: self.state(entry).waypoint.name.clone(),
                exit: self.state(exit).waypoint.name.clone(),
            });
        }
        self.routine_mut(routine).kind = kind;
        Ok(())
    }

    /// Human-readable one-line summary of the maneuver.
    pub fn describe_routine(&self, routine: RoutineId) -> String {
        let record = self.routine(routine);
        let kind = record.kind();
        let entry = self.state(record.entry());
        let exit = self.state(record.exit());
        if kind == RoutineKind::Null {
            return format!(
                "No routine between {} and {}",
                entry.waypoint.name, exit.waypoint.name
            );
        }
        if kind.changes_bearing() {
            let mut line = format!("{kind} at {}", entry.waypoint.name);
            if let Some(next) = self.entry_owner(record.exit()) {
                let next_exit = self.state(self.routine(next).exit());
                if !next_exit.is_null() {
                    line.push_str(&format!(" towards {}", next_exit.waypoint.name));
                }
            }
            return line;
        }
        let mut line = format!(
            "{kind} from {} to {}",
            entry.waypoint.name, exit.waypoint.name
        );
        if kind.is_profile() {
            if let Some(altitude) = exit.altitude {
                line.push_str(&format!(" at {altitude}"));
            }
        }
        line
    }

    /// Render the routine back into a route-description record; `None`
    /// for placeholders. Exit-side fields are omitted when they repeat the
    /// entry side.
    pub fn routine_record(&self, routine: RoutineId) -> Option<ManeuverRecord> {
        let record = self.routine(routine);
        let name = record.kind().maneuver_name()?;
        let entry = self.state(record.entry());
        let exit = self.state(record.exit());

        let waypoint1 = if entry.waypoint != exit.waypoint {
            Some(exit.waypoint.name.clone())
        } else {
            None
        };
        let altitude1 = match (entry.altitude, exit.altitude) {
            (entry_alt, Some(exit_alt)) if entry_alt != Some(exit_alt) => {
                Some(Measure::feet(exit_alt))
            }
            _ => None,
        };
        Some(ManeuverRecord {
            routine: name,
            waypoint0: entry.waypoint.name.clone(),
            waypoint1,
            altitude0: entry.altitude.map(Measure::feet),
            altitude1,
            duration: self.routine_duration(routine).map(Measure::minutes),
        })
    }
}
