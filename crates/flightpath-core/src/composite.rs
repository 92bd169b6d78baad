//! Ordered maneuver sequences: insertion, grafting, gap-filling, pruning
//! and turn synthesis.

use crate::error::{RouteError, RouteResult};
use crate::graph::{RouteGraph, RoutineId, StateId};
use crate::models::ManeuverRecord;
use crate::routine::RoutineKind;
use crate::spatial::reciprocal_deg;

/// A synthesized turn upgrades to a full-reversal variant when the
/// outgoing bearing lies within this many degrees of the reciprocal of
/// the incoming bearing.
const FULL_TURN_MAX_BEARING_CHANGE_DEG: f64 = 10.0;

fn full_turn_qualifies(entry_bearing_deg: f64, exit_bearing_deg: f64) -> bool {
    (entry_bearing_deg - reciprocal_deg(exit_bearing_deg)).abs() < FULL_TURN_MAX_BEARING_CHANGE_DEG
}

/// An ordered chain of routines forming one continuous path. Satisfies the
/// routine contract itself: entry/exit proxy to the first/last member and
/// the duration is the member sum.
#[derive(Debug, Clone)]
pub struct CompositeRoutine {
    members: Vec<RoutineId>,
    /// Own boundary placeholders, used while the member list is empty and
    /// as the fixed origin for break scanning.
    entry: StateId,
    exit: StateId,
    duration: Option<f64>,
}

impl CompositeRoutine {
    /// Create an empty composite anchored at `entry`. A missing exit
    /// becomes a fresh placeholder; both endpoints null is rejected.
    pub fn new(
        graph: &mut RouteGraph,
        entry: StateId,
        exit: Option<StateId>,
    ) -> RouteResult<Self> {
        match exit {
            None if graph.state(entry).is_null() => return Err(RouteError::NullEndpoints),
            Some(exit) if graph.state(entry).is_null() && graph.state(exit).is_null() => {
                return Err(RouteError::NullEndpoints)
            }
            _ => {}
        }
        let exit = match exit {
            Some(exit) => exit,
            None => graph.null_state(),
        };
        Ok(Self {
            members: Vec::new(),
            entry,
            exit,
            duration: None,
        })
    }

    pub fn members(&self) -> &[RoutineId] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn set_duration(&mut self, minutes: f64) {
        self.duration = Some(minutes);
    }

    /// Entry state of the first member, or the composite's own entry when
    /// no members exist.
    pub fn entry_state(&self, graph: &RouteGraph) -> StateId {
        self.members
            .first()
            .map(|&member| graph.routine(member).entry())
            .unwrap_or(self.entry)
    }

    /// Exit state of the last member, or the composite's own exit when no
    /// members exist.
    pub fn exit_state(&self, graph: &RouteGraph) -> StateId {
        self.members
            .last()
            .map(|&member| graph.routine(member).exit())
            .unwrap_or(self.exit)
    }

    /// Every distinct state touched by the members, in path order.
    pub fn state_sequence(&self, graph: &RouteGraph) -> Vec<StateId> {
        if self.members.is_empty() {
            return vec![self.entry_state(graph)];
        }
        let mut states: Vec<StateId> = Vec::new();
        for &member in &self.members {
            let record = graph.routine(member);
            for state in [record.entry(), record.exit()] {
                if !states.contains(&state) {
                    states.push(state);
                }
            }
        }
        states
    }

    /// Pairs of states left unbridged by any member, scanning from the
    /// composite's own entry through every member boundary to its exit.
    pub fn breaks(&self, graph: &RouteGraph) -> Vec<(StateId, StateId)> {
        let mut breaks = Vec::new();
        let mut prior = self.entry;
        for &member in &self.members {
            let record = graph.routine(member);
            if record.entry() != prior {
                breaks.push((prior, record.entry()));
            }
            prior = record.exit();
        }
        let exit = self.exit_state(graph);
        if exit != prior {
            breaks.push((prior, exit));
        }
        breaks
    }

    /// Where a new routine would slot into the sequence: after the member
    /// it departs from, before the member it feeds, or at either end.
    fn find_index(&self, graph: &RouteGraph, routine: RoutineId) -> Option<usize> {
        let record = graph.routine(routine);
        let (new_entry, new_exit) = (record.entry(), record.exit());

        if self.members.is_empty() && new_entry == self.entry {
            return Some(0);
        }
        if let Some(position) = self
            .members
            .iter()
            .position(|&member| graph.routine(member).exit() == new_entry)
        {
            return Some(position + 1);
        }
        if let Some(position) = self
            .members
            .iter()
            .position(|&member| graph.routine(member).entry() == new_exit)
        {
            return Some(position);
        }
        if self.exit_state(graph) == new_exit {
            return Some(self.members.len());
        }
        None
    }

    /// Splice a routine into the sequence at the boundary it shares with
    /// an existing member. Claims ownership of both its boundary states,
    /// which fails if another concrete routine holds either slot.
    pub fn include(&mut self, graph: &mut RouteGraph, routine: RoutineId) -> RouteResult<()> {
        let index = self.find_index(graph, routine);
        match index {
            Some(index) if !self.members.contains(&routine) => {
                graph.fix_routine_to_state(routine)?;
                self.members.insert(index, routine);
                Ok(())
            }
            _ => Err(RouteError::NoAttachmentPoint),
        }
    }

    /// Graft wrapper around `include` for routines that share a junction
    /// state with the chain but would contest its ownership. The junction
    /// is forked into two synchronized instances so each side keeps a
    /// single owner per slot.
    pub fn append(&mut self, graph: &mut RouteGraph, routine: RoutineId) -> RouteResult<()> {
        if self.find_index(graph, routine).is_none() {
            // Nothing shared: bridge from the current exit instead.
            let exit = self.exit_state(graph);
            let entry = graph.routine(routine).entry();
            let bridge = graph.new_routine(RoutineKind::Null, exit, Some(entry))?;
            tracing::debug!(?routine, "bridging unattached routine with a null routine");
            self.include(graph, bridge)?;
            self.include(graph, routine)?;
            return self.clean_up(graph);
        }

        let sequence = self.state_sequence(graph);
        let record = graph.routine(routine);
        let (new_entry, new_exit) = (record.entry(), record.exit());

        if sequence.contains(&new_entry) {
            // Forward: the new routine leaves from inside the chain.
            let junction = new_entry;
            let fork = graph.clone_state(junction);
            let next = graph.entry_owner(junction);
            graph.clear_entry_owner(junction);
            if let Some(next) = next {
                tracing::debug!(?junction, ?fork, "forking junction forward");
                graph.set_entry_state(next, fork);
                graph.fix_routine_to_state(next)?;
            }
        } else if sequence.contains(&new_exit) {
            // Backward: the new routine arrives into the chain.
            let junction = new_exit;
            let fork = graph.clone_state(junction);
            let previous = graph.exit_owner(junction);
            graph.clear_exit_owner(junction);
            if let Some(previous) = previous {
                tracing::debug!(?junction, ?fork, "forking junction backward");
                graph.set_exit_state(previous, fork);
                graph.fix_routine_to_state(previous)?;
            }
        }

        self.include(graph, routine)?;
        self.clean_up(graph)
    }

    /// Restore the structural invariants after a mutation: bridge gaps,
    /// absorb stray owners, drop superseded members, synthesize turns.
    /// The order is fixed.
    pub fn clean_up(&mut self, graph: &mut RouteGraph) -> RouteResult<()> {
        self.inject_null_routines(graph)?;
        self.pull_routines(graph)?;
        self.prune_routines(graph)?;
        self.inject_missing_turns(graph)
    }

    /// Bridge every break with a null routine.
    pub fn inject_null_routines(&mut self, graph: &mut RouteGraph) -> RouteResult<()> {
        for (from, to) in self.breaks(graph) {
            let bridge = graph.new_routine(RoutineKind::Null, from, Some(to))?;
            self.include(graph, bridge)?;
        }
        Ok(())
    }

    /// Absorb routines that a sequence state points at but the member
    /// list does not yet track.
    pub fn pull_routines(&mut self, graph: &mut RouteGraph) -> RouteResult<()> {
        for state in self.state_sequence(graph) {
            if let Some(owner) = graph.entry_owner(state) {
                if !self.members.contains(&owner) {
                    self.include(graph, owner)?;
                }
            }
            if let Some(owner) = graph.exit_owner(state) {
                if !self.members.contains(&owner) {
                    self.include(graph, owner)?;
                }
            }
        }
        Ok(())
    }

    /// Drop members whose boundary states no longer point back at them,
    /// detaching whatever claims they still hold.
    pub fn prune_routines(&mut self, graph: &mut RouteGraph) -> RouteResult<()> {
        let stale: Vec<RoutineId> = self
            .members
            .iter()
            .copied()
            .filter(|&member| {
                let record = graph.routine(member);
                graph.entry_owner(record.entry()) != Some(member)
                    || graph.exit_owner(record.exit()) != Some(member)
            })
            .collect();
        for member in stale {
            tracing::debug!(?member, "pruning superseded routine");
            self.remove(graph, member)?;
        }
        Ok(())
    }

    /// Synthesize a turn between every adjacent pair of waypoint-change
    /// members. The shared boundary forks into pre-turn and post-turn
    /// instances; the turn variant defaults to an inside turn and
    /// upgrades to a race track turn on a near-reversal.
    pub fn inject_missing_turns(&mut self, graph: &mut RouteGraph) -> RouteResult<()> {
        let junctions: Vec<StateId> = self
            .members
            .windows(2)
            .filter(|pair| {
                graph.routine(pair[0]).kind().changes_waypoint()
                    && graph.routine(pair[1]).kind().changes_waypoint()
            })
            .map(|pair| graph.routine(pair[0]).exit())
            .collect();

        for junction in junctions {
            let previous = graph.exit_owner(junction);
            let next = graph.entry_owner(junction);

            let mut kind = RoutineKind::InsideTurn;
            if let (Some(previous), Some(next)) = (previous, next) {
                if graph.routine(previous).kind().changes_waypoint()
                    && graph.routine(next).kind().changes_waypoint()
                {
                    if let (Some(exit_bearing), Some(entry_bearing)) =
                        (graph.exit_bearing(previous), graph.entry_bearing(next))
                    {
                        if full_turn_qualifies(entry_bearing, exit_bearing) {
                            kind = RoutineKind::RaceTrackTurn;
                        }
                    }
                }
            }

            let fork = graph.clone_state(junction);
            graph.clear_entry_owner(junction);
            if let Some(next) = next {
                graph.set_entry_state(next, fork);
                graph.fix_routine_to_state(next)?;
            }

            let turn = graph.new_routine(kind, junction, Some(fork))?;
            tracing::debug!(%kind, ?junction, "synthesized turn at junction");
            self.include(graph, turn)?;
        }
        Ok(())
    }

    /// Remove a member, vacating its ownership claims. Fails when the
    /// routine was never part of this composite.
    pub fn remove(&mut self, graph: &mut RouteGraph, routine: RoutineId) -> RouteResult<()> {
        let index = self
            .members
            .iter()
            .position(|&member| member == routine)
            .ok_or(RouteError::NotAMember)?;
        graph.detach_routine(routine);
        self.members.remove(index);
        Ok(())
    }

    /// Total elapsed time in minutes. `None` when any member's duration is
    /// undefined: an incomplete path has no defined total.
    pub fn calculate_duration(&self, graph: &RouteGraph) -> Option<f64> {
        if let Some(minutes) = self.duration {
            return Some(minutes);
        }
        let mut total = 0.0;
        for &member in &self.members {
            total += graph.routine_duration(member)?;
        }
        Some(total)
    }

    /// Ordered route-description records of the members, skipping
    /// placeholders.
    pub fn record_sequence(&self, graph: &RouteGraph) -> Vec<ManeuverRecord> {
        self.members
            .iter()
            .filter_map(|&member| graph.routine_record(member))
            .collect()
    }

    /// Multi-line human summary, one member per line, optionally with
    /// per-member and total durations.
    pub fn describe(&self, graph: &RouteGraph, durations: bool) -> String {
        let mut out = String::new();
        for &member in &self.members {
            out.push_str(&graph.describe_routine(member));
            if durations {
                if let Some(minutes) = graph.routine_duration(member) {
                    out.push_str(&format!(": {minutes} minutes"));
                }
            }
            out.push('\n');
        }
        if durations {
            if let Some(total) = self.calculate_duration(graph) {
                out.push_str(&format!("Total flight duration {total} minutes\n"));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Waypoint;

    fn demo_waypoint(name: &str) -> Waypoint {
        match name {
            "A" => Waypoint::new("A", 0.0, 0.0),
            "B" => Waypoint::new("B", 35.0, 45.0),
            "C" => Waypoint::new("C", 100.0, 0.0),
            "D" => Waypoint::new("D", 35.0, 135.0),
            "E" => Waypoint::new("E", 1.0, 1.0),
            other => panic!("unknown demo waypoint {other}"),
        }
    }

    /// Build a routine, run init, and append it to the composite.
    fn append_routine(
        graph: &mut RouteGraph,
        composite: &mut CompositeRoutine,
        kind: RoutineKind,
        entry: StateId,
        exit: Option<StateId>,
    ) -> RoutineId {
        let routine = graph.new_routine(kind, entry, exit).unwrap();
        graph.init_routine(routine).unwrap();
        composite.append(graph, routine).unwrap();
        routine
    }

    fn assert_contiguous(graph: &RouteGraph, composite: &CompositeRoutine) {
        for pair in composite.members().windows(2) {
            assert_eq!(
                graph.routine(pair[0]).exit(),
                graph.routine(pair[1]).entry(),
                "adjacent members must share their boundary state instance"
            );
        }
    }

    #[test]
    fn full_turn_threshold() {
        // Outgoing 355 is within 10 degrees of the reciprocal of 170.
        assert!(full_turn_qualifies(355.0, 170.0));
        assert!(!full_turn_qualifies(45.0, 170.0));
    }

    #[test]
    fn include_without_shared_state_fails() {
        let mut graph = RouteGraph::new();
        let a = graph.new_state(Some(demo_waypoint("A")), None, None);
        let mut composite = CompositeRoutine::new(&mut graph, a, None).unwrap();

        let c = graph.new_state(Some(demo_waypoint("C")), None, None);
        let d = graph.new_state(Some(demo_waypoint("D")), None, None);
        let leg = graph.new_routine(RoutineKind::Slr, c, Some(d)).unwrap();
        let err = composite.include(&mut graph, leg).unwrap_err();
        assert!(matches!(err, RouteError::NoAttachmentPoint));
    }

    #[test]
    fn include_rejects_duplicate_member() {
        let mut graph = RouteGraph::new();
        let a = graph.new_state(Some(demo_waypoint("A")), Some(10000.0), None);
        let b = graph.new_state(Some(demo_waypoint("B")), None, None);
        let mut composite = CompositeRoutine::new(&mut graph, a, None).unwrap();
        let leg = graph.new_routine(RoutineKind::Slr, a, Some(b)).unwrap();
        composite.include(&mut graph, leg).unwrap();
        let err = composite.include(&mut graph, leg).unwrap_err();
        assert!(matches!(err, RouteError::NoAttachmentPoint));
    }

    #[test]
    fn remove_unknown_routine_fails() {
        let mut graph = RouteGraph::new();
        let a = graph.new_state(Some(demo_waypoint("A")), None, None);
        let b = graph.new_state(Some(demo_waypoint("B")), None, None);
        let mut composite = CompositeRoutine::new(&mut graph, a, None).unwrap();
        let stray = graph.new_routine(RoutineKind::Slr, a, Some(b)).unwrap();
        let err = composite.remove(&mut graph, stray).unwrap_err();
        assert!(matches!(err, RouteError::NotAMember));
    }

    #[test]
    fn appending_level_legs_synthesizes_a_turn() {
        let mut graph = RouteGraph::new();
        let a = graph.new_state(Some(demo_waypoint("A")), Some(4000.0), None);
        let b = graph.new_state(Some(demo_waypoint("B")), None, None);
        let c = graph.new_state(Some(demo_waypoint("C")), None, None);
        let mut composite = CompositeRoutine::new(&mut graph, a, None).unwrap();

        let leg_ab = append_routine(&mut graph, &mut composite, RoutineKind::Slr, a, Some(b));
        let leg_bc = append_routine(&mut graph, &mut composite, RoutineKind::Slr, b, Some(c));

        assert_eq!(composite.entry_state(&graph), a);
        assert_eq!(composite.members().len(), 3);
        let turn = composite.members()[1];
        assert!(graph.routine(turn).kind().changes_bearing());
        assert_eq!(graph.state(graph.routine(turn).entry()).waypoint.name, "B");
        assert_contiguous(&graph, &composite);

        // The altitude propagated across both legs and the turn.
        assert_eq!(graph.state(graph.routine(leg_bc).exit()).altitude, Some(4000.0));
        assert_eq!(graph.state(graph.routine(leg_ab).exit()).altitude, Some(4000.0));
    }

    #[test]
    fn reversal_legs_get_a_race_track_turn() {
        // Out and straight back: the outgoing bearing is the reciprocal of
        // the incoming one.
        let mut graph = RouteGraph::new();
        let a = graph.new_state(Some(Waypoint::new("P1", 0.0, 0.0)), Some(4000.0), None);
        let b = graph.new_state(Some(Waypoint::new("P2", 0.0, 1.0)), None, None);
        let back = graph.new_state(Some(Waypoint::new("P1b", 0.0, 0.001)), None, None);
        let mut composite = CompositeRoutine::new(&mut graph, a, None).unwrap();

        append_routine(&mut graph, &mut composite, RoutineKind::Slr, a, Some(b));
        append_routine(&mut graph, &mut composite, RoutineKind::Slr, b, Some(back));

        let turn = composite.members()[1];
        assert_eq!(graph.routine(turn).kind(), RoutineKind::RaceTrackTurn);
    }

    #[test]
    fn perpendicular_legs_get_an_inside_turn() {
        let mut graph = RouteGraph::new();
        let a = graph.new_state(Some(Waypoint::new("P1", 0.0, 0.0)), Some(4000.0), None);
        let b = graph.new_state(Some(Waypoint::new("P2", 0.0, 1.0)), None, None);
        let north = graph.new_state(Some(Waypoint::new("P3", 1.0, 1.0)), None, None);
        let mut composite = CompositeRoutine::new(&mut graph, a, None).unwrap();

        append_routine(&mut graph, &mut composite, RoutineKind::Slr, a, Some(b));
        append_routine(&mut graph, &mut composite, RoutineKind::Slr, b, Some(north));

        let turn = composite.members()[1];
        assert_eq!(graph.routine(turn).kind(), RoutineKind::InsideTurn);
    }

    #[test]
    fn unattached_routine_is_bridged_with_a_null() {
        let mut graph = RouteGraph::new();
        let a = graph.new_state(Some(demo_waypoint("A")), Some(4000.0), None);
        let b = graph.new_state(Some(demo_waypoint("B")), None, None);
        let mut composite = CompositeRoutine::new(&mut graph, a, None).unwrap();
        append_routine(&mut graph, &mut composite, RoutineKind::Slr, a, Some(b));

        // A leg sharing no state with the chain at all.
        let c = graph.new_state(Some(demo_waypoint("C")), Some(4000.0), None);
        let d = graph.new_state(Some(demo_waypoint("D")), None, None);
        append_routine(&mut graph, &mut composite, RoutineKind::Slr, c, Some(d));

        assert!(composite
            .members()
            .iter()
            .any(|&member| graph.routine(member).kind() == RoutineKind::Null));
        assert!(composite.breaks(&graph).is_empty());
        // A bridged path has no defined total duration.
        assert_eq!(composite.calculate_duration(&graph), None);
    }

    #[test]
    fn backward_append_grafts_into_the_chain() {
        let mut graph = RouteGraph::new();
        let a = graph.new_state(Some(demo_waypoint("A")), Some(4000.0), None);
        let b = graph.new_state(Some(demo_waypoint("B")), None, None);
        let c = graph.new_state(Some(demo_waypoint("C")), None, None);
        let mut composite = CompositeRoutine::new(&mut graph, a, None).unwrap();
        append_routine(&mut graph, &mut composite, RoutineKind::Slr, a, Some(b));
        let leg_bc = append_routine(&mut graph, &mut composite, RoutineKind::Slr, b, Some(c));

        // A leg arriving into the post-turn state at B from elsewhere.
        let junction = graph.routine(leg_bc).entry();
        let d = graph.new_state(Some(demo_waypoint("D")), Some(4000.0), None);
        let arriving = graph.new_routine(RoutineKind::Slr, d, Some(junction)).unwrap();
        graph.init_routine(arriving).unwrap();
        composite.append(&mut graph, arriving).unwrap();

        assert!(composite.members().contains(&arriving));
        assert!(composite.breaks(&graph).is_empty());
        assert_contiguous(&graph, &composite);
        // Every member still owns its boundary slots.
        for &member in composite.members() {
            let record = graph.routine(member);
            assert_eq!(graph.entry_owner(record.entry()), Some(member));
            assert_eq!(graph.exit_owner(record.exit()), Some(member));
        }
    }

    #[test]
    fn leg_altitude_cascades_through_the_whole_chain() {
        let mut graph = RouteGraph::new();
        let a = graph.new_state(Some(demo_waypoint("A")), Some(4000.0), None);
        let b = graph.new_state(Some(demo_waypoint("B")), None, None);
        let c = graph.new_state(Some(demo_waypoint("C")), None, None);
        let mut composite = CompositeRoutine::new(&mut graph, a, None).unwrap();
        let leg_ab = append_routine(&mut graph, &mut composite, RoutineKind::Slr, a, Some(b));
        let leg_bc = append_routine(&mut graph, &mut composite, RoutineKind::Slr, b, Some(c));

        // Raising the second leg travels backward through the synthesized
        // turn and repairs the first leg too.
        graph.set_leg_altitude(leg_bc, 9000.0).unwrap();
        for state in composite.state_sequence(&graph) {
            assert_eq!(graph.state(state).altitude, Some(9000.0));
        }
        assert!(graph.state_check(leg_ab));
        assert!(graph.state_check(leg_bc));
    }

    #[test]
    fn describe_names_every_member() {
        let mut graph = RouteGraph::new();
        let a = graph.new_state(Some(demo_waypoint("A")), Some(4000.0), None);
        let b = graph.new_state(Some(demo_waypoint("B")), None, None);
        let c = graph.new_state(Some(demo_waypoint("C")), None, None);
        let mut composite = CompositeRoutine::new(&mut graph, a, None).unwrap();
        append_routine(&mut graph, &mut composite, RoutineKind::Slr, a, Some(b));
        append_routine(&mut graph, &mut composite, RoutineKind::Slr, b, Some(c));

        let summary = composite.describe(&graph, true);
        assert!(summary.contains("SLR from A to B"));
        assert!(summary.contains("InsideTurn at B towards C"));
        assert!(summary.contains("Total flight duration"));
    }

    #[test]
    fn record_sequence_skips_null_routines() {
        let mut graph = RouteGraph::new();
        let a = graph.new_state(Some(demo_waypoint("A")), Some(4000.0), None);
        let b = graph.new_state(Some(demo_waypoint("B")), None, None);
        let mut composite = CompositeRoutine::new(&mut graph, a, None).unwrap();
        append_routine(&mut graph, &mut composite, RoutineKind::Slr, a, Some(b));

        let c = graph.new_state(Some(demo_waypoint("C")), Some(4000.0), None);
        let d = graph.new_state(Some(demo_waypoint("D")), None, None);
        append_routine(&mut graph, &mut composite, RoutineKind::Slr, c, Some(d));

        let records = composite.record_sequence(&graph);
        assert_eq!(records.len(), 2, "the bridging null must render to nothing");
        assert!(composite.members().len() > records.len());
    }

    #[test]
    fn five_waypoint_survey_end_to_end() {
        let mut graph = RouteGraph::new();
        let a = graph.new_state(Some(demo_waypoint("A")), Some(10000.0), None);
        let mut composite = CompositeRoutine::new(&mut graph, a, None).unwrap();

        // SLR A -> B at 10000 ft.
        let b = graph.new_state(Some(demo_waypoint("B")), None, None);
        let slr_ab = append_routine(&mut graph, &mut composite, RoutineKind::Slr, a, Some(b));

        // Explicit inside turn at B.
        let at_b = graph.routine(slr_ab).exit();
        let turn_b = append_routine(
            &mut graph,
            &mut composite,
            RoutineKind::InsideTurn,
            at_b,
            None,
        );

        // Descend B -> C from 10000 to 4000 ft.
        let after_turn_b = graph.routine(turn_b).exit();
        let c = graph.new_state(Some(demo_waypoint("C")), Some(4000.0), None);
        let descent_bc = append_routine(
            &mut graph,
            &mut composite,
            RoutineKind::ProfileDescent,
            after_turn_b,
            Some(c),
        );

        // Straight back C -> B; the turn at C is synthesized and the
        // reversal qualifies it as a race track turn.
        let at_c = graph.routine(descent_bc).exit();
        let b2 = graph.new_state(Some(demo_waypoint("B")), None, None);
        let slr_cb = append_routine(
            &mut graph,
            &mut composite,
            RoutineKind::Slr,
            at_c,
            Some(b2),
        );

        // Explicit inside turn at B, then B -> D.
        let back_at_b = graph.routine(slr_cb).exit();
        let turn_b2 = append_routine(
            &mut graph,
            &mut composite,
            RoutineKind::InsideTurn,
            back_at_b,
            None,
        );
        let after_turn_b2 = graph.routine(turn_b2).exit();
        let d = graph.new_state(Some(demo_waypoint("D")), None, None);
        let slr_bd = append_routine(
            &mut graph,
            &mut composite,
            RoutineKind::Slr,
            after_turn_b2,
            Some(d),
        );

        // D -> E; the turn at D is synthesized.
        let at_d = graph.routine(slr_bd).exit();
        let e = graph.new_state(Some(demo_waypoint("E")), None, None);
        append_routine(
            &mut graph,
            &mut composite,
            RoutineKind::Slr,
            at_d,
            Some(e),
        );

        // The chain ends at E.
        let exit = composite.exit_state(&graph);
        assert_eq!(graph.state(exit).waypoint.name, "E");

        // No two consecutive waypoint changes survive clean-up, and every
        // adjacent waypoint-change pair got exactly one turn.
        for pair in composite.members().windows(2) {
            assert!(
                !(graph.routine(pair[0]).kind().changes_waypoint()
                    && graph.routine(pair[1]).kind().changes_waypoint()),
                "two consecutive waypoint changes survived clean-up"
            );
        }
        assert_contiguous(&graph, &composite);

        // The reversal at C got a race track turn.
        let turn_at_c = composite
            .members()
            .iter()
            .copied()
            .find(|&member| {
                graph.routine(member).kind().changes_bearing()
                    && graph.state(graph.routine(member).entry()).waypoint.name == "C"
            })
            .expect("a turn at C");
        assert_eq!(graph.routine(turn_at_c).kind(), RoutineKind::RaceTrackTurn);

        // A turn was synthesized at D as well.
        assert!(composite.members().iter().any(|&member| {
            graph.routine(member).kind().changes_bearing()
                && graph.state(graph.routine(member).entry()).waypoint.name == "D"
        }));

        // Every leg has enough data for a defined total.
        let total = composite.calculate_duration(&graph);
        assert!(total.is_some(), "expected a defined total duration");
        assert!(total.unwrap() > 0.0);

        // All member constraints hold and ownership is coherent.
        for &member in composite.members() {
            assert!(graph.state_check(member));
            let record = graph.routine(member);
            assert_eq!(graph.entry_owner(record.entry()), Some(member));
            assert_eq!(graph.exit_owner(record.exit()), Some(member));
        }
    }
}
