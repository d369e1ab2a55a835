//! Agent phase state machine (spec §4.7): `analyzing -> planning ->
//! building -> verifying -> reviewing -> (building | complete | failed)`.
//! `AgentPhase::Crawling` stands in for the spec's `analyzing` (the crawl
//! *is* the analysis step here); `Measuring` sits between `verifying` and
//! `reviewing` since the probes and the pass-rule check are kept as
//! distinct phases in this crate (`verify::gate` runs once all four
//! probes have reported).
//!
//! Reviewing loops back to Building directly, not back to Planning — the
//! planner only runs once per run (spec §4.7 step 2, "on first
//! iteration... ask the external planner"); subsequent iterations rebuild
//! from the reviewer's deep-merged suggested changes (step 7).

use crate::models::AgentPhase;

/// Whether `to` is a legal next phase from `from`.
#[must_use]
pub fn is_valid_transition(from: AgentPhase, to: AgentPhase) -> bool {
    matches!(
        (from, to),
        (AgentPhase::Crawling, AgentPhase::Planning)
            | (AgentPhase::Planning, AgentPhase::Building)
            | (AgentPhase::Building, AgentPhase::Verifying)
            | (AgentPhase::Verifying, AgentPhase::Measuring)
            | (AgentPhase::Measuring, AgentPhase::Reviewing)
            | (AgentPhase::Reviewing, AgentPhase::Building)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_forward_path_is_valid() {
        assert!(is_valid_transition(AgentPhase::Crawling, AgentPhase::Planning));
        assert!(is_valid_transition(AgentPhase::Planning, AgentPhase::Building));
        assert!(is_valid_transition(AgentPhase::Building, AgentPhase::Verifying));
        assert!(is_valid_transition(AgentPhase::Verifying, AgentPhase::Measuring));
        assert!(is_valid_transition(AgentPhase::Measuring, AgentPhase::Reviewing));
    }

    #[test]
    fn reviewing_loops_back_to_building_not_planning() {
        assert!(is_valid_transition(AgentPhase::Reviewing, AgentPhase::Building));
        assert!(!is_valid_transition(AgentPhase::Reviewing, AgentPhase::Planning));
    }

    #[test]
    fn skipping_a_phase_is_invalid() {
        assert!(!is_valid_transition(AgentPhase::Crawling, AgentPhase::Building));
        assert!(!is_valid_transition(AgentPhase::Planning, AgentPhase::Reviewing));
    }
}
