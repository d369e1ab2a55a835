//! Pure per-phase checkpoint bookkeeping for `AgentRun` (spec §4.7
//! "Checkpointing"). Distinct from `store::CheckpointStore`, which is the
//! I/O boundary that persists the result of these mutations.

use std::time::Instant;

use crate::models::{AgentPhase, AgentRun, IterationResult};

use super::state_machine::is_valid_transition;

/// Spec §4.7: "last-100 log lines".
const MAX_LOG_TAIL: usize = 100;

/// Advance `run` to `next_phase`, folding the wall-clock spent in the
/// phase just finished into `checkpoint.phase_timings`, keyed by that
/// phase's `Debug` name. Returns the new phase-start instant so the
/// caller can thread it into the next call.
pub fn advance_phase_timed(run: &mut AgentRun, next_phase: AgentPhase, phase_started_at: Instant) -> Instant {
    debug_assert!(
        is_valid_transition(run.current_phase, next_phase),
        "invalid agent phase transition {:?} -> {next_phase:?}",
        run.current_phase
    );
    let key = format!("{:?}", run.current_phase);
    *run.checkpoint.phase_timings.entry(key).or_insert(0.0) += phase_started_at.elapsed().as_secs_f64();
    run.advance_phase(next_phase);
    Instant::now()
}

/// Append a log line to `recent_log_tail`, keeping only the last
/// `MAX_LOG_TAIL` entries.
pub fn push_log(run: &mut AgentRun, line: impl Into<String>) {
    run.recent_log_tail.push(line.into());
    if run.recent_log_tail.len() > MAX_LOG_TAIL {
        let excess = run.recent_log_tail.len() - MAX_LOG_TAIL;
        run.recent_log_tail.drain(0..excess);
    }
}

pub fn record_iteration(run: &mut AgentRun, result: IterationResult) {
    run.checkpoint.iteration_history.push(result);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn log_tail_is_capped_at_100_lines() {
        let mut run = AgentRun::new(uuid::Uuid::new_v4(), PathBuf::from("/tmp/x"), json!({}));
        for i in 0..150 {
            push_log(&mut run, format!("line {i}"));
        }
        assert_eq!(run.recent_log_tail.len(), 100);
        assert_eq!(run.recent_log_tail.first().unwrap(), "line 50");
        assert_eq!(run.recent_log_tail.last().unwrap(), "line 149");
    }

    #[test]
    fn advance_phase_timed_accumulates_duration_under_previous_phase_key() {
        let mut run = AgentRun::new(uuid::Uuid::new_v4(), PathBuf::from("/tmp/x"), json!({}));
        let started = Instant::now() - Duration::from_millis(5);
        advance_phase_timed(&mut run, AgentPhase::Planning, started);
        assert!(run.checkpoint.phase_timings.contains_key("Crawling"));
        assert!(run.checkpoint.phase_timings["Crawling"] > 0.0);
        assert_eq!(run.current_phase, AgentPhase::Planning);
    }

    #[test]
    fn record_iteration_appends_to_history() {
        let mut run = AgentRun::new(uuid::Uuid::new_v4(), PathBuf::from("/tmp/x"), json!({}));
        let result = IterationResult {
            iteration: 0,
            settings_snapshot: json!({}),
            build_id: None,
            edge_url: None,
            visual_results: Vec::new(),
            functional_results: Vec::new(),
            link_results: Vec::new(),
            performance_results: Vec::new(),
            pagespeed_scores: Default::default(),
        };
        record_iteration(&mut run, result);
        assert_eq!(run.checkpoint.iteration_history.len(), 1);
    }
}
