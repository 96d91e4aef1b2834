//! Onboarding session integration tests
//!
//! Tests for answer persistence, resume positions and the ThriveScore.

use tempfile::TempDir;
use thrive::flow::{load_graph, QuestionNode};
use thrive::score::{band_for, default_bands, render_report, ReportFormat};
use thrive::session::ONBOARDING_STORAGE_KEY;
use thrive::{
    score, AnswerRecord, AnswerStore, Config, FileStore, KeyValueStore, MemoryStore,
    QuestionFlowGraph, ScoreAccumulator,
};

/// Drive a session from the first question to the terminal node, picking
/// an option per question with `pick`.
fn answer_all<S: KeyValueStore>(
    graph: &QuestionFlowGraph,
    store: &mut AnswerStore<S>,
    pick: impl Fn(&QuestionNode) -> usize,
) -> Vec<String> {
    let mut visited = Vec::new();
    let mut current = graph.start().to_string();

    while !graph.is_terminal(&current) {
        let node = graph.node(&current).unwrap();
        visited.push(current.clone());
        current = if node.is_question() {
            store.submit(graph, &current, pick(node)).unwrap()
        } else {
            store.advance(graph).unwrap()
        };
    }

    visited
}

fn most_severe(node: &QuestionNode) -> usize {
    node.options
        .iter()
        .enumerate()
        .max_by_key(|(_, o)| o.deduction)
        .map(|(i, _)| i)
        .unwrap()
}

// =============================================================================
// Resume Positions
// =============================================================================

mod resume_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_session_resumes_at_start() {
        let graph = load_graph(None).unwrap();
        let store = AnswerStore::open(MemoryStore::new(), ONBOARDING_STORAGE_KEY, &graph).unwrap();

        assert_eq!(store.first_unanswered(&graph).unwrap(), graph.start());
        assert!(!store.session().been_here_before);
    }

    #[test]
    fn test_partial_session_resumes_at_first_open_question() {
        let graph = load_graph(None).unwrap();
        let mut store =
            AnswerStore::open(MemoryStore::new(), ONBOARDING_STORAGE_KEY, &graph).unwrap();

        store.submit(&graph, "living-situation", 0).unwrap();
        store.submit(&graph, "vision", 1).unwrap();

        assert_eq!(store.first_unanswered(&graph).unwrap(), "mobility-aids");
    }

    #[test]
    fn test_walk_passes_informational_screen() {
        let graph = load_graph(None).unwrap();
        let mut store =
            AnswerStore::open(MemoryStore::new(), ONBOARDING_STORAGE_KEY, &graph).unwrap();

        for (key, index) in [("livingSituation", 0), ("vision", 0), ("mobilityAids", 0)] {
            store.record(key, index).unwrap();
        }

        // movement-and-stability has no options and is not a stopping point
        assert_eq!(store.first_unanswered(&graph).unwrap(), "balance-history");
    }

    #[test]
    fn test_fully_answered_session_reaches_done() {
        let graph = load_graph(None).unwrap();
        let mut store =
            AnswerStore::open(MemoryStore::new(), ONBOARDING_STORAGE_KEY, &graph).unwrap();

        let visited = answer_all(&graph, &mut store, |_| 0);

        assert_eq!(store.first_unanswered(&graph).unwrap(), "done");
        assert_eq!(store.current_node_id(), "done");
        assert!(!visited.contains(&"balance-followup".to_string()));
        assert!(!visited.contains(&"medication-help".to_string()));
        assert!(store.session().is_complete());
        assert_eq!(store.session().final_score, Some(100));
    }

    #[test]
    fn test_resubmitted_answer_refinalises_score() {
        let graph = load_graph(None).unwrap();
        let mut store =
            AnswerStore::open(MemoryStore::new(), ONBOARDING_STORAGE_KEY, &graph).unwrap();

        answer_all(&graph, &mut store, |_| 0);
        assert_eq!(store.session().final_score, Some(100));

        assert_eq!(store.submit(&graph, "vision", 3).unwrap(), "mobility-aids");
        assert!(!store.session().is_complete());
        assert_eq!(store.session().final_score, None);

        assert_eq!(store.resume(&graph).unwrap(), "done");
        assert_eq!(store.session().final_score, Some(score(store.answers(), &graph)));
        assert_eq!(store.session().final_score, Some(90));
    }

    #[test]
    fn test_followup_answer_required_on_fall_path() {
        let graph = load_graph(None).unwrap();
        let mut store =
            AnswerStore::open(MemoryStore::new(), ONBOARDING_STORAGE_KEY, &graph).unwrap();

        for (key, index) in [
            ("livingSituation", 0),
            ("vision", 0),
            ("mobilityAids", 0),
            ("balanceHistory", 2),
        ] {
            store.record(key, index).unwrap();
        }
        assert_eq!(store.first_unanswered(&graph).unwrap(), "balance-followup");
    }
}

// =============================================================================
// Recording Answers
// =============================================================================

mod record_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_overwrites_prior_answer() {
        let graph = load_graph(None).unwrap();
        let mut store =
            AnswerStore::open(MemoryStore::new(), ONBOARDING_STORAGE_KEY, &graph).unwrap();

        store.record("vision", 1).unwrap();
        store.record("vision", 3).unwrap();

        let vision: Vec<&AnswerRecord> = store
            .answers()
            .iter()
            .filter(|a| a.question_key == "vision")
            .collect();
        assert_eq!(vision.len(), 1);
        assert_eq!(vision[0].selected_option_index, 3);
    }

    #[test]
    fn test_record_persists_immediately() {
        let dir = TempDir::new().unwrap();
        let graph = load_graph(None).unwrap();

        {
            let mut store =
                AnswerStore::open(FileStore::new(dir.path()), ONBOARDING_STORAGE_KEY, &graph)
                    .unwrap();
            store.record("vision", 2).unwrap();
        }

        let raw = std::fs::read_to_string(dir.path().join("onboarding-storage.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], 0);
        assert_eq!(value["state"]["answers"][0]["questionKey"], "vision");
        assert_eq!(value["state"]["answers"][0]["selectedOptionIndex"], 2);
    }

    #[test]
    fn test_reopen_marks_returning_user() {
        let dir = TempDir::new().unwrap();
        let graph = load_graph(None).unwrap();

        let id = {
            let mut store =
                AnswerStore::open(FileStore::new(dir.path()), ONBOARDING_STORAGE_KEY, &graph)
                    .unwrap();
            store.submit(&graph, "living-situation", 1).unwrap();
            store.session().id
        };

        let store =
            AnswerStore::open(FileStore::new(dir.path()), ONBOARDING_STORAGE_KEY, &graph).unwrap();
        assert!(store.session().been_here_before);
        assert_eq!(store.session().id, id);
        assert_eq!(store.current_node_id(), "vision");
        assert_eq!(store.answers().len(), 1);
    }

    #[test]
    fn test_reset_removes_stored_session() {
        let dir = TempDir::new().unwrap();
        let graph = load_graph(None).unwrap();
        let mut store =
            AnswerStore::open(FileStore::new(dir.path()), ONBOARDING_STORAGE_KEY, &graph).unwrap();

        store.record("vision", 2).unwrap();
        store.reset(&graph).unwrap();

        assert!(!dir.path().join("onboarding-storage.json").exists());
        assert!(store.answers().is_empty());
        assert_eq!(store.current_node_id(), "welcome");
    }
}

// =============================================================================
// ThriveScore
// =============================================================================

mod score_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_vision_and_mobility_deductions() {
        let graph = load_graph(None).unwrap();
        let answers = vec![AnswerRecord::new("vision", 3), AnswerRecord::new("mobilityAids", 2)];

        assert_eq!(score(&answers, &graph), 85);
    }

    #[test]
    fn test_unknown_keys_and_indices_deduct_nothing() {
        let graph = load_graph(None).unwrap();
        let answers = vec![
            AnswerRecord::new("favoriteColor", 2),
            AnswerRecord::new("vision", 42),
        ];
        assert_eq!(score(&answers, &graph), 100);
    }

    #[test]
    fn test_score_floors_at_zero() {
        let graph = load_graph(None).unwrap();
        let mut store =
            AnswerStore::open(MemoryStore::new(), ONBOARDING_STORAGE_KEY, &graph).unwrap();

        let visited = answer_all(&graph, &mut store, most_severe);

        assert!(visited.contains(&"balance-followup".to_string()));
        assert!(visited.contains(&"medication-help".to_string()));
        assert_eq!(store.score(&graph), 0);
        assert_eq!(store.session().final_score, Some(0));
    }

    #[test]
    fn test_score_stays_in_range_for_any_path() {
        let graph = load_graph(None).unwrap();
        for choice in 0..4 {
            let mut store =
                AnswerStore::open(MemoryStore::new(), ONBOARDING_STORAGE_KEY, &graph).unwrap();
            answer_all(&graph, &mut store, |node| choice.min(node.options.len() - 1));
            assert!(store.score(&graph) <= 100);
        }
    }

    #[test]
    fn test_lower_baseline_from_config() {
        let graph = load_graph(None).unwrap();
        let config = Config {
            baseline: 90,
            ..Config::default()
        };
        let answers = vec![AnswerRecord::new("vision", 3)];

        assert_eq!(config.accumulator().score(&answers, &graph), 80);
        assert_eq!(ScoreAccumulator::new(250).score(&answers, &graph), 90);
    }

    #[test]
    fn test_breakdown_report_and_band() {
        let graph = load_graph(None).unwrap();
        let answers = vec![AnswerRecord::new("mobilityAids", 2), AnswerRecord::new("vision", 3)];

        let breakdown = ScoreAccumulator::default().breakdown(&answers, &graph);
        assert_eq!(breakdown.total_deduction, 15);
        // Flow table order, not answer order
        assert_eq!(breakdown.items[0].question_key, "vision");

        let bands = default_bands();
        let band = band_for(breakdown.score, &bands);
        assert_eq!(band.map(|b| b.label.as_str()), Some("Thriving"));

        let json = render_report(&breakdown, band, ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["score"], 85);
    }
}
