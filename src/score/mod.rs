//! @acp:module "ThriveScore"
//! @acp:summary "Weighted-deduction scoring over recorded answers"
//! @acp:domain score
//! @acp:layer logic

pub mod report;

pub use report::{render_report, ReportFormat};

use serde::{Deserialize, Serialize};

use crate::flow::QuestionFlowGraph;
use crate::session::AnswerRecord;

/// Score before any deduction
pub const BASELINE: u32 = 100;

/// ThriveScore with the default baseline.
///
/// Always in `[0, 100]`. Unknown keys and out-of-range option indices
/// deduct nothing.
pub fn score(answers: &[AnswerRecord], graph: &QuestionFlowGraph) -> u8 {
    ScoreAccumulator::default().score(answers, graph)
}

/// One answer's contribution to the score
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeductionItem {
    pub question_key: String,
    pub node_id: Option<String>,
    pub prompt: Option<String>,
    pub selected_option_index: usize,
    pub label: Option<String>,
    pub deduction: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub baseline: u32,
    pub total_deduction: u32,
    pub score: u8,
    /// In flow table order; answers for unknown keys last
    pub items: Vec<DeductionItem>,
}

/// Sums option deductions and subtracts them from a baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreAccumulator {
    baseline: u32,
}

impl Default for ScoreAccumulator {
    fn default() -> Self {
        Self { baseline: BASELINE }
    }
}

impl ScoreAccumulator {
    /// Baselines above 100 are clamped so scores stay in range
    pub fn new(baseline: u32) -> Self {
        Self {
            baseline: baseline.min(BASELINE),
        }
    }

    pub fn baseline(&self) -> u32 {
        self.baseline
    }

    pub fn score(&self, answers: &[AnswerRecord], graph: &QuestionFlowGraph) -> u8 {
        let total = graph
            .resolve(answers)
            .iter_deductions()
            .fold(0u32, |acc, d| acc.saturating_add(d));
        self.finish(total)
    }

    pub fn breakdown(&self, answers: &[AnswerRecord], graph: &QuestionFlowGraph) -> ScoreBreakdown {
        let mut items: Vec<DeductionItem> = Vec::with_capacity(answers.len());

        for node in graph.nodes().iter().filter(|n| n.is_question()) {
            let Some(record) = answers.iter().find(|a| a.question_key == node.answer_key()) else {
                continue;
            };
            let option = node.options.get(record.selected_option_index);
            items.push(DeductionItem {
                question_key: record.question_key.clone(),
                node_id: Some(node.id.clone()),
                prompt: Some(node.prompt.clone()),
                selected_option_index: record.selected_option_index,
                label: option.map(|o| o.label.clone()),
                deduction: option.map(|o| o.deduction).unwrap_or(0),
            });
        }

        for record in answers {
            if graph.node_for_key(&record.question_key).is_none() {
                items.push(DeductionItem {
                    question_key: record.question_key.clone(),
                    node_id: None,
                    prompt: None,
                    selected_option_index: record.selected_option_index,
                    label: None,
                    deduction: 0,
                });
            }
        }

        let total_deduction = items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.deduction));

        ScoreBreakdown {
            baseline: self.baseline,
            total_deduction,
            score: self.finish(total_deduction),
            items,
        }
    }

    fn finish(&self, total_deduction: u32) -> u8 {
        // baseline <= 100 so the cast cannot truncate
        self.baseline.saturating_sub(total_deduction) as u8
    }
}

/// Named score range; a score falls in the first band whose `min` it meets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBand {
    pub min: u8,
    pub label: String,
}

impl ScoreBand {
    pub fn new(min: u8, label: impl Into<String>) -> Self {
        Self {
            min,
            label: label.into(),
        }
    }
}

pub fn default_bands() -> Vec<ScoreBand> {
    vec![
        ScoreBand::new(85, "Thriving"),
        ScoreBand::new(70, "Doing well"),
        ScoreBand::new(50, "Some concerns"),
        ScoreBand::new(0, "Needs support"),
    ]
}

/// Band for a score, checking the highest thresholds first
pub fn band_for(score: u8, bands: &[ScoreBand]) -> Option<&ScoreBand> {
    let mut sorted: Vec<&ScoreBand> = bands.iter().collect();
    sorted.sort_by(|a, b| b.min.cmp(&a.min));
    sorted.into_iter().find(|band| score >= band.min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::load_graph;

    fn record(key: &str, index: usize) -> AnswerRecord {
        AnswerRecord::new(key, index)
    }

    #[test]
    fn test_empty_answers_score_baseline() {
        let graph = load_graph(None).unwrap();
        assert_eq!(score(&[], &graph), 100);
    }

    #[test]
    fn test_vision_and_mobility_example() {
        let graph = load_graph(None).unwrap();
        let answers = vec![record("vision", 3), record("mobilityAids", 2)];
        assert_eq!(score(&answers, &graph), 85);
    }

    #[test]
    fn test_missing_deductions_default_to_zero() {
        let graph = load_graph(None).unwrap();
        let answers = vec![record("unknownKey", 1), record("vision", 42)];
        assert_eq!(score(&answers, &graph), 100);

        let breakdown = ScoreAccumulator::default().breakdown(&answers, &graph);
        assert_eq!(breakdown.items.len(), 2);
        assert_eq!(breakdown.items[0].question_key, "vision");
        assert_eq!(breakdown.items[0].label, None);
        assert_eq!(breakdown.items[1].node_id, None);
    }

    #[test]
    fn test_score_floors_at_zero() {
        let graph = load_graph(None).unwrap();
        let answers: Vec<AnswerRecord> = graph
            .nodes()
            .iter()
            .filter(|n| n.is_question())
            .map(|n| {
                let worst = n
                    .options
                    .iter()
                    .enumerate()
                    .max_by_key(|(_, o)| o.deduction)
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                record(n.answer_key(), worst)
            })
            .collect();

        let acc = ScoreAccumulator::new(40);
        assert_eq!(acc.score(&answers, &graph), 0);
        assert!(score(&answers, &graph) <= 100);
    }

    #[test]
    fn test_baseline_clamped() {
        assert_eq!(ScoreAccumulator::new(250).baseline(), 100);
    }

    #[test]
    fn test_breakdown_matches_score() {
        let graph = load_graph(None).unwrap();
        let answers = vec![record("mobilityAids", 2), record("vision", 3)];
        let breakdown = ScoreAccumulator::default().breakdown(&answers, &graph);
        assert_eq!(breakdown.total_deduction, 15);
        assert_eq!(breakdown.score, 85);
        // flow order: vision is asked before mobility aids
        assert_eq!(breakdown.items[0].question_key, "vision");
    }

    #[test]
    fn test_bands() {
        let bands = default_bands();
        assert_eq!(band_for(100, &bands).unwrap().label, "Thriving");
        assert_eq!(band_for(85, &bands).unwrap().label, "Thriving");
        assert_eq!(band_for(84, &bands).unwrap().label, "Doing well");
        assert_eq!(band_for(0, &bands).unwrap().label, "Needs support");
        assert!(band_for(10, &[ScoreBand::new(50, "High")]).is_none());
    }
}
