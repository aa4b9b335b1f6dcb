/*!
 * Weighted aggregation of stage results.
 *
 * Turns the per-stage `AnalyzerResult`s of one round into a `QualityReport`:
 * - Overall score: weighted mean of the stages that ran, normalised by their weights
 * - Sub-scores: one entry per stage, degraded stages included
 * - Issues and recommendations: concatenated in stage order
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::PipelineError;
use crate::quality::model::{AnalyzerResult, QualityReport, Stage};

/// Allowed deviation of the weight sum from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

fn default_intent_weight() -> f64 {
    0.15
}

fn default_eeat_weight() -> f64 {
    0.30
}

fn default_sources_weight() -> f64 {
    0.25
}

fn default_link_placement_weight() -> f64 {
    0.0
}

fn default_variation_weight() -> f64 {
    0.10
}

fn default_error_detection_weight() -> f64 {
    0.20
}

/// Per-stage weights for the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageWeights {
    #[serde(default = "default_intent_weight")]
    pub intent: f64,

    #[serde(default = "default_eeat_weight")]
    pub eeat: f64,

    #[serde(default = "default_sources_weight")]
    pub sources: f64,

    /// Link placement is advisory and weighs nothing by default
    #[serde(default = "default_link_placement_weight")]
    pub link_placement: f64,

    #[serde(default = "default_variation_weight")]
    pub variation: f64,

    #[serde(default = "default_error_detection_weight")]
    pub error_detection: f64,
}

impl Default for StageWeights {
    fn default() -> Self {
        Self {
            intent: default_intent_weight(),
            eeat: default_eeat_weight(),
            sources: default_sources_weight(),
            link_placement: default_link_placement_weight(),
            variation: default_variation_weight(),
            error_detection: default_error_detection_weight(),
        }
    }
}

impl StageWeights {
    /// Weight of one stage.
    pub fn weight(&self, stage: Stage) -> f64 {
        match stage {
            Stage::Intent => self.intent,
            Stage::Eeat => self.eeat,
            Stage::Sources => self.sources,
            Stage::LinkPlacement => self.link_placement,
            Stage::Variation => self.variation,
            Stage::ErrorDetection => self.error_detection,
        }
    }

    pub fn sum(&self) -> f64 {
        Stage::ALL.iter().map(|s| self.weight(*s)).sum()
    }

    /// Check that every weight is finite and non-negative and that they sum to 1.0.
    pub fn validate(&self) -> Result<(), PipelineError> {
        for stage in Stage::ALL {
            let weight = self.weight(stage);
            if !weight.is_finite() || weight < 0.0 {
                return Err(PipelineError::Validation(format!(
                    "weight for stage '{}' must be a non-negative number, got {}",
                    stage, weight
                )));
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(PipelineError::Validation(format!(
                "stage weights must sum to 1.0, got {:.6}",
                sum
            )));
        }
        Ok(())
    }
}

/// Aggregates stage results into a report.
#[derive(Debug, Clone, Default)]
pub struct Scorer {
    weights: StageWeights,
}

impl Scorer {
    /// Create a scorer after validating the weight table.
    pub fn new(weights: StageWeights) -> Result<Self, PipelineError> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &StageWeights {
        &self.weights
    }

    /// Build the report for one round.
    pub fn aggregate(&self, revision: u32, results: &[AnalyzerResult]) -> QualityReport {
        let mut ordered: Vec<&AnalyzerResult> = results.iter().collect();
        ordered.sort_by_key(|r| r.stage);

        let mut sub_scores = BTreeMap::new();
        let mut issues = Vec::new();
        let mut recommendations: Vec<String> = Vec::new();
        let mut degraded_stages = Vec::new();

        for result in &ordered {
            sub_scores.insert(result.stage, result.score);
            issues.extend(result.issues.iter().cloned());
            for recommendation in &result.recommendations {
                if !recommendations.contains(recommendation) {
                    recommendations.push(recommendation.clone());
                }
            }
            if result.degraded {
                degraded_stages.push(result.stage);
            }
        }

        QualityReport {
            revision,
            overall_score: self.overall(&sub_scores),
            sub_scores,
            issues,
            recommendations,
            degraded_stages,
        }
    }

    /// Weighted mean of the scores present, clamped to [0, 100].
    pub fn overall(&self, sub_scores: &BTreeMap<Stage, f64>) -> f64 {
        if sub_scores.is_empty() {
            return 0.0;
        }
        let total_weight: f64 = sub_scores.keys().map(|s| self.weights.weight(*s)).sum();
        let overall = if total_weight > 0.0 {
            sub_scores
                .iter()
                .map(|(stage, score)| self.weights.weight(*stage) * score)
                .sum::<f64>()
                / total_weight
        } else {
            // Only zero-weight stages ran
            sub_scores.values().sum::<f64>() / sub_scores.len() as f64
        };
        overall.clamp(0.0, 100.0)
    }
}
