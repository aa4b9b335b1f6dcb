/*!
 * Approval gate.
 *
 * Applies `ApprovalCriteria` to a `QualityReport`. The decision and its
 * rationale depend only on the report, the criteria and the remaining
 * refinement budget, so identical inputs always produce identical text.
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::PipelineError;
use crate::quality::model::{QualityReport, Stage};

fn default_minimum_overall_score() -> f64 {
    80.0
}

fn default_max_high_severity_issues() -> usize {
    0
}

fn default_hard_floor_margin() -> f64 {
    20.0
}

/// Thresholds a report must meet to be approved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalCriteria {
    /// Minimum overall score
    #[serde(default = "default_minimum_overall_score", alias = "minimum_overall_score")]
    pub minimum_overall_score: f64,

    /// Optional per-stage minimum scores
    #[serde(default, alias = "per_stage_minimums")]
    pub per_stage_minimums: BTreeMap<Stage, f64>,

    /// Maximum number of high-severity issues, link placement excluded
    #[serde(default = "default_max_high_severity_issues", alias = "max_high_severity_issues")]
    pub max_high_severity_issues: usize,

    /// Distance below the minimum at which content is rejected outright
    #[serde(default = "default_hard_floor_margin", alias = "hard_floor_margin")]
    pub hard_floor_margin: f64,
}

impl Default for ApprovalCriteria {
    fn default() -> Self {
        Self {
            minimum_overall_score: default_minimum_overall_score(),
            per_stage_minimums: BTreeMap::new(),
            max_high_severity_issues: default_max_high_severity_issues(),
            hard_floor_margin: default_hard_floor_margin(),
        }
    }
}

impl ApprovalCriteria {
    /// Score below which content is not salvageable.
    pub fn hard_floor(&self) -> f64 {
        self.minimum_overall_score - self.hard_floor_margin
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        let in_range = |v: f64| v.is_finite() && (0.0..=100.0).contains(&v);
        if !in_range(self.minimum_overall_score) {
            return Err(PipelineError::Validation(format!(
                "minimumOverallScore must be within 0-100, got {}",
                self.minimum_overall_score
            )));
        }
        for (stage, minimum) in &self.per_stage_minimums {
            if !in_range(*minimum) {
                return Err(PipelineError::Validation(format!(
                    "perStageMinimums.{} must be within 0-100, got {}",
                    stage, minimum
                )));
            }
        }
        if !self.hard_floor_margin.is_finite() || self.hard_floor_margin < 0.0 {
            return Err(PipelineError::Validation(format!(
                "hardFloorMargin must be a non-negative number, got {}",
                self.hard_floor_margin
            )));
        }
        Ok(())
    }
}

/// Outcome of the approval gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApprovalOutcome {
    Approved,
    Rejected,
    NeedsRefinement,
}

impl ApprovalOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalOutcome::Approved => "approved",
            ApprovalOutcome::Rejected => "rejected",
            ApprovalOutcome::NeedsRefinement => "needs-refinement",
        }
    }
}

impl std::fmt::Display for ApprovalOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decision for one revision, with the report it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalDecision {
    pub outcome: ApprovalOutcome,
    pub report: QualityReport,

    /// One line per failed criterion
    pub rationale: Vec<String>,
    pub recommendations: Vec<String>,
}

impl ApprovalDecision {
    pub fn is_approved(&self) -> bool {
        self.outcome == ApprovalOutcome::Approved
    }
}

/// Applies approval criteria to quality reports.
#[derive(Debug, Clone, Default)]
pub struct ApprovalSystem;

impl ApprovalSystem {
    pub fn new() -> Self {
        Self
    }

    /// Number of high-severity issues that count toward the limit.
    pub fn counted_high_issues(report: &QualityReport) -> usize {
        report
            .issues
            .iter()
            .filter(|i| i.is_high() && i.stage != Stage::LinkPlacement)
            .count()
    }

    /// Decide on a report.
    ///
    /// # Arguments
    /// * `report` - The report of the current revision
    /// * `criteria` - Thresholds to apply
    /// * `remaining_refinements` - Refinement rounds still available; rejection
    ///   only happens when none are left
    pub fn decide(
        &self,
        report: &QualityReport,
        criteria: &ApprovalCriteria,
        remaining_refinements: u32,
    ) -> ApprovalDecision {
        let mut rationale = Vec::new();

        if report.overall_score < criteria.minimum_overall_score {
            rationale.push(format!(
                "overall score {:.1} is below minimum {:.1}",
                report.overall_score, criteria.minimum_overall_score
            ));
        }

        for (stage, minimum) in &criteria.per_stage_minimums {
            match report.sub_scores.get(stage) {
                Some(score) if score < minimum => rationale.push(format!(
                    "stage {} score {:.1} is below minimum {:.1}",
                    stage, score, minimum
                )),
                Some(_) => {}
                None => rationale.push(format!("stage {} did not report a score", stage)),
            }
        }

        let high = Self::counted_high_issues(report);
        if high > criteria.max_high_severity_issues {
            rationale.push(format!(
                "{} high-severity issue(s) exceed the maximum of {}",
                high, criteria.max_high_severity_issues
            ));
        }

        let outcome = if rationale.is_empty() {
            rationale.push(format!(
                "all approval criteria met (overall score {:.1})",
                report.overall_score
            ));
            ApprovalOutcome::Approved
        } else if report.overall_score < criteria.hard_floor() && remaining_refinements == 0 {
            rationale.push(format!(
                "overall score {:.1} is below the hard floor {:.1} with no refinement budget left",
                report.overall_score,
                criteria.hard_floor()
            ));
            ApprovalOutcome::Rejected
        } else {
            ApprovalOutcome::NeedsRefinement
        };

        ApprovalDecision {
            outcome,
            report: report.clone(),
            rationale,
            recommendations: report.recommendations.clone(),
        }
    }
}
