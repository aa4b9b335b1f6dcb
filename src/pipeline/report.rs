/*!
 * Run reports and the request/response contract.
 *
 * `FinalValidationReport` is the full audit trail of one run. It converts
 * into the camelCase `PipelineResponse` handed to callers; failures use
 * `ErrorResponse` from the errors module instead.
 */

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_config::Config;
use crate::errors::PipelineError;
use crate::quality::approval::{ApprovalCriteria, ApprovalDecision};
use crate::quality::model::{QualityReport, Requirements, Stage};
use crate::quality::scorer::StageWeights;

use super::orchestrator::RunOptions;

/// Why the refinement loop stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Termination {
    /// The latest revision met every criterion
    Approved,
    /// The refinement budget is used up; the last decision stands as-is
    IterationLimit,
    /// The content fell below the hard floor with no budget left
    Rejected,
    /// A high-severity issue had no corrector
    RefinementFailed { message: String },
    /// Refinement returned the text unchanged
    NoProgress,
}

/// Audit trail of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalValidationReport {
    pub run_id: Uuid,
    pub original_content: String,
    pub final_content: String,

    /// One decision per revision analyzed, oldest first
    pub decision_history: Vec<ApprovalDecision>,
    pub total_iterations: u32,
    pub processing_time_ms: u64,
    pub termination: Termination,
    pub options: RunOptions,
}

impl FinalValidationReport {
    /// The decision of the last round.
    pub fn final_decision(&self) -> Option<&ApprovalDecision> {
        self.decision_history.last()
    }

    /// Every stage that degraded in any round, in stage order.
    pub fn degraded_stages(&self) -> Vec<Stage> {
        let mut stages: Vec<Stage> = self
            .decision_history
            .iter()
            .flat_map(|d| d.report.degraded_stages.iter().copied())
            .collect();
        stages.sort();
        stages.dedup();
        stages
    }

    /// Build the caller-facing response.
    pub fn to_response(&self) -> Result<PipelineResponse, PipelineError> {
        let decision = self
            .final_decision()
            .ok_or_else(|| PipelineError::Internal("run finished without a decision".to_string()))?;

        Ok(PipelineResponse {
            success: true,
            validation: decision.report.clone(),
            approval: decision.clone(),
            content: ContentPair {
                original: self.original_content.clone(),
                final_content: self.final_content.clone(),
            },
            metadata: ResponseMetadata {
                run_id: self.run_id,
                options: self.options.clone(),
                total_iterations: self.total_iterations,
                termination: self.termination.clone(),
                degraded_stages: self.degraded_stages(),
            },
            processing_time_ms: self.processing_time_ms,
        })
    }
}

/// Original and final text of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPair {
    pub original: String,
    #[serde(rename = "final")]
    pub final_content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub run_id: Uuid,
    pub options: RunOptions,
    pub total_iterations: u32,
    pub termination: Termination,
    pub degraded_stages: Vec<Stage>,
}

/// Response for a completed run.
///
/// `success` means the pipeline completed; whether the content passed is
/// in `approval.outcome`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResponse {
    pub success: bool,
    pub validation: QualityReport,
    pub approval: ApprovalDecision,
    pub content: ContentPair,
    pub metadata: ResponseMetadata,
    pub processing_time_ms: u64,
}

/// Options as supplied by a request; unset fields fall back to configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    #[serde(default)]
    pub force_refinement: Option<bool>,
    #[serde(default)]
    pub max_refinement_iterations: Option<u32>,
    #[serde(default)]
    pub approval_criteria: Option<ApprovalCriteria>,
}

impl RequestOptions {
    /// Resolve against configuration defaults.
    pub fn resolve(&self, config: &Config) -> RunOptions {
        RunOptions {
            force_refinement: self.force_refinement.unwrap_or(false),
            max_refinement_iterations: self
                .max_refinement_iterations
                .unwrap_or(config.pipeline.max_refinement_iterations),
            approval_criteria: self.approval_criteria.clone(),
        }
    }
}

/// One evaluation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub content: String,
    pub requirements: Requirements,
    #[serde(default)]
    pub options: RequestOptions,
}

/// Read-only descriptor for monitoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDescriptor {
    pub status: String,
    pub version: String,
    pub stages: Vec<Stage>,
    pub thresholds: ApprovalCriteria,
    pub weights: StageWeights,
    pub features: Vec<String>,
}

impl StatusDescriptor {
    pub fn from_config(config: &Config) -> Self {
        let mut features: Vec<String> = [
            "intent-analysis",
            "eeat-scoring",
            "source-validation",
            "link-placement",
            "variation-detection",
            "error-detection",
            "automated-refinement",
            "cancellation",
        ]
        .iter()
        .map(|f| f.to_string())
        .collect();
        if config.sources.check_reachability {
            features.push("source-reachability".to_string());
        }

        Self {
            status: "operational".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            stages: Stage::ALL.to_vec(),
            thresholds: config.approval.clone(),
            weights: config.weights,
            features,
        }
    }
}
