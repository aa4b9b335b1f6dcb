/*!
 * Pipeline orchestrator for the analyze, score, approve and refine loop.
 *
 * Each round runs every analyzer concurrently on the current revision:
 * 1. **Analyzing**: one task per stage, each bounded by the stage timeout
 * 2. **Scoring**: stage results are aggregated into a `QualityReport`
 * 3. **Approval check**: criteria turn the report into a decision
 * 4. **Refining**: when refinement is needed and budget remains, the
 *    refinement engine produces the next revision and the loop restarts
 *
 * Rounds are strictly sequential. A failing or slow stage degrades to a
 * zero score instead of failing the run.
 */

use futures::future::join_all;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::app_config::Config;
use crate::errors::PipelineError;
use crate::quality::analyzers::{Analyzer, default_analyzers};
use crate::quality::approval::{ApprovalCriteria, ApprovalOutcome, ApprovalSystem};
use crate::quality::model::{AnalyzerResult, ContentCandidate, Requirements, Stage};
use crate::quality::refinement::RefinementEngine;
use crate::quality::scorer::Scorer;

use super::report::{FinalValidationReport, Termination};

fn default_max_refinement_iterations() -> u32 {
    3
}

/// Per-run options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOptions {
    /// Refine once even when the first revision is approved
    #[serde(default)]
    pub force_refinement: bool,

    /// Upper bound on analyzed revisions, at least 1
    #[serde(default = "default_max_refinement_iterations")]
    pub max_refinement_iterations: u32,

    /// Overrides the pipeline's default criteria for this run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_criteria: Option<ApprovalCriteria>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            force_refinement: false,
            max_refinement_iterations: default_max_refinement_iterations(),
            approval_criteria: None,
        }
    }
}

impl RunOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_refinement_iterations: config.pipeline.max_refinement_iterations,
            ..Default::default()
        }
    }

    pub fn with_force_refinement(mut self, force: bool) -> Self {
        self.force_refinement = force;
        self
    }

    pub fn with_max_refinement_iterations(mut self, iterations: u32) -> Self {
        self.max_refinement_iterations = iterations;
        self
    }

    pub fn with_approval_criteria(mut self, criteria: ApprovalCriteria) -> Self {
        self.approval_criteria = Some(criteria);
        self
    }
}

/// States of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Initializing,
    Analyzing,
    Scoring,
    ApprovalCheck,
    Refining,
    Finalizing,
    Done,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initializing => "initializing",
            Self::Analyzing => "analyzing",
            Self::Scoring => "scoring",
            Self::ApprovalCheck => "approval-check",
            Self::Refining => "refining",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Tracks the current state of a run and logs every transition.
#[derive(Debug)]
struct StateTracker {
    run_id: Uuid,
    state: PipelineState,
}

impl StateTracker {
    fn new(run_id: Uuid) -> Self {
        debug!("[{}] state: {}", run_id, PipelineState::Initializing);
        Self {
            run_id,
            state: PipelineState::Initializing,
        }
    }

    fn enter(&mut self, next: PipelineState) {
        debug!("[{}] state: {} -> {}", self.run_id, self.state, next);
        self.state = next;
    }
}

/// The content quality pipeline.
#[derive(Debug, Clone)]
pub struct QualityPipeline {
    analyzers: Vec<Arc<dyn Analyzer>>,
    scorer: Scorer,
    approval: ApprovalSystem,
    refinement: RefinementEngine,
    default_criteria: ApprovalCriteria,
    stage_timeout: Duration,
}

impl QualityPipeline {
    /// Create a pipeline over the given analyzers with default settings.
    pub fn new(analyzers: Vec<Arc<dyn Analyzer>>) -> Self {
        let settings = Config::default();
        Self {
            analyzers,
            scorer: Scorer::default(),
            approval: ApprovalSystem::new(),
            refinement: RefinementEngine::with_default_correctors(settings.pipeline.variation_seed),
            default_criteria: settings.approval,
            stage_timeout: settings.pipeline.stage_timeout(),
        }
    }

    /// Build the standard pipeline from configuration.
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        config
            .validate()
            .map_err(|e| PipelineError::Validation(format!("{:#}", e)))?;
        let analyzers = default_analyzers(config)?;

        Ok(Self {
            analyzers,
            scorer: Scorer::new(config.weights)?,
            approval: ApprovalSystem::new(),
            refinement: RefinementEngine::with_default_correctors(config.pipeline.variation_seed),
            default_criteria: config.approval.clone(),
            stage_timeout: config.pipeline.stage_timeout(),
        })
    }

    pub fn with_scorer(mut self, scorer: Scorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_refinement(mut self, refinement: RefinementEngine) -> Self {
        self.refinement = refinement;
        self
    }

    pub fn with_default_criteria(mut self, criteria: ApprovalCriteria) -> Self {
        self.default_criteria = criteria;
        self
    }

    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.analyzers.iter().map(|a| a.stage()).collect()
    }

    /// Run the pipeline to completion.
    pub async fn run(
        &self,
        content: &str,
        requirements: &Requirements,
        options: &RunOptions,
    ) -> Result<FinalValidationReport, PipelineError> {
        self.run_with_cancellation(content, requirements, options, CancellationToken::new())
            .await
    }

    /// Run the pipeline, aborting in-flight analyzers when `cancel` fires.
    ///
    /// # Errors
    /// * `Validation` for blank content, invalid requirements or options
    /// * `Cancelled` when the token fires before the run completes
    /// * `Internal` when every stage of a round degrades
    pub async fn run_with_cancellation(
        &self,
        content: &str,
        requirements: &Requirements,
        options: &RunOptions,
        cancel: CancellationToken,
    ) -> Result<FinalValidationReport, PipelineError> {
        let started = Instant::now();
        let run_id = Uuid::new_v4();
        let mut tracker = StateTracker::new(run_id);

        if content.trim().is_empty() {
            return Err(PipelineError::Validation("content must not be empty".to_string()));
        }
        requirements.validate()?;
        if options.max_refinement_iterations == 0 {
            return Err(PipelineError::Validation(
                "maxRefinementIterations must be at least 1".to_string(),
            ));
        }
        let criteria = options
            .approval_criteria
            .clone()
            .unwrap_or_else(|| self.default_criteria.clone());
        criteria.validate()?;

        info!(
            "[{}] Starting quality run ({} stages, up to {} revision(s))",
            run_id,
            self.analyzers.len(),
            options.max_refinement_iterations
        );

        let original = ContentCandidate::original(content);
        let mut candidate = original.clone();
        let mut history = Vec::new();

        let termination = loop {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }

            tracker.enter(PipelineState::Analyzing);
            let results = self
                .analyze_round(&candidate, requirements, &cancel)
                .await
                .inspect_err(|e| {
                    if let PipelineError::Internal(detail) = e {
                        error!("[{}] {}", run_id, detail);
                    }
                })?;

            tracker.enter(PipelineState::Scoring);
            let report = self.scorer.aggregate(candidate.revision, &results);

            tracker.enter(PipelineState::ApprovalCheck);
            let round = history.len() as u32 + 1;
            let remaining = options.max_refinement_iterations - round;
            let decision = self.approval.decide(&report, &criteria, remaining);
            let outcome = decision.outcome;
            info!(
                "[{}] Revision {} scored {:.1}: {}",
                run_id, candidate.revision, report.overall_score, outcome
            );
            history.push(decision);

            let forced = options.force_refinement && candidate.revision == 0;
            match outcome {
                ApprovalOutcome::Approved if !forced || remaining == 0 => break Termination::Approved,
                ApprovalOutcome::Rejected => break Termination::Rejected,
                _ if remaining == 0 => break Termination::IterationLimit,
                _ => {}
            }

            tracker.enter(PipelineState::Refining);
            let next = match self.refinement.refine(&candidate, &report, requirements) {
                Ok(next) => next,
                Err(PipelineError::Refinement { kind, message }) => {
                    warn!("[{}] Refinement stopped on {} issue: {}", run_id, kind, message);
                    break Termination::RefinementFailed { message };
                }
                Err(e) => return Err(e),
            };

            if next.text == candidate.text && !forced {
                debug!("[{}] Refinement left revision {} unchanged", run_id, candidate.revision);
                break Termination::NoProgress;
            }
            candidate = next;
        };

        tracker.enter(PipelineState::Finalizing);
        let report = FinalValidationReport {
            run_id,
            original_content: original.text,
            final_content: candidate.text,
            total_iterations: history.len() as u32,
            decision_history: history,
            processing_time_ms: started.elapsed().as_millis() as u64,
            termination,
            options: options.clone(),
        };
        tracker.enter(PipelineState::Done);

        info!(
            "[{}] Finished after {} revision(s) in {}ms: {:?}",
            run_id, report.total_iterations, report.processing_time_ms, report.termination
        );
        Ok(report)
    }

    /// Run every analyzer once on `candidate`.
    async fn analyze_round(
        &self,
        candidate: &ContentCandidate,
        requirements: &Requirements,
        cancel: &CancellationToken,
    ) -> Result<Vec<AnalyzerResult>, PipelineError> {
        let stages = self.stages();
        let handles: Vec<_> = self
            .analyzers
            .iter()
            .map(|analyzer| {
                let analyzer = Arc::clone(analyzer);
                let content = candidate.clone();
                let requirements = requirements.clone();
                let timeout = self.stage_timeout;
                tokio::spawn(async move {
                    let stage = analyzer.stage();
                    match tokio::time::timeout(timeout, analyzer.analyze(&content, &requirements)).await {
                        Ok(Ok(result)) => Ok(result),
                        Ok(Err(e)) => Err(PipelineError::StageDegraded {
                            stage,
                            reason: format!("{:#}", e),
                        }),
                        Err(_) => Err(PipelineError::StageDegraded {
                            stage,
                            reason: format!("timed out after {:?}", timeout),
                        }),
                    }
                })
            })
            .collect();
        let aborts: Vec<AbortHandle> = handles.iter().map(|h| h.abort_handle()).collect();

        let joined = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                for abort in &aborts {
                    abort.abort();
                }
                warn!("Run cancelled, aborted {} analyzer task(s)", aborts.len());
                return Err(PipelineError::Cancelled);
            }
            joined = join_all(handles) => joined,
        };

        let results: Vec<AnalyzerResult> = stages
            .into_iter()
            .zip(joined)
            .map(|(stage, outcome)| match outcome {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => {
                    warn!("{}", e);
                    let reason = match e {
                        PipelineError::StageDegraded { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    AnalyzerResult::degraded(stage, &reason)
                }
                Err(join_error) => {
                    let reason = if join_error.is_panic() {
                        "analyzer panicked".to_string()
                    } else {
                        join_error.to_string()
                    };
                    warn!("Stage {} degraded: {}", stage, reason);
                    AnalyzerResult::degraded(stage, &reason)
                }
            })
            .collect();

        if results.iter().all(|r| r.degraded) {
            return Err(PipelineError::Internal(format!(
                "every analyzer stage failed on revision {}",
                candidate.revision
            )));
        }
        Ok(results)
    }
}
