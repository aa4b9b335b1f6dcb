/*!
 * Loop-level properties of the quality pipeline.
 *
 * History bounds, monotonic termination, determinism, forced refinement
 * and cancellation, checked against both mock and real analyzers.
 */

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use contentqa::app_config::Config;
use contentqa::errors::PipelineError;
use contentqa::pipeline::{QualityPipeline, RunOptions, Termination};
use contentqa::quality::{Analyzer, ApprovalCriteria, ApprovalOutcome, Requirements, Stage};

use crate::common::{garden_requirements, sample_article};
use crate::common::mock_analyzers::{ScriptedAnalyzer, SlowAnalyzer, uniform_analyzers};

const DRAFTS: &[&str] = &[
    "Roses need pruning. Roses need water. Roses need sun. Roses need care.",
    "Pruning roses is easy, you should do it. Check out [this article](http://example.com) for more.",
    "Rose care through the seasons. In my experience, pruning roses in late winter [1] works best.",
];

fn real_pipeline() -> QualityPipeline {
    QualityPipeline::from_config(&Config::default()).unwrap()
}

#[tokio::test]
async fn test_run_realAnalyzers_historyShouldNeverExceedBudget() {
    let pipeline = real_pipeline();
    let mut drafts = DRAFTS.to_vec();
    drafts.push(sample_article());

    for draft in drafts {
        for max in 1..=3 {
            let options = RunOptions::default().with_max_refinement_iterations(max);
            let report = pipeline.run(draft, &garden_requirements(), &options).await.unwrap();

            assert!(report.decision_history.len() as u32 <= max);
            assert_eq!(report.decision_history.len() as u32, report.total_iterations);
            for (index, decision) in report.decision_history.iter().enumerate() {
                assert_eq!(decision.report.revision, index as u32);
                assert!((0.0..=100.0).contains(&decision.report.overall_score));
                assert!(decision.report.sub_scores.values().all(|s| (0.0..=100.0).contains(s)));
                assert_eq!(decision.report.sub_scores.len(), Stage::ALL.len());
            }
        }
    }
}

#[tokio::test]
async fn test_run_realAnalyzers_approvalShouldEndHistory() {
    let pipeline = real_pipeline();

    for draft in DRAFTS {
        let report = pipeline.run(draft, &garden_requirements(), &RunOptions::default()).await.unwrap();

        let approved_at = report.decision_history.iter().position(|d| d.is_approved());
        if let Some(index) = approved_at {
            assert_eq!(index, report.decision_history.len() - 1);
            assert_eq!(report.termination, Termination::Approved);
        }
        assert!(
            report.decision_history[..report.decision_history.len() - 1]
                .iter()
                .all(|d| d.outcome == ApprovalOutcome::NeedsRefinement)
        );
    }
}

#[tokio::test]
async fn test_run_sameInput_shouldProduceIdenticalDecisions() {
    let first = real_pipeline();
    let second = real_pipeline();

    for draft in DRAFTS {
        let a = first.run(draft, &garden_requirements(), &RunOptions::default()).await.unwrap();
        let b = second.run(draft, &garden_requirements(), &RunOptions::default()).await.unwrap();

        assert_eq!(a.decision_history, b.decision_history);
        assert_eq!(a.final_content, b.final_content);
        assert_eq!(a.termination, b.termination);
        assert_ne!(a.run_id, b.run_id);
    }
}

#[tokio::test]
async fn test_run_symbolEndingKeyword_shouldCountPresentKeyword() {
    let pipeline = real_pipeline();
    let requirements = Requirements::new("developers", "neutral", &["C++"]);
    let draft = "C++ templates explained. Modern C++ code uses templates heavily.";

    let report = pipeline.run(draft, &requirements, &RunOptions::default()).await.unwrap();

    for decision in &report.decision_history {
        assert!(
            decision.report.issues.iter().all(|i| !i.message.contains("does not appear")),
            "{:?}",
            decision.report.issues
        );
    }
    assert!(!report.final_content.contains("This article covers C++"));
}

#[tokio::test]
async fn test_run_forceRefinement_shouldRefineApprovedContentOnce() {
    let pipeline = QualityPipeline::new(uniform_analyzers(96.0));
    let options = RunOptions::default().with_force_refinement(true);

    let report = pipeline.run("Pruning roses, done right.", &garden_requirements(), &options).await.unwrap();

    assert_eq!(report.total_iterations, 2);
    assert!(report.decision_history.iter().all(|d| d.is_approved()));
    assert_eq!(report.decision_history[1].report.revision, 1);
    assert_eq!(report.termination, Termination::Approved);
}

#[tokio::test]
async fn test_run_forceRefinementWithoutBudget_shouldStopAfterFirstRound() {
    let pipeline = QualityPipeline::new(uniform_analyzers(96.0));
    let options = RunOptions::default()
        .with_force_refinement(true)
        .with_max_refinement_iterations(1);

    let report = pipeline.run("Pruning roses, done right.", &garden_requirements(), &options).await.unwrap();

    assert_eq!(report.total_iterations, 1);
    assert_eq!(report.termination, Termination::Approved);
}

#[tokio::test]
async fn test_run_unchangedRevision_shouldStopWithNoProgress() {
    let scripted = ScriptedAnalyzer::new(Stage::Eeat, 70.0);
    let calls = scripted.calls();
    let pipeline = QualityPipeline::new(vec![Arc::new(scripted) as Arc<dyn Analyzer>]);

    let report = pipeline.run("Nothing to fix here.", &garden_requirements(), &RunOptions::default()).await.unwrap();

    assert_eq!(report.total_iterations, 1);
    assert_eq!(report.termination, Termination::NoProgress);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_run_requestCriteria_shouldOverrideDefaults() {
    let pipeline = QualityPipeline::new(uniform_analyzers(70.0));
    let criteria = ApprovalCriteria {
        minimum_overall_score: 65.0,
        ..ApprovalCriteria::default()
    };
    let options = RunOptions::default().with_approval_criteria(criteria);

    let report = pipeline.run("Rose care basics.", &garden_requirements(), &options).await.unwrap();

    assert_eq!(report.termination, Termination::Approved);
    assert_eq!(report.total_iterations, 1);
}

#[tokio::test]
async fn test_run_invalidCriteria_shouldBeValidationError() {
    let pipeline = QualityPipeline::new(uniform_analyzers(70.0));
    let criteria = ApprovalCriteria {
        minimum_overall_score: 140.0,
        ..ApprovalCriteria::default()
    };
    let options = RunOptions::default().with_approval_criteria(criteria);

    let result = pipeline.run("Rose care basics.", &garden_requirements(), &options).await;

    assert!(matches!(result, Err(PipelineError::Validation(_))));
}

#[tokio::test]
async fn test_runWithCancellation_cancelledMidRound_shouldAbortAndReturnCancelled() {
    let analyzers: Vec<Arc<dyn Analyzer>> = Stage::ALL
        .iter()
        .map(|stage| Arc::new(SlowAnalyzer::new(*stage, Duration::from_secs(30), 95.0)) as Arc<dyn Analyzer>)
        .collect();
    let pipeline = QualityPipeline::new(analyzers).with_stage_timeout(Duration::from_secs(60));
    let token = CancellationToken::new();

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let started = std::time::Instant::now();
    let result = pipeline
        .run_with_cancellation("Rose care basics.", &garden_requirements(), &RunOptions::default(), token)
        .await;

    assert!(matches!(result, Err(PipelineError::Cancelled)));
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_runWithCancellation_alreadyCancelled_shouldNotAnalyze() {
    let scripted = ScriptedAnalyzer::new(Stage::Intent, 95.0);
    let calls = scripted.calls();
    let pipeline = QualityPipeline::new(vec![Arc::new(scripted) as Arc<dyn Analyzer>]);
    let token = CancellationToken::new();
    token.cancel();

    let result = pipeline
        .run_with_cancellation("Rose care basics.", &garden_requirements(), &RunOptions::default(), token)
        .await;

    assert!(matches!(result, Err(PipelineError::Cancelled)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
