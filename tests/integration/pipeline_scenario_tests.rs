/*!
 * End-to-end pipeline scenarios.
 *
 * Each test drives the full analyze, score, approve and refine loop with
 * mock analyzers so the outcome of every round is known in advance.
 */

use std::sync::Arc;
use std::time::Duration;

use contentqa::errors::PipelineError;
use contentqa::pipeline::{QualityPipeline, RunOptions, Termination};
use contentqa::quality::{
    Analyzer, AnalyzerResult, ApprovalOutcome, Issue, IssueKind, RefinementEngine, Severity, Stage,
};

use crate::common::{garden_requirements, init_test_logging};
use crate::common::mock_analyzers::{
    ContentAwareAnalyzer, FailingAnalyzer, PanickingAnalyzer, SlowAnalyzer, uniform_analyzers, uniform_analyzers_with,
};

const CITED_DRAFT: &str = "Pruning roses in March keeps shrubs healthy [1]. Rose care starts with clean shears.";

/// Every stage scores 60 while the orphaned marker is present and 90 once it is gone;
/// the sources stage also reports the marker as a high-severity citation issue.
fn citation_sensitive_analyzers() -> Vec<Arc<dyn Analyzer>> {
    Stage::ALL
        .iter()
        .map(|stage| {
            let stage = *stage;
            Arc::new(ContentAwareAnalyzer::new(stage, move |text| {
                if !text.contains("[1]") {
                    return AnalyzerResult::new(stage, 90.0, Vec::new(), Vec::new());
                }
                let issues = if stage == Stage::Sources {
                    vec![
                        Issue::new(stage, IssueKind::Citation, Severity::High, "Citation [1] has no reference entry")
                            .with_target("[1]"),
                    ]
                } else {
                    Vec::new()
                };
                AnalyzerResult::new(stage, 60.0, issues, Vec::new())
            })) as Arc<dyn Analyzer>
        })
        .collect()
}

#[tokio::test]
async fn test_scenarioA_emptyContent_shouldBeValidationError() {
    let pipeline = QualityPipeline::new(uniform_analyzers(95.0));

    let result = pipeline.run("", &garden_requirements(), &RunOptions::default()).await;

    assert!(matches!(result, Err(PipelineError::Validation(_))));
}

#[tokio::test]
async fn test_scenarioA_whitespaceContentOrMissingKeywords_shouldBeValidationError() {
    let pipeline = QualityPipeline::new(uniform_analyzers(95.0));

    let blank = pipeline.run("  \n\t ", &garden_requirements(), &RunOptions::default()).await;
    assert!(matches!(blank, Err(PipelineError::Validation(_))));

    let mut requirements = garden_requirements();
    requirements.keywords.clear();
    let no_keywords = pipeline.run("Some text.", &requirements, &RunOptions::default()).await;
    assert!(matches!(no_keywords, Err(PipelineError::Validation(_))));
}

#[tokio::test]
async fn test_scenarioB_highScore_shouldApproveInSingleRound() {
    let pipeline = QualityPipeline::new(uniform_analyzers(96.0));

    let report = pipeline
        .run("Pruning roses made simple.", &garden_requirements(), &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(report.total_iterations, 1);
    assert_eq!(report.decision_history.len(), 1);
    assert_eq!(report.decision_history[0].outcome, ApprovalOutcome::Approved);
    assert_eq!(report.termination, Termination::Approved);
    assert_eq!(report.final_content, report.original_content);
}

#[tokio::test]
async fn test_scenarioC_highCitationIssue_shouldRefineAndChangeScore() {
    init_test_logging();
    let pipeline = QualityPipeline::new(citation_sensitive_analyzers());

    let report = pipeline
        .run(CITED_DRAFT, &garden_requirements(), &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(report.decision_history.len(), 2);
    let first = &report.decision_history[0];
    let second = &report.decision_history[1];
    assert_eq!(first.outcome, ApprovalOutcome::NeedsRefinement);
    assert!((first.report.overall_score - 60.0).abs() < 1e-9);
    assert_ne!(first.report.overall_score, second.report.overall_score);
    assert_eq!(second.outcome, ApprovalOutcome::Approved);
    assert_eq!(second.report.revision, 1);
    assert!(!report.final_content.contains("[1]"));
    assert_eq!(report.termination, Termination::Approved);
}

#[tokio::test]
async fn test_scenarioC_noCitationCorrector_shouldEndWithRefinementFailed() {
    let mut engine = RefinementEngine::with_default_correctors(42);
    engine.remove(IssueKind::Citation);
    let pipeline = QualityPipeline::new(citation_sensitive_analyzers()).with_refinement(engine);

    let report = pipeline
        .run(CITED_DRAFT, &garden_requirements(), &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(report.decision_history.len(), 1);
    assert_eq!(report.final_content, CITED_DRAFT);
    match &report.termination {
        Termination::RefinementFailed { message } => assert!(message.contains("no corrector")),
        other => panic!("unexpected termination: {:?}", other),
    }
}

#[tokio::test]
async fn test_scenarioD_singleIterationBelowFloor_shouldReject() {
    let pipeline = QualityPipeline::new(uniform_analyzers(50.0));
    let options = RunOptions::default().with_max_refinement_iterations(1);

    let report = pipeline.run("Thin draft.", &garden_requirements(), &options).await.unwrap();

    assert_eq!(report.total_iterations, 1);
    assert_eq!(report.decision_history[0].outcome, ApprovalOutcome::Rejected);
    assert_eq!(report.termination, Termination::Rejected);
}

#[tokio::test]
async fn test_scenarioD_singleIterationAboveFloor_shouldStopAtLimit() {
    let pipeline = QualityPipeline::new(uniform_analyzers(70.0));
    let options = RunOptions::default().with_max_refinement_iterations(1);

    let report = pipeline.run("Average draft.", &garden_requirements(), &options).await.unwrap();

    assert_eq!(report.total_iterations, 1);
    assert_eq!(report.decision_history[0].outcome, ApprovalOutcome::NeedsRefinement);
    assert_eq!(report.termination, Termination::IterationLimit);
}

#[tokio::test]
async fn test_scenarioE_stageTimeout_shouldDegradeStageAndStillReport() {
    init_test_logging();
    let slow = Arc::new(SlowAnalyzer::new(Stage::Variation, Duration::from_secs(5), 95.0));
    let pipeline = QualityPipeline::new(uniform_analyzers_with(95.0, Stage::Variation, slow))
        .with_stage_timeout(Duration::from_millis(100));

    let report = pipeline
        .run("Pruning roses for beginners.", &garden_requirements(), &RunOptions::default())
        .await
        .unwrap();

    let decision = &report.decision_history[0];
    assert_eq!(decision.report.sub_scores[&Stage::Variation], 0.0);
    assert_eq!(decision.report.degraded_stages, vec![Stage::Variation]);
    assert!(
        decision
            .report
            .issues
            .iter()
            .any(|i| i.stage == Stage::Variation && i.message.contains("timed out"))
    );
    // The degraded issue has nothing a corrector can act on
    assert_eq!(report.termination, Termination::NoProgress);
}

#[tokio::test]
async fn test_scenarioE_everyStageTimesOut_shouldBeInternalError() {
    let analyzers: Vec<Arc<dyn Analyzer>> = Stage::ALL
        .iter()
        .map(|stage| Arc::new(SlowAnalyzer::new(*stage, Duration::from_secs(5), 95.0)) as Arc<dyn Analyzer>)
        .collect();
    let pipeline = QualityPipeline::new(analyzers).with_stage_timeout(Duration::from_millis(50));

    let result = pipeline.run("Any text.", &garden_requirements(), &RunOptions::default()).await;

    assert!(matches!(result, Err(PipelineError::Internal(_))));
}

#[tokio::test]
async fn test_run_failingAndPanickingStages_shouldDegradeIndependently() {
    init_test_logging();
    let mut analyzers = uniform_analyzers(95.0);
    analyzers[0] = Arc::new(FailingAnalyzer::new(Stage::Intent, "classifier offline"));
    analyzers[5] = Arc::new(PanickingAnalyzer::new(Stage::ErrorDetection));
    let pipeline = QualityPipeline::new(analyzers);
    let options = RunOptions::default().with_max_refinement_iterations(1);

    let report = pipeline.run("Rose care notes.", &garden_requirements(), &options).await.unwrap();

    let round = &report.decision_history[0].report;
    assert_eq!(round.degraded_stages, vec![Stage::Intent, Stage::ErrorDetection]);
    assert!(round.issues.iter().any(|i| i.message.contains("classifier offline")));
    assert!(round.issues.iter().any(|i| i.message.contains("analyzer panicked")));
    assert_eq!(round.sub_scores[&Stage::Eeat], 95.0);
}
