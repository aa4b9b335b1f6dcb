/*!
 * Tests for scoring, approval and refinement through the public API
 */

use std::collections::BTreeMap;

use contentqa::quality::analyzers::{ErrorDetector, SourceValidator, VariationDetector};
use contentqa::quality::{
    AnalyzerResult, ApprovalCriteria, ApprovalOutcome, ApprovalSystem, ContentCandidate, Issue, IssueKind,
    RefinementEngine, Scorer, SeededSynonymStrategy, Severity, Stage, StageWeights, SynonymStrategy,
};

use crate::common::garden_requirements;

fn results(score: f64) -> Vec<AnalyzerResult> {
    Stage::ALL
        .iter()
        .map(|stage| AnalyzerResult::new(*stage, score, Vec::new(), Vec::new()))
        .collect()
}

#[test]
fn test_scorerAndApproval_passingRound_shouldApprove() {
    let report = Scorer::default().aggregate(0, &results(85.0));
    let decision = ApprovalSystem::new().decide(&report, &ApprovalCriteria::default(), 2);

    assert_eq!(decision.outcome, ApprovalOutcome::Approved);
    assert!(decision.rationale[0].contains("all approval criteria met"));
}

#[test]
fn test_approval_perStageMinimum_shouldBlockApproval() {
    let mut round = results(90.0);
    round[1] = AnalyzerResult::new(Stage::Eeat, 55.0, Vec::new(), Vec::new());
    let report = Scorer::default().aggregate(0, &round);
    let mut minimums = BTreeMap::new();
    minimums.insert(Stage::Eeat, 70.0);
    let criteria = ApprovalCriteria {
        per_stage_minimums: minimums,
        minimum_overall_score: 70.0,
        ..ApprovalCriteria::default()
    };

    let decision = ApprovalSystem::new().decide(&report, &criteria, 1);

    assert_eq!(decision.outcome, ApprovalOutcome::NeedsRefinement);
    assert!(decision.rationale.iter().any(|r| r.contains("stage eeat score 55.0")));
}

#[test]
fn test_approval_highLinkIssue_shouldNotCountTowardLimit() {
    let mut round = results(90.0);
    round[3] = AnalyzerResult::new(
        Stage::LinkPlacement,
        80.0,
        vec![Issue::new(Stage::LinkPlacement, IssueKind::LinkPlacement, Severity::High, "link farm")],
        Vec::new(),
    );
    let report = Scorer::default().aggregate(0, &round);

    let decision = ApprovalSystem::new().decide(&report, &ApprovalCriteria::default(), 0);

    assert_eq!(decision.outcome, ApprovalOutcome::Approved);
}

#[test]
fn test_scorer_customWeights_shouldShiftOverall() {
    let weights = StageWeights {
        intent: 0.0,
        eeat: 1.0,
        sources: 0.0,
        link_placement: 0.0,
        variation: 0.0,
        error_detection: 0.0,
    };
    let scorer = Scorer::new(weights).unwrap();
    let mut round = results(20.0);
    round[1] = AnalyzerResult::new(Stage::Eeat, 90.0, Vec::new(), Vec::new());

    let report = scorer.aggregate(0, &round);

    assert!((report.overall_score - 90.0).abs() < 1e-9);
}

#[test]
fn test_refinement_grammarIssues_shouldClearErrorDetection() {
    let detector = ErrorDetector::new();
    let content = ContentCandidate::original("we recieve  a apple ,then the the rest.");
    let before = detector.evaluate(&content.text);
    assert!(before.score < 100.0);

    let report = Scorer::default().aggregate(0, &[before]);
    let refined = RefinementEngine::with_default_correctors(42)
        .refine(&content, &report, &garden_requirements())
        .unwrap();
    let after = detector.evaluate(&refined.text);

    assert_eq!(refined.revision, 1);
    assert_eq!(after.score, 100.0);
    assert!(after.issues.is_empty());
}

#[test]
fn test_refinement_repeatedStarters_shouldImproveVariation() {
    let detector = VariationDetector::new();
    let requirements = garden_requirements();
    let content = ContentCandidate::original(
        "Roses like sun. Roses like water. Roses like mulch. Roses like space to breathe.",
    );
    let before = detector.evaluate(&content.text, &requirements);
    assert!(before.issues.iter().any(|i| i.target.as_deref() == Some("roses")));

    let report = Scorer::default().aggregate(0, &[before.clone()]);
    let refined = RefinementEngine::with_default_correctors(42)
        .refine(&content, &report, &requirements)
        .unwrap();
    let again = RefinementEngine::with_default_correctors(42)
        .refine(&content, &report, &requirements)
        .unwrap();

    assert_ne!(refined.text, content.text);
    assert_eq!(refined.text, again.text);
}

#[test]
fn test_seededSynonymStrategy_sameInputs_shouldChooseSameCandidate() {
    let candidates = ["key", "vital", "crucial"];
    let first = SeededSynonymStrategy::new(7).choose("important", &candidates, 1, "source text");
    let second = SeededSynonymStrategy::new(7).choose("important", &candidates, 1, "source text");

    assert_eq!(first, second);
    assert!(candidates.contains(&first));
}

#[test]
fn test_refinement_mistypedSourceScheme_shouldKeepTheSource() {
    let draft = "Read the [RHS pruning guide](http//www.rhs.org.uk/pruning) before you start.";
    let validator = SourceValidator::new(5).with_reference_year(2025);
    let (sources, _) = validator.evaluate(draft);
    let report = Scorer::default().aggregate(0, &[sources, ErrorDetector::new().evaluate(draft)]);

    let refined = RefinementEngine::with_default_correctors(42)
        .refine(&ContentCandidate::original(draft), &report, &garden_requirements())
        .unwrap();

    assert!(refined.text.contains("[RHS pruning guide](http://www.rhs.org.uk/pruning)"), "{}", refined.text);
    let (after, probe_targets) = validator.evaluate(&refined.text);
    assert!(after.issues.iter().all(|i| i.severity != Severity::Medium), "{:?}", after.issues);
    assert_eq!(probe_targets, vec!["http://www.rhs.org.uk/pruning".to_string()]);
}
