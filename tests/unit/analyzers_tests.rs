/*!
 * Tests for the standard analyzer stages through the `Analyzer` trait
 */

use std::collections::BTreeSet;

use contentqa::app_config::Config;
use contentqa::quality::analyzers::{EeatOptimizer, SourceValidator, default_analyzers};
use contentqa::quality::{ContentCandidate, Severity, Stage};

use crate::common::{garden_requirements, sample_article};

#[tokio::test]
async fn test_defaultAnalyzers_sampleArticle_shouldReportEveryStageInRange() {
    let analyzers = default_analyzers(&Config::default()).unwrap();
    let content = ContentCandidate::original(sample_article());
    let requirements = garden_requirements();

    let mut stages = BTreeSet::new();
    for analyzer in &analyzers {
        let result = analyzer.analyze(&content, &requirements).await.unwrap();
        assert_eq!(result.stage, analyzer.stage());
        assert!((0.0..=100.0).contains(&result.score));
        assert!(!result.degraded);
        assert!(result.issues.iter().all(|i| i.stage == result.stage));
        stages.insert(result.stage);
    }

    assert_eq!(stages.len(), Stage::ALL.len());
}

#[test]
fn test_sourceValidator_sampleArticle_shouldFindNoOrphanedCitations() {
    let validator = SourceValidator::new(5).with_reference_year(2025);

    let (result, probe_targets) = validator.evaluate(sample_article());

    assert!(result.issues.iter().all(|i| i.severity != Severity::High), "{:?}", result.issues);
    assert!(probe_targets.iter().any(|url| url.contains("rhs.org.uk")));
}

#[test]
fn test_eeatOptimizer_sampleArticleBeatsThinDraft() {
    let optimizer = EeatOptimizer::new();

    let rich = optimizer.breakdown(sample_article()).total();
    let thin = optimizer.breakdown("Roses are nice. This method is guaranteed to work.").total();

    assert!(rich > thin);
    assert_eq!(
        optimizer.absolute_claims("This method is guaranteed to work."),
        vec!["guaranteed"]
    );
}
