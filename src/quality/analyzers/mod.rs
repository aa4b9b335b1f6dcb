/*!
 * Analyzer stages for content quality assessment.
 *
 * Every stage implements the `Analyzer` trait and is a pure function of
 * `(content, requirements)`. Scoring rules are private to each stage and
 * can be swapped (for example by a model-backed analyzer) without touching
 * the pipeline:
 * - **Intent**: search intent, keyword coverage, tone and audience fit
 * - **E-E-A-T**: experience, expertise, authoritativeness, trust signals
 * - **Sources**: citation markers, URL validity, domain credibility
 * - **Link placement**: density, anchors and position of links
 * - **Variation**: repetition and monotony of the prose
 * - **Error detection**: mechanical grammar, citation and link errors
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

use crate::app_config::Config;

use super::model::{AnalyzerResult, ContentCandidate, Requirements, Stage};

pub mod eeat;
pub mod error_detector;
pub mod intent;
pub mod links;
pub mod sources;
pub mod variation;

pub use eeat::EeatOptimizer;
pub use error_detector::ErrorDetector;
pub use intent::{IntentAnalyzer, SearchIntent};
pub use links::LinkPlacer;
pub use sources::{HttpSourceProbe, SourceProbe, SourceValidator};
pub use variation::VariationDetector;

/// Common trait for all analyzer stages
///
/// Implementations must not mutate shared state; the orchestrator runs
/// them concurrently on the same candidate.
#[async_trait]
pub trait Analyzer: Send + Sync + Debug {
    /// The stage this analyzer reports as
    fn stage(&self) -> Stage;

    /// Analyze one content revision
    ///
    /// # Arguments
    /// * `content` - The candidate under evaluation
    /// * `requirements` - Caller requirements for the run
    ///
    /// # Returns
    /// * `anyhow::Result<AnalyzerResult>` - The stage result, or an error that
    ///   the orchestrator records as a degraded stage
    async fn analyze(
        &self,
        content: &ContentCandidate,
        requirements: &Requirements,
    ) -> anyhow::Result<AnalyzerResult>;
}

/// Build the six standard analyzers from configuration.
pub fn default_analyzers(config: &Config) -> anyhow::Result<Vec<Arc<dyn Analyzer>>> {
    let mut sources = SourceValidator::new(config.sources.stale_after_years);
    if config.sources.check_reachability {
        let probe = HttpSourceProbe::new(config.sources.probe_timeout_secs)?;
        sources = sources.with_probe(Arc::new(probe));
    }

    Ok(vec![
        Arc::new(IntentAnalyzer::new()),
        Arc::new(EeatOptimizer::new()),
        Arc::new(sources),
        Arc::new(LinkPlacer::new()),
        Arc::new(VariationDetector::new()),
        Arc::new(ErrorDetector::new()),
    ])
}
