/*!
 * Content quality assessment.
 *
 * - `model`: candidates, requirements, issues and reports
 * - `analyzers`: the six analysis stages
 * - `scorer`: weighted aggregation into a `QualityReport`
 * - `approval`: thresholds and the approval decision
 * - `refinement`: issue-driven correction of content
 * - `error_detection`: mechanical error detector and corrector
 */

pub mod analyzers;
pub mod approval;
pub mod error_detection;
pub mod model;
pub mod refinement;
pub mod scorer;
pub mod text;

pub use analyzers::{Analyzer, default_analyzers};
pub use approval::{ApprovalCriteria, ApprovalDecision, ApprovalOutcome, ApprovalSystem};
pub use error_detection::ErrorDetectionCorrection;
pub use model::{
    AnalyzerResult, ContentCandidate, Issue, IssueKind, QualityReport, Requirements, Severity, Stage,
};
pub use refinement::{Corrector, RefinementEngine, SeededSynonymStrategy, SynonymStrategy};
pub use scorer::{Scorer, StageWeights};
