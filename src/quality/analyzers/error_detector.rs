/*!
 * Error detection stage.
 *
 * Thin analyzer over `ErrorDetectionCorrection::detect`; the same type is
 * used as a corrector during refinement.
 */

use async_trait::async_trait;

use crate::quality::error_detection::ErrorDetectionCorrection;
use crate::quality::model::{AnalyzerResult, ContentCandidate, IssueKind, Requirements, Stage};

use super::Analyzer;

/// Analyzer for mechanical grammar, citation and link errors.
#[derive(Debug, Clone, Default)]
pub struct ErrorDetector {
    detector: ErrorDetectionCorrection,
}

impl ErrorDetector {
    pub fn new() -> Self {
        Self {
            detector: ErrorDetectionCorrection::new(),
        }
    }

    /// Run detection synchronously.
    pub fn evaluate(&self, content: &str) -> AnalyzerResult {
        let issues = self.detector.detect(content);
        let score = AnalyzerResult::penalized_score(&issues);

        let mut recommendations = Vec::new();
        let grammar = issues.iter().filter(|i| i.kind == IssueKind::Grammar).count();
        if grammar > 0 {
            recommendations.push(format!("Proofread the text: {} grammar issue(s) detected", grammar));
        }
        if issues.iter().any(|i| i.kind == IssueKind::Citation) {
            recommendations.push("Replace placeholder citations with real references".to_string());
        }

        AnalyzerResult::new(Stage::ErrorDetection, score, issues, recommendations)
    }
}

#[async_trait]
impl Analyzer for ErrorDetector {
    fn stage(&self) -> Stage {
        Stage::ErrorDetection
    }

    async fn analyze(
        &self,
        content: &ContentCandidate,
        _requirements: &Requirements,
    ) -> anyhow::Result<AnalyzerResult> {
        Ok(self.evaluate(&content.text))
    }
}
