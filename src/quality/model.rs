/*!
 * Core data model shared by every pipeline stage.
 *
 * Content candidates, caller requirements, issues and per-stage results.
 * Stage names, issue kinds and severities are closed enums so that every
 * match over them is checked for exhaustiveness.
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::PipelineError;

/// One revision of the content under evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentCandidate {
    /// Full text of this revision
    pub text: String,

    /// Revision number, 0 for the caller's original
    pub revision: u32,
}

impl ContentCandidate {
    /// Create the original (revision 0) candidate.
    pub fn original(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            revision: 0,
        }
    }

    /// Produce the next revision with new text.
    pub fn next(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            revision: self.revision + 1,
        }
    }
}

/// Caller requirements the content is evaluated against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirements {
    /// Who the content is written for
    #[serde(default)]
    pub target_audience: String,

    /// Expected tone (e.g. "professional", "friendly")
    #[serde(default)]
    pub tone: String,

    /// Target keywords, primary keyword first
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Requirements {
    /// Create a new requirements record.
    pub fn new(target_audience: &str, tone: &str, keywords: &[&str]) -> Self {
        Self {
            target_audience: target_audience.to_string(),
            tone: tone.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Check that every required field is present.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.target_audience.trim().is_empty() {
            return Err(PipelineError::Validation(
                "requirements.targetAudience is required".to_string(),
            ));
        }
        if self.tone.trim().is_empty() {
            return Err(PipelineError::Validation("requirements.tone is required".to_string()));
        }
        if self.keywords.is_empty() {
            return Err(PipelineError::Validation(
                "requirements.keywords must contain at least one keyword".to_string(),
            ));
        }
        if self.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(PipelineError::Validation(
                "requirements.keywords must not contain blank entries".to_string(),
            ));
        }
        Ok(())
    }

    /// The first keyword, treated as the primary target.
    pub fn primary_keyword(&self) -> &str {
        self.keywords.first().map(String::as_str).unwrap_or_default()
    }
}

/// Pipeline stages, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Intent,
    Eeat,
    Sources,
    LinkPlacement,
    Variation,
    ErrorDetection,
}

impl Stage {
    /// All stages in reporting order.
    pub const ALL: [Stage; 6] = [
        Stage::Intent,
        Stage::Eeat,
        Stage::Sources,
        Stage::LinkPlacement,
        Stage::Variation,
        Stage::ErrorDetection,
    ];

    /// Stable stage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Intent => "intent",
            Stage::Eeat => "eeat",
            Stage::Sources => "sources",
            Stage::LinkPlacement => "link_placement",
            Stage::Variation => "variation",
            Stage::ErrorDetection => "error_detection",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Category of a quality issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Citation,
    Eeat,
    Grammar,
    LinkPlacement,
    Variation,
    Other,
}

impl IssueKind {
    /// All issue kinds.
    pub const ALL: [IssueKind; 6] = [
        IssueKind::Citation,
        IssueKind::Eeat,
        IssueKind::Grammar,
        IssueKind::LinkPlacement,
        IssueKind::Variation,
        IssueKind::Other,
    ];

    /// Stable kind name.
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::Citation => "citation",
            IssueKind::Eeat => "eeat",
            IssueKind::Grammar => "grammar",
            IssueKind::LinkPlacement => "link_placement",
            IssueKind::Variation => "variation",
            IssueKind::Other => "other",
        }
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Issue severity, ordered low to high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Score penalty applied by stages that subtract per issue.
    pub fn penalty(&self) -> f64 {
        match self {
            Severity::Low => 3.0,
            Severity::Medium => 8.0,
            Severity::High => 20.0,
        }
    }
}

/// A single quality issue found by a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue category
    pub kind: IssueKind,

    /// How serious the issue is
    pub severity: Severity,

    /// Human-readable description
    pub message: String,

    /// Stage that raised the issue
    pub stage: Stage,

    /// Concrete token the issue refers to (keyword, word, marker, URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl Issue {
    /// Create a new issue.
    pub fn new(stage: Stage, kind: IssueKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
            stage,
            target: None,
        }
    }

    /// Attach the token this issue refers to.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn is_high(&self) -> bool {
        self.severity == Severity::High
    }
}

/// Output of one analyzer invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerResult {
    /// Stage that produced the result
    pub stage: Stage,

    /// Stage score (0.0 - 100.0)
    pub score: f64,

    /// Issues found
    pub issues: Vec<Issue>,

    /// Suggestions that do not block approval
    pub recommendations: Vec<String>,

    /// Whether the analyzer failed and this result was synthesized
    #[serde(default)]
    pub degraded: bool,
}

impl AnalyzerResult {
    /// Create a result, clamping the score into range.
    pub fn new(stage: Stage, score: f64, issues: Vec<Issue>, recommendations: Vec<String>) -> Self {
        let score = if score.is_finite() { score.clamp(0.0, 100.0) } else { 0.0 };
        Self {
            stage,
            score,
            issues,
            recommendations,
            degraded: false,
        }
    }

    /// Synthesize the result recorded for a stage that failed or timed out.
    pub fn degraded(stage: Stage, reason: &str) -> Self {
        let issue = Issue::new(
            stage,
            IssueKind::Other,
            Severity::High,
            format!("{} stage degraded: {}", stage, reason),
        );
        Self {
            stage,
            score: 0.0,
            issues: vec![issue],
            recommendations: Vec::new(),
            degraded: true,
        }
    }

    /// Score that starts at 100 and subtracts the severity penalty of every issue.
    pub fn penalized_score(issues: &[Issue]) -> f64 {
        let penalty: f64 = issues.iter().map(|i| i.severity.penalty()).sum();
        (100.0 - penalty).max(0.0)
    }
}

/// Aggregated view of one analysis round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    /// Revision of the candidate that was analyzed
    pub revision: u32,

    /// Weighted overall score (0.0 - 100.0)
    pub overall_score: f64,

    /// Score of every stage that ran, degraded stages included
    pub sub_scores: BTreeMap<Stage, f64>,

    /// Issues of all stages, in stage order
    pub issues: Vec<Issue>,

    /// De-duplicated recommendations of all stages
    pub recommendations: Vec<String>,

    /// Stages whose result was synthesized after a failure
    #[serde(default)]
    pub degraded_stages: Vec<Stage>,
}

impl QualityReport {
    /// Issues at or above a severity.
    pub fn issues_at_least(&self, severity: Severity) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.severity >= severity)
    }

    /// Whether any issue of the given kind was found.
    pub fn has_kind(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|i| i.kind == kind)
    }
}
