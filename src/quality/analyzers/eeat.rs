/*!
 * E-E-A-T scoring.
 *
 * Scores four dimensions, each out of 25, from textual signals:
 * - Experience: first-hand accounts ("we tested", "in my experience")
 * - Expertise: concrete figures and technical vocabulary
 * - Authoritativeness: links and attributed research
 * - Trustworthiness: dates, disclosures, absence of absolute claims
 */

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::quality::model::{
    AnalyzerResult, ContentCandidate, Issue, IssueKind, Requirements, Severity, Stage,
};
use crate::quality::text;

use super::Analyzer;

static FIGURE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b\d+(?:\.\d+)?\s?(?:%|percent\b|mg\b|kg\b|ms\b|years?\b|hours?\b|minutes?\b|days?\b|weeks?\b|months?\b)",
    )
    .unwrap()
});
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());

const EXPERIENCE_MARKERS: &[&str] = &[
    "in my experience", "i tested", "we tested", "i tried", "we tried", "i've", "we've", "our team",
    "hands-on", "first-hand", "firsthand", "when i", "when we",
];
const ATTRIBUTION_MARKERS: &[&str] = &[
    "according to", "study", "research", "published", "survey", "data from", "report",
];
const DISCLOSURE_MARKERS: &[&str] = &["disclaimer", "disclosure", "sources", "references", "methodology", "updated"];

/// Claims that overpromise and erode trust.
pub const ABSOLUTE_CLAIMS: &[&str] = &[
    "guaranteed", "guarantee", "always works", "never fails", "miracle", "risk-free", "instantly", "100%",
];

/// Per-dimension score below which an issue is raised.
const WEAK_DIMENSION: f64 = 8.0;

/// Total score below which content is flagged as lacking E-E-A-T.
const WEAK_TOTAL: f64 = 40.0;

/// Breakdown of the four E-E-A-T dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EeatBreakdown {
    pub experience: f64,
    pub expertise: f64,
    pub authoritativeness: f64,
    pub trustworthiness: f64,
}

impl EeatBreakdown {
    pub fn total(&self) -> f64 {
        self.experience + self.expertise + self.authoritativeness + self.trustworthiness
    }

    fn dimensions(&self) -> [(&'static str, f64); 4] {
        [
            ("experience", self.experience),
            ("expertise", self.expertise),
            ("authoritativeness", self.authoritativeness),
            ("trustworthiness", self.trustworthiness),
        ]
    }
}

/// Analyzer for Experience, Expertise, Authoritativeness, Trustworthiness.
#[derive(Debug, Clone, Default)]
pub struct EeatOptimizer;

impl EeatOptimizer {
    pub fn new() -> Self {
        Self
    }

    /// Score the four dimensions.
    pub fn breakdown(&self, content: &str) -> EeatBreakdown {
        let prose = text::strip_links(content);

        let experience_hits: usize = EXPERIENCE_MARKERS.iter().map(|m| text::count_phrase(&prose, m)).sum();
        let experience = experience_hits.min(3) as f64 / 3.0 * 25.0;

        let figures = FIGURE_RE.find_iter(&prose).count();
        let words = text::words(&prose);
        let long_ratio = if words.is_empty() {
            0.0
        } else {
            words.iter().filter(|w| w.chars().count() >= 9).count() as f64 / words.len() as f64
        };
        let expertise = figures.min(3) as f64 / 3.0 * 15.0 + (long_ratio / 0.10).min(1.0) * 10.0;

        let link_count = text::links(content).len();
        let attributions: usize = ATTRIBUTION_MARKERS.iter().map(|m| text::count_phrase(&prose, m)).sum();
        let authoritativeness = (link_count + attributions).min(4) as f64 / 4.0 * 25.0;

        let mut trustworthiness: f64 = 10.0;
        if YEAR_RE.is_match(&prose) {
            trustworthiness += 5.0;
        }
        if DISCLOSURE_MARKERS.iter().any(|m| text::contains_phrase(&prose, m)) {
            trustworthiness += 5.0;
        }
        let claims = self.absolute_claims(&prose);
        if claims.is_empty() {
            trustworthiness += 5.0;
        } else {
            trustworthiness -= 5.0 * claims.len() as f64;
        }

        EeatBreakdown {
            experience,
            expertise,
            authoritativeness,
            trustworthiness: trustworthiness.clamp(0.0, 25.0),
        }
    }

    /// Absolute claims present in the text, in list order.
    pub fn absolute_claims(&self, content: &str) -> Vec<&'static str> {
        let lower = content.to_lowercase();
        ABSOLUTE_CLAIMS
            .iter()
            .copied()
            .filter(|claim| {
                if claim.starts_with(|c: char| c.is_ascii_digit()) {
                    lower.contains(claim)
                } else {
                    text::contains_phrase(&lower, claim)
                }
            })
            .collect()
    }

    /// Run the analysis synchronously.
    pub fn evaluate(&self, content: &str) -> AnalyzerResult {
        let breakdown = self.breakdown(content);
        let mut issues = Vec::new();
        let mut recommendations = Vec::new();

        for claim in self.absolute_claims(&text::strip_links(content)) {
            issues.push(
                Issue::new(
                    Stage::Eeat,
                    IssueKind::Eeat,
                    Severity::Medium,
                    format!("Absolute claim '{}' undermines trust", claim),
                )
                .with_target(claim),
            );
        }

        for (name, score) in breakdown.dimensions() {
            if score < WEAK_DIMENSION {
                issues.push(
                    Issue::new(
                        Stage::Eeat,
                        IssueKind::Eeat,
                        Severity::Medium,
                        format!("Weak {} signals ({:.1}/25)", name, score),
                    )
                    .with_target(name),
                );
                recommendations.push(Self::recommendation(name).to_string());
            }
        }

        let total = breakdown.total();
        if total < WEAK_TOTAL {
            issues.push(Issue::new(
                Stage::Eeat,
                IssueKind::Eeat,
                Severity::High,
                format!("Content shows few E-E-A-T signals ({:.1}/100)", total),
            ));
        }

        AnalyzerResult::new(Stage::Eeat, total, issues, recommendations)
    }

    fn recommendation(dimension: &str) -> &'static str {
        match dimension {
            "experience" => "Add first-hand experience: what was tried, tested or observed",
            "expertise" => "Back statements with concrete figures and precise terminology",
            "authoritativeness" => "Cite and link authoritative research or institutions",
            _ => "Add dates, a sources section and avoid overpromising",
        }
    }
}

#[async_trait]
impl Analyzer for EeatOptimizer {
    fn stage(&self) -> Stage {
        Stage::Eeat
    }

    async fn analyze(
        &self,
        content: &ContentCandidate,
        _requirements: &Requirements,
    ) -> anyhow::Result<AnalyzerResult> {
        Ok(self.evaluate(&content.text))
    }
}
