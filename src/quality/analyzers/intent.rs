/*!
 * Intent and requirements-fit analysis.
 *
 * Classifies the search intent the content serves and checks it against
 * the caller's requirements: keyword coverage, primary keyword placement,
 * keyword stuffing, tone alignment and audience fit.
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::quality::model::{
    AnalyzerResult, ContentCandidate, Issue, IssueKind, Requirements, Severity, Stage,
};
use crate::quality::text;

use super::Analyzer;

/// Search intent served by the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchIntent {
    Informational,
    Commercial,
    Transactional,
    Navigational,
}

impl SearchIntent {
    fn signals(&self) -> &'static [&'static str] {
        match self {
            SearchIntent::Informational => &[
                "how", "what", "why", "guide", "learn", "tips", "explained", "tutorial", "understand", "steps",
            ],
            SearchIntent::Commercial => &[
                "best", "review", "reviews", "compare", "comparison", "vs", "top", "alternatives", "pros", "cons",
            ],
            SearchIntent::Transactional => &[
                "buy", "price", "pricing", "discount", "order", "deal", "coupon", "purchase", "subscribe", "shop",
            ],
            SearchIntent::Navigational => &[
                "login", "sign-in", "official", "website", "homepage", "contact", "account", "download",
            ],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchIntent::Informational => "informational",
            SearchIntent::Commercial => "commercial",
            SearchIntent::Transactional => "transactional",
            SearchIntent::Navigational => "navigational",
        }
    }
}

const INTENTS: [SearchIntent; 4] = [
    SearchIntent::Informational,
    SearchIntent::Commercial,
    SearchIntent::Transactional,
    SearchIntent::Navigational,
];

const SLANG: &[&str] = &["gonna", "wanna", "kinda", "awesome", "stuff", "lol", "cool", "super"];

/// Maximum primary keyword density (percent) before it counts as stuffing.
const MAX_KEYWORD_DENSITY: f64 = 3.0;

/// Content shorter than this is too small for a meaningful density check.
const MIN_WORDS_FOR_DENSITY: usize = 100;

/// Share of the score driven by keyword coverage.
const COVERAGE_WEIGHT: f64 = 60.0;

/// Analyzer for intent, keywords, tone and audience.
#[derive(Debug, Clone, Default)]
pub struct IntentAnalyzer;

impl IntentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Classify the search intent; keyword signals count triple.
    pub fn classify(&self, content: &str, keywords: &[String]) -> SearchIntent {
        let body = text::normalized_words(content);
        let keyword_words: Vec<String> = keywords
            .iter()
            .flat_map(|k| text::normalized_words(k))
            .collect();

        let mut best = (SearchIntent::Informational, 0usize);
        for intent in INTENTS {
            let signals = intent.signals();
            let in_body = body.iter().filter(|w| signals.contains(&w.as_str())).count();
            let in_keywords = keyword_words.iter().filter(|w| signals.contains(&w.as_str())).count();
            let total = in_body + in_keywords * 3;
            if total > best.1 {
                best = (intent, total);
            }
        }
        best.0
    }

    /// Run the analysis synchronously.
    pub fn evaluate(&self, content: &str, requirements: &Requirements) -> AnalyzerResult {
        let mut issues = Vec::new();
        let mut recommendations = Vec::new();

        let intent = self.classify(content, &requirements.keywords);
        recommendations.push(format!("Content reads as {} intent", intent.as_str()));

        let (coverage, missing) = self.check_keywords(content, requirements, &mut issues);
        self.check_tone(content, &requirements.tone, &mut issues);

        // Missing keywords are priced by coverage, everything else by severity.
        let mut score = COVERAGE_WEIGHT * coverage + (100.0 - COVERAGE_WEIGHT);
        score -= issues.iter().map(|i| i.severity.penalty()).sum::<f64>();
        let placement = std::mem::replace(&mut issues, missing);
        issues.extend(placement);

        if !self.mentions_audience(content, &requirements.target_audience) {
            score -= 5.0;
            recommendations.push(format!(
                "Address the target audience ({}) explicitly",
                requirements.target_audience
            ));
        }

        AnalyzerResult::new(Stage::Intent, score, issues, recommendations)
    }

    /// Record placement issues; return the covered share of keywords and the missing-keyword issues.
    fn check_keywords(
        &self,
        content: &str,
        requirements: &Requirements,
        issues: &mut Vec<Issue>,
    ) -> (f64, Vec<Issue>) {
        let mut missing = Vec::new();
        if requirements.keywords.is_empty() {
            return (1.0, missing);
        }

        let primary = requirements.primary_keyword();
        let mut present = 0usize;
        for keyword in &requirements.keywords {
            if text::contains_phrase(content, keyword) {
                present += 1;
                continue;
            }
            let (severity, message) = if keyword == primary {
                (Severity::High, format!("Primary keyword '{}' does not appear in the content", keyword))
            } else {
                (Severity::Medium, format!("Keyword '{}' does not appear in the content", keyword))
            };
            missing.push(Issue::new(Stage::Intent, IssueKind::Other, severity, message).with_target(keyword.as_str()));
        }

        if text::contains_phrase(content, primary) {
            let intro = text::paragraphs(content).first().copied().unwrap_or_default();
            if !text::contains_phrase(intro, primary) {
                issues.push(
                    Issue::new(
                        Stage::Intent,
                        IssueKind::Other,
                        Severity::Low,
                        format!("Primary keyword '{}' is missing from the introduction", primary),
                    )
                    .with_target(primary),
                );
            }

            let density = self.keyword_density(content, primary);
            if text::word_count(content) >= MIN_WORDS_FOR_DENSITY && density > MAX_KEYWORD_DENSITY {
                issues.push(
                    Issue::new(
                        Stage::Intent,
                        IssueKind::Other,
                        Severity::Medium,
                        format!(
                            "Keyword '{}' density is {:.1}% (stuffing above {:.1}%)",
                            primary, density, MAX_KEYWORD_DENSITY
                        ),
                    )
                    .with_target(primary),
                );
            }
        }

        (present as f64 / requirements.keywords.len() as f64, missing)
    }

    /// Percentage of words taken up by the keyword.
    pub fn keyword_density(&self, content: &str, keyword: &str) -> f64 {
        let total = text::word_count(content);
        if total == 0 {
            return 0.0;
        }
        let occurrences = text::count_phrase(&text::strip_links(content), keyword);
        let keyword_words = text::words(keyword).len().max(1);
        (occurrences * keyword_words) as f64 / total as f64 * 100.0
    }

    fn check_tone(&self, content: &str, tone: &str, issues: &mut Vec<Issue>) {
        let tone = tone.to_lowercase();
        let words = text::normalized_words(content);

        if ["casual", "friendly", "conversational"].iter().any(|t| tone.contains(t))
            && !words.iter().any(|w| w == "you" || w == "your")
        {
            issues.push(Issue::new(
                Stage::Intent,
                IssueKind::Other,
                Severity::Low,
                format!("A {} tone expects direct address of the reader ('you')", tone),
            ));
        }

        if ["professional", "formal", "authoritative"].iter().any(|t| tone.contains(t)) {
            let mut slang: Vec<&str> = SLANG.iter().copied().filter(|s| words.iter().any(|w| w == s)).collect();
            slang.dedup();
            if let Some(first) = slang.first() {
                issues.push(
                    Issue::new(
                        Stage::Intent,
                        IssueKind::Other,
                        Severity::Medium,
                        format!("Informal wording conflicts with a {} tone: {}", tone, slang.join(", ")),
                    )
                    .with_target(*first),
                );
            }
            if content.matches('!').count() > 2 {
                issues.push(Issue::new(
                    Stage::Intent,
                    IssueKind::Other,
                    Severity::Low,
                    format!("Too many exclamation marks for a {} tone", tone),
                ));
            }
        }

        if tone.contains("authoritative") && !content.chars().any(|c| c.is_ascii_digit()) {
            issues.push(Issue::new(
                Stage::Intent,
                IssueKind::Other,
                Severity::Low,
                "An authoritative tone benefits from concrete figures".to_string(),
            ));
        }
    }

    fn mentions_audience(&self, content: &str, audience: &str) -> bool {
        let terms: Vec<String> = text::normalized_words(audience)
            .into_iter()
            .filter(|w| w.len() > 3 && !text::is_stopword(w))
            .collect();
        if terms.is_empty() {
            return true;
        }
        let words = text::normalized_words(content);
        terms.iter().any(|term| {
            let stem = term.trim_end_matches('s');
            words.iter().any(|w| w.starts_with(stem))
        })
    }
}

#[async_trait]
impl Analyzer for IntentAnalyzer {
    fn stage(&self) -> Stage {
        Stage::Intent
    }

    async fn analyze(
        &self,
        content: &ContentCandidate,
        requirements: &Requirements,
    ) -> anyhow::Result<AnalyzerResult> {
        Ok(self.evaluate(&content.text, requirements))
    }
}
