/*!
 * Linguistic variation analysis.
 *
 * Looks for prose that reads as machine-repetitive: the same sentence
 * opener over and over, a handful of overused content words, uniform
 * sentence lengths and a small vocabulary.
 */

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};

use crate::quality::model::{
    AnalyzerResult, ContentCandidate, Issue, IssueKind, Requirements, Severity, Stage,
};
use crate::quality::text;

use super::Analyzer;

/// Marker in the message of repeated-opener issues.
pub const REPEATED_STARTER: &str = "sentences start with";

/// A sentence opener repeated this often is flagged...
const MIN_REPEATED_STARTERS: usize = 3;

/// ...provided it opens at least this share of all sentences.
const STARTER_SHARE: f64 = 0.3;

/// Share of all words above which a content word counts as overused.
const OVERUSE_SHARE: f64 = 0.04;
const MIN_OVERUSE_COUNT: usize = 4;
const MIN_WORDS_FOR_OVERUSE: usize = 40;
const MAX_OVERUSE_ISSUES: usize = 3;

/// Coefficient of variation of sentence lengths below which prose is monotonous.
const MIN_LENGTH_VARIATION: f64 = 0.15;
const MIN_SENTENCES_FOR_RHYTHM: usize = 5;

/// Type-token ratio below which vocabulary is too narrow.
const MIN_LEXICAL_DIVERSITY: f64 = 0.35;
const MIN_WORDS_FOR_DIVERSITY: usize = 50;

/// Analyzer for repetition and monotony.
#[derive(Debug, Clone, Default)]
pub struct VariationDetector;

impl VariationDetector {
    pub fn new() -> Self {
        Self
    }

    /// Run the analysis synchronously.
    pub fn evaluate(&self, content: &str, requirements: &Requirements) -> AnalyzerResult {
        let sentences = text::sentences(content);
        let words = text::normalized_words(content);
        let mut issues = Vec::new();
        let mut recommendations = Vec::new();

        self.check_starters(&sentences, &mut issues);
        self.check_overuse(&words, requirements, &mut issues);

        let variation = self.length_variation(&sentences);
        if sentences.len() >= MIN_SENTENCES_FOR_RHYTHM && variation < MIN_LENGTH_VARIATION {
            issues.push(Issue::new(
                Stage::Variation,
                IssueKind::Variation,
                Severity::Low,
                format!("Sentence lengths are monotonous (variation {:.2})", variation),
            ));
            recommendations.push("Mix short and long sentences to vary the rhythm".to_string());
        }

        if words.len() >= MIN_WORDS_FOR_DIVERSITY {
            let diversity = self.lexical_diversity(&words);
            if diversity < MIN_LEXICAL_DIVERSITY {
                issues.push(Issue::new(
                    Stage::Variation,
                    IssueKind::Variation,
                    Severity::Medium,
                    format!("Low lexical diversity ({:.2} distinct words per word)", diversity),
                ));
                recommendations.push("Broaden the vocabulary; many words repeat".to_string());
            }
        }

        let score = AnalyzerResult::penalized_score(&issues);
        AnalyzerResult::new(Stage::Variation, score, issues, recommendations)
    }

    fn check_starters(&self, sentences: &[String], issues: &mut Vec<Issue>) {
        if sentences.len() < MIN_REPEATED_STARTERS {
            return;
        }
        let mut starters: BTreeMap<String, usize> = BTreeMap::new();
        for sentence in sentences {
            if let Some(first) = text::words(sentence).first() {
                *starters.entry(first.to_lowercase()).or_default() += 1;
            }
        }
        for (starter, count) in starters {
            let share = count as f64 / sentences.len() as f64;
            if count >= MIN_REPEATED_STARTERS && share >= STARTER_SHARE {
                issues.push(
                    Issue::new(
                        Stage::Variation,
                        IssueKind::Variation,
                        Severity::Medium,
                        format!("{} of {} {} '{}'", count, sentences.len(), REPEATED_STARTER, starter),
                    )
                    .with_target(starter),
                );
            }
        }
    }

    fn check_overuse(&self, words: &[String], requirements: &Requirements, issues: &mut Vec<Issue>) {
        if words.len() < MIN_WORDS_FOR_OVERUSE {
            return;
        }
        let exempt: HashSet<String> = requirements
            .keywords
            .iter()
            .flat_map(|k| text::normalized_words(k))
            .collect();

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for word in words {
            if word.chars().count() >= 4 && !text::is_stopword(word) && !exempt.contains(word) {
                *counts.entry(word.as_str()).or_default() += 1;
            }
        }

        let mut overused: Vec<(&str, usize)> = counts
            .into_iter()
            .filter(|(_, count)| {
                *count >= MIN_OVERUSE_COUNT && *count as f64 / words.len() as f64 > OVERUSE_SHARE
            })
            .collect();
        overused.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

        for (word, count) in overused.into_iter().take(MAX_OVERUSE_ISSUES) {
            issues.push(
                Issue::new(
                    Stage::Variation,
                    IssueKind::Variation,
                    Severity::Low,
                    format!("'{}' is used {} times", word, count),
                )
                .with_target(word),
            );
        }
    }

    /// Coefficient of variation of sentence lengths in words.
    pub fn length_variation(&self, sentences: &[String]) -> f64 {
        let lengths: Vec<f64> = sentences.iter().map(|s| text::words(s).len() as f64).collect();
        if lengths.is_empty() {
            return 0.0;
        }
        let mean = lengths.iter().sum::<f64>() / lengths.len() as f64;
        if mean == 0.0 {
            return 0.0;
        }
        let variance = lengths.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / lengths.len() as f64;
        variance.sqrt() / mean
    }

    /// Distinct words over total words.
    pub fn lexical_diversity(&self, words: &[String]) -> f64 {
        if words.is_empty() {
            return 0.0;
        }
        let distinct: HashSet<&String> = words.iter().collect();
        distinct.len() as f64 / words.len() as f64
    }
}

#[async_trait]
impl Analyzer for VariationDetector {
    fn stage(&self) -> Stage {
        Stage::Variation
    }

    async fn analyze(
        &self,
        content: &ContentCandidate,
        requirements: &Requirements,
    ) -> anyhow::Result<AnalyzerResult> {
        Ok(self.evaluate(&content.text, requirements))
    }
}
