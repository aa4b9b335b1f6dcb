/*!
 * Link placement analysis.
 *
 * Advisory stage: it never raises high-severity issues and carries no
 * weight in the default scoring table, but its issues still drive link
 * corrections during refinement.
 */

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::quality::model::{
    AnalyzerResult, ContentCandidate, Issue, IssueKind, Requirements, Severity, Stage,
};
use crate::quality::text::{self, Link};

use super::Analyzer;

static SENTENCE_END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?](?:\s|$)|\n").unwrap());

/// Anchor texts that say nothing about the target.
pub const GENERIC_ANCHORS: &[&str] = &[
    "click here", "here", "read more", "more", "this link", "link", "this", "learn more", "this page",
];

/// Links per 100 words above which the text reads as link-stuffed.
const MAX_LINKS_PER_100_WORDS: f64 = 3.0;

/// Density is only judged on content at least this long.
const MIN_WORDS_FOR_DENSITY: usize = 50;

/// Long content with no links at all gets a nudge.
const MIN_WORDS_EXPECTING_LINKS: usize = 150;

/// More links than this in one sentence counts as a cluster.
const MAX_LINKS_PER_SENTENCE: usize = 2;

/// Analyzer for link density, anchors and positions.
#[derive(Debug, Clone, Default)]
pub struct LinkPlacer;

impl LinkPlacer {
    pub fn new() -> Self {
        Self
    }

    /// Run the analysis synchronously.
    pub fn evaluate(&self, content: &str, requirements: &Requirements) -> AnalyzerResult {
        let links = text::links(content);
        let word_count = text::word_count(content);
        let mut issues = Vec::new();
        let mut recommendations = Vec::new();

        if links.is_empty() {
            if word_count >= MIN_WORDS_EXPECTING_LINKS {
                issues.push(Issue::new(
                    Stage::LinkPlacement,
                    IssueKind::LinkPlacement,
                    Severity::Low,
                    format!("No links in {} words of content", word_count),
                ));
            }
        } else {
            self.check_density(links.len(), word_count, &mut issues);
            self.check_positions(content, &links, &mut issues);
            self.check_anchors(&links, &mut issues);
            self.check_duplicates(&links, &mut issues);
        }

        for keyword in &requirements.keywords {
            let linked = links
                .iter()
                .filter_map(|l| l.anchor.as_deref())
                .any(|anchor| text::contains_phrase(anchor, keyword));
            if !linked && text::contains_phrase(content, keyword) {
                recommendations.push(format!("Consider linking a supporting resource for '{}'", keyword));
            }
        }

        let score = AnalyzerResult::penalized_score(&issues);
        AnalyzerResult::new(Stage::LinkPlacement, score, issues, recommendations)
    }

    fn check_density(&self, link_count: usize, word_count: usize, issues: &mut Vec<Issue>) {
        if word_count < MIN_WORDS_FOR_DENSITY {
            return;
        }
        let density = link_count as f64 / word_count as f64 * 100.0;
        if density > MAX_LINKS_PER_100_WORDS {
            issues.push(Issue::new(
                Stage::LinkPlacement,
                IssueKind::LinkPlacement,
                Severity::Medium,
                format!(
                    "Link density is {:.1} per 100 words (limit {:.1})",
                    density, MAX_LINKS_PER_100_WORDS
                ),
            ));
        }
    }

    fn check_positions(&self, content: &str, links: &[Link], issues: &mut Vec<Issue>) {
        let boundaries: Vec<usize> = SENTENCE_END_RE.find_iter(content).map(|m| m.end()).collect();
        let sentence_of = |link: &Link| boundaries.iter().filter(|b| **b <= link.start).count();

        if let Some(first) = links.first() {
            if sentence_of(first) == 0 {
                issues.push(
                    Issue::new(
                        Stage::LinkPlacement,
                        IssueKind::LinkPlacement,
                        Severity::Low,
                        "Link in the opening sentence pulls readers away before the topic is set",
                    )
                    .with_target(first.url.as_str()),
                );
            }
        }

        let mut per_sentence: HashMap<usize, usize> = HashMap::new();
        for link in links {
            *per_sentence.entry(sentence_of(link)).or_default() += 1;
        }
        let mut clustered: Vec<(usize, usize)> = per_sentence
            .into_iter()
            .filter(|(_, count)| *count > MAX_LINKS_PER_SENTENCE)
            .collect();
        clustered.sort_unstable();
        for (sentence, count) in clustered {
            issues.push(Issue::new(
                Stage::LinkPlacement,
                IssueKind::LinkPlacement,
                Severity::Low,
                format!("{} links clustered in sentence {}", count, sentence + 1),
            ));
        }
    }

    fn check_anchors(&self, links: &[Link], issues: &mut Vec<Issue>) {
        for link in links {
            let Some(anchor) = link.anchor.as_deref() else {
                continue;
            };
            let normalized = anchor.trim().to_lowercase();
            if normalized.is_empty() {
                issues.push(
                    Issue::new(
                        Stage::LinkPlacement,
                        IssueKind::LinkPlacement,
                        Severity::Medium,
                        format!("Link to '{}' has empty anchor text", link.url),
                    )
                    .with_target(link.url.as_str()),
                );
            } else if GENERIC_ANCHORS.contains(&normalized.as_str()) {
                issues.push(
                    Issue::new(
                        Stage::LinkPlacement,
                        IssueKind::LinkPlacement,
                        Severity::Medium,
                        format!("Generic anchor text '{}'", anchor.trim()),
                    )
                    .with_target(anchor.trim()),
                );
            }
        }
    }

    fn check_duplicates(&self, links: &[Link], issues: &mut Vec<Issue>) {
        let mut seen: Vec<&str> = Vec::new();
        let mut reported: Vec<&str> = Vec::new();
        for link in links {
            let url = link.url.as_str();
            if seen.contains(&url) {
                if !reported.contains(&url) {
                    issues.push(
                        Issue::new(
                            Stage::LinkPlacement,
                            IssueKind::LinkPlacement,
                            Severity::Low,
                            format!("'{}' is linked more than once", url),
                        )
                        .with_target(url),
                    );
                    reported.push(url);
                }
            } else {
                seen.push(url);
            }
        }
    }
}

#[async_trait]
impl Analyzer for LinkPlacer {
    fn stage(&self) -> Stage {
        Stage::LinkPlacement
    }

    async fn analyze(
        &self,
        content: &ContentCandidate,
        requirements: &Requirements,
    ) -> anyhow::Result<AnalyzerResult> {
        Ok(self.evaluate(&content.text, requirements))
    }
}
