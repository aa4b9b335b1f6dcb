/*!
 * Source and citation validation.
 *
 * Extracts links and numeric citation markers, validates URLs with the
 * `url` crate, grades the credibility of the linked domains, and flags
 * orphaned markers, stale sources and content with no sources at all.
 * Reachability probing is optional and goes through `SourceProbe`.
 */

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Datelike;
use futures::future::join_all;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::quality::model::{
    AnalyzerResult, ContentCandidate, Issue, IssueKind, Requirements, Severity, Stage,
};
use crate::quality::text;

use super::Analyzer;

static MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(\d{1,3})\]").unwrap());
static REFERENCES_HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:#+[ \t]*)?(?:references|sources|bibliography|works cited)[ \t]*:?[ \t]*$").unwrap()
});
static CITED_YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(((?:19|20)\d{2})\)").unwrap());
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b((?:19|20)\d{2})\b").unwrap());

/// Domains treated as authoritative in addition to `.gov`, `.edu` and `.int`.
const CREDIBLE_DOMAINS: &[&str] = &[
    "wikipedia.org", "nih.gov", "who.int", "nature.com", "sciencedirect.com", "springer.com",
    "reuters.com", "apnews.com", "bbc.co.uk", "rhs.org.uk", "britannica.com", "nist.gov",
];

const LOW_CREDIBILITY_DOMAINS: &[&str] = &[
    "blogspot.com", "wordpress.com", "quora.com", "reddit.com", "pinterest.com", "tumblr.com",
    "bit.ly", "tinyurl.com",
];

/// Base score for content with no sources.
const UNSOURCED_SCORE: f64 = 50.0;

/// Base score for sourced content before credibility bonuses.
const SOURCED_SCORE: f64 = 70.0;

const CREDIBLE_BONUS: f64 = 10.0;

/// Reachability check for a source URL.
#[async_trait]
pub trait SourceProbe: Send + Sync + Debug {
    /// `Ok(false)` means the source is unreachable; `Err` means the check itself failed.
    async fn is_reachable(&self, url: &str) -> Result<bool>;
}

/// Probe that issues an HTTP HEAD request.
#[derive(Debug, Clone)]
pub struct HttpSourceProbe {
    client: Client,
}

impl HttpSourceProbe {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build HTTP client for source probing")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SourceProbe for HttpSourceProbe {
    async fn is_reachable(&self, url: &str) -> Result<bool> {
        match self.client.head(url).send().await {
            Ok(response) => {
                let status = response.status();
                // Some servers refuse HEAD but serve GET fine.
                Ok(status.is_success()
                    || status.is_redirection()
                    || status == reqwest::StatusCode::METHOD_NOT_ALLOWED)
            }
            Err(e) if e.is_timeout() || e.is_connect() => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to probe {}", url)),
        }
    }
}

/// How much a linked domain can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credibility {
    High,
    Neutral,
    Low,
}

/// Grade a host name.
pub fn domain_credibility(host: &str) -> Credibility {
    let host = host.trim_start_matches("www.").to_lowercase();
    let matches = |domain: &&str| host == *domain || host.ends_with(&format!(".{}", domain));

    if LOW_CREDIBILITY_DOMAINS.iter().any(matches) {
        return Credibility::Low;
    }
    if CREDIBLE_DOMAINS.iter().any(matches)
        || [".gov", ".edu", ".int"].iter().any(|tld| host.ends_with(tld))
        || host.contains(".gov.")
        || host.contains(".ac.")
    {
        return Credibility::High;
    }
    Credibility::Neutral
}

/// Analyzer for citations and sources.
#[derive(Debug, Clone)]
pub struct SourceValidator {
    stale_after_years: u32,
    reference_year: i32,
    probe: Option<Arc<dyn SourceProbe>>,
}

impl SourceValidator {
    /// Create a validator that dates sources against the current year.
    pub fn new(stale_after_years: u32) -> Self {
        Self {
            stale_after_years,
            reference_year: chrono::Utc::now().year(),
            probe: None,
        }
    }

    /// Pin the year used for staleness checks.
    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = year;
        self
    }

    /// Enable reachability probing.
    pub fn with_probe(mut self, probe: Arc<dyn SourceProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Run every check that needs no network access.
    ///
    /// Returns the result together with the valid http(s) URLs that a probe
    /// may check afterwards.
    pub fn evaluate(&self, content: &str) -> (AnalyzerResult, Vec<String>) {
        let mut issues = Vec::new();
        let mut recommendations = Vec::new();

        let (body, references) = split_references(content);
        let links = text::links(content);
        let markers = marker_numbers(body);

        let mut probe_targets = Vec::new();
        let mut credible = 0usize;
        for link in &links {
            match Url::parse(&link.url) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {
                    match url.host_str().map(domain_credibility) {
                        Some(Credibility::High) => credible += 1,
                        Some(Credibility::Low) => issues.push(
                            Issue::new(
                                Stage::Sources,
                                IssueKind::Citation,
                                Severity::Low,
                                format!("Low-credibility source '{}'", link.url),
                            )
                            .with_target(link.url.as_str()),
                        ),
                        _ => {}
                    }
                    probe_targets.push(link.url.clone());
                }
                _ => issues.push(
                    Issue::new(
                        Stage::Sources,
                        IssueKind::Citation,
                        Severity::Medium,
                        format!("Source URL '{}' is not a valid web address", link.url),
                    )
                    .with_target(link.url.as_str()),
                ),
            }
        }

        for number in &markers {
            if !references.is_some_and(|section| reference_listed(section, *number)) {
                let marker = format!("[{}]", number);
                issues.push(
                    Issue::new(
                        Stage::Sources,
                        IssueKind::Citation,
                        Severity::High,
                        format!("Citation marker {} has no matching reference", marker),
                    )
                    .with_target(marker),
                );
            }
        }

        for year in self.stale_years(content, references) {
            issues.push(
                Issue::new(
                    Stage::Sources,
                    IssueKind::Citation,
                    Severity::Low,
                    format!("Source from {} may be outdated", year),
                )
                .with_target(year.to_string()),
            );
        }

        let base = if links.is_empty() && markers.is_empty() {
            issues.push(Issue::new(
                Stage::Sources,
                IssueKind::Citation,
                Severity::Medium,
                "No sources or citations support the content",
            ));
            UNSOURCED_SCORE + Severity::Medium.penalty()
        } else {
            SOURCED_SCORE + CREDIBLE_BONUS * credible.min(3) as f64
        };

        if credible == 0 {
            recommendations.push("Cite at least one authoritative source (.gov, .edu, peer-reviewed)".to_string());
        }
        if !markers.is_empty() && references.is_none() {
            recommendations.push("Add a References section listing every numbered citation".to_string());
        }

        let score = base - issues.iter().map(|i| i.severity.penalty()).sum::<f64>();
        debug!(
            "Sources: {} link(s), {} marker(s), {} credible, score {:.1}",
            links.len(),
            markers.len(),
            credible,
            score
        );
        (
            AnalyzerResult::new(Stage::Sources, score, issues, recommendations),
            probe_targets,
        )
    }

    fn stale_years(&self, content: &str, references: Option<&str>) -> BTreeSet<i32> {
        let mut years: BTreeSet<i32> = CITED_YEAR_RE
            .captures_iter(content)
            .filter_map(|c| c[1].parse().ok())
            .collect();
        if let Some(section) = references {
            years.extend(YEAR_RE.captures_iter(section).filter_map(|c| c[1].parse::<i32>().ok()));
        }
        years
            .into_iter()
            .filter(|year| *year <= self.reference_year && self.reference_year - year > self.stale_after_years as i32)
            .collect()
    }
}

/// Split off the trailing references section, if there is one.
fn split_references(content: &str) -> (&str, Option<&str>) {
    match REFERENCES_HEADING_RE.find_iter(content).last() {
        Some(heading) => (&content[..heading.start()], Some(&content[heading.end()..])),
        None => (content, None),
    }
}

fn marker_numbers(body: &str) -> BTreeSet<u32> {
    MARKER_RE
        .captures_iter(body)
        .filter_map(|c| c[1].parse().ok())
        .collect()
}

fn reference_listed(section: &str, number: u32) -> bool {
    let bracketed = format!("[{}]", number);
    let dotted = format!("{}.", number);
    section
        .lines()
        .map(str::trim_start)
        .any(|line| line.starts_with(&bracketed) || line.starts_with(&dotted))
}

#[async_trait]
impl Analyzer for SourceValidator {
    fn stage(&self) -> Stage {
        Stage::Sources
    }

    async fn analyze(
        &self,
        content: &ContentCandidate,
        _requirements: &Requirements,
    ) -> anyhow::Result<AnalyzerResult> {
        let (mut result, targets) = self.evaluate(&content.text);
        let Some(probe) = &self.probe else {
            return Ok(result);
        };

        // One slow host must not hold up the others
        let checks = targets.into_iter().map(|url| async move {
            let reachable = probe.is_reachable(&url).await;
            (url, reachable)
        });
        let mut unreachable = Vec::new();
        for (url, reachable) in join_all(checks).await {
            match reachable {
                Ok(true) => {}
                Ok(false) => unreachable.push(url),
                Err(e) => warn!("Source probe failed for {}: {:#}", url, e),
            }
        }

        if unreachable.is_empty() {
            return Ok(result);
        }
        let penalty = Severity::Medium.penalty() * unreachable.len() as f64;
        for url in unreachable {
            result.issues.push(
                Issue::new(
                    Stage::Sources,
                    IssueKind::Citation,
                    Severity::Medium,
                    format!("Source '{}' is unreachable", url),
                )
                .with_target(url),
            );
        }
        Ok(AnalyzerResult::new(
            Stage::Sources,
            result.score - penalty,
            result.issues,
            result.recommendations,
        ))
    }
}
