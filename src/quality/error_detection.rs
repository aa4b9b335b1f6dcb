/*!
 * Detection and correction of mechanical content errors.
 *
 * Covers the issues that can be fixed without judgement:
 * - Grammar: repeated words, spacing, capitalization, a/an, misspellings
 * - Citations: placeholder markers such as `[citation needed]`
 * - Links: malformed schemes and empty link targets
 *
 * Correction is a fixed, ordered sequence of pure rewrites keyed on the
 * issue kinds present, so the same text and issue set always produce the
 * same output.
 */

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::model::{Issue, IssueKind, Severity, Stage};
use super::text;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z][A-Za-z'’-]*").unwrap());
static MULTI_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\S) {2,}").unwrap());
static SPACE_BEFORE_PUNCT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w) +([,;:!?]|\.(?:\s|$))").unwrap());
static MISSING_SPACE_COMMA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z])([,;])([A-Za-z])").unwrap());
static MISSING_SPACE_SENTENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z]{2}[.!?])([A-Z][a-z])").unwrap());
static SENTENCE_START_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)(^|[.!?] +)([a-z])").unwrap());
static A_BEFORE_VOWEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([Aa]) ([aeiou][a-z]*)").unwrap());
static AN_BEFORE_CONSONANT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([Aa])n ([bcdfgjklmnpqrstvwxz][a-z]*)").unwrap());
static PLACEHOLDER_CITATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i) ?\[(citation needed|\?|source\?)\]").unwrap());
static EMPTY_BRACKETS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r" ?\[\]([^(]|$)").unwrap());

/// Frequent misspellings and their corrections.
pub const MISSPELLINGS: &[(&str, &str)] = &[
    ("accomodate", "accommodate"),
    ("acheive", "achieve"),
    ("alot", "a lot"),
    ("becuase", "because"),
    ("beleive", "believe"),
    ("definately", "definitely"),
    ("enviroment", "environment"),
    ("existance", "existence"),
    ("goverment", "government"),
    ("occured", "occurred"),
    ("occurence", "occurrence"),
    ("publically", "publicly"),
    ("recieve", "receive"),
    ("seperate", "separate"),
    ("teh", "the"),
    ("thier", "their"),
    ("tommorow", "tomorrow"),
    ("untill", "until"),
    ("wich", "which"),
    ("wierd", "weird"),
];

/// Vowel-letter words that take "a" because they start with a consonant sound.
const CONSONANT_SOUND_PREFIXES: &[&str] = &["uni", "use", "usu", "uti", "eu", "one", "once", "ure"];

/// Combined detector and corrector for mechanical issues.
#[derive(Debug, Clone, Default)]
pub struct ErrorDetectionCorrection;

impl ErrorDetectionCorrection {
    /// Create a new detector.
    pub fn new() -> Self {
        Self
    }

    /// Find every mechanical issue in the text.
    pub fn detect(&self, content: &str) -> Vec<Issue> {
        let mut issues = Vec::new();
        let prose = text::strip_links(content);

        self.detect_repeated_words(&prose, &mut issues);
        self.detect_misspellings(&prose, &mut issues);
        self.detect_spacing(&prose, &mut issues);
        self.detect_capitalization(content, &mut issues);
        self.detect_articles(&prose, &mut issues);
        self.detect_unbalanced(content, &mut issues);
        self.detect_placeholder_citations(content, &mut issues);
        self.detect_malformed_links(content, &mut issues);

        issues
    }

    /// Apply every rewrite relevant to the given issues.
    pub fn correct(&self, content: &str, issues: &[Issue]) -> String {
        let kinds: BTreeSet<IssueKind> = issues.iter().map(|i| i.kind).collect();
        let mut current = content.to_string();

        if kinds.contains(&IssueKind::Citation) {
            current = Self::remove_placeholder_citations(&current);
        }
        if kinds.contains(&IssueKind::LinkPlacement) {
            current = Self::repair_links(&current);
        }
        if kinds.contains(&IssueKind::Grammar) {
            current = text::map_outside_links(&current, |segment| {
                let fixed = Self::fix_misspellings(segment);
                let fixed = Self::remove_repeated_words(&fixed);
                let fixed = Self::fix_spacing(&fixed);
                Self::fix_articles(&fixed)
            });
            current = Self::capitalize_sentences(&current);
        }

        current
    }

    fn issue(kind: IssueKind, severity: Severity, message: String) -> Issue {
        Issue::new(Stage::ErrorDetection, kind, severity, message)
    }

    fn detect_repeated_words(&self, prose: &str, issues: &mut Vec<Issue>) {
        let mut previous: Option<regex::Match> = None;
        for current in WORD_RE.find_iter(prose) {
            if let Some(prev) = previous {
                let gap = &prose[prev.end()..current.start()];
                if !gap.is_empty()
                    && gap.chars().all(|c| c == ' ' || c == '\t')
                    && prev.as_str().eq_ignore_ascii_case(current.as_str())
                {
                    let word = current.as_str().to_lowercase();
                    issues.push(
                        Self::issue(IssueKind::Grammar, Severity::Medium, format!("Repeated word '{}'", word))
                            .with_target(word),
                    );
                }
            }
            previous = Some(current);
        }
    }

    fn detect_misspellings(&self, prose: &str, issues: &mut Vec<Issue>) {
        for word in WORD_RE.find_iter(prose) {
            let lower = word.as_str().to_lowercase();
            if let Some((wrong, right)) = MISSPELLINGS.iter().find(|(wrong, _)| *wrong == lower) {
                issues.push(
                    Self::issue(
                        IssueKind::Grammar,
                        Severity::Medium,
                        format!("Misspelled word '{}' (did you mean '{}'?)", wrong, right),
                    )
                    .with_target(*wrong),
                );
            }
        }
    }

    fn detect_spacing(&self, prose: &str, issues: &mut Vec<Issue>) {
        let doubled = MULTI_SPACE_RE.find_iter(prose).count();
        if doubled > 0 {
            issues.push(Self::issue(
                IssueKind::Grammar,
                Severity::Low,
                format!("{} occurrence(s) of repeated spaces", doubled),
            ));
        }

        let before = SPACE_BEFORE_PUNCT_RE.find_iter(prose).count();
        if before > 0 {
            issues.push(Self::issue(
                IssueKind::Grammar,
                Severity::Low,
                format!("{} occurrence(s) of whitespace before punctuation", before),
            ));
        }

        let missing = MISSING_SPACE_COMMA_RE.find_iter(prose).count()
            + MISSING_SPACE_SENTENCE_RE.find_iter(prose).count();
        if missing > 0 {
            issues.push(Self::issue(
                IssueKind::Grammar,
                Severity::Medium,
                format!("{} occurrence(s) of missing space after punctuation", missing),
            ));
        }
    }

    fn detect_capitalization(&self, content: &str, issues: &mut Vec<Issue>) {
        for caps in SENTENCE_START_RE.captures_iter(content) {
            let start = caps.get(2).map(|m| m.start()).unwrap_or_default();
            let word = WORD_RE
                .find_at(content, start)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            issues.push(
                Self::issue(
                    IssueKind::Grammar,
                    Severity::Low,
                    format!("Sentence starts with lowercase '{}'", word),
                )
                .with_target(word),
            );
        }
    }

    fn detect_articles(&self, prose: &str, issues: &mut Vec<Issue>) {
        for caps in A_BEFORE_VOWEL_RE.captures_iter(prose) {
            let next = &caps[2];
            if !Self::has_consonant_sound(next) {
                issues.push(
                    Self::issue(IssueKind::Grammar, Severity::Low, format!("Use 'an' before '{}'", next))
                        .with_target(next),
                );
            }
        }
        for caps in AN_BEFORE_CONSONANT_RE.captures_iter(prose) {
            let next = &caps[2];
            issues.push(
                Self::issue(IssueKind::Grammar, Severity::Low, format!("Use 'a' before '{}'", next))
                    .with_target(next),
            );
        }
    }

    fn detect_unbalanced(&self, content: &str, issues: &mut Vec<Issue>) {
        for (open, close) in [('(', ')'), ('[', ']')] {
            let opened = content.matches(open).count();
            let closed = content.matches(close).count();
            if opened != closed {
                issues.push(Self::issue(
                    IssueKind::Grammar,
                    Severity::Medium,
                    format!("Unbalanced '{}{}' ({} opened, {} closed)", open, close, opened, closed),
                ));
            }
        }
    }

    fn detect_placeholder_citations(&self, content: &str, issues: &mut Vec<Issue>) {
        for m in PLACEHOLDER_CITATION_RE.find_iter(content) {
            let marker = m.as_str().trim().to_string();
            issues.push(
                Self::issue(
                    IssueKind::Citation,
                    Severity::High,
                    format!("Placeholder citation {} left in content", marker),
                )
                .with_target(marker),
            );
        }
        if EMPTY_BRACKETS_RE.is_match(content) {
            issues.push(
                Self::issue(IssueKind::Citation, Severity::High, "Empty citation marker [] left in content".to_string())
                    .with_target("[]"),
            );
        }
    }

    fn detect_malformed_links(&self, content: &str, issues: &mut Vec<Issue>) {
        for link in text::links(content).into_iter().filter(|l| l.is_markdown()) {
            let message = if link.url.is_empty() {
                Some("Link has an empty target".to_string())
            } else if Self::fix_scheme(&link.url) != link.url {
                Some(format!("Link target '{}' has a malformed scheme", link.url))
            } else {
                None
            };
            if let Some(message) = message {
                issues.push(
                    Self::issue(IssueKind::LinkPlacement, Severity::Medium, message).with_target(link.url),
                );
            }
        }
    }

    fn has_consonant_sound(word: &str) -> bool {
        CONSONANT_SOUND_PREFIXES.iter().any(|p| word.starts_with(p))
    }

    /// Repair common scheme typos; other targets are returned unchanged.
    pub fn fix_scheme(url: &str) -> String {
        const TYPOS: &[(&str, &str)] = &[
            ("https//", "https://"),
            ("http//", "http://"),
            ("htps://", "https://"),
            ("htp://", "http://"),
            ("https:/", "https://"),
            ("http:/", "http://"),
        ];
        for (typo, fixed) in TYPOS {
            if let Some(rest) = url.strip_prefix(typo) {
                if typo.ends_with(":/") && rest.starts_with('/') {
                    continue;
                }
                return format!("{}{}", fixed, rest);
            }
        }
        url.to_string()
    }

    fn remove_placeholder_citations(content: &str) -> String {
        let cleaned = PLACEHOLDER_CITATION_RE.replace_all(content, "");
        EMPTY_BRACKETS_RE.replace_all(&cleaned, "$1").into_owned()
    }

    fn repair_links(content: &str) -> String {
        text::map_markdown_links(content, |anchor, url| {
            if url.is_empty() {
                anchor.to_string()
            } else {
                format!("[{}]({})", anchor, Self::fix_scheme(url))
            }
        })
    }

    fn fix_misspellings(segment: &str) -> String {
        WORD_RE
            .replace_all(segment, |caps: &Captures| {
                let word = &caps[0];
                let lower = word.to_lowercase();
                match MISSPELLINGS.iter().find(|(wrong, _)| *wrong == lower) {
                    Some((_, right)) if word.starts_with(char::is_uppercase) => text::capitalize(right),
                    Some((_, right)) => right.to_string(),
                    None => word.to_string(),
                }
            })
            .into_owned()
    }

    fn remove_repeated_words(segment: &str) -> String {
        let mut out = String::with_capacity(segment.len());
        let mut cursor = 0;
        let mut previous: Option<regex::Match> = None;
        for current in WORD_RE.find_iter(segment) {
            if let Some(prev) = previous {
                let gap = &segment[prev.end()..current.start()];
                if !gap.is_empty()
                    && gap.chars().all(|c| c == ' ' || c == '\t')
                    && prev.as_str().eq_ignore_ascii_case(current.as_str())
                {
                    out.push_str(&segment[cursor..prev.end()]);
                    cursor = current.end();
                    continue;
                }
            }
            previous = Some(current);
        }
        out.push_str(&segment[cursor..]);
        out
    }

    fn fix_spacing(segment: &str) -> String {
        let fixed = MULTI_SPACE_RE.replace_all(segment, "$1 ");
        let fixed = SPACE_BEFORE_PUNCT_RE.replace_all(&fixed, "$1$2");
        let fixed = MISSING_SPACE_COMMA_RE.replace_all(&fixed, "$1$2 $3");
        MISSING_SPACE_SENTENCE_RE.replace_all(&fixed, "$1 $2").into_owned()
    }

    fn fix_articles(segment: &str) -> String {
        let fixed = A_BEFORE_VOWEL_RE.replace_all(segment, |caps: &Captures| {
            let next = &caps[2];
            if Self::has_consonant_sound(next) {
                caps[0].to_string()
            } else {
                format!("{}n {}", &caps[1], next)
            }
        });
        AN_BEFORE_CONSONANT_RE.replace_all(&fixed, "$1 $2").into_owned()
    }

    fn capitalize_sentences(content: &str) -> String {
        SENTENCE_START_RE
            .replace_all(content, |caps: &Captures| {
                format!("{}{}", &caps[1], caps[2].to_uppercase())
            })
            .into_owned()
    }
}
