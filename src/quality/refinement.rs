/*!
 * Issue-driven refinement of content.
 *
 * The engine walks the issues of a report from the highest severity down
 * and hands each one to the corrector registered for its kind. Correctors
 * are pure text rewrites; the only randomness (synonym and transition
 * choice) sits behind `SynonymStrategy` and is seeded from configuration
 * plus a fingerprint of the text, so identical inputs refine identically.
 */

use log::debug;
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::{Captures, Regex};
use sha2::{Digest, Sha256};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;
use url::Url;

use crate::errors::PipelineError;
use crate::quality::analyzers::links::GENERIC_ANCHORS;
use crate::quality::analyzers::variation::REPEATED_STARTER;
use crate::quality::error_detection::ErrorDetectionCorrection;
use crate::quality::model::{ContentCandidate, Issue, IssueKind, QualityReport, Requirements, Stage};
use crate::quality::text;

static CITATION_MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[\d{1,3}\]$").unwrap());

/// Softer wording for absolute claims.
const CLAIM_SOFTENERS: &[(&str, &str)] = &[
    ("guaranteed", "likely"),
    ("guarantee", "expect"),
    ("always works", "usually works"),
    ("never fails", "rarely fails"),
    ("miracle", "remarkable"),
    ("risk-free", "low-risk"),
    ("instantly", "quickly"),
    ("100%", "highly"),
];

/// Formal replacements for informal words.
const FORMAL_WORDING: &[(&str, &str)] = &[
    ("gonna", "going to"),
    ("wanna", "want to"),
    ("kinda", "somewhat"),
    ("awesome", "excellent"),
    ("stuff", "material"),
    ("cool", "useful"),
    ("super", "very"),
];

/// Synonyms used to break up overused words.
const SYNONYMS: &[(&str, &[&str])] = &[
    ("important", &["crucial", "key", "essential"]),
    ("great", &["excellent", "strong", "notable"]),
    ("help", &["assist", "support"]),
    ("helps", &["aids", "supports"]),
    ("improve", &["enhance", "boost"]),
    ("improves", &["enhances", "boosts"]),
    ("really", &["truly", "genuinely"]),
    ("easy", &["simple", "straightforward"]),
    ("simple", &["plain", "uncomplicated"]),
    ("many", &["numerous", "plenty of"]),
    ("make", &["create", "produce"]),
    ("effective", &["efficient", "productive"]),
    ("quality", &["standard", "calibre"]),
    ("content", &["material", "copy"]),
    ("best", &["finest", "top"]),
    ("good", &["solid", "sound"]),
];

const TRANSITIONS: &[&str] = &["Also", "In addition", "Likewise", "Similarly", "Meanwhile"];

/// Stable 64-bit fingerprint of a text.
pub fn fingerprint(text: &str) -> u64 {
    let digest = Sha256::digest(text.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// Chooses a replacement among candidates.
pub trait SynonymStrategy: Send + Sync + Debug {
    /// Pick one of `candidates` for the `occurrence`-th rewrite of `word` in `source`.
    fn choose<'a>(&self, word: &str, candidates: &[&'a str], occurrence: usize, source: &str) -> &'a str;
}

/// Seeded pseudo-random choice; the same seed and text always choose the same way.
#[derive(Debug, Clone)]
pub struct SeededSynonymStrategy {
    seed: u64,
}

impl SeededSynonymStrategy {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl SynonymStrategy for SeededSynonymStrategy {
    fn choose<'a>(&self, word: &str, candidates: &[&'a str], occurrence: usize, source: &str) -> &'a str {
        if candidates.is_empty() {
            return "";
        }
        let seed = self.seed ^ fingerprint(source) ^ fingerprint(word) ^ occurrence as u64;
        let mut rng = StdRng::seed_from_u64(seed);
        candidates[rng.random_range(0..candidates.len())]
    }
}

/// Rewrites text to address one kind of issue.
pub trait Corrector: Send + Sync + Debug {
    /// The issue kind this corrector handles
    fn kind(&self) -> IssueKind;

    /// Apply the correction for one issue; text without that issue must come back unchanged
    fn apply(&self, text: &str, issue: &Issue, requirements: &Requirements) -> String;
}

/// Keep the first letter's case of `original` on `replacement`.
fn match_case(original: &str, replacement: &str) -> String {
    if original.starts_with(char::is_uppercase) {
        text::capitalize(replacement)
    } else {
        replacement.to_string()
    }
}

/// Rewrite every link whose target is `url`; the closure receives the anchor, `None` for bare URLs.
fn rewrite_links<F>(content: &str, url: &str, mut f: F) -> String
where
    F: FnMut(Option<&str>) -> String,
{
    let mut out = String::with_capacity(content.len());
    let mut cursor = 0;
    for link in text::links(content).into_iter().filter(|l| l.url == url) {
        out.push_str(&content[cursor..link.start]);
        let replacement = f(link.anchor.as_deref());
        if replacement.is_empty() && content[link.end..].starts_with([' ', '.', ',', ';', ':', '!', '?', '\n']) {
            out.truncate(out.trim_end_matches([' ', '\t']).len());
        }
        out.push_str(&replacement);
        cursor = link.end;
    }
    out.push_str(&content[cursor..]);
    out
}

/// Replace markdown links to `url` with their anchor text and drop bare occurrences.
fn unlink(content: &str, url: &str) -> String {
    rewrite_links(content, url, |anchor| anchor.unwrap_or_default().to_string())
}

/// The repaired form of `url` when only its scheme is mistyped.
fn repaired_web_url(url: &str) -> Option<String> {
    let fixed = ErrorDetectionCorrection::fix_scheme(url);
    if fixed == url {
        return None;
    }
    Url::parse(&fixed)
        .ok()
        .filter(|parsed| matches!(parsed.scheme(), "http" | "https"))
        .map(|_| fixed)
}

/// Removes orphaned markers and placeholders, repairs or unlinks bad sources.
#[derive(Debug, Clone, Default)]
pub struct CitationCorrector {
    fixer: ErrorDetectionCorrection,
}

impl Corrector for CitationCorrector {
    fn kind(&self) -> IssueKind {
        IssueKind::Citation
    }

    fn apply(&self, content: &str, issue: &Issue, _requirements: &Requirements) -> String {
        if issue.stage == Stage::ErrorDetection {
            return self.fixer.correct(content, std::slice::from_ref(issue));
        }
        let Some(target) = issue.target.as_deref() else {
            return content.to_string();
        };

        if CITATION_MARKER_RE.is_match(target) {
            return match Regex::new(&format!(r"[ \t]?{}", regex::escape(target))) {
                Ok(re) => re.replace_all(content, "").into_owned(),
                Err(_) => content.to_string(),
            };
        }
        if !text::links(content).iter().any(|l| l.url == target) {
            return content.to_string();
        }
        match repaired_web_url(target) {
            Some(fixed) => rewrite_links(content, target, |anchor| match anchor {
                Some(anchor) => format!("[{}]({})", anchor, fixed),
                None => fixed.clone(),
            }),
            None => unlink(content, target),
        }
    }
}

/// Softens absolute claims.
///
/// Weak-dimension issues return the text unchanged; they surface as
/// recommendations only.
#[derive(Debug, Clone, Default)]
pub struct EeatCorrector;

impl Corrector for EeatCorrector {
    fn kind(&self) -> IssueKind {
        IssueKind::Eeat
    }

    fn apply(&self, content: &str, issue: &Issue, _requirements: &Requirements) -> String {
        match issue.target.as_deref() {
            Some(target) => {
                let Some((claim, softer)) = CLAIM_SOFTENERS.iter().find(|(claim, _)| *claim == target) else {
                    return content.to_string();
                };
                match text::phrase_regex(claim) {
                    Some(re) => text::map_outside_links(content, |segment| {
                        re.replace_all(segment, |caps: &Captures| match_case(&caps[0], softer))
                            .into_owned()
                    }),
                    None => content.to_string(),
                }
            }
            None => content.to_string(),
        }
    }
}

/// Delegates to the mechanical grammar rewrites.
#[derive(Debug, Clone, Default)]
pub struct GrammarCorrector {
    fixer: ErrorDetectionCorrection,
}

impl Corrector for GrammarCorrector {
    fn kind(&self) -> IssueKind {
        IssueKind::Grammar
    }

    fn apply(&self, content: &str, issue: &Issue, _requirements: &Requirements) -> String {
        self.fixer.correct(content, std::slice::from_ref(issue))
    }
}

/// Repairs link markup, generic anchors and duplicate links.
#[derive(Debug, Clone, Default)]
pub struct LinkCorrector {
    fixer: ErrorDetectionCorrection,
}

impl LinkCorrector {
    /// Anchor text derived from the link target.
    pub fn describe(url: &str) -> Option<String> {
        let parsed = Url::parse(url).ok()?;
        let from_path = parsed
            .path_segments()
            .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
            .map(|segment| {
                let stem = segment.split('.').next().unwrap_or(segment);
                stem.replace(['-', '_'], " ")
            })
            .filter(|s| s.chars().any(char::is_alphabetic));
        from_path.or_else(|| parsed.host_str().map(|h| h.trim_start_matches("www.").to_string()))
    }
}

impl Corrector for LinkCorrector {
    fn kind(&self) -> IssueKind {
        IssueKind::LinkPlacement
    }

    fn apply(&self, content: &str, issue: &Issue, _requirements: &Requirements) -> String {
        if issue.stage == Stage::ErrorDetection {
            return self.fixer.correct(content, std::slice::from_ref(issue));
        }
        let Some(target) = issue.target.as_deref() else {
            return content.to_string();
        };

        let mut seen = 0usize;
        text::map_markdown_links(content, |anchor, url| {
            let normalized = anchor.trim().to_lowercase();
            let generic = normalized == target.to_lowercase() && GENERIC_ANCHORS.contains(&normalized.as_str());
            let empty = normalized.is_empty() && url == target;
            if generic || empty {
                let described = Self::describe(url).unwrap_or_else(|| anchor.to_string());
                return format!("[{}]({})", described, url);
            }
            if url == target {
                seen += 1;
                if seen > 1 {
                    return anchor.to_string();
                }
            }
            format!("[{}]({})", anchor, url)
        })
    }
}

/// Breaks up repeated openers and overused words.
#[derive(Debug, Clone)]
pub struct VariationCorrector {
    strategy: Arc<dyn SynonymStrategy>,
}

impl VariationCorrector {
    pub fn new(strategy: Arc<dyn SynonymStrategy>) -> Self {
        Self { strategy }
    }

    fn vary_starters(&self, content: &str, starter: &str) -> String {
        let pattern = format!(r"(?im)(^|[.!?][ \t]+)({})\b", regex::escape(starter));
        let Ok(re) = Regex::new(&pattern) else {
            return content.to_string();
        };
        let mut occurrence = 0usize;
        re.replace_all(content, |caps: &Captures| {
            occurrence += 1;
            // Every second opener gets a transition
            if occurrence % 2 == 1 {
                return caps[0].to_string();
            }
            let transition = self.strategy.choose(starter, TRANSITIONS, occurrence, content);
            let word = &caps[2];
            let word = if word == "I" { word.to_string() } else { word.to_lowercase() };
            format!("{}{}, {}", &caps[1], transition, word)
        })
        .into_owned()
    }

    fn replace_overused(&self, content: &str, word: &str) -> String {
        let Some((_, synonyms)) = SYNONYMS.iter().find(|(w, _)| *w == word) else {
            return content.to_string();
        };
        let Some(re) = text::phrase_regex(word) else {
            return content.to_string();
        };
        let occurrence = Cell::new(0usize);
        text::map_outside_links(content, |segment| {
            re.replace_all(segment, |caps: &Captures| {
                let n = occurrence.get();
                occurrence.set(n + 1);
                if n % 2 == 0 {
                    caps[0].to_string()
                } else {
                    match_case(&caps[0], self.strategy.choose(word, synonyms, n, content))
                }
            })
            .into_owned()
        })
    }
}

impl Corrector for VariationCorrector {
    fn kind(&self) -> IssueKind {
        IssueKind::Variation
    }

    fn apply(&self, content: &str, issue: &Issue, _requirements: &Requirements) -> String {
        match issue.target.as_deref() {
            Some(starter) if issue.message.contains(REPEATED_STARTER) => self.vary_starters(content, starter),
            Some(word) => self.replace_overused(content, word),
            None => content.to_string(),
        }
    }
}

/// Inserts missing keywords and formalizes informal wording.
#[derive(Debug, Clone, Default)]
pub struct KeywordCorrector;

impl KeywordCorrector {
    fn insert_keyword(content: &str, keyword: &str) -> String {
        let intro_end = content.find("\n\n").unwrap_or(content.len());
        let intro = content[..intro_end].trim_end();
        let rest = &content[intro.len()..];
        let separator = if intro.is_empty() || intro.ends_with(['.', '!', '?']) { "" } else { "." };
        let space = if intro.is_empty() { "" } else { " " };
        format!("{}{}{}This article covers {}.{}", intro, separator, space, keyword, rest)
    }

    fn formalize(content: &str) -> String {
        text::map_outside_links(content, |segment| {
            let mut out = segment.to_string();
            for (informal, formal) in FORMAL_WORDING {
                if let Some(re) = text::phrase_regex(informal) {
                    out = re
                        .replace_all(&out, |caps: &Captures| match_case(&caps[0], formal))
                        .into_owned();
                }
            }
            out
        })
    }
}

impl Corrector for KeywordCorrector {
    fn kind(&self) -> IssueKind {
        IssueKind::Other
    }

    fn apply(&self, content: &str, issue: &Issue, requirements: &Requirements) -> String {
        let Some(target) = issue.target.as_deref() else {
            return content.to_string();
        };

        if requirements.keywords.iter().any(|k| k == target) {
            let intro = text::paragraphs(content).first().copied().unwrap_or_default();
            if text::contains_phrase(intro, target) {
                return content.to_string();
            }
            return Self::insert_keyword(content, target);
        }
        if FORMAL_WORDING.iter().any(|(informal, _)| *informal == target) {
            return Self::formalize(content);
        }
        content.to_string()
    }
}

/// Applies registered correctors to the issues of a report.
#[derive(Debug, Clone, Default)]
pub struct RefinementEngine {
    correctors: BTreeMap<IssueKind, Arc<dyn Corrector>>,
}

impl RefinementEngine {
    /// Engine with no correctors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with a corrector for every issue kind.
    pub fn with_default_correctors(seed: u64) -> Self {
        let mut engine = Self::new();
        engine.register(Arc::new(CitationCorrector::default()));
        engine.register(Arc::new(EeatCorrector));
        engine.register(Arc::new(GrammarCorrector::default()));
        engine.register(Arc::new(LinkCorrector::default()));
        engine.register(Arc::new(VariationCorrector::new(Arc::new(SeededSynonymStrategy::new(seed)))));
        engine.register(Arc::new(KeywordCorrector));
        engine
    }

    /// Register a corrector, replacing any previous one for its kind.
    pub fn register(&mut self, corrector: Arc<dyn Corrector>) {
        self.correctors.insert(corrector.kind(), corrector);
    }

    pub fn remove(&mut self, kind: IssueKind) -> Option<Arc<dyn Corrector>> {
        self.correctors.remove(&kind)
    }

    pub fn has_corrector(&self, kind: IssueKind) -> bool {
        self.correctors.contains_key(&kind)
    }

    /// Produce the next revision of the content.
    ///
    /// # Errors
    /// `PipelineError::Refinement` when a high-severity issue has no corrector
    /// for its kind; nothing is rewritten in that case.
    pub fn refine(
        &self,
        content: &ContentCandidate,
        report: &QualityReport,
        requirements: &Requirements,
    ) -> Result<ContentCandidate, PipelineError> {
        if let Some(issue) = report.issues.iter().find(|i| i.is_high() && !self.has_corrector(i.kind)) {
            return Err(PipelineError::Refinement {
                kind: issue.kind,
                message: format!("no corrector registered for high-severity issue: {}", issue.message),
            });
        }

        let mut ordered: Vec<&Issue> = report.issues.iter().collect();
        ordered.sort_by(|a, b| b.severity.cmp(&a.severity));

        let mut applied: Vec<&Issue> = Vec::new();
        let mut current = content.text.clone();
        for issue in ordered {
            if applied.contains(&issue) {
                continue;
            }
            let Some(corrector) = self.correctors.get(&issue.kind) else {
                debug!("No corrector for {} issue, skipping: {}", issue.kind, issue.message);
                continue;
            };
            let next = corrector.apply(&current, issue, requirements);
            if next != current {
                debug!("Corrected {} issue: {}", issue.kind, issue.message);
            }
            current = next;
            applied.push(issue);
        }

        Ok(content.next(current))
    }
}
