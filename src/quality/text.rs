/*!
 * Text helpers shared by the analyzers and correctors.
 *
 * Tokenization here is deliberately simple: words are runs of letters,
 * digits, apostrophes and hyphens; sentences end at `.`, `!`, `?` or a
 * newline. Markdown links are recognised so that URLs do not leak into
 * word or sentence statistics.
 */

use once_cell::sync::Lazy;
use regex::Regex;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9][A-Za-z0-9'’-]*").unwrap());
static SENTENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^.!?\n]+[.!?]*").unwrap());
static MARKDOWN_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]\n]*)\]\(([^)\n]*)\)").unwrap());
static BARE_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?:https?|ftp)://[^\s)\]>"]+"#).unwrap());

/// Common English words ignored by frequency statistics.
pub const STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "because",
    "been", "but", "by", "can", "could", "do", "does", "each", "for", "from", "had", "has", "have",
    "he", "her", "his", "how", "i", "if", "in", "into", "is", "it", "its", "just", "like", "more",
    "most", "my", "no", "not", "of", "on", "one", "or", "our", "out", "she", "so", "some", "than",
    "that", "the", "their", "them", "then", "there", "these", "they", "this", "those", "to", "up",
    "us", "was", "we", "were", "what", "when", "which", "while", "who", "will", "with", "would",
    "you", "your",
];

/// A link found in the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Anchor text for markdown links, `None` for bare URLs
    pub anchor: Option<String>,
    /// Link target as written
    pub url: String,
    /// Byte offset of the link in the text
    pub start: usize,
    /// Byte offset just past the link
    pub end: usize,
}

impl Link {
    pub fn is_markdown(&self) -> bool {
        self.anchor.is_some()
    }
}

/// All words in the text, in order.
pub fn words(text: &str) -> Vec<&str> {
    WORD_RE.find_iter(text).map(|m| m.as_str()).collect()
}

/// Lowercased words with links reduced to their anchor text.
pub fn normalized_words(text: &str) -> Vec<String> {
    let stripped = strip_links(text);
    words(&stripped).into_iter().map(|w| w.to_lowercase()).collect()
}

/// Number of words, ignoring URLs.
pub fn word_count(text: &str) -> usize {
    words(&strip_links(text)).len()
}

/// Sentences of the text with links reduced to their anchor text.
pub fn sentences(text: &str) -> Vec<String> {
    let stripped = strip_links(text);
    SENTENCE_RE
        .find_iter(&stripped)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| s.chars().any(char::is_alphabetic))
        .collect()
}

/// Paragraphs separated by blank lines.
pub fn paragraphs(text: &str) -> Vec<&str> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Replace markdown links by their anchor text and drop bare URLs.
pub fn strip_links(text: &str) -> String {
    let without_markdown = MARKDOWN_LINK_RE.replace_all(text, "$1");
    BARE_URL_RE.replace_all(&without_markdown, "").into_owned()
}

/// Every markdown link and bare URL, ordered by position.
pub fn links(text: &str) -> Vec<Link> {
    let mut found: Vec<Link> = MARKDOWN_LINK_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(Link {
                anchor: Some(caps[1].to_string()),
                url: caps[2].trim().to_string(),
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect();

    for m in BARE_URL_RE.find_iter(text) {
        let inside_markdown = found.iter().any(|l| m.start() >= l.start && m.start() < l.end);
        if inside_markdown {
            continue;
        }
        let url = m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?']);
        found.push(Link {
            anchor: None,
            url: url.to_string(),
            start: m.start(),
            end: m.start() + url.len(),
        });
    }

    found.sort_by_key(|l| l.start);
    found
}

/// Rewrite every markdown link; the closure receives anchor text and target.
pub fn map_markdown_links<F>(text: &str, mut f: F) -> String
where
    F: FnMut(&str, &str) -> String,
{
    MARKDOWN_LINK_RE
        .replace_all(text, |caps: &regex::Captures| f(&caps[1], caps[2].trim()))
        .into_owned()
}

/// Apply a rewrite to the text between links, leaving links untouched.
pub fn map_outside_links<F>(text: &str, f: F) -> String
where
    F: Fn(&str) -> String,
{
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for link in links(text) {
        if link.start < cursor {
            continue;
        }
        out.push_str(&f(&text[cursor..link.start]));
        out.push_str(&text[link.start..link.end]);
        cursor = link.end;
    }
    out.push_str(&f(&text[cursor..]));
    out
}

/// Case-insensitive whole-phrase regex; `None` for a blank phrase.
pub fn phrase_regex(phrase: &str) -> Option<Regex> {
    let phrase = phrase.trim();
    if phrase.is_empty() {
        return None;
    }
    // `\b` only holds next to word characters, so `C++` gets no closing boundary
    let start = if phrase.starts_with(|c: char| c.is_alphanumeric()) { r"\b" } else { "" };
    let end = if phrase.ends_with(|c: char| c.is_alphanumeric()) { r"\b" } else { "" };
    Regex::new(&format!("(?i){}{}{}", start, regex::escape(phrase), end)).ok()
}

/// Case-insensitive whole-phrase occurrence count.
pub fn count_phrase(text: &str, phrase: &str) -> usize {
    phrase_regex(phrase).map_or(0, |re| re.find_iter(text).count())
}

/// Case-insensitive whole-phrase containment.
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    count_phrase(text, phrase) > 0
}

/// Whether a lowercased word is a stopword.
pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

/// Uppercase the first character of a string.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
