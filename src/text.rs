// src/text.rs
//! Text normalization and the pluggable rewrite seam. Everything here is
//! pure string-in/string-out; the pipeline's tests never depend on any
//! particular rewrite rule set.

use once_cell::sync::OnceCell;
use regex::Regex;

fn re(cell: &'static OnceCell<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static regex"))
}

/// Decode HTML entities, strip tags, collapse whitespace, unstick glued
/// cyrillic words ("СправочникаВрача" -> "Справочника Врача").
pub fn clean_html(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    let mut out = html_escape::decode_html_entities(s).replace('\u{a0}', " ");

    static RE_BR: OnceCell<Regex> = OnceCell::new();
    out = re(&RE_BR, r"(?i)<\s*br\s*/?>").replace_all(&out, "\n").to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    out = re(&RE_TAGS, r"(?is)</?[^>]+>").replace_all(&out, " ").to_string();

    static RE_SPACES: OnceCell<Regex> = OnceCell::new();
    out = re(&RE_SPACES, r"[ \t]+").replace_all(&out, " ").to_string();

    static RE_NL: OnceCell<Regex> = OnceCell::new();
    out = re(&RE_NL, r"\s*\n\s*").replace_all(&out, "\n").to_string();

    static RE_PUNCT: OnceCell<Regex> = OnceCell::new();
    out = re(&RE_PUNCT, r"\s+([,.;:!?])").replace_all(&out, "$1").to_string();

    static RE_GLUED: OnceCell<Regex> = OnceCell::new();
    out = re(&RE_GLUED, r"([а-яё])([А-ЯЁ])")
        .replace_all(&out, "$1 $2")
        .to_string();

    out.trim().to_string()
}

/// Split on sentence-final punctuation followed by whitespace.
pub fn split_sentences(text: &str) -> Vec<String> {
    static RE_SENT: OnceCell<Regex> = OnceCell::new();
    re(&RE_SENT, r"(?s)\s*(.*?[.!?])(?:\s+|$)")
        .captures_iter(text.trim())
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty())
        .chain(trailing_fragment(text))
        .collect()
}

fn trailing_fragment(text: &str) -> Option<String> {
    // Text after the last sentence terminator, if any.
    let t = text.trim();
    let tail = match t.rfind(['.', '!', '?']) {
        Some(i) => t[i + 1..].trim(),
        None => t,
    };
    (!tail.is_empty()).then(|| tail.to_string())
}

/// Drop obvious junk lines: bare URLs, timestamp stamps, one-column tag
/// crumbs; then dedup repeated sentences case-insensitively.
pub fn drop_noise(text: &str) -> String {
    static RE_URL: OnceCell<Regex> = OnceCell::new();
    static RE_CLOCK: OnceCell<Regex> = OnceCell::new();
    static RE_ISO: OnceCell<Regex> = OnceCell::new();

    let mut kept = Vec::new();
    for line in text.lines() {
        let l = line.trim();
        if l.is_empty() {
            continue;
        }
        if re(&RE_URL, r"https?://\S+").is_match(l) {
            continue;
        }
        if re(&RE_CLOCK, r"^\d{1,2}:\d{2}(\s*\d{2}\.\d{2}\.\d{4})?$").is_match(l) {
            continue;
        }
        if re(&RE_ISO, r"^\d{4}-\d{2}-\d{2}T?\d{2}:\d{2}:\d{2}\s*\+\d{2}:\d{2}$").is_match(l) {
            continue;
        }
        if l.chars().count() <= 20 && l.split_whitespace().count() <= 3 && !l.ends_with('.') {
            continue;
        }
        kept.push(l);
    }

    let mut seen = std::collections::HashSet::new();
    let mut uniq = Vec::new();
    for s in split_sentences(&kept.join("\n")) {
        if seen.insert(s.to_lowercase()) {
            uniq.push(s);
        }
    }
    uniq.join(" ")
}

/// Share of cyrillic letters among all alphabetic characters; 0.0 for
/// letterless input.
pub fn cyrillic_ratio(text: &str) -> f64 {
    let mut letters = 0usize;
    let mut cyr = 0usize;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            letters += 1;
            if matches!(ch, 'а'..='я' | 'А'..='Я' | 'ё' | 'Ё') {
                cyr += 1;
            }
        }
    }
    if letters == 0 {
        0.0
    } else {
        cyr as f64 / letters as f64
    }
}

/// Content-preserving rewrite capability. The pipeline only consumes the
/// output; it never inspects the rules.
pub trait Rewrite: Send + Sync {
    fn rewrite(&self, text: &str) -> String;
}

pub struct IdentityRewrite;

impl Rewrite for IdentityRewrite {
    fn rewrite(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Word-for-word replacement table, loadable from TOML:
/// `rules = [["сообщил ", "заявил "], ...]`.
pub struct TableRewrite {
    rules: Vec<(String, String)>,
}

impl TableRewrite {
    pub fn new(rules: Vec<(String, String)>) -> Self {
        Self { rules }
    }

    pub fn from_toml_path(path: &std::path::Path) -> anyhow::Result<Self> {
        #[derive(serde::Deserialize)]
        struct RuleFile {
            rules: Vec<(String, String)>,
        }
        let content = std::fs::read_to_string(path)?;
        let parsed: RuleFile = toml::from_str(&content)?;
        Ok(Self::new(parsed.rules))
    }
}

impl Rewrite for TableRewrite {
    fn rewrite(&self, text: &str) -> String {
        let mut s = text.to_string();
        for (from, to) in &self.rules {
            s = s.replace(from.as_str(), to);
        }
        capitalize_first(&s)
    }
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Lead = first rewritten sentence that is not just the title again;
/// body = up to `max_body_sentences` further deduplicated sentences.
pub fn pick_lead_and_body(
    full: &str,
    title: &str,
    rewrite: &dyn Rewrite,
    max_body_sentences: usize,
) -> (String, String) {
    let mut sents = split_sentences(full);
    if sents.is_empty() {
        return (String::new(), String::new());
    }

    let mut lead = rewrite.rewrite(&sents[0]);
    let same = |a: &str, b: &str| {
        a.trim().trim_end_matches('.').to_lowercase() == b.trim().trim_end_matches('.').to_lowercase()
    };
    if same(&lead, title) && sents.len() > 1 {
        lead = rewrite.rewrite(&sents[1]);
        sents.remove(0);
    }

    let mut seen = std::collections::HashSet::new();
    seen.insert(lead.to_lowercase());
    let mut body_sents = Vec::new();
    for s in sents.iter().skip(1) {
        let r = rewrite.rewrite(s);
        if r.is_empty() || !seen.insert(r.to_lowercase()) {
            continue;
        }
        body_sents.push(r);
        if body_sents.len() >= max_body_sentences {
            break;
        }
    }
    (lead, body_sents.join(" "))
}
