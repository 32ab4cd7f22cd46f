//! Text normalization for similarity comparison: stop-word stripping,
//! bounded keyword extraction, and lenient timestamp parsing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap, HashSet};
use unicode_normalization::UnicodeNormalization;

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
        "from", "up", "about", "into", "through", "during", "before", "after", "above", "below",
        "between", "among", "under", "over", "until", "is", "are", "was", "were", "be", "been",
        "being", "have", "has", "had", "do", "does", "did", "will", "would", "could", "should",
        "may", "might", "can", "must", "shall", "this", "that", "these", "those", "i", "you",
        "he", "she", "it", "we", "they", "me", "him", "her", "us", "them", "my", "your", "his",
        "its", "our", "their", "says", "said", "new", "news",
    ]
    .into_iter()
    .collect()
});

// Domain-specific noise words for Australian outlets.
static DOMAIN_STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "australia", "australian", "aus", "sydney", "melbourne", "brisbane", "perth", "adelaide",
        "darwin", "canberra", "nsw", "vic", "qld", "wa", "sa", "nt", "act", "tas", "breaking",
        "live", "update", "latest",
    ]
    .into_iter()
    .collect()
});

fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word) || DOMAIN_STOP_WORDS.contains(word)
}

/// Lowercase (NFC-normalized) and strip punctuation except apostrophes,
/// collapsing whitespace.
fn clean_text(text: &str) -> String {
    let lowered = text.nfc().collect::<String>().to_lowercase();
    let stripped: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '\'' { c } else { ' ' })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a title for similarity comparison: clean, then drop stop words
/// and tokens of length <= 2. Total function, empty in -> empty out.
pub fn normalize_title(title: &str) -> String {
    clean_text(title)
        .split_whitespace()
        .filter(|w| !is_stop_word(w) && w.chars().count() > 2)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract up to `max_count` keywords of length >= `min_len` from `text`.
///
/// Stop words and bare numbers are dropped. When more than `max_count`
/// distinct keywords remain, the most frequent win, ties broken by first
/// occurrence, so the returned set is always bounded.
pub fn extract_keywords(text: &str, min_len: usize, max_count: usize) -> BTreeSet<String> {
    if text.is_empty() {
        return BTreeSet::new();
    }

    let cleaned = clean_text(text);
    let mut freq: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();

    for word in cleaned.split_whitespace() {
        if word.chars().count() < min_len
            || is_stop_word(word)
            || word.chars().all(|c| c.is_ascii_digit())
        {
            continue;
        }
        if !freq.contains_key(word) {
            first_seen.push(word);
        }
        *freq.entry(word).or_insert(0) += 1;
    }

    if first_seen.len() <= max_count {
        return first_seen.into_iter().map(str::to_string).collect();
    }

    let mut ranked: Vec<(usize, &str)> = first_seen.into_iter().enumerate().collect();
    ranked.sort_by(|(pos_a, w_a), (pos_b, w_b)| freq[w_b].cmp(&freq[w_a]).then(pos_a.cmp(pos_b)));
    ranked
        .into_iter()
        .take(max_count)
        .map(|(_, w)| w.to_string())
        .collect()
}

/// First few significant words of a normalized title, for quick comparisons
/// and log lines.
pub fn title_signature(title: &str) -> String {
    normalize_title(title)
        .split_whitespace()
        .filter(|w| w.chars().count() > 3)
        .take(3)
        .collect::<Vec<_>>()
        .join(" ")
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Parse a publication timestamp leniently: RFC 3339 first, then the common
/// upstream formats. Returns `None` rather than erroring; callers degrade
/// the affected sub-score to its documented default.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(nd) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&nd.and_hms_opt(0, 0, 0)?));
        }
    }

    None
}
