//! Pairwise article similarity: fuzzy title matching, keyword-set overlap,
//! and publication-time proximity, combined by configurable weights.

use std::collections::BTreeSet;
use strsim::normalized_levenshtein;
use tracing::warn;

use crate::models::{Article, SimilarityResult};
use crate::text::{extract_keywords, normalize_title, parse_published};

pub const KEYWORD_MIN_LEN: usize = 3;
pub const KEYWORD_MAX_COUNT: usize = 20;

/// Relative weights of the three similarity factors.
///
/// Unlike [`PrioritizationConfig`](crate::prioritize::PrioritizationConfig),
/// these are tuning knobs rather than operator policy: a sum away from 1.0
/// is renormalized with a logged warning instead of rejected.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityWeights {
    pub title: f32,
    pub keyword: f32,
    pub time: f32,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            title: 0.6,
            keyword: 0.25,
            time: 0.15,
        }
    }
}

impl SimilarityWeights {
    pub fn new(title: f32, keyword: f32, time: f32) -> Self {
        Self {
            title,
            keyword,
            time,
        }
        .normalized()
    }

    /// Renormalize so the weights sum to 1.0, warning if they were off by
    /// more than the 0.01 tolerance.
    pub fn normalized(self) -> Self {
        let total = self.title + self.keyword + self.time;
        if (total - 1.0).abs() <= 0.01 {
            return self;
        }
        warn!(
            "Similarity weights don't sum to 1.0 (sum={:.3}), renormalizing",
            total
        );
        Self {
            title: self.title / total,
            keyword: self.keyword / total,
            time: self.time / total,
        }
    }
}

/// Edit-distance ratio of the normalized titles, boosted by up to +0.20
/// proportional to their word-set overlap, capped at 1.0.
pub fn title_similarity(title1: &str, title2: &str) -> f32 {
    let clean1 = normalize_title(title1);
    let clean2 = normalize_title(title2);
    if clean1.is_empty() || clean2.is_empty() {
        return 0.0;
    }

    let mut score = normalized_levenshtein(&clean1, &clean2) as f32;

    let words1: BTreeSet<&str> = clean1.split_whitespace().collect();
    let words2: BTreeSet<&str> = clean2.split_whitespace().collect();
    let overlap = words1.intersection(&words2).count() as f32;
    let max_words = words1.len().max(words2.len()) as f32;
    if max_words > 0.0 {
        score += overlap / max_words * 0.2;
    }

    score.min(1.0)
}

/// Jaccard similarity over keyword sets drawn from title + summary + tags,
/// with a +0.10 bonus for a shared category label. 0.0 if either keyword
/// set is empty.
pub fn keyword_similarity(a: &Article, b: &Article) -> f32 {
    let text_a = format!("{} {} {}", a.title, a.summary, a.tags.join(" "));
    let text_b = format!("{} {} {}", b.title, b.summary, b.tags.join(" "));

    let kw_a = extract_keywords(&text_a, KEYWORD_MIN_LEN, KEYWORD_MAX_COUNT);
    let kw_b = extract_keywords(&text_b, KEYWORD_MIN_LEN, KEYWORD_MAX_COUNT);
    if kw_a.is_empty() || kw_b.is_empty() {
        return 0.0;
    }

    let inter = kw_a.intersection(&kw_b).count() as f32;
    let union = kw_a.union(&kw_b).count() as f32;
    let jaccard = if union > 0.0 { inter / union } else { 0.0 };

    let category_bonus = if a.category == b.category { 0.1 } else { 0.0 };

    (jaccard + category_bonus).min(1.0)
}

/// Step function of the absolute publish-time delta. Unparseable timestamps
/// score 0.0 rather than erroring.
pub fn time_similarity(published1: &str, published2: &str) -> f32 {
    let (Some(t1), Some(t2)) = (parse_published(published1), parse_published(published2)) else {
        return 0.0;
    };

    let hours = (t1 - t2).num_seconds().abs() as f32 / 3600.0;
    if hours <= 6.0 {
        1.0
    } else if hours <= 24.0 {
        0.8
    } else if hours <= 48.0 {
        0.5
    } else if hours <= 168.0 {
        0.2
    } else {
        0.0
    }
}

/// Score one article pair. Pure function; safe to call concurrently over a
/// shared immutable slice.
pub fn score_pair(a: &Article, b: &Article, weights: SimilarityWeights) -> SimilarityResult {
    let title_score = title_similarity(&a.title, &b.title);
    let keyword_score = keyword_similarity(a, b);
    let time_score = time_similarity(&a.published_at, &b.published_at);

    let overall_score = title_score * weights.title
        + keyword_score * weights.keyword
        + time_score * weights.time;

    let explanation = explain(title_score, keyword_score, time_score, overall_score);

    SimilarityResult {
        article_id_1: a.id,
        article_id_2: b.id,
        overall_score,
        title_score,
        keyword_score,
        time_score,
        explanation,
    }
}

fn explain(title: f32, keyword: f32, time: f32, overall: f32) -> String {
    let mut parts: Vec<&str> = Vec::new();

    if title > 0.8 {
        parts.push("very similar headlines");
    } else if title > 0.6 {
        parts.push("similar headlines");
    } else if title > 0.4 {
        parts.push("somewhat similar headlines");
    }

    if keyword > 0.7 {
        parts.push("high keyword overlap");
    } else if keyword > 0.4 {
        parts.push("moderate keyword overlap");
    }

    if time > 0.8 {
        parts.push("published around the same time");
    } else if time > 0.4 {
        parts.push("published within a similar timeframe");
    }

    if parts.is_empty() {
        parts.push("low overall similarity");
    }
    let base = parts.join(", ");

    if overall > 0.8 {
        format!("High similarity due to {}", base)
    } else if overall > 0.6 {
        format!("Moderate similarity due to {}", base)
    } else {
        format!("Low similarity based on {}", base)
    }
}
