//! End-to-end ranking pipeline: dedupe exact republishes, detect pairwise
//! similarities, build story clusters, prioritize.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::cluster::{build_clusters, ContentDepthPick, RepresentativePick};
use crate::detect::detect_pairs_with_metrics;
use crate::models::{Article, PrioritizedStory};
use crate::prioritize::{prioritize, PrioritizationConfig};
use crate::similarity::SimilarityWeights;

/// Tunables for the detection stage.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityConfig {
    pub threshold: f32,
    pub weights: SimilarityWeights,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            threshold: 0.7,
            weights: SimilarityWeights::default(),
        }
    }
}

/// Drop exact republishes: same source and byte-identical trimmed title.
/// Cross-source duplicates are exactly the signal the detector looks for,
/// so only intra-source copies go.
fn dedupe_exact(articles: &[Article]) -> Vec<Article> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut kept = Vec::with_capacity(articles.len());
    for a in articles {
        let key = (a.source.clone(), a.title.trim().to_string());
        if seen.insert(key) {
            kept.push(a.clone());
        }
    }
    let removed = articles.len() - kept.len();
    if removed > 0 {
        info!(
            "Deduplication - removed={} exact republishes, retained={}",
            removed,
            kept.len()
        );
    }
    kept
}

/// Run the full pipeline over one article batch and return stories ranked by
/// priority, highest first.
///
/// `now` anchors all recency scoring; callers wanting reproducible output
/// pass a fixed timestamp. Article ids must be unique within the batch.
pub fn rank_stories(
    articles: &[Article],
    sim: &SimilarityConfig,
    config: &PrioritizationConfig,
    now: DateTime<Utc>,
) -> Result<Vec<PrioritizedStory>> {
    rank_stories_with(articles, sim, config, now, &ContentDepthPick)
}

/// [`rank_stories`] with a custom representative-selection strategy.
pub fn rank_stories_with(
    articles: &[Article],
    sim: &SimilarityConfig,
    config: &PrioritizationConfig,
    now: DateTime<Utc>,
    picker: &dyn RepresentativePick,
) -> Result<Vec<PrioritizedStory>> {
    let start = std::time::Instant::now();
    info!(
        "Pipeline started - articles={}, threshold={}",
        articles.len(),
        sim.threshold
    );

    let mut ids = HashSet::with_capacity(articles.len());
    for a in articles {
        if !ids.insert(a.id) {
            bail!("Duplicate article id in batch: {}", a.id);
        }
    }

    let articles = dedupe_exact(articles);

    let detect_start = std::time::Instant::now();
    let (similarities, metrics) = detect_pairs_with_metrics(&articles, sim.threshold, sim.weights);
    debug!(
        "Detection stage - duration={:.2}s, comparisons={}, pairs={}, avg_score={:.3}",
        detect_start.elapsed().as_secs_f32(),
        metrics.total_comparisons,
        metrics.similar_pairs_found,
        metrics.average_similarity_score
    );

    let clusters = build_clusters(&articles, &similarities, picker);

    let lookup: HashMap<i64, Article> = articles.into_iter().map(|a| (a.id, a)).collect();
    let stories = prioritize(&clusters, &lookup, config, now);

    info!(
        "Pipeline completed - duration={:.2}s, stories={}",
        start.elapsed().as_secs_f32(),
        stories.len()
    );
    Ok(stories)
}
