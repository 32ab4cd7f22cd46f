use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A news article as supplied by the upstream extraction pipeline.
///
/// Articles are immutable once they enter this subsystem. `id` must be
/// unique within a batch; `classification_confidence` is an optional signal
/// from the external classifier (absence means "no signal", not zero).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub source: String,
    pub category: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Publication timestamp as supplied upstream. Parsed leniently; an
    /// unparseable value degrades the time-dependent sub-scores rather than
    /// failing the batch.
    #[serde(default)]
    pub published_at: String,
    #[serde(default)]
    pub classification_confidence: Option<f32>,
}

/// Outcome of scoring one article pair.
///
/// Symmetric in meaning, stored with the `(article_id_1, article_id_2)`
/// ordering of the comparison that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityResult {
    pub article_id_1: i64,
    pub article_id_2: i64,
    pub overall_score: f32,
    pub title_score: f32,
    pub keyword_score: f32,
    pub time_score: f32,
    pub explanation: String,
}

impl SimilarityResult {
    pub fn is_similar(&self, threshold: f32) -> bool {
        self.overall_score >= threshold
    }
}

/// A story: the connected component of articles reachable through pairwise
/// similarity edges. Singletons (no similar partner) are valid one-member
/// stories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleCluster {
    pub cluster_id: String,
    pub member_article_ids: BTreeSet<i64>,
    pub representative_article_id: i64,
    /// Mean `overall_score` over every similarity edge inside the component.
    /// 0.0 for singletons, which have no edges.
    pub cohesion_score: f32,
    pub sources_covered: BTreeSet<String>,
}

impl ArticleCluster {
    pub fn article_count(&self) -> usize {
        self.member_article_ids.len()
    }

    pub fn source_count(&self) -> usize {
        self.sources_covered.len()
    }
}

/// Discrete priority bucket derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorityLevel {
    Breaking,
    High,
    Medium,
    Low,
}

impl PriorityLevel {
    pub fn from_score(score: f32) -> Self {
        if score >= 0.8 {
            PriorityLevel::Breaking
        } else if score >= 0.6 {
            PriorityLevel::High
        } else if score >= 0.4 {
            PriorityLevel::Medium
        } else {
            PriorityLevel::Low
        }
    }
}

/// Scoring breakdown for one ranked story.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryMetrics {
    pub breaking_score: f32,
    pub coverage_score: f32,
    pub quality_score: f32,
    pub overall_score: f32,
    pub priority_level: PriorityLevel,

    // detailed breakdown
    pub time_urgency: f32,
    pub source_velocity: f32,
    pub urgency_keywords_found: Vec<String>,
    pub source_count: usize,
    pub geographic_scope: String,
    pub content_depth_score: f32,
    pub classification_confidence: f32,
}

/// A cluster plus its metrics and the presentation fields derived from the
/// representative article. Read-only to consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrioritizedStory {
    pub story_id: String,
    pub representative_article_id: i64,
    pub title: String,
    pub summary: String,
    pub category: String,
    pub sources: BTreeSet<String>,
    pub member_article_ids: BTreeSet<i64>,
    pub article_count: usize,
    pub first_published: Option<DateTime<Utc>>,
    pub latest_published: Option<DateTime<Utc>>,
    pub time_description: String,
    pub metrics: StoryMetrics,
}

impl PrioritizedStory {
    pub fn is_breaking(&self) -> bool {
        self.metrics.priority_level == PriorityLevel::Breaking
    }

    pub fn coverage_description(&self) -> String {
        let n = self.sources.len();
        if n >= 4 {
            format!("All {} major sources", n)
        } else if n >= 2 {
            format!("{} sources", n)
        } else {
            "Single source".to_string()
        }
    }
}

/// Summary of one batch detection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityMetrics {
    pub total_comparisons: usize,
    pub similar_pairs_found: usize,
    pub average_similarity_score: f32,
}

impl SimilarityMetrics {
    /// Fraction of comparisons that cleared the threshold, as a percentage.
    pub fn similarity_rate(&self) -> f32 {
        if self.total_comparisons == 0 {
            return 0.0;
        }
        self.similar_pairs_found as f32 / self.total_comparisons as f32 * 100.0
    }
}

/// Per-outlet contribution summary over a ranked batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceStats {
    pub source_name: String,
    pub articles_contributed: usize,
    pub stories_participated: usize,
    pub average_quality_score: f32,
    pub breaking_news_count: usize,
}
