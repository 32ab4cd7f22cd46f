//! Cross-source story clustering and prioritization.
//!
//! Ingests a batch of near-duplicate news articles published independently
//! by several outlets, groups articles covering the same event into stories
//! via pairwise similarity and connected-component clustering, and ranks the
//! stories by breaking-news urgency, cross-source coverage, and content
//! quality.
//!
//! The crate owns no I/O: articles arrive pre-fetched in memory and ranked
//! stories go back to the caller. All recency scoring is anchored to an
//! explicit `now` so runs are reproducible.

pub mod cluster;
pub mod detect;
pub mod models;
pub mod pipeline;
pub mod prioritize;
pub mod similarity;
pub mod text;

pub use cluster::{build_clusters, ContentDepthPick, RepresentativePick};
pub use detect::{detect_pairs, detect_pairs_with_metrics, find_similar};
pub use models::{
    Article, ArticleCluster, PriorityLevel, PrioritizedStory, SimilarityMetrics, SimilarityResult,
    SourceStats, StoryMetrics,
};
pub use pipeline::{rank_stories, rank_stories_with, SimilarityConfig};
pub use prioritize::{prioritize, source_stats, top_stories, PrioritizationConfig};
pub use similarity::{score_pair, SimilarityWeights};
