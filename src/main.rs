use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};

use story_rank::{
    rank_stories, source_stats, Article, PrioritizationConfig, SimilarityConfig, SimilarityWeights,
};

/// Rank a batch of news articles into prioritized cross-source stories.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a JSON file containing the article batch (array of articles)
    input: PathBuf,

    /// Output directory for ranked stories (default: "out")
    #[arg(short, long, default_value = "out")]
    output_dir: PathBuf,

    /// Minimum pairwise similarity for two articles to count as the same story
    #[arg(short, long, default_value_t = 0.7)]
    threshold: f32,

    /// Keep only the top N stories
    #[arg(short, long, default_value_t = 10)]
    limit: usize,

    /// Also write per-source contribution statistics
    #[arg(long)]
    stats: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Reading article batch from {}", args.input.display()))?;
    let articles: Vec<Article> = serde_json::from_str(&raw)
        .with_context(|| format!("Decoding article JSON from {}", args.input.display()))?;
    info!(
        "Loaded {} articles from {}",
        articles.len(),
        args.input.display()
    );

    let sim = SimilarityConfig {
        threshold: args.threshold,
        weights: SimilarityWeights::default(),
    };
    let config = PrioritizationConfig::default();
    let now = Utc::now();

    let mut stories = rank_stories(&articles, &sim, &config, now)?;

    if args.stats {
        let stats = source_stats(&stories);
        std::fs::create_dir_all(&args.output_dir)?;
        let stats_path = args.output_dir.join("source_stats.json");
        std::fs::write(&stats_path, serde_json::to_vec_pretty(&stats)?)?;
        debug!("Wrote {}", stats_path.display());
    }

    stories.truncate(args.limit);

    std::fs::create_dir_all(&args.output_dir)?;
    let out_path = args.output_dir.join("stories.json");
    std::fs::write(&out_path, serde_json::to_vec_pretty(&stories)?)
        .with_context(|| format!("Writing {}", out_path.display()))?;
    info!("Wrote {} stories to {}", stories.len(), out_path.display());

    for (rank, story) in stories.iter().enumerate() {
        info!(
            "#{} [{:?}] {:.3} - {} ({}, {})",
            rank + 1,
            story.metrics.priority_level,
            story.metrics.overall_score,
            story.title,
            story.coverage_description(),
            story.time_description
        );
    }

    Ok(())
}
