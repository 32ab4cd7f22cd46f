//! Story prioritization: breaking-news urgency, cross-source coverage, and
//! content quality, combined into an overall score and discrete level.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use tracing::{info, warn};

use crate::models::{
    Article, ArticleCluster, PriorityLevel, PrioritizedStory, SourceStats, StoryMetrics,
};
use crate::text::parse_published;

const INTERNATIONAL_KEYWORDS: &[&str] = &[
    "international",
    "global",
    "world",
    "overseas",
    "foreign",
    "usa",
    "china",
    "europe",
    "asia",
    "america",
    "uk",
    "us ",
];

const NATIONAL_KEYWORDS: &[&str] = &[
    "australia",
    "australian",
    "national",
    "federal",
    "commonwealth",
    "parliament",
    "government",
    "prime minister",
    "rba",
    "asx",
];

const STATE_KEYWORDS: &[&str] = &[
    "nsw",
    "victoria",
    "queensland",
    "western australia",
    "south australia",
    "tasmania",
    "northern territory",
    "act",
    "state government",
];

fn default_urgency_keywords() -> Vec<String> {
    [
        // general urgency
        "breaking", "urgent", "emergency", "alert", "crisis", "developing", "live", "just in",
        // financial
        "crash", "plunge", "surge", "record", "market shock", "trading halt",
        // sports
        "injury", "suspended", "banned", "controversy", "shock", "upset", "winner", "champion",
        // general news
        "announces", "confirms", "reveals", "admits", "denies", "resigns", "appointed",
        "arrested", "charged",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_source_credibility() -> HashMap<String, f32> {
    [
        ("ABC News", 0.95),
        ("The Guardian AU", 0.90),
        ("Sydney Morning Herald", 0.85),
        ("News.com.au", 0.75),
    ]
    .into_iter()
    .map(|(s, c)| (s.to_string(), c))
    .collect()
}

/// Operator-facing prioritization policy. Constructed once; weights that do
/// not sum to 1.0 are rejected at construction time, never renormalized.
#[derive(Debug, Clone)]
pub struct PrioritizationConfig {
    pub breaking_weight: f32,
    pub coverage_weight: f32,
    pub quality_weight: f32,

    pub breaking_time_threshold_hours: f32,
    pub high_velocity_threshold_minutes: f32,

    /// Distinct-source count that earns full coverage credit.
    pub max_sources: usize,

    pub min_content_length: usize,
    pub max_content_length: usize,

    pub urgency_keywords: Vec<String>,
    pub source_credibility: HashMap<String, f32>,
    pub default_credibility: f32,
}

impl Default for PrioritizationConfig {
    fn default() -> Self {
        Self {
            breaking_weight: 0.4,
            coverage_weight: 0.35,
            quality_weight: 0.25,
            breaking_time_threshold_hours: 2.0,
            high_velocity_threshold_minutes: 30.0,
            max_sources: 4,
            min_content_length: 200,
            max_content_length: 2000,
            urgency_keywords: default_urgency_keywords(),
            source_credibility: default_source_credibility(),
            default_credibility: 0.6,
        }
    }
}

impl PrioritizationConfig {
    /// Build a config with custom weights, failing fast when they do not
    /// sum to 1.0 within a 0.01 tolerance.
    pub fn with_weights(breaking: f32, coverage: f32, quality: f32) -> Result<Self> {
        let total = breaking + coverage + quality;
        if (total - 1.0).abs() > 0.01 {
            bail!(
                "Prioritization weights must sum to 1.0 (current sum: {})",
                total
            );
        }
        Ok(Self {
            breaking_weight: breaking,
            coverage_weight: coverage,
            quality_weight: quality,
            ..Self::default()
        })
    }
}

fn member_articles<'a>(
    cluster: &ArticleCluster,
    lookup: &'a HashMap<i64, Article>,
) -> Vec<&'a Article> {
    let mut members = Vec::with_capacity(cluster.member_article_ids.len());
    for id in &cluster.member_article_ids {
        match lookup.get(id) {
            Some(a) => members.push(a),
            None => warn!(
                "Cluster {} references unknown article id {}",
                cluster.cluster_id, id
            ),
        }
    }
    members
}

fn publish_times(members: &[&Article]) -> Vec<DateTime<Utc>> {
    let mut times: Vec<DateTime<Utc>> = members
        .iter()
        .filter_map(|a| parse_published(&a.published_at))
        .collect();
    times.sort();
    times
}

fn time_urgency(latest: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f32 {
    let Some(latest) = latest else {
        return 0.1;
    };
    let hours_ago = (now - latest).num_seconds() as f32 / 3600.0;
    if hours_ago <= 0.5 {
        1.0
    } else if hours_ago <= 1.0 {
        0.9
    } else if hours_ago <= 2.0 {
        0.8
    } else if hours_ago <= 6.0 {
        0.6
    } else if hours_ago <= 24.0 {
        0.3
    } else {
        0.1
    }
}

fn source_velocity(times: &[DateTime<Utc>], high_velocity_threshold_minutes: f32) -> f32 {
    if times.len() < 2 {
        // no velocity signal from a single timestamp
        return 0.5;
    }
    let span_minutes =
        (*times.last().expect("non-empty") - times[0]).num_seconds() as f32 / 60.0;
    if span_minutes <= high_velocity_threshold_minutes {
        1.0
    } else if span_minutes <= 60.0 {
        0.8
    } else if span_minutes <= 180.0 {
        0.6
    } else if span_minutes <= 360.0 {
        0.4
    } else {
        0.2
    }
}

fn urgency_keywords_found(members: &[&Article], keywords: &[String]) -> Vec<String> {
    let mut found = BTreeSet::new();
    for a in members {
        let text = format!("{} {}", a.title, a.summary).to_lowercase();
        for kw in keywords {
            if text.contains(&kw.to_lowercase()) {
                found.insert(kw.clone());
            }
        }
    }
    found.into_iter().collect()
}

fn urgency_bonus(keyword_count: usize) -> f32 {
    match keyword_count {
        0 => 0.0,
        1 => 0.1,
        2 => 0.2,
        _ => 0.3,
    }
}

fn geographic_scope(members: &[&Article]) -> &'static str {
    let mut all_text = String::new();
    for a in members {
        all_text.push(' ');
        all_text.push_str(&a.title);
        all_text.push(' ');
        all_text.push_str(&a.summary);
    }
    let text = all_text.to_lowercase();

    // widest matching tier wins
    if INTERNATIONAL_KEYWORDS.iter().any(|k| text.contains(k)) {
        "international"
    } else if NATIONAL_KEYWORDS.iter().any(|k| text.contains(k)) {
        "national"
    } else if STATE_KEYWORDS.iter().any(|k| text.contains(k)) {
        "state"
    } else {
        "local"
    }
}

fn scope_score(scope: &str) -> f32 {
    match scope {
        "international" => 1.0,
        "national" => 0.8,
        "state" => 0.6,
        _ => 0.4,
    }
}

fn content_depth(members: &[&Article], min_len: usize, max_len: usize) -> f32 {
    if members.is_empty() || max_len <= min_len {
        return 0.0;
    }
    let span = (max_len - min_len) as f32;
    let sum: f32 = members
        .iter()
        .map(|a| {
            let len = a.content.chars().count();
            ((len as f32 - min_len as f32) / span).clamp(0.0, 1.0)
        })
        .sum();
    sum / members.len() as f32
}

fn avg_classification_confidence(members: &[&Article]) -> f32 {
    let confidences: Vec<f32> = members
        .iter()
        .filter_map(|a| a.classification_confidence)
        .collect();
    if confidences.is_empty() {
        return 0.0;
    }
    confidences.iter().sum::<f32>() / confidences.len() as f32
}

fn source_credibility(
    sources: &BTreeSet<String>,
    table: &HashMap<String, f32>,
    default: f32,
) -> f32 {
    if sources.is_empty() {
        return 0.5;
    }
    let sum: f32 = sources
        .iter()
        .map(|s| table.get(s).copied().unwrap_or(default))
        .sum();
    sum / sources.len() as f32
}

/// Compute the full metrics breakdown for one cluster.
pub fn score_cluster(
    cluster: &ArticleCluster,
    members: &[&Article],
    config: &PrioritizationConfig,
    now: DateTime<Utc>,
) -> StoryMetrics {
    let times = publish_times(members);

    // breaking: recency, cross-source pickup speed, urgency keywords
    let urgency = time_urgency(times.last().copied(), now);
    let velocity = source_velocity(&times, config.high_velocity_threshold_minutes);
    let keywords = urgency_keywords_found(members, &config.urgency_keywords);
    let bonus = urgency_bonus(keywords.len());
    let breaking_score = (urgency * 0.6 + velocity * 0.4 + bonus).min(1.0);

    // coverage: diversity, cohesion, geographic scope
    let source_diversity =
        (cluster.sources_covered.len() as f32 / config.max_sources as f32).min(1.0);
    let scope = geographic_scope(members);
    let coverage_score = source_diversity * 0.5
        + cluster.cohesion_score * 0.3
        + scope_score(scope) * 0.2;

    // quality: depth, classifier confidence, outlet credibility
    let depth = content_depth(members, config.min_content_length, config.max_content_length);
    let confidence = avg_classification_confidence(members);
    let credibility = source_credibility(
        &cluster.sources_covered,
        &config.source_credibility,
        config.default_credibility,
    );
    let quality_score = depth * 0.4 + confidence * 0.4 + credibility * 0.2;

    let overall_score = breaking_score * config.breaking_weight
        + coverage_score * config.coverage_weight
        + quality_score * config.quality_weight;

    StoryMetrics {
        breaking_score,
        coverage_score,
        quality_score,
        overall_score,
        priority_level: PriorityLevel::from_score(overall_score),
        time_urgency: urgency,
        source_velocity: velocity,
        urgency_keywords_found: keywords,
        source_count: cluster.sources_covered.len(),
        geographic_scope: scope.to_string(),
        content_depth_score: depth,
        classification_confidence: confidence,
    }
}

fn time_description(latest: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(latest) = latest else {
        return "publish time unknown".to_string();
    };
    let secs = (now - latest).num_seconds().max(0);
    if secs < 3600 {
        format!("{} minutes ago", secs / 60)
    } else if secs < 86_400 {
        format!("{} hours ago", secs / 3600)
    } else {
        format!("{} days ago", secs / 86_400)
    }
}

/// Rank clusters by overall priority score, descending. A cluster whose
/// representative article is missing from `lookup` is skipped with a logged
/// warning; the rest of the batch still ranks. The sort is stable, so ties
/// preserve input cluster order.
pub fn prioritize(
    clusters: &[ArticleCluster],
    lookup: &HashMap<i64, Article>,
    config: &PrioritizationConfig,
    now: DateTime<Utc>,
) -> Vec<PrioritizedStory> {
    let mut stories: Vec<PrioritizedStory> = Vec::with_capacity(clusters.len());

    for cluster in clusters {
        let Some(representative) = lookup.get(&cluster.representative_article_id) else {
            warn!(
                "Skipping cluster {}: representative article {} not found",
                cluster.cluster_id, cluster.representative_article_id
            );
            continue;
        };

        let members = member_articles(cluster, lookup);
        if members.is_empty() {
            warn!(
                "Skipping cluster {}: no resolvable member articles",
                cluster.cluster_id
            );
            continue;
        }

        let metrics = score_cluster(cluster, &members, config, now);
        let times = publish_times(&members);
        let latest = times.last().copied();

        stories.push(PrioritizedStory {
            story_id: cluster.cluster_id.clone(),
            representative_article_id: representative.id,
            title: representative.title.clone(),
            summary: representative.summary.clone(),
            category: representative.category.clone(),
            sources: cluster.sources_covered.clone(),
            member_article_ids: cluster.member_article_ids.clone(),
            article_count: cluster.member_article_ids.len(),
            first_published: times.first().copied(),
            latest_published: latest,
            time_description: time_description(latest, now),
            metrics,
        });
    }

    stories.sort_by(|a, b| {
        b.metrics
            .overall_score
            .partial_cmp(&a.metrics.overall_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    if let Some(top) = stories.first() {
        info!(
            "Prioritized {} stories, top score: {:.3}",
            stories.len(),
            top.metrics.overall_score
        );
    }

    stories
}

/// Top-N convenience wrapper over [`prioritize`].
pub fn top_stories(
    clusters: &[ArticleCluster],
    lookup: &HashMap<i64, Article>,
    config: &PrioritizationConfig,
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<PrioritizedStory> {
    let mut stories = prioritize(clusters, lookup, config, now);
    stories.truncate(limit);
    stories
}

/// Per-outlet contribution summary over a ranked batch, sorted by stories
/// participated in, descending.
pub fn source_stats(stories: &[PrioritizedStory]) -> Vec<SourceStats> {
    struct Acc {
        articles: usize,
        stories: usize,
        quality_sum: f32,
        breaking: usize,
    }

    let mut by_source: HashMap<&str, Acc> = HashMap::new();
    for story in stories {
        for source in &story.sources {
            let acc = by_source.entry(source.as_str()).or_insert(Acc {
                articles: 0,
                stories: 0,
                quality_sum: 0.0,
                breaking: 0,
            });
            acc.articles += story.article_count;
            acc.stories += 1;
            acc.quality_sum += story.metrics.quality_score;
            if story.is_breaking() {
                acc.breaking += 1;
            }
        }
    }

    let mut stats: Vec<SourceStats> = by_source
        .into_iter()
        .map(|(source, acc)| SourceStats {
            source_name: source.to_string(),
            articles_contributed: acc.articles,
            stories_participated: acc.stories,
            average_quality_score: if acc.stories > 0 {
                acc.quality_sum / acc.stories as f32
            } else {
                0.0
            },
            breaking_news_count: acc.breaking,
        })
        .collect();

    stats.sort_by(|a, b| {
        b.stories_participated
            .cmp(&a.stories_participated)
            .then_with(|| a.source_name.cmp(&b.source_name))
    });
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 29, 12, 0, 0).unwrap()
    }

    fn article(id: i64, title: &str, source: &str, published_at: String) -> Article {
        Article {
            id,
            title: title.to_string(),
            source: source.to_string(),
            category: "news".to_string(),
            summary: String::new(),
            content: "x".repeat(1100),
            tags: vec![],
            published_at,
            classification_confidence: Some(0.8),
        }
    }

    fn cluster_of(articles: &[Article], cohesion: f32) -> ArticleCluster {
        ArticleCluster {
            cluster_id: "test-cluster".to_string(),
            member_article_ids: articles.iter().map(|a| a.id).collect(),
            representative_article_id: articles[0].id,
            cohesion_score: cohesion,
            sources_covered: articles.iter().map(|a| a.source.clone()).collect(),
        }
    }

    fn lookup_of(articles: &[Article]) -> HashMap<i64, Article> {
        articles.iter().map(|a| (a.id, a.clone())).collect()
    }

    #[test]
    fn test_weight_validation() {
        assert!(PrioritizationConfig::with_weights(0.2, 0.2, 0.1).is_err());
        assert!(PrioritizationConfig::with_weights(0.4, 0.35, 0.25).is_ok());
        assert!(PrioritizationConfig::with_weights(0.5, 0.3, 0.2).is_ok());
    }

    #[test]
    fn test_time_urgency_buckets() {
        let n = now();
        assert_eq!(time_urgency(Some(n - Duration::minutes(10)), n), 1.0);
        assert_eq!(time_urgency(Some(n - Duration::minutes(45)), n), 0.9);
        assert_eq!(time_urgency(Some(n - Duration::minutes(90)), n), 0.8);
        assert_eq!(time_urgency(Some(n - Duration::hours(4)), n), 0.6);
        assert_eq!(time_urgency(Some(n - Duration::hours(12)), n), 0.3);
        assert_eq!(time_urgency(Some(n - Duration::hours(48)), n), 0.1);
        assert_eq!(time_urgency(None, n), 0.1);
    }

    #[test]
    fn test_source_velocity_buckets() {
        let n = now();
        let spread = |mins: i64| vec![n - Duration::minutes(mins), n];
        assert_eq!(source_velocity(&spread(20), 30.0), 1.0);
        assert_eq!(source_velocity(&spread(60), 30.0), 0.8);
        assert_eq!(source_velocity(&spread(120), 30.0), 0.6);
        assert_eq!(source_velocity(&spread(300), 30.0), 0.4);
        assert_eq!(source_velocity(&spread(500), 30.0), 0.2);
        // single timestamp: neutral
        assert_eq!(source_velocity(&[n], 30.0), 0.5);
        assert_eq!(source_velocity(&[], 30.0), 0.5);
    }

    #[test]
    fn test_urgency_bonus_steps() {
        assert_eq!(urgency_bonus(0), 0.0);
        assert_eq!(urgency_bonus(1), 0.1);
        assert_eq!(urgency_bonus(2), 0.2);
        assert_eq!(urgency_bonus(3), 0.3);
        assert_eq!(urgency_bonus(7), 0.3);
    }

    #[test]
    fn test_geographic_scope_tiers() {
        let mk = |title: &str| article(1, title, "ABC News", String::new());
        let a = mk("Global markets rattled by world trade dispute");
        assert_eq!(geographic_scope(&[&a]), "international");
        let b = mk("Parliament passes federal housing bill");
        assert_eq!(geographic_scope(&[&b]), "national");
        let c = mk("Queensland floods close schools");
        assert_eq!(geographic_scope(&[&c]), "state");
        let d = mk("Council approves bridge repairs");
        assert_eq!(geographic_scope(&[&d]), "local");
        // international outranks state when both match
        let e = mk("Queensland exporter hit by china tariffs");
        assert_eq!(geographic_scope(&[&e]), "international");
    }

    #[test]
    fn test_content_depth_clamped_mean() {
        let mut short = article(1, "t", "ABC News", String::new());
        short.content = "x".repeat(100); // below min -> 0.0
        let mut long = article(2, "t", "Guardian", String::new());
        long.content = "x".repeat(5000); // above max -> 1.0
        let depth = content_depth(&[&short, &long], 200, 2000);
        assert!((depth - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_classification_confidence_no_signal() {
        let mut a = article(1, "t", "ABC News", String::new());
        a.classification_confidence = None;
        let mut b = article(2, "t", "Guardian", String::new());
        b.classification_confidence = None;
        assert_eq!(avg_classification_confidence(&[&a, &b]), 0.0);

        b.classification_confidence = Some(0.9);
        // only articles carrying a signal enter the mean
        assert!((avg_classification_confidence(&[&a, &b]) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_source_credibility_default() {
        let table = default_source_credibility();
        let sources: BTreeSet<String> =
            ["ABC News", "Unknown Outlet"].iter().map(|s| s.to_string()).collect();
        let c = source_credibility(&sources, &table, 0.6);
        assert!((c - (0.95 + 0.6) / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_cyclone_breaking_scenario() {
        // Two sources, one hour apart, latest 30 minutes ago.
        let n = now();
        let a = article(
            1,
            "Cyclone hits Queensland coast",
            "ABC News",
            (n - Duration::minutes(90)).to_rfc3339(),
        );
        let b = article(
            2,
            "Cyclone hits Queensland coast",
            "Guardian",
            (n - Duration::minutes(30)).to_rfc3339(),
        );
        let articles = vec![a, b];
        let cluster = cluster_of(&articles, 0.95);
        let members: Vec<&Article> = articles.iter().collect();
        let metrics = score_cluster(&cluster, &members, &PrioritizationConfig::default(), n);

        assert!(metrics.time_urgency >= 0.9, "urgency={}", metrics.time_urgency);
        // 60-minute spread lands in the <=60min velocity bucket
        assert_eq!(metrics.source_velocity, 0.8);
        assert!(metrics.breaking_score > 0.8, "breaking={}", metrics.breaking_score);
    }

    #[test]
    fn test_prioritize_sorted_descending() {
        let n = now();
        // fresh two-source story
        let fresh: Vec<Article> = vec![
            article(1, "Cyclone hits coast", "ABC News", (n - Duration::minutes(20)).to_rfc3339()),
            article(2, "Cyclone hits coast", "Guardian", (n - Duration::minutes(10)).to_rfc3339()),
        ];
        // stale singleton
        let stale = vec![article(
            3,
            "Old council story",
            "News.com.au",
            (n - Duration::hours(40)).to_rfc3339(),
        )];

        let mut c1 = cluster_of(&fresh, 0.9);
        c1.cluster_id = "fresh".into();
        let mut c2 = cluster_of(&stale, 0.0);
        c2.cluster_id = "stale".into();

        let mut all = fresh.clone();
        all.extend(stale.clone());
        let lookup = lookup_of(&all);

        // stale first in input; ranking must put fresh on top
        let stories = prioritize(
            &[c2, c1],
            &lookup,
            &PrioritizationConfig::default(),
            n,
        );
        assert_eq!(stories.len(), 2);
        assert_eq!(stories[0].story_id, "fresh");
        for pair in stories.windows(2) {
            assert!(pair[0].metrics.overall_score >= pair[1].metrics.overall_score);
        }
    }

    #[test]
    fn test_missing_representative_skipped() {
        let n = now();
        let a = article(1, "Cyclone hits coast", "ABC News", n.to_rfc3339());
        let mut cluster = cluster_of(std::slice::from_ref(&a), 0.0);
        cluster.representative_article_id = 999;

        let lookup = lookup_of(&[a]);
        let stories = prioritize(&[cluster], &lookup, &PrioritizationConfig::default(), n);
        assert!(stories.is_empty());
    }

    #[test]
    fn test_top_stories_truncates() {
        let n = now();
        let articles: Vec<Article> = (1..=5)
            .map(|id| {
                article(
                    id,
                    &format!("story {}", id),
                    &format!("source {}", id),
                    n.to_rfc3339(),
                )
            })
            .collect();
        let clusters: Vec<ArticleCluster> = articles
            .iter()
            .map(|a| cluster_of(std::slice::from_ref(a), 0.0))
            .collect();
        let lookup = lookup_of(&articles);
        let top = top_stories(&clusters, &lookup, &PrioritizationConfig::default(), n, 3);
        assert_eq!(top.len(), 3);
    }

    #[test]
    fn test_source_stats() {
        let n = now();
        let shared: Vec<Article> = vec![
            article(1, "Cyclone hits coast", "ABC News", (n - Duration::minutes(10)).to_rfc3339()),
            article(2, "Cyclone hits coast", "Guardian", (n - Duration::minutes(5)).to_rfc3339()),
        ];
        let solo = vec![article(3, "Rates on hold", "ABC News", n.to_rfc3339())];

        let clusters = vec![cluster_of(&shared, 0.9), cluster_of(&solo, 0.0)];
        let mut all = shared.clone();
        all.extend(solo.clone());
        let stories = prioritize(
            &clusters,
            &lookup_of(&all),
            &PrioritizationConfig::default(),
            n,
        );

        let stats = source_stats(&stories);
        let abc = stats.iter().find(|s| s.source_name == "ABC News").unwrap();
        assert_eq!(abc.stories_participated, 2);
        let guardian = stats.iter().find(|s| s.source_name == "Guardian").unwrap();
        assert_eq!(guardian.stories_participated, 1);
        // sorted by participation
        assert_eq!(stats[0].source_name, "ABC News");
    }
}
