//! Story formation: connected components over the similarity graph.
//!
//! Articles are nodes, filtered similarity results are edges. Components are
//! computed with a union-find rather than greedy pairwise claiming, so a
//! bridge article B links A and C into one story even when the A-C pair was
//! never compared or fell below threshold. Articles with no similar partner
//! come out as valid single-member stories.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};
use xxhash_rust::xxh3::xxh3_64;

use crate::models::{Article, ArticleCluster, SimilarityResult};
use crate::text::parse_published;

/// Strategy for picking a cluster's representative article.
pub trait RepresentativePick {
    fn pick<'a>(&self, members: &[&'a Article]) -> &'a Article;
}

/// Default strategy: deepest content wins, ties broken by most recent
/// publish time, then lowest id for determinism.
#[derive(Debug, Default)]
pub struct ContentDepthPick;

impl RepresentativePick for ContentDepthPick {
    fn pick<'a>(&self, members: &[&'a Article]) -> &'a Article {
        members
            .iter()
            .max_by(|a, b| {
                a.content
                    .chars()
                    .count()
                    .cmp(&b.content.chars().count())
                    .then_with(|| {
                        parse_published(&a.published_at).cmp(&parse_published(&b.published_at))
                    })
                    .then_with(|| b.id.cmp(&a.id))
            })
            .expect("pick called with at least one member")
    }
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // path compression
        let mut cur = x;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}

/// Group `articles` into stories using the filtered similarity edges.
///
/// Every input article lands in exactly one cluster; edges referencing ids
/// outside the batch are skipped with a warning. Output order follows the
/// first appearance of each component in the input article order.
pub fn build_clusters(
    articles: &[Article],
    similarities: &[SimilarityResult],
    picker: &dyn RepresentativePick,
) -> Vec<ArticleCluster> {
    let index_of: HashMap<i64, usize> = articles
        .iter()
        .enumerate()
        .map(|(i, a)| (a.id, i))
        .collect();

    let mut dsu = DisjointSet::new(articles.len());
    for edge in similarities {
        match (index_of.get(&edge.article_id_1), index_of.get(&edge.article_id_2)) {
            (Some(&i), Some(&j)) => dsu.union(i, j),
            _ => warn!(
                "Skipping similarity edge with unknown article id(s): {} - {}",
                edge.article_id_1, edge.article_id_2
            ),
        }
    }

    // root index -> member indices, keyed by first appearance
    let mut components: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    let mut first_seen: Vec<usize> = Vec::new();
    for i in 0..articles.len() {
        let root = dsu.find(i);
        let entry = components.entry(root).or_default();
        if entry.is_empty() {
            first_seen.push(root);
        }
        entry.push(i);
    }

    // cohesion uses every edge inside a component, not just spanning edges
    let mut edge_sums: HashMap<usize, (f32, usize)> = HashMap::new();
    for edge in similarities {
        if let (Some(&i), Some(&j)) = (
            index_of.get(&edge.article_id_1),
            index_of.get(&edge.article_id_2),
        ) {
            let root = dsu.find(i);
            if root == dsu.find(j) {
                let entry = edge_sums.entry(root).or_insert((0.0, 0));
                entry.0 += edge.overall_score;
                entry.1 += 1;
            }
        }
    }

    let clusters: Vec<ArticleCluster> = first_seen
        .into_iter()
        .map(|root| {
            let member_idx = &components[&root];
            let members: Vec<&Article> = member_idx.iter().map(|&i| &articles[i]).collect();

            let member_article_ids: BTreeSet<i64> = members.iter().map(|a| a.id).collect();
            let sources_covered: BTreeSet<String> =
                members.iter().map(|a| a.source.clone()).collect();

            let cohesion_score = match edge_sums.get(&root) {
                Some(&(sum, count)) if count > 0 => sum / count as f32,
                _ => 0.0,
            };

            let representative = picker.pick(&members);

            let seed = member_article_ids
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(",");
            let cluster_id = format!("{:016x}", xxh3_64(seed.as_bytes()));

            ArticleCluster {
                cluster_id,
                member_article_ids,
                representative_article_id: representative.id,
                cohesion_score,
                sources_covered,
            }
        })
        .collect();

    let multi = clusters.iter().filter(|c| c.article_count() > 1).count();
    debug!(
        "Clustering completed - articles={}, clusters={}, multi_article={}, singletons={}",
        articles.len(),
        clusters.len(),
        multi,
        clusters.len() - multi
    );

    clusters
}
