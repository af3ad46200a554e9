//! Vector index and ranking engine.
//!
//! [`SearchEngine`] owns the immutable catalog, the embedding backend, and
//! a lazily built [`VectorIndex`] mapping catalog id → composed document
//! vector. The index is built exactly once per process: the build runs
//! behind a `tokio::sync::OnceCell`, so concurrent first searches wait for
//! a single initialization instead of racing to duplicate it. A failed
//! build leaves the cell empty, letting a later request retry after a
//! provider outage.
//!
//! Ranking is exhaustive cosine similarity over the cached vectors with
//! hard categorical filters applied before sorting. The sort is stable, so
//! score ties keep catalog order.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::compose::compose_fields;
use crate::config::WeightsConfig;
use crate::embedding::{cosine_similarity, TextEmbedder};
use crate::fields::{parse_fields, FieldMap, FieldTag};
use crate::models::{Perfume, SearchQuery, SearchResult};

/// Lookup failure for a catalog id. Typed so callers can map it to a 404
/// by downcast instead of matching on the message text.
#[derive(Debug, Error)]
#[error("perfume not found: {0}")]
pub struct PerfumeNotFound(pub String);

/// Id-keyed composed document vectors, built once from the full catalog.
pub struct VectorIndex {
    by_id: HashMap<String, Vec<f32>>,
}

impl VectorIndex {
    pub fn get(&self, id: &str) -> Option<&[f32]> {
        self.by_id.get(id).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// The ranking service: catalog + embedder + once-built vector index.
pub struct SearchEngine {
    catalog: Vec<Perfume>,
    embedder: Arc<dyn TextEmbedder>,
    weights: WeightsConfig,
    index: OnceCell<VectorIndex>,
}

impl SearchEngine {
    pub fn new(
        catalog: Vec<Perfume>,
        embedder: Arc<dyn TextEmbedder>,
        weights: WeightsConfig,
    ) -> Self {
        Self {
            catalog,
            embedder,
            weights,
            index: OnceCell::new(),
        }
    }

    pub fn catalog(&self) -> &[Perfume] {
        &self.catalog
    }

    /// Look up a catalog entry by id.
    pub fn find(&self, id: &str) -> Option<&Perfume> {
        self.catalog.iter().find(|p| p.metadata.id == id)
    }

    /// Return the vector index, building it on first use.
    ///
    /// Building embeds every catalog document, so the first call is slow
    /// and every later call is a cache hit. Concurrent callers share one
    /// build.
    pub async fn index(&self) -> Result<&VectorIndex> {
        self.index.get_or_try_init(|| self.build_index()).await
    }

    async fn build_index(&self) -> Result<VectorIndex> {
        tracing::info!(catalog_size = self.catalog.len(), "building vector index");

        let mut by_id = HashMap::with_capacity(self.catalog.len());
        for perfume in &self.catalog {
            let fields = parse_fields(&perfume.text);
            let vector = compose_fields(self.embedder.as_ref(), &self.weights, &fields).await?;
            tracing::debug!(
                id = %perfume.metadata.id,
                dims = vector.len(),
                "composed document vector"
            );
            by_id.insert(perfume.metadata.id.clone(), vector);
        }

        tracing::info!(vectors = by_id.len(), "vector index ready");
        Ok(VectorIndex { by_id })
    }

    /// Rank the catalog against a query and return the top `k` results.
    ///
    /// The query's free text is composed as its concept field, with the
    /// structured facets folded into their own fields. Hard filters (sex
    /// exact match, seasons superset) exclude candidates before ranking.
    /// Fewer than `k` survivors — or none — is a valid outcome, not an
    /// error.
    pub async fn search(&self, query: &SearchQuery, k: usize) -> Result<Vec<SearchResult>> {
        let index = self.index().await?;

        let fields = query_fields(query);
        let query_vec = compose_fields(self.embedder.as_ref(), &self.weights, &fields).await?;

        let mut results: Vec<SearchResult> = self
            .catalog
            .iter()
            .filter(|p| {
                if let Some(sex) = query.sex {
                    if p.metadata.sex != sex {
                        return false;
                    }
                }
                // The document must support every requested season, not
                // merely one.
                query
                    .seasons
                    .iter()
                    .all(|s| p.metadata.seasons.contains(s))
            })
            .map(|p| {
                let score = index
                    .get(&p.metadata.id)
                    .map(|v| cosine_similarity(&query_vec, v))
                    .unwrap_or(0.0);
                SearchResult {
                    text: p.text.clone(),
                    metadata: p.metadata.clone(),
                    score,
                }
            })
            .collect();

        sort_by_score(&mut results);
        results.truncate(k);
        Ok(results)
    }

    /// Return the `limit` nearest neighbors of a catalog entry.
    ///
    /// Uses the target's own stored vector as the query, applies no
    /// categorical filters, and excludes the target itself by id.
    pub async fn neighbors(&self, id: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let index = self.index().await?;

        let Some(target_vec) = index.get(id) else {
            return Err(PerfumeNotFound(id.to_string()).into());
        };

        let mut results: Vec<SearchResult> = self
            .catalog
            .iter()
            .filter(|p| p.metadata.id != id)
            .map(|p| {
                let score = index
                    .get(&p.metadata.id)
                    .map(|v| cosine_similarity(target_vec, v))
                    .unwrap_or(0.0);
                SearchResult {
                    text: p.text.clone(),
                    metadata: p.metadata.clone(),
                    score,
                }
            })
            .collect();

        sort_by_score(&mut results);
        results.truncate(limit);
        Ok(results)
    }
}

/// Fold a search request into a field map for composition.
fn query_fields(query: &SearchQuery) -> FieldMap {
    let mut fields = FieldMap::new();

    let text = query.text.trim();
    if !text.is_empty() {
        fields.set(FieldTag::Concept, text);
    }
    if let Some(sex) = query.sex {
        fields.set(FieldTag::Sex, sex.as_str());
    }
    if !query.seasons.is_empty() {
        let joined = query
            .seasons
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        fields.set(FieldTag::Seasons, joined);
    }
    if !query.usage_scenes.is_empty() {
        let joined = query
            .usage_scenes
            .iter()
            .map(|s| s.query_term())
            .collect::<Vec<_>>()
            .join(", ");
        fields.set(FieldTag::UsageScenes, joined);
    }

    fields
}

/// Stable descending sort: ties keep catalog order.
fn sort_by_score(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
