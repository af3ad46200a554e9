//! CLI entry points for search, neighbor lookup, and note comparison.
//!
//! Each `run_*` function builds a [`SearchEngine`] from the configuration,
//! performs one operation, and prints the outcome to stdout. The HTTP
//! server in [`crate::server`] exposes the same operations as JSON.

use anyhow::{bail, Result};

use crate::catalog::load_catalog;
use crate::config::Config;
use crate::embedding::create_embedder;
use crate::index::{PerfumeNotFound, SearchEngine};
use crate::models::{SearchQuery, Season, Sex, UsageScene};
use crate::notes::compare_notes;
use crate::reason::recommendation_reason;

/// Build a search engine from configuration: catalog + embedding backend.
pub fn build_engine(config: &Config) -> Result<SearchEngine> {
    let catalog = load_catalog(&config.catalog.path)?;
    let embedder = create_embedder(&config.embedding)?;
    Ok(SearchEngine::new(
        catalog,
        embedder,
        config.weights.clone(),
    ))
}

/// Parse CLI facet flags into a [`SearchQuery`].
///
/// Facet values use the catalog's Japanese labels (sex, seasons) or the
/// English scene keys; anything unrecognized fails loudly rather than
/// silently weakening the filter.
pub fn parse_query(
    text: &str,
    sex: Option<&str>,
    seasons: &[String],
    scenes: &[String],
) -> Result<SearchQuery> {
    let sex = match sex {
        Some(s) => Some(
            Sex::parse(s).ok_or_else(|| {
                anyhow::anyhow!("unknown sex '{}': use レディース, メンズ, or ユニセックス", s)
            })?,
        ),
        None => None,
    };

    let seasons = seasons
        .iter()
        .map(|s| {
            Season::parse(s)
                .ok_or_else(|| anyhow::anyhow!("unknown season '{}': use 春, 夏, 秋, or 冬", s))
        })
        .collect::<Result<Vec<_>>>()?;

    let usage_scenes = scenes
        .iter()
        .map(|s| {
            UsageScene::parse(s).ok_or_else(|| {
                anyhow::anyhow!("unknown scene '{}': use office, date, daily, party, or relax", s)
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SearchQuery {
        text: text.trim().to_string(),
        sex,
        seasons,
        usage_scenes,
    })
}

/// `kaori search` — rank the catalog against a query and print the top k.
pub async fn run_search(
    config: &Config,
    text: &str,
    sex: Option<String>,
    seasons: Vec<String>,
    scenes: Vec<String>,
    limit: Option<usize>,
) -> Result<()> {
    let query = parse_query(text, sex.as_deref(), &seasons, &scenes)?;
    if query.is_empty() {
        bail!("empty search request: provide text or a facet");
    }

    let engine = build_engine(config)?;
    let k = limit.unwrap_or(config.search.top_k);
    let results = engine.search(&query, k).await?;

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        println!(
            "{}. [{:.3}] {} / {}",
            i + 1,
            result.score,
            result.metadata.brand,
            result.metadata.name_jp
        );
        println!("    id: {}", result.metadata.id);
        println!(
            "    {}",
            recommendation_reason(&query.text, &to_perfume(result), result.score)
        );
        println!();
    }

    Ok(())
}

/// `kaori similar` — print the nearest neighbors of a catalog entry.
pub async fn run_similar(config: &Config, id: &str, limit: Option<usize>) -> Result<()> {
    let engine = build_engine(config)?;
    let limit = limit.unwrap_or(config.search.neighbor_limit);
    let neighbors = engine.neighbors(id, limit).await?;

    if neighbors.is_empty() {
        println!("No neighbors.");
        return Ok(());
    }

    for (i, n) in neighbors.iter().enumerate() {
        println!(
            "{}. [{:.3}] {} / {}",
            i + 1,
            n.score,
            n.metadata.brand,
            n.metadata.name_jp
        );
        println!("    id: {}", n.metadata.id);
    }

    Ok(())
}

/// `kaori notes` — compare an entry's notes against its nearest neighbors.
pub async fn run_notes(config: &Config, id: &str, limit: Option<usize>) -> Result<()> {
    let engine = build_engine(config)?;
    let Some(target) = engine.find(id) else {
        return Err(PerfumeNotFound(id.to_string()).into());
    };
    let target_text = target.text.clone();
    let target_name = target.metadata.name_jp.clone();

    let limit = limit.unwrap_or(config.search.neighbor_limit);
    let neighbors = engine.neighbors(id, limit).await?;
    let neighbor_texts: Vec<&str> = neighbors.iter().map(|n| n.text.as_str()).collect();

    let cmp = compare_notes(&target_text, &neighbor_texts);

    println!("--- {} ---", target_name);
    println!("notes:  {}", cmp.target_notes.join(", "));
    println!("common: {}", cmp.common_notes.join(", "));
    println!("unique: {}", cmp.unique_notes.join(", "));
    println!();
    println!("--- Neighbors ({}) ---", neighbors.len());
    for n in &neighbors {
        println!("[{:.3}] {} / {}", n.score, n.metadata.brand, n.metadata.name_jp);
    }

    Ok(())
}

/// `kaori catalog list` — print every catalog entry.
pub fn run_catalog_list(config: &Config) -> Result<()> {
    let catalog = load_catalog(&config.catalog.path)?;

    println!("{:<40} {:<12} {:<10} NAME", "ID", "SEX", "RATING");
    for p in &catalog {
        println!(
            "{:<40} {:<12} {:<10.1} {}",
            p.metadata.id,
            p.metadata.sex.as_str(),
            p.metadata.rating,
            p.metadata.name_jp
        );
    }
    println!();
    println!("{} entries.", catalog.len());

    Ok(())
}

fn to_perfume(result: &crate::models::SearchResult) -> crate::models::Perfume {
    crate::models::Perfume {
        text: result.text.clone(),
        metadata: result.metadata.clone(),
    }
}
