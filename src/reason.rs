//! Rule-based recommendation reasons.
//!
//! Assembles a short Japanese explanation of why a result matched: the
//! similarity percentage, query terms found verbatim in the document text,
//! the leading fragrance notes, and the scenes and seasons the perfume is
//! tagged for. Pure string assembly — the generative rewriting of concepts
//! is left to the external text-generation collaborator.

use crate::models::{Perfume, UsageScene};

/// Labels that may leak into a structured query's text; never treated as
/// matchable keywords.
const META_LABELS: [&str; 4] = ["コンセプト:", "性別:", "おすすめの季節:", "使用シーン:"];

/// Generate a recommendation reason for one ranked result.
pub fn recommendation_reason(query: &str, perfume: &Perfume, similarity: f32) -> String {
    let mut reasons: Vec<String> = Vec::new();

    reasons.push(format!(
        "検索条件との一致度は{:.1}%です。",
        similarity * 100.0
    ));

    let matches = find_query_matches(query, &perfume.text);
    if !matches.is_empty() {
        reasons.push(format!(
            "特に「{}」のイメージに合致します。",
            join_with_to(&matches)
        ));
    }

    let notes: Vec<&str> = perfume
        .metadata
        .fragrance_notes
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .take(3)
        .collect();
    if !notes.is_empty() {
        reasons.push(format!("{}などの香りが特徴的です。", join_with_to(&notes)));
    }

    if !perfume.metadata.usage_scenes.is_empty() {
        let scenes: Vec<&str> = perfume
            .metadata
            .usage_scenes
            .iter()
            .map(|s| scene_display(s))
            .collect();
        reasons.push(format!("{}の場面におすすめです。", join_with_to(&scenes)));
    }

    if !perfume.metadata.seasons.is_empty() {
        let seasons: Vec<&str> = perfume.metadata.seasons.iter().map(|s| s.as_str()).collect();
        reasons.push(format!(
            "特に{}の季節におすすめです。",
            join_with_to(&seasons)
        ));
    }

    reasons.join(" ")
}

/// Query keywords that appear verbatim in the document text.
///
/// Single-character keywords are dropped — they match nearly everything in
/// Japanese text.
fn find_query_matches<'a>(query: &'a str, text: &str) -> Vec<&'a str> {
    query
        .split(|c: char| c.is_whitespace() || c == ',' || c == '、')
        .filter(|keyword| {
            keyword.chars().count() > 1
                && !META_LABELS.contains(keyword)
                && text.contains(keyword)
        })
        .collect()
}

/// Convert a stored scene term to its display label, passing unknown terms
/// through unchanged.
fn scene_display(term: &str) -> &str {
    match UsageScene::from_query_term(term) {
        Some(scene) => scene.display(),
        None => term,
    }
}

/// Join items Japanese-style: 「A、Bと C」 reads as "A, B and C".
fn join_with_to<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [init @ .., last] => {
            let head = init
                .iter()
                .map(|s| s.as_ref())
                .collect::<Vec<_>>()
                .join("、");
            format!("{}と{}", head, last.as_ref())
        }
    }
}
