//! Core data models for the perfume catalog and search pipeline.
//!
//! These types mirror the processed catalog format: each perfume carries a
//! structured text block of `label: value` lines (the input to the field
//! parser and composer) alongside typed metadata used for hard filtering
//! and display.

use serde::{Deserialize, Serialize};

/// A processed catalog entry: structured text plus typed metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Perfume {
    /// Newline-separated `label: value` lines in the fixed label vocabulary.
    pub text: String,
    pub metadata: PerfumeMetadata,
}

/// Typed metadata attached to every catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerfumeMetadata {
    /// Stable unique id, derived from brand + English name at prepare time.
    pub id: String,
    pub name_jp: String,
    pub name_en: String,
    pub brand: String,
    pub sex: Sex,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub seasons: Vec<Season>,
    #[serde(default)]
    pub usage_scenes: Vec<String>,
    /// Ordered note tokens (top, middle, last concatenated at prepare time).
    #[serde(default)]
    pub fragrance_notes: Vec<String>,
}

/// Target demographic. Documents are tagged with exactly one value; the
/// search filter requires an exact match — a unisex document does not match
/// a query for レディース or メンズ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "レディース")]
    Ladies,
    #[serde(rename = "メンズ")]
    Mens,
    #[serde(rename = "ユニセックス")]
    Unisex,
}

impl Sex {
    /// Parse the Japanese label used in catalog data and CLI flags.
    pub fn parse(s: &str) -> Option<Sex> {
        match s.trim() {
            "レディース" => Some(Sex::Ladies),
            "メンズ" => Some(Sex::Mens),
            "ユニセックス" => Some(Sex::Unisex),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Ladies => "レディース",
            Sex::Mens => "メンズ",
            Sex::Unisex => "ユニセックス",
        }
    }
}

/// Recommended season. A document may carry any subset of the four values;
/// the search filter requires the document set to be a superset of the
/// requested set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    #[serde(rename = "春")]
    Spring,
    #[serde(rename = "夏")]
    Summer,
    #[serde(rename = "秋")]
    Autumn,
    #[serde(rename = "冬")]
    Winter,
}

impl Season {
    /// Parse the Japanese label used in catalog data and CLI flags.
    pub fn parse(s: &str) -> Option<Season> {
        match s.trim() {
            "春" => Some(Season::Spring),
            "夏" => Some(Season::Summer),
            "秋" => Some(Season::Autumn),
            "冬" => Some(Season::Winter),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Spring => "春",
            Season::Summer => "夏",
            Season::Autumn => "秋",
            Season::Winter => "冬",
        }
    }
}

/// Usage scene facet. Each scene has three projections, kept from the
/// catalog's scene mapping: the UI label, the term stored in catalog text
/// and metadata, and the phrasing used in recommendation output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageScene {
    Office,
    Date,
    Daily,
    Party,
    Relax,
}

impl UsageScene {
    pub const ALL: [UsageScene; 5] = [
        UsageScene::Office,
        UsageScene::Date,
        UsageScene::Daily,
        UsageScene::Party,
        UsageScene::Relax,
    ];

    /// Short UI label.
    pub fn display(&self) -> &'static str {
        match self {
            UsageScene::Office => "仕事",
            UsageScene::Date => "デート",
            UsageScene::Daily => "日常",
            UsageScene::Party => "パーティー",
            UsageScene::Relax => "くつろぎ",
        }
    }

    /// Term used in catalog text and metadata.
    pub fn query_term(&self) -> &'static str {
        match self {
            UsageScene::Office => "オフィス",
            UsageScene::Date => "デート",
            UsageScene::Daily => "デイリー",
            UsageScene::Party => "パーティー",
            UsageScene::Relax => "リラックス",
        }
    }

    /// Phrasing used when composing a recommendation reason.
    pub fn output(&self) -> &'static str {
        match self {
            UsageScene::Office => "仕事を頑張りたいとき",
            UsageScene::Date => "デートを盛り上げたいとき",
            UsageScene::Daily => "日常のお供に",
            UsageScene::Party => "パーティーやお祝いの場で",
            UsageScene::Relax => "リラックスしたいとき",
        }
    }

    /// Resolve a catalog query term back to its scene, for display mapping.
    pub fn from_query_term(term: &str) -> Option<UsageScene> {
        UsageScene::ALL.into_iter().find(|s| s.query_term() == term)
    }

    /// Parse a CLI flag value: the English key or the catalog query term.
    pub fn parse(s: &str) -> Option<UsageScene> {
        let t = s.trim();
        match t {
            "office" => Some(UsageScene::Office),
            "date" => Some(UsageScene::Date),
            "daily" => Some(UsageScene::Daily),
            "party" => Some(UsageScene::Party),
            "relax" => Some(UsageScene::Relax),
            _ => UsageScene::from_query_term(t),
        }
    }
}

/// A search request: free text plus optional hard facets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub sex: Option<Sex>,
    #[serde(default)]
    pub seasons: Vec<Season>,
    #[serde(default)]
    pub usage_scenes: Vec<UsageScene>,
}

impl SearchQuery {
    /// True when neither free text nor any facet was provided. Callers
    /// reject such requests before they reach the engine.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
            && self.sex.is_none()
            && self.seasons.is_empty()
            && self.usage_scenes.is_empty()
    }
}

/// A ranked search result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub text: String,
    pub metadata: PerfumeMetadata,
    /// Cosine similarity against the query vector, in [-1, 1].
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sex_serializes_as_japanese() {
        let json = serde_json::to_string(&Sex::Ladies).unwrap();
        assert_eq!(json, "\"レディース\"");
        let back: Sex = serde_json::from_str("\"ユニセックス\"").unwrap();
        assert_eq!(back, Sex::Unisex);
    }

    #[test]
    fn test_season_roundtrip() {
        for s in [Season::Spring, Season::Summer, Season::Autumn, Season::Winter] {
            let json = serde_json::to_string(&s).unwrap();
            let back: Season = serde_json::from_str(&json).unwrap();
            assert_eq!(back, s);
            assert!(json.contains(s.as_str()));
        }
    }

    #[test]
    fn test_usage_scene_query_term_roundtrip() {
        for scene in UsageScene::ALL {
            assert_eq!(UsageScene::from_query_term(scene.query_term()), Some(scene));
        }
        assert_eq!(UsageScene::from_query_term("登山"), None);
    }

    #[test]
    fn test_empty_query_detection() {
        let q = SearchQuery::default();
        assert!(q.is_empty());

        let q = SearchQuery {
            text: "   ".to_string(),
            seasons: vec![Season::Summer],
            ..Default::default()
        };
        assert!(!q.is_empty());
    }
}
