//! Catalog loading and preparation.
//!
//! The engine consumes a processed catalog: a JSON array of `{text, metadata}`
//! entries where `text` is the structured `label: value` block the field
//! parser understands. `prepare_catalog` produces that file from the raw
//! perfume records (nested names, array-valued descriptive fields, tiered
//! notes), deriving a stable id from the brand and English name.
//!
//! The catalog is loaded once and treated as immutable for the process
//! lifetime; there is no persistence layer behind it.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::models::{Perfume, PerfumeMetadata, Season, Sex};

/// Load a processed catalog file.
///
/// Fails on unreadable/unparseable files and on duplicate ids — the id is
/// the key of the embedding store, so collisions would silently drop
/// vectors.
pub fn load_catalog(path: &Path) -> Result<Vec<Perfume>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;

    let catalog: Vec<Perfume> =
        serde_json::from_str(&content).with_context(|| "Failed to parse catalog JSON")?;

    let mut seen = HashSet::new();
    for perfume in &catalog {
        if !seen.insert(perfume.metadata.id.as_str()) {
            bail!("duplicate catalog id: {}", perfume.metadata.id);
        }
    }

    Ok(catalog)
}

// ============ Raw catalog preparation ============

/// A raw perfume record as curated upstream, before processing.
#[derive(Debug, Deserialize)]
pub struct RawPerfume {
    pub names: RawNames,
    pub brand: String,
    #[serde(default)]
    pub concept: String,
    pub sex: Sex,
    #[serde(default)]
    pub categories: OneOrMany,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub fragrance_notes: RawNotes,
    #[serde(default)]
    pub fragrance_image: OneOrMany,
    #[serde(default)]
    pub fragrance_impression: OneOrMany,
    #[serde(default)]
    pub usage_scenes: OneOrMany,
    #[serde(default)]
    pub seasons: Vec<Season>,
}

#[derive(Debug, Deserialize)]
pub struct RawNames {
    pub japanese: String,
    pub english: String,
}

/// Tiered note lists as curated in the raw data.
#[derive(Debug, Default, Deserialize)]
pub struct RawNotes {
    #[serde(default)]
    pub top: Vec<String>,
    #[serde(default)]
    pub middle: Vec<String>,
    #[serde(default)]
    pub last: Vec<String>,
}

/// The raw data is inconsistent about single values versus arrays; both
/// shapes deserialize to a joined string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl Default for OneOrMany {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl OneOrMany {
    fn join(&self) -> String {
        match self {
            OneOrMany::One(s) => s.clone(),
            OneOrMany::Many(items) => items.join(", "),
        }
    }

    fn to_vec(&self) -> Vec<String> {
        match self {
            OneOrMany::One(s) if s.is_empty() => Vec::new(),
            OneOrMany::One(s) => vec![s.clone()],
            OneOrMany::Many(items) => items.clone(),
        }
    }
}

/// Convert a raw catalog file into the processed `{text, metadata}` form.
///
/// Returns the number of entries written.
pub fn prepare_catalog(input: &Path, output: &Path) -> Result<usize> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read raw catalog: {}", input.display()))?;
    let raw: Vec<RawPerfume> =
        serde_json::from_str(&content).with_context(|| "Failed to parse raw catalog JSON")?;

    let processed: Vec<Perfume> = raw.iter().map(process_perfume).collect();

    let mut seen = HashSet::new();
    for perfume in &processed {
        if !seen.insert(perfume.metadata.id.as_str()) {
            bail!(
                "duplicate catalog id after preparation: {}",
                perfume.metadata.id
            );
        }
    }

    let json = serde_json::to_string_pretty(&processed)?;
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, json)
        .with_context(|| format!("Failed to write catalog: {}", output.display()))?;

    Ok(processed.len())
}

/// Convert one raw record into its processed form.
pub fn process_perfume(raw: &RawPerfume) -> Perfume {
    let seasons_text = raw
        .seasons
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let text = format!(
        "名前: {}\n\
         ブランド: {}\n\
         コンセプト: {}\n\
         性別: {}\n\
         カテゴリー: {}\n\
         トップノート: {}\n\
         ミドルノート: {}\n\
         ラストノート: {}\n\
         香りのイメージ: {}\n\
         香りの印象: {}\n\
         使用シーン: {}\n\
         おすすめの季節: {}",
        raw.names.japanese,
        raw.brand,
        raw.concept,
        raw.sex.as_str(),
        raw.categories.join(),
        raw.fragrance_notes.top.join(", "),
        raw.fragrance_notes.middle.join(", "),
        raw.fragrance_notes.last.join(", "),
        raw.fragrance_image.join(),
        raw.fragrance_impression.join(),
        raw.usage_scenes.join(),
        seasons_text,
    );

    let mut fragrance_notes = Vec::new();
    fragrance_notes.extend(raw.fragrance_notes.top.iter().cloned());
    fragrance_notes.extend(raw.fragrance_notes.middle.iter().cloned());
    fragrance_notes.extend(raw.fragrance_notes.last.iter().cloned());

    Perfume {
        text,
        metadata: PerfumeMetadata {
            id: slug_id(&raw.brand, &raw.names.english),
            name_jp: raw.names.japanese.clone(),
            name_en: raw.names.english.clone(),
            brand: raw.brand.clone(),
            sex: raw.sex,
            categories: raw.categories.to_vec(),
            rating: raw.rating,
            seasons: raw.seasons.clone(),
            usage_scenes: raw.usage_scenes.to_vec(),
            fragrance_notes,
        },
    }
}

/// Derive the stable catalog id: lowercased brand and English name with
/// non-alphanumeric runs collapsed to single hyphens. Alphanumeric is the
/// Unicode property, not ASCII — Japanese brand names must survive into
/// the id or distinct brands sharing an English product name would
/// collide.
fn slug_id(brand: &str, name_en: &str) -> String {
    let raw = format!("{}-{}", brand.to_lowercase(), name_en.to_lowercase());
    let mut slug = String::with_capacity(raw.len());
    let mut last_hyphen = true;
    for c in raw.chars() {
        if c.is_alphanumeric() {
            slug.push(c);
            last_hyphen = false;
        } else if !last_hyphen {
            slug.push('-');
            last_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{parse_fields, FieldTag};
    use std::io::Write;

    fn sample_raw() -> RawPerfume {
        RawPerfume {
            names: RawNames {
                japanese: "ソヴァージュ".to_string(),
                english: "Sauvage Eau de Toilette".to_string(),
            },
            brand: "Dior".to_string(),
            concept: "広大な砂漠の夜明け".to_string(),
            sex: Sex::Mens,
            categories: OneOrMany::Many(vec!["フゼア".to_string(), "フレッシュ".to_string()]),
            rating: 4.4,
            fragrance_notes: RawNotes {
                top: vec!["ベルガモット".to_string()],
                middle: vec!["ペッパー".to_string(), "ラベンダー".to_string()],
                last: vec!["アンブロクサン".to_string()],
            },
            fragrance_image: OneOrMany::Many(vec!["ワイルド".to_string()]),
            fragrance_impression: OneOrMany::One("力強い".to_string()),
            usage_scenes: OneOrMany::Many(vec!["オフィス".to_string(), "デート".to_string()]),
            seasons: vec![Season::Spring, Season::Summer],
        }
    }

    #[test]
    fn test_slug_id() {
        assert_eq!(
            slug_id("Dior", "Sauvage Eau de Toilette"),
            "dior-sauvage-eau-de-toilette"
        );
        assert_eq!(slug_id("Jo Malone", "Wood Sage & Sea Salt!"), "jo-malone-wood-sage-sea-salt");
    }

    #[test]
    fn test_slug_id_keeps_non_ascii_brands_distinct() {
        let a = slug_id("資生堂", "Ever Bloom");
        let b = slug_id("花王", "Ever Bloom");
        assert_eq!(a, "資生堂-ever-bloom");
        assert_eq!(b, "花王-ever-bloom");
        assert_ne!(a, b);
    }

    #[test]
    fn test_prepare_rejects_colliding_ids() {
        let raw_json = r#"[
            {
                "names": { "japanese": "エバーブルーム", "english": "Ever Bloom" },
                "brand": "SHISEIDO",
                "sex": "レディース"
            },
            {
                "names": { "japanese": "エヴァーブルーム", "english": "Ever Bloom" },
                "brand": "SHISEIDO",
                "sex": "レディース"
            }
        ]"#;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("raw.json");
        let output = dir.path().join("processed.json");
        std::fs::write(&input, raw_json).unwrap();

        let err = prepare_catalog(&input, &output).unwrap_err();
        assert!(err.to_string().contains("duplicate catalog id"));
        assert!(!output.exists());
    }

    #[test]
    fn test_processed_text_parses_back() {
        let perfume = process_perfume(&sample_raw());
        let fields = parse_fields(&perfume.text);

        assert_eq!(fields.get(FieldTag::Names), "ソヴァージュ");
        assert_eq!(fields.get(FieldTag::Brand), "Dior");
        assert_eq!(fields.get(FieldTag::Concept), "広大な砂漠の夜明け");
        assert_eq!(fields.get(FieldTag::NoteMiddle), "ペッパー, ラベンダー");
        assert_eq!(fields.get(FieldTag::MoodImage), "ワイルド");
        assert_eq!(fields.get(FieldTag::Seasons), "春, 夏");
    }

    #[test]
    fn test_metadata_notes_concatenated_in_tier_order() {
        let perfume = process_perfume(&sample_raw());
        assert_eq!(
            perfume.metadata.fragrance_notes,
            vec!["ベルガモット", "ペッパー", "ラベンダー", "アンブロクサン"]
        );
    }

    #[test]
    fn test_load_catalog_rejects_duplicate_ids() {
        let perfume = process_perfume(&sample_raw());
        let json = serde_json::to_string(&vec![perfume.clone(), perfume]).unwrap();
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(json.as_bytes()).unwrap();

        let err = load_catalog(f.path()).unwrap_err();
        assert!(err.to_string().contains("duplicate catalog id"));
    }

    #[test]
    fn test_prepare_and_load_roundtrip() {
        let raw_json = r#"[
            {
                "names": { "japanese": "サボン", "english": "Savon" },
                "brand": "SHIRO",
                "concept": "洗いたてのシャツ",
                "sex": "ユニセックス",
                "categories": "ソープ",
                "rating": 4.1,
                "fragrance_notes": {
                    "top": ["レモン", "オレンジ"],
                    "middle": ["ローズ"],
                    "last": ["ムスク"]
                },
                "fragrance_image": ["清潔感"],
                "fragrance_impression": ["優しい"],
                "usage_scenes": ["デイリー"],
                "seasons": ["春", "夏", "秋", "冬"]
            }
        ]"#;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("raw.json");
        let output = dir.path().join("processed.json");
        std::fs::write(&input, raw_json).unwrap();

        let count = prepare_catalog(&input, &output).unwrap();
        assert_eq!(count, 1);

        let catalog = load_catalog(&output).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].metadata.id, "shiro-savon");
        assert_eq!(catalog[0].metadata.sex, Sex::Unisex);
        assert_eq!(catalog[0].metadata.seasons.len(), 4);
        assert!(catalog[0].text.contains("トップノート: レモン, オレンジ"));
    }
}
