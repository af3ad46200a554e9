use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::fields::FieldTag;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default)]
    pub search: SearchConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    /// Path to the processed catalog JSON (array of `{text, metadata}`).
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Override the provider endpoint. Defaults to the OpenAI API or the
    /// local Ollama server depending on the provider.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            dims: None,
            endpoint: None,
            max_retries: 5,
            timeout_secs: 30,
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

/// Per-field composition weights.
///
/// Fields absent from the table weight 1.0. The built-in table carries the
/// tuned values: descriptive fields (concept, mood image, impression, usage
/// scenes, categories) dominate identity fields (brand, names, individual
/// note tiers), which matters far more for matching intent than raw text
/// overlap.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(transparent)]
pub struct WeightsConfig {
    overrides: HashMap<String, f32>,
}

impl WeightsConfig {
    /// Resolve the weight for a field: config override first, then the
    /// built-in table, then 1.0.
    pub fn weight_of(&self, tag: FieldTag) -> f32 {
        if let Some(w) = self.overrides.get(tag.key()) {
            return *w;
        }
        match tag {
            FieldTag::Brand => 0.3,
            FieldTag::Names => 0.3,
            FieldTag::Concept => 1.6,
            FieldTag::Categories => 1.2,
            FieldTag::NoteTop => 0.3,
            FieldTag::NoteMiddle => 0.3,
            FieldTag::NoteLast => 0.3,
            FieldTag::MoodImage => 1.5,
            FieldTag::Impression => 1.3,
            FieldTag::UsageScenes => 1.5,
            // sex and seasons carry the implicit default
            FieldTag::Sex | FieldTag::Seasons => 1.0,
        }
    }

    fn validate(&self) -> Result<()> {
        let known: Vec<&str> = FieldTag::ALL.iter().map(|t| t.key()).collect();
        for (key, value) in &self.overrides {
            if !known.contains(&key.as_str()) {
                anyhow::bail!("weights.{} does not name a canonical field", key);
            }
            if *value <= 0.0 || !value.is_finite() {
                anyhow::bail!("weights.{} must be a positive number, got {}", key, value);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Maximum number of search results.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Number of nearest neighbors used for the note comparison.
    #[serde(default = "default_neighbor_limit")]
    pub neighbor_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            neighbor_limit: default_neighbor_limit(),
        }
    }
}

fn default_top_k() -> usize {
    5
}
fn default_neighbor_limit() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    config.weights.validate()?;

    if config.search.top_k < 1 {
        anyhow::bail!("search.top_k must be >= 1");
    }
    if config.search.neighbor_limit < 1 {
        anyhow::bail!("search.neighbor_limit must be >= 1");
    }

    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "ollama" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, or ollama.",
            other
        ),
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_minimal_config_with_defaults() {
        let f = write_config(
            r#"
            [catalog]
            path = "data/processed_perfumes.json"

            [server]
            bind = "127.0.0.1:8700"
            "#,
        );
        let cfg = load_config(f.path()).unwrap();
        assert_eq!(cfg.embedding.provider, "disabled");
        assert_eq!(cfg.search.top_k, 5);
        assert_eq!(cfg.search.neighbor_limit, 3);
    }

    #[test]
    fn test_default_weight_table() {
        let w = WeightsConfig::default();
        assert!((w.weight_of(FieldTag::Concept) - 1.6).abs() < 1e-6);
        assert!((w.weight_of(FieldTag::Brand) - 0.3).abs() < 1e-6);
        // Fields absent from the tuned table weight 1.0
        assert!((w.weight_of(FieldTag::Seasons) - 1.0).abs() < 1e-6);
        assert!((w.weight_of(FieldTag::Sex) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_weight_overrides() {
        let f = write_config(
            r#"
            [catalog]
            path = "data/processed_perfumes.json"

            [weights]
            concept = 2.0

            [server]
            bind = "127.0.0.1:8700"
            "#,
        );
        let cfg = load_config(f.path()).unwrap();
        assert!((cfg.weights.weight_of(FieldTag::Concept) - 2.0).abs() < 1e-6);
        // Other tuned defaults untouched
        assert!((cfg.weights.weight_of(FieldTag::MoodImage) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_unknown_weight_key() {
        let f = write_config(
            r#"
            [catalog]
            path = "data/x.json"

            [weights]
            bouquet = 1.4

            [server]
            bind = "127.0.0.1:8700"
            "#,
        );
        assert!(load_config(f.path()).is_err());
    }

    #[test]
    fn test_rejects_nonpositive_weight() {
        let f = write_config(
            r#"
            [catalog]
            path = "data/x.json"

            [weights]
            concept = 0.0

            [server]
            bind = "127.0.0.1:8700"
            "#,
        );
        assert!(load_config(f.path()).is_err());
    }

    #[test]
    fn test_enabled_provider_requires_model_and_dims() {
        let f = write_config(
            r#"
            [catalog]
            path = "data/x.json"

            [embedding]
            provider = "openai"

            [server]
            bind = "127.0.0.1:8700"
            "#,
        );
        assert!(load_config(f.path()).is_err());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let f = write_config(
            r#"
            [catalog]
            path = "data/x.json"

            [embedding]
            provider = "torch"
            model = "e5-small"
            dims = 384

            [server]
            bind = "127.0.0.1:8700"
            "#,
        );
        assert!(load_config(f.path()).is_err());
    }
}
