//! Weighted field-embedding composer.
//!
//! Turns a parsed [`FieldMap`] into a single document vector: each non-empty
//! field is embedded on its own, scaled by its configured weight, summed,
//! divided by the total weight, and L2-normalized. Embedding fields
//! separately — rather than concatenating the texts first — is what makes
//! the per-field weights meaningful: a tuned weight table can make the
//! concept line count five times as much as the brand line.
//!
//! The weighted mean is commutative, so the output does not depend on the
//! field iteration order; the fixed order in [`FieldTag::ALL`] only makes
//! runs reproducible at the bit level.

use anyhow::Result;

use crate::config::WeightsConfig;
use crate::embedding::{unit_normalize, TextEmbedder};
use crate::fields::{FieldMap, FieldTag};

/// Compose a document vector from its parsed fields.
///
/// Empty fields contribute neither to the vector sum nor to the weight
/// total. If every field is empty, the result is the zero vector (which
/// cosine-scores 0 against anything) — not an error.
///
/// # Errors
///
/// Propagates embedding provider failures unchanged; a failed provider call
/// aborts the whole composition.
pub async fn compose_fields(
    embedder: &dyn TextEmbedder,
    weights: &WeightsConfig,
    fields: &FieldMap,
) -> Result<Vec<f32>> {
    let mut sum: Vec<f32> = Vec::new();
    let mut total_weight = 0.0f32;

    for tag in FieldTag::ALL {
        let text = fields.get(tag);
        if text.trim().is_empty() {
            continue;
        }

        let weight = weights.weight_of(tag);
        let vector = embedder.embed(text).await?;

        if sum.is_empty() {
            sum = vector.iter().map(|v| v * weight).collect();
        } else {
            for (acc, v) in sum.iter_mut().zip(vector.iter()) {
                *acc += v * weight;
            }
        }
        total_weight += weight;
    }

    if total_weight > 0.0 {
        for v in &mut sum {
            *v /= total_weight;
        }
    }

    Ok(unit_normalize(sum))
}
