//! Note-level comparison between a perfume and its nearest neighbors.
//!
//! Extracts the ordered note set (top, middle, last) from structured text
//! and splits a target's notes into those shared with a candidate pool and
//! those unique to the target. Membership is verbatim string equality —
//! "ベルガモット" and "ベルガモットオイル" are different notes. The output
//! feeds the external recommendation-text collaborator.

use serde::Serialize;
use std::collections::HashSet;

use crate::fields::{parse_fields, FieldTag};

/// Result of comparing a target's notes against a pooled candidate set.
#[derive(Debug, Clone, Serialize)]
pub struct NoteComparison {
    /// Target notes that also appear anywhere in the candidate pool,
    /// in target order, duplicates preserved.
    pub common_notes: Vec<String>,
    /// Target notes absent from the candidate pool, in target order.
    pub unique_notes: Vec<String>,
    /// The target's full note set.
    pub target_notes: Vec<String>,
    /// All candidate notes flattened into one pooled sequence.
    pub candidate_notes: Vec<String>,
}

/// Extract the ordered note set from a document's structured text.
///
/// Notes come from the top, middle, and last note fields, concatenated in
/// that order. Duplicates are preserved; empty and whitespace-only tokens
/// are dropped.
pub fn extract_note_set(text: &str) -> Vec<String> {
    let fields = parse_fields(text);
    let mut notes = Vec::new();

    for tag in [FieldTag::NoteTop, FieldTag::NoteMiddle, FieldTag::NoteLast] {
        for token in fields.get(tag).split([',', '、']) {
            let token = token.trim();
            if !token.is_empty() {
                notes.push(token.to_string());
            }
        }
    }

    notes
}

/// Compare a target document's notes against a set of candidate documents.
pub fn compare_notes(target_text: &str, candidate_texts: &[&str]) -> NoteComparison {
    let target_notes = extract_note_set(target_text);

    let candidate_notes: Vec<String> = candidate_texts
        .iter()
        .flat_map(|text| extract_note_set(text))
        .collect();

    let pool: HashSet<&str> = candidate_notes.iter().map(|n| n.as_str()).collect();

    let mut common_notes = Vec::new();
    let mut unique_notes = Vec::new();
    for note in &target_notes {
        if pool.contains(note.as_str()) {
            common_notes.push(note.clone());
        } else {
            unique_notes.push(note.clone());
        }
    }

    NoteComparison {
        common_notes,
        unique_notes,
        target_notes,
        candidate_notes,
    }
}
