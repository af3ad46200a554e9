//! Structured-text field parser.
//!
//! Catalog documents and queries are blocks of newline-separated
//! `label: value` lines in a fixed Japanese label vocabulary. This module
//! splits such a block into a total [`FieldMap`] over the closed set of
//! canonical [`FieldTag`]s. Labels are resolved through an explicit lookup
//! table; unrecognized labels are silently dropped so extra metadata lines
//! never break parsing.

/// Canonical semantic fields of a catalog document, in the fixed order used
/// for weighted composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldTag {
    Names,
    Brand,
    Concept,
    Sex,
    Categories,
    NoteTop,
    NoteMiddle,
    NoteLast,
    MoodImage,
    Impression,
    UsageScenes,
    Seasons,
}

impl FieldTag {
    /// All canonical fields in composition order. The order is fixed so two
    /// compositions of the same document are bit-identical, though the
    /// weighted mean itself is order-invariant.
    pub const ALL: [FieldTag; 12] = [
        FieldTag::Names,
        FieldTag::Brand,
        FieldTag::Concept,
        FieldTag::Sex,
        FieldTag::Categories,
        FieldTag::NoteTop,
        FieldTag::NoteMiddle,
        FieldTag::NoteLast,
        FieldTag::MoodImage,
        FieldTag::Impression,
        FieldTag::UsageScenes,
        FieldTag::Seasons,
    ];

    /// Stable key used in the configuration `[weights]` table.
    pub fn key(&self) -> &'static str {
        match self {
            FieldTag::Names => "names",
            FieldTag::Brand => "brand",
            FieldTag::Concept => "concept",
            FieldTag::Sex => "sex",
            FieldTag::Categories => "categories",
            FieldTag::NoteTop => "fragrance_top",
            FieldTag::NoteMiddle => "fragrance_middle",
            FieldTag::NoteLast => "fragrance_last",
            FieldTag::MoodImage => "fragrance_image",
            FieldTag::Impression => "fragrance_impression",
            FieldTag::UsageScenes => "usage_scenes",
            FieldTag::Seasons => "seasons",
        }
    }

    /// Resolve a document label to its canonical field.
    ///
    /// The mood-image and impression fields accept two spellings each: the
    /// short labels and the long forms the data-preparation step historically
    /// emitted. Anything else maps to "ignore".
    pub fn from_label(label: &str) -> Option<FieldTag> {
        match label {
            "名前" => Some(FieldTag::Names),
            "ブランド" => Some(FieldTag::Brand),
            "コンセプト" => Some(FieldTag::Concept),
            "性別" => Some(FieldTag::Sex),
            "カテゴリー" => Some(FieldTag::Categories),
            "トップノート" => Some(FieldTag::NoteTop),
            "ミドルノート" => Some(FieldTag::NoteMiddle),
            "ラストノート" => Some(FieldTag::NoteLast),
            "香りのイメージ" | "香りが演出する雰囲気" => Some(FieldTag::MoodImage),
            "香りの印象" | "実際に感じる印象" => Some(FieldTag::Impression),
            "使用シーン" => Some(FieldTag::UsageScenes),
            "おすすめの季節" => Some(FieldTag::Seasons),
            _ => None,
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

/// A total map from canonical field to extracted text. Absent fields hold
/// the empty string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    values: [String; 12],
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tag: FieldTag) -> &str {
        &self.values[tag.index()]
    }

    pub fn set(&mut self, tag: FieldTag, value: impl Into<String>) {
        self.values[tag.index()] = value.into();
    }

    /// True when every canonical field is empty.
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(|v| v.is_empty())
    }
}

/// Parse a structured text block into a total [`FieldMap`].
///
/// Each line is split on its first colon (ASCII `:` or full-width `：`);
/// the value may contain further colons. Both sides are trimmed. Lines
/// without a colon, or with an unrecognized label, are skipped without
/// error. When a label repeats, the last occurrence wins.
pub fn parse_fields(text: &str) -> FieldMap {
    let mut fields = FieldMap::new();

    for line in text.lines() {
        let Some((label, value)) = split_first_colon(line) else {
            continue;
        };
        if let Some(tag) = FieldTag::from_label(label.trim()) {
            fields.set(tag, value.trim());
        }
    }

    fields
}

fn split_first_colon(line: &str) -> Option<(&str, &str)> {
    let idx = line.find([':', '：'])?;
    let value_start = idx + line[idx..].chars().next().map_or(1, |c| c.len_utf8());
    Some((&line[..idx], &line[value_start..]))
}
