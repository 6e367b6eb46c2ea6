pub mod sentences;

use serde::{Deserialize, Serialize};

/// Lowest story difficulty accepted by the generator.
pub const MIN_LEVEL: u8 = 1;
/// Highest story difficulty accepted by the generator.
pub const MAX_LEVEL: u8 = 10;

#[derive(
    Clone,
    Copy,
    Debug,
    Serialize,
    Deserialize,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    schemars::JsonSchema,
    tsify::Tsify,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum Gender {
    Masculine,
    Feminine,
    NotApplicable,
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let word = match self {
            Gender::Masculine => "masculine",
            Gender::Feminine => "feminine",
            Gender::NotApplicable => "n/a",
        };
        write!(f, "{word}")
    }
}

/// One content word of an analyzed sentence. Proper nouns and punctuation
/// are never included.
#[derive(
    Clone,
    Debug,
    Serialize,
    Deserialize,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    schemars::JsonSchema,
    tsify::Tsify,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyItem {
    /// Surface form exactly as it appears in the sentence.
    pub term: String,
    /// Dictionary form: infinitive for verbs, singular for nouns.
    pub lemma: String,
    pub part_of_speech: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    pub definition: String,
    /// Only present when the target language is Chinese.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinyin: Option<String>,
}

#[derive(
    Clone,
    Debug,
    Serialize,
    Deserialize,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    schemars::JsonSchema,
    tsify::Tsify,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct GrammarItem {
    pub topic: String,
    pub explanation: String,
}

/// Schema-validated analysis of a single sentence. Arrives from the model
/// already shape-checked; a response missing any required field fails the
/// whole call.
#[derive(
    Clone,
    Debug,
    Serialize,
    Deserialize,
    Eq,
    PartialEq,
    schemars::JsonSchema,
    tsify::Tsify,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct SentenceAnalysis {
    /// Bilingual gloss, "한국어 번역 (English translation)".
    pub translation: String,
    pub vocabulary: Vec<VocabularyItem>,
    #[serde(default)]
    pub grammar: Vec<GrammarItem>,
}

#[derive(Clone, Debug, Serialize, Deserialize, schemars::JsonSchema, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct AnalyzeSentenceRequest {
    pub sentence: String,
    /// Free-form label understood by the model, e.g. "Spanish".
    pub language: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, schemars::JsonSchema, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct GenerateStoryRequest {
    pub topic: String,
    pub language: String,
    /// Vocabulary difficulty, `MIN_LEVEL..=MAX_LEVEL`.
    pub level: u8,
}

#[derive(Clone, Debug, Serialize, Deserialize, schemars::JsonSchema, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct GenerateStoryResponse {
    pub title: String,
    pub paragraphs: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, schemars::JsonSchema, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct ContinueStoryRequest {
    pub topic: String,
    pub language: String,
    pub level: u8,
    /// Paragraphs written so far, oldest first.
    pub lessons: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, schemars::JsonSchema, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct ContinueStoryResponse {
    pub paragraph: String,
}
