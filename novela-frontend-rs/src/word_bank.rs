use serde::{Deserialize, Serialize};
use story_utils::{Gender, GrammarItem, VocabularyItem};

#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, tsify::Tsify,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "lowercase")]
pub enum WordBankItemKind {
    Vocabulary,
    Grammar,
}

/// One saved entry of the learner's word bank. `story_id` records which
/// story the entry was saved from, so deletion never has to guess an owner.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct WordBankItem {
    pub id: String,
    pub story_id: String,
    pub term: String,
    pub lemma: String,
    pub definition: String,
    #[serde(rename = "type")]
    pub kind: WordBankItemKind,
}

impl WordBankItem {
    pub fn from_vocabulary(story_id: &str, item: &VocabularyItem, now_ms: i64) -> Self {
        Self {
            id: format!("{now_ms}-{}", item.term),
            story_id: story_id.to_string(),
            term: item.term.clone(),
            lemma: item.lemma.clone(),
            definition: composed_definition(item),
            kind: WordBankItemKind::Vocabulary,
        }
    }

    pub fn from_grammar(story_id: &str, item: &GrammarItem, now_ms: i64) -> Self {
        Self {
            id: format!("{now_ms}-{}", item.topic),
            story_id: story_id.to_string(),
            term: item.topic.clone(),
            lemma: item.topic.clone(),
            definition: item.explanation.clone(),
            kind: WordBankItemKind::Grammar,
        }
    }
}

/// "<part-of-speech> (<gender>) - <definition>"; the gender is dropped when
/// the language doesn't gender the word.
fn composed_definition(item: &VocabularyItem) -> String {
    match item.gender {
        Some(gender @ (Gender::Masculine | Gender::Feminine)) => {
            format!("{} ({}) - {}", item.part_of_speech, gender, item.definition)
        }
        _ => format!("{} - {}", item.part_of_speech, item.definition),
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AddOutcome {
    Added,
    /// An item with the same term already exists for this story.
    Duplicate,
}

/// The learner's saved vocabulary and grammar, most recently added first.
/// Persisted as a plain JSON array.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(transparent)]
pub struct WordBank {
    items: Vec<WordBankItem>,
}

impl WordBank {
    /// Persisted state is untrusted: anything unreadable is an empty bank,
    /// never an error.
    pub fn from_json_bytes(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Self::default();
        }
        match serde_json::from_slice(bytes) {
            Ok(bank) => bank,
            Err(e) => {
                log::warn!("Discarding unreadable word bank: {e:?}");
                Self::default()
            }
        }
    }

    pub fn items(&self) -> &[WordBankItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Insert at the front; a duplicate `(story_id, term)` is a no-op.
    pub fn add(&mut self, item: WordBankItem) -> AddOutcome {
        if self.contains(&item.story_id, &item.term) {
            return AddOutcome::Duplicate;
        }
        self.items.insert(0, item);
        AddOutcome::Added
    }

    pub fn remove_by_id(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    pub fn remove_by_term(&mut self, story_id: &str, term: &str) -> bool {
        let before = self.items.len();
        self.items
            .retain(|item| !(item.story_id == story_id && item.term == term));
        self.items.len() != before
    }

    pub fn contains(&self, story_id: &str, term: &str) -> bool {
        self.items
            .iter()
            .any(|item| item.story_id == story_id && item.term == term)
    }

    /// Returns true when anything was actually removed.
    pub fn clear(&mut self) -> bool {
        if self.items.is_empty() {
            return false;
        }
        self.items.clear();
        true
    }

    pub fn for_story(&self, story_id: &str) -> Vec<WordBankItem> {
        self.items
            .iter()
            .filter(|item| item.story_id == story_id)
            .cloned()
            .collect()
    }

    /// Union across every story, deduplicated by `(term, definition)` —
    /// saving the same word from two stories shows it once in review mode.
    pub fn all_deduped(&self) -> Vec<WordBankItem> {
        let mut seen = std::collections::BTreeSet::new();
        self.items
            .iter()
            .filter(|item| seen.insert((item.term.clone(), item.definition.clone())))
            .cloned()
            .collect()
    }
}
