#![deny(clippy::string_slice)]

pub mod analysis;
mod api;
pub mod quiz;
pub mod stories;
mod storage;
mod utils;
pub mod word_bank;

use std::cell::RefCell;
use std::sync::LazyLock;

use chrono::Utc;
use opfs::persistent;
use serde::{Deserialize, Serialize};
use story_utils::{
    GenerateStoryRequest, GrammarItem, SentenceAnalysis, VocabularyItem,
    sentences::split_sentences,
};
use story_utils::{ContinueStoryRequest, MAX_LEVEL, MIN_LEVEL};
use wasm_bindgen::prelude::*;

use crate::analysis::{AnalysisCache, AnalysisState, RequestDecision};
use crate::quiz::Quiz;
use crate::stories::{DayAdvance, Story, StoryList};
use crate::storage::Directories;
use crate::word_bank::{AddOutcome, WordBank, WordBankItem};

const STORIES_FILE: &str = "stories.json";
const WORD_BANK_FILE: &str = "word-bank.json";

// putting this inside LOGGER prevents us from accidentally initializing the logger more than once
#[allow(clippy::declare_interior_mutable_const)]
const LOGGER: LazyLock<()> = LazyLock::new(|| {
    utils::set_panic_hook();

    wasm_logger::init(wasm_logger::Config::default());
    log::info!("Logging initialized");
});

/// A user-visible confirmation or notice for a completed action.
#[derive(Clone, Debug, Serialize, Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct Notice {
    pub title: String,
    pub body: String,
}

impl Notice {
    fn new(title: &str, body: String) -> Self {
        Self {
            title: title.to_string(),
            body,
        }
    }
}

/// Renderable view of one sentence's analysis entry.
#[derive(Clone, Debug, Serialize, Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisSnapshot {
    Pending,
    Succeeded { analysis: SentenceAnalysis },
    Failed { message: String },
}

impl From<&AnalysisState> for AnalysisSnapshot {
    fn from(state: &AnalysisState) -> Self {
        match state {
            AnalysisState::Pending { .. } => AnalysisSnapshot::Pending,
            AnalysisState::Succeeded(analysis) => AnalysisSnapshot::Succeeded {
                analysis: analysis.clone(),
            },
            AnalysisState::Failed { message } => AnalysisSnapshot::Failed {
                message: message.clone(),
            },
        }
    }
}

fn story_not_found() -> JsValue {
    JsValue::from_str("이야기를 찾을 수 없습니다. 삭제되었거나 잘못된 주소일 수 있습니다.")
}

#[wasm_bindgen]
pub struct Novela {
    // we never hold a borrow across an .await; that guarantees the absence of "borrow while locked" panics
    stories: RefCell<StoryList>,
    word_bank: RefCell<WordBank>,
    analyses: RefCell<AnalysisCache>,
    quiz: RefCell<Option<Quiz>>,
    directories: Directories,
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
impl Novela {
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(constructor))]
    pub async fn new() -> Result<Novela, persistent::Error> {
        // used to only initialize the logger once
        #[allow(clippy::borrow_interior_mutable_const)]
        *LOGGER;

        let directories = storage::get_directories().await.inspect_err(|e| {
            log::error!("Error getting directories: {e:?}");
        })?;

        let stories = StoryList::from_json_bytes(
            &storage::read_file_bytes(&directories.data_directory_handle, STORIES_FILE)
                .await
                .unwrap_or_default(),
        );
        let word_bank = WordBank::from_json_bytes(
            &storage::read_file_bytes(&directories.data_directory_handle, WORD_BANK_FILE)
                .await
                .unwrap_or_default(),
        );

        Ok(Novela {
            stories: RefCell::new(stories),
            word_bank: RefCell::new(word_bank),
            analyses: RefCell::new(AnalysisCache::default()),
            quiz: RefCell::new(None),
            directories,
        })
    }

    // =======
    // stories

    pub fn get_stories(&self) -> Vec<Story> {
        self.stories.borrow().stories().to_vec()
    }

    pub fn get_story(&self, story_id: String) -> Option<Story> {
        self.stories.borrow().get(&story_id).cloned()
    }

    /// Generate a new story, save it at the front of the list, and return it.
    pub async fn new_story(
        &self,
        topic: String,
        language: String,
        level: u8,
    ) -> Result<Story, JsValue> {
        if topic.trim().is_empty() {
            return Err(JsValue::from_str("이야기 주제를 입력해주세요."));
        }
        if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
            return Err(JsValue::from_str("난이도는 1에서 10 사이여야 합니다."));
        }

        let response = api::generate_story(GenerateStoryRequest {
            topic: topic.clone(),
            language: language.clone(),
            level,
        })
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

        if response.paragraphs.is_empty() {
            return Err(JsValue::from_str(
                "새로운 이야기 생성에 실패했습니다. 다시 시도해주세요.",
            ));
        }

        let story = Story::new(
            &topic,
            &language,
            level,
            response.title,
            response.paragraphs,
            Utc::now().timestamp_millis(),
        );
        self.stories.borrow_mut().add(story.clone());
        self.persist_stories().await?;
        Ok(story)
    }

    pub async fn delete_story(&self, story_id: String) -> Result<Notice, JsValue> {
        let removed = self.stories.borrow_mut().remove(&story_id);
        if !removed {
            return Ok(Notice::new("알림", "이야기를 찾을 수 없습니다.".to_string()));
        }
        self.persist_stories().await?;
        Ok(Notice::new("성공", "이야기를 삭제했습니다.".to_string()))
    }

    /// Sentences of the story's current paragraph, in reading order.
    pub fn current_sentences(&self, story_id: String) -> Result<Vec<String>, JsValue> {
        let stories = self.stories.borrow();
        let story = stories.get(&story_id).ok_or_else(story_not_found)?;
        Ok(split_sentences(story.current_paragraph()))
    }

    pub async fn previous_day(&self, story_id: String) -> Result<Story, JsValue> {
        let moved = {
            let mut stories = self.stories.borrow_mut();
            let story = stories.get_mut(&story_id).ok_or_else(story_not_found)?;
            story.previous_day()
        };
        if moved {
            self.persist_stories().await?;
        }
        self.get_story(story_id).ok_or_else(story_not_found)
    }

    /// Move to the next lesson, generating a new paragraph when the learner
    /// is already on the last one.
    pub async fn next_day(&self, story_id: String) -> Result<Story, JsValue> {
        let continuation_request = {
            let mut stories = self.stories.borrow_mut();
            let story = stories.get_mut(&story_id).ok_or_else(story_not_found)?;
            match story.next_day() {
                DayAdvance::Moved => None,
                DayAdvance::NeedsContinuation => Some(ContinueStoryRequest {
                    topic: story.topic.clone(),
                    language: story.language.clone(),
                    level: story.level,
                    lessons: story.lessons.clone(),
                }),
            }
        };

        if let Some(request) = continuation_request {
            let continuation = api::continue_story(request)
                .await
                .map_err(|e| JsValue::from_str(&e.to_string()))?;
            // The story may have been deleted while the request was in flight
            let mut stories = self.stories.borrow_mut();
            let story = stories.get_mut(&story_id).ok_or_else(story_not_found)?;
            story.push_paragraph(continuation.paragraph);
        }

        self.persist_stories().await?;
        self.get_story(story_id).ok_or_else(story_not_found)
    }

    // =======
    // sentence analysis

    /// Request the analysis of one sentence of the current paragraph.
    ///
    /// Cached and in-flight requests are reused; only a missing or failed
    /// entry costs a network call. The returned snapshot is the entry's
    /// state after this call settles.
    pub async fn analyze_sentence(
        &self,
        paragraph_index: usize,
        sentence: String,
        language: String,
    ) -> Result<AnalysisSnapshot, JsValue> {
        let sentence = sentence.trim().to_string();
        if sentence.is_empty() {
            return Err(JsValue::from_str("분석할 문장이 없습니다."));
        }

        let decision = self
            .analyses
            .borrow_mut()
            .request(paragraph_index, &sentence);

        match decision {
            RequestDecision::Cached(analysis) => Ok(AnalysisSnapshot::Succeeded { analysis }),
            RequestDecision::AlreadyPending => Ok(AnalysisSnapshot::Pending),
            RequestDecision::Dispatch { request_id } => {
                let result = api::analyze_sentence(sentence.clone(), language)
                    .await
                    .map_err(|e| e.to_string());
                let mut analyses = self.analyses.borrow_mut();
                analyses.complete(paragraph_index, &sentence, request_id, result);
                let snapshot = analyses
                    .state(paragraph_index, &sentence)
                    .map(AnalysisSnapshot::from)
                    // the scope was evicted while the call was in flight
                    .unwrap_or(AnalysisSnapshot::Pending);
                Ok(snapshot)
            }
        }
    }

    /// Current state of a sentence's analysis, for rendering; None when it
    /// was never requested.
    pub fn analysis_state(
        &self,
        paragraph_index: usize,
        sentence: String,
    ) -> Option<AnalysisSnapshot> {
        self.analyses
            .borrow()
            .state(paragraph_index, sentence.trim())
            .map(AnalysisSnapshot::from)
    }

    // =======
    // word bank

    pub fn get_word_bank(&self) -> Vec<WordBankItem> {
        self.word_bank.borrow().items().to_vec()
    }

    pub fn word_bank_for_story(&self, story_id: String) -> Vec<WordBankItem> {
        self.word_bank.borrow().for_story(&story_id)
    }

    /// Every saved item across all stories, deduplicated by
    /// `(term, definition)`.
    pub fn all_words(&self) -> Vec<WordBankItem> {
        self.word_bank.borrow().all_deduped()
    }

    pub fn is_word_saved(&self, story_id: String, term: String) -> bool {
        self.word_bank.borrow().contains(&story_id, &term)
    }

    pub async fn add_vocabulary_word(
        &self,
        story_id: String,
        item: VocabularyItem,
    ) -> Result<Option<Notice>, JsValue> {
        let item =
            WordBankItem::from_vocabulary(&story_id, &item, Utc::now().timestamp_millis());
        self.save_word(item).await
    }

    pub async fn add_grammar_point(
        &self,
        story_id: String,
        item: GrammarItem,
    ) -> Result<Option<Notice>, JsValue> {
        let item = WordBankItem::from_grammar(&story_id, &item, Utc::now().timestamp_millis());
        self.save_word(item).await
    }

    pub async fn remove_word(&self, id: String) -> Result<Notice, JsValue> {
        let removed = self.word_bank.borrow_mut().remove_by_id(&id);
        self.removal_notice(removed).await
    }

    pub async fn remove_word_by_term(
        &self,
        story_id: String,
        term: String,
    ) -> Result<Notice, JsValue> {
        let removed = self
            .word_bank
            .borrow_mut()
            .remove_by_term(&story_id, &term);
        self.removal_notice(removed).await
    }

    /// Empty the word bank; a no-op (without a notice) when already empty.
    pub async fn clear_word_bank(&self) -> Result<Option<Notice>, JsValue> {
        let cleared = self.word_bank.borrow_mut().clear();
        if !cleared {
            return Ok(None);
        }
        self.persist_word_bank().await?;
        Ok(Some(Notice::new(
            "단어장 삭제됨",
            "모든 단어를 단어장에서 삭제했습니다.".to_string(),
        )))
    }

    // =======
    // quiz

    /// Start a quiz over one story's saved items, or over the whole bank.
    /// The seed (typically the current time in milliseconds) fixes the
    /// question and option order.
    pub fn start_quiz(&self, story_id: Option<String>, seed: f64) -> Result<Quiz, JsValue> {
        let items = {
            let bank = self.word_bank.borrow();
            match &story_id {
                Some(story_id) => bank.for_story(story_id),
                None => bank.all_deduped(),
            }
        };
        let quiz = Quiz::start(&items, seed as u64)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        *self.quiz.borrow_mut() = Some(quiz.clone());
        Ok(quiz)
    }

    /// Answer the current question. Returns whether it was correct, or None
    /// when there is no quiz, the question was already answered, or the
    /// quiz is finished.
    pub fn submit_answer(&self, answer: String) -> Option<bool> {
        self.quiz.borrow_mut().as_mut()?.submit_answer(&answer)
    }

    /// Advance to the next question (or finish) and return the updated quiz.
    pub fn next_question(&self) -> Option<Quiz> {
        let mut quiz = self.quiz.borrow_mut();
        let quiz = quiz.as_mut()?;
        quiz.advance();
        Some(quiz.clone())
    }

    pub fn quiz_state(&self) -> Option<Quiz> {
        self.quiz.borrow().clone()
    }

    /// Drop the current quiz session, back to idle.
    pub fn end_quiz(&self) {
        *self.quiz.borrow_mut() = None;
    }

    // =======
    // persistence plumbing

    async fn save_word(&self, item: WordBankItem) -> Result<Option<Notice>, JsValue> {
        let lemma = item.lemma.clone();
        match self.word_bank.borrow_mut().add(item) {
            // Adding an already-saved term is a quiet no-op
            AddOutcome::Duplicate => return Ok(None),
            AddOutcome::Added => {}
        }
        self.persist_word_bank().await?;
        Ok(Some(Notice::new(
            "단어장에 추가됨",
            format!("\"{lemma}\"을(를) 단어장에 추가했습니다."),
        )))
    }

    async fn removal_notice(&self, removed: bool) -> Result<Notice, JsValue> {
        if !removed {
            return Ok(Notice::new(
                "알림",
                "단어장에 없는 항목입니다.".to_string(),
            ));
        }
        self.persist_word_bank().await?;
        Ok(Notice::new(
            "단어장에서 삭제됨",
            "항목을 단어장에서 삭제했습니다.".to_string(),
        ))
    }

    /// Write failures surface to the user but do not roll back the
    /// in-memory state; the next successful write reconverges.
    async fn persist_stories(&self) -> Result<(), JsValue> {
        let stories = self.stories.borrow().clone();
        storage::write_json(&self.directories.data_directory_handle, STORIES_FILE, &stories)
            .await
            .map_err(|e| {
                log::error!("Failed to persist stories: {e}");
                JsValue::from_str("이야기 저장에 실패했습니다.")
            })
    }

    async fn persist_word_bank(&self) -> Result<(), JsValue> {
        let word_bank = self.word_bank.borrow().clone();
        storage::write_json(
            &self.directories.data_directory_handle,
            WORD_BANK_FILE,
            &word_bank,
        )
        .await
        .map_err(|e| {
            log::error!("Failed to persist word bank: {e}");
            JsValue::from_str("단어장을 저장하는 데 실패했습니다.")
        })
    }
}
