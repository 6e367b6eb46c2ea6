use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::word_bank::WordBankItem;

/// A quiz needs at least this many distinct saved items.
pub const MIN_WORDS_FOR_QUIZ: usize = 4;
pub const OPTIONS_PER_QUESTION: usize = 4;

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum QuizError {
    #[error("퀴즈를 생성하려면 단어장에 최소 {required}개의 항목이 필요합니다. 현재 {have}개가 있습니다.")]
    NotEnoughWords { have: usize, required: usize },
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    /// The saved term the learner is being asked about.
    pub prompt: String,
    /// Exactly [`OPTIONS_PER_QUESTION`] choices, one of which equals
    /// `correct_answer`.
    pub options: Vec<String>,
    pub correct_answer: String,
}

/// A running multiple-choice session over the word bank.
///
/// The first answer to a question is final; advancing past the last
/// question finishes the quiz.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    questions: Vec<QuizQuestion>,
    current_question_index: usize,
    score: usize,
    is_answered: bool,
    finished: bool,
}

/// Build one question per bank item, in a seeded-shuffled order.
///
/// The seed makes the quiz reproducible, the way sampling is done elsewhere
/// in the app; callers pass the current time for an everyday run.
pub fn build_questions(
    bank: &[WordBankItem],
    seed: u64,
) -> Result<Vec<QuizQuestion>, QuizError> {
    if bank.len() < MIN_WORDS_FOR_QUIZ {
        return Err(QuizError::NotEnoughWords {
            have: bank.len(),
            required: MIN_WORDS_FOR_QUIZ,
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut order: Vec<&WordBankItem> = bank.iter().collect();
    order.shuffle(&mut rng);

    let questions = order
        .iter()
        .map(|item| {
            let correct_answer = item.definition.clone();

            // Distractors come from other entries' definitions; anything
            // equal to the correct answer would make the question ambiguous
            let mut candidates: Vec<&str> = order
                .iter()
                .filter(|other| other.id != item.id && other.definition != item.definition)
                .map(|other| other.definition.as_str())
                .collect();
            candidates.shuffle(&mut rng);

            let mut options: Vec<String> = Vec::with_capacity(OPTIONS_PER_QUESTION);
            for definition in candidates {
                if options.iter().any(|existing| existing == definition) {
                    continue;
                }
                options.push(definition.to_string());
                if options.len() == OPTIONS_PER_QUESTION - 1 {
                    break;
                }
            }
            // Only reachable when the bank barely clears the minimum and
            // definitions collide
            let mut filler = 0;
            while options.len() < OPTIONS_PER_QUESTION - 1 {
                filler += 1;
                options.push(format!("오답 예시 {filler}"));
            }

            options.push(correct_answer.clone());
            options.shuffle(&mut rng);

            QuizQuestion {
                prompt: item.term.clone(),
                options,
                correct_answer,
            }
        })
        .collect();

    Ok(questions)
}

impl Quiz {
    pub fn start(bank: &[WordBankItem], seed: u64) -> Result<Self, QuizError> {
        Ok(Self {
            questions: build_questions(bank, seed)?,
            current_question_index: 0,
            score: 0,
            is_answered: false,
            finished: false,
        })
    }

    pub fn current_question(&self) -> Option<&QuizQuestion> {
        if self.finished {
            return None;
        }
        self.questions.get(self.current_question_index)
    }

    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn is_answered(&self) -> bool {
        self.is_answered
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Record an answer for the current question. Returns whether it was
    /// correct, or None when the question was already answered (the first
    /// answer is final) or the quiz is over.
    pub fn submit_answer(&mut self, answer: &str) -> Option<bool> {
        if self.finished || self.is_answered {
            return None;
        }
        let question = self.questions.get(self.current_question_index)?;
        let correct = question.correct_answer == answer;
        self.is_answered = true;
        if correct {
            self.score += 1;
        }
        Some(correct)
    }

    /// Move to the next question once the current one is answered;
    /// advancing past the last question finishes the quiz. Returns false
    /// when there was nothing to advance from.
    pub fn advance(&mut self) -> bool {
        if self.finished || !self.is_answered {
            return false;
        }
        if self.current_question_index + 1 < self.questions.len() {
            self.current_question_index += 1;
            self.is_answered = false;
        } else {
            self.finished = true;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word_bank::WordBankItemKind;

    fn bank(definitions: &[(&str, &str)]) -> Vec<WordBankItem> {
        definitions
            .iter()
            .map(|(term, definition)| WordBankItem {
                id: format!("1700000000000-{term}"),
                story_id: "s1".to_string(),
                term: term.to_string(),
                lemma: term.to_string(),
                definition: definition.to_string(),
                kind: WordBankItemKind::Vocabulary,
            })
            .collect()
    }

    fn full_bank() -> Vec<WordBankItem> {
        bank(&[
            ("perro", "개 (dog)"),
            ("gato", "고양이 (cat)"),
            ("casa", "집 (house)"),
            ("hablar", "말하다 (to speak)"),
            ("comer", "먹다 (to eat)"),
            ("libro", "책 (book)"),
        ])
    }

    #[test]
    fn test_too_few_words_names_the_minimum() {
        let items = bank(&[("a", "1"), ("b", "2"), ("c", "3")]);
        assert_eq!(
            build_questions(&items, 7),
            Err(QuizError::NotEnoughWords {
                have: 3,
                required: 4
            })
        );
    }

    #[test]
    fn test_every_question_is_valid() {
        for seed in 0..20 {
            let questions = build_questions(&full_bank(), seed).unwrap();
            assert_eq!(questions.len(), 6);
            for question in &questions {
                assert_eq!(question.options.len(), OPTIONS_PER_QUESTION);
                let matching = question
                    .options
                    .iter()
                    .filter(|option| *option == &question.correct_answer)
                    .count();
                assert_eq!(matching, 1, "seed {seed}: {question:?}");
            }
        }
    }

    #[test]
    fn test_same_seed_same_quiz() {
        let first = build_questions(&full_bank(), 42).unwrap();
        let second = build_questions(&full_bank(), 42).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicate_definitions_are_padded_not_ambiguous() {
        // Four items but only two distinct definitions: each question has
        // one real distractor and needs filler, and the correct answer must
        // still appear exactly once
        let items = bank(&[("a", "같다"), ("b", "같다"), ("c", "다르다"), ("d", "다르다")]);
        let questions = build_questions(&items, 3).unwrap();
        for question in &questions {
            assert_eq!(question.options.len(), OPTIONS_PER_QUESTION);
            let matching = question
                .options
                .iter()
                .filter(|option| *option == &question.correct_answer)
                .count();
            assert_eq!(matching, 1);
            assert!(question.options.iter().any(|o| o.starts_with("오답 예시")));
        }
    }

    #[test]
    fn test_first_answer_is_final() {
        let mut quiz = Quiz::start(&full_bank(), 1).unwrap();
        let correct_answer = quiz.current_question().unwrap().correct_answer.clone();
        assert_eq!(quiz.submit_answer(&correct_answer), Some(true));
        assert_eq!(quiz.score(), 1);
        // A second submission for the same question changes nothing
        assert_eq!(quiz.submit_answer("다른 답"), None);
        assert_eq!(quiz.score(), 1);
    }

    #[test]
    fn test_cannot_advance_before_answering() {
        let mut quiz = Quiz::start(&full_bank(), 1).unwrap();
        assert!(!quiz.advance());
        assert_eq!(quiz.current_question_index(), 0);
    }

    #[test]
    fn test_full_run_reaches_finished_with_score() {
        let mut quiz = Quiz::start(&full_bank(), 9).unwrap();
        let total = quiz.total_questions();
        for _ in 0..total {
            let correct_answer = quiz.current_question().unwrap().correct_answer.clone();
            assert_eq!(quiz.submit_answer(&correct_answer), Some(true));
            assert!(quiz.advance());
        }
        assert!(quiz.is_finished());
        assert!(quiz.current_question().is_none());
        assert_eq!(quiz.score(), total);
        // Nothing moves once finished
        assert_eq!(quiz.submit_answer("답"), None);
        assert!(!quiz.advance());
    }

    #[test]
    fn test_wrong_answer_scores_zero() {
        let mut quiz = Quiz::start(&full_bank(), 5).unwrap();
        let wrong = quiz
            .current_question()
            .unwrap()
            .options
            .iter()
            .find(|option| **option != quiz.current_question().unwrap().correct_answer)
            .unwrap()
            .clone();
        assert_eq!(quiz.submit_answer(&wrong), Some(false));
        assert_eq!(quiz.score(), 0);
    }
}
