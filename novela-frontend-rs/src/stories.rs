use serde::{Deserialize, Serialize};

/// A generated story. `lessons` holds one paragraph per reading day;
/// `current_day` is the learner's position in it and always stays inside
/// `0..lessons.len()`.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: String,
    pub topic: String,
    pub title: String,
    pub language: String,
    pub level: u8,
    pub lessons: Vec<String>,
    /// Milliseconds since the epoch.
    pub created_at: i64,
    pub current_day: usize,
}

/// Outcome of asking for the next day of a story.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DayAdvance {
    /// The pointer moved to an already-generated lesson.
    Moved,
    /// The learner is on the last lesson; a new paragraph has to be
    /// generated before they can go further.
    NeedsContinuation,
}

impl Story {
    pub fn new(
        topic: &str,
        language: &str,
        level: u8,
        title: String,
        paragraphs: Vec<String>,
        now_ms: i64,
    ) -> Self {
        Self {
            id: format!("{now_ms}-{}", slugify(topic)),
            topic: topic.to_string(),
            title,
            language: language.to_string(),
            level,
            lessons: paragraphs,
            created_at: now_ms,
            current_day: 0,
        }
    }

    pub fn current_paragraph(&self) -> &str {
        self.lessons
            .get(self.current_day)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Returns true when the pointer actually moved.
    pub fn previous_day(&mut self) -> bool {
        if self.current_day > 0 {
            self.current_day -= 1;
            true
        } else {
            false
        }
    }

    pub fn next_day(&mut self) -> DayAdvance {
        if self.current_day + 1 < self.lessons.len() {
            self.current_day += 1;
            DayAdvance::Moved
        } else {
            DayAdvance::NeedsContinuation
        }
    }

    /// Append a freshly generated paragraph and move the pointer to it.
    pub fn push_paragraph(&mut self, paragraph: String) {
        self.lessons.push(paragraph);
        self.current_day = self.lessons.len() - 1;
    }

    /// Re-establish the invariants after loading untrusted state. A story
    /// with no lessons is unreadable and dropped.
    fn sanitized(mut self) -> Option<Self> {
        if self.lessons.is_empty() {
            return None;
        }
        self.current_day = self.current_day.min(self.lessons.len() - 1);
        Some(self)
    }
}

pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c.is_whitespace() || c == '-' || c == '_' {
                Some('-')
            } else {
                None
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// All saved stories, most recently created first. Persisted as a plain
/// JSON array.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(transparent)]
pub struct StoryList {
    stories: Vec<Story>,
}

impl StoryList {
    /// Persisted state is untrusted: unreadable JSON becomes an empty list,
    /// individual stories are sanitized or dropped.
    pub fn from_json_bytes(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Self::default();
        }
        let stories: Vec<Story> = match serde_json::from_slice(bytes) {
            Ok(stories) => stories,
            Err(e) => {
                log::warn!("Discarding unreadable story list: {e:?}");
                return Self::default();
            }
        };
        Self {
            stories: stories.into_iter().filter_map(Story::sanitized).collect(),
        }
    }

    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    pub fn add(&mut self, story: Story) {
        self.stories.insert(0, story);
    }

    pub fn get(&self, id: &str) -> Option<&Story> {
        self.stories.iter().find(|story| story.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Story> {
        self.stories.iter_mut().find(|story| story.id == id)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.stories.len();
        self.stories.retain(|story| story.id != id);
        self.stories.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(lessons: &[&str]) -> Story {
        Story::new(
            "a cat who wants to be a pirate",
            "Spanish",
            3,
            "El gato pirata".to_string(),
            lessons.iter().map(|s| s.to_string()).collect(),
            1700000000000,
        )
    }

    #[test]
    fn test_new_story_starts_on_day_zero() {
        let story = story(&["Primer día.", "Segundo día."]);
        assert_eq!(story.current_day, 0);
        assert_eq!(story.current_paragraph(), "Primer día.");
        assert_eq!(story.id, "1700000000000-a-cat-who-wants-to-be-a-pirate");
    }

    #[test]
    fn test_navigation_never_leaves_bounds() {
        let mut story = story(&["Uno.", "Dos."]);
        // Can't go before the first day
        assert!(!story.previous_day());
        assert_eq!(story.current_day, 0);

        assert_eq!(story.next_day(), DayAdvance::Moved);
        assert_eq!(story.current_day, 1);

        // On the last day, next reports that a continuation is needed and
        // the pointer stays put
        assert_eq!(story.next_day(), DayAdvance::NeedsContinuation);
        assert_eq!(story.current_day, 1);

        assert!(story.previous_day());
        assert_eq!(story.current_day, 0);
    }

    #[test]
    fn test_push_paragraph_advances_to_it() {
        let mut story = story(&["Uno."]);
        story.push_paragraph("Dos.".to_string());
        assert_eq!(story.current_day, 1);
        assert_eq!(story.current_paragraph(), "Dos.");
    }

    #[test]
    fn test_load_clamps_out_of_range_day() {
        let mut saved = story(&["Uno.", "Dos."]);
        saved.current_day = 17;
        let json = serde_json::to_vec(&vec![saved]).unwrap();
        let list = StoryList::from_json_bytes(&json);
        assert_eq!(list.stories()[0].current_day, 1);
    }

    #[test]
    fn test_load_drops_story_without_lessons() {
        let json = br#"[{"id": "x", "topic": "t", "title": "t", "language": "Spanish", "level": 1, "lessons": [], "createdAt": 0, "currentDay": 0}]"#;
        assert!(StoryList::from_json_bytes(json).stories().is_empty());
    }

    #[test]
    fn test_load_malformed_is_empty() {
        assert!(StoryList::from_json_bytes(b"").stories().is_empty());
        assert!(StoryList::from_json_bytes(b"{oops").stories().is_empty());
    }

    #[test]
    fn test_round_trip() {
        let mut list = StoryList::default();
        list.add(story(&["Uno."]));
        let json = serde_json::to_vec(&list).unwrap();
        assert_eq!(StoryList::from_json_bytes(&json), list);
    }

    #[test]
    fn test_newest_story_first_and_remove_twice() {
        let mut list = StoryList::default();
        let mut first = story(&["Uno."]);
        first.id = "first".to_string();
        let mut second = story(&["Dos."]);
        second.id = "second".to_string();
        list.add(first);
        list.add(second);
        assert_eq!(list.stories()[0].id, "second");

        assert!(list.remove("first"));
        assert!(!list.remove("first"));
        assert!(list.get("first").is_none());
        assert!(list.get("second").is_some());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("A cat, who SAILS!"), "a-cat-who-sails");
        assert_eq!(slugify("  spaced   out  "), "spaced-out");
        assert_eq!(slugify("¡püra vida!"), "püra-vida");
    }
}
