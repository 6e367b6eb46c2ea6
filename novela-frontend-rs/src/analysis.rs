use std::collections::BTreeMap;

use story_utils::SentenceAnalysis;

/// How many paragraph scopes the cache keeps before evicting the least
/// recently used one.
pub const DEFAULT_PARAGRAPH_CAPACITY: usize = 16;

/// Lifecycle of one sentence's analysis. An entry transitions
/// Pending -> Succeeded or Pending -> Failed; a Failed entry can be put back
/// into Pending by a retry, always through the same entry.
#[derive(Clone, Debug, PartialEq)]
pub enum AnalysisState {
    Pending { request_id: u64 },
    Succeeded(SentenceAnalysis),
    Failed { message: String },
}

/// What the caller should do after asking for a sentence's analysis.
#[derive(Clone, Debug, PartialEq)]
pub enum RequestDecision {
    /// A Pending entry was created; the caller performs the network call and
    /// reports back through [`AnalysisCache::complete`] with this id.
    Dispatch { request_id: u64 },
    /// A call for this exact sentence is already in flight.
    AlreadyPending,
    /// The analysis is already cached.
    Cached(SentenceAnalysis),
}

/// Per-paragraph cache of sentence analyses, keyed by sentence text.
///
/// Revisiting a paragraph reuses its cached analyses; the same sentence is
/// never dispatched twice while a call for it is outstanding. Paragraph
/// scopes are evicted LRU once `capacity` is exceeded.
pub struct AnalysisCache {
    paragraphs: BTreeMap<usize, BTreeMap<String, AnalysisState>>,
    /// Paragraph indices, most recently used first.
    recency: Vec<usize>,
    capacity: usize,
    next_request_id: u64,
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new(DEFAULT_PARAGRAPH_CAPACITY)
    }
}

impl AnalysisCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            paragraphs: BTreeMap::new(),
            recency: Vec::new(),
            capacity: capacity.max(1),
            next_request_id: 0,
        }
    }

    /// Look up (or create) the entry for `(paragraph_index, sentence)`.
    ///
    /// Pending and Succeeded entries are reused as-is. A missing entry, or a
    /// Failed one, becomes a fresh Pending entry and the caller is told to
    /// dispatch the network call.
    pub fn request(&mut self, paragraph_index: usize, sentence: &str) -> RequestDecision {
        self.touch(paragraph_index);
        let entries = self.paragraphs.entry(paragraph_index).or_default();
        match entries.get(sentence) {
            Some(AnalysisState::Pending { .. }) => return RequestDecision::AlreadyPending,
            Some(AnalysisState::Succeeded(analysis)) => {
                return RequestDecision::Cached(analysis.clone());
            }
            Some(AnalysisState::Failed { .. }) | None => {}
        }

        self.next_request_id += 1;
        let request_id = self.next_request_id;
        entries.insert(sentence.to_string(), AnalysisState::Pending { request_id });
        RequestDecision::Dispatch { request_id }
    }

    /// Apply the outcome of a dispatched call.
    ///
    /// Returns false when the result is stale — the entry was evicted, or a
    /// newer request superseded this one — in which case it is dropped
    /// rather than applied to state nobody is watching anymore.
    pub fn complete(
        &mut self,
        paragraph_index: usize,
        sentence: &str,
        request_id: u64,
        result: Result<SentenceAnalysis, String>,
    ) -> bool {
        let Some(entries) = self.paragraphs.get_mut(&paragraph_index) else {
            return false;
        };
        let still_ours = matches!(
            entries.get(sentence),
            Some(AnalysisState::Pending { request_id: current }) if *current == request_id
        );
        if !still_ours {
            return false;
        }

        let state = match result {
            Ok(analysis) => AnalysisState::Succeeded(analysis),
            Err(message) => AnalysisState::Failed { message },
        };
        entries.insert(sentence.to_string(), state);
        true
    }

    /// Current state of a sentence, for rendering.
    pub fn state(&self, paragraph_index: usize, sentence: &str) -> Option<&AnalysisState> {
        self.paragraphs.get(&paragraph_index)?.get(sentence)
    }

    fn touch(&mut self, paragraph_index: usize) {
        self.recency.retain(|p| *p != paragraph_index);
        self.recency.insert(0, paragraph_index);
        while self.recency.len() > self.capacity {
            if let Some(evicted) = self.recency.pop() {
                self.paragraphs.remove(&evicted);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(translation: &str) -> SentenceAnalysis {
        SentenceAnalysis {
            translation: translation.to_string(),
            vocabulary: vec![],
            grammar: vec![],
        }
    }

    #[test]
    fn test_second_request_while_pending_does_not_dispatch() {
        let mut cache = AnalysisCache::default();
        let first = cache.request(0, "El gato duerme.");
        assert!(matches!(first, RequestDecision::Dispatch { .. }));
        let second = cache.request(0, "El gato duerme.");
        assert_eq!(second, RequestDecision::AlreadyPending);
    }

    #[test]
    fn test_succeeded_entry_is_reused() {
        let mut cache = AnalysisCache::default();
        let RequestDecision::Dispatch { request_id } = cache.request(2, "Llueve.") else {
            panic!("expected dispatch");
        };
        assert!(cache.complete(2, "Llueve.", request_id, Ok(analysis("비가 온다 (It rains)"))));
        match cache.request(2, "Llueve.") {
            RequestDecision::Cached(cached) => {
                assert_eq!(cached.translation, "비가 온다 (It rains)");
            }
            other => panic!("expected cached, got {other:?}"),
        }
    }

    #[test]
    fn test_failed_entry_retries_in_place() {
        let mut cache = AnalysisCache::default();
        let RequestDecision::Dispatch { request_id } = cache.request(0, "Nieva.") else {
            panic!("expected dispatch");
        };
        assert!(cache.complete(0, "Nieva.", request_id, Err("timeout".to_string())));
        assert!(matches!(
            cache.state(0, "Nieva."),
            Some(AnalysisState::Failed { .. })
        ));

        // The retry goes through the same entry, not a parallel one
        let retry = cache.request(0, "Nieva.");
        assert!(matches!(retry, RequestDecision::Dispatch { .. }));
        assert!(matches!(
            cache.state(0, "Nieva."),
            Some(AnalysisState::Pending { .. })
        ));
    }

    #[test]
    fn test_stale_completion_is_dropped() {
        let mut cache = AnalysisCache::default();
        let RequestDecision::Dispatch { request_id: stale } = cache.request(0, "Hace sol.") else {
            panic!("expected dispatch");
        };
        assert!(cache.complete(0, "Hace sol.", stale, Err("network".to_string())));
        let RequestDecision::Dispatch { request_id: fresh } = cache.request(0, "Hace sol.") else {
            panic!("expected dispatch");
        };

        // A late duplicate of the first call must not clobber the new Pending entry
        assert!(!cache.complete(0, "Hace sol.", stale, Ok(analysis("늦은 응답"))));
        assert!(matches!(
            cache.state(0, "Hace sol."),
            Some(AnalysisState::Pending { request_id }) if *request_id == fresh
        ));
    }

    #[test]
    fn test_completion_after_eviction_is_dropped() {
        let mut cache = AnalysisCache::new(1);
        let RequestDecision::Dispatch { request_id } = cache.request(0, "Uno.") else {
            panic!("expected dispatch");
        };
        // Visiting another paragraph evicts paragraph 0 (capacity 1)
        cache.request(1, "Dos.");
        assert!(!cache.complete(0, "Uno.", request_id, Ok(analysis("하나"))));
        assert!(cache.state(0, "Uno.").is_none());
    }

    #[test]
    fn test_lru_eviction_keeps_recent_paragraphs() {
        let mut cache = AnalysisCache::new(2);
        for paragraph in 0..3 {
            let RequestDecision::Dispatch { request_id } = cache.request(paragraph, "Frase.")
            else {
                panic!("expected dispatch");
            };
            cache.complete(paragraph, "Frase.", request_id, Ok(analysis("문장")));
        }
        assert!(cache.state(0, "Frase.").is_none());
        assert!(cache.state(1, "Frase.").is_some());
        assert!(cache.state(2, "Frase.").is_some());
    }

    #[test]
    fn test_revisiting_a_paragraph_bumps_recency() {
        let mut cache = AnalysisCache::new(2);
        cache.request(0, "A.");
        cache.request(1, "B.");
        // Touch paragraph 0 again, then add a third; paragraph 1 is now LRU
        cache.request(0, "A.");
        cache.request(2, "C.");
        assert!(cache.state(0, "A.").is_some());
        assert!(cache.state(1, "B.").is_none());
    }
}
