//! Splitting story paragraphs into clickable sentences.
//!
//! A paragraph is one lesson's worth of text; the reader analyzes it one
//! sentence at a time, so the split has to be stable for the same input
//! (sentence text is used as a cache key downstream).

/// Returns true for characters that end a sentence.
fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '…' | '。' | '！' | '？')
}

/// Closing quotes and brackets that may trail the terminal punctuation and
/// still belong to the sentence, e.g. `"¡Hola!"`.
fn is_closer(c: char) -> bool {
    matches!(
        c,
        '"' | '\'' | '\u{201D}' | '\u{2019}' | '»' | '›' | ')' | ']' | '」' | '』'
    )
}

/// Split a paragraph into sentences.
///
/// A sentence ends at terminal punctuation (plus any closing quotes or
/// brackets) followed by whitespace. Trailing text without terminal
/// punctuation is kept as a final sentence. Sentences are trimmed and empty
/// ones are dropped.
pub fn split_sentences(paragraph: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    // true once we've seen terminal punctuation (possibly followed by closers)
    let mut at_boundary = false;

    for c in paragraph.chars() {
        if c.is_whitespace() {
            if at_boundary {
                flush(&mut sentences, &mut current);
                at_boundary = false;
                continue;
            }
        } else if is_terminal(c) {
            at_boundary = true;
        } else if !(at_boundary && is_closer(c)) {
            at_boundary = false;
        }
        current.push(c);
    }
    flush(&mut sentences, &mut current);

    sentences
}

fn flush(sentences: &mut Vec<String>, current: &mut String) {
    let sentence = current.trim();
    if !sentence.is_empty() {
        sentences.push(sentence.to_string());
    }
    current.clear();
}
