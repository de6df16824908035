/// The reply a completer gives when the context does not contain the answer.
pub const OUTSIDE_CORPUS_SENTINEL: &str = "i don't know";

/// Whether `answer` is the "I don't know" sentinel, ignoring case and
/// surrounding whitespace. Any other text, including an empty answer, counts
/// as grounded.
#[must_use]
pub fn is_outside_corpus(answer: &str) -> bool {
    answer.trim().to_lowercase() == OUTSIDE_CORPUS_SENTINEL
}
