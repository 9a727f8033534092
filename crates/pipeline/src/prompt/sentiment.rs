//! Keyword sentiment tagging.

use academaide_core::conversation::Sentiment;

const NEGATIVE: &[&str] = &["bad", "hate", "fail"];
const POSITIVE: &[&str] = &["good", "love", "thanks"];

/// Tag a message by substring match on its lower-cased text.
///
/// Negative words are checked first, so "not good, I hate this" is
/// negative. Matching is by substring: "failure" counts as "fail".
pub fn classify(text: &str) -> Sentiment {
    let lower = text.to_lowercase();
    if NEGATIVE.iter().any(|w| lower.contains(w)) {
        Sentiment::Negative
    } else if POSITIVE.iter().any(|w| lower.contains(w)) {
        Sentiment::Positive
    } else {
        Sentiment::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_message() {
        assert_eq!(classify("I hate this exam"), Sentiment::Negative);
    }

    #[test]
    fn positive_message() {
        assert_eq!(classify("thanks, that was good"), Sentiment::Positive);
    }

    #[test]
    fn neutral_message() {
        assert_eq!(classify("what time is my class"), Sentiment::Neutral);
        assert_eq!(classify(""), Sentiment::Neutral);
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(classify("THANKS!"), Sentiment::Positive);
        assert_eq!(classify("I FAILED"), Sentiment::Negative);
    }

    #[test]
    fn negative_wins_over_positive() {
        assert_eq!(classify("good grief, I hate deadlines"), Sentiment::Negative);
    }
}
