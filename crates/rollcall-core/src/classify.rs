//! Spoken-answer classification.

/// Keywords that mark a transcript as affirmative.
pub const AFFIRMATIVE_KEYWORDS: &[&str] = &["confirm", "done", "yes"];

/// Binary reading of one transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Yes,
    No,
}

/// Classify a transcript by case-insensitive substring containment.
///
/// A transcript carrying any affirmative keyword anywhere, including inside a
/// larger word ("yesterday" reads as yes), marks the item yes. Everything else
/// marks it no, background chatter included. Unclear audio is rejected before
/// classification; this function never abstains.
pub fn classify(transcript: &str) -> Decision {
    let lowered = transcript.to_lowercase();
    if AFFIRMATIVE_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        Decision::Yes
    } else {
        Decision::No
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_keywords_read_yes() {
        assert_eq!(classify("yes"), Decision::Yes);
        assert_eq!(classify("confirm"), Decision::Yes);
        assert_eq!(classify("done"), Decision::Yes);
    }

    #[test]
    fn keywords_inside_phrases_read_yes() {
        assert_eq!(classify("Yes, the site is marked."), Decision::Yes);
        assert_eq!(classify("we are all done here"), Decision::Yes);
        assert_eq!(classify("I can confirm that"), Decision::Yes);
    }

    #[test]
    fn case_is_ignored() {
        assert_eq!(classify("YES"), Decision::Yes);
        assert_eq!(classify("Confirmed"), Decision::Yes);
    }

    #[test]
    fn containment_is_substring_level() {
        assert_eq!(classify("yesterday"), Decision::Yes);
        assert_eq!(classify("confirmation pending"), Decision::Yes);
    }

    #[test]
    fn everything_else_reads_no() {
        assert_eq!(classify("no"), Decision::No);
        assert_eq!(classify("absolutely not"), Decision::No);
        assert_eq!(classify("the weather is nice"), Decision::No);
        assert_eq!(classify(""), Decision::No);
    }
}
