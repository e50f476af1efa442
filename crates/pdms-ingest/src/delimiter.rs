//! Export delimiter detection.
//!
//! Exports come from the same source system configured with either `;` or
//! `|` as the field separator. Frequency counting over a small prefix is
//! enough to tell them apart; anything ambiguous is reported as
//! undetermined so callers can fail fast instead of mis-parsing.

/// Characters examined from the start of the export.
pub const DETECTION_SAMPLE_LEN: usize = 5_000;

/// The winning character must occur more often than this for a verdict.
pub const MIN_OCCURRENCES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Semicolon,
    Pipe,
}

impl Delimiter {
    pub fn as_char(self) -> char {
        match self {
            Self::Semicolon => ';',
            Self::Pipe => '|',
        }
    }

    pub fn as_byte(self) -> u8 {
        self.as_char() as u8
    }
}

/// Count both candidate delimiters in the sample prefix.
pub(crate) fn count_candidates(text: &str) -> (usize, usize) {
    let mut semicolons = 0;
    let mut pipes = 0;
    for ch in text.chars().take(DETECTION_SAMPLE_LEN) {
        match ch {
            ';' => semicolons += 1,
            '|' => pipes += 1,
            _ => {}
        }
    }
    (semicolons, pipes)
}

/// Decide the record delimiter from the sample prefix.
///
/// Returns `None` ("undetermined") when both counts are equal or the winner
/// does not clear [`MIN_OCCURRENCES`].
pub fn detect_delimiter(text: &str) -> Option<Delimiter> {
    let (semicolons, pipes) = count_candidates(text);
    let (winner, count) = match semicolons.cmp(&pipes) {
        std::cmp::Ordering::Greater => (Delimiter::Semicolon, semicolons),
        std::cmp::Ordering::Less => (Delimiter::Pipe, pipes),
        std::cmp::Ordering::Equal => return None,
    };
    (count > MIN_OCCURRENCES).then_some(winner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn majority_wins() {
        let text = format!("{}{}", ";".repeat(25), "|".repeat(10));
        assert_eq!(detect_delimiter(&text), Some(Delimiter::Semicolon));
        let text = format!("{}{}", ";".repeat(10), "|".repeat(40));
        assert_eq!(detect_delimiter(&text), Some(Delimiter::Pipe));
    }

    #[test]
    fn tie_is_undetermined() {
        let text = format!("{}{}", ";".repeat(10), "|".repeat(10));
        assert_eq!(detect_delimiter(&text), None);
    }

    #[test]
    fn sparse_winner_is_undetermined() {
        let text = format!("{}{}", ";".repeat(12), "|".repeat(3));
        assert_eq!(detect_delimiter(&text), None);
    }

    #[test]
    fn only_the_sample_prefix_counts() {
        // Delimiters beyond the sample window must not influence the verdict.
        let text = format!("{}{}", "x".repeat(DETECTION_SAMPLE_LEN), ";".repeat(100));
        assert_eq!(detect_delimiter(&text), None);
    }
}
