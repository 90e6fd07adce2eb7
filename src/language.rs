//! Title language filtering.
//!
//! The retention rule is deliberately asymmetric: purely numeric titles are kept without
//! consulting a detector, titles without any ASCII Latin letter are dropped without
//! consulting one, and everything else is kept only when detected as English. A detector
//! that cannot decide counts as a rejection.

use lingua::{Language, LanguageDetector, LanguageDetectorBuilder};
use once_cell::sync::Lazy;
use regex::Regex;

static LATIN_LETTER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]").unwrap());

/// Decimal digits in any script (`\d` is Unicode-aware), e.g. `1984`, `١٩٨٤`, `１９８４`
static DIGITS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

/// Decides whether free text is English. `false` covers both "another language" and
/// "could not tell".
pub trait EnglishDetector: Send + Sync {
    fn is_english(&self, text: &str) -> bool;
}

/// Statistical detector over the languages compiled into `lingua`
pub struct LinguaDetector {
    detector: LanguageDetector,
}

impl LinguaDetector {
    pub fn new() -> Self {
        Self {
            detector: LanguageDetectorBuilder::from_all_languages().build(),
        }
    }
}

impl Default for LinguaDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl EnglishDetector for LinguaDetector {
    fn is_english(&self, text: &str) -> bool {
        self.detector.detect_language_of(text) == Some(Language::English)
    }
}

/// Outcome of the retention rule, kept distinct so callers can count each path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleVerdict {
    Numeric,
    NoLatinLetters,
    English,
    NotEnglish,
}

impl TitleVerdict {
    pub fn is_retained(self) -> bool {
        matches!(self, TitleVerdict::Numeric | TitleVerdict::English)
    }
}

pub fn is_numeric_title(title: &str) -> bool {
    DIGITS_REGEX.is_match(title)
}

pub fn has_latin_letter(title: &str) -> bool {
    LATIN_LETTER_REGEX.is_match(title)
}

/// Applies the retention rule to an already-trimmed, non-empty title. The checks run in a
/// fixed order: digits, then letters, then detection.
pub fn judge_title(title: &str, detector: &dyn EnglishDetector) -> TitleVerdict {
    if is_numeric_title(title) {
        TitleVerdict::Numeric
    } else if !has_latin_letter(title) {
        TitleVerdict::NoLatinLetters
    } else if detector.is_english(title) {
        TitleVerdict::English
    } else {
        TitleVerdict::NotEnglish
    }
}

pub fn classify(title: &str, detector: &dyn EnglishDetector) -> bool {
    judge_title(title.trim(), detector).is_retained()
}
