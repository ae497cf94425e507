//! Stop-word lists used before keyphrase extraction.

use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Words that only appear in text because something went wrong upstream
/// (an OCR or scraping error message leaking into the content).
pub const ERROR_WORDS: &[&str] = &[
    "error",
    "exception",
    "traceback",
    "failed",
    "failure",
    "broken",
];

/// Substrings that disqualify an extracted keyphrase.
pub const ERROR_RELATED: &[&str] = &[
    "error",
    "exception",
    "traceback",
    "failed",
    "failure",
    "broken",
    "cannot",
    "could not",
    "not found",
    "missing",
];

const ENGLISH: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

const KOREAN: &[&str] = &[
    "이", "그", "저", "것", "이것", "저것", "그것", "및", "등", "등등", "나", "너", "우리", "저희",
    "당신", "그들", "그녀", "이런", "저런", "그런", "하다", "되다", "있다", "없다", "같다", "보다",
    "이다", "아니다", "그리고", "또는", "그러나", "하지만", "또한", "그래서", "왜냐하면", "에러",
    "오류", "에러가", "오류가", "error", "exception",
];

static ENGLISH_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ENGLISH
        .iter()
        .chain(ERROR_WORDS.iter())
        .copied()
        .collect()
});

static KOREAN_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| KOREAN.iter().copied().collect());

/// English stop words plus [`ERROR_WORDS`].
pub fn english() -> &'static HashSet<&'static str> {
    &ENGLISH_SET
}

/// Korean pronouns, conjunctions, copulas and error words.
pub fn korean() -> &'static HashSet<&'static str> {
    &KOREAN_SET
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_includes_error_words() {
        assert!(english().contains("the"));
        assert!(english().contains("traceback"));
        assert!(!english().contains("dragon"));
    }

    #[test]
    fn korean_list() {
        assert!(korean().contains("그리고"));
        assert!(korean().contains("오류"));
        assert!(!korean().contains("사랑"));
    }
}
