//! Text cleaning, tokenization and phrase chunking

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use unicode_segmentation::UnicodeSegmentation;

/// Longest phrase candidate produced by `phrase_chunks`, in words
const MAX_PHRASE_WORDS: usize = 4;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Anything outside word characters, whitespace and basic punctuation
static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[^\w\s.,;:!?@#$%&*()\-+=\[\]\{\}'"/]"#).expect("valid whitelist regex")
});

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+|www\.\S+").expect("valid url regex"));

static EMAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+@\S+").expect("valid email regex"));

static TOKEN_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s\-+#]").expect("valid punctuation regex"));

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
        "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers",
        "herself", "it", "its", "itself", "they", "them", "their", "theirs", "themselves",
        "what", "which", "who", "whom", "this", "that", "these", "those", "am", "is", "are",
        "was", "were", "be", "been", "being", "have", "has", "had", "having", "do", "does",
        "did", "doing", "a", "an", "the", "and", "but", "if", "or", "because", "as", "until",
        "while", "of", "at", "by", "for", "with", "about", "against", "between", "into",
        "through", "during", "before", "after", "above", "below", "to", "from", "up", "down",
        "in", "out", "on", "off", "over", "under", "again", "further", "then", "once", "here",
        "there", "when", "where", "why", "how", "all", "each", "few", "more", "most", "other",
        "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than", "too", "very",
        "s", "t", "can", "will", "just", "don", "should", "now",
    ]
    .into_iter()
    .collect()
});

/// Collapse whitespace and strip characters outside the whitelist
pub fn clean_text(text: &str) -> String {
    let collapsed = WHITESPACE.replace_all(text, " ");
    DISALLOWED.replace_all(&collapsed, "").trim().to_string()
}

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word)
}

/// Lower-cased content tokens: URLs, emails, stop words and most punctuation
/// removed. `-`, `+` and `#` survive so `c++` and `c#` stay intact.
pub fn content_tokens(text: &str) -> HashSet<String> {
    if text.is_empty() {
        return HashSet::new();
    }

    let lowered = text.to_lowercase();
    let without_urls = URL.replace_all(&lowered, "");
    let without_emails = EMAIL.replace_all(&without_urls, "");
    let without_punct = TOKEN_PUNCTUATION.replace_all(&without_emails, " ");

    without_punct
        .split_whitespace()
        .filter(|token| !is_stop_word(token))
        .map(str::to_string)
        .collect()
}

/// Jaccard overlap of content tokens; 0.5 when the second text is empty
pub fn token_jaccard(text1: &str, text2: &str) -> (f64, usize) {
    let tokens1 = content_tokens(text1);
    let tokens2 = content_tokens(text2);

    if tokens2.is_empty() {
        return (0.5, 0);
    }

    let common = tokens1.intersection(&tokens2).count();
    let union = tokens1.union(&tokens2).count();
    let jaccard = if union == 0 {
        0.0
    } else {
        common as f64 / union as f64
    };
    (jaccard, common)
}

/// Phrase candidates approximating noun chunks: runs of words broken at stop
/// words and punctuation, expanded into every contiguous sub-span of up to
/// four words. Lower-cased, deduplicated, in first-seen order.
pub fn phrase_chunks(text: &str) -> Vec<String> {
    let mut runs: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for segment in text.split_word_bounds() {
        let is_word = segment.chars().any(char::is_alphanumeric);
        if is_word {
            let word = segment.to_lowercase();
            if is_stop_word(&word) {
                flush_run(&mut runs, &mut current);
            } else {
                current.push(word);
            }
        } else if !segment.chars().all(char::is_whitespace) {
            flush_run(&mut runs, &mut current);
        }
    }
    flush_run(&mut runs, &mut current);

    let mut seen = HashSet::new();
    let mut phrases = Vec::new();
    for run in &runs {
        for start in 0..run.len() {
            let max_end = (start + MAX_PHRASE_WORDS).min(run.len());
            for end in start + 1..=max_end {
                let phrase = run[start..end].join(" ");
                if seen.insert(phrase.clone()) {
                    phrases.push(phrase);
                }
            }
        }
    }
    phrases
}

fn flush_run(runs: &mut Vec<Vec<String>>, current: &mut Vec<String>) {
    if !current.is_empty() {
        runs.push(std::mem::take(current));
    }
}

/// Count words the way a reader would (Unicode word segmentation)
pub fn word_count(text: &str) -> usize {
    text.unicode_words().count()
}
