use std::fs;
use std::path::Path;

/// Built-in word list used when no external dictionary can be read.
const FALLBACK_WORDS: &[&str] = &[
    "apple", "banana", "orange", "pear", "grape", "peel", "split", "dump", "swap",
];

/// Loads a word list from disk, falling back to the built-in list when the
/// file is missing or holds nothing usable.
pub fn load_words<P: AsRef<Path>>(path: P) -> Vec<String> {
    match fs::read_to_string(path.as_ref()) {
        Ok(data) => {
            let words = parse_words(&data);
            if words.is_empty() {
                log::warn!(
                    "{} contained no usable words, using the built-in list",
                    path.as_ref().display()
                );
                fallback_words()
            } else {
                words
            }
        }
        Err(err) => {
            log::warn!(
                "could not read {}: {err}, using the built-in list",
                path.as_ref().display()
            );
            fallback_words()
        }
    }
}

/// Word files are either a JSON array of strings or one word per line.
fn parse_words(data: &str) -> Vec<String> {
    let raw: Vec<String> = match serde_json::from_str(data) {
        Ok(words) => words,
        Err(_) => data.lines().map(|line| line.trim().to_string()).collect(),
    };

    raw.into_iter()
        .map(|word| word.to_lowercase())
        .filter(|word| word.chars().count() >= 2 && word.chars().all(|c| c.is_ascii_lowercase()))
        .collect()
}

fn fallback_words() -> Vec<String> {
    FALLBACK_WORDS.iter().map(|w| w.to_string()).collect()
}
