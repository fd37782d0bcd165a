use std::cmp::Reverse;

use super::bag::Bag;
use super::util::letter_index;

/// Dictionary of candidate words plus a positional index from each letter to
/// every (word, offset) pair where it occurs. Built once, immutable after.
pub struct WordIndex {
    words: Vec<String>,
    by_letter: [Vec<(usize, usize)>; 26],
}

impl WordIndex {
    pub fn new(words: Vec<String>) -> Self {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.to_lowercase())
            .filter(|w| !w.is_empty() && w.chars().all(|c| c.is_ascii_lowercase()))
            .collect();

        let mut by_letter: [Vec<(usize, usize)>; 26] = std::array::from_fn(|_| Vec::new());
        for (id, word) in words.iter().enumerate() {
            for (offset, ch) in word.chars().enumerate() {
                by_letter[letter_index(ch)].push((id, offset));
            }
        }

        Self { words, by_letter }
    }

    pub fn word(&self, id: usize) -> &str {
        &self.words[id]
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Every dictionary entry containing `ch`, one pair per occurrence.
    pub fn candidates(&self, ch: char) -> &[(usize, usize)] {
        &self.by_letter[letter_index(ch)]
    }

    /// How many entries are anchored on `ch`; fewer means more constrained.
    pub fn candidate_count(&self, ch: char) -> usize {
        self.candidates(ch).len()
    }

    /// The dictionary filtered to words the bag can spell outright, longest
    /// first; ties keep dictionary order.
    pub fn affordable_words(&self, bag: &Bag) -> Vec<usize> {
        let mut ids: Vec<usize> = (0..self.words.len())
            .filter(|&id| bag.can_spell(&self.words[id]))
            .collect();
        ids.sort_by_key(|&id| Reverse(self.words[id].len()));
        ids
    }
}
