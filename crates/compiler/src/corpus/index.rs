//! Inverted keyword index over identifiers

use std::collections::BTreeMap;

use reqforge_common::naming::split_identifier;

/// Lowercase words of an identifier plus adjacent bigrams (`click_login`)
pub fn keywords(identifier: &str) -> Vec<String> {
    let words = split_identifier(identifier);
    let mut keys: Vec<String> = Vec::with_capacity(words.len() * 2);
    for word in &words {
        if !keys.contains(word) {
            keys.push(word.clone());
        }
    }
    for pair in words.windows(2) {
        let bigram = format!("{}_{}", pair[0], pair[1]);
        if !keys.contains(&bigram) {
            keys.push(bigram);
        }
    }
    keys
}

/// Keyword -> entry ids, ids ascending
#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    postings: BTreeMap<String, Vec<usize>>,
}

impl KeywordIndex {
    pub fn insert(&mut self, id: usize, keys: &[String]) {
        for key in keys {
            let ids = self.postings.entry(key.clone()).or_default();
            if ids.last() != Some(&id) {
                ids.push(id);
            }
        }
    }

    /// Union of the entries posted under any of `keys`, ascending
    pub fn lookup(&self, keys: &[String]) -> Vec<usize> {
        let mut ids: Vec<usize> = keys
            .iter()
            .filter_map(|k| self.postings.get(k))
            .flatten()
            .copied()
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}
