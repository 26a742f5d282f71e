//! Token string to integer id mapping.

use anyhow::{Result, bail};
use std::collections::HashMap;

/// Bidirectional mapping between normalized words and dense token ids.
///
/// Ids `0..len_legalese` are reserved for legalese tokens, seeded at
/// construction; every other token gets the next free id as it is first
/// seen. Ids are stable for the lifetime of one built index: a query built
/// against one index must not be matched against another index's
/// structures.
#[derive(Debug, Clone)]
pub struct TokenDictionary {
    ids_by_token: HashMap<String, u16>,
    tokens_by_id: Vec<String>,
    len_legalese: usize,
}

impl TokenDictionary {
    /// Create a dictionary seeded with the legalese vocabulary.
    ///
    /// Duplicate words in the seed collapse to one id.
    pub fn with_legalese(words: &[&str]) -> Self {
        let mut ids_by_token = HashMap::with_capacity(words.len());
        let mut tokens_by_id = Vec::with_capacity(words.len());
        for &word in words {
            if ids_by_token.contains_key(word) {
                continue;
            }
            let id = tokens_by_id.len() as u16;
            ids_by_token.insert(word.to_string(), id);
            tokens_by_id.push(word.to_string());
        }
        let len_legalese = tokens_by_id.len();
        Self {
            ids_by_token,
            tokens_by_id,
            len_legalese,
        }
    }

    /// Get the id for a token, assigning the next free id to a new token.
    ///
    /// Fails when the u16 id space is exhausted; with tens of thousands of
    /// rules the vocabulary stays far below that in practice.
    pub fn get_or_assign(&mut self, token: &str) -> Result<u16> {
        if let Some(&id) = self.ids_by_token.get(token) {
            return Ok(id);
        }
        if self.tokens_by_id.len() > u16::MAX as usize {
            bail!("token dictionary is full: cannot assign an id to {token:?}");
        }
        let id = self.tokens_by_id.len() as u16;
        self.ids_by_token.insert(token.to_string(), id);
        self.tokens_by_id.push(token.to_string());
        Ok(id)
    }

    /// Look up a token's id without assigning one.
    pub fn get(&self, token: &str) -> Option<u16> {
        self.ids_by_token.get(token).copied()
    }

    /// Look up the token string for an id.
    pub fn token(&self, id: u16) -> Option<&str> {
        self.tokens_by_id.get(id as usize).map(String::as_str)
    }

    /// True if `id` denotes a legalese token.
    #[inline]
    pub fn is_legalese(&self, id: u16) -> bool {
        (id as usize) < self.len_legalese
    }

    /// Number of reserved legalese ids.
    pub fn len_legalese(&self) -> usize {
        self.len_legalese
    }

    /// Number of registered tokens.
    pub fn len(&self) -> usize {
        self.tokens_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens_by_id.is_empty()
    }
}
