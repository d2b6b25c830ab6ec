//! Greedy token scanners
//!
//! Strings are scanned left to right. At each character position the
//! scanner tries the dictionary tokens starting there, longest first; every
//! matching length gets its own trial at the token probability and the first
//! success replaces the whole span. Positions with no successful trial copy one
//! character through unchanged.

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::randomness::RowDraws;

/// Substitutes per source token
#[derive(Debug, Clone, Default)]
pub struct TokenDictionary {
    substitutions: HashMap<String, SmallVec<[String; 4]>>,
    max_token_chars: usize,
}

impl TokenDictionary {
    pub fn from_pairs(pairs: &[(&str, &[&str])]) -> Self {
        let mut dictionary = Self::default();
        for (token, substitutes) in pairs {
            dictionary.insert(token, substitutes.iter().map(|s| s.to_string()));
        }
        dictionary
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, S)>,
        S: IntoIterator<Item = String>,
    {
        let mut dictionary = Self::default();
        for (token, substitutes) in entries {
            dictionary.insert(&token, substitutes);
        }
        dictionary
    }

    /// Add substitutes for a token, appending to any already recorded
    pub fn insert<I>(&mut self, token: &str, substitutes: I)
    where
        I: IntoIterator<Item = String>,
    {
        if token.is_empty() {
            return;
        }
        self.max_token_chars = self.max_token_chars.max(token.chars().count());
        self.substitutions
            .entry(token.to_string())
            .or_default()
            .extend(substitutes);
    }

    pub fn get(&self, token: &str) -> Option<&[String]> {
        self.substitutions
            .get(token)
            .map(|s| s.as_slice())
            .filter(|s| !s.is_empty())
    }

    /// Length in characters of the longest token
    pub fn max_token_chars(&self) -> usize {
        self.max_token_chars
    }

    pub fn len(&self) -> usize {
        self.substitutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.substitutions.is_empty()
    }
}

/// Corrupt `value` token by token
///
/// After each substitution the original token is kept after the substitute
/// with probability `keep_original_probability`.
pub fn corrupt_tokens(
    value: &str,
    dictionary: &TokenDictionary,
    token_probability: f64,
    keep_original_probability: f64,
    draws: &mut RowDraws,
) -> String {
    let boundaries: SmallVec<[usize; 32]> = value
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(value.len()))
        .collect();
    let chars = boundaries.len() - 1;

    let mut noised = String::with_capacity(value.len());
    let mut i = 0;
    while i < chars {
        let longest = dictionary.max_token_chars().min(chars - i);
        let mut advanced = 0;
        for length in (1..=longest).rev() {
            let token = &value[boundaries[i]..boundaries[i + length]];
            let Some(substitutes) = dictionary.get(token) else {
                continue;
            };
            if draws.next_uniform() < token_probability {
                if let Some(substitute) = draws.choose(substitutes) {
                    noised.push_str(substitute);
                }
                if keep_original_probability > 0.0 && draws.next_uniform() < keep_original_probability {
                    noised.push_str(token);
                }
                advanced = length;
                break;
            }
        }
        if advanced == 0 {
            noised.push_str(&value[boundaries[i]..boundaries[i + 1]]);
            advanced = 1;
        }
        i += advanced;
    }
    noised
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::randomness::{RandomnessStream, Seed};

    fn draws(row: u64) -> RowDraws {
        RandomnessStream::new("decennial_census", Seed::from(1u64)).row_draws(row, "scan")
    }

    fn dictionary() -> TokenDictionary {
        TokenDictionary::from_pairs(&[("a", &["4"]), ("ab", &["X"]), ("abc", &["Y"])])
    }

    #[test]
    fn test_zero_probability_is_identity() {
        let value = "abcabc, über";
        assert_eq!(corrupt_tokens(value, &dictionary(), 0.0, 0.0, &mut draws(0)), value);
    }

    #[test]
    fn test_longest_token_wins_at_full_probability() {
        assert_eq!(corrupt_tokens("abcab a", &dictionary(), 1.0, 0.0, &mut draws(0)), "YX 4");
    }

    #[test]
    fn test_tokens_at_end_of_string() {
        assert_eq!(corrupt_tokens("ab", &dictionary(), 1.0, 0.0, &mut draws(0)), "X");
        assert_eq!(corrupt_tokens("", &dictionary(), 1.0, 0.0, &mut draws(0)), "");
    }

    #[test]
    fn test_keep_original_appends_token() {
        assert_eq!(corrupt_tokens("a", &dictionary(), 1.0, 1.0, &mut draws(0)), "4a");
    }

    #[test]
    fn test_multibyte_characters_pass_through() {
        let dictionary = TokenDictionary::from_pairs(&[("é", &["e"])]);
        assert_eq!(corrupt_tokens("Renée", &dictionary, 1.0, 0.0, &mut draws(3)), "Renee");
        assert_eq!(dictionary.max_token_chars(), 1);
    }

    #[test]
    fn test_insert_extends_substitutes() {
        let mut dictionary = dictionary();
        dictionary.insert("a", ["@".to_string()]);
        assert_eq!(dictionary.get("a").map(|s| s.len()), Some(2));
        dictionary.insert("", ["z".to_string()]);
        assert!(dictionary.get("").is_none());
    }
}
