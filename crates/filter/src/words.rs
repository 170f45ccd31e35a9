use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Word -> occurrence count within one document.
pub type FrequencyMap = HashMap<String, u64>;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("word pattern is valid"));

/// Split cleaned text into normalized word tokens.
///
/// Lowercases the text, then extracts maximal runs of
/// alphanumeric/underscore characters in left-to-right order.
/// Punctuation and whitespace are separators, never tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD.find_iter(&lowered)
        .map(|m| m.as_str().to_owned())
        .collect()
}

/// Fold a token sequence into its frequency map.
///
/// Aggregation is commutative, so the result is independent of token
/// order; the sum of all counts equals the number of tokens.
pub fn count<S: AsRef<str>>(tokens: &[S]) -> FrequencyMap {
    let mut freq = FrequencyMap::with_capacity(tokens.len().min(256));
    for token in tokens {
        *freq.entry(token.as_ref().to_owned()).or_insert(0) += 1;
    }
    freq
}

#[cfg(test)]
mod tests {
    use super::{count, tokenize};
    use pretty_assertions::assert_eq;

    #[test]
    fn tokenizes_in_order_and_lowercases() {
        assert_eq!(tokenize("Hello world world\n"), ["hello", "world", "world"]);
    }

    #[test]
    fn punctuation_separates_tokens() {
        assert_eq!(
            tokenize("re: Q3_report (draft)! see-attached.pdf"),
            ["re", "q3_report", "draft", "see", "attached", "pdf"]
        );
    }

    #[test]
    fn empty_input_yields_empty_sequence() {
        assert_eq!(tokenize(""), Vec::<String>::new());
        assert_eq!(tokenize("  \t ,,, !!\n"), Vec::<String>::new());
    }

    #[test]
    fn counts_accumulate_duplicates() {
        let tokens = tokenize("Hello world world\n");
        let freq = count(&tokens);
        assert_eq!(freq.len(), 2);
        assert_eq!(freq["hello"], 1);
        assert_eq!(freq["world"], 2);
    }

    #[test]
    fn count_total_equals_token_count() {
        let texts = [
            "a b c a b a",
            "Meeting at noon. Meeting moved to 3pm, then 3pm again.",
            "",
        ];
        for text in texts {
            let tokens = tokenize(text);
            let freq = count(&tokens);
            let total: u64 = freq.values().sum();
            assert_eq!(total, tokens.len() as u64, "text: {text:?}");
        }
    }

    #[test]
    fn count_is_order_independent() {
        let mut tokens = tokenize("x y z x y x");
        let forward = count(&tokens);
        tokens.reverse();
        let backward = count(&tokens);
        assert_eq!(forward, backward);
    }
}
