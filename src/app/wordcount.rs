//! The sample word-count application (spec §1: out of scope for redesign,
//! kept as the one bundled reference [`MapReduceApp`]).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::app::MapReduceApp;
use crate::types::KeyValue;

static WORD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{Alphabetic}']+").expect("static pattern is valid"));

pub struct WordCount;

impl MapReduceApp for WordCount {
    fn map(&self, _filename: &str, contents: &str) -> anyhow::Result<Vec<KeyValue>> {
        Ok(WORD_PATTERN
            .find_iter(contents)
            .map(|m| KeyValue::new(m.as_str().to_lowercase(), "1"))
            .collect())
    }

    fn reduce(&self, key: &str, values: Vec<&str>) -> anyhow::Result<String> {
        let _ = key;
        Ok(values.len().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_each_word_to_one() {
        let app = WordCount;
        let kvs = app.map("a.txt", "hello world hello").unwrap();
        assert_eq!(
            kvs,
            vec![
                KeyValue::new("hello", "1"),
                KeyValue::new("world", "1"),
                KeyValue::new("hello", "1"),
            ]
        );
    }

    #[test]
    fn splits_on_punctuation_and_lowercases() {
        let app = WordCount;
        let kvs = app.map("a.txt", "Hello, world! It's HELLO.").unwrap();
        let words: Vec<_> = kvs.into_iter().map(|kv| kv.key).collect();
        assert_eq!(words, vec!["hello", "world", "it's", "hello"]);
    }

    #[test]
    fn empty_contents_yields_no_pairs() {
        let app = WordCount;
        assert!(app.map("empty.txt", "").unwrap().is_empty());
    }

    #[test]
    fn reduce_counts_occurrences() {
        let app = WordCount;
        let result = app.reduce("hello", vec!["1", "1"]).unwrap();
        assert_eq!(result, "2");
    }
}
