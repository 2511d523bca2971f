use std::collections::HashSet;
use std::path::Path;

use crate::error::ExtractError;

pub trait Segmenter {
    fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str>;

    /// True when the oracle keeps `phrase` (two or more characters) as one token.
    fn is_word(&self, phrase: &str) -> bool {
        if phrase.chars().count() < 2 {
            return false;
        }
        let tokens = self.tokenize(phrase);
        tokens.len() == 1 && tokens[0] == phrase
    }
}

#[derive(Debug, Clone, Default)]
pub struct DictionarySegmenter {
    words: HashSet<String>,
    max_len: usize,
}

impl DictionarySegmenter {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words = words
            .into_iter()
            .map(Into::into)
            .filter(|word| word.chars().count() >= 2)
            .collect::<HashSet<_>>();
        let max_len = words
            .iter()
            .map(|word| word.chars().count())
            .max()
            .unwrap_or(0);
        Self { words, max_len }
    }

    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::new(
            text.lines()
                .filter_map(|line| line.split_whitespace().next())
                .map(str::to_string),
        ))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    fn longest_match(&self, text: &str) -> usize {
        let boundaries = text
            .char_indices()
            .map(|(index, _)| index)
            .chain(std::iter::once(text.len()))
            .take(self.max_len + 1)
            .collect::<Vec<_>>();

        for chars in (2..boundaries.len()).rev() {
            let end = boundaries[chars];
            if self.words.contains(&text[..end]) {
                return end;
            }
        }
        text.chars().next().map_or(0, char::len_utf8)
    }
}

fn run_length(text: &str, keep: impl Fn(char) -> bool) -> usize {
    text.char_indices()
        .find(|(_, ch)| !keep(*ch))
        .map_or(text.len(), |(index, _)| index)
}

impl Segmenter for DictionarySegmenter {
    fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut tokens = Vec::new();
        let mut rest = text;

        while let Some(first) = rest.chars().next() {
            let len = if first.is_whitespace() {
                run_length(rest, char::is_whitespace)
            } else if first.is_ascii_alphanumeric() {
                run_length(rest, |ch| ch.is_ascii_alphanumeric() || ch == '.')
            } else {
                self.longest_match(rest)
            };
            let (token, tail) = rest.split_at(len);
            tokens.push(token);
            rest = tail;
        }

        tokens
    }
}

#[cfg(feature = "jieba")]
pub struct JiebaSegmenter {
    jieba: jieba_rs::Jieba,
}

#[cfg(feature = "jieba")]
impl JiebaSegmenter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            jieba: jieba_rs::Jieba::new(),
        }
    }
}

#[cfg(feature = "jieba")]
impl Default for JiebaSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "jieba")]
impl Segmenter for JiebaSegmenter {
    fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.jieba.cut(text, true)
    }
}
