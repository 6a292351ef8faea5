//! Placeholder text generation.
//!
//! Encoders never produce words themselves; they pull strings from a
//! [`TextSource`] and apply whatever escaping their target grammar needs.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

const WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua", "enim",
    "ad", "minim", "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris", "nisi",
    "aliquip", "ex", "ea", "commodo", "consequat", "duis", "aute", "irure", "dolor", "in",
    "reprehenderit", "voluptate", "velit", "esse", "cillum", "dolore", "eu", "fugiat", "nulla",
    "pariatur", "excepteur", "sint", "occaecat", "cupidatat", "non", "proident", "sunt", "in",
    "culpa", "qui", "officia", "deserunt", "mollit", "anim", "id", "est", "laborum",
];

/// Supplier of printable placeholder strings.
///
/// All methods return non-empty text. Nothing is escaped for any particular
/// output grammar.
pub trait TextSource {
    /// One or two words, suitable for a file or entry name.
    fn name(&mut self) -> String;

    /// A short capitalized heading.
    fn title(&mut self) -> String;

    /// A capitalized sentence ending in a period.
    fn sentence(&mut self) -> String;

    /// Several sentences separated by spaces.
    fn paragraph(&mut self) -> String;

    /// Paragraphs separated by blank lines. `None` picks a random count.
    fn body(&mut self, paragraphs: Option<usize>) -> String;
}

/// Lorem ipsum generator driven by any [`Rng`].
pub struct LoremIpsum<R: Rng = StdRng> {
    rng: R,
}

impl LoremIpsum<StdRng> {
    /// Deterministic generator for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> LoremIpsum<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    fn words(&mut self, count: usize) -> Vec<&'static str> {
        (0..count)
            .map(|_| *WORDS.choose(&mut self.rng).unwrap_or(&"lorem"))
            .collect()
    }
}

impl<R: Rng> TextSource for LoremIpsum<R> {
    fn name(&mut self) -> String {
        let count = self.rng.random_range(1..=2);
        self.words(count).join(" ")
    }

    fn title(&mut self) -> String {
        let count = self.rng.random_range(2..=6);
        capitalize(&self.words(count).join(" "))
    }

    fn sentence(&mut self) -> String {
        let count = self.rng.random_range(4..=16);
        let mut sentence = capitalize(&self.words(count).join(" "));
        sentence.push('.');
        sentence
    }

    fn paragraph(&mut self) -> String {
        let count = self.rng.random_range(3..=7);
        (0..count)
            .map(|_| self.sentence())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn body(&mut self, paragraphs: Option<usize>) -> String {
        let count = paragraphs
            .unwrap_or_else(|| self.rng.random_range(3..=6))
            .max(1);
        (0..count)
            .map(|_| self.paragraph())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A [`TextSource`] that always returns the same strings.
///
/// Useful for pinning encoder output in tests and benchmarks.
#[derive(Debug, Clone)]
pub struct FixedText {
    pub name: String,
    pub title: String,
    pub body: String,
}

impl FixedText {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: "lorem".to_string(),
            title: title.into(),
            body: body.into(),
        }
    }
}

impl TextSource for FixedText {
    fn name(&mut self) -> String {
        self.name.clone()
    }

    fn title(&mut self) -> String {
        self.title.clone()
    }

    fn sentence(&mut self) -> String {
        self.body.clone()
    }

    fn paragraph(&mut self) -> String {
        self.body.clone()
    }

    fn body(&mut self, _paragraphs: Option<usize>) -> String {
        self.body.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_is_deterministic() {
        let mut a = LoremIpsum::seeded(7);
        let mut b = LoremIpsum::seeded(7);
        assert_eq!(a.body(None), b.body(None));
        assert_eq!(a.name(), b.name());
    }

    #[test]
    fn test_name_has_one_or_two_words() {
        let mut lorem = LoremIpsum::seeded(1);
        for _ in 0..100 {
            let name = lorem.name();
            let words = name.split(' ').count();
            assert!((1..=2).contains(&words), "{name:?}");
        }
    }

    #[test]
    fn test_sentence_shape() {
        let mut lorem = LoremIpsum::seeded(2);
        let sentence = lorem.sentence();
        assert!(sentence.ends_with('.'));
        assert!(sentence.chars().next().unwrap().is_uppercase());
        assert!(sentence.is_ascii());
    }

    #[test]
    fn test_body_paragraph_count() {
        let mut lorem = LoremIpsum::seeded(3);
        assert_eq!(lorem.body(Some(4)).split("\n\n").count(), 4);
        assert_eq!(lorem.body(Some(0)).split("\n\n").count(), 1);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("lorem ipsum"), "Lorem ipsum");
        assert_eq!(capitalize(""), "");
    }
}
