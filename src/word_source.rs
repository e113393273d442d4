use crate::config::Config;
use crate::error::WordSourceError;
use rand::{seq::SliceRandom, Rng};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_WORD_API_URL: &str = "https://api.datamuse.com/words?ml=game&max=100";

/// Words used whenever the remote pool is unavailable
pub const FALLBACK_WORDS: [&str; 5] = ["default", "fallback", "words", "typing", "example"];

/// A non-empty set of candidate words. Replaced as a whole, never edited.
///
/// Duplicates from the remote source are kept, so a word listed twice is drawn twice as often.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordPool {
    words: Vec<String>,
}

impl WordPool {
    /// Returns `None` for an empty list; a pool always has something to draw.
    pub fn new(words: Vec<String>) -> Option<Self> {
        if words.is_empty() {
            None
        } else {
            Some(Self { words })
        }
    }

    pub fn fallback() -> Self {
        Self {
            words: FALLBACK_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    pub fn is_fallback(&self) -> bool {
        self.words.iter().map(String::as_str).eq(FALLBACK_WORDS)
    }
}

/// Uniform, memoryless draw. The same word can come up twice in a row.
pub fn next_word<R: Rng + ?Sized>(pool: &WordPool, rng: &mut R) -> String {
    pool.words
        .choose(rng)
        .cloned()
        .unwrap_or_else(|| FALLBACK_WORDS[0].to_string())
}

#[derive(Debug, Deserialize)]
struct WordRecord {
    word: String,
}

/// Decode a `[{"word": "..."}, ...]` body, dropping blank words.
pub fn parse_word_records(body: &[u8]) -> Result<Vec<String>, WordSourceError> {
    let records: Vec<WordRecord> = serde_json::from_slice(body)?;
    let words: Vec<String> = records
        .into_iter()
        .map(|r| r.word)
        .filter(|w| !w.trim().is_empty())
        .collect();

    if words.is_empty() {
        return Err(WordSourceError::Empty);
    }
    Ok(words)
}

/// Where remote words come from
pub trait WordFetcher: Send + Sync + 'static {
    fn fetch(&self) -> Result<Vec<String>, WordSourceError>;
}

/// Single blocking GET against a datamuse-style endpoint
#[derive(Debug, Clone)]
pub struct HttpWordFetcher {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpWordFetcher {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, WordSourceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl WordFetcher for HttpWordFetcher {
    fn fetch(&self) -> Result<Vec<String>, WordSourceError> {
        let response = self.client.get(&self.url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(WordSourceError::Status(status.as_u16()));
        }
        let body = response.bytes()?;
        parse_word_records(&body)
    }
}

/// Supplies word pools, substituting the fallback list whenever fetching fails
pub struct WordSource {
    fetcher: Option<Box<dyn WordFetcher>>,
}

impl WordSource {
    pub fn new<F: WordFetcher>(fetcher: F) -> Self {
        Self {
            fetcher: Some(Box::new(fetcher)),
        }
    }

    /// A source that never touches the network
    pub fn offline() -> Self {
        Self { fetcher: None }
    }

    pub fn from_config(config: &Config) -> Self {
        if config.offline {
            return Self::offline();
        }
        let timeout = Duration::from_secs(config.fetch_timeout_secs);
        match HttpWordFetcher::new(config.word_api_url.clone(), timeout) {
            Ok(fetcher) => Self::new(fetcher),
            Err(err) => {
                warn!(error = %err, "could not build http client, staying offline");
                Self::offline()
            }
        }
    }

    pub fn is_offline(&self) -> bool {
        self.fetcher.is_none()
    }

    /// One fetch attempt; never fails.
    pub fn refresh_pool(&self) -> WordPool {
        let Some(fetcher) = &self.fetcher else {
            return WordPool::fallback();
        };

        match fetcher.fetch() {
            Ok(words) => match WordPool::new(words) {
                Some(pool) => {
                    info!(count = pool.len(), "fetched word pool");
                    pool
                }
                None => {
                    warn!("fetcher returned no words, using fallback pool");
                    WordPool::fallback()
                }
            },
            Err(err) => {
                warn!(error = %err, "using fallback word pool");
                WordPool::fallback()
            }
        }
    }
}

impl std::fmt::Debug for WordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordSource")
            .field("offline", &self.is_offline())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    struct FailingFetcher;

    impl WordFetcher for FailingFetcher {
        fn fetch(&self) -> Result<Vec<String>, WordSourceError> {
            Err(WordSourceError::Status(500))
        }
    }

    struct StaticFetcher(Vec<&'static str>);

    impl WordFetcher for StaticFetcher {
        fn fetch(&self) -> Result<Vec<String>, WordSourceError> {
            Ok(self.0.iter().map(|w| w.to_string()).collect())
        }
    }

    #[test]
    fn failing_fetch_yields_fallback_pool() {
        let source = WordSource::new(FailingFetcher);
        let pool = source.refresh_pool();

        assert_eq!(pool.words(), FALLBACK_WORDS);
        assert!(pool.is_fallback());
    }

    #[test]
    fn fallback_draws_stay_in_fallback_list() {
        let pool = WordSource::new(FailingFetcher).refresh_pool();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            let word = next_word(&pool, &mut rng);
            assert!(FALLBACK_WORDS.contains(&word.as_str()), "unexpected {word}");
        }
    }

    #[test]
    fn successful_fetch_replaces_pool() {
        let source = WordSource::new(StaticFetcher(vec!["arcade", "quest"]));
        let pool = source.refresh_pool();

        assert_eq!(pool.words(), ["arcade", "quest"]);
        assert!(!pool.is_fallback());
    }

    #[test]
    fn empty_fetch_falls_back() {
        let source = WordSource::new(StaticFetcher(vec![]));
        assert!(source.refresh_pool().is_fallback());
    }

    #[test]
    fn offline_source_uses_fallback() {
        let source = WordSource::offline();
        assert!(source.is_offline());
        assert!(source.refresh_pool().is_fallback());
    }

    #[test]
    fn empty_pool_is_rejected() {
        assert!(WordPool::new(vec![]).is_none());
        assert!(WordPool::new(vec!["x".into()]).is_some());
    }

    #[test]
    fn draws_can_repeat() {
        let pool = WordPool::new(vec!["only".into()]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(next_word(&pool, &mut rng), "only");
        assert_eq!(next_word(&pool, &mut rng), "only");
    }

    #[test]
    fn every_word_is_eventually_drawn() {
        let pool = WordPool::new(vec!["a".into(), "b".into(), "c".into()]).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            seen.insert(next_word(&pool, &mut rng));
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn parse_datamuse_body() {
        let body = br#"[{"word":"play","score":1200},{"word":"match","score":900,"tags":["n"]}]"#;
        let words = parse_word_records(body).unwrap();
        assert_eq!(words, vec!["play", "match"]);
    }

    #[test]
    fn parse_drops_blank_words() {
        let body = br#"[{"word":"  "},{"word":"score"}]"#;
        assert_eq!(parse_word_records(body).unwrap(), vec!["score"]);
    }

    #[test]
    fn parse_rejects_wrong_shape() {
        assert!(matches!(
            parse_word_records(br#"{"word":"x"}"#),
            Err(WordSourceError::Malformed(_))
        ));
        assert!(matches!(
            parse_word_records(br#"[{"text":"x"}]"#),
            Err(WordSourceError::Malformed(_))
        ));
        assert!(matches!(
            parse_word_records(b"not json"),
            Err(WordSourceError::Malformed(_))
        ));
    }

    #[test]
    fn parse_rejects_empty_array() {
        assert!(matches!(
            parse_word_records(b"[]"),
            Err(WordSourceError::Empty)
        ));
    }

    #[test]
    fn offline_config_builds_offline_source() {
        let config = Config {
            offline: true,
            ..Config::default()
        };
        assert!(WordSource::from_config(&config).is_offline());
    }
}
