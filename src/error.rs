use thiserror::Error;

/// Reasons a remote word pool could not be used.
///
/// None of these reach the player: the word source swaps in the fallback pool instead.
#[derive(Debug, Error)]
pub enum WordSourceError {
    #[error("word request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("word endpoint answered with status {0}")]
    Status(u16),
    #[error("word endpoint returned malformed data: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("word endpoint returned no usable words")]
    Empty,
}

/// Failures of the key/value storage that backs the score history.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode records: {0}")]
    Encode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_mentions_code() {
        let err = WordSourceError::Status(503);
        assert_eq!(err.to_string(), "word endpoint answered with status 503");
    }

    #[test]
    fn malformed_error_wraps_serde() {
        let parse = serde_json::from_str::<Vec<String>>("{").unwrap_err();
        let err: WordSourceError = parse.into();
        assert!(matches!(err, WordSourceError::Malformed(_)));
        assert!(err.to_string().starts_with("word endpoint returned malformed data"));
    }
}
