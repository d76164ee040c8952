//! Error types.
//!
//! Absence of a key is never an error: lookups return `Option`. Errors are
//! limited to configuration that cannot describe a valid cache and to the
//! background pruner's lifecycle.

use thiserror::Error;

/// Errors reported by cache construction and prune scheduling.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A capacity read from an external source was negative.
    #[error("cache capacity must not be negative, got {0}")]
    NegativeCapacity(i64),

    /// A time-to-live read from an external source was negative.
    #[error("cache ttl must not be negative, got {0}ms")]
    NegativeTtl(i64),

    /// A policy name did not match any known eviction policy.
    #[error("unknown cache policy `{0}`")]
    UnknownPolicy(String),

    /// A repeating prune was requested with a zero delay.
    #[error("prune delay must be greater than zero")]
    InvalidPruneDelay,

    /// The pruner has been shut down and accepts no new tasks.
    #[error("background pruner has been stopped")]
    PrunerStopped,

    /// The pruner worker thread could not be spawned.
    #[error("failed to spawn pruner thread: {0}")]
    PrunerSpawn(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CacheError::NegativeCapacity(-3).to_string(),
            "cache capacity must not be negative, got -3"
        );
        assert_eq!(
            CacheError::UnknownPolicy("mru".into()).to_string(),
            "unknown cache policy `mru`"
        );
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "no threads");
        let err: CacheError = io.into();
        assert!(matches!(err, CacheError::PrunerSpawn(_)));
    }
}
