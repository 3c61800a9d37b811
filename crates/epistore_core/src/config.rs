//! Collector configuration.

use crate::chunk::ChunkPolicy;
use crate::size::SizeSpec;
use epistore_storage::Compression;

/// Configuration for constructing a [`Collector`](crate::Collector).
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Number of parallel slots in every incoming batch. Required and
    /// fixed for the collector's lifetime.
    pub batch_width: usize,

    /// Chunk sizing policy for newly created datasets.
    pub chunk: ChunkPolicy,

    /// Compression codec for newly created datasets (`None` =
    /// uncompressed).
    pub compression: Option<Compression>,

    /// Buffered-byte budget that triggers an automatic flush.
    /// [`SizeSpec::Auto`] flushes only on demand.
    pub flush_threshold: SizeSpec,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            batch_width: 1,
            chunk: ChunkPolicy::Auto,
            compression: None,
            flush_threshold: SizeSpec::Auto,
        }
    }
}

impl CollectorConfig {
    /// Creates a configuration for `batch_width` parallel slots, with
    /// auto chunking, no compression and on-demand flushing.
    #[must_use]
    pub fn new(batch_width: usize) -> Self {
        Self {
            batch_width,
            ..Self::default()
        }
    }

    /// Sets the chunk sizing policy.
    #[must_use]
    pub const fn chunk(mut self, policy: ChunkPolicy) -> Self {
        self.chunk = policy;
        self
    }

    /// Sets the compression codec for newly created datasets.
    #[must_use]
    pub const fn compression(mut self, codec: Compression) -> Self {
        self.compression = Some(codec);
        self
    }

    /// Sets the buffered-byte budget that triggers an automatic flush.
    #[must_use]
    pub const fn flush_threshold(mut self, spec: SizeSpec) -> Self {
        self.flush_threshold = spec;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = CollectorConfig::default();
        assert_eq!(config.batch_width, 1);
        assert_eq!(config.chunk, ChunkPolicy::Auto);
        assert!(config.compression.is_none());
        assert!(config.flush_threshold.is_auto());
    }

    #[test]
    fn builder_pattern() {
        let config = CollectorConfig::new(8)
            .chunk(ChunkPolicy::Length(64))
            .compression(Compression::Gzip)
            .flush_threshold(SizeSpec::Bytes(1 << 20));

        assert_eq!(config.batch_width, 8);
        assert_eq!(config.chunk, ChunkPolicy::Length(64));
        assert_eq!(config.compression, Some(Compression::Gzip));
        assert_eq!(config.flush_threshold, SizeSpec::Bytes(1 << 20));
    }
}
