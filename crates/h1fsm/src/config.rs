//! Parser configuration.

use serde::{Deserialize, Serialize};

/// Default limit on the start line plus header block: 80 KiB.
pub const DEFAULT_MAX_HEADER_SIZE: usize = 80 * 1024;

/// Tunables for a [`Parser`](crate::Parser).
///
/// Deserializes with defaults for missing fields, so it can be embedded in
/// a server's configuration file.
///
/// # Example
///
/// ```
/// use h1fsm::ParserConfig;
///
/// let config = ParserConfig::new()
///     .with_max_header_size(16 * 1024)
///     .with_strict(true);
/// assert_eq!(config.max_header_size(), 16 * 1024);
/// assert!(config.strict());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    max_header_size: usize,
    strict: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
            strict: false,
        }
    }
}

impl ParserConfig {
    /// Create a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limit on start line plus headers (and trailers), in bytes.
    #[must_use]
    pub fn with_max_header_size(mut self, size: usize) -> Self {
        self.max_header_size = size;
        self
    }

    /// Reject bare LF line endings.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Returns the header size limit.
    #[must_use]
    pub fn max_header_size(&self) -> usize {
        self.max_header_size
    }

    /// Returns whether strict mode is enabled.
    #[must_use]
    pub fn strict(&self) -> bool {
        self.strict
    }
}
