//! Configuration for the value codec
//!
//! The codec has far fewer knobs than a full database engine: there is no
//! storage, memory, or query layer to configure here. What remains is the
//! handful of policy choices spec'd for soft-failure handling and recursion
//! safety.

use serde::{Deserialize, Serialize};

/// Codec-wide configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodecConfig {
    /// Emit a `log::warn!` when a soft (recoverable) decode/encode condition
    /// is hit: an unrecognized type tag during decode, a TINYINT value out
    /// of `i8` range during encode, a malformed UUID/INET literal during
    /// encode. When `false` the fallback behavior still applies, just
    /// silently.
    pub warn_on_soft_errors: bool,

    /// Maximum recursion depth allowed when parsing a `TypeDescriptor` or
    /// decoding a nested collection/UDT/tuple value. Guards against stack
    /// exhaustion on adversarial input; the original driver had no such
    /// limit because it only ever saw metadata the server itself produced.
    pub max_nesting_depth: usize,

    /// Reject VARINT/DECIMAL wire payloads that are not in canonical
    /// (shortest) two's-complement form rather than silently accepting
    /// them. When `false`, non-canonical but otherwise valid encodings are
    /// decoded anyway.
    pub canonicalize_varint: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            warn_on_soft_errors: true,
            max_nesting_depth: 32,
            canonicalize_varint: true,
        }
    }
}

impl CodecConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_warn_on_soft_errors(mut self, warn: bool) -> Self {
        self.warn_on_soft_errors = warn;
        self
    }

    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    pub fn with_canonicalize_varint(mut self, canonicalize: bool) -> Self {
        self.canonicalize_varint = canonicalize;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_permissive_but_bounded() {
        let cfg = CodecConfig::default();
        assert!(cfg.warn_on_soft_errors);
        assert!(cfg.max_nesting_depth > 0);
        assert!(cfg.canonicalize_varint);
    }

    #[test]
    fn builder_overrides_apply() {
        let cfg = CodecConfig::new()
            .with_warn_on_soft_errors(false)
            .with_max_nesting_depth(4);
        assert!(!cfg.warn_on_soft_errors);
        assert_eq!(cfg.max_nesting_depth, 4);
    }
}
