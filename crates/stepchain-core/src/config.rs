//! Chain configuration.

/// Settings that control how a chain reacts to protocol violations and how it
/// labels itself in logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    /// Panic on invariant violations instead of only logging them.
    pub strict: bool,
    /// Label attached to every log line emitted by the chain.
    pub name: Option<String>,
}

impl Default for ChainConfig {
    /// Strict in debug builds, lenient in release builds.
    fn default() -> Self {
        Self {
            strict: cfg!(debug_assertions),
            name: None,
        }
    }
}

impl ChainConfig {
    /// Configuration that panics on invariant violations.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            strict: true,
            name: None,
        }
    }

    /// Configuration that only logs invariant violations.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            strict: false,
            name: None,
        }
    }

    /// Sets the chain label used in logs.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub(crate) fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("chain")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_follows_debug_assertions() {
        assert_eq!(ChainConfig::default().strict, cfg!(debug_assertions));
    }

    #[test]
    fn test_label_defaults_to_chain() {
        assert_eq!(ChainConfig::lenient().label(), "chain");
        assert_eq!(ChainConfig::strict().named("bootstrap").label(), "bootstrap");
    }
}
