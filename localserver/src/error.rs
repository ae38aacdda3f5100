//! Cross-cutting error taxonomy.
//!
//! Each module owns its own error enum. Every one of them maps onto the
//! closed set of categories below so that callers (the CLI in particular)
//! can decide how to present a failure without matching every variant.

use std::fmt;

/// Broad classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad template, missing file, invalid setting. Fatal, raised before mutation.
    Configuration,
    /// An advisory check suggests a running process. Needs an explicit override.
    DataIntegrityRisk,
    /// Fetch or sync failure. Retried by the operator, never by the core.
    Network,
    /// Malformed package. Fatal for that install attempt only.
    Manifest,
    /// Unknown tag, shelf conflict and friends. Surfaced with a remediation hint.
    VersionControl,
    /// Plain filesystem failure.
    Io,
}

impl ErrorCategory {
    /// Whether the operator can retry the same request after fixing the cause.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::DataIntegrityRisk | Self::Io)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::DataIntegrityRisk => "data integrity risk",
            ErrorCategory::Network => "network",
            ErrorCategory::Manifest => "manifest",
            ErrorCategory::VersionControl => "version control",
            ErrorCategory::Io => "io",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_categories() {
        assert!(ErrorCategory::Network.is_retryable());
        assert!(ErrorCategory::DataIntegrityRisk.is_retryable());
        assert!(!ErrorCategory::Manifest.is_retryable());
        assert!(!ErrorCategory::VersionControl.is_retryable());
        assert!(!ErrorCategory::Configuration.is_retryable());
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorCategory::DataIntegrityRisk.to_string(), "data integrity risk");
        assert_eq!(ErrorCategory::VersionControl.to_string(), "version control");
    }
}
