//! Asset-name comparison used when deduplicating entries across levels.

use serde::{Deserialize, Serialize};

/// Whether two asset names differing only in case are the same asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NameComparison {
    CaseSensitive,
    CaseInsensitive,
}

impl Default for NameComparison {
    /// Follows the usual file-system behaviour of the build target.
    fn default() -> Self {
        if cfg!(any(windows, target_os = "macos")) {
            NameComparison::CaseInsensitive
        } else {
            NameComparison::CaseSensitive
        }
    }
}

impl NameComparison {
    /// Key under which `name` is deduplicated.
    pub fn key(self, name: &str) -> String {
        match self {
            NameComparison::CaseSensitive => name.to_string(),
            NameComparison::CaseInsensitive => name.to_lowercase(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_sensitive_keeps_distinct_names() {
        let cmp = NameComparison::CaseSensitive;
        assert_ne!(cmp.key("System.Runtime"), cmp.key("system.runtime"));
    }

    #[test]
    fn case_insensitive_folds_names() {
        let cmp = NameComparison::CaseInsensitive;
        assert_eq!(cmp.key("System.Runtime"), cmp.key("SYSTEM.runtime"));
    }
}
