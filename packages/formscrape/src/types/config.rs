//! Extraction configuration.

/// Settings that influence reconciliation.
///
/// The correctness marker in the rendered markup is a localized label
/// (the observed pages use Hindi "सही"). The recognized set is
/// configurable so forms rendered in other display languages can be
/// matched without code changes.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Labels recognized as meaning "correct" in the markup
    pub correct_labels: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            correct_labels: vec!["सही".to_string()],
        }
    }
}

impl ExtractConfig {
    /// Create a config with the default recognized labels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a recognized correctness label.
    pub fn with_correct_label(mut self, label: impl Into<String>) -> Self {
        self.correct_labels.push(label.into());
        self
    }

    /// Whether a markup label means "correct".
    pub fn is_correct_label(&self, label: &str) -> bool {
        let label = label.trim();
        self.correct_labels.iter().any(|l| l == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_label_recognized() {
        let config = ExtractConfig::default();
        assert!(config.is_correct_label("सही"));
        assert!(config.is_correct_label("  सही  "));
        assert!(!config.is_correct_label("Correct"));
    }

    #[test]
    fn test_added_label_recognized() {
        let config = ExtractConfig::new().with_correct_label("Correct");
        assert!(config.is_correct_label("Correct"));
        assert!(config.is_correct_label("सही"));
    }
}
