/// Extension used when a language tag is absent or unknown
pub const DEFAULT_EXTENSION: &str = "txt";

/// Language tag to file extension pairs
const LANGUAGE_EXTENSIONS: &[(&str, &str)] = &[
    ("python", "py"),
    ("javascript", "js"),
    ("java", "java"),
    ("c", "c"),
    ("cpp", "cpp"),
    ("csharp", "cs"),
    ("go", "go"),
    ("ruby", "rb"),
    ("php", "php"),
    ("swift", "swift"),
    ("kotlin", "kt"),
    ("typescript", "ts"),
    ("html", "html"),
    ("css", "css"),
    ("json", "json"),
    ("xml", "xml"),
    ("yaml", "yaml"),
    ("sql", "sql"),
    ("bash", "sh"),
    ("rust", "rs"),
];

/// Static lookup from code fence language tags to file extensions
#[derive(Debug, Clone, Copy)]
pub struct LanguageRegistry {
    default_extension: &'static str,
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

impl LanguageRegistry {
    /// Creates a new LanguageRegistry
    ///
    /// # Arguments
    /// * `default_extension` - Extension for unmapped tags (defaults to "txt")
    pub fn new(default_extension: Option<&'static str>) -> Self {
        Self {
            default_extension: default_extension.unwrap_or(DEFAULT_EXTENSION),
        }
    }

    /// Returns the extension for a language tag, ignoring case.
    ///
    /// Empty or unmapped tags yield the registry's default extension.
    pub fn extension_for(&self, language: &str) -> &'static str {
        let language = language.to_lowercase();
        LANGUAGE_EXTENSIONS
            .iter()
            .find(|(tag, _)| *tag == language)
            .map(|(_, ext)| *ext)
            .unwrap_or(self.default_extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_languages() {
        let registry = LanguageRegistry::default();
        assert_eq!(registry.extension_for("python"), "py");
        assert_eq!(registry.extension_for("bash"), "sh");
        assert_eq!(registry.extension_for("csharp"), "cs");
        assert_eq!(registry.extension_for("rust"), "rs");
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = LanguageRegistry::default();
        assert_eq!(registry.extension_for("Python"), "py");
        assert_eq!(registry.extension_for("TYPESCRIPT"), "ts");
    }

    #[test]
    fn test_unknown_and_empty_fall_back_to_txt() {
        let registry = LanguageRegistry::default();
        assert_eq!(registry.extension_for(""), "txt");
        assert_eq!(registry.extension_for("haskell"), "txt");
        assert_eq!(registry.extension_for("py"), "txt");
    }

    #[test]
    fn test_custom_default() {
        let registry = LanguageRegistry::new(Some("out"));
        assert_eq!(registry.extension_for("cobol"), "out");
    }
}
