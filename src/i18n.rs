//! UI string translation.
//!
//! Every user-facing string is looked up by its English text. Keys with no
//! entry in the active table come back unchanged.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct Translator {
    table: BTreeMap<String, String>,
}

impl Translator {
    /// Translator that returns every key as-is
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn from_table(table: BTreeMap<String, String>) -> Self {
        Self { table }
    }

    /// Pick `language` out of the configured catalog
    pub fn for_language(
        catalog: &BTreeMap<String, BTreeMap<String, String>>,
        language: Option<&str>,
    ) -> Self {
        match language.and_then(|lang| catalog.get(lang)) {
            Some(table) => Self::from_table(table.clone()),
            None => {
                if let Some(lang) = language {
                    tracing::debug!("No translations for {:?}, using built-in strings", lang);
                }
                Self::identity()
            }
        }
    }

    pub fn translate<'a>(&'a self, key: &'a str) -> &'a str {
        self.table.get(key).map(String::as_str).unwrap_or(key)
    }
}
