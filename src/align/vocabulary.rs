//! Reference vocabulary of canonical Darwin Core terms

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Ordered list of canonical terms with case-insensitive lookup
///
/// The file format is one term per line, CSV style. Any further fields on a
/// line are aliases that resolve to that line's term:
///
/// ```text
/// occurrenceID
/// decimalLatitude,lat,latitude
/// decimalLongitude,lon,lng,longitude
/// ```
///
/// Blank lines and lines starting with `#` are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceVocabulary {
    terms: Vec<String>,
    by_lower: HashMap<String, usize>,
    aliases: HashMap<String, usize>,
}

impl ReferenceVocabulary {
    /// Build from plain terms
    pub fn new<I, S>(terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocabulary = Self::default();
        for term in terms {
            vocabulary.push_term(term.into())?;
        }
        Ok(vocabulary)
    }

    /// Load a vocabulary file; an unreadable file is a configuration error
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read reference vocabulary '{}': {}",
                path.display(),
                e
            ))
        })?;
        let vocabulary = Self::parse(&content)?;
        tracing::info!(
            "Loaded {} vocabulary terms ({} aliases) from {}",
            vocabulary.len(),
            vocabulary.aliases.len(),
            path.display()
        );
        Ok(vocabulary)
    }

    /// Parse vocabulary file contents
    pub fn parse(content: &str) -> Result<Self> {
        let mut vocabulary = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split(',').map(clean_field).filter(|f| !f.is_empty());
            let Some(term) = fields.next() else {
                continue;
            };
            let index = vocabulary.push_term(term.to_string())?;
            for alias in fields {
                vocabulary.push_alias(alias, index)?;
            }
        }
        Ok(vocabulary)
    }

    /// Add aliases for an existing term
    pub fn with_aliases(mut self, term: &str, aliases: &[&str]) -> Result<Self> {
        let index = *self
            .by_lower
            .get(&term.to_lowercase())
            .ok_or_else(|| Error::validation(format!("Unknown vocabulary term '{term}'")))?;
        for alias in aliases {
            self.push_alias(alias, index)?;
        }
        Ok(self)
    }

    fn push_term(&mut self, term: String) -> Result<usize> {
        let lower = term.to_lowercase();
        if let Some(existing) = self.by_lower.get(&lower) {
            return Err(Error::validation(format!(
                "Vocabulary term '{}' occurs more than once (also as '{}')",
                term, self.terms[*existing]
            )));
        }
        if let Some(owner) = self.aliases.get(&lower) {
            return Err(Error::validation(format!(
                "Vocabulary term '{}' is already an alias of '{}'",
                term, self.terms[*owner]
            )));
        }
        let index = self.terms.len();
        self.by_lower.insert(lower, index);
        self.terms.push(term);
        Ok(index)
    }

    fn push_alias(&mut self, alias: &str, index: usize) -> Result<()> {
        let lower = alias.to_lowercase();
        match self.by_lower.get(&lower) {
            Some(owner) if *owner == index => return Ok(()),
            Some(owner) => {
                return Err(Error::validation(format!(
                    "Alias '{}' of '{}' is itself the term '{}'",
                    alias, self.terms[index], self.terms[*owner]
                )))
            }
            None => {}
        }
        match self.aliases.get(&lower) {
            Some(owner) if *owner != index => Err(Error::validation(format!(
                "Alias '{}' is claimed by both '{}' and '{}'",
                alias, self.terms[*owner], self.terms[index]
            ))),
            _ => {
                self.aliases.insert(lower, index);
                Ok(())
            }
        }
    }

    /// Canonical casing of a term, matched case-insensitively
    pub fn term(&self, name: &str) -> Option<&str> {
        self.by_lower
            .get(&name.to_lowercase())
            .map(|i| self.terms[*i].as_str())
    }

    /// Canonical term an alias stands for, matched case-insensitively
    pub fn alias(&self, name: &str) -> Option<&str> {
        self.aliases
            .get(&name.to_lowercase())
            .map(|i| self.terms[*i].as_str())
    }

    /// Whether `name` is a term (in any casing)
    pub fn contains(&self, name: &str) -> bool {
        self.term(name).is_some()
    }

    /// Terms in file order
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

fn clean_field(field: &str) -> &str {
    field.trim().trim_matches('"').trim()
}
