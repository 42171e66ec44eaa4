//! Compiled classification rules
//!
//! Keyword tables from [`ClassificationConfig`] compiled once into ordered
//! `(predicate, label)` lists. Evaluation is first-match-wins, so table order
//! is precedence.

use crate::config::{ClassificationConfig, RegionConfig};
use crate::models::Attribute;
use forge_common::{Error, Result};
use regex::{Regex, RegexBuilder};

/// Ordered `(pattern, label)` pairs
#[derive(Debug, Clone)]
pub struct OrderedRules {
    rules: Vec<(Regex, String)>,
}

impl OrderedRules {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a case-insensitive rule
    pub fn push(&mut self, pattern: &str, label: impl Into<String>) -> Result<()> {
        let regex = case_insensitive(pattern)?;
        self.rules.push((regex, label.into()));
        Ok(())
    }

    /// Label of the first rule matching `text`
    pub fn evaluate(&self, text: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|(regex, _)| regex.is_match(text))
            .map(|(_, label)| label.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for OrderedRules {
    fn default() -> Self {
        Self::new()
    }
}

fn case_insensitive(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| Error::Config(format!("Invalid classification pattern '{}': {}", pattern, e)))
}

/// Immutable rule set consumed by the metadata classifier
#[derive(Debug, Clone)]
pub struct ClassificationRules {
    pub source_marker: Regex,
    pub unknown_value: String,
    pub unknown_source: String,
    pub strict_naming: bool,
    pub domestic: RegionConfig,
    pub overseas: RegionConfig,
    /// Path-keyword rules per attribute, in configuration order
    pub attributes: Vec<(Attribute, OrderedRules)>,
}

impl ClassificationRules {
    /// Compile the keyword tables
    ///
    /// Only path-derived attributes may carry keyword rules; anything else is
    /// a configuration error.
    pub fn compile(config: &ClassificationConfig) -> Result<Self> {
        let source_marker = Regex::new(&config.source_marker).map_err(|e| {
            Error::Config(format!(
                "Invalid source marker '{}': {}",
                config.source_marker, e
            ))
        })?;

        let mut attributes = Vec::with_capacity(config.attributes.len());
        for table in &config.attributes {
            if !matches!(
                table.attribute,
                Attribute::SpeechRate
                    | Attribute::CaptureDistance
                    | Attribute::Gender
                    | Attribute::AgeGroup
            ) {
                return Err(Error::Config(format!(
                    "Attribute '{}' cannot be inferred from path keywords",
                    table.attribute
                )));
            }

            let mut rules = OrderedRules::new();
            for category in &table.categories {
                for keyword in &category.keywords {
                    rules.push(keyword, category.label.as_str())?;
                }
            }
            attributes.push((table.attribute, rules));
        }

        Ok(Self {
            source_marker,
            unknown_value: config.unknown_value.clone(),
            unknown_source: config.unknown_source.clone(),
            strict_naming: config.strict_naming,
            domestic: config.domestic.clone(),
            overseas: config.overseas.clone(),
            attributes,
        })
    }
}
