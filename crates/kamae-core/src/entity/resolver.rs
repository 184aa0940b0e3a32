//! # Entity Resolver
//!
//! Detects which canonical entities a text talks about, either through a
//! whole-word alias or through a literal mention of the canonical name.

use std::collections::BTreeSet;

use regex::Regex;

use crate::entity::catalog::{AliasTable, EntityCatalog};
use crate::error::Result;

/// Maps aliases and canonical mentions in a text to canonical entity names.
pub struct EntityResolver {
    aliases: Vec<(Regex, String)>,
    canonicals: Vec<(String, String)>,
}

impl EntityResolver {
    /// Compiles one word-boundary pattern per alias.
    ///
    /// # Errors
    ///
    /// Returns `KamaeError::RegexError` if an alias pattern cannot be compiled.
    pub fn new<I, S>(aliases: &AliasTable, canonical_names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let aliases = aliases
            .iter()
            .map(|(alias, entity)| {
                let pattern = format!(r"\b{}\b", regex::escape(&alias.to_lowercase()));
                Ok((Regex::new(&pattern)?, entity.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        let canonicals = canonical_names
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                (name.to_lowercase(), name.to_string())
            })
            .filter(|(lower, _)| !lower.trim().is_empty())
            .collect();

        Ok(Self {
            aliases,
            canonicals,
        })
    }

    /// Resolver over a catalog's aliases and canonical names.
    pub fn from_catalog(catalog: &EntityCatalog) -> Result<Self> {
        Self::new(&catalog.alias_table(), catalog.canonical_names())
    }

    /// Returns the set of canonical entities mentioned in `text`.
    ///
    /// # Examples
    /// ```
    /// use kamae_core::entity::{AliasTable, EntityResolver};
    ///
    /// let mut aliases = AliasTable::new();
    /// aliases.insert("mangione", "Luigi Mangione").unwrap();
    /// let resolver = EntityResolver::new(&aliases, ["Luigi Mangione"]).unwrap();
    ///
    /// assert!(resolver.resolve("mangione did it").contains("Luigi Mangione"));
    /// assert!(resolver.resolve("mangionex did it").is_empty());
    /// ```
    pub fn resolve(&self, text: &str) -> BTreeSet<String> {
        let lower = text.to_lowercase();
        let mut found = BTreeSet::new();

        for (pattern, entity) in &self.aliases {
            if pattern.is_match(&lower) {
                found.insert(entity.clone());
            }
        }

        for (needle, entity) in &self.canonicals {
            if lower.contains(needle.as_str()) {
                found.insert(entity.clone());
            }
        }

        found
    }
}
