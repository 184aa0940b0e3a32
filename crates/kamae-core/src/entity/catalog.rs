//! # Entity Catalog
//!
//! Static configuration shared by every stage: which entities carry a stance,
//! which wide-table column holds it, and which surface forms refer to them.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{KamaeError, Result};
use crate::types::NO_ENTITY;

/// One stance target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpec {
    /// Canonical name, e.g. "Brian Thompson".
    pub name: String,
    /// Stance column in the wide annotation table.
    pub column: String,
    /// Lowercase aliases that refer to this entity.
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl EntitySpec {
    pub fn new(name: impl Into<String>, column: impl Into<String>, aliases: &[&str]) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Many-to-one mapping from lowercase alias to canonical entity name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    aliases: BTreeMap<String, String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `alias` (lowercased) to `entity`.
    ///
    /// # Errors
    ///
    /// Returns `KamaeError::InvalidCatalog` if the alias is already bound to a
    /// different entity.
    pub fn insert(&mut self, alias: &str, entity: &str) -> Result<()> {
        let alias = alias.trim().to_lowercase();
        if alias.is_empty() {
            return Err(KamaeError::InvalidCatalog(format!(
                "empty alias for entity {entity:?}"
            )));
        }
        match self.aliases.get(&alias) {
            Some(existing) if existing != entity => Err(KamaeError::InvalidCatalog(format!(
                "alias {alias:?} maps to both {existing:?} and {entity:?}"
            ))),
            _ => {
                self.aliases.insert(alias, entity.to_string());
                Ok(())
            }
        }
    }

    pub fn get(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(a, e)| (a.as_str(), e.as_str()))
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

#[derive(Deserialize)]
struct RawCatalog {
    entities: Vec<EntitySpec>,
}

/// Ordered, validated list of stance targets.
///
/// Order matters: the dataset reshaper unpivots columns in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityCatalog {
    entities: Vec<EntitySpec>,
}

impl EntityCatalog {
    /// Builds a catalog, normalizing aliases to lowercase.
    ///
    /// # Errors
    ///
    /// Returns `KamaeError::InvalidCatalog` for empty or duplicate names and
    /// columns, a name equal to [`NO_ENTITY`], or an alias shared by two
    /// entities.
    pub fn new(entities: Vec<EntitySpec>) -> Result<Self> {
        if entities.is_empty() {
            return Err(KamaeError::InvalidCatalog("no entities declared".into()));
        }

        let mut names = HashSet::new();
        let mut columns = HashSet::new();
        let mut aliases = AliasTable::new();
        let mut normalized = Vec::with_capacity(entities.len());

        for mut spec in entities {
            spec.name = spec.name.trim().to_string();
            spec.column = spec.column.trim().to_string();
            if spec.name.is_empty() || spec.column.is_empty() {
                return Err(KamaeError::InvalidCatalog(
                    "entity name and column must be non-empty".into(),
                ));
            }
            if spec.name == NO_ENTITY {
                return Err(KamaeError::InvalidCatalog(format!(
                    "entity name {NO_ENTITY:?} is reserved for texts without entities"
                )));
            }
            if !names.insert(spec.name.clone()) {
                return Err(KamaeError::InvalidCatalog(format!(
                    "duplicate entity {:?}",
                    spec.name
                )));
            }
            if !columns.insert(spec.column.clone()) {
                return Err(KamaeError::InvalidCatalog(format!(
                    "duplicate column {:?}",
                    spec.column
                )));
            }
            for alias in &spec.aliases {
                aliases.insert(alias, &spec.name)?;
            }
            spec.aliases = spec
                .aliases
                .iter()
                .map(|a| a.trim().to_lowercase())
                .collect();
            normalized.push(spec);
        }

        Ok(Self {
            entities: normalized,
        })
    }

    /// Parses a catalog from a JSON document of the form
    /// `{"entities": [{"name": ..., "column": ..., "aliases": [...]}]}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawCatalog = serde_json::from_str(json)
            .map_err(|e| KamaeError::InvalidCatalog(format!("malformed JSON: {e}")))?;
        Self::new(raw.entities)
    }

    /// Loads a catalog from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| KamaeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RawCatalog =
            serde_json::from_str(&content).map_err(|source| KamaeError::Json {
                path: path.to_path_buf(),
                line: source.line(),
                source,
            })?;
        Self::new(raw.entities)
    }

    pub fn entities(&self) -> &[EntitySpec] {
        &self.entities
    }

    /// Canonical names in catalog order.
    pub fn canonical_names(&self) -> Vec<&str> {
        self.entities.iter().map(|e| e.name.as_str()).collect()
    }

    /// `(column, entity)` pairs in catalog order.
    pub fn column_mapping(&self) -> Vec<(&str, &str)> {
        self.entities
            .iter()
            .map(|e| (e.column.as_str(), e.name.as_str()))
            .collect()
    }

    /// Flattened alias table. Cannot conflict, `new` already checked.
    pub fn alias_table(&self) -> AliasTable {
        let mut table = AliasTable::new();
        for spec in &self.entities {
            for alias in &spec.aliases {
                table.aliases.insert(alias.clone(), spec.name.clone());
            }
        }
        table
    }
}

impl Default for EntityCatalog {
    fn default() -> Self {
        Self {
            entities: vec![
                EntitySpec::new("Luigi Mangione", "stance_toward_luigi", &["luigi", "mangione"]),
                EntitySpec::new(
                    "Brian Thompson",
                    "stance_toward_brian",
                    &["brian", "thompson", "ceo"],
                ),
                EntitySpec::new(
                    "United Healthcare",
                    "stance_toward_united",
                    &[
                        "united",
                        "unitedhealthcare",
                        "united healthcare",
                        "uhc",
                        "insurance",
                    ],
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_is_valid() {
        let catalog = EntityCatalog::default();
        let rebuilt = EntityCatalog::new(catalog.entities().to_vec()).unwrap();
        assert_eq!(rebuilt, catalog);
        assert!(catalog
            .column_mapping()
            .contains(&("stance_toward_brian", "Brian Thompson")));
    }

    #[test]
    fn alias_table_is_many_to_one() {
        let table = EntityCatalog::default().alias_table();
        assert_eq!(table.get("mangione"), Some("Luigi Mangione"));
        assert_eq!(table.get("luigi"), Some("Luigi Mangione"));
        assert_eq!(table.get("uhc"), Some("United Healthcare"));
        assert_eq!(table.get("nobody"), None);
    }

    #[test]
    fn aliases_are_lowercased() {
        let catalog =
            EntityCatalog::new(vec![EntitySpec::new("Acme", "stance_acme", &["ACME Corp"])])
                .unwrap();
        assert_eq!(catalog.alias_table().get("acme corp"), Some("Acme"));
    }

    #[test]
    fn conflicting_alias_is_rejected() {
        let result = EntityCatalog::new(vec![
            EntitySpec::new("A", "col_a", &["shared"]),
            EntitySpec::new("B", "col_b", &["shared"]),
        ]);
        assert!(matches!(result, Err(KamaeError::InvalidCatalog(_))));
    }

    #[test]
    fn repeated_alias_for_same_entity_is_idempotent() {
        let mut table = AliasTable::new();
        table.insert("ceo", "Brian Thompson").unwrap();
        table.insert("CEO", "Brian Thompson").unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn duplicate_column_is_rejected() {
        let result = EntityCatalog::new(vec![
            EntitySpec::new("A", "col", &[]),
            EntitySpec::new("B", "col", &[]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn catalog_from_json() {
        let json = r#"{"entities": [
            {"name": "Brian Thompson", "column": "stance_toward_brian", "aliases": ["Thompson"]},
            {"name": "United Healthcare", "column": "stance_toward_united"}
        ]}"#;
        let catalog = EntityCatalog::from_json_str(json).unwrap();
        assert_eq!(
            catalog.column_mapping(),
            vec![
                ("stance_toward_brian", "Brian Thompson"),
                ("stance_toward_united", "United Healthcare"),
            ]
        );
        assert_eq!(catalog.alias_table().get("thompson"), Some("Brian Thompson"));
    }

    #[test]
    fn sentinel_name_is_rejected() {
        let result = EntityCatalog::new(vec![EntitySpec::new("None", "stance_none", &["nada"])]);
        assert!(matches!(result, Err(KamaeError::InvalidCatalog(_))));

        let json = r#"{"entities": [{"name": " None ", "column": "stance_none"}]}"#;
        assert!(matches!(
            EntityCatalog::from_json_str(json),
            Err(KamaeError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn malformed_file_reports_the_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"{\"entities\": [\n  {\"name\": }\n]}\n").unwrap();

        let err = EntityCatalog::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, KamaeError::Json { line: 2, .. }));
    }

    #[test]
    fn catalog_from_missing_file_names_the_path() {
        let err = EntityCatalog::from_json_file("does/not/exist.json").unwrap_err();
        assert!(err.to_string().contains("does/not/exist.json"));
    }
}
