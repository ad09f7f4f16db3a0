//! # Link Registry
//!
//! Edge types ("links") of the knowledge graph.
//!
//! Every edge type has an opposite: undirected types are their own opposite,
//! and a directed type `name` is registered together with a reverse type
//! `name-opp`. Registered records are immutable and the registry is
//! append-only for its lifetime.

use crate::primitives::{OPPOSITE_SUFFIX, TRANSITIVE_OPTION};
use crate::{Data, NoemaError};
use serde::Serialize;
use std::collections::BTreeMap;

// =============================================================================
// EDGE TYPE
// =============================================================================

/// An immutable edge-type record.
///
/// Fields are private; there are no setters. `opposite` is the registry key
/// of the reverse type, so `opposite(opposite(t)) == t` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeType {
    name: String,
    opposite: String,
    transitive: bool,
    #[serde(rename = "isOpp")]
    is_opp: bool,
    options: Data,
}

impl EdgeType {
    /// The unique name of this type.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registry key of the reverse type.
    #[must_use]
    pub fn opposite_name(&self) -> &str {
        &self.opposite
    }

    /// Whether neighbors are found by transitive closure.
    #[must_use]
    pub fn is_transitive(&self) -> bool {
        self.transitive
    }

    /// True for the generated reverse of a directed type.
    #[must_use]
    pub fn is_opp(&self) -> bool {
        self.is_opp
    }

    /// True if this type is its own opposite.
    #[must_use]
    pub fn is_undirected(&self) -> bool {
        self.name == self.opposite
    }

    /// Free-form configuration, including the `transitive` flag.
    #[must_use]
    pub fn options(&self) -> &Data {
        &self.options
    }

    /// Look up a single configuration option.
    #[must_use]
    pub fn option(&self, key: &str) -> Option<&serde_json::Value> {
        self.options.get(key)
    }
}

/// Name of the generated reverse of a directed type.
fn opposite_name_for(name: &str) -> String {
    match name.strip_suffix(OPPOSITE_SUFFIX) {
        Some(base) if !base.is_empty() => base.to_string(),
        _ => format!("{}{}", name, OPPOSITE_SUFFIX),
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Append-only registry of edge types.
#[derive(Debug, Clone, Default)]
pub struct LinkRegistry {
    types: BTreeMap<String, EdgeType>,
    /// Registration order, for listing.
    order: Vec<String>,
}

impl LinkRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an edge type.
    ///
    /// `options` is merged over `{ "transitive": false }`; caller-supplied
    /// `name` and `opposite` keys are stripped. A directed type also
    /// registers its reverse, which shares the same options.
    ///
    /// Returns the type registered under `name`.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for an empty name or a non-boolean `transitive`
    /// - `LinkTypeExists` if `name` (or its opposite) is already registered
    pub fn create(
        &mut self,
        name: &str,
        undirected: bool,
        options: Data,
    ) -> Result<EdgeType, NoemaError> {
        if name.is_empty() {
            return Err(NoemaError::invalid("link type name must not be empty"));
        }

        let mut merged = Data::new();
        merged.insert(TRANSITIVE_OPTION.to_string(), serde_json::Value::Bool(false));
        for (key, value) in options {
            if key == "name" || key == "opposite" {
                continue;
            }
            merged.insert(key, value);
        }
        let transitive = match merged.get(TRANSITIVE_OPTION) {
            Some(serde_json::Value::Bool(flag)) => *flag,
            Some(other) => {
                return Err(NoemaError::invalid(format!(
                    "option 'transitive' of link type '{}' must be a boolean, got {}",
                    name, other
                )));
            }
            None => false,
        };

        let opposite = if undirected {
            name.to_string()
        } else {
            opposite_name_for(name)
        };

        if self.types.contains_key(name) {
            return Err(NoemaError::LinkTypeExists(name.to_string()));
        }
        if self.types.contains_key(&opposite) {
            return Err(NoemaError::LinkTypeExists(opposite));
        }

        let forward = EdgeType {
            name: name.to_string(),
            opposite: opposite.clone(),
            transitive,
            is_opp: false,
            options: merged.clone(),
        };
        self.order.push(forward.name.clone());
        self.types.insert(forward.name.clone(), forward.clone());

        if !undirected {
            let reverse = EdgeType {
                name: opposite.clone(),
                opposite: name.to_string(),
                transitive,
                is_opp: true,
                options: merged,
            };
            self.order.push(opposite.clone());
            self.types.insert(opposite, reverse);
        }

        tracing::debug!(link = name, undirected, transitive, "registered link type");
        Ok(forward)
    }

    /// Look up a registered type by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&EdgeType> {
        self.types.get(name)
    }

    /// Look up a type by name, failing with `InvalidArgument` if unknown.
    pub fn require(&self, name: &str) -> Result<&EdgeType, NoemaError> {
        self.get(name)
            .ok_or_else(|| NoemaError::invalid(format!("unknown link type '{}'", name)))
    }

    /// Check that `link` is exactly the record registered under its name.
    ///
    /// Guards against edge types built by another registry.
    pub fn validate(&self, link: &EdgeType) -> Result<(), NoemaError> {
        match self.get(link.name()) {
            Some(registered) if registered == link => Ok(()),
            _ => Err(NoemaError::invalid(format!(
                "'{}' is not a registered link type",
                link.name()
            ))),
        }
    }

    /// The opposite of a registered type.
    pub fn opposite(&self, link: &EdgeType) -> Result<&EdgeType, NoemaError> {
        self.validate(link)?;
        self.require(link.opposite_name())
    }

    /// All registered types in registration order.
    pub fn list(&self) -> impl Iterator<Item = &EdgeType> {
        self.order.iter().filter_map(|name| self.types.get(name))
    }

    /// Number of registered types (a directed pair counts twice).
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transitive() -> Data {
        let mut options = Data::new();
        options.insert("transitive".to_string(), json!(true));
        options
    }

    #[test]
    fn directed_type_registers_opposite_pair() {
        let mut registry = LinkRegistry::new();
        let link = registry
            .create("thought_description", false, Data::new())
            .expect("create");

        assert_eq!(link.opposite_name(), "thought_description-opp");
        assert!(!link.is_opp());

        let opp = registry.opposite(&link).expect("opposite");
        assert!(opp.is_opp());
        assert_eq!(opp.opposite_name(), link.name());
        assert_eq!(registry.opposite(opp).expect("opposite"), &link);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn undirected_type_is_its_own_opposite() {
        let mut registry = LinkRegistry::new();
        let link = registry.create("sibling", true, Data::new()).expect("create");

        assert!(link.is_undirected());
        assert_eq!(registry.opposite(&link).expect("opposite"), &link);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn options_merge_over_defaults_and_strip_identity_keys() {
        let mut registry = LinkRegistry::new();
        let mut options = transitive();
        options.insert("name".to_string(), json!("hijack"));
        options.insert("opposite".to_string(), json!("hijack"));
        options.insert("color".to_string(), json!("red"));

        let link = registry.create("type_of", false, options).expect("create");
        assert_eq!(link.name(), "type_of");
        assert!(link.is_transitive());
        assert_eq!(link.option("color"), Some(&json!("red")));
        assert!(link.option("name").is_none());

        let plain = registry.create("context", false, Data::new()).expect("create");
        assert_eq!(plain.option("transitive"), Some(&json!(false)));
    }

    #[test]
    fn opposite_shares_transitivity() {
        let mut registry = LinkRegistry::new();
        let link = registry.create("type_of", false, transitive()).expect("create");
        assert!(registry.opposite(&link).expect("opposite").is_transitive());
    }

    #[test]
    fn already_suffixed_name_strips_suffix_for_opposite() {
        let mut registry = LinkRegistry::new();
        let link = registry.create("parent-opp", false, Data::new()).expect("create");
        assert_eq!(link.opposite_name(), "parent");
    }

    #[test]
    fn reregistration_fails() {
        let mut registry = LinkRegistry::new();
        registry.create("d", false, Data::new()).expect("create");

        assert!(matches!(
            registry.create("d", false, Data::new()),
            Err(NoemaError::LinkTypeExists(_))
        ));
        assert!(matches!(
            registry.create("d-opp", true, Data::new()),
            Err(NoemaError::LinkTypeExists(_))
        ));
    }

    #[test]
    fn rejects_bad_input() {
        let mut registry = LinkRegistry::new();
        assert!(matches!(
            registry.create("", false, Data::new()),
            Err(NoemaError::InvalidArgument(_))
        ));

        let mut options = Data::new();
        options.insert("transitive".to_string(), json!("yes"));
        assert!(matches!(
            registry.create("x", false, options),
            Err(NoemaError::InvalidArgument(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn foreign_edge_type_fails_validation() {
        let mut ours = LinkRegistry::new();
        let mut theirs = LinkRegistry::new();
        ours.create("d", false, Data::new()).expect("create");
        let foreign = theirs.create("d", false, transitive()).expect("create");

        assert!(ours.validate(&foreign).is_err());
    }

    #[test]
    fn list_preserves_registration_order() {
        let mut registry = LinkRegistry::new();
        registry.create("b", false, Data::new()).expect("create");
        registry.create("a", true, Data::new()).expect("create");

        let names: Vec<_> = registry.list().map(EdgeType::name).collect();
        assert_eq!(names, vec!["b", "b-opp", "a"]);
    }
}
