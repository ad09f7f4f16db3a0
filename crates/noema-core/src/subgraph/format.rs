//! Text form of a subgraph.
//!
//! A subgraph is stored as JSON, typically inside a node's data:
//!
//! ```json
//! {"vertices":[{"matcher":"id","arg":"1"},
//!              {"matcher":"similar","arg":{"value":10},"idea":"3"}],
//!  "edges":[{"src":"0","link":"thought_description","dst":"1","pref":0}]}
//! ```
//!
//! `arg` depends on the matcher kind: a node id for `id`, nothing for
//! `filler`, an attribute map for `similar` and literal `exact`. A
//! referencing `exact` stores the referenced vertex id in `arg` and sets
//! `options.matchRef` to `true`. `Id` vertices never carry `idea`; it is
//! implied by `arg`.

use super::{ExactTemplate, Matcher, Subgraph, VertexId};
use crate::links::LinkRegistry;
use crate::primitives::MATCH_REF_OPTION;
use crate::{Data, NodeHandle, NodeId, NoemaError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// DOCUMENT TYPES
// =============================================================================

/// Serde representation of a subgraph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubgraphDocument {
    /// Vertices in id order.
    #[serde(default)]
    pub vertices: Vec<VertexDocument>,
    /// Edges in insertion order.
    #[serde(default)]
    pub edges: Vec<EdgeDocument>,
}

/// Serde representation of a vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexDocument {
    /// Matcher kind: `id`, `filler`, `similar` or `exact`.
    pub matcher: String,
    /// Matcher argument.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub arg: Value,
    /// Vertex options.
    #[serde(default, skip_serializing_if = "Data::is_empty")]
    pub options: Data,
    /// Current resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idea: Option<NodeId>,
}

/// Serde representation of an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDocument {
    /// Source vertex.
    pub src: VertexId,
    /// Name of a registered link type.
    pub link: String,
    /// Destination vertex.
    pub dst: VertexId,
    /// Search preference.
    #[serde(default)]
    pub pref: i64,
}

// =============================================================================
// CONVERSION
// =============================================================================

impl Subgraph {
    /// Build the serde representation.
    ///
    /// With `drop_ideas` the resolutions of non-`id` vertices are omitted,
    /// leaving only the pattern.
    #[must_use]
    pub fn to_document(&self, drop_ideas: bool) -> SubgraphDocument {
        let vertices = self
            .vertices
            .iter()
            .map(|vertex| {
                let mut options = vertex.options.clone();
                let arg = match &vertex.matcher {
                    Matcher::Id(handle) => Value::String(handle.id.to_string()),
                    Matcher::Filler => Value::Null,
                    Matcher::Similar(template) => Value::Object(template.clone()),
                    Matcher::Exact(ExactTemplate::Literal(template)) => {
                        Value::Object(template.clone())
                    }
                    Matcher::Exact(ExactTemplate::Ref(target)) => {
                        options.insert(MATCH_REF_OPTION.to_string(), Value::Bool(true));
                        Value::String(target.to_string())
                    }
                };
                let idea = match (&vertex.matcher, drop_ideas) {
                    (Matcher::Id(_), _) | (_, true) => None,
                    _ => vertex.idea.as_ref().map(|handle| handle.id.clone()),
                };
                VertexDocument {
                    matcher: vertex.matcher.kind().to_string(),
                    arg,
                    options,
                    idea,
                }
            })
            .collect();

        let edges = self
            .edges
            .iter()
            .map(|edge| EdgeDocument {
                src: edge.src,
                link: edge.link.name().to_string(),
                dst: edge.dst,
                pref: edge.pref,
            })
            .collect();

        SubgraphDocument { vertices, edges }
    }

    /// Rebuild a subgraph, resolving link names against `registry`.
    pub fn from_document(
        document: &SubgraphDocument,
        registry: &LinkRegistry,
    ) -> Result<Self, NoemaError> {
        let mut subgraph = Subgraph::new();

        for (index, vertex) in document.vertices.iter().enumerate() {
            let matcher = matcher_from_document(index, vertex)?;
            let pinned = matches!(matcher, Matcher::Id(_));
            let id = subgraph.add_vertex_with(matcher, vertex.options.clone());
            if let (Some(idea), false) = (&vertex.idea, pinned) {
                subgraph.set_idea(id, NodeHandle::new(idea))?;
            }
        }

        for edge in &document.edges {
            let link = registry.require(&edge.link)?;
            subgraph.add_edge_with_pref(edge.src, link, edge.dst, edge.pref)?;
        }

        subgraph.validate(registry)?;
        Ok(subgraph)
    }

    /// Serialize to JSON text.
    pub fn stringify(&self, drop_ideas: bool) -> Result<String, NoemaError> {
        serde_json::to_string(&self.to_document(drop_ideas))
            .map_err(|e| NoemaError::Serialization(e.to_string()))
    }

    /// Parse JSON text produced by `stringify`.
    pub fn parse(text: &str, registry: &LinkRegistry) -> Result<Self, NoemaError> {
        let document: SubgraphDocument = serde_json::from_str(text)
            .map_err(|e| NoemaError::Deserialization(format!("subgraph: {}", e)))?;
        Self::from_document(&document, registry)
    }
}

fn matcher_from_document(index: usize, vertex: &VertexDocument) -> Result<Matcher, NoemaError> {
    let bad_arg = |expected: &str| {
        NoemaError::invalid(format!(
            "vertex {}: '{}' matcher expects {}, got {}",
            index, vertex.matcher, expected, vertex.arg
        ))
    };

    match vertex.matcher.as_str() {
        "id" => match &vertex.arg {
            Value::String(id) => Ok(Matcher::Id(NodeHandle::new(id.as_str()))),
            _ => Err(bad_arg("a node id")),
        },
        "filler" => match &vertex.arg {
            Value::Null => Ok(Matcher::Filler),
            _ => Err(bad_arg("no argument")),
        },
        "similar" => match &vertex.arg {
            Value::Object(template) => Ok(Matcher::Similar(template.clone())),
            Value::Null => Ok(Matcher::Similar(Data::new())),
            _ => Err(bad_arg("an object")),
        },
        "exact" => {
            let by_ref = match vertex.options.get(MATCH_REF_OPTION) {
                None => false,
                Some(Value::Bool(flag)) => *flag,
                Some(other) => {
                    return Err(NoemaError::invalid(format!(
                        "vertex {}: option '{}' must be a boolean, got {}",
                        index, MATCH_REF_OPTION, other
                    )));
                }
            };
            match (&vertex.arg, by_ref) {
                (Value::String(target), true) => target
                    .parse::<usize>()
                    .map(|i| Matcher::Exact(ExactTemplate::Ref(VertexId::new(i))))
                    .map_err(|_| bad_arg("a vertex id")),
                (_, true) => Err(bad_arg("a vertex id")),
                (Value::Object(template), false) => {
                    Ok(Matcher::Exact(ExactTemplate::Literal(template.clone())))
                }
                (Value::Null, false) => Ok(Matcher::Exact(ExactTemplate::Literal(Data::new()))),
                (_, false) => Err(bad_arg("an object")),
            }
        }
        other => Err(NoemaError::invalid(format!(
            "vertex {}: unknown matcher kind '{}'",
            index, other
        ))),
    }
}

// =============================================================================
// TESTS
// =============================================================================
