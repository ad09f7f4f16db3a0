//! Vertex matchers.
//!
//! A closed set of acceptance predicates, dispatched by `match`.

use super::VertexId;
use crate::{Data, NodeHandle};

/// Template of an `Exact` matcher.
#[derive(Debug, Clone, PartialEq)]
pub enum ExactTemplate {
    /// Compare against a fixed attribute map.
    Literal(Data),
    /// Compare against the data of whatever node another vertex is bound to.
    Ref(VertexId),
}

/// Acceptance predicate attached to a pattern vertex.
#[derive(Debug, Clone, PartialEq)]
pub enum Matcher {
    /// Pre-bound to one node.
    Id(NodeHandle),
    /// Accepts any node; constrained only by its edges.
    Filler,
    /// Accepts a node whose data contains every key of the template with an
    /// equal value.
    Similar(Data),
    /// Accepts a node whose data deep-equals the template.
    Exact(ExactTemplate),
}

impl Matcher {
    /// Name of the matcher kind, as used in the text format.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Id(_) => "id",
            Self::Filler => "filler",
            Self::Similar(_) => "similar",
            Self::Exact(_) => "exact",
        }
    }

    /// Vertex whose binding this matcher compares against, if any.
    #[must_use]
    pub fn ref_target(&self) -> Option<VertexId> {
        match self {
            Self::Exact(ExactTemplate::Ref(target)) => Some(*target),
            _ => None,
        }
    }

    /// Check if `accepts` inspects the candidate's data.
    #[must_use]
    pub fn needs_data(&self) -> bool {
        matches!(self, Self::Similar(_) | Self::Exact(_))
    }

    /// Decide whether `candidate` (with attribute map `data`) satisfies
    /// this matcher.
    ///
    /// `referenced` is the data of the node bound to `ref_target()`. When
    /// that vertex is still unbound the reference cannot be checked yet and
    /// the candidate is accepted; the search re-checks the pair once the
    /// referenced vertex is bound.
    #[must_use]
    pub fn accepts(&self, candidate: &NodeHandle, data: &Data, referenced: Option<&Data>) -> bool {
        match self {
            Self::Id(handle) => handle == candidate,
            Self::Filler => true,
            Self::Similar(template) => template
                .iter()
                .all(|(key, expected)| data.get(key) == Some(expected)),
            Self::Exact(ExactTemplate::Literal(template)) => template == data,
            Self::Exact(ExactTemplate::Ref(_)) => referenced.is_none_or(|other| other == data),
        }
    }
}
