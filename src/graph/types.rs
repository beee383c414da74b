//! Core types for the locus entity graph.
//!
//! Defines node kinds, edge kinds, and the data structures that represent
//! extracted C++ declarations and their relationships.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::location::FileLocation;

/// The kind of a declaration entity in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A class declaration.
    Class,
    /// A struct declaration.
    Struct,
    /// A free function.
    Function,
    /// A member function.
    Method,
    Constructor,
    Destructor,
    /// A data member.
    Field,
    /// A typedef or type alias.
    Typedef,
}

impl NodeKind {
    /// Class-like kinds: subject to forward-declaration consolidation.
    pub fn is_class_like(self) -> bool {
        matches!(self, NodeKind::Class | NodeKind::Struct)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Class => write!(f, "class"),
            NodeKind::Struct => write!(f, "struct"),
            NodeKind::Function => write!(f, "function"),
            NodeKind::Method => write!(f, "method"),
            NodeKind::Constructor => write!(f, "constructor"),
            NodeKind::Destructor => write!(f, "destructor"),
            NodeKind::Field => write!(f, "field"),
            NodeKind::Typedef => write!(f, "typedef"),
        }
    }
}

/// The kind of an edge (relationship) in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Owner has member (Class -> Field/Method).
    Contains,
    /// Owner's definition references a type (Entity -> Class/Struct/Typedef).
    UsesType,
    /// Owner's body calls or reads a symbol.
    References,
    /// Owner's body assigns to a value of the target type. `operator=`
    /// overloads are linked through the type declaration, not the overload.
    Assigns,
}

impl EdgeKind {
    /// Edge kinds that make their source a dependency holder.
    pub fn is_dependency(self) -> bool {
        matches!(self, EdgeKind::References | EdgeKind::Assigns)
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Contains => write!(f, "contains"),
            EdgeKind::UsesType => write!(f, "uses_type"),
            EdgeKind::References => write!(f, "references"),
            EdgeKind::Assigns => write!(f, "assigns"),
        }
    }
}

/// Stable entity identifier assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owning project identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub Uuid);

impl ProjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A location attached to an entity, with cached presentation data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanRecord {
    pub location: FileLocation,
    /// Pretty-printed signature (declaration header without body).
    pub display_name: Option<String>,
    /// Raw source text of the range.
    pub source_text: Option<String>,
}

impl SpanRecord {
    pub fn bare(location: FileLocation) -> Self {
        Self {
            location,
            display_name: None,
            source_text: None,
        }
    }
}

/// Data stored in a graph node: one declared program element.
///
/// An entity has at most one define location and any number of
/// implementation locations (inline and templated definitions may repeat per
/// translation unit); at least one of the two ends up populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityData {
    pub id: EntityId,
    pub project: ProjectId,
    pub build_target: String,
    pub kind: NodeKind,
    /// Identifier name; `None` for anonymous entities.
    pub spelling: Option<String>,
    /// Resolved type spelling.
    pub type_spelling: String,
    /// Enclosing `::`-joined namespace path.
    pub namespace: Option<String>,
    /// Opaque annotations written by downstream consumers, never by the
    /// engine itself.
    pub generated_description: Option<String>,
    pub user_description: Option<String>,
    pub define: Option<SpanRecord>,
    pub implementations: Vec<SpanRecord>,
    /// `#include` lines captured from translation units that implement this
    /// entity; contextual metadata for downstream consumers.
    pub includes: Vec<String>,
    /// Soft-delete flag. Removed nodes are skipped in queries and cleaned up
    /// during compaction.
    #[serde(default)]
    pub removed: bool,
}

impl EntityData {
    /// Best human-readable label: cached define display name, then the first
    /// implementation's, then the spelling, then the type spelling.
    pub fn display_label(&self) -> String {
        self.define
            .as_ref()
            .and_then(|d| d.display_name.clone())
            .or_else(|| {
                self.implementations
                    .iter()
                    .find_map(|i| i.display_name.clone())
            })
            .or_else(|| self.spelling.clone())
            .unwrap_or_else(|| self.type_spelling.clone())
    }
}

/// Data stored on a graph edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeData {
    pub kind: EdgeKind,
}

impl EdgeData {
    pub fn new(kind: EdgeKind) -> Self {
        Self { kind }
    }
}

/// Payload for entity upserts; identity fields only, locations and cached
/// text travel separately.
#[derive(Debug, Clone)]
pub struct NewEntity {
    pub kind: NodeKind,
    pub spelling: Option<String>,
    pub type_spelling: String,
    pub namespace: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_label_precedence() {
        let mut e = EntityData {
            id: EntityId(1),
            project: ProjectId::new(),
            build_target: "Motion".into(),
            kind: NodeKind::Method,
            spelling: Some("run".into()),
            type_spelling: "void ()".into(),
            namespace: None,
            generated_description: None,
            user_description: None,
            define: None,
            implementations: vec![],
            includes: vec![],
            removed: false,
        };
        assert_eq!(e.display_label(), "run");

        e.implementations.push(SpanRecord {
            location: FileLocation::new("a.cpp", 2, 1, 4, 2),
            display_name: Some("void Node::run()".into()),
            source_text: None,
        });
        assert_eq!(e.display_label(), "void Node::run()");

        e.define = Some(SpanRecord {
            location: FileLocation::new("a.h", 1, 1, 1, 10),
            display_name: Some("void run()".into()),
            source_text: None,
        });
        assert_eq!(e.display_label(), "void run()");
    }

    #[test]
    fn test_kind_helpers() {
        assert!(NodeKind::Class.is_class_like());
        assert!(NodeKind::Struct.is_class_like());
        assert!(!NodeKind::Method.is_class_like());
        assert!(EdgeKind::References.is_dependency());
        assert!(EdgeKind::Assigns.is_dependency());
        assert!(!EdgeKind::Contains.is_dependency());
    }
}
