//! locus: a C++ codebase indexer built on a libclang-style AST provider.
//!
//! Scans every source file of a project's build targets and produces an
//! entity graph: classes, structs, functions, methods, fields and typedefs
//! as nodes; membership, type usage, calls and assignments as edges. The
//! graph persists to disk and answers dependency and per-node context
//! queries.
//!
//! The engine is two-pass. Pass one ([`scan::extract`]) walks each
//! translation unit and upserts entities keyed by their source location;
//! pass two ([`scan::link`]) walks the same files again and resolves
//! references into edges, which is why it only starts after every file of
//! the target is extracted. A post-pass ([`scan::consolidate`]) folds the
//! duplicate entities that C++ forward declarations inevitably produce.
//!
//! ```no_run
//! use locus::{scan, BuildTargetConfig, CancelToken, ClangProvider, GraphStore, ProjectId};
//! use std::path::Path;
//!
//! # fn main() -> locus::Result<()> {
//! let provider = ClangProvider::new()?;
//! let mut store = GraphStore::new();
//! let targets = vec![BuildTargetConfig {
//!     name: "Motion".into(),
//!     files: vec!["src/RootNode1.h".into(), "src/RootNode1.cpp".into()],
//!     compiler_args: vec!["-std=c++17".into()],
//! }];
//! scan(
//!     &mut store,
//!     &provider,
//!     ProjectId::new(),
//!     Path::new("/path/to/project"),
//!     &targets,
//!     CancelToken::new(),
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod ast;
pub mod config;
pub mod error;
pub mod graph;
pub mod location;
pub mod query;
pub mod scan;
pub mod source;

pub use ast::libclang::ClangProvider;
pub use ast::AstProvider;
pub use config::{graph_path, ProjectConfig};
pub use error::{LocusError, Result};
pub use graph::{
    EdgeKind, EntityData, EntityId, GraphStore, Neighborhood, NodeKind, ProjectId, StoreStats,
};
pub use location::FileLocation;
pub use query::{node_context, overview, store_stats, GraphOverview, NodeContext};
pub use scan::{scan, BuildTargetConfig, CancelToken};
