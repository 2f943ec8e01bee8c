//! The `VariableDeclaration` record and the server-wide global table
//! (§3, §5 "global-declaration table guarded by a dedicated mutex").

use std::sync::Arc;

use parking_lot::Mutex;

use crate::diagnostic::Position;

/// One allowed-type/optional-flag slot for a callable's parameter list.
/// Populated by `params` validation; empty for ordinary variables.
#[derive(Debug, Clone, Default)]
pub struct ParamSpec {
    pub allowed_types: Vec<String>,
    pub optional: bool,
}

/// A single known variable, private or global, tracked by the scope walker.
#[derive(Debug, Clone)]
pub struct VariableDeclaration {
    pub name: String,
    pub level: usize,
    pub declared_at: Position,
    pub usages: Vec<Position>,
    pub inferred_types: Vec<String>,
    pub params: Option<Vec<ParamSpec>>,
    /// Document path this declaration belongs to; empty for purely
    /// function-private variables that never leave their document.
    pub owner_path: String,
}

impl VariableDeclaration {
    pub fn new(name: String, level: usize, declared_at: Position, owner_path: String) -> Self {
        Self {
            name,
            level,
            declared_at,
            usages: Vec::new(),
            inferred_types: Vec::new(),
            params: None,
            owner_path,
        }
    }

    pub fn is_private(&self) -> bool {
        self.name.starts_with('_')
    }
}

pub type SharedDeclaration = Arc<Mutex<VariableDeclaration>>;

/// Server-wide table of global (non-`_`-prefixed) declarations, shared across
/// every document. Readers always take the lock and clone a snapshot rather
/// than holding a reference across an await point.
#[derive(Default)]
pub struct GlobalTable {
    inner: Mutex<Vec<SharedDeclaration>>,
}

impl GlobalTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, decl: SharedDeclaration) {
        self.inner.lock().push(decl);
    }

    /// Snapshot of every global declaration currently known, for completion
    /// and nav-hint lookups that must not hold the lock while iterating.
    pub fn snapshot(&self) -> Vec<SharedDeclaration> {
        self.inner.lock().clone()
    }

    /// Drops every global declaration previously published by `owner_path`,
    /// called before re-analyzing a document so stale globals don't linger.
    pub fn retract(&self, owner_path: &str) {
        self.inner.lock().retain(|d| d.lock().owner_path != owner_path);
    }
}
