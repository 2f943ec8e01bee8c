//! Document store (§4.5, §3): a keyed arena of per-document state, never
//! removed except on teardown, guarded per-document rather than globally so
//! one large file's analysis doesn't block access to another's.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::analyzer::SharedDeclaration;
use crate::diagnostic::Diagnostic;
use crate::protocol::FoldingRange;
use crate::vm::ast::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Primary,
    Secondary,
}

/// A breadcrumb copied out of the AST at analysis time: `{node kind/token,
/// offset, line, column}`, decoupled from the AST's own lifetime so cursor
/// lookups don't need to hold a reference into it (§9 design note on
/// AST-node back-pointers).
#[derive(Debug, Clone)]
pub struct NavHint {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

pub struct Document {
    pub path: PathBuf,
    pub kind: DocumentKind,
    pub text: String,
    pub ast: Option<Node>,
    pub folding_ranges: Vec<FoldingRange>,
    pub nav_hints: Vec<NavHint>,
    pub diagnostics: Vec<Diagnostic>,
    pub private_decls: Vec<SharedDeclaration>,
    pub global_decls: Vec<SharedDeclaration>,
}

impl Document {
    fn new(path: PathBuf, kind: DocumentKind) -> Self {
        Self {
            path,
            kind,
            text: String::new(),
            ast: None,
            folding_ranges: Vec::new(),
            nav_hints: Vec::new(),
            diagnostics: Vec::new(),
            private_decls: Vec::new(),
            global_decls: Vec::new(),
        }
    }

    /// Resolves a cursor position to the nearest preceding nav hint on the
    /// same line: the hint with the greatest column that does not exceed
    /// the cursor's column.
    pub fn nav_hint_at(&self, line: usize, column: usize) -> Option<&NavHint> {
        self.nav_hints
            .iter()
            .filter(|hint| hint.line == line && hint.column <= column)
            .max_by_key(|hint| hint.column)
    }
}

pub type SharedDocument = Arc<Mutex<Document>>;

#[derive(Default)]
pub struct DocumentStore {
    docs: Mutex<HashMap<PathBuf, SharedDocument>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&self, path: &std::path::Path, kind: DocumentKind) -> SharedDocument {
        let mut docs = self.docs.lock();
        docs.entry(path.to_path_buf()).or_insert_with(|| Arc::new(Mutex::new(Document::new(path.to_path_buf(), kind)))).clone()
    }

    pub fn get(&self, path: &std::path::Path) -> Option<SharedDocument> {
        self.docs.lock().get(path).cloned()
    }

    /// Fetches (creating if absent) and runs `f` against the document while
    /// holding only that document's lock.
    pub fn locked<T>(&self, path: &std::path::Path, kind: DocumentKind, f: impl FnOnce(&mut Document) -> T) -> T {
        let doc = self.get_or_create(path, kind);
        let mut guard = doc.lock();
        f(&mut guard)
    }

    pub fn len(&self) -> usize {
        self.docs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_returns_the_same_document_on_repeat_calls() {
        let store = DocumentStore::new();
        let path = std::path::Path::new("/a.tl");
        let first = store.get_or_create(path, DocumentKind::Primary);
        first.lock().text = "hello".to_string();
        let second = store.get_or_create(path, DocumentKind::Primary);
        assert_eq!(second.lock().text, "hello");
    }

    #[test]
    fn nav_hint_at_picks_greatest_column_not_past_cursor() {
        let mut doc = Document::new(PathBuf::from("/a.tl"), DocumentKind::Primary);
        doc.nav_hints = vec![
            NavHint { offset: 0, line: 1, column: 2 },
            NavHint { offset: 5, line: 1, column: 8 },
            NavHint { offset: 9, line: 2, column: 1 },
        ];
        let hint = doc.nav_hint_at(1, 10).unwrap();
        assert_eq!(hint.column, 8);
    }

    #[test]
    fn nav_hint_at_ignores_hints_on_other_lines() {
        let mut doc = Document::new(PathBuf::from("/a.tl"), DocumentKind::Primary);
        doc.nav_hints = vec![NavHint { offset: 0, line: 5, column: 0 }];
        assert!(doc.nav_hint_at(1, 100).is_none());
    }
}
