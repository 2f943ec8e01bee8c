//! Thin facade around the TL preprocessor/parser/interpreter (§4.7). The real
//! TL toolchain is an external collaborator out of scope for this crate; this
//! module provides the default, self-contained implementation the rest of the
//! server is built and tested against, behind the [`Adapter`] trait so a
//! production deployment can swap in the real VM without touching any other
//! module.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod preprocess;

use std::path::{Path, PathBuf};

use ast::Node;
use parser::{ParseError, Parser};

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("failed to preprocess or read {path}: {source}")]
    Preprocess { path: PathBuf, source: std::io::Error },
    #[error("parse error in {path} at line {line}, column {column}")]
    Parse { path: PathBuf, line: usize, column: usize },
}

/// Minimal facade exposing preprocess, parse-to-AST, and file-mount operations.
pub trait Adapter: Send + Sync {
    fn preprocess(&self, text: &str, origin_path: &Path) -> Result<String, AdapterError>;
    fn parse(&self, text: &str, origin_path: &Path) -> Result<Node, AdapterError>;
    fn mount(&self, physical: &Path, virtual_path: &str);
}

/// Default, in-process adapter: comment-stripping preprocessor plus the
/// recursive-descent lexer/parser in this module. Mounts are recorded for
/// inspection (e.g. by tests) but are otherwise inert — this crate's analysis
/// pipeline never needs to resolve a mount back to a physical path, only the
/// workspace bootstrapper needs mounts recorded at all (see `workspace.rs`).
#[derive(Default)]
pub struct DefaultAdapter {
    mounts: parking_lot::Mutex<Vec<(PathBuf, String)>>,
}

impl DefaultAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mounts(&self) -> Vec<(PathBuf, String)> {
        self.mounts.lock().clone()
    }
}

impl Adapter for DefaultAdapter {
    fn preprocess(&self, text: &str, _origin_path: &Path) -> Result<String, AdapterError> {
        Ok(preprocess::preprocess(text))
    }

    fn parse(&self, text: &str, origin_path: &Path) -> Result<Node, AdapterError> {
        Parser::new(text).parse_program().map_err(|err| match err {
            ParseError::Unexpected { line, column } => {
                AdapterError::Parse { path: origin_path.to_path_buf(), line, column }
            }
        })
    }

    fn mount(&self, physical: &Path, virtual_path: &str) {
        self.mounts.lock().push((physical.to_path_buf(), virtual_path.to_string()));
    }
}
