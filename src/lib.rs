//! `tl-lsp`: a language server for TL, a target scripting language analyzed
//! over a small default VM adapter (see `vm`). See `server` for the
//! protocol-facing entry point and `analyzer` for the variable-scope
//! analysis core.

pub mod analyzer;
pub mod config;
pub mod diagnostic;
pub mod discover;
pub mod document;
pub mod output;
pub mod position;
pub mod protocol;
pub mod rpc;
pub mod server;
pub mod transport;
pub mod transpile;
pub mod uri;
pub mod vm;
pub mod workspace;
