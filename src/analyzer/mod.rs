//! Variable-scope analysis (§4.8): declarations, the server-wide global
//! table, and the recursive walker that produces diagnostics from an AST.

pub mod declaration;
mod params;
pub mod pipeline;
mod walker;

pub use declaration::{GlobalTable, ParamSpec, SharedDeclaration, VariableDeclaration};
pub use pipeline::{run as run_pipeline, PipelineOutput};
pub use walker::{analyze, AnalysisOutcome};
