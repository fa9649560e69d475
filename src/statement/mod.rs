//! Statement pipeline: generation, literal rewriting and parameter binding.
//!
//! Generated or imported statement text is rewritten once, before it is
//! stored, so date ranges and day intervals become named placeholders
//! (`:start_date`, `:end_date`, `:day_range`). At execution time the binder
//! turns those names into positional parameters for Postgres.

pub mod binder;
pub mod generator;
pub mod rewriter;

pub use binder::{bind_named_parameters, BoundStatement, StatementParameter};
pub use generator::TemplateStatementGenerator;
pub use rewriter::parameterize_statement;
