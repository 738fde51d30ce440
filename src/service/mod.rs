//! QueryService: executes resolved queries; startup column checks.

mod columns;
mod query;
pub use columns::{check_variant_columns, VariantColumnIssue};
pub use query::{QueryOutcome, QueryService};
