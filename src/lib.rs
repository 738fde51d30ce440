//! Namespace backend: a JSON namespace file maps HTTP paths and parameter sets onto
//! parameterized SQLite queries, gated by caller roles.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod resolve;
pub mod response;
pub mod routes;
pub mod service;
pub mod session;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{load_namespace_file, load_namespace_str, NamespaceTree};
pub use error::{AppError, ConfigError, ResolveError};
pub use resolve::{resolve, Caller, Params, ResolvedQuery};
pub use routes::app;
pub use service::{check_variant_columns, QueryOutcome, QueryService};
pub use session::SessionStore;
pub use settings::Settings;
pub use state::AppState;
pub use store::{connect_pool, run_init_script};
