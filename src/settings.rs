//! Process settings from command-line flags or the environment (`.env` is loaded first).

use clap::Parser;
use std::path::PathBuf;

#[derive(Clone, Debug, Parser)]
#[command(name = "namespace-backend", version, about = "Maps HTTP paths and parameters onto SQLite queries")]
pub struct Settings {
    /// JSON namespace file.
    #[arg(long = "ns", env = "NAMESPACE_PATH")]
    pub namespace: PathBuf,

    /// SQL script executed once at startup.
    #[arg(long = "initsql", env = "INIT_SQL")]
    pub init_sql: Option<PathBuf>,

    /// SQLite database file, created if missing.
    #[arg(long, env = "DATABASE_PATH", default_value = "backend.db")]
    pub db: PathBuf,

    /// Domain attached to session cookies.
    #[arg(long, env = "COOKIE_DOMAIN", default_value = "localhost")]
    pub domain: String,

    /// Session lifetime in hours.
    #[arg(long = "session-length", env = "SESSION_LENGTH", default_value_t = 6)]
    pub session_hours: u32,

    #[arg(long, env = "BACKEND_PORT", default_value_t = 3103)]
    pub port: u16,

    /// Ignore this many leading non-empty path segments (proxy prefix).
    #[arg(long, env = "PATH_SKIP", default_value_t = 1)]
    pub skip: usize,

    /// Secret required by `_register`. Registration is disabled when unset.
    #[arg(long, env = "REGISTER_PASSCODE")]
    pub register_passcode: Option<String>,

    /// Roles granted to newly registered users.
    #[arg(long, env = "DEFAULT_ROLES", value_delimiter = ',', default_value = "poster,reader")]
    pub default_roles: Vec<String>,

    #[arg(long, env = "MAX_CONNECTIONS", default_value_t = 4)]
    pub max_connections: u32,

    /// Largest accepted request body.
    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = 1024 * 1024)]
    pub max_body_bytes: usize,

    /// Skip the startup check that variant lists return the same columns.
    #[arg(long, env = "NO_VARIANT_COLUMN_CHECK")]
    pub no_variant_column_check: bool,

    /// Fail startup when variant lists return different columns.
    #[arg(long, env = "STRICT_VARIANT_COLUMNS", conflicts_with = "no_variant_column_check")]
    pub strict_variant_columns: bool,
}
