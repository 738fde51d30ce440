//! Namespace backend server.
//!
//! Configure with flags or environment variables (see `--help`); a `.env` file is loaded first.
//! Logging follows `RUST_LOG` and defaults to `namespace_backend=info`.

use clap::Parser;
use namespace_backend::{
    app, check_variant_columns, connect_pool, load_namespace_file, run_init_script, AppState,
    ConfigError, Settings,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("namespace_backend=info")),
        )
        .init();

    let settings = Settings::parse();
    let pool = connect_pool(&settings).await?;
    if let Some(script) = &settings.init_sql {
        run_init_script(&pool, script).await?;
    }

    let namespace = load_namespace_file(&settings.namespace).await?;
    for endpoint in namespace.endpoints() {
        tracing::info!(
            path = %format!("/{}", endpoint.path.join("/")),
            params = ?endpoint.params,
            role = %endpoint.role,
            "endpoint"
        );
    }

    if settings.no_variant_column_check {
        tracing::info!("variant column check skipped");
    } else {
        let issues = check_variant_columns(&pool, &namespace).await?;
        for issue in &issues {
            tracing::warn!("{}", issue);
        }
        if settings.strict_variant_columns && !issues.is_empty() {
            return Err(ConfigError::Validation(format!(
                "{} variant column mismatch(es)",
                issues.len()
            ))
            .into());
        }
    }

    let port = settings.port;
    let state = AppState::new(pool, namespace, settings);
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
