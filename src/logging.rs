//! Tracing subscriber setup.
//!
//! `RUST_LOG` overrides the per-environment directives. Production writes
//! JSON lines carrying the active `analysis` span so every stage log keeps
//! its request id.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Environment;

/// Output shape of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl LogFormat {
    pub fn for_env(env: &Environment) -> Self {
        match env {
            Environment::Dev => Self::Pretty,
            Environment::Staging => Self::Compact,
            Environment::Prod => Self::Json,
        }
    }
}

/// Directives used when `RUST_LOG` is unset. HTTP client internals stay at
/// warn so upstream calls only show through the gateway's own events.
pub fn default_directives(env: &Environment) -> &'static str {
    match env {
        Environment::Dev => "drawing_analyzer=debug,tower_http=debug,hyper=warn,reqwest=warn,info",
        Environment::Staging => "drawing_analyzer=debug,tower_http=info,hyper=warn,reqwest=warn,info",
        Environment::Prod => "drawing_analyzer=info,tower_http=warn,warn",
    }
}

fn env_filter(env: &Environment) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(env)))
}

pub fn init_logging(env: &Environment) -> anyhow::Result<()> {
    let format = LogFormat::for_env(env);
    let registry = tracing_subscriber::registry().with(env_filter(env));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    let installed = match format {
        LogFormat::Pretty => registry
            .with(fmt_layer.pretty().with_file(true).with_line_number(true))
            .try_init(),
        LogFormat::Compact => registry.with(fmt_layer.compact()).try_init(),
        LogFormat::Json => registry
            .with(
                fmt_layer
                    .json()
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init(),
    };
    installed.context("install tracing subscriber")?;

    tracing::info!(?env, ?format, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENVS: [Environment; 3] = [Environment::Dev, Environment::Staging, Environment::Prod];

    #[test]
    fn default_directives_parse() {
        for env in ENVS {
            assert!(
                EnvFilter::try_new(default_directives(&env)).is_ok(),
                "{:?}",
                env
            );
        }
    }

    #[test]
    fn only_production_logs_json() {
        assert_eq!(LogFormat::for_env(&Environment::Dev), LogFormat::Pretty);
        assert_eq!(LogFormat::for_env(&Environment::Staging), LogFormat::Compact);
        assert_eq!(LogFormat::for_env(&Environment::Prod), LogFormat::Json);
    }

    #[test]
    fn production_keeps_analysis_events_at_info() {
        let directives = default_directives(&Environment::Prod);
        assert!(directives.starts_with("drawing_analyzer=info"));
        assert!(!directives.contains("debug"));
    }
}
