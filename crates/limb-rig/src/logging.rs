//! Tracing subscriber setup for the command-line tool

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Default filter when `RUST_LOG` is unset
#[must_use]
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info,limb_scene=warn"
    }
}

/// Install the global subscriber
///
/// `RUST_LOG` overrides the level picked by `verbose`. Logs go to stderr so
/// reports on stdout stay machine-readable.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init(verbose: bool, json: bool) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let json_layer = json.then(|| {
        fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    Registry::default()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_lowers_default_level() {
        assert_eq!(default_filter(true), "debug");
        assert!(default_filter(false).starts_with("info"));
    }
}
