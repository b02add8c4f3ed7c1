use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Profile;

/// Installs the global tracing subscriber. `RUST_LOG` overrides the profile default.
/// Dev logs are human readable, prod logs are one JSON object per line.
pub fn init_logging(profile: Profile) {
    let default_filter = match profile {
        Profile::Dev => "info,flowtels=debug,sqlx=info",
        Profile::Prod => "warn,flowtels=info,actix_web=info",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let registry = tracing_subscriber::registry().with(filter);

    // try_init: tests and repeated CLI invocations may have installed one already
    let result = match profile {
        Profile::Dev => registry.with(fmt::layer().with_target(true)).try_init(),
        Profile::Prod => registry
            .with(fmt::layer().json().with_current_span(false).with_thread_ids(true))
            .try_init(),
    };

    if let Err(e) = result {
        tracing::debug!("tracing subscriber already installed: {e}");
    }
}
