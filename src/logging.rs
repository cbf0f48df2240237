use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// The filter used when `RUST_LOG` is unset, by number of `-v` flags.
fn default_directive(verbosity: u8) -> Option<&'static str> {
    match verbosity {
        0 => None,
        1 => Some("shodanx=debug"),
        _ => Some("shodanx=trace"),
    }
}

/// Installs a stderr subscriber when `-v` is given or `RUST_LOG` is set.
/// Otherwise library events are discarded.
pub(crate) fn init_tracing(verbosity: u8) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => match default_directive(verbosity) {
            Some(directive) => EnvFilter::new(directive),
            None => return,
        },
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
