use std::io::stderr;
use tracing_subscriber::{EnvFilter, fmt, prelude::*, registry};

/// Default filter directives when `RUST_LOG` is unset.
pub fn default_directives(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("mbusb_core={level},mbusb_cli={level}")
}

/// Install the global subscriber. Logs go to stderr so stdout stays free for
/// the confirmation prompt and tool output.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    // a second init (e.g. from tests) keeps the first subscriber
    let _ = registry()
        .with(filter)
        .with(fmt::layer().with_writer(stderr).with_target(false))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert_eq!(default_directives(false), "mbusb_core=info,mbusb_cli=info");
        assert_eq!(default_directives(true), "mbusb_core=debug,mbusb_cli=debug");
    }
}
