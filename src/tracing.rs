//! Subscriber setup for hosts and tests.
//!
//! The library only emits `tracing` events. [`init`] installs a compact
//! subscriber for binaries and test suites that do not configure one.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Directive applied when `RUST_LOG` does not mention this crate.
fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "doc_inventory=debug"
    } else {
        "doc_inventory=info"
    }
}

fn running_under_test() -> bool {
    std::env::var_os("NEXTEST").is_some() || std::env::var_os("CARGO_TARGET_TMPDIR").is_some()
}

/// Install the subscriber once; later calls do nothing.
///
/// Under a test runner output goes through the harness's captured writer
/// with debug events enabled; otherwise to stderr at info level.
pub fn init() {
    INIT.call_once(|| {
        let verbose = running_under_test();
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new(default_directive(verbose)),
        };

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_target(true)
            .compact();

        let installed = if verbose {
            builder.with_test_writer().try_init()
        } else {
            builder.with_writer(std::io::stderr).try_init()
        };
        if let Err(e) = installed {
            eprintln!("doc-inventory: tracing already initialized: {}", e);
        }
    });
}
