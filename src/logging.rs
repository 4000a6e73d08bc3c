// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Install the fmt subscriber, filtered through `RUST_LOG` (default `info`).
///
/// Output goes through the libtest capture writer since the fixtures are meant for test binaries,
/// so provisioning logs show up next to the failing test and stay quiet for passing ones (unless
/// `--nocapture` is given). Safe to call from every test; only the first call installs anything.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
