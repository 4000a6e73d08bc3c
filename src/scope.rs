// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Deferred release of provisioned resources.
//!
//! Every resource registers its release action on a [`Scope`] right after it is acquired. Closing
//! the scope releases them in reverse acquisition order.
//!
//! A scope dropped without being closed (early return, panic, cancelled future) releases its
//! pending actions before `drop` returns when it runs on a multi-thread tokio runtime. A
//! current-thread runtime cannot drive the releases from inside `drop` because the clients they
//! use are served by the very thread that is blocked; there, and outside any runtime, every leaked
//! resource is logged at error level instead. Close scopes explicitly, or run tests with
//! `#[tokio::test(flavor = "multi_thread")]`.

use crate::error::{Result, SandboxError};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task;
use tracing::{error, info, instrument, warn};

type ReleaseAction = Box<dyn FnOnce() -> BoxFuture<'static, Result<()>> + Send>;

struct Deferred {
    description: String,
    action: ReleaseAction,
}

pub struct Scope {
    name: String,
    deferred: Vec<Deferred>,
}

impl Scope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            deferred: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of release actions still pending
    pub fn pending(&self) -> usize {
        self.deferred.len()
    }

    /// Register a release action for a resource that was just acquired.
    pub fn defer<F, Fut>(&mut self, description: impl Into<String>, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.deferred.push(Deferred {
            description: description.into(),
            action: Box::new(move || action().boxed()),
        });
    }

    /// Release every resource, most recently acquired first.
    ///
    /// A failing release does not stop the remaining ones; all failures are returned together.
    #[instrument(skip(self), fields(scope = %self.name))]
    pub async fn close(mut self) -> Result<()> {
        let deferred = std::mem::take(&mut self.deferred);
        let failures = release_all(deferred).await;

        if failures.is_empty() {
            info!("Scope released");
            Ok(())
        } else {
            Err(SandboxError::Teardown(failures))
        }
    }
}

async fn release_all(mut deferred: Vec<Deferred>) -> Vec<String> {
    let mut failures = Vec::new();

    while let Some(Deferred {
        description,
        action,
    }) = deferred.pop()
    {
        info!("Releasing {}", description);
        if let Err(e) = action().await {
            error!("Failed to release {}: {}", description, e);
            failures.push(format!("{}: {}", description, e));
        }
    }

    failures
}

impl Drop for Scope {
    fn drop(&mut self) {
        if self.deferred.is_empty() {
            return;
        }

        let deferred = std::mem::take(&mut self.deferred);
        match Handle::try_current() {
            Ok(handle) if matches!(handle.runtime_flavor(), RuntimeFlavor::MultiThread) => {
                warn!(
                    "Scope '{}' dropped with {} pending releases, releasing now",
                    self.name,
                    deferred.len()
                );
                let failures = task::block_in_place(|| handle.block_on(release_all(deferred)));
                if !failures.is_empty() {
                    error!(
                        "Release of dropped scope '{}' failed: {}",
                        self.name,
                        failures.join("; ")
                    );
                }
            }
            Ok(_) => log_leaks(&self.name, deferred, "on a current-thread runtime"),
            Err(_) => log_leaks(&self.name, deferred, "outside a runtime"),
        }
    }
}

fn log_leaks(scope: &str, deferred: Vec<Deferred>, context: &str) {
    for d in deferred.into_iter().rev() {
        error!(
            "Scope '{}' dropped {}, leaking {}",
            scope, context, d.description
        );
    }
}
