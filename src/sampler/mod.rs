// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Fixed-interval polling of a probe until the caller is satisfied or a deadline passes.
//!
//! The sampler never decides what "ready" means. It invokes the probe, hands every result to the
//! caller and keeps going until the caller stops asking or the timeout elapses. The first
//! invocation happens immediately; every following one is preceded by `interval` of waiting.
//! Once the deadline is reached no further probe is made and a [`TimeoutExpired`] is raised.
//!
//! [`TimeoutSampler`] drives async probes on the tokio timer, [`blocking::TimeoutSampler`] drives
//! plain closures on the calling thread.

pub mod blocking;
mod stream;

pub use stream::TimeoutSampler;

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Raised when no sample satisfied the caller before the deadline.
#[derive(Error, Debug, Clone)]
#[error(
    "Timed out after {elapsed:?} waiting for {description} (timeout {timeout:?}): \
     none of {samples} samples satisfied the condition, last sample: {}",
    .last_sample.as_deref().unwrap_or("<none>")
)]
pub struct TimeoutExpired {
    pub description: String,
    pub timeout: Duration,
    pub elapsed: Duration,
    pub samples: usize,
    pub last_sample: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Sampling interval for {0} must be greater than zero")]
pub struct InvalidInterval(pub String);

/// Terminal error of a sampling sequence.
#[derive(Error, Debug)]
pub enum SampleError<E> {
    #[error(transparent)]
    Timeout(TimeoutExpired),

    #[error("Probe failed: {0}")]
    Probe(E),
}

impl<E> SampleError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, SampleError::Timeout(_))
    }
}

/// Timing parameters shared by both sampler flavours.
#[derive(Debug, Clone)]
pub(crate) struct Schedule {
    pub description: String,
    pub timeout: Duration,
    pub interval: Duration,
}

impl Schedule {
    pub fn new(
        description: impl Into<String>,
        timeout: Duration,
        interval: Duration,
    ) -> Result<Self, InvalidInterval> {
        let description = description.into();
        if interval.is_zero() {
            return Err(InvalidInterval(description));
        }
        Ok(Self {
            description,
            timeout,
            interval,
        })
    }

    /// What to do before the next probe, given the time elapsed since the first one.
    pub fn next_step(&self, elapsed: Duration) -> Step {
        match self.timeout.checked_sub(elapsed) {
            Some(remaining) if !remaining.is_zero() => Step::Sleep(remaining.min(self.interval)),
            _ => Step::Expired,
        }
    }

    pub fn is_expired(&self, elapsed: Duration) -> bool {
        elapsed >= self.timeout
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Sleep(Duration),
    Expired,
}

/// Longest debug rendering of a sample kept for the timeout report, in characters.
const LAST_SAMPLE_LIMIT: usize = 256;

/// Bookkeeping for the timeout report.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    pub samples: usize,
    pub last_sample: Option<String>,
}

impl Tally {
    pub fn record<T: fmt::Debug>(&mut self, value: &T) {
        self.samples += 1;
        let mut rendered = format!("{value:?}");
        if let Some((cut, _)) = rendered.char_indices().nth(LAST_SAMPLE_LIMIT) {
            rendered.truncate(cut);
            rendered.push_str("...");
        }
        self.last_sample = Some(rendered);
    }

    pub fn expired(&self, schedule: &Schedule, elapsed: Duration) -> TimeoutExpired {
        TimeoutExpired {
            description: schedule.description.clone(),
            timeout: schedule.timeout,
            elapsed,
            samples: self.samples,
            last_sample: self.last_sample.clone(),
        }
    }
}
