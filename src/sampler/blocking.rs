// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Thread-blocking flavour of the sampler for synchronous probes.

use super::{InvalidInterval, SampleError, Schedule, Step, Tally};
use std::fmt;
use std::iter::FusedIterator;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct TimeoutSampler {
    schedule: Schedule,
}

impl TimeoutSampler {
    pub fn new(
        description: impl Into<String>,
        timeout: Duration,
        interval: Duration,
    ) -> Result<Self, InvalidInterval> {
        Ok(Self {
            schedule: Schedule::new(description, timeout, interval)?,
        })
    }

    pub fn sample<F, T, E>(self, probe: F) -> Samples<F>
    where
        F: FnMut() -> Result<T, E>,
        T: fmt::Debug,
    {
        Samples {
            schedule: self.schedule,
            probe,
            started: None,
            tally: Tally::default(),
            done: false,
        }
    }

    pub fn wait_for<F, T, E, P>(self, probe: F, mut satisfied: P) -> Result<T, SampleError<E>>
    where
        F: FnMut() -> Result<T, E>,
        T: fmt::Debug,
        P: FnMut(&T) -> bool,
    {
        let schedule = self.schedule.clone();
        let started = Instant::now();

        for sample in self.sample(probe) {
            let sample = sample?;
            if satisfied(&sample) {
                info!(
                    description = %schedule.description,
                    elapsed = ?started.elapsed(),
                    "Condition satisfied"
                );
                return Ok(sample);
            }
        }

        // The iterator only terminates through an error.
        Err(SampleError::Timeout(
            Tally::default().expired(&schedule, started.elapsed()),
        ))
    }

    pub fn wait_until<F, E>(self, probe: F) -> Result<(), SampleError<E>>
    where
        F: FnMut() -> Result<bool, E>,
    {
        self.wait_for(probe, |ready| *ready).map(|_| ())
    }
}

/// Iterator over probe results, ending with the first error.
pub struct Samples<F> {
    schedule: Schedule,
    probe: F,
    started: Option<Instant>,
    tally: Tally,
    done: bool,
}

impl<F, T, E> Iterator for Samples<F>
where
    F: FnMut() -> Result<T, E>,
    T: fmt::Debug,
{
    type Item = Result<T, SampleError<E>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.started {
            None => self.started = Some(Instant::now()),
            Some(started) => {
                if let Step::Sleep(delay) = self.schedule.next_step(started.elapsed()) {
                    thread::sleep(delay);
                }
                let elapsed = started.elapsed();
                if self.schedule.is_expired(elapsed) {
                    self.done = true;
                    return Some(Err(SampleError::Timeout(
                        self.tally.expired(&self.schedule, elapsed),
                    )));
                }
            }
        }

        match (self.probe)() {
            Ok(value) => {
                self.tally.record(&value);
                debug!(
                    description = %self.schedule.description,
                    sample = self.tally.samples,
                    "Sampled {:?}",
                    value
                );
                Some(Ok(value))
            }
            Err(e) => {
                self.done = true;
                Some(Err(SampleError::Probe(e)))
            }
        }
    }
}

impl<F, T, E> FusedIterator for Samples<F>
where
    F: FnMut() -> Result<T, E>,
    T: fmt::Debug,
{
}
