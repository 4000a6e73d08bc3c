// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::{InvalidInterval, SampleError, Schedule, Step, Tally};
use futures::{stream, Stream, TryStreamExt};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

/// Polls an async probe on the tokio timer.
///
/// ```ignore
/// let sampler = TimeoutSampler::new("kafka instance", Duration::from_secs(600), Duration::from_secs(10))?;
/// let kafka = sampler
///     .wait_for(|| mgmt.get_kafka_by_id(&id), |k| k.status == KafkaStatus::Ready)
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct TimeoutSampler {
    schedule: Schedule,
}

struct State<F> {
    schedule: Schedule,
    probe: F,
    started: Option<Instant>,
    tally: Tally,
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

    /// Lazily sample `probe`. The stream yields every probe result and ends with either a probe
    /// error or a [`SampleError::Timeout`]; it never ends on its own while the deadline holds.
    pub fn sample<F, Fut, T, E>(self, probe: F) -> impl Stream<Item = Result<T, SampleError<E>>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        T: fmt::Debug,
    {
        let state = State {
            schedule: self.schedule,
            probe,
            started: None,
            tally: Tally::default(),
        };

        stream::try_unfold(state, |mut state| async move {
            match state.started {
                None => state.started = Some(Instant::now()),
                Some(started) => {
                    if let Step::Sleep(delay) = state.schedule.next_step(started.elapsed()) {
                        sleep(delay).await;
                    }
                    let elapsed = started.elapsed();
                    if state.schedule.is_expired(elapsed) {
                        return Err(SampleError::Timeout(
                            state.tally.expired(&state.schedule, elapsed),
                        ));
                    }
                }
            }

            let value = match (state.probe)().await {
                Ok(value) => value,
                Err(e) => return Err(SampleError::Probe(e)),
            };
            state.tally.record(&value);
            debug!(
                description = %state.schedule.description,
                sample = state.tally.samples,
                "Sampled {:?}",
                value
            );

            Ok(Some((value, state)))
        })
    }

    /// Sample until `satisfied` accepts a value and return that value.
    pub async fn wait_for<F, Fut, T, E, P>(
        self,
        probe: F,
        mut satisfied: P,
    ) -> Result<T, SampleError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        T: fmt::Debug,
        P: FnMut(&T) -> bool,
    {
        let schedule = self.schedule.clone();
        let started = Instant::now();

        let samples = self.sample(probe);
        futures::pin_mut!(samples);

        while let Some(sample) = samples.try_next().await? {
            if satisfied(&sample) {
                info!(
                    description = %schedule.description,
                    elapsed = ?started.elapsed(),
                    "Condition satisfied"
                );
                return Ok(sample);
            }
        }

        // The stream only terminates through an error.
        Err(SampleError::Timeout(
            Tally::default().expired(&schedule, started.elapsed()),
        ))
    }

    /// Sample a boolean probe until it reports `true`.
    pub async fn wait_until<F, Fut, E>(self, probe: F) -> Result<(), SampleError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool, E>>,
    {
        self.wait_for(probe, |ready| *ready).await.map(|_| ())
    }
}
