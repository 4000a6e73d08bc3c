// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster-side resources: the namespace and the consumer pod with its Kafka credentials.

pub mod namespaces;
pub mod pods;

pub use namespaces::provision_namespace;
pub use pods::provision_consumer_pod;

use crate::config::SamplingConfig;
use crate::error::{Result, SandboxError};
use crate::sampler::TimeoutSampler;
use kube::{api::DeleteParams, Api, Resource};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::{debug, info};

/// Delete an object, treating "already gone" as success.
pub(crate) async fn delete_ignoring_missing<K>(api: &Api<K>, name: &str) -> Result<()>
where
    K: Resource + Clone + DeserializeOwned + Debug,
    <K as Resource>::DynamicType: Default,
{
    match api.delete(name, &DeleteParams::default()).await {
        Ok(_) => {
            info!("Deleted {} {}", K::kind(&Default::default()), name);
            Ok(())
        }
        Err(kube::Error::Api(err)) if err.code == 404 => {
            debug!("{} {} already gone", K::kind(&Default::default()), name);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Whether the API server no longer knows the object.
pub(crate) async fn is_gone<K>(api: &Api<K>, name: &str) -> Result<bool>
where
    K: Resource + Clone + DeserializeOwned + Debug,
{
    match api.get(name).await {
        Ok(_) => Ok(false),
        Err(kube::Error::Api(err)) if err.code == 404 => Ok(true),
        Err(e) => Err(SandboxError::from(e)),
    }
}

/// Sample until the object is gone. Deletion of namespaces and pods is asynchronous, so a
/// successful DELETE only means it has started.
pub(crate) async fn wait_until_gone<K>(api: &Api<K>, name: &str, sampling: &SamplingConfig) -> Result<()>
where
    K: Resource + Clone + DeserializeOwned + Debug,
    <K as Resource>::DynamicType: Default,
{
    let sampler = TimeoutSampler::new(
        format!("{} {} to be deleted", K::kind(&Default::default()), name),
        sampling.timeout(),
        sampling.interval(),
    )?;
    sampler.wait_until(|| is_gone(api, name)).await?;

    info!("{} {} is gone", K::kind(&Default::default()), name);
    Ok(())
}

pub(crate) async fn delete_and_wait<K>(api: &Api<K>, name: &str, sampling: &SamplingConfig) -> Result<()>
where
    K: Resource + Clone + DeserializeOwned + Debug,
    <K as Resource>::DynamicType: Default,
{
    delete_ignoring_missing(api, name).await?;
    wait_until_gone(api, name, sampling).await
}
