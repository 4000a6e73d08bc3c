// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace management utilities

use super::{delete_and_wait, wait_until_gone};
use crate::config::SamplingConfig;
use crate::constants::{
    cluster::{NAMESPACE_ACTIVE, NAMESPACE_TERMINATING},
    FIELD_MANAGER,
};
use crate::error::Result;
use crate::sampler::TimeoutSampler;
use crate::scope::Scope;
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{ObjectMeta, PostParams},
    Api, Client,
};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Ensure the namespace exists and is Active.
///
/// A namespace created here is deleted again when `scope` closes, and the teardown waits until
/// it is actually gone. An already existing namespace is reused and left in place, unless it is
/// still terminating: then it is waited out and created anew.
#[instrument(skip(scope, client, sampling))]
pub async fn provision_namespace(
    scope: &mut Scope,
    client: &Client,
    name: &str,
    sampling: &SamplingConfig,
) -> Result<Namespace> {
    let namespaces: Api<Namespace> = Api::all(client.clone());

    let reuse = match namespaces.get(name).await {
        Ok(ns) if namespace_phase(&ns) == Some(NAMESPACE_TERMINATING) => {
            info!("Namespace {} is still terminating, waiting for it to be gone", name);
            wait_until_gone(&namespaces, name, sampling).await?;
            false
        }
        Ok(_) => true,
        Err(kube::Error::Api(err)) if err.code == 404 => false,
        Err(e) => return Err(e.into()),
    };

    if reuse {
        info!("Namespace {} already exists, reusing it", name);
    } else {
        info!("Creating namespace {}", name);
        namespaces
            .create(&PostParams::default(), &namespace_object(name))
            .await?;
        info!("Namespace {} created successfully", name);

        let api = namespaces.clone();
        let ns_name = name.to_string();
        let sampling = *sampling;
        scope.defer(format!("namespace {}", name), move || async move {
            delete_and_wait(&api, &ns_name, &sampling).await
        });
    }

    let sampler = TimeoutSampler::new(
        format!("namespace {} to become {}", name, NAMESPACE_ACTIVE),
        sampling.timeout(),
        sampling.interval(),
    )?;
    let api = &namespaces;
    let namespace = sampler
        .wait_for(
            || get_namespace(api, name),
            |ns| namespace_phase(ns) == Some(NAMESPACE_ACTIVE),
        )
        .await?;

    Ok(namespace)
}

fn namespace_object(name: &str) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(BTreeMap::from([(
                "app.kubernetes.io/managed-by".to_string(),
                FIELD_MANAGER.to_string(),
            )])),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn namespace_phase(namespace: &Namespace) -> Option<&str> {
    namespace.status.as_ref()?.phase.as_deref()
}

async fn get_namespace(api: &Api<Namespace>, name: &str) -> Result<Namespace> {
    let namespace = api.get(name).await?;
    debug!(
        "Namespace {} phase: {}",
        name,
        namespace_phase(&namespace).unwrap_or("<none>")
    );
    Ok(namespace)
}
