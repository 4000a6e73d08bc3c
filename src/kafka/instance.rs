// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::{KafkaManagement, KafkaRequest, KafkaRequestPayload, KafkaStatus};
use crate::config::KafkaConfig;
use crate::error::{Result, SandboxError};
use crate::sampler::TimeoutSampler;
use crate::scope::Scope;
use tracing::{debug, info, instrument};

/// Request a managed Kafka instance and wait until it is ready.
///
/// Deletion of the instance is deferred on `scope` as soon as the request is accepted by the
/// API, so an instance that never becomes ready is still cleaned up.
#[instrument(skip(scope, mgmt, config), fields(kafka = %config.name))]
pub async fn provision_kafka_instance<M: KafkaManagement>(
    scope: &mut Scope,
    mgmt: &M,
    config: &KafkaConfig,
) -> Result<KafkaRequest> {
    let payload = KafkaRequestPayload {
        cloud_provider: config.cloud_provider.clone(),
        name: config.name.clone(),
        region: config.region.clone(),
        plan: config.plan.clone(),
        reauthentication_enabled: config.reauthentication_enabled,
    };

    info!(
        "Requesting Kafka instance {} ({} / {} / {})",
        config.name, config.cloud_provider, config.region, config.plan
    );
    let created = mgmt.create_kafka(&payload).await?;

    let deleter = mgmt.clone();
    let delete_id = created.id.clone();
    scope.defer(
        format!("kafka instance {} ({})", created.name, created.id),
        move || async move { deleter.delete_kafka_by_id(&delete_id).await },
    );

    if created.status != KafkaStatus::Accepted {
        return Err(SandboxError::UnexpectedStatus {
            resource: format!("kafka instance {}", config.name),
            status: created.status.to_string(),
        });
    }

    let sampling = config.sampling();
    let sampler = TimeoutSampler::new(
        format!("kafka instance {} to become ready", config.name),
        sampling.timeout(),
        sampling.interval(),
    )?;

    let id = created.id.as_str();
    let ready = sampler
        .wait_for(|| probe_kafka(mgmt, id), |k| k.status == KafkaStatus::Ready)
        .await?;

    info!(
        "Kafka instance {} is ready, bootstrap server: {}",
        ready.name,
        ready.bootstrap_server_host.as_deref().unwrap_or("<unknown>")
    );
    Ok(ready)
}

/// A failed instance will never become ready, so it ends the wait early.
async fn probe_kafka<M: KafkaManagement>(mgmt: &M, id: &str) -> Result<KafkaRequest> {
    let kafka = mgmt.get_kafka_by_id(id).await?;
    debug!("Kafka instance {} status: {}", id, kafka.status);

    if kafka.status == KafkaStatus::Failed {
        return Err(SandboxError::UnexpectedStatus {
            resource: format!("kafka instance {}", kafka.name),
            status: format!(
                "failed: {}",
                kafka.failed_reason.as_deref().unwrap_or("no reason given")
            ),
        });
    }

    Ok(kafka)
}
