// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Consumer pod and the Kafka credentials it reads.

use super::{delete_and_wait, delete_ignoring_missing};
use crate::config::{ConsumerConfig, SamplingConfig};
use crate::constants::{
    cluster::{POD_FAILED, POD_RUNNING, POD_SUCCEEDED},
    credentials as secret_keys, FIELD_MANAGER,
};
use crate::error::{Result, SandboxError};
use crate::kafka::{KafkaRequest, ServiceAccount};
use crate::sampler::TimeoutSampler;
use crate::scope::Scope;
use k8s_openapi::api::core::v1::{
    Container, EnvVar, EnvVarSource, Pod, PodSpec, Secret, SecretKeySelector,
};
use kube::{
    api::{ObjectMeta, Patch, PatchParams, PostParams},
    Api, Client,
};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Connection details handed to the consumer
pub struct KafkaCredentials<'a> {
    pub bootstrap_url: &'a str,
    pub client_id: &'a str,
    pub client_secret: &'a str,
}

impl<'a> KafkaCredentials<'a> {
    pub fn new(kafka: &'a KafkaRequest, account: &'a ServiceAccount) -> Result<Self> {
        let bootstrap_url =
            kafka
                .bootstrap_server_host
                .as_deref()
                .ok_or_else(|| SandboxError::MissingField {
                    resource: format!("kafka instance {}", kafka.name),
                    field: "bootstrap_server_host".to_string(),
                })?;
        let client_secret =
            account
                .secret
                .as_deref()
                .ok_or_else(|| SandboxError::MissingField {
                    resource: format!("service account {}", account.id),
                    field: "secret".to_string(),
                })?;

        Ok(Self {
            bootstrap_url,
            client_id: &account.id,
            client_secret,
        })
    }
}

/// Deploy the consumer pod into `namespace` and wait until it runs.
///
/// The credentials secret is applied first; both objects are deleted when `scope` closes, and the
/// pod teardown waits until the pod is gone so its name is free for the next session.
#[instrument(skip(scope, client, credentials, consumer, sampling), fields(pod = %consumer.pod_name))]
pub async fn provision_consumer_pod(
    scope: &mut Scope,
    client: &Client,
    namespace: &str,
    credentials: &KafkaCredentials<'_>,
    consumer: &ConsumerConfig,
    sampling: &SamplingConfig,
) -> Result<Pod> {
    let secret_name = credentials_secret_name(&consumer.pod_name);

    let secrets: Api<Secret> = Api::namespaced(client.clone(), namespace);
    let secret = credentials_secret(&secret_name, namespace, credentials);
    secrets
        .patch(
            &secret_name,
            &PatchParams::apply(FIELD_MANAGER).force(),
            &Patch::Apply(&secret),
        )
        .await?;
    info!("Applied credentials secret {}/{}", namespace, secret_name);

    let secret_api = secrets.clone();
    let name = secret_name.clone();
    scope.defer(
        format!("secret {}/{}", namespace, secret_name),
        move || async move { delete_ignoring_missing(&secret_api, &name).await },
    );

    let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
    pods.create(
        &PostParams::default(),
        &consumer_pod(&consumer.pod_name, namespace, &consumer.image, &secret_name),
    )
    .await?;
    info!("Created pod {}/{}", namespace, consumer.pod_name);

    let pod_api = pods.clone();
    let name = consumer.pod_name.clone();
    let deletion = *sampling;
    scope.defer(
        format!("pod {}/{}", namespace, consumer.pod_name),
        move || async move { delete_and_wait(&pod_api, &name, &deletion).await },
    );

    let sampler = TimeoutSampler::new(
        format!("pod {}/{} to be {}", namespace, consumer.pod_name, POD_RUNNING),
        sampling.timeout(),
        sampling.interval(),
    )?;
    let api = &pods;
    let pod = sampler
        .wait_for(
            || get_pod(api, &consumer.pod_name),
            |pod| pod_phase(pod) == Some(POD_RUNNING),
        )
        .await?;

    info!("Pod {}/{} is running", namespace, consumer.pod_name);
    Ok(pod)
}

pub fn credentials_secret_name(pod_name: &str) -> String {
    format!("{}-kafka-credentials", pod_name)
}

fn managed_labels(app: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("app".to_string(), app.to_string()),
        (
            "app.kubernetes.io/managed-by".to_string(),
            FIELD_MANAGER.to_string(),
        ),
    ])
}

fn credentials_secret(name: &str, namespace: &str, credentials: &KafkaCredentials<'_>) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(managed_labels(name)),
            ..Default::default()
        },
        string_data: Some(BTreeMap::from([
            (
                secret_keys::BOOTSTRAP_URL.to_string(),
                credentials.bootstrap_url.to_string(),
            ),
            (
                secret_keys::CLIENT_ID.to_string(),
                credentials.client_id.to_string(),
            ),
            (
                secret_keys::CLIENT_SECRET.to_string(),
                credentials.client_secret.to_string(),
            ),
        ])),
        type_: Some("Opaque".to_string()),
        ..Default::default()
    }
}

fn secret_env(var: &str, secret_name: &str, key: &str) -> EnvVar {
    EnvVar {
        name: var.to_string(),
        value_from: Some(EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                name: secret_name.to_string(),
                key: key.to_string(),
                optional: None,
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn consumer_pod(name: &str, namespace: &str, image: &str, secret_name: &str) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(managed_labels(name)),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers: vec![Container {
                name: "consumer".to_string(),
                image: Some(image.to_string()),
                env: Some(vec![
                    secret_env(
                        "KAFKA_BOOTSTRAP_URL",
                        secret_name,
                        secret_keys::BOOTSTRAP_URL,
                    ),
                    secret_env("KAFKA_SA_CLIENT_ID", secret_name, secret_keys::CLIENT_ID),
                    secret_env(
                        "KAFKA_SA_CLIENT_SECRET",
                        secret_name,
                        secret_keys::CLIENT_SECRET,
                    ),
                ]),
                ..Default::default()
            }],
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn pod_phase(pod: &Pod) -> Option<&str> {
    pod.status.as_ref()?.phase.as_deref()
}

/// A pod that already terminated will never reach Running.
async fn get_pod(api: &Api<Pod>, name: &str) -> Result<Pod> {
    let pod = api.get(name).await?;
    let phase = pod_phase(&pod).unwrap_or("<none>");
    debug!("Pod {} phase: {}", name, phase);

    if phase == POD_FAILED || phase == POD_SUCCEEDED {
        return Err(SandboxError::PodTerminated(format!(
            "pod {} is {}",
            name, phase
        )));
    }
    Ok(pod)
}
