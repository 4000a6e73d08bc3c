// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Session-wide change-data-capture test environment.

use crate::config::Config;
use crate::error::Result;
use crate::kafka::{
    create_topics, provision_kafka_instance, provision_service_account, KafkaInstanceAdmin,
    KafkaManagement, KafkaRequest, ServiceAccount, ServiceAccounts, Topic,
};
use crate::kubernetes::pods::KafkaCredentials;
use crate::kubernetes::{provision_consumer_pod, provision_namespace};
use crate::scope::Scope;
use k8s_openapi::api::core::v1::{Namespace, Pod};
use kube::Client;
use tracing::{error, info, instrument};

/// Everything a CDC integration test needs, provisioned in dependency order.
///
/// Call [`CdcEnvironment::teardown`] when the session ends. If provisioning fails half way, the
/// resources acquired so far are released before the error is returned.
pub struct CdcEnvironment {
    pub kafka: KafkaRequest,
    pub service_account: ServiceAccount,
    pub topics: Vec<Topic>,
    pub namespace: Namespace,
    pub consumer: Pod,
    scope: Scope,
}

struct Provisioned {
    kafka: KafkaRequest,
    service_account: ServiceAccount,
    topics: Vec<Topic>,
    namespace: Namespace,
    consumer: Pod,
}

impl CdcEnvironment {
    /// `connect_admin` builds the admin API client of the instance once it is ready.
    #[instrument(skip_all, fields(kafka = %config.kafka.name, namespace = %config.namespace))]
    pub async fn provision<M, S, A, F>(
        config: &Config,
        client: &Client,
        mgmt: &M,
        accounts: &S,
        connect_admin: F,
    ) -> Result<Self>
    where
        M: KafkaManagement,
        S: ServiceAccounts,
        A: KafkaInstanceAdmin,
        F: FnOnce(&KafkaRequest) -> Result<A>,
    {
        let mut scope = Scope::new(format!("cdc environment {}", config.kafka.name));

        match provision_all(&mut scope, config, client, mgmt, accounts, connect_admin).await {
            Ok(p) => {
                info!("CDC environment is ready");
                Ok(Self {
                    kafka: p.kafka,
                    service_account: p.service_account,
                    topics: p.topics,
                    namespace: p.namespace,
                    consumer: p.consumer,
                    scope,
                })
            }
            Err(e) => {
                error!("Provisioning failed, releasing acquired resources: {}", e);
                if let Err(cleanup) = scope.close().await {
                    error!("Cleanup after failed provisioning: {}", cleanup);
                }
                Err(e)
            }
        }
    }

    /// Release every resource in reverse provisioning order.
    pub async fn teardown(self) -> Result<()> {
        info!("Tearing down CDC environment");
        self.scope.close().await
    }
}

async fn provision_all<M, S, A, F>(
    scope: &mut Scope,
    config: &Config,
    client: &Client,
    mgmt: &M,
    accounts: &S,
    connect_admin: F,
) -> Result<Provisioned>
where
    M: KafkaManagement,
    S: ServiceAccounts,
    A: KafkaInstanceAdmin,
    F: FnOnce(&KafkaRequest) -> Result<A>,
{
    let kafka = provision_kafka_instance(scope, mgmt, &config.kafka).await?;
    let admin = connect_admin(&kafka)?;

    let service_account = provision_service_account(
        scope,
        accounts,
        &admin,
        &config.service_account_name,
        &config.kafka.name,
    )
    .await?;

    let topics = create_topics(&admin, &config.topics).await?;

    let namespace = provision_namespace(scope, client, &config.namespace, &config.wait_status).await?;

    let credentials = KafkaCredentials::new(&kafka, &service_account)?;
    let consumer = provision_consumer_pod(
        scope,
        client,
        &config.namespace,
        &credentials,
        &config.consumer,
        &config.wait_status,
    )
    .await?;

    Ok(Provisioned {
        kafka,
        service_account,
        topics,
        namespace,
        consumer,
    })
}
