// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{cluster, env as env_vars, kafka};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Sandbox configuration, loaded once per test session and shared read-only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub kafka: KafkaConfig,
    pub service_account_name: String,
    pub topics: Vec<TopicGroup>,
    /// Namespace hosting the consumer pod
    pub namespace: String,
    pub consumer: ConsumerConfig,
    /// Readiness wait for cluster objects (namespace, pod)
    pub wait_status: SamplingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KafkaConfig {
    pub name: String,
    pub cloud_provider: String,
    pub region: String,
    pub plan: String,
    pub reauthentication_enabled: bool,
    pub ready_timeout_secs: u64,
    pub poll_interval_secs: u64,
}

/// Topics sharing partitioning and cleanup policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopicGroup {
    pub topics: Vec<String>,
    pub num_partitions: i32,
    pub cleanup_policy: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsumerConfig {
    pub pod_name: String,
    pub image: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplingConfig {
    pub timeout_secs: u64,
    pub interval_secs: u64,
}

impl SamplingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl KafkaConfig {
    pub fn sampling(&self) -> SamplingConfig {
        SamplingConfig {
            timeout_secs: self.ready_timeout_secs,
            interval_secs: self.poll_interval_secs,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kafka: KafkaConfig::default(),
            service_account_name: kafka::SERVICE_ACCOUNT_NAME.to_string(),
            topics: default_topics(),
            namespace: cluster::NAMESPACE.to_string(),
            consumer: ConsumerConfig::default(),
            wait_status: SamplingConfig::default(),
        }
    }
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            name: kafka::NAME.to_string(),
            cloud_provider: kafka::CLOUD_PROVIDER.to_string(),
            region: kafka::REGION.to_string(),
            plan: kafka::PLAN.to_string(),
            reauthentication_enabled: true,
            ready_timeout_secs: kafka::READY_TIMEOUT_SECS,
            poll_interval_secs: kafka::POLL_INTERVAL_SECS,
        }
    }
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            pod_name: cluster::CONSUMER_POD.to_string(),
            image: cluster::CONSUMER_IMAGE.to_string(),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            timeout_secs: cluster::WAIT_STATUS_TIMEOUT_SECS,
            interval_secs: cluster::WAIT_STATUS_INTERVAL_SECS,
        }
    }
}

/// Kafka Connect's internal topics are compacted; change-event topics are not.
fn default_topics() -> Vec<TopicGroup> {
    vec![
        TopicGroup {
            topics: vec![
                "debezium-cluster-configs".to_string(),
                "debezium-cluster-offsets".to_string(),
                "debezium-cluster-status".to_string(),
            ],
            num_partitions: 1,
            cleanup_policy: "compact".to_string(),
        },
        TopicGroup {
            topics: vec!["debezium-db-history".to_string()],
            num_partitions: 1,
            cleanup_policy: "delete".to_string(),
        },
    ]
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Reads the YAML file named by `CDC_SANDBOX_CONFIG` if set, otherwise starts from the
    /// defaults, then applies the single-value overrides.
    pub fn from_env() -> Result<Self> {
        let mut config = match env::var(env_vars::CONFIG_FILE) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };

        if let Ok(namespace) = env::var(env_vars::NAMESPACE) {
            config.namespace = namespace;
        }
        if let Ok(name) = env::var(env_vars::KAFKA_NAME) {
            config.kafka.name = name;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.kafka.poll_interval_secs == 0 {
            bail!("kafka.poll_interval_secs must be greater than zero");
        }
        if self.wait_status.interval_secs == 0 {
            bail!("wait_status.interval_secs must be greater than zero");
        }
        if let Some(group) = self.topics.iter().find(|g| g.num_partitions < 1) {
            bail!(
                "topic group {:?} must have at least one partition",
                group.topics
            );
        }
        Ok(())
    }
}
