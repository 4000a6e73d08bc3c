// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct KafkaRequestPayload {
    pub cloud_provider: String,
    pub name: String,
    pub region: String,
    pub plan: String,
    pub reauthentication_enabled: bool,
}

/// A managed Kafka instance as reported by the management API
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct KafkaRequest {
    pub id: String,
    pub name: String,
    pub status: KafkaStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_server_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_api_server_url: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_reason: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KafkaStatus {
    Accepted,
    Preparing,
    Provisioning,
    Ready,
    Failed,
    Deprovision,
    Deleting,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for KafkaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KafkaStatus::Accepted => "accepted",
            KafkaStatus::Preparing => "preparing",
            KafkaStatus::Provisioning => "provisioning",
            KafkaStatus::Ready => "ready",
            KafkaStatus::Failed => "failed",
            KafkaStatus::Deprovision => "deprovision",
            KafkaStatus::Deleting => "deleting",
            KafkaStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ServiceAccountRequest {
    pub name: String,
    pub description: String,
}

#[derive(Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccount {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Only returned by the create call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

// Keeps the client secret out of logs.
impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("description", &self.description)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AclResourceType {
    Group,
    Topic,
    Cluster,
    TransactionalId,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AclPatternType {
    Literal,
    Prefixed,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AclPermissionType {
    Allow,
    Deny,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AclOperation {
    All,
    Read,
    Write,
    Create,
    Delete,
    Alter,
    Describe,
    DescribeConfigs,
    AlterConfigs,
}

/// Also used as the filter for [`super::KafkaInstanceAdmin::get_acls`]
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AclBinding {
    pub resource_type: AclResourceType,
    pub resource_name: String,
    pub pattern_type: AclPatternType,
    pub permission: AclPermissionType,
    pub principal: String,
    pub operation: AclOperation,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewTopicInput {
    pub name: String,
    pub settings: TopicSettings,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopicSettings {
    pub num_partitions: i32,
    pub config: Vec<ConfigEntry>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Topic {
    pub name: String,
    #[serde(default)]
    pub partitions: i32,
}
