// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Managed Kafka provisioning: the instance, its service account with ACLs, and topics.
//!
//! The management, service-account and instance admin REST APIs are reached through the traits
//! below; callers plug in their own HTTP clients.

pub mod instance;
pub mod model;
pub mod service_account;
pub mod topics;

pub use instance::provision_kafka_instance;
pub use model::*;
pub use service_account::provision_service_account;
pub use topics::create_topics;

use crate::error::Result;
use std::future::Future;

/// Kafka management API (instance lifecycle)
pub trait KafkaManagement: Clone + Send + Sync + 'static {
    /// Request an instance asynchronously; the returned status is expected to be `accepted`.
    fn create_kafka(
        &self,
        payload: &KafkaRequestPayload,
    ) -> impl Future<Output = Result<KafkaRequest>> + Send;

    fn get_kafka_by_id(&self, id: &str) -> impl Future<Output = Result<KafkaRequest>> + Send;

    fn delete_kafka_by_id(&self, id: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Service-account management API
pub trait ServiceAccounts: Clone + Send + Sync + 'static {
    fn create_service_account(
        &self,
        request: &ServiceAccountRequest,
    ) -> impl Future<Output = Result<ServiceAccount>> + Send;

    /// `None` when the account does not exist
    fn get_service_account(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<ServiceAccount>>> + Send;

    fn delete_service_account(&self, id: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Admin API of one Kafka instance
pub trait KafkaInstanceAdmin: Send + Sync {
    fn create_acl(&self, binding: &AclBinding) -> impl Future<Output = Result<()>> + Send;

    fn get_acls(&self, filter: &AclBinding) -> impl Future<Output = Result<Vec<AclBinding>>> + Send;

    fn create_topic(&self, input: &NewTopicInput) -> impl Future<Output = Result<Topic>> + Send;
}
