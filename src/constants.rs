// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// The field manager used for server-side apply
pub const FIELD_MANAGER: &str = "cdc-sandbox";

/// Environment variables read by [`crate::config::Config::from_env`]
pub mod env {
    /// Path to a YAML configuration file
    pub const CONFIG_FILE: &str = "CDC_SANDBOX_CONFIG";
    pub const NAMESPACE: &str = "CDC_SANDBOX_NAMESPACE";
    pub const KAFKA_NAME: &str = "CDC_SANDBOX_KAFKA_NAME";
}

/// Managed Kafka instance defaults
pub mod kafka {
    pub const NAME: &str = "mas-dbz-test";
    pub const CLOUD_PROVIDER: &str = "aws";
    pub const REGION: &str = "us-east-1";
    pub const PLAN: &str = "developer.x1";
    pub const SERVICE_ACCOUNT_NAME: &str = "mas-dbz-test-sa";
    /// Instance provisioning routinely takes several minutes
    pub const READY_TIMEOUT_SECS: u64 = 1200;
    pub const POLL_INTERVAL_SECS: u64 = 10;
}

/// ACL binding granted to the service account
pub mod acl {
    pub const RESOURCE_NAME: &str = "*";
    pub const PRINCIPAL_PREFIX: &str = "User:";
}

/// Cluster-side defaults
pub mod cluster {
    pub const NAMESPACE: &str = "debezium";
    pub const CONSUMER_POD: &str = "kafka-consumer";
    pub const CONSUMER_IMAGE: &str = "quay.io/debezium/tooling:latest";
    pub const WAIT_STATUS_TIMEOUT_SECS: u64 = 120;
    pub const WAIT_STATUS_INTERVAL_SECS: u64 = 1;

    pub const NAMESPACE_ACTIVE: &str = "Active";
    pub const NAMESPACE_TERMINATING: &str = "Terminating";
    pub const POD_RUNNING: &str = "Running";
    pub const POD_FAILED: &str = "Failed";
    pub const POD_SUCCEEDED: &str = "Succeeded";
}

/// Keys of the credentials secret mounted into the consumer pod
pub mod credentials {
    pub const BOOTSTRAP_URL: &str = "bootstrap-url";
    pub const CLIENT_ID: &str = "client-id";
    pub const CLIENT_SECRET: &str = "client-secret";
}
