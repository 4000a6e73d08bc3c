// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::{
    AclBinding, AclOperation, AclPatternType, AclPermissionType, AclResourceType,
    KafkaInstanceAdmin, ServiceAccount, ServiceAccountRequest, ServiceAccounts,
};
use crate::constants::acl;
use crate::error::{Result, SandboxError};
use crate::scope::Scope;
use tracing::{debug, info, instrument};

/// Resource types the service account gets full access to
pub const GRANTED_RESOURCES: [AclResourceType; 3] = [
    AclResourceType::Group,
    AclResourceType::Topic,
    AclResourceType::TransactionalId,
];

/// Create a service account for the Kafka instance and grant it access through ACL bindings.
///
/// Every binding is read back from the instance after creation and must be present.
#[instrument(skip_all, fields(service_account = %name, kafka = %kafka_name))]
pub async fn provision_service_account<S: ServiceAccounts, A: KafkaInstanceAdmin>(
    scope: &mut Scope,
    accounts: &S,
    admin: &A,
    name: &str,
    kafka_name: &str,
) -> Result<ServiceAccount> {
    let request = ServiceAccountRequest {
        name: name.to_string(),
        description: format!("{} instance service-account", kafka_name),
    };

    let account = accounts.create_service_account(&request).await?;
    if account.id.is_empty() {
        return Err(SandboxError::MissingField {
            resource: format!("service account {}", name),
            field: "id".to_string(),
        });
    }
    info!("Created service account {:?}", account);

    let deleter = accounts.clone();
    let id = account.id.clone();
    scope.defer(
        format!("service account {} ({})", account.name, account.id),
        move || async move { delete_service_account_verified(&deleter, &id).await },
    );

    for resource_type in GRANTED_RESOURCES {
        let binding = acl_binding(resource_type, &account.id);
        admin.create_acl(&binding).await?;

        let applied = admin.get_acls(&binding).await?;
        if !applied.contains(&binding) {
            return Err(SandboxError::AclNotApplied(format!(
                "{:?} on {:?} '{}' for {}",
                binding.operation, binding.resource_type, binding.resource_name, binding.principal
            )));
        }
        debug!("ACL binding {:?} applied", binding);
    }

    info!(
        "Granted {} ACL bindings to service account {}",
        GRANTED_RESOURCES.len(),
        account.id
    );
    Ok(account)
}

/// Allow-all binding on every resource of `resource_type` for the service account
pub fn acl_binding(resource_type: AclResourceType, service_account_id: &str) -> AclBinding {
    AclBinding {
        resource_type,
        resource_name: acl::RESOURCE_NAME.to_string(),
        pattern_type: AclPatternType::Literal,
        permission: AclPermissionType::Allow,
        principal: format!("{}{}", acl::PRINCIPAL_PREFIX, service_account_id),
        operation: AclOperation::All,
    }
}

/// Delete the account and confirm the API no longer knows it.
async fn delete_service_account_verified<S: ServiceAccounts>(accounts: &S, id: &str) -> Result<()> {
    accounts.delete_service_account(id).await?;

    match accounts.get_service_account(id).await? {
        None => {
            info!("Service account {} deleted", id);
            Ok(())
        }
        Some(_) => Err(SandboxError::ApiError(format!(
            "service account {} still present after deletion",
            id
        ))),
    }
}
