// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::{ConfigEntry, KafkaInstanceAdmin, NewTopicInput, Topic, TopicSettings};
use crate::config::TopicGroup;
use crate::error::Result;
use tracing::{info, instrument};

const CLEANUP_POLICY: &str = "cleanup.policy";

/// Create every topic of every group. Topics go away with the instance, so no teardown is
/// registered for them.
#[instrument(skip_all)]
pub async fn create_topics<A: KafkaInstanceAdmin>(
    admin: &A,
    groups: &[TopicGroup],
) -> Result<Vec<Topic>> {
    let mut created = Vec::new();

    for group in groups {
        for name in &group.topics {
            let topic = admin.create_topic(&new_topic_input(name, group)).await?;
            info!(
                "Created topic {} ({} partitions, {}={})",
                topic.name, group.num_partitions, CLEANUP_POLICY, group.cleanup_policy
            );
            created.push(topic);
        }
    }

    Ok(created)
}

fn new_topic_input(name: &str, group: &TopicGroup) -> NewTopicInput {
    NewTopicInput {
        name: name.to_string(),
        settings: TopicSettings {
            num_partitions: group.num_partitions,
            config: vec![ConfigEntry {
                key: CLEANUP_POLICY.to_string(),
                value: group.cleanup_policy.clone(),
            }],
        },
    }
}
