// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test doubles: a scripted Kubernetes API server, an in-memory managed Kafka service and a log
//! recorder.

use crate::error::{Result, SandboxError};
use crate::kafka::{
    AclBinding, KafkaInstanceAdmin, KafkaManagement, KafkaRequest, KafkaRequestPayload,
    KafkaStatus, NewTopicInput, ServiceAccount, ServiceAccountRequest, ServiceAccounts, Topic,
};
use http::{Request, Response};
use kube::client::Body;
use kube::Client;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context as LayerContext, Layer, SubscriberExt};
use tracing_subscriber::registry::Registry;

type Route = (String, String);

/// A mock HTTP service that replays scripted responses per method and exact path.
///
/// Registering several responses for the same route plays them in order; the last one keeps
/// answering once the others are used up. Unscripted routes answer 404.
#[derive(Clone, Default)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<Route, VecDeque<(u16, String)>>>>,
    requests: Arc<Mutex<Vec<Route>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body)
    }

    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, status, body)
    }

    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.on("DELETE", path, status, body)
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .push_back((status, body.to_string()));
        self
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    /// Every request received so far as `(method, path)`
    pub fn requests(&self) -> Vec<Route> {
        self.requests.lock().unwrap().clone()
    }

    pub fn received(&self, method: &str, path: &str) -> bool {
        self.requests()
            .iter()
            .any(|(m, p)| m == method && p == path)
    }

    fn next_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let mut responses = self.responses.lock().unwrap();
        let queue = responses.get_mut(&(method.to_string(), path.to_string()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        self.requests
            .lock()
            .unwrap()
            .push((method.clone(), path.clone()));
        let (status, body) = self
            .next_response(&method, &path)
            .unwrap_or_else(|| (404, not_found_json("resource", &path)));

        Box::pin(async move {
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Namespace object in the given phase
pub fn namespace_json(name: &str, phase: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {
            "name": name,
            "uid": "test-uid"
        },
        "status": {
            "phase": phase
        }
    })
    .to_string()
}

/// Pod object in the given phase
pub fn pod_json(namespace: &str, name: &str, phase: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": "pod-uid"
        },
        "spec": {
            "containers": [{ "name": "consumer", "image": "consumer:test" }]
        },
        "status": {
            "phase": phase
        }
    })
    .to_string()
}

pub fn secret_json(namespace: &str, name: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "metadata": {
            "name": name,
            "namespace": namespace
        },
        "type": "Opaque"
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} \"{}\" not found", resource, name),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}

#[derive(Default)]
struct FakeState {
    create_status: Option<KafkaStatus>,
    statuses: VecDeque<KafkaStatus>,
    get_calls: usize,
    deleted_kafkas: Vec<String>,
    accounts: HashMap<String, ServiceAccount>,
    next_account: usize,
    sticky_accounts: bool,
    deleted_accounts: Vec<String>,
    ignore_acls: bool,
    acls: Vec<AclBinding>,
    failing_topic: Option<String>,
    topics: Vec<NewTopicInput>,
}

/// In-memory managed Kafka service implementing the management, service-account and
/// instance admin APIs.
#[derive(Clone, Default)]
pub struct FakeKafka {
    state: Arc<Mutex<FakeState>>,
}

pub const FAKE_KAFKA_ID: &str = "kafka-0001";

impl FakeKafka {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statuses returned by successive lookups; the last one repeats
    pub fn with_statuses(self, statuses: impl IntoIterator<Item = KafkaStatus>) -> Self {
        self.state.lock().unwrap().statuses = statuses.into_iter().collect();
        self
    }

    pub fn with_create_status(self, status: KafkaStatus) -> Self {
        self.state.lock().unwrap().create_status = Some(status);
        self
    }

    /// Deleting a service account reports success but leaves it in place
    pub fn with_sticky_service_accounts(self) -> Self {
        self.state.lock().unwrap().sticky_accounts = true;
        self
    }

    /// ACL creation succeeds but nothing is stored
    pub fn with_ignored_acls(self) -> Self {
        self.state.lock().unwrap().ignore_acls = true;
        self
    }

    pub fn with_failing_topic(self, name: &str) -> Self {
        self.state.lock().unwrap().failing_topic = Some(name.to_string());
        self
    }

    pub fn get_calls(&self) -> usize {
        self.state.lock().unwrap().get_calls
    }

    pub fn deleted_kafkas(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted_kafkas.clone()
    }

    pub fn deleted_accounts(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted_accounts.clone()
    }

    pub fn acls(&self) -> Vec<AclBinding> {
        self.state.lock().unwrap().acls.clone()
    }

    pub fn topics(&self) -> Vec<NewTopicInput> {
        self.state.lock().unwrap().topics.clone()
    }

    fn kafka(name: &str, status: KafkaStatus) -> KafkaRequest {
        KafkaRequest {
            id: FAKE_KAFKA_ID.to_string(),
            name: name.to_string(),
            status,
            bootstrap_server_host: Some(format!("{}.kafka.example.com:443", name)),
            admin_api_server_url: "https://admin.kafka.example.com".parse().ok(),
            failed_reason: (status == KafkaStatus::Failed).then(|| "quota exceeded".to_string()),
        }
    }
}

impl KafkaManagement for FakeKafka {
    async fn create_kafka(&self, payload: &KafkaRequestPayload) -> Result<KafkaRequest> {
        let status = self
            .state
            .lock()
            .unwrap()
            .create_status
            .unwrap_or(KafkaStatus::Accepted);
        Ok(Self::kafka(&payload.name, status))
    }

    async fn get_kafka_by_id(&self, id: &str) -> Result<KafkaRequest> {
        let mut state = self.state.lock().unwrap();
        state.get_calls += 1;
        let status = if state.statuses.len() > 1 {
            state.statuses.pop_front()
        } else {
            state.statuses.front().copied()
        };
        let mut kafka = Self::kafka("mas-dbz-test", status.unwrap_or(KafkaStatus::Ready));
        kafka.id = id.to_string();
        Ok(kafka)
    }

    async fn delete_kafka_by_id(&self, id: &str) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .deleted_kafkas
            .push(id.to_string());
        Ok(())
    }
}

impl ServiceAccounts for FakeKafka {
    async fn create_service_account(&self, request: &ServiceAccountRequest) -> Result<ServiceAccount> {
        let mut state = self.state.lock().unwrap();
        state.next_account += 1;
        let account = ServiceAccount {
            id: format!("srvc-acct-{}", state.next_account),
            name: request.name.clone(),
            description: Some(request.description.clone()),
            secret: Some("s3cr3t".to_string()),
        };
        state.accounts.insert(account.id.clone(), account.clone());
        Ok(account)
    }

    async fn get_service_account(&self, id: &str) -> Result<Option<ServiceAccount>> {
        Ok(self.state.lock().unwrap().accounts.get(id).map(|a| ServiceAccount {
            secret: None,
            ..a.clone()
        }))
    }

    async fn delete_service_account(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.sticky_accounts {
            state.accounts.remove(id);
        }
        state.deleted_accounts.push(id.to_string());
        Ok(())
    }
}

impl KafkaInstanceAdmin for FakeKafka {
    async fn create_acl(&self, binding: &AclBinding) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.ignore_acls {
            state.acls.push(binding.clone());
        }
        Ok(())
    }

    async fn get_acls(&self, filter: &AclBinding) -> Result<Vec<AclBinding>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .acls
            .iter()
            .filter(|a| *a == filter)
            .cloned()
            .collect())
    }

    async fn create_topic(&self, input: &NewTopicInput) -> Result<Topic> {
        let mut state = self.state.lock().unwrap();
        if state.failing_topic.as_deref() == Some(input.name.as_str()) {
            return Err(SandboxError::ApiError(format!(
                "topic {} already exists",
                input.name
            )));
        }
        state.topics.push(input.clone());
        Ok(Topic {
            name: input.name.clone(),
            partitions: input.settings.num_partitions,
        })
    }
}

/// Records every event emitted on the current thread while [`RecordedLogs::capture`] runs, as
/// `"<LEVEL> <message>"`.
#[derive(Clone, Default)]
pub struct RecordedLogs {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordedLogs {
    pub fn capture<R>(&self, f: impl FnOnce() -> R) -> R {
        let subscriber = Registry::default().with(self.clone());
        tracing::subscriber::with_default(subscriber, f)
    }

    pub fn messages(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages().iter().any(|line| line.contains(needle))
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}

impl<S: Subscriber> Layer<S> for RecordedLogs {
    fn on_event(&self, event: &Event<'_>, _ctx: LayerContext<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.lines
            .lock()
            .unwrap()
            .push(format!("{} {}", event.metadata().level(), visitor.message));
    }
}
