// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::sampler::{InvalidInterval, SampleError, TimeoutExpired};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error(transparent)]
    Timeout(#[from] TimeoutExpired),

    #[error(transparent)]
    InvalidInterval(#[from] InvalidInterval),

    #[error("Management API error: {0}")]
    ApiError(String),

    #[error("Unexpected status for {resource}: {status}")]
    UnexpectedStatus { resource: String, status: String },

    #[error("Missing field '{field}' in {resource}")]
    MissingField { resource: String, field: String },

    #[error("ACL binding not applied: {0}")]
    AclNotApplied(String),

    #[error("Pod terminated before becoming ready: {0}")]
    PodTerminated(String),

    #[error("Teardown failed: {}", .0.join("; "))]
    Teardown(Vec<String>),
}

impl From<SampleError<SandboxError>> for SandboxError {
    fn from(err: SampleError<SandboxError>) -> Self {
        match err {
            SampleError::Timeout(expired) => SandboxError::Timeout(expired),
            SampleError::Probe(e) => e,
        }
    }
}

pub type Result<T> = std::result::Result<T, SandboxError>;
