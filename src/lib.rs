// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod config;
pub mod constants;
pub mod environment;
pub mod error;
pub mod kafka;
pub mod kubernetes;
pub mod logging;
pub mod sampler;
pub mod scope;

#[cfg(test)]
mod test_utils;

pub use environment::CdcEnvironment;
pub use error::{Result, SandboxError};
pub use sampler::TimeoutSampler;
