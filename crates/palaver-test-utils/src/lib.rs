//! Scripted `ModelClient` implementations for tests.
//!
//! None of these touch the network; they echo, reply with canned text,
//! or fail with a chosen `ModelCallError` kind while counting calls.

use std::sync::atomic::{AtomicU32, Ordering};

use futures::future::BoxFuture;

use palaver_core::error::ModelCallError;
use palaver_core::traits::ModelClient;
use palaver_core::types::ModelOutput;

/// Returns every prompt unchanged.
#[derive(Default)]
pub struct EchoClient {
    calls: AtomicU32,
}

impl EchoClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of invocations so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ModelClient for EchoClient {
    fn invoke(
        &self,
        prompt: &str,
    ) -> BoxFuture<'_, std::result::Result<ModelOutput, ModelCallError>> {
        let prompt = prompt.to_string();
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move { Ok(ModelOutput::text(prompt)) })
    }
}

/// Replies with the same canned text for every prompt.
pub struct StaticClient {
    reply: String,
    calls: AtomicU32,
}

impl StaticClient {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ModelClient for StaticClient {
    fn invoke(
        &self,
        _prompt: &str,
    ) -> BoxFuture<'_, std::result::Result<ModelOutput, ModelCallError>> {
        let reply = self.reply.clone();
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move { Ok(ModelOutput::text(reply)) })
    }
}

/// The failure kind a scripted client raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    RetryRequested,
    Transient,
    Fatal,
}

impl FailureKind {
    fn to_error(self, message: &str) -> ModelCallError {
        match self {
            Self::RetryRequested => ModelCallError::RetryRequested(message.to_string()),
            Self::Transient => ModelCallError::Transient(message.to_string()),
            Self::Fatal => ModelCallError::Fatal(message.to_string()),
        }
    }
}

/// Fails every invocation with a fixed error kind.
pub struct FailingClient {
    kind: FailureKind,
    message: String,
    calls: AtomicU32,
}

impl FailingClient {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            calls: AtomicU32::new(0),
        }
    }

    pub fn retry_requested(message: impl Into<String>) -> Self {
        Self::new(FailureKind::RetryRequested, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Transient, message)
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Fatal, message)
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ModelClient for FailingClient {
    fn invoke(
        &self,
        _prompt: &str,
    ) -> BoxFuture<'_, std::result::Result<ModelOutput, ModelCallError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let err = self.kind.to_error(&self.message);
        Box::pin(async move { Err(err) })
    }
}

/// Fails the first `failures` invocations with the given kind, then
/// echoes like `EchoClient`.
pub struct FlakyClient {
    kind: FailureKind,
    message: String,
    failures: u32,
    calls: AtomicU32,
}

impl FlakyClient {
    pub fn new(kind: FailureKind, message: impl Into<String>, failures: u32) -> Self {
        Self {
            kind,
            message: message.into(),
            failures,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ModelClient for FlakyClient {
    fn invoke(
        &self,
        prompt: &str,
    ) -> BoxFuture<'_, std::result::Result<ModelOutput, ModelCallError>> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst);
        let result = if attempt < self.failures {
            Err(self.kind.to_error(&self.message))
        } else {
            Ok(ModelOutput::text(prompt))
        };
        Box::pin(async move { result })
    }
}
