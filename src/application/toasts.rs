//! Non-blocking notifications raised by list controllers and the import wizard.

use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

const DEFAULT_TOAST_TTL: Duration = Duration::from_millis(6000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    Success,
    Error,
}

impl ToastKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub id: Uuid,
    pub kind: ToastKind,
    pub text: String,
    #[serde(skip)]
    pub ttl: Duration,
}

impl Toast {
    pub fn success(text: impl Into<String>) -> Self {
        Self::with_ttl(ToastKind::Success, text, DEFAULT_TOAST_TTL)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::with_ttl(ToastKind::Error, text, DEFAULT_TOAST_TTL)
    }

    pub fn with_ttl(kind: ToastKind, text: impl Into<String>, ttl: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            text: text.into(),
            ttl,
        }
    }
}

/// Pending toasts, drained by whoever presents them.
#[derive(Debug, Default)]
pub struct ToastQueue {
    pending: Vec<Toast>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, toast: Toast) {
        match toast.kind {
            ToastKind::Success => info!(toast_id = %toast.id, text = %toast.text, "toast"),
            ToastKind::Error => warn!(toast_id = %toast.id, text = %toast.text, "toast"),
        }
        self.pending.push(toast);
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.push(Toast::success(text));
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(Toast::error(text));
    }

    pub fn peek(&self) -> &[Toast] {
        &self.pending
    }

    pub fn last(&self) -> Option<&Toast> {
        self.pending.last()
    }

    pub fn drain(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.pending)
    }
}
