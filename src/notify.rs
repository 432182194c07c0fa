// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User-facing notices.
//!
//! Notices are shown as transient toasts. When the toast queue cannot take
//! another notice it falls back to a blocking alert with the same text, so a
//! message is never dropped.

use serde::Serialize;
use std::collections::VecDeque;

/// Toasts shown at once before falling back to alerts.
pub const TOAST_CAPACITY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

impl NoticeLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            NoticeLevel::Success => "success",
            NoticeLevel::Error => "error",
            NoticeLevel::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("toast queue is full")]
    Full,
}

/// Notices waiting to be shown, split by delivery mechanism.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Delivered {
    pub toasts: Vec<Notice>,
    pub alerts: Vec<Notice>,
}

impl Delivered {
    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty() && self.alerts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.toasts.len() + self.alerts.len()
    }
}

#[derive(Debug)]
pub struct Notifications {
    toasts: VecDeque<Notice>,
    alerts: Vec<Notice>,
    capacity: usize,
}

impl Default for Notifications {
    fn default() -> Self {
        Self::with_capacity(TOAST_CAPACITY)
    }
}

impl Notifications {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            toasts: VecDeque::with_capacity(capacity),
            alerts: Vec::new(),
            capacity,
        }
    }

    fn toast(&mut self, notice: &Notice) -> Result<(), NotifyError> {
        if self.toasts.len() >= self.capacity {
            return Err(NotifyError::Full);
        }
        self.toasts.push_back(notice.clone());
        Ok(())
    }

    /// Queue a notice as a toast, or as an alert if toasts are unavailable.
    pub fn notify(&mut self, notice: Notice) {
        tracing::debug!(level = notice.level.as_str(), message = %notice.message, "Notice");
        if let Err(e) = self.toast(&notice) {
            tracing::debug!(error = %e, "Falling back to alert");
            self.alerts.push(notice);
        }
    }

    /// Hand out everything queued so far.
    pub fn drain(&mut self) -> Delivered {
        Delivered {
            toasts: self.toasts.drain(..).collect(),
            alerts: std::mem::take(&mut self.alerts),
        }
    }

    pub fn pending(&self) -> usize {
        self.toasts.len() + self.alerts.len()
    }
}
