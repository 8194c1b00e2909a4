//! Remote-best-effort bookkeeping shared by every repository.
//!
//! Mutations always land locally. The remote result is folded into a
//! [`Synced`] outcome here, and a permission failure raises the
//! access banner at most once per session.

use std::sync::atomic::{AtomicBool, Ordering};

use hq_core::{AppError, ErrorClass, StoreResult};
use serde::Serialize;
use tracing::{debug, warn};

pub const PERMISSION_BANNER: &str =
    "The remote database rejected access. Changes are being saved on this device only.";
pub const UNREACHABLE_ALERT: &str =
    "Could not reach the remote database and no local copy exists. Try reloading.";

/// Something the view layer should show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "kebab-case")]
pub enum Notice {
    /// Persistent banner (access rules rejected us)
    Banner(String),
    /// One-off alert
    Alert(String),
}

impl Notice {
    pub fn permission_banner() -> Self {
        Notice::Banner(PERMISSION_BANNER.to_string())
    }

    pub fn unreachable_alert() -> Self {
        Notice::Alert(UNREACHABLE_ALERT.to_string())
    }
}

/// The value a mutation produced locally, plus what happened remotely.
#[derive(Debug, Clone, PartialEq)]
pub struct Synced<T> {
    pub value: T,
    pub remote_error: Option<AppError>,
    pub notice: Option<Notice>,
}

impl<T> Synced<T> {
    pub fn is_synced(&self) -> bool {
        self.remote_error.is_none()
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Synced<U> {
        Synced {
            value: f(self.value),
            remote_error: self.remote_error,
            notice: self.notice,
        }
    }
}

/// Remote half of a mutation outcome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteOutcome {
    pub error: Option<AppError>,
    pub notice: Option<Notice>,
}

impl RemoteOutcome {
    pub fn with<T>(self, value: T) -> Synced<T> {
        Synced {
            value,
            remote_error: self.error,
            notice: self.notice,
        }
    }
}

#[derive(Debug, Default)]
pub struct Session {
    permission_banner_shown: AtomicBool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a remote result into an outcome. Errors are logged, never
    /// returned.
    pub fn absorb(&self, op: &'static str, result: StoreResult<()>) -> RemoteOutcome {
        match result {
            Ok(()) => {
                debug!(op, "remote write applied");
                RemoteOutcome::default()
            }
            Err(err) => {
                let class = err.class();
                warn!(op, error = %err, ?class, "remote write failed, keeping local change");
                let notice = match class {
                    ErrorClass::Permission if self.claim_banner() => Some(Notice::permission_banner()),
                    _ => None,
                };
                RemoteOutcome {
                    error: Some(AppError::from(err)),
                    notice,
                }
            }
        }
    }

    /// True the first time it is called in this session.
    pub fn claim_banner(&self) -> bool {
        !self.permission_banner_shown.swap(true, Ordering::SeqCst)
    }

    pub fn banner_shown(&self) -> bool {
        self.permission_banner_shown.load(Ordering::SeqCst)
    }
}
