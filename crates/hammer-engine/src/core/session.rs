//! Shared ownership of a live browser session.
//!
//! A live session may back both the active query core and the mutation
//! core at once. Each holder keeps a [`SharedSession`] clone and calls
//! `release` when it disposes; the underlying session is closed exactly
//! once, by whichever holder releases last.

use crate::error::EngineResult;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The closable resource behind a [`SharedSession`].
#[async_trait]
pub trait SessionBackend: Send + Sync + 'static {
    /// Close the underlying session. Called at most once per session.
    async fn close(&self) -> EngineResult<()>;

    /// The concrete session, for the backend that created it. A mutation
    /// core adopting a shared session downcasts here; the orchestrator
    /// itself never does.
    fn as_any(&self) -> &dyn Any;
}

struct Inner {
    backend: Box<dyn SessionBackend>,
    closed: Mutex<bool>,
}

/// Reference-counted handle to one live session.
///
/// Cloning shares the session; `release` consumes this handle and performs
/// the actual close only when no other handle remains.
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Inner>,
}

impl SharedSession {
    /// Wrap a session backend in a shared handle.
    pub fn new(backend: impl SessionBackend + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend: Box::new(backend),
                closed: Mutex::new(false),
            }),
        }
    }

    /// Whether two handles refer to the same underlying session.
    pub fn same_session(&self, other: &SharedSession) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The backend behind this session.
    pub fn backend(&self) -> &dyn SessionBackend {
        self.inner.backend.as_ref()
    }

    /// Number of live handles to this session.
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Whether the underlying session has already been closed.
    pub async fn is_closed(&self) -> bool {
        *self.inner.closed.lock().await
    }

    /// Drop this handle, closing the session if it was the last one.
    ///
    /// The closed flag makes the close idempotent even if a backend hands
    /// out extra handles of its own.
    pub async fn release(self) -> EngineResult<()> {
        if Arc::strong_count(&self.inner) == 1 {
            let mut closed = self.inner.closed.lock().await;
            if !*closed {
                self.inner.backend.close().await?;
                *closed = true;
            }
        }
        Ok(())
    }
}
