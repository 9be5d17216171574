//! Base engine: mode bookkeeping, core slots, and the mode-guarded
//! `parse`/`manipulate` chokepoint.
//!
//! [`Engine`] owns the state machine; an [`EngineDriver`] supplies backend
//! acquisition (`load` at startup, `acquire` per target) and may hook into
//! manipulation for lazy provisioning and post-mutation synchronization.
//! Callers touch cores only through the guarded entry points, which is what
//! makes the one-operation-at-a-time invariant enforceable: every entry
//! point takes `&mut self`, and mode has already left `Idling` before the
//! first backend suspension point.

pub mod fixed;
pub mod hammer;

use crate::core::{MutationCore, QueryCore, Target};
use crate::error::{CoreRole, EngineError, EngineResult};
use crate::mode::{BackendCapability, EngineKind, EngineMode};
use async_trait::async_trait;
use futures::future::BoxFuture;

/// Operation run against the active query core.
pub type QueryOp<'a, T> = BoxFuture<'a, EngineResult<T>>;

/// Operation run against the active mutation core.
pub type MutationOp<'a, T> = BoxFuture<'a, EngineResult<T>>;

/// The engine's two optional core slots.
///
/// At most one query core and one mutation core are active at a time;
/// replacement and shutoff dispose the previous occupants.
#[derive(Default)]
pub struct CoreSlots {
    pub query: Option<Box<dyn QueryCore>>,
    pub mutation: Option<Box<dyn MutationCore>>,
}

impl CoreSlots {
    /// Dispose and drop both cores, mutation core first.
    ///
    /// Dispose failures are logged, not propagated: teardown must always
    /// leave the slots empty.
    pub async fn dispose_all(&mut self) {
        if let Some(mut core) = self.mutation.take() {
            if let Err(e) = core.dispose().await {
                tracing::warn!("mutation core dispose failed: {e}");
            }
        }
        if let Some(mut core) = self.query.take() {
            if let Err(e) = core.dispose().await {
                tracing::warn!("query core dispose failed: {e}");
            }
        }
    }
}

/// Backend acquisition strategy plugged into [`Engine`].
#[async_trait]
pub trait EngineDriver: Send {
    /// Startup-time acquisition, run inside `Off -> Loading -> Idling`.
    async fn load(&mut self, slots: &mut CoreSlots) -> EngineResult<()>;

    /// Per-target acquisition, run inside `Idling -> Loading -> Idling`.
    async fn acquire(&mut self, target: &Target, slots: &mut CoreSlots) -> EngineResult<()>;

    /// Runs before the `Manipulating` transition, while still `Idling`.
    /// Lazy engines provision their mutation core here.
    async fn before_manipulate(&mut self, slots: &mut CoreSlots) -> EngineResult<()> {
        let _ = slots;
        Ok(())
    }

    /// Runs after the mutation completed and mode returned to `Idling`.
    /// Adaptive engines re-synchronize a non-live query view here.
    async fn after_manipulate(&mut self, slots: &mut CoreSlots) -> EngineResult<()> {
        let _ = slots;
        Ok(())
    }
}

/// An engine instance: mode state machine + core slots + driver.
pub struct Engine<D> {
    kind: EngineKind,
    capability: BackendCapability,
    mode: EngineMode,
    slots: CoreSlots,
    driver: D,
}

impl<D: EngineDriver> Engine<D> {
    /// Build an engine in the `Off` mode.
    pub fn new(kind: EngineKind, capability: BackendCapability, driver: D) -> Self {
        Self {
            kind,
            capability,
            mode: EngineMode::Off,
            slots: CoreSlots::default(),
            driver,
        }
    }

    /// Current mode.
    pub fn mode(&self) -> EngineMode {
        self.mode
    }

    /// Fixed or dynamic backend selection.
    pub fn kind(&self) -> EngineKind {
        self.kind
    }

    /// Declared backend capability.
    pub fn capability(&self) -> BackendCapability {
        self.capability
    }

    /// Whether the engine has been started and not shut off.
    pub fn is_running(&self) -> bool {
        self.mode != EngineMode::Off
    }

    /// The driver, for engine-specific read-only accessors.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Whether a query core is currently active.
    pub fn has_query_core(&self) -> bool {
        self.slots.query.is_some()
    }

    /// Whether a mutation core has been provisioned.
    pub fn has_mutation_core(&self) -> bool {
        self.slots.mutation.is_some()
    }

    /// Validated mode transition for the lifecycle edges. The guarded
    /// entry points assign `Parsing`/`Manipulating`/`Idling` directly after
    /// `require_idling`, which covers the same table; no raw setter is
    /// exposed outside this module.
    fn transition(&mut self, to: EngineMode) -> EngineResult<()> {
        if !self.mode.allows(to) {
            return Err(EngineError::mode_conflict(to, self.mode));
        }
        self.mode = to;
        Ok(())
    }

    /// Fail with a mode conflict unless the engine is idling.
    fn require_idling(&self) -> EngineResult<()> {
        if self.mode != EngineMode::Idling {
            return Err(EngineError::mode_conflict(EngineMode::Idling, self.mode));
        }
        Ok(())
    }

    /// Start the engine. A no-op if it is already running.
    pub async fn startup(&mut self) -> EngineResult<()> {
        if self.is_running() {
            return Ok(());
        }
        self.transition(EngineMode::Loading)?;
        match self.driver.load(&mut self.slots).await {
            Ok(()) => {
                self.transition(EngineMode::Idling)?;
                tracing::info!(kind = ?self.kind, "engine started");
                Ok(())
            }
            Err(e) => {
                // Failed startups leave the engine off, not wedged in Loading.
                self.slots.dispose_all().await;
                self.mode = EngineMode::Off;
                Err(e)
            }
        }
    }

    /// Acquire backends for a target. Requires `Idling`; never queues.
    pub async fn process(&mut self, target: &Target) -> EngineResult<()> {
        self.require_idling()?;
        self.transition(EngineMode::Loading)?;

        // Replacement disposes the previous cores.
        self.slots.dispose_all().await;

        let result = self.driver.acquire(target, &mut self.slots).await;
        if let Err(e) = &result {
            // A failed acquisition leaves no active cores behind.
            self.slots.dispose_all().await;
            tracing::warn!(url = %target, "backend acquisition failed: {e}");
        }
        self.transition(EngineMode::Idling)?;
        result
    }

    /// Run a read operation against the active query core, returning
    /// whatever the operation extracted.
    pub async fn parse<F, T>(&mut self, op: F) -> EngineResult<T>
    where
        F: for<'a> FnOnce(&'a dyn QueryCore) -> QueryOp<'a, T> + Send,
    {
        self.require_idling()?;
        let core = self
            .slots
            .query
            .as_deref()
            .ok_or(EngineError::NotConfigured(CoreRole::Query))?;

        self.mode = EngineMode::Parsing;
        let result = op(core).await;
        self.mode = EngineMode::Idling;
        result
    }

    /// Run a mutation against the active mutation core.
    ///
    /// Mode returns to `Idling` before any error surfaces; a failure in
    /// the post-manipulation hook aborts synchronization but the mutation
    /// itself has already been applied.
    pub async fn manipulate<F, T>(&mut self, op: F) -> EngineResult<T>
    where
        F: for<'a> FnOnce(&'a dyn MutationCore) -> MutationOp<'a, T> + Send,
    {
        self.require_idling()?;
        self.driver.before_manipulate(&mut self.slots).await?;

        let core = self
            .slots
            .mutation
            .as_deref()
            .ok_or(EngineError::NotConfigured(CoreRole::Mutation))?;

        self.mode = EngineMode::Manipulating;
        let result = op(core).await;
        self.mode = EngineMode::Idling;
        let value = result?;

        self.driver.after_manipulate(&mut self.slots).await?;
        Ok(value)
    }

    /// Dispose all cores and turn the engine off.
    ///
    /// Callable from any state, always succeeds, idempotent.
    pub async fn shutoff(&mut self) -> EngineResult<()> {
        if self.mode == EngineMode::Off && self.slots.query.is_none() && self.slots.mutation.is_none()
        {
            return Ok(());
        }
        self.slots.dispose_all().await;
        self.mode = EngineMode::Off;
        tracing::info!("engine shut off");
        Ok(())
    }

    pub(crate) fn slots(&self) -> &CoreSlots {
        &self.slots
    }
}
