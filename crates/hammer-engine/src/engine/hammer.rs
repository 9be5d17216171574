//! The adaptive ("hammer") engine.
//!
//! Minimizes use of the live browser backend while still supporting
//! mutation. `process` probes the target with a cheap static fetch; only
//! when the configured marker selector is missing does it pay for a live
//! session. The mutation core is provisioned lazily by default, and after
//! a mutation the static view is re-synchronized from the live document so
//! subsequent parses observe the mutated state.

use super::{CoreSlots, Engine, EngineDriver};
use crate::backend::WebProvider;
use crate::config::EngineConfig;
use crate::core::{CoreProvider, Target};
use crate::error::{EngineError, EngineResult};
use crate::mode::{BackendCapability, EngineKind};
use async_trait::async_trait;
use std::sync::Arc;

/// Driver implementing the adaptive backend-selection strategy.
pub struct HammerDriver {
    provider: Arc<dyn CoreProvider>,
    config: EngineConfig,
    /// Selector probed against the static fetch. Present means the cheap
    /// view already carries the content we need.
    marker: String,
    /// Defer mutation-core creation until the first `manipulate`.
    lazy: bool,
    /// Whether the active query core is the live backend.
    using_live: bool,
}

impl HammerDriver {
    /// Adaptive driver over the default web backends, lazy by default.
    pub fn new(marker: impl Into<String>) -> Self {
        Self::with_provider(marker, Arc::new(WebProvider::new()))
    }

    /// Adaptive driver over a custom core provider.
    pub fn with_provider(marker: impl Into<String>, provider: Arc<dyn CoreProvider>) -> Self {
        Self {
            provider,
            config: EngineConfig::default(),
            marker: marker.into(),
            lazy: true,
            using_live: false,
        }
    }

    /// Provision the mutation core during `process` instead of deferring.
    pub fn eager(mut self) -> Self {
        self.lazy = false;
        self
    }

    /// Replace the backend configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Finish the builder: a `Dynamic` engine with both capabilities.
    pub fn into_engine(self) -> HammerEngine {
        Engine::new(EngineKind::Dynamic, BackendCapability::Both, self)
    }

    /// Whether the last `process` fell back to the live backend.
    pub fn using_live_backend(&self) -> bool {
        self.using_live
    }

    /// The marker selector this engine probes for.
    pub fn marker(&self) -> &str {
        &self.marker
    }

    async fn provision_mutation(
        &self,
        target: &Target,
        slots: &mut CoreSlots,
    ) -> EngineResult<()> {
        let shared = slots.query.as_ref().and_then(|q| q.live_session());
        let mut mutation = self.provider.mutation(target, &self.config).await?;
        mutation.initialize(shared).await?;
        slots.mutation = Some(mutation);
        Ok(())
    }
}

#[async_trait]
impl EngineDriver for HammerDriver {
    async fn load(&mut self, slots: &mut CoreSlots) -> EngineResult<()> {
        // Nothing is acquired until a target is known.
        slots.dispose_all().await;
        self.using_live = false;
        Ok(())
    }

    async fn acquire(&mut self, target: &Target, slots: &mut CoreSlots) -> EngineResult<()> {
        self.using_live = false;

        // Try the cheap backend first. A load failure propagates and
        // leaves the engine with no active cores.
        let mut cheap = self.provider.static_query(target, &self.config).await?;
        cheap.initialize().await?;

        if cheap.element_exists(&self.marker).await? {
            tracing::debug!(url = %target, marker = %self.marker, "marker present, static backend adopted");
            slots.query = Some(cheap);
        } else {
            // The static fetch failed the probe; its result is discarded,
            // not disposed.
            tracing::info!(url = %target, marker = %self.marker, "marker absent, upgrading to live backend");
            let mut live = self.provider.live_query(target, &self.config).await?;
            live.initialize().await?;
            self.using_live = true;
            slots.query = Some(live);
        }

        if !self.lazy {
            self.provision_mutation(target, slots).await?;
        }

        Ok(())
    }

    async fn before_manipulate(&mut self, slots: &mut CoreSlots) -> EngineResult<()> {
        if !self.lazy || slots.mutation.is_some() {
            return Ok(());
        }
        // Lazy upgrade: first manipulation provisions the mutation core,
        // sharing the live session when the query view already has one.
        let target = match slots.query.as_ref() {
            Some(query) => query.target().clone(),
            None => return Err(EngineError::NotInitialized),
        };
        tracing::debug!(url = %target, "lazily provisioning mutation core");
        self.provision_mutation(&target, slots).await
    }

    async fn after_manipulate(&mut self, slots: &mut CoreSlots) -> EngineResult<()> {
        if self.using_live {
            // The query view shares the mutation core's session; it is
            // already current.
            return Ok(());
        }
        let (Some(mutation), Some(query)) = (slots.mutation.as_ref(), slots.query.as_mut())
        else {
            return Ok(());
        };
        // The static view cannot see the mutation: rebuild its document
        // from the live session's current markup.
        let html = mutation.document_html().await?;
        query.reload(&html).await?;
        tracing::debug!("static view re-synchronized from live document");
        Ok(())
    }
}

/// The adaptive engine: cheap static queries, live mutation on demand.
pub type HammerEngine = Engine<HammerDriver>;

impl Engine<HammerDriver> {
    /// Whether the last `process` fell back to the live backend.
    pub fn using_live_backend(&self) -> bool {
        self.driver().using_live_backend()
    }
}
