//! Fixed-kind engines: one backend combination for the engine's whole life.
//!
//! `StaticEngine` never pays for a browser and cannot mutate;
//! `LiveEngine` always renders, with its query and mutation views sharing
//! a single live session.

use super::{CoreSlots, Engine, EngineDriver};
use crate::backend::WebProvider;
use crate::config::EngineConfig;
use crate::core::{CoreProvider, Target};
use crate::error::EngineResult;
use crate::mode::{BackendCapability, EngineKind};
use async_trait::async_trait;
use std::sync::Arc;

/// Driver that only ever acquires the cheap static query core.
pub struct StaticDriver {
    provider: Arc<dyn CoreProvider>,
    config: EngineConfig,
}

impl StaticDriver {
    pub fn new() -> Self {
        Self::with_provider(Arc::new(WebProvider::new()))
    }

    pub fn with_provider(provider: Arc<dyn CoreProvider>) -> Self {
        Self {
            provider,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Finish the builder: a `Fixed`, query-only engine. `manipulate` on
    /// it always fails with a not-configured error.
    pub fn into_engine(self) -> StaticEngine {
        Engine::new(EngineKind::Fixed, BackendCapability::QueryOnly, self)
    }
}

impl Default for StaticDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EngineDriver for StaticDriver {
    async fn load(&mut self, slots: &mut CoreSlots) -> EngineResult<()> {
        slots.dispose_all().await;
        Ok(())
    }

    async fn acquire(&mut self, target: &Target, slots: &mut CoreSlots) -> EngineResult<()> {
        let mut query = self.provider.static_query(target, &self.config).await?;
        query.initialize().await?;
        slots.query = Some(query);
        Ok(())
    }
}

/// Query-only engine over static fetches.
pub type StaticEngine = Engine<StaticDriver>;

/// Driver that always renders with the live backend, query and mutation
/// views sharing one session.
pub struct LiveDriver {
    provider: Arc<dyn CoreProvider>,
    config: EngineConfig,
}

impl LiveDriver {
    pub fn new() -> Self {
        Self::with_provider(Arc::new(WebProvider::new()))
    }

    pub fn with_provider(provider: Arc<dyn CoreProvider>) -> Self {
        Self {
            provider,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Finish the builder: a `Fixed` engine with both capabilities.
    pub fn into_engine(self) -> LiveEngine {
        Engine::new(EngineKind::Fixed, BackendCapability::Both, self)
    }
}

impl Default for LiveDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EngineDriver for LiveDriver {
    async fn load(&mut self, slots: &mut CoreSlots) -> EngineResult<()> {
        slots.dispose_all().await;
        Ok(())
    }

    async fn acquire(&mut self, target: &Target, slots: &mut CoreSlots) -> EngineResult<()> {
        let mut query = self.provider.live_query(target, &self.config).await?;
        query.initialize().await?;

        // One navigation, two views: the mutation core adopts the query
        // core's session instead of opening its own.
        let shared = query.live_session();
        let mut mutation = self.provider.mutation(target, &self.config).await?;
        mutation.initialize(shared).await?;

        slots.query = Some(query);
        slots.mutation = Some(mutation);
        Ok(())
    }
}

/// Always-rendering engine with querying and mutation over one session.
pub type LiveEngine = Engine<LiveDriver>;
