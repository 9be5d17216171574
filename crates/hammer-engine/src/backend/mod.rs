//! Bundled backends: a static HTTP fetch and a live Chromium session.

pub mod browser;
pub mod http;
pub mod static_core;

pub use browser::{find_chromium, ChromiumSession, LiveMutationCore, LiveQueryCore};
pub use http::HttpFetcher;
pub use static_core::StaticQueryCore;

use crate::config::EngineConfig;
use crate::core::{CoreProvider, MutationCore, QueryCore, Target};
use crate::error::EngineResult;
use async_trait::async_trait;

/// The default provider: static queries over HTTP, live queries and
/// mutation over Chromium.
#[derive(Default)]
pub struct WebProvider;

impl WebProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CoreProvider for WebProvider {
    async fn static_query(
        &self,
        target: &Target,
        config: &EngineConfig,
    ) -> EngineResult<Box<dyn QueryCore>> {
        Ok(Box::new(StaticQueryCore::new(target.clone(), config)))
    }

    async fn live_query(
        &self,
        target: &Target,
        config: &EngineConfig,
    ) -> EngineResult<Box<dyn QueryCore>> {
        Ok(Box::new(LiveQueryCore::new(target.clone(), config.clone())))
    }

    async fn mutation(
        &self,
        target: &Target,
        config: &EngineConfig,
    ) -> EngineResult<Box<dyn MutationCore>> {
        Ok(Box::new(LiveMutationCore::new(
            target.clone(),
            config.clone(),
        )))
    }
}
