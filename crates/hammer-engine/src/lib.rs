// Copyright 2026 Hammer Contributors
// SPDX-License-Identifier: Apache-2.0

//! Adaptive web-scraping engine.
//!
//! An engine is a mode state machine over two optional backend "cores":
//! a query core for selector-based reads and a mutation core for scripted
//! interaction. [`HammerEngine`] is the adaptive variant: it probes each
//! target with a cheap static fetch and upgrades to a live browser session
//! only when the configured marker selector is missing, provisioning the
//! mutation core lazily on first use.
//!
//! ```no_run
//! use hammer_engine::{HammerDriver, Target};
//!
//! # async fn run() -> hammer_engine::EngineResult<()> {
//! let mut engine = HammerDriver::new("#price").into_engine();
//! engine.startup().await?;
//! engine.process(&Target::new("https://shop.example/item")?).await?;
//!
//! let price = engine
//!     .parse(|core| Box::pin(async move { core.text("#price").await }))
//!     .await?;
//! println!("{price}");
//! engine.shutoff().await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod mode;

pub use backend::WebProvider;
pub use config::EngineConfig;
pub use core::session::{SessionBackend, SharedSession};
pub use core::{CoreProvider, MutationCore, QueryCore, SelectOption, Target};
pub use engine::fixed::{LiveDriver, LiveEngine, StaticDriver, StaticEngine};
pub use engine::hammer::{HammerDriver, HammerEngine};
pub use engine::{CoreSlots, Engine, EngineDriver};
pub use error::{CoreRole, EngineError, EngineResult};
pub use mode::{BackendCapability, EngineKind, EngineMode};
