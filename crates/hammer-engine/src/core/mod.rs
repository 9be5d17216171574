//! Capability contract between the engines and their backends.
//!
//! Engines hold cores only through the `QueryCore` / `MutationCore` traits
//! and obtain them through a `CoreProvider`. They never name a concrete
//! backend; the one adaptive decision point is `QueryCore::live_session`,
//! which tells the orchestrator whether the active query view already sits
//! on a live browser session it can share.

pub mod session;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use session::SharedSession;
use std::fmt;

/// An opaque resource identifier (a URL), validated at construction and
/// immutable for the lifetime of the cores built against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target(String);

impl Target {
    /// Parse and validate a target URL.
    pub fn new(raw: impl AsRef<str>) -> EngineResult<Self> {
        let parsed = url::Url::parse(raw.as_ref())?;
        Ok(Self(parsed.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One `<option>` element of a `<select>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Visible option text, trimmed.
    pub text: String,
    /// The option's `value` attribute (falls back to the text).
    pub value: String,
}

/// Read-only inspection of a document by selector.
///
/// Every read operation fails with [`EngineError::NotInitialized`] before
/// `initialize` completes or after `dispose`. `dispose` is idempotent.
#[async_trait]
pub trait QueryCore: Send + Sync {
    /// The target this core was built against.
    fn target(&self) -> &Target;

    /// Fetch/render the target document. Idempotent once initialized.
    async fn initialize(&mut self) -> EngineResult<()>;

    /// Release the core's resources. Idempotent.
    async fn dispose(&mut self) -> EngineResult<()>;

    /// Whether at least one element matches the selector.
    async fn element_exists(&self, selector: &str) -> EngineResult<bool>;

    /// How many elements match the selector.
    async fn element_count(&self, selector: &str) -> EngineResult<usize>;

    /// Trimmed text content of the first match.
    async fn text(&self, selector: &str) -> EngineResult<String>;

    /// Trimmed text content of every match.
    async fn text_all(&self, selector: &str) -> EngineResult<Vec<String>>;

    /// An attribute value of the first match.
    async fn attribute(&self, selector: &str, name: &str) -> EngineResult<String>;

    /// The attribute value of every match that carries it.
    async fn attribute_all(&self, selector: &str, name: &str) -> EngineResult<Vec<String>>;

    /// Inner HTML of the first match.
    async fn html(&self, selector: &str) -> EngineResult<String>;

    /// Inner HTML of every match.
    async fn html_all(&self, selector: &str) -> EngineResult<Vec<String>>;

    /// The `<option>`s of the `<select>` matched by the selector.
    async fn select_options(&self, selector: &str) -> EngineResult<Vec<SelectOption>>;

    /// Full markup of the current document.
    async fn document_html(&self) -> EngineResult<String>;

    /// Replace the core's document representation with fresh markup.
    ///
    /// Used after a mutation to make a non-live view observe the mutated
    /// state. Live views are already current and treat this as a no-op.
    async fn reload(&mut self, html: &str) -> EngineResult<()>;

    /// The live session backing this core, when there is one to share.
    /// Static views return `None`.
    fn live_session(&self) -> Option<SharedSession>;
}

/// Scripted interaction with a live document.
#[async_trait]
pub trait MutationCore: Send + Sync {
    /// The target this core was built against.
    fn target(&self) -> &Target;

    /// Establish the live session, or adopt `shared` instead of opening a
    /// second one. Idempotent once initialized.
    async fn initialize(&mut self, shared: Option<SharedSession>) -> EngineResult<()>;

    /// Release the core's resources. Idempotent, and must not close a
    /// shared session that another holder still references.
    async fn dispose(&mut self) -> EngineResult<()>;

    /// Click the first element matching the selector.
    async fn click(&self, selector: &str) -> EngineResult<()>;

    /// Type a value into the first element matching the selector.
    async fn type_text(&self, selector: &str, value: &str) -> EngineResult<()>;

    /// Set the value of the `<select>` matching the selector.
    async fn select(&self, selector: &str, value: &str) -> EngineResult<()>;

    /// Full markup of the live document as it stands now.
    async fn document_html(&self) -> EngineResult<String>;
}

/// Factory seam through which engines obtain cores.
///
/// Cores come back constructed but not initialized; the engine drives the
/// initialize/dispose lifecycle so that load failures surface through the
/// mode-guarded entry points.
#[async_trait]
pub trait CoreProvider: Send + Sync {
    /// A cheap query core over a static fetch of the target.
    async fn static_query(
        &self,
        target: &Target,
        config: &EngineConfig,
    ) -> EngineResult<Box<dyn QueryCore>>;

    /// An expensive query core over a live rendered session.
    async fn live_query(
        &self,
        target: &Target,
        config: &EngineConfig,
    ) -> EngineResult<Box<dyn QueryCore>>;

    /// A mutation core for the target. Session sharing is decided at
    /// `MutationCore::initialize`.
    async fn mutation(
        &self,
        target: &Target,
        config: &EngineConfig,
    ) -> EngineResult<Box<dyn MutationCore>>;
}

/// Parse a selector, mapping failure to the engine error taxonomy.
pub(crate) fn parse_selector(selector: &str) -> EngineResult<scraper::Selector> {
    scraper::Selector::parse(selector).map_err(|_| EngineError::Selector(selector.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_accepts_urls() {
        let t = Target::new("https://shop.example/item").unwrap();
        assert_eq!(t.as_str(), "https://shop.example/item");
    }

    #[test]
    fn target_rejects_garbage() {
        assert!(matches!(
            Target::new("not a url"),
            Err(EngineError::InvalidTarget(_))
        ));
    }

    #[test]
    fn selector_parse_maps_errors() {
        assert!(parse_selector("#price").is_ok());
        assert!(matches!(
            parse_selector("]["),
            Err(EngineError::Selector(_))
        ));
    }
}
