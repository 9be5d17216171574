//! Scripted in-memory backends for engine integration tests.
//!
//! A `MockProvider` serves cores over two documents: a fixed static
//! snapshot (what a plain HTTP fetch would return) and a shared live
//! document that mutations edit in place (what a browser would render).
//! Counters record every provisioning and session event so tests can
//! assert on backend selection, lazy provisioning, and session lifetime.

use async_trait::async_trait;
use hammer_engine::backend::StaticQueryCore;
use hammer_engine::{
    CoreProvider, EngineConfig, EngineError, EngineResult, MutationCore, QueryCore, SelectOption,
    SessionBackend, SharedSession, Target,
};
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct MockStats {
    pub static_queries: AtomicUsize,
    pub live_queries: AtomicUsize,
    pub mutation_cores: AtomicUsize,
    pub sessions_opened: AtomicUsize,
    pub sessions_closed: AtomicUsize,
}

impl MockStats {
    pub fn static_queries(&self) -> usize {
        self.static_queries.load(Ordering::SeqCst)
    }
    pub fn live_queries(&self) -> usize {
        self.live_queries.load(Ordering::SeqCst)
    }
    pub fn mutation_cores(&self) -> usize {
        self.mutation_cores.load(Ordering::SeqCst)
    }
    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }
    pub fn sessions_closed(&self) -> usize {
        self.sessions_closed.load(Ordering::SeqCst)
    }
}

/// Session backend that only counts its close.
struct MockSession {
    stats: Arc<MockStats>,
}

#[async_trait]
impl SessionBackend for MockSession {
    async fn close(&self) -> EngineResult<()> {
        self.stats.sessions_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn open_session(stats: &Arc<MockStats>) -> SharedSession {
    stats.sessions_opened.fetch_add(1, Ordering::SeqCst);
    SharedSession::new(MockSession {
        stats: Arc::clone(stats),
    })
}

/// Query core over the shared live document. Each read evaluates against
/// the document as it stands now, so mutations are visible immediately.
pub struct MockLiveQuery {
    target: Target,
    doc: Arc<Mutex<String>>,
    stats: Arc<MockStats>,
    session: Option<SharedSession>,
}

impl MockLiveQuery {
    fn snapshot(&self) -> EngineResult<StaticQueryCore> {
        if self.session.is_none() {
            return Err(EngineError::NotInitialized);
        }
        let html = self
            .doc
            .lock()
            .map_err(|_| EngineError::Browser("live document poisoned".to_string()))?
            .clone();
        Ok(StaticQueryCore::from_html(self.target.clone(), html))
    }
}

#[async_trait]
impl QueryCore for MockLiveQuery {
    fn target(&self) -> &Target {
        &self.target
    }

    async fn initialize(&mut self) -> EngineResult<()> {
        if self.session.is_none() {
            self.session = Some(open_session(&self.stats));
        }
        Ok(())
    }

    async fn dispose(&mut self) -> EngineResult<()> {
        if let Some(session) = self.session.take() {
            session.release().await?;
        }
        Ok(())
    }

    async fn element_exists(&self, selector: &str) -> EngineResult<bool> {
        self.snapshot()?.element_exists(selector).await
    }

    async fn element_count(&self, selector: &str) -> EngineResult<usize> {
        self.snapshot()?.element_count(selector).await
    }

    async fn text(&self, selector: &str) -> EngineResult<String> {
        self.snapshot()?.text(selector).await
    }

    async fn text_all(&self, selector: &str) -> EngineResult<Vec<String>> {
        self.snapshot()?.text_all(selector).await
    }

    async fn attribute(&self, selector: &str, name: &str) -> EngineResult<String> {
        self.snapshot()?.attribute(selector, name).await
    }

    async fn attribute_all(&self, selector: &str, name: &str) -> EngineResult<Vec<String>> {
        self.snapshot()?.attribute_all(selector, name).await
    }

    async fn html(&self, selector: &str) -> EngineResult<String> {
        self.snapshot()?.html(selector).await
    }

    async fn html_all(&self, selector: &str) -> EngineResult<Vec<String>> {
        self.snapshot()?.html_all(selector).await
    }

    async fn select_options(&self, selector: &str) -> EngineResult<Vec<SelectOption>> {
        self.snapshot()?.select_options(selector).await
    }

    async fn document_html(&self) -> EngineResult<String> {
        self.snapshot()?.document_html().await
    }

    async fn reload(&mut self, _html: &str) -> EngineResult<()> {
        // Live views read the shared document directly.
        if self.session.is_none() {
            return Err(EngineError::NotInitialized);
        }
        Ok(())
    }

    fn live_session(&self) -> Option<SharedSession> {
        self.session.clone()
    }
}

/// Mutation core over the shared live document. Clicking `#load-more`
/// appends an item, the scripted behavior the resync tests rely on.
pub struct MockMutation {
    target: Target,
    doc: Arc<Mutex<String>>,
    stats: Arc<MockStats>,
    session: Option<SharedSession>,
}

impl MockMutation {
    fn edit(&self, append: &str) -> EngineResult<()> {
        if self.session.is_none() {
            return Err(EngineError::NotInitialized);
        }
        self.doc
            .lock()
            .map_err(|_| EngineError::Browser("live document poisoned".to_string()))?
            .push_str(append);
        Ok(())
    }
}

#[async_trait]
impl MutationCore for MockMutation {
    fn target(&self) -> &Target {
        &self.target
    }

    async fn initialize(&mut self, shared: Option<SharedSession>) -> EngineResult<()> {
        if self.session.is_some() {
            return Ok(());
        }
        self.session = Some(match shared {
            Some(session) => session,
            None => open_session(&self.stats),
        });
        Ok(())
    }

    async fn dispose(&mut self) -> EngineResult<()> {
        if let Some(session) = self.session.take() {
            session.release().await?;
        }
        Ok(())
    }

    async fn click(&self, selector: &str) -> EngineResult<()> {
        if selector == "#load-more" {
            self.edit("<div class=\"item\">More</div>")
        } else {
            self.edit(&format!("<div data-clicked=\"{selector}\"></div>"))
        }
    }

    async fn type_text(&self, selector: &str, value: &str) -> EngineResult<()> {
        self.edit(&format!("<div data-typed=\"{selector}\">{value}</div>"))
    }

    async fn select(&self, selector: &str, value: &str) -> EngineResult<()> {
        self.edit(&format!("<div data-selected=\"{selector}\">{value}</div>"))
    }

    async fn document_html(&self) -> EngineResult<String> {
        if self.session.is_none() {
            return Err(EngineError::NotInitialized);
        }
        Ok(self
            .doc
            .lock()
            .map_err(|_| EngineError::Browser("live document poisoned".to_string()))?
            .clone())
    }
}

/// Provider over one scripted site.
pub struct MockProvider {
    static_html: String,
    live_doc: Arc<Mutex<String>>,
    stats: Arc<MockStats>,
}

impl MockProvider {
    /// A provider whose static fetch returns `static_html` and whose live
    /// document starts as `live_html`.
    pub fn new(static_html: impl Into<String>, live_html: impl Into<String>) -> Self {
        Self {
            static_html: static_html.into(),
            live_doc: Arc::new(Mutex::new(live_html.into())),
            stats: Arc::new(MockStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<MockStats> {
        Arc::clone(&self.stats)
    }
}

#[async_trait]
impl CoreProvider for MockProvider {
    async fn static_query(
        &self,
        target: &Target,
        _config: &EngineConfig,
    ) -> EngineResult<Box<dyn QueryCore>> {
        self.stats.static_queries.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StaticQueryCore::from_html(
            target.clone(),
            self.static_html.clone(),
        )))
    }

    async fn live_query(
        &self,
        target: &Target,
        _config: &EngineConfig,
    ) -> EngineResult<Box<dyn QueryCore>> {
        self.stats.live_queries.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockLiveQuery {
            target: target.clone(),
            doc: Arc::clone(&self.live_doc),
            stats: Arc::clone(&self.stats),
            session: None,
        }))
    }

    async fn mutation(
        &self,
        target: &Target,
        _config: &EngineConfig,
    ) -> EngineResult<Box<dyn MutationCore>> {
        self.stats.mutation_cores.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockMutation {
            target: target.clone(),
            doc: Arc::clone(&self.live_doc),
            stats: Arc::clone(&self.stats),
            session: None,
        }))
    }
}

pub fn target() -> Target {
    Target::new("https://shop.example/item").expect("valid test url")
}
