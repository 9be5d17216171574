//! The cheap query core: one static fetch, queried with CSS selectors.
//!
//! The fetched body is kept as an owned string and parsed with `scraper`
//! inside each read operation. `scraper::Html` is not `Send`, so the
//! parsed document must never live across an await point.

use super::http::HttpFetcher;
use crate::config::EngineConfig;
use crate::core::{parse_selector, QueryCore, SelectOption, Target};
use crate::core::session::SharedSession;
use crate::error::{EngineError, EngineResult};
use async_trait::async_trait;
use scraper::Html;

/// Read-only view over a statically fetched document.
pub struct StaticQueryCore {
    target: Target,
    fetcher: HttpFetcher,
    /// The current document markup. `None` before `initialize` and after
    /// `dispose`.
    html: Option<String>,
}

impl StaticQueryCore {
    /// A core that will fetch the target on `initialize`.
    pub fn new(target: Target, config: &EngineConfig) -> Self {
        Self {
            target,
            fetcher: HttpFetcher::new(config),
            html: None,
        }
    }

    /// A core pre-loaded with markup, already initialized. No fetch will
    /// happen.
    pub fn from_html(target: Target, html: impl Into<String>) -> Self {
        Self {
            target,
            fetcher: HttpFetcher::new(&EngineConfig::default()),
            html: Some(html.into()),
        }
    }

    fn document(&self) -> EngineResult<Html> {
        let html = self.html.as_deref().ok_or(EngineError::NotInitialized)?;
        Ok(Html::parse_document(html))
    }
}

#[async_trait]
impl QueryCore for StaticQueryCore {
    fn target(&self) -> &Target {
        &self.target
    }

    async fn initialize(&mut self) -> EngineResult<()> {
        if self.html.is_some() {
            return Ok(());
        }
        let body = self.fetcher.fetch(self.target.as_str()).await?;
        self.html = Some(body);
        Ok(())
    }

    async fn dispose(&mut self) -> EngineResult<()> {
        self.html = None;
        Ok(())
    }

    async fn element_exists(&self, selector: &str) -> EngineResult<bool> {
        Ok(self.element_count(selector).await? > 0)
    }

    async fn element_count(&self, selector: &str) -> EngineResult<usize> {
        let sel = parse_selector(selector)?;
        let doc = self.document()?;
        Ok(doc.select(&sel).count())
    }

    async fn text(&self, selector: &str) -> EngineResult<String> {
        let sel = parse_selector(selector)?;
        let doc = self.document()?;
        let el = doc
            .select(&sel)
            .next()
            .ok_or_else(|| EngineError::NoMatch(selector.to_string()))?;
        Ok(el.text().collect::<String>().trim().to_string())
    }

    async fn text_all(&self, selector: &str) -> EngineResult<Vec<String>> {
        let sel = parse_selector(selector)?;
        let doc = self.document()?;
        Ok(doc
            .select(&sel)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .collect())
    }

    async fn attribute(&self, selector: &str, name: &str) -> EngineResult<String> {
        let sel = parse_selector(selector)?;
        let doc = self.document()?;
        let el = doc
            .select(&sel)
            .next()
            .ok_or_else(|| EngineError::NoMatch(selector.to_string()))?;
        el.value()
            .attr(name)
            .map(|v| v.trim().to_string())
            .ok_or_else(|| EngineError::NoMatch(format!("{selector}@{name}")))
    }

    async fn attribute_all(&self, selector: &str, name: &str) -> EngineResult<Vec<String>> {
        let sel = parse_selector(selector)?;
        let doc = self.document()?;
        Ok(doc
            .select(&sel)
            .filter_map(|el| el.value().attr(name))
            .map(|v| v.trim().to_string())
            .collect())
    }

    async fn html(&self, selector: &str) -> EngineResult<String> {
        let sel = parse_selector(selector)?;
        let doc = self.document()?;
        let el = doc
            .select(&sel)
            .next()
            .ok_or_else(|| EngineError::NoMatch(selector.to_string()))?;
        Ok(el.inner_html().trim().to_string())
    }

    async fn html_all(&self, selector: &str) -> EngineResult<Vec<String>> {
        let sel = parse_selector(selector)?;
        let doc = self.document()?;
        Ok(doc
            .select(&sel)
            .map(|el| el.inner_html().trim().to_string())
            .collect())
    }

    async fn select_options(&self, selector: &str) -> EngineResult<Vec<SelectOption>> {
        let sel = parse_selector(selector)?;
        let option_sel = parse_selector("option")?;
        let doc = self.document()?;
        let select_el = doc
            .select(&sel)
            .next()
            .ok_or_else(|| EngineError::NoMatch(selector.to_string()))?;

        Ok(select_el
            .select(&option_sel)
            .map(|opt| {
                let text = opt.text().collect::<String>().trim().to_string();
                let value = opt
                    .value()
                    .attr("value")
                    .map(str::to_string)
                    .unwrap_or_else(|| text.clone());
                SelectOption { text, value }
            })
            .collect())
    }

    async fn document_html(&self) -> EngineResult<String> {
        let doc = self.document()?;
        Ok(doc.html())
    }

    async fn reload(&mut self, html: &str) -> EngineResult<()> {
        if self.html.is_none() {
            return Err(EngineError::NotInitialized);
        }
        self.html = Some(html.to_string());
        Ok(())
    }

    fn live_session(&self) -> Option<SharedSession> {
        None
    }
}
