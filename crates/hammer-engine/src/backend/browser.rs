//! Live browser backend using chromiumoxide.
//!
//! One `ChromiumSession` owns one browser process and one page. The query
//! and mutation views over a session are separate cores that share it
//! through [`SharedSession`], so the page is navigated once and closed
//! once no matter how many views were built on it.

use crate::config::EngineConfig;
use crate::core::session::{SessionBackend, SharedSession};
use crate::core::{MutationCore, QueryCore, SelectOption, Target};
use crate::error::{EngineError, EngineResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Locate a Chromium binary: `HAMMER_CHROMIUM_PATH` wins, then a
/// `~/.hammer/chromium` install, then whatever the system provides.
pub fn find_chromium() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("HAMMER_CHROMIUM_PATH") {
        let path = PathBuf::from(p);
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let install = home.join(".hammer/chromium");
        if let Some(path) = ["chrome", "chrome-linux64/chrome"]
            .into_iter()
            .map(|rel| install.join(rel))
            .find(|p| p.exists())
        {
            return Some(path);
        }
    }

    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    if cfg!(target_os = "macos") {
        let app = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if app.exists() {
            return Some(app);
        }
    }

    None
}

/// Quote a value as a JavaScript string literal. JSON string encoding is a
/// valid JS string literal, so selectors and values can never break out of
/// the script they are spliced into.
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// One launched browser process with one navigated page.
pub struct ChromiumSession {
    browser: Mutex<Option<Browser>>,
    page: Page,
}

impl ChromiumSession {
    /// Launch a browser, open a page, and navigate it to the target.
    pub async fn launch(target: &Target, config: &EngineConfig) -> EngineResult<Arc<Self>> {
        let chrome_path = find_chromium().ok_or_else(|| {
            EngineError::Configuration(
                "Chromium not found; set HAMMER_CHROMIUM_PATH or install google-chrome"
                    .to_string(),
            )
        })?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking");
        if config.headless {
            builder = builder.arg("--headless=new");
        } else {
            builder = builder.with_head();
        }
        let browser_config = builder
            .build()
            .map_err(|e| EngineError::Configuration(format!("browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| EngineError::Browser(format!("launch failed: {e}")))?;

        // Drain CDP events for the lifetime of the browser.
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| EngineError::Browser(format!("failed to open page: {e}")))?;
        page.set_user_agent(config.user_agent.clone())
            .await
            .map_err(|e| EngineError::Browser(format!("failed to set user agent: {e}")))?;

        let session = Self {
            browser: Mutex::new(Some(browser)),
            page,
        };
        session.navigate(target, config).await?;
        Ok(Arc::new(session))
    }

    async fn navigate(&self, target: &Target, config: &EngineConfig) -> EngineResult<()> {
        let timeout_ms = config.navigation_timeout.as_millis() as u64;
        let result =
            tokio::time::timeout(config.navigation_timeout, self.page.goto(target.as_str()))
                .await;

        match result {
            Ok(Ok(_)) => {
                let _ = self.page.wait_for_navigation().await;
                Ok(())
            }
            Ok(Err(e)) => Err(EngineError::Browser(format!("navigation failed: {e}"))),
            Err(_) => Err(EngineError::NavigationTimeout {
                url: target.to_string(),
                timeout_ms,
            }),
        }
    }

    /// Evaluate a script on the page and deserialize its result.
    async fn eval<T>(&self, script: &str) -> EngineResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| EngineError::Browser(format!("evaluation failed: {e}")))?;
        result
            .into_value()
            .map_err(|e| EngineError::Browser(format!("unexpected evaluation result: {e:?}")))
    }

    /// Current markup of the rendered document.
    async fn document_html(&self) -> EngineResult<String> {
        self.eval("document.documentElement.outerHTML").await
    }
}

#[async_trait]
impl SessionBackend for Arc<ChromiumSession> {
    async fn close(&self) -> EngineResult<()> {
        let _ = self.page.clone().close().await;
        if let Some(mut browser) = self.browser.lock().await.take() {
            browser
                .close()
                .await
                .map_err(|e| EngineError::Browser(format!("browser close failed: {e}")))?;
            let _ = browser.wait().await;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Query core over a live rendered session. Selectors run against the
/// browser's current DOM, so JS-rendered content is visible.
pub struct LiveQueryCore {
    target: Target,
    config: EngineConfig,
    session: Option<(SharedSession, Arc<ChromiumSession>)>,
}

impl LiveQueryCore {
    pub fn new(target: Target, config: EngineConfig) -> Self {
        Self {
            target,
            config,
            session: None,
        }
    }

    fn chromium(&self) -> EngineResult<&Arc<ChromiumSession>> {
        self.session
            .as_ref()
            .map(|(_, c)| c)
            .ok_or(EngineError::NotInitialized)
    }

    /// First-match lookup returning `null` when nothing matches.
    async fn query_first(&self, selector: &str, property: &str) -> EngineResult<String> {
        let script = format!(
            "(() => {{ const el = document.querySelector({sel}); \
             return el ? {property} : null; }})()",
            sel = js_string(selector),
        );
        let value: Option<String> = self.chromium()?.eval(&script).await?;
        value
            .map(|v| v.trim().to_string())
            .ok_or_else(|| EngineError::NoMatch(selector.to_string()))
    }

    /// All-match lookup, empty when nothing matches.
    async fn query_all(&self, selector: &str, map_expr: &str) -> EngineResult<Vec<String>> {
        let script = format!(
            "Array.from(document.querySelectorAll({sel})).map(el => {map_expr})",
            sel = js_string(selector),
        );
        let values: Vec<String> = self.chromium()?.eval(&script).await?;
        Ok(values.into_iter().map(|v| v.trim().to_string()).collect())
    }
}

#[async_trait]
impl QueryCore for LiveQueryCore {
    fn target(&self) -> &Target {
        &self.target
    }

    async fn initialize(&mut self) -> EngineResult<()> {
        if self.session.is_some() {
            return Ok(());
        }
        let chromium = ChromiumSession::launch(&self.target, &self.config).await?;
        let shared = SharedSession::new(Arc::clone(&chromium));
        self.session = Some((shared, chromium));
        Ok(())
    }

    async fn dispose(&mut self) -> EngineResult<()> {
        if let Some((shared, _)) = self.session.take() {
            shared.release().await?;
        }
        Ok(())
    }

    async fn element_exists(&self, selector: &str) -> EngineResult<bool> {
        let script = format!(
            "document.querySelector({sel}) !== null",
            sel = js_string(selector)
        );
        self.chromium()?.eval(&script).await
    }

    async fn element_count(&self, selector: &str) -> EngineResult<usize> {
        let script = format!(
            "document.querySelectorAll({sel}).length",
            sel = js_string(selector)
        );
        let count: u64 = self.chromium()?.eval(&script).await?;
        Ok(count as usize)
    }

    async fn text(&self, selector: &str) -> EngineResult<String> {
        self.query_first(selector, "el.textContent").await
    }

    async fn text_all(&self, selector: &str) -> EngineResult<Vec<String>> {
        self.query_all(selector, "el.textContent").await
    }

    async fn attribute(&self, selector: &str, name: &str) -> EngineResult<String> {
        let script = format!(
            "(() => {{ const el = document.querySelector({sel}); \
             return el ? el.getAttribute({name}) : null; }})()",
            sel = js_string(selector),
            name = js_string(name),
        );
        let value: Option<String> = self.chromium()?.eval(&script).await?;
        match value {
            Some(v) => Ok(v.trim().to_string()),
            // Distinguish a missing element from a missing attribute.
            None if !self.element_exists(selector).await? => {
                Err(EngineError::NoMatch(selector.to_string()))
            }
            None => Err(EngineError::NoMatch(format!("{selector}@{name}"))),
        }
    }

    async fn attribute_all(&self, selector: &str, name: &str) -> EngineResult<Vec<String>> {
        let script = format!(
            "Array.from(document.querySelectorAll({sel}))\
             .map(el => el.getAttribute({name}))\
             .filter(v => v !== null)",
            sel = js_string(selector),
            name = js_string(name),
        );
        let values: Vec<String> = self.chromium()?.eval(&script).await?;
        Ok(values.into_iter().map(|v| v.trim().to_string()).collect())
    }

    async fn html(&self, selector: &str) -> EngineResult<String> {
        self.query_first(selector, "el.innerHTML").await
    }

    async fn html_all(&self, selector: &str) -> EngineResult<Vec<String>> {
        self.query_all(selector, "el.innerHTML").await
    }

    async fn select_options(&self, selector: &str) -> EngineResult<Vec<SelectOption>> {
        let script = format!(
            "(() => {{ const el = document.querySelector({sel}); \
             if (!el) return null; \
             return Array.from(el.querySelectorAll('option')).map(o => ({{ \
                 text: o.textContent.trim(), \
                 value: o.hasAttribute('value') ? o.getAttribute('value') : o.textContent.trim() \
             }})); }})()",
            sel = js_string(selector),
        );
        let options: Option<Vec<SelectOption>> = self.chromium()?.eval(&script).await?;
        options.ok_or_else(|| EngineError::NoMatch(selector.to_string()))
    }

    async fn document_html(&self) -> EngineResult<String> {
        self.chromium()?.document_html().await
    }

    async fn reload(&mut self, _html: &str) -> EngineResult<()> {
        // The live DOM is the source of truth; there is nothing to refresh.
        self.chromium()?;
        Ok(())
    }

    fn live_session(&self) -> Option<SharedSession> {
        self.session.as_ref().map(|(shared, _)| shared.clone())
    }
}

/// Mutation core over a live session, either its own or one adopted from
/// the active query core.
pub struct LiveMutationCore {
    target: Target,
    config: EngineConfig,
    session: Option<(SharedSession, Arc<ChromiumSession>)>,
}

impl LiveMutationCore {
    pub fn new(target: Target, config: EngineConfig) -> Self {
        Self {
            target,
            config,
            session: None,
        }
    }

    fn chromium(&self) -> EngineResult<&Arc<ChromiumSession>> {
        self.session
            .as_ref()
            .map(|(_, c)| c)
            .ok_or(EngineError::NotInitialized)
    }

    fn page(&self) -> EngineResult<&Page> {
        Ok(&self.chromium()?.page)
    }
}

#[async_trait]
impl MutationCore for LiveMutationCore {
    fn target(&self) -> &Target {
        &self.target
    }

    async fn initialize(&mut self, shared: Option<SharedSession>) -> EngineResult<()> {
        if self.session.is_some() {
            return Ok(());
        }

        match shared {
            Some(shared) => {
                // Adopt the already-navigated session instead of opening a
                // second browser against the same target.
                let chromium = shared
                    .backend()
                    .as_any()
                    .downcast_ref::<Arc<ChromiumSession>>()
                    .ok_or_else(|| {
                        EngineError::Configuration(
                            "shared session is not a chromium session".to_string(),
                        )
                    })?;
                self.session = Some((shared.clone(), Arc::clone(chromium)));
            }
            None => {
                let chromium = ChromiumSession::launch(&self.target, &self.config).await?;
                let shared = SharedSession::new(Arc::clone(&chromium));
                self.session = Some((shared, chromium));
            }
        }
        Ok(())
    }

    async fn dispose(&mut self) -> EngineResult<()> {
        if let Some((shared, _)) = self.session.take() {
            shared.release().await?;
        }
        Ok(())
    }

    async fn click(&self, selector: &str) -> EngineResult<()> {
        let element = self
            .page()?
            .find_element(selector)
            .await
            .map_err(|_| EngineError::NoMatch(selector.to_string()))?;
        element
            .click()
            .await
            .map_err(|e| EngineError::Browser(format!("click failed: {e}")))?;
        Ok(())
    }

    async fn type_text(&self, selector: &str, value: &str) -> EngineResult<()> {
        let element = self
            .page()?
            .find_element(selector)
            .await
            .map_err(|_| EngineError::NoMatch(selector.to_string()))?;
        element
            .click()
            .await
            .map_err(|e| EngineError::Browser(format!("focus failed: {e}")))?;
        element
            .type_str(value)
            .await
            .map_err(|e| EngineError::Browser(format!("typing failed: {e}")))?;
        Ok(())
    }

    async fn select(&self, selector: &str, value: &str) -> EngineResult<()> {
        let script = format!(
            "(() => {{ const el = document.querySelector({sel}); \
             if (!el) return 'no-element'; \
             const opt = Array.from(el.options).find(o => o.value === {value}); \
             if (!opt) return 'no-option'; \
             el.value = {value}; \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
             return 'ok'; }})()",
            sel = js_string(selector),
            value = js_string(value),
        );
        let outcome: String = self.chromium()?.eval(&script).await?;
        match outcome.as_str() {
            "ok" => Ok(()),
            "no-element" => Err(EngineError::NoMatch(selector.to_string())),
            _ => Err(EngineError::NoMatch(format!("{selector} option {value:?}"))),
        }
    }

    async fn document_html(&self) -> EngineResult<String> {
        self.chromium()?.document_html().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_string_quotes_and_escapes() {
        assert_eq!(js_string("#price"), "\"#price\"");
        assert_eq!(js_string("a\"b"), "\"a\\\"b\"");
        assert_eq!(js_string("line\nbreak"), "\"line\\nbreak\"");
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn live_query_and_mutation_share_one_session() {
        let target = Target::new(
            "data:text/html,<h1 id=\"title\">Hello</h1><button id=\"btn\" \
             onclick=\"this.textContent='Clicked'\">Click</button>",
        )
        .unwrap();
        let config = EngineConfig::default();

        let mut query = LiveQueryCore::new(target.clone(), config.clone());
        query.initialize().await.expect("query init failed");
        assert_eq!(query.text("#title").await.unwrap(), "Hello");

        let mut mutation = LiveMutationCore::new(target, config);
        mutation
            .initialize(query.live_session())
            .await
            .expect("mutation init failed");

        mutation.click("#btn").await.expect("click failed");
        // Same session: the query view sees the mutation immediately.
        assert_eq!(query.text("#btn").await.unwrap(), "Clicked");

        mutation.dispose().await.unwrap();
        query.dispose().await.unwrap();
    }
}
