//! Real browser control over the Chrome DevTools Protocol.
//!
//! Compiled with the `browser` feature; everything else in the crate runs
//! against [`MockPage`](crate::mock::MockPage) and needs no browser. The
//! driver resolves selectors inside the page with small JavaScript
//! snippets, so every [`Selector`] strategy works over one uniform
//! `evaluate` channel.

use crate::driver::{ElementProbe, PageDriver};
use crate::locator::{InteractionTarget, Selector};
use crate::result::{EnsayoError, EnsayoResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Browser configuration
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 800,
            chromium_path: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// A running browser instance.
#[derive(Debug)]
pub struct Browser {
    inner: CdpBrowser,
    #[allow(dead_code)]
    handle: tokio::task::JoinHandle<()>,
}

impl Browser {
    /// Launch a browser with the given configuration.
    pub async fn launch(config: BrowserConfig) -> EnsayoResult<Self> {
        let mut builder = CdpConfig::builder()
            .window_size(config.viewport_width, config.viewport_height);

        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder.build().map_err(|e| EnsayoError::BrowserLaunch {
            message: e.to_string(),
        })?;

        let (browser, mut handler) =
            CdpBrowser::launch(cdp_config)
                .await
                .map_err(|e| EnsayoError::BrowserLaunch {
                    message: e.to_string(),
                })?;

        let handle = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            inner: browser,
            handle,
        })
    }

    /// Open a new page and wrap it as a [`PageDriver`].
    pub async fn new_page(&self) -> EnsayoResult<CdpDriver> {
        let page = self
            .inner
            .new_page("about:blank")
            .await
            .map_err(|e| EnsayoError::PageError {
                message: e.to_string(),
            })?;
        Ok(CdpDriver { page })
    }

    /// Close the browser.
    pub async fn close(mut self) -> EnsayoResult<()> {
        self.inner
            .close()
            .await
            .map_err(|e| EnsayoError::BrowserLaunch {
                message: e.to_string(),
            })?;
        Ok(())
    }
}

/// [`PageDriver`] over one CDP page.
#[derive(Debug)]
pub struct CdpDriver {
    page: CdpPage,
}

/// JS string literal via JSON encoding (handles quotes and escapes).
fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

/// JS expression evaluating to the array of elements matching `selector`,
/// in document order.
fn candidates_js(selector: &Selector) -> String {
    match selector {
        Selector::Css(css) => format!("Array.from(document.querySelectorAll({}))", js_str(css)),
        Selector::TestId(id) => format!(
            "Array.from(document.querySelectorAll('[data-testid=' + JSON.stringify({}) + ']'))",
            js_str(id)
        ),
        Selector::Text(text) => format!(
            "Array.from(document.querySelectorAll('*')).filter(el => el.children.length === 0 && (el.textContent || '').includes({}))",
            js_str(text)
        ),
        Selector::Role { role, name } => {
            // common implicit-role tags alongside explicit role attributes
            let implicit = match role.as_str() {
                "button" => "button,",
                "link" => "a[href],",
                "heading" => "h1,h2,h3,h4,h5,h6,",
                "textbox" => "input,textarea,",
                _ => "",
            };
            format!(
                "Array.from(document.querySelectorAll('{implicit}[role=' + JSON.stringify({role}) + ']')).filter(el => ((el.getAttribute('aria-label') || el.textContent) || '').includes({name}))",
                role = js_str(role),
                name = js_str(name),
            )
        }
        Selector::CssWithText { css, text } => format!(
            "Array.from(document.querySelectorAll({})).filter(el => (el.textContent || '').includes({}))",
            js_str(css),
            js_str(text)
        ),
    }
}

/// JS expression resolving the target (or `undefined`).
fn element_js(target: &InteractionTarget) -> String {
    format!(
        "({})[{}]",
        candidates_js(target.selector()),
        target.index().unwrap_or(0)
    )
}

#[derive(Debug, Deserialize)]
struct ProbeReply {
    attached: bool,
    visible: bool,
    enabled: bool,
}

impl CdpDriver {
    async fn eval<T: serde::de::DeserializeOwned>(&self, expr: &str) -> EnsayoResult<T> {
        let result = self
            .page
            .evaluate(expr)
            .await
            .map_err(|e| EnsayoError::PageError {
                message: e.to_string(),
            })?;
        result.into_value().map_err(|e| EnsayoError::PageError {
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl PageDriver for CdpDriver {
    async fn goto(&self, url: &str) -> EnsayoResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| EnsayoError::PageError {
                message: format!("navigation to {url} failed: {e}"),
            })?;
        debug!(url, "navigated");
        Ok(())
    }

    async fn current_url(&self) -> EnsayoResult<String> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| EnsayoError::PageError {
                message: e.to_string(),
            })?;
        Ok(url.unwrap_or_default())
    }

    async fn count(&self, selector: &Selector) -> EnsayoResult<usize> {
        self.eval(&format!("({}).length", candidates_js(selector)))
            .await
    }

    async fn probe(&self, target: &InteractionTarget) -> EnsayoResult<ElementProbe> {
        let expr = format!(
            "(() => {{ \
                const el = {}; \
                if (!el) return {{attached: false, visible: false, enabled: false}}; \
                const style = window.getComputedStyle(el); \
                const visible = style.display !== 'none' && style.visibility !== 'hidden' \
                    && (el.offsetParent !== null || style.position === 'fixed'); \
                const enabled = visible && !el.disabled \
                    && el.getAttribute('aria-disabled') !== 'true'; \
                return {{attached: true, visible, enabled}}; \
            }})()",
            element_js(target)
        );
        let reply: ProbeReply = self.eval(&expr).await?;
        Ok(ElementProbe {
            attached: reply.attached,
            visible: reply.visible,
            enabled: reply.enabled,
        })
    }

    async fn click(&self, target: &InteractionTarget, force: bool) -> EnsayoResult<()> {
        // the normal path hit-tests the element's center so an overlay is
        // reported as a failure the caller can retry; the forced path
        // dispatches the click regardless
        let hit_check = if force {
            String::new()
        } else {
            "const r = el.getBoundingClientRect(); \
             const hit = document.elementFromPoint(r.x + r.width / 2, r.y + r.height / 2); \
             if (!hit || !(el === hit || el.contains(hit) || hit.contains(el))) \
                 throw new Error('intercepted by ' + (hit ? hit.tagName : 'nothing')); "
                .to_string()
        };
        let expr = format!(
            "(() => {{ \
                const el = {}; \
                if (!el) throw new Error('not attached'); \
                el.scrollIntoView({{block: 'center', inline: 'center'}}); \
                {hit_check}el.click(); \
                return true; \
            }})()",
            element_js(target)
        );
        let _: bool = self.eval(&expr).await?;
        Ok(())
    }

    async fn scroll_into_view(&self, target: &InteractionTarget) -> EnsayoResult<()> {
        let expr = format!(
            "(() => {{ \
                const el = {}; \
                if (!el) throw new Error('not attached'); \
                el.scrollIntoView({{block: 'center', inline: 'center'}}); \
                return true; \
            }})()",
            element_js(target)
        );
        let _: bool = self.eval(&expr).await?;
        Ok(())
    }

    async fn clear_input(&self, target: &InteractionTarget) -> EnsayoResult<()> {
        // keyboard-level select-all + delete so framework-managed inputs
        // observe real input events
        let expr = format!(
            "(() => {{ \
                const el = {}; \
                if (!el) throw new Error('not attached'); \
                el.focus(); \
                if (el.select) el.select(); \
                document.execCommand('delete', false); \
                return true; \
            }})()",
            element_js(target)
        );
        let _: bool = self.eval(&expr).await?;
        Ok(())
    }

    async fn type_text(&self, target: &InteractionTarget, text: &str) -> EnsayoResult<()> {
        let expr = format!(
            "(() => {{ \
                const el = {}; \
                if (!el) throw new Error('not attached'); \
                el.focus(); \
                document.execCommand('insertText', false, {}); \
                return true; \
            }})()",
            element_js(target),
            js_str(text)
        );
        let _: bool = self.eval(&expr).await?;
        Ok(())
    }

    async fn committed_value(&self, target: &InteractionTarget) -> EnsayoResult<String> {
        let expr = format!(
            "(() => {{ \
                const el = {}; \
                if (!el) throw new Error('not attached'); \
                return ('value' in el) ? String(el.value) : (el.textContent || ''); \
            }})()",
            element_js(target)
        );
        self.eval(&expr).await
    }

    async fn inner_text(&self, target: &InteractionTarget) -> EnsayoResult<String> {
        let expr = format!(
            "(() => {{ \
                const el = {}; \
                if (!el) throw new Error('not attached'); \
                return el.innerText || el.textContent || ''; \
            }})()",
            element_js(target)
        );
        self.eval(&expr).await
    }

    async fn screenshot(&self, path: &Path) -> EnsayoResult<()> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();

        let screenshot = self
            .page
            .execute(params)
            .await
            .map_err(|e| EnsayoError::PageError {
                message: format!("screenshot failed: {e}"),
            })?;

        use base64::Engine;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&screenshot.data)
            .map_err(|e| EnsayoError::PageError {
                message: format!("screenshot decode failed: {e}"),
            })?;

        std::fs::write(path, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_str_escapes_quotes() {
        assert_eq!(js_str(r#"a"b"#), r#""a\"b""#);
    }

    #[test]
    fn test_candidates_js_for_css() {
        let js = candidates_js(&Selector::css("button.primary"));
        assert!(js.contains("querySelectorAll"));
        assert!(js.contains("button.primary"));
    }

    #[test]
    fn test_candidates_js_for_role_includes_implicit_tags() {
        let js = candidates_js(&Selector::role("button", "Start Group"));
        assert!(js.starts_with("Array.from(document.querySelectorAll('button,"));
        assert!(js.contains("Start Group"));
    }

    #[test]
    fn test_element_js_indexes_candidates() {
        let target = InteractionTarget::new(Selector::test_id("group-card")).nth(3);
        let js = element_js(&target);
        assert!(js.ends_with("[3]"));
    }

    #[test]
    fn test_browser_config_builders() {
        let config = BrowserConfig::default()
            .with_headless(false)
            .with_viewport(1920, 1080)
            .with_no_sandbox();
        assert!(!config.headless);
        assert_eq!(config.viewport_width, 1920);
        assert!(!config.sandbox);
    }
}
