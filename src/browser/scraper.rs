use super::manager::BrowserError;
use crate::renderer::{Locator, Renderer};
use headless_chrome::Tab;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Element operations run as small scripts that report back through this envelope
#[derive(Debug, Deserialize)]
struct ScriptOutcome {
    status: String,
    #[serde(default)]
    value: Value,
}

/// [`Renderer`] over a single Chrome tab
pub struct BrowserScraper {
    tab: Arc<Tab>,
}

impl BrowserScraper {
    /// Create a new scraper with the given tab
    pub fn new(tab: Arc<Tab>) -> Self {
        Self::with_timeout(tab, Duration::from_secs(30))
    }

    /// Create a new scraper with a custom navigation timeout
    pub fn with_timeout(tab: Arc<Tab>, timeout: Duration) -> Self {
        tab.set_default_timeout(timeout);
        Self { tab }
    }

    fn evaluate(&self, script: &str) -> Result<Value, BrowserError> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| BrowserError::JavaScriptError(e.to_string()))?;
        Ok(result.value.unwrap_or(Value::Null))
    }

    /// Resolve `locator[index]` in the page and run `body` against it as `el`
    fn on_element(&self, locator: &Locator, index: usize, body: &str) -> Result<Value, BrowserError> {
        let script = element_script(locator, index, body);
        let raw = self.evaluate(&script)?;
        let payload = raw
            .as_str()
            .ok_or_else(|| BrowserError::JavaScriptError("Script returned no value".to_string()))?;
        let outcome: ScriptOutcome = serde_json::from_str(payload)
            .map_err(|e| BrowserError::JavaScriptError(format!("Malformed script result: {}", e)))?;

        let target = format!("{} [{}]", locator, index);
        match outcome.status.as_str() {
            "ok" => Ok(outcome.value),
            "missing" => Err(BrowserError::ElementNotFound(target)),
            "stale" => Err(BrowserError::StaleElement(target)),
            "intercepted" => Err(BrowserError::ClickIntercepted(target)),
            other => Err(BrowserError::JavaScriptError(format!(
                "Unexpected script status `{}` for {}",
                other, target
            ))),
        }
    }
}

impl Renderer for BrowserScraper {
    fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        self.tab
            .navigate_to(url)
            .map_err(|e| BrowserError::NavigationError(format!("Failed to navigate to {}: {}", url, e)))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| BrowserError::NavigationError(format!("Navigation timeout for {}: {}", url, e)))?;

        Ok(())
    }

    fn current_url(&self) -> Result<String, BrowserError> {
        Ok(self.tab.get_url())
    }

    fn page_source(&self) -> Result<String, BrowserError> {
        self.tab
            .get_content()
            .map_err(|e| BrowserError::HtmlExtractionError(e.to_string()))
    }

    fn document_ready(&self) -> Result<bool, BrowserError> {
        let value = self.evaluate("document.readyState === 'complete'")?;
        Ok(value.as_bool().unwrap_or(false))
    }

    fn count(&self, locator: &Locator) -> Result<usize, BrowserError> {
        let script = format!("(() => {}.length)()", resolve_expression(locator));
        let value = self.evaluate(&script)?;
        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| BrowserError::JavaScriptError(format!("Count of {} was not a number", locator)))
    }

    fn text(&self, locator: &Locator, index: usize) -> Result<String, BrowserError> {
        let value = self.on_element(
            locator,
            index,
            "return JSON.stringify({ status: 'ok', value: (el.innerText || el.textContent || '').trim() });",
        )?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    fn attribute(
        &self,
        locator: &Locator,
        index: usize,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        let body = format!(
            "return JSON.stringify({{ status: 'ok', value: el.getAttribute({}) }});",
            js_string(name)
        );
        let value = self.on_element(locator, index, &body)?;
        Ok(value.as_str().map(str::to_string))
    }

    fn is_clickable(&self, locator: &Locator, index: usize) -> Result<bool, BrowserError> {
        let value = self.on_element(
            locator,
            index,
            r#"const r = el.getBoundingClientRect();
            const style = window.getComputedStyle(el);
            const visible = r.width > 0 && r.height > 0
                && style.visibility !== 'hidden' && style.display !== 'none';
            const enabled = !el.disabled && el.getAttribute('aria-disabled') !== 'true';
            return JSON.stringify({ status: 'ok', value: visible && enabled });"#,
        )?;
        Ok(value.as_bool().unwrap_or(false))
    }

    fn click(&self, locator: &Locator, index: usize) -> Result<(), BrowserError> {
        // Click where a user would: the topmost element at the target's centre. It must be the
        // target or related to it, otherwise an overlay would have received the click.
        self.on_element(
            locator,
            index,
            r#"const r = el.getBoundingClientRect();
            const top = document.elementFromPoint(r.left + r.width / 2, r.top + r.height / 2);
            if (top && top !== el && !el.contains(top) && !top.contains(el)) {
                return JSON.stringify({ status: 'intercepted' });
            }
            const target = (top && el.contains(top)) ? top : (el.querySelector('a') || el);
            target.click();
            return JSON.stringify({ status: 'ok' });"#,
        )?;
        Ok(())
    }

    fn scroll_into_view(&self, locator: &Locator, index: usize) -> Result<(), BrowserError> {
        self.on_element(
            locator,
            index,
            "el.scrollIntoView(true); return JSON.stringify({ status: 'ok' });",
        )?;
        Ok(())
    }

    fn type_text(&self, locator: &Locator, index: usize, text: &str) -> Result<(), BrowserError> {
        let body = format!(
            r#"el.focus();
            el.value = {};
            el.dispatchEvent(new Event('input', {{ bubbles: true }}));
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return JSON.stringify({{ status: 'ok' }});"#,
            js_string(text)
        );
        self.on_element(locator, index, &body)?;
        Ok(())
    }

    fn press_escape(&self) -> Result<(), BrowserError> {
        self.tab
            .press_key("Escape")
            .map_err(|e| BrowserError::JavaScriptError(format!("Escape key failed: {}", e)))?;
        Ok(())
    }
}

/// Quote a Rust string as a JavaScript string literal
fn js_string(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

/// JavaScript expression evaluating to the array of elements matching the locator
fn resolve_expression(locator: &Locator) -> String {
    match locator {
        Locator::Css(selector) => {
            format!("Array.from(document.querySelectorAll({}))", js_string(selector))
        }
        Locator::LinkText(text) => format!(
            "Array.from(document.querySelectorAll('a')).filter(a => (a.innerText || a.textContent || '').trim() === {})",
            js_string(text)
        ),
    }
}

fn element_script(locator: &Locator, index: usize, body: &str) -> String {
    format!(
        r#"(() => {{
    const els = {resolve};
    const el = els[{index}];
    if (!el) {{
        return JSON.stringify({{ status: els.length === 0 ? 'missing' : 'stale' }});
    }}
    {body}
}})()"#,
        resolve = resolve_expression(locator),
        index = index,
        body = body
    )
}
