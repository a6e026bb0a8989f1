//! Chromium session bootstrap.
//!
//! [`BrowserOptions`] carries the launch options the suite relies on
//! (suppressed password-manager and leak-detection prompts, no notification
//! prompts, tolerant of self-signed certificates, maximized window).
//! When compiled with the `browser` feature, [`launch_browser`] starts
//! Chromium over CDP via chromiumoxide; otherwise it fails with a bootstrap
//! error so callers fall back to the simulator.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::driver::BrowserDriver;
use crate::result::ProbeResult;

/// Browser launch options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserOptions {
    /// Run without a visible window
    pub headless: bool,
    /// Keep Chromium's sandbox (disable in containers)
    pub sandbox: bool,
    /// Explicit Chromium executable; auto-detected when `None`
    pub chromium_path: Option<PathBuf>,
    /// Suppress "save password" prompts
    pub disable_password_manager: bool,
    /// Suppress leaked-password warnings
    pub disable_leak_detection: bool,
    /// Block notification permission prompts
    pub disable_notifications: bool,
    /// Accept self-signed certificates
    pub ignore_certificate_errors: bool,
    /// Maximize the window on start
    pub start_maximized: bool,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: false,
            chromium_path: None,
            disable_password_manager: true,
            disable_leak_detection: true,
            disable_notifications: true,
            ignore_certificate_errors: true,
            start_maximized: true,
        }
    }
}

impl BrowserOptions {
    /// Create default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set headless mode
    #[must_use]
    pub const fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set Chromium executable
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Chromium command-line switches for these options
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["--no-default-browser-check".to_string()];
        if self.disable_password_manager {
            args.push("--disable-save-password-bubble".to_string());
            args.push("--password-store=basic".to_string());
        }
        if self.disable_leak_detection {
            args.push("--disable-features=PasswordLeakDetection".to_string());
        }
        if self.disable_notifications {
            args.push("--disable-notifications".to_string());
        }
        if self.ignore_certificate_errors {
            args.push("--ignore-certificate-errors".to_string());
        }
        if self.start_maximized {
            args.push("--start-maximized".to_string());
        }
        args
    }
}

/// Launch Chromium and return it as a driver
///
/// # Errors
///
/// Returns `SessionBootstrap` if the browser cannot be started, or if the
/// crate was built without the `browser` feature.
pub fn launch_browser(options: &BrowserOptions) -> ProbeResult<Box<dyn BrowserDriver>> {
    #[cfg(feature = "browser")]
    {
        Ok(Box::new(cdp::ChromiumDriver::launch(options)?))
    }
    #[cfg(not(feature = "browser"))]
    {
        let _ = options;
        Err(crate::result::ProbeError::bootstrap(
            "gymprobe was built without the `browser` feature; use the simulator",
        ))
    }
}

#[cfg(feature = "browser")]
pub use cdp::ChromiumDriver;

// ============================================================================
// CDP Implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
#[allow(clippy::significant_drop_tightening)]
mod cdp {
    use super::BrowserOptions;
    use crate::driver::{BrowserDriver, ElementRef, ElementState};
    use crate::locator::Locator;
    use crate::result::{ProbeError, ProbeResult};
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::input::InsertTextParams;
    use chromiumoxide::cdp::browser_protocol::page::{
        EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
    };
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::runtime::Runtime;
    use tracing::{debug, info};

    /// Bound on a single DevTools round trip
    const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

    /// Chromium controlled over the DevTools protocol.
    ///
    /// Owns a single-worker Tokio runtime and blocks on every call, so the
    /// driver surface stays synchronous.
    #[derive(Debug)]
    pub struct ChromiumDriver {
        runtime: Runtime,
        browser: tokio::sync::Mutex<CdpBrowser>,
        page: CdpPage,
        pending_dialog: Arc<Mutex<Option<String>>>,
        handler: tokio::task::JoinHandle<()>,
        closed: AtomicBool,
    }

    fn bootstrap(context: &str, e: impl std::fmt::Display) -> ProbeError {
        ProbeError::bootstrap(format!("{context}: {e}"))
    }

    fn cdp_error(e: impl std::fmt::Display) -> ProbeError {
        ProbeError::driver(e.to_string())
    }

    fn element_expr(element: &ElementRef) -> String {
        format!("({})[{}]", element.locator.to_query(), element.index)
    }

    impl ChromiumDriver {
        /// Launch Chromium and open a blank tab
        ///
        /// # Errors
        ///
        /// Returns `SessionBootstrap` if the runtime, browser or tab cannot
        /// be created.
        pub fn launch(options: &BrowserOptions) -> ProbeResult<Self> {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()
                .map_err(|e| bootstrap("tokio runtime", e))?;

            let mut builder = CdpConfig::builder().args(options.to_args());
            if !options.headless {
                builder = builder.with_head();
            }
            if !options.sandbox {
                builder = builder.no_sandbox();
            }
            if let Some(ref path) = options.chromium_path {
                builder = builder.chrome_executable(path);
            }
            let config = builder.build().map_err(|e| bootstrap("browser config", e))?;

            let pending_dialog = Arc::new(Mutex::new(None));
            let dialog_slot = Arc::clone(&pending_dialog);

            let (browser, page, handler) = runtime.block_on(async move {
                let (browser, mut handler) = CdpBrowser::launch(config)
                    .await
                    .map_err(|e| bootstrap("launch chromium", e))?;

                let handler = tokio::spawn(async move {
                    while let Some(h) = handler.next().await {
                        if h.is_err() {
                            break;
                        }
                    }
                });

                let page = browser
                    .new_page("about:blank")
                    .await
                    .map_err(|e| bootstrap("open tab", e))?;

                let mut dialogs = page
                    .event_listener::<EventJavascriptDialogOpening>()
                    .await
                    .map_err(|e| bootstrap("subscribe to dialogs", e))?;
                let _ = tokio::spawn(async move {
                    while let Some(event) = dialogs.next().await {
                        if let Ok(mut slot) = dialog_slot.lock() {
                            *slot = Some(event.message.clone());
                        }
                    }
                });

                Ok::<_, ProbeError>((browser, page, handler))
            })?;

            info!(headless = options.headless, "chromium launched");

            Ok(Self {
                runtime,
                browser: tokio::sync::Mutex::new(browser),
                page,
                pending_dialog,
                handler,
                closed: AtomicBool::new(false),
            })
        }

        fn pending_dialog(&self) -> Option<String> {
            self.pending_dialog
                .lock()
                .ok()
                .and_then(|slot| slot.clone())
        }

        fn ensure_interactive(&self) -> ProbeResult<()> {
            if self.closed.load(Ordering::SeqCst) {
                return Err(ProbeError::driver("session is closed"));
            }
            match self.pending_dialog() {
                Some(text) => Err(ProbeError::driver(format!("unexpected alert open: {text}"))),
                None => Ok(()),
            }
        }

        fn eval<T: serde::de::DeserializeOwned>(&self, expr: String) -> ProbeResult<T> {
            self.ensure_interactive()?;
            self.runtime.block_on(async {
                let result = tokio::time::timeout(COMMAND_TIMEOUT, self.page.evaluate(expr))
                    .await
                    .map_err(|_| ProbeError::driver("evaluate timed out"))?
                    .map_err(cdp_error)?;
                result.into_value::<T>().map_err(cdp_error)
            })
        }

        /// Run a script against one element; the script sees it as `el`
        /// and returns a status string.
        fn on_element(&self, element: &ElementRef, body: &str) -> ProbeResult<String> {
            let expr = format!(
                "(() => {{ const el = {}; if (!el) return 'missing'; {body} }})()",
                element_expr(element)
            );
            let status: String = self.eval(expr)?;
            match status.as_str() {
                "missing" => Err(ProbeError::driver(format!("no element matches {element}"))),
                "rejected" => Err(ProbeError::InteractionRejected {
                    target: element.to_string(),
                    reason: "control does not accept a direct clear".to_string(),
                }),
                _ => Ok(status),
            }
        }
    }

    impl BrowserDriver for ChromiumDriver {
        fn navigate(&self, url: &str) -> ProbeResult<()> {
            debug!(url, "navigate");
            if self.closed.load(Ordering::SeqCst) {
                return Err(ProbeError::driver("session is closed"));
            }
            self.runtime.block_on(async {
                tokio::time::timeout(COMMAND_TIMEOUT, self.page.goto(url))
                    .await
                    .map_err(|_| ProbeError::driver(format!("navigation to {url} timed out")))?
                    .map_err(cdp_error)?;
                Ok(())
            })
        }

        fn current_url(&self) -> ProbeResult<String> {
            self.runtime.block_on(async {
                let url = self.page.url().await.map_err(cdp_error)?;
                Ok(url.unwrap_or_else(|| "about:blank".to_string()))
            })
        }

        fn find_all(&self, locator: &Locator) -> ProbeResult<Vec<ElementState>> {
            let expr = format!(
                "({}).map(el => {{ \
                   const style = window.getComputedStyle(el); \
                   const boxed = !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length); \
                   return {{ \
                     text: (el.innerText || el.textContent || '').trim(), \
                     value: typeof el.value === 'string' ? el.value : '', \
                     visible: boxed && style.visibility !== 'hidden', \
                     enabled: !el.disabled \
                   }}; \
                 }})",
                locator.to_query()
            );
            self.eval(expr)
        }

        fn click(&self, element: &ElementRef) -> ProbeResult<()> {
            debug!(%element, "click");
            // Deferred so an alert opened by the handler cannot block evaluate
            let _ = self.on_element(element, "setTimeout(() => el.click(), 0); return 'ok';")?;
            Ok(())
        }

        fn clear(&self, element: &ElementRef) -> ProbeResult<()> {
            debug!(%element, "clear");
            let _ = self.on_element(
                element,
                "if (el.readOnly || el.disabled || el.tagName === 'SELECT' || !('value' in el)) \
                   return 'rejected'; \
                 const proto = el.tagName === 'TEXTAREA' \
                   ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype; \
                 Object.getOwnPropertyDescriptor(proto, 'value').set.call(el, ''); \
                 el.dispatchEvent(new Event('input', { bubbles: true })); \
                 return 'ok';",
            )?;
            Ok(())
        }

        fn set_value(&self, element: &ElementRef, value: &str) -> ProbeResult<()> {
            debug!(%element, "set value");
            let value = serde_json::to_string(value)?;
            let _ = self.on_element(
                element,
                &format!(
                    "const proto = Object.getPrototypeOf(el); \
                     const desc = Object.getOwnPropertyDescriptor(proto, 'value'); \
                     if (desc && desc.set) {{ desc.set.call(el, {value}); }} else {{ el.value = {value}; }} \
                     el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
                     el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
                     return 'ok';"
                ),
            )?;
            Ok(())
        }

        fn send_keys(&self, element: &ElementRef, text: &str) -> ProbeResult<()> {
            debug!(%element, "send keys");
            let wanted = serde_json::to_string(text)?;
            let status = self.on_element(
                element,
                &format!(
                    "if (el.tagName === 'SELECT') {{ \
                       const opt = Array.from(el.options).find(o => o.value === {wanted} || o.text.trim() === {wanted}); \
                       if (!opt) return 'no-option'; \
                       Object.getOwnPropertyDescriptor(HTMLSelectElement.prototype, 'value').set.call(el, opt.value); \
                       el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
                       return 'selected'; \
                     }} \
                     el.focus(); \
                     return 'focused';"
                ),
            )?;

            match status.as_str() {
                "focused" => self.runtime.block_on(async {
                    self.page
                        .execute(InsertTextParams::new(text))
                        .await
                        .map_err(cdp_error)?;
                    Ok(())
                }),
                "no-option" => Err(ProbeError::InteractionRejected {
                    target: element.to_string(),
                    reason: format!("select has no option '{text}'"),
                }),
                _ => Ok(()),
            }
        }

        fn alert_text(&self) -> ProbeResult<Option<String>> {
            if self.closed.load(Ordering::SeqCst) {
                return Err(ProbeError::driver("session is closed"));
            }
            Ok(self.pending_dialog())
        }

        fn accept_alert(&self) -> ProbeResult<()> {
            let text = self
                .pending_dialog
                .lock()
                .map_err(|_| ProbeError::driver("dialog state poisoned"))?
                .take()
                .ok_or_else(|| ProbeError::driver("no alert is open"))?;
            debug!(alert = %text, "accept alert");
            self.runtime.block_on(async {
                self.page
                    .execute(HandleJavaScriptDialogParams::new(true))
                    .await
                    .map_err(cdp_error)?;
                Ok(())
            })
        }

        fn quit(&self) -> ProbeResult<()> {
            if self.closed.swap(true, Ordering::SeqCst) {
                return Ok(());
            }
            let result = self.runtime.block_on(async {
                let mut browser = self.browser.lock().await;
                browser.close().await.map_err(cdp_error)?;
                let _ = browser.wait().await;
                Ok(())
            });
            self.handler.abort();
            info!("chromium closed");
            result
        }
    }

    impl Drop for ChromiumDriver {
        fn drop(&mut self) {
            let _ = self.quit();
        }
    }
}
