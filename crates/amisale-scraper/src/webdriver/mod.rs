//! W3C WebDriver client used as the rendering browser.
//!
//! Speaks the plain JSON wire protocol over `reqwest`, so any driver
//! (chromedriver, a Selenium grid) can sit behind `webdriver_url`.

mod capabilities;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, Method};
use serde_json::{json, Value};

use crate::browser::Browser;
use crate::error::ScraperError;

use capabilities::{stealth_capabilities, Fingerprint};

const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Upper bound on scroll steps, for pages that keep growing.
const MAX_SCROLL_STEPS: u32 = 60;

const SCROLL_SCRIPT: &str = r"
    window.scrollBy(0, arguments[0]);
    const doc = document.scrollingElement || document.documentElement;
    return (window.innerHeight + window.scrollY) >= (doc.scrollHeight - 2);
";

/// W3C element reference key inside `find element` responses.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecc";

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub webdriver_url: String,
    pub headless: bool,
    /// Applied as the session's `pageLoad` timeout and, with some slack, to
    /// every HTTP call against the driver.
    pub page_load_timeout: Duration,
}

/// One live browser session. Acquire with [`WebDriverSession::start`] and
/// release with [`WebDriverSession::close`]; a session dropped without
/// `close` is deleted in the background on a best-effort basis.
pub struct WebDriverSession {
    client: Client,
    base: String,
    session_id: String,
    closed: bool,
}

impl WebDriverSession {
    /// Creates a browser session with a randomized stealth fingerprint.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Http`] if the driver is unreachable.
    /// - [`ScraperError::WebDriver`] if the driver refuses the capabilities.
    /// - [`ScraperError::Deserialize`] if the reply carries no session id.
    pub async fn start(options: &BrowserOptions) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(options.page_load_timeout + Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let base = options.webdriver_url.trim_end_matches('/').to_owned();

        let fingerprint = Fingerprint::random();
        let caps = stealth_capabilities(options.headless, &fingerprint);
        let value = send_command(&client, Method::POST, &format!("{base}/session"), Some(caps), "new session")
            .await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| ScraperError::WebDriver {
                command: "new session".to_owned(),
                message: format!("reply carried no sessionId: {value}"),
            })?;

        let session = Self {
            client,
            base,
            session_id,
            closed: false,
        };

        let page_load_ms = u64::try_from(options.page_load_timeout.as_millis()).unwrap_or(u64::MAX);
        session
            .command(Method::POST, "timeouts", Some(json!({ "pageLoad": page_load_ms })), "set timeouts")
            .await?;
        session
            .command(
                Method::POST,
                "window/rect",
                Some(json!({ "width": fingerprint.width, "height": fingerprint.height })),
                "set window rect",
            )
            .await?;

        tracing::info!(
            session_id = %session.session_id,
            user_agent = %fingerprint.user_agent,
            width = fingerprint.width,
            height = fingerprint.height,
            headless = options.headless,
            "browser session started"
        );
        Ok(session)
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Deletes the session, shutting the browser down.
    ///
    /// # Errors
    ///
    /// Returns the driver's error if the delete request fails. The session is
    /// considered released either way.
    pub async fn close(mut self) -> Result<(), ScraperError> {
        self.closed = true;
        let url = format!("{}/session/{}", self.base, self.session_id);
        send_command(&self.client, Method::DELETE, &url, None, "delete session").await?;
        tracing::info!(session_id = %self.session_id, "browser session closed");
        Ok(())
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        name: &str,
    ) -> Result<Value, ScraperError> {
        let url = format!("{}/session/{}/{path}", self.base, self.session_id);
        send_command(&self.client, method, &url, body, name).await
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let url = format!("{}/session/{}", self.base, self.session_id);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!(session_id = %self.session_id, "session dropped without close, deleting in background");
                let client = self.client.clone();
                handle.spawn(async move {
                    if let Err(e) = client.delete(&url).send().await {
                        tracing::warn!(error = %e, "background session delete failed");
                    }
                });
            }
            Err(_) => {
                tracing::warn!(session_id = %self.session_id, "session dropped outside a runtime; browser may linger");
            }
        }
    }
}

#[async_trait]
impl Browser for WebDriverSession {
    async fn navigate(&self, url: &str) -> Result<(), ScraperError> {
        self.command(Method::POST, "url", Some(json!({ "url": url })), "navigate")
            .await
            .map(|_| ())
    }

    async fn wait_for_element(&self, css: &str, timeout: Duration) -> Result<bool, ScraperError> {
        let deadline = Instant::now() + timeout;
        let body = json!({ "using": "css selector", "value": css });
        loop {
            match self
                .command(Method::POST, "element", Some(body.clone()), "find element")
                .await
            {
                Ok(value) if value.get(ELEMENT_KEY).is_some() => return Ok(true),
                Ok(_) => {}
                Err(ScraperError::WebDriver { ref message, .. }) if message.starts_with("no such element") => {}
                Err(e) => return Err(e),
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(ELEMENT_POLL_INTERVAL).await;
        }
    }

    async fn scroll_to_bottom(&self) -> Result<(), ScraperError> {
        for step in 0..MAX_SCROLL_STEPS {
            let (distance, pause_ms) = {
                let mut rng = rand::rng();
                (rng.random_range(300..=700u32), rng.random_range(100..=350u64))
            };
            let at_bottom = self
                .command(
                    Method::POST,
                    "execute/sync",
                    Some(json!({ "script": SCROLL_SCRIPT, "args": [distance] })),
                    "scroll",
                )
                .await?;
            if at_bottom.as_bool().unwrap_or(false) {
                tracing::debug!(steps = step + 1, "reached page bottom");
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(pause_ms)).await;
        }
        tracing::debug!(steps = MAX_SCROLL_STEPS, "stopped scrolling before page bottom");
        Ok(())
    }

    async fn page_source(&self) -> Result<String, ScraperError> {
        let value = self.command(Method::GET, "source", None, "page source").await?;
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| ScraperError::WebDriver {
                command: "page source".to_owned(),
                message: "reply value is not a string".to_owned(),
            })
    }
}

/// Sends one WebDriver command and unwraps the `value` member of the reply.
///
/// Error payloads (`{"value": {"error": .., "message": ..}}`) become
/// [`ScraperError::WebDriver`] with message `"<error>: <message>"`.
async fn send_command(
    client: &Client,
    method: Method,
    url: &str,
    body: Option<Value>,
    name: &str,
) -> Result<Value, ScraperError> {
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }
    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;

    let parsed = if text.trim().is_empty() {
        Value::Null
    } else {
        match serde_json::from_str::<Value>(&text) {
            Ok(v) => v,
            Err(source) if status.is_success() => {
                return Err(ScraperError::Deserialize {
                    context: format!("WebDriver {name} reply"),
                    source,
                });
            }
            Err(_) => Value::Null,
        }
    };

    if let Some(error) = parsed.pointer("/value/error").and_then(Value::as_str) {
        let message = parsed
            .pointer("/value/message")
            .and_then(Value::as_str)
            .unwrap_or("unknown webdriver error");
        return Err(ScraperError::WebDriver {
            command: name.to_owned(),
            message: format!("{error}: {message}"),
        });
    }

    if !status.is_success() {
        return Err(ScraperError::UnexpectedStatus {
            status: status.as_u16(),
            command: name.to_owned(),
        });
    }

    Ok(parsed.get("value").cloned().unwrap_or(Value::Null))
}
