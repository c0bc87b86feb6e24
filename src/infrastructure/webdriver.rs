// W3C WebDriver rendering backend (chromedriver and friends)
use crate::application::render_backend::{ReadySignal, RenderBackend, RenderSurface};
use crate::domain::errors::FetchError;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::time::Instant;

/// Key under which WebDriver returns element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecc";
/// No new resource entries for this long counts as network idle.
const IDLE_WINDOW: Duration = Duration::from_millis(500);
const POLL_INTERVAL: Duration = Duration::from_millis(100);
const READY_STATE_SCRIPT: &str =
    "return [document.readyState, performance.getEntriesByType('resource').length];";

#[derive(Debug, Deserialize)]
struct WebDriverResponse {
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Clone)]
pub struct WebDriverBackend {
    client: reqwest::Client,
    base_url: String,
    headless: bool,
    locale: String,
    request_timeout: Duration,
}

impl WebDriverBackend {
    pub fn new(
        base_url: String,
        headless: bool,
        locale: String,
        request_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to build WebDriver HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            headless,
            locale,
            request_timeout,
        })
    }

    fn capabilities(&self) -> Value {
        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-gpu".to_string(),
            format!("--lang={}", self.locale),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
        }

        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": {
                        "args": args,
                        "prefs": { "intl.accept_languages": self.locale },
                    },
                },
            },
        })
    }
}

#[async_trait]
impl RenderBackend for WebDriverBackend {
    async fn open_surface(&self) -> Result<Box<dyn RenderSurface>, FetchError> {
        let url = format!("{}/session", self.base_url);
        let value = call(
            &self.client,
            Method::POST,
            &url,
            Some(self.capabilities()),
            self.request_timeout,
        )
        .await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| FetchError::RenderError("WebDriver returned no sessionId".to_string()))?;

        tracing::info!("Opened WebDriver session {}", session_id);
        Ok(Box::new(WebDriverSurface {
            client: self.client.clone(),
            session_url: format!("{}/session/{}", self.base_url, session_id),
            request_timeout: self.request_timeout,
        }))
    }
}

pub struct WebDriverSurface {
    client: reqwest::Client,
    session_url: String,
    request_timeout: Duration,
}

impl WebDriverSurface {
    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, FetchError> {
        let url = format!("{}{}", self.session_url, path);
        call(&self.client, method, &url, body, self.request_timeout).await
    }

    async fn load(&self, url: &str, ready: ReadySignal, timeout: Duration) -> Result<(), FetchError> {
        self.command(
            Method::POST,
            "/timeouts",
            Some(json!({ "pageLoad": timeout.as_millis() as u64 })),
        )
        .await?;
        self.command(Method::POST, "/url", Some(json!({ "url": url }))).await?;
        self.wait_ready(ready).await
    }

    async fn wait_ready(&self, ready: ReadySignal) -> Result<(), FetchError> {
        let mut last_count: Option<u64> = None;
        let mut stable_since = Instant::now();

        loop {
            let state = self
                .command(
                    Method::POST,
                    "/execute/sync",
                    Some(json!({ "script": READY_STATE_SCRIPT, "args": [] })),
                )
                .await?;
            let complete = state.get(0usize).and_then(Value::as_str) == Some("complete");
            let count = state.get(1usize).and_then(Value::as_u64);

            if complete {
                match ready {
                    ReadySignal::DomReady => return Ok(()),
                    ReadySignal::NetworkIdle => {
                        if count == last_count {
                            if stable_since.elapsed() >= IDLE_WINDOW {
                                return Ok(());
                            }
                        } else {
                            last_count = count;
                            stable_since = Instant::now();
                        }
                    }
                }
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl RenderSurface for WebDriverSurface {
    async fn navigate(
        &mut self,
        url: &str,
        ready: ReadySignal,
        timeout: Duration,
    ) -> Result<(), FetchError> {
        match tokio::time::timeout(timeout, self.load(url, ready, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::RenderTimeout(timeout)),
        }
    }

    async fn read_text(&mut self, selector: &str) -> Result<String, FetchError> {
        let element = self
            .command(
                Method::POST,
                "/element",
                Some(json!({ "using": "css selector", "value": selector })),
            )
            .await?;
        let element_id = element
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| FetchError::RenderError(format!("no element for {}", selector)))?;

        let text = self
            .command(Method::GET, &format!("/element/{}/text", element_id), None)
            .await?;
        text.as_str()
            .map(str::to_string)
            .ok_or_else(|| FetchError::RenderError("element text was not a string".to_string()))
    }

    async fn close(&mut self) {
        if let Err(e) = self.command(Method::DELETE, "", None).await {
            tracing::debug!("Failed to close WebDriver session {}: {}", self.session_url, e);
        }
    }
}

async fn call(
    client: &reqwest::Client,
    method: Method,
    url: &str,
    body: Option<Value>,
    timeout: Duration,
) -> Result<Value, FetchError> {
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            FetchError::RenderTimeout(timeout)
        } else {
            FetchError::RenderError(format!("WebDriver request failed: {}", e))
        }
    })?;

    let status = response.status();
    let data = response
        .json::<WebDriverResponse>()
        .await
        .map_err(|e| FetchError::RenderError(format!("Failed to parse WebDriver response: {}", e)))?;

    if !status.is_success() {
        return Err(classify_error(&data.value, timeout));
    }
    Ok(data.value)
}

/// Map a WebDriver error payload onto the fetch taxonomy.
pub fn classify_error(value: &Value, timeout: Duration) -> FetchError {
    let code = value.get("error").and_then(Value::as_str).unwrap_or("unknown error");
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .and_then(|m| m.lines().next())
        .unwrap_or("");

    match code {
        "timeout" | "script timeout" => FetchError::RenderTimeout(timeout),
        _ if message.is_empty() => FetchError::RenderError(code.to_string()),
        _ => FetchError::RenderError(format!("{}: {}", code, message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_timeout() {
        let payload = json!({ "error": "timeout", "message": "timeout: Timed out receiving message from renderer" });

        assert_eq!(
            classify_error(&payload, Duration::from_secs(90)),
            FetchError::RenderTimeout(Duration::from_secs(90))
        );
    }

    #[test]
    fn test_classify_other_keeps_first_line() {
        let payload = json!({
            "error": "no such element",
            "message": "no such element: Unable to locate element\n  (Session info: chrome=120.0)",
        });

        assert_eq!(
            classify_error(&payload, Duration::from_secs(1)),
            FetchError::RenderError("no such element: no such element: Unable to locate element".to_string())
        );
    }

    #[test]
    fn test_classify_unknown_payload() {
        assert_eq!(
            classify_error(&Value::Null, Duration::from_secs(1)),
            FetchError::RenderError("unknown error".to_string())
        );
    }

    #[test]
    fn test_capabilities_follow_settings() {
        let backend = WebDriverBackend::new(
            "http://localhost:9515/".to_string(),
            true,
            "en-US".to_string(),
            Duration::from_secs(120),
        )
        .unwrap();
        let caps = backend.capabilities();
        let args = caps["capabilities"]["alwaysMatch"]["goog:chromeOptions"]["args"]
            .as_array()
            .unwrap();

        assert_eq!(backend.base_url, "http://localhost:9515");
        assert!(args.contains(&json!("--headless=new")));
        assert!(args.contains(&json!("--lang=en-US")));
    }
}
