use std::io::{BufRead, BufReader, Write};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::browser::driver::{
    ElementHandle, PageDriver, QUERY_SET_VERSION, RawButton, RawControl, RawStepInfo,
};
use crate::error::ApplyError;

/// Request sent to the browser server over stdin (one JSON line).
#[derive(Debug, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum BrowserRequest<'a> {
    Launch {
        headless: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        storage_state: Option<&'a str>,
        query_version: u32,
    },
    Navigate {
        url: &'a str,
    },
    WaitFor {
        selector: &'a str,
        timeout_ms: u64,
    },
    FindAll {
        #[serde(skip_serializing_if = "Option::is_none")]
        scope: Option<&'a str>,
        selector: &'a str,
    },
    StepInfo {
        container: &'a str,
    },
    FormControls {
        container: &'a str,
    },
    Buttons {
        container: &'a str,
    },
    Action(ActionRequest<'a>),
    Quit,
}

/// Element interaction addressed by selector.
#[derive(Debug, Serialize)]
pub struct ActionRequest<'a> {
    pub action: &'static str,
    pub selector: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

impl<'a> ActionRequest<'a> {
    fn new(action: &'static str, selector: &'a str) -> Self {
        ActionRequest {
            action,
            selector,
            value: None,
            timeout_ms: None,
            delay_ms: None,
        }
    }
}

impl<'a> BrowserRequest<'a> {
    fn name(&self) -> &'static str {
        match self {
            BrowserRequest::Launch { .. } => "launch",
            BrowserRequest::Navigate { .. } => "navigate",
            BrowserRequest::WaitFor { .. } => "wait_for",
            BrowserRequest::FindAll { .. } => "find_all",
            BrowserRequest::StepInfo { .. } => "step_info",
            BrowserRequest::FormControls { .. } => "form_controls",
            BrowserRequest::Buttons { .. } => "buttons",
            BrowserRequest::Action(a) => a.action,
            BrowserRequest::Quit => "quit",
        }
    }
}

/// Response received from the browser server over stdout (one JSON line).
#[derive(Debug, Deserialize)]
pub struct BrowserResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub ready: Option<bool>,
}

/// Launch options for the browser server process.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub server_script: String,
    pub headless: bool,
    pub storage_state: Option<String>,
}

/// A persistent browser session backed by a Node.js browser server.
///
/// The server keeps one Chromium page open and answers the typed queries of
/// `PageDriver`. Commands are NDJSON over stdin, responses NDJSON on stdout.
pub struct BrowserSession {
    child: Child,
    stdin: std::process::ChildStdin,
    reader: BufReader<std::process::ChildStdout>,
    closed: bool,
}

impl BrowserSession {
    pub fn launch(options: &SessionOptions) -> Result<Self, ApplyError> {
        let mut child = Command::new("node")
            .arg(&options.server_script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| ApplyError::SubprocessSpawn {
                script: options.server_script.clone(),
                source: e,
            })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            ApplyError::SessionIO("Failed to capture stdin of browser server".into())
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            ApplyError::SessionIO("Failed to capture stdout of browser server".into())
        })?;

        let mut session = BrowserSession {
            child,
            stdin,
            reader: BufReader::new(stdout),
            closed: false,
        };

        let response = session.read_response()?;
        if !response.ok || response.ready != Some(true) {
            return Err(ApplyError::SessionProtocol {
                command: "launch".into(),
                error: "Did not receive ready signal from browser server".into(),
            });
        }

        session.send_ok(&BrowserRequest::Launch {
            headless: options.headless,
            storage_state: options.storage_state.as_deref(),
            query_version: QUERY_SET_VERSION,
        })?;

        Ok(session)
    }

    fn read_response(&mut self) -> Result<BrowserResponse, ApplyError> {
        let mut line = String::new();
        self.reader.read_line(&mut line).map_err(|e| {
            ApplyError::SessionIO(format!("Failed to read from browser server stdout: {}", e))
        })?;

        if line.trim().is_empty() {
            return Err(ApplyError::SessionIO(
                "Empty response from browser server (process may have died)".into(),
            ));
        }

        serde_json::from_str(line.trim()).map_err(|e| ApplyError::JsonParse {
            context: "browser server response".into(),
            source: e,
        })
    }

    fn send(&mut self, request: &BrowserRequest) -> Result<BrowserResponse, ApplyError> {
        let json = serde_json::to_string(request).map_err(|e| ApplyError::JsonSerialize {
            context: "BrowserRequest".into(),
            source: e,
        })?;
        debug!(command = request.name(), "browser request");

        writeln!(self.stdin, "{}", json).map_err(|e| {
            ApplyError::SessionIO(format!("Failed to write to browser server stdin: {}", e))
        })?;
        self.stdin.flush().map_err(|e| {
            ApplyError::SessionIO(format!("Failed to flush browser server stdin: {}", e))
        })?;

        self.read_response()
    }

    fn send_ok(&mut self, request: &BrowserRequest) -> Result<BrowserResponse, ApplyError> {
        let response = self.send(request)?;
        if !response.ok {
            return Err(ApplyError::SessionProtocol {
                command: request.name().into(),
                error: response.error.unwrap_or_else(|| "Unknown error".into()),
            });
        }
        Ok(response)
    }

    /// Send a query and decode its `data` payload.
    fn query<T: DeserializeOwned>(&mut self, request: &BrowserRequest) -> Result<T, ApplyError> {
        let response = self.send_ok(request)?;
        let data = response.data.unwrap_or(Value::Null);
        serde_json::from_value(data).map_err(|e| ApplyError::JsonParse {
            context: format!("{} payload", request.name()),
            source: e,
        })
    }

    /// Run an interaction; a refusal from the page becomes `ApplyError::Interaction`.
    fn interact(&mut self, action: ActionRequest) -> Result<(), ApplyError> {
        let name = action.action;
        let locator = action.selector.to_string();
        self.send_ok(&BrowserRequest::Action(action))
            .map(|_| ())
            .map_err(|e| match e {
                ApplyError::SessionProtocol { error, .. } => ApplyError::Interaction {
                    action: name.into(),
                    locator,
                    error,
                },
                other => other,
            })
    }

    pub fn quit(&mut self) -> Result<(), ApplyError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        // Best-effort: the process may already be gone
        if let Err(e) = self.send(&BrowserRequest::Quit) {
            warn!("browser server did not acknowledge quit: {}", e);
        }
        let _ = self.child.wait();
        Ok(())
    }
}

impl PageDriver for BrowserSession {
    fn navigate(&mut self, url: &str) -> Result<(), ApplyError> {
        self.send_ok(&BrowserRequest::Navigate { url })?;
        Ok(())
    }

    fn wait_for(
        &mut self,
        selector: &str,
        timeout_ms: u64,
    ) -> Result<Option<ElementHandle>, ApplyError> {
        self.query(&BrowserRequest::WaitFor {
            selector,
            timeout_ms,
        })
    }

    fn find_all(
        &mut self,
        scope: Option<&ElementHandle>,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, ApplyError> {
        self.query(&BrowserRequest::FindAll {
            scope: scope.map(|s| s.selector()),
            selector,
        })
    }

    fn step_info(&mut self, container: &ElementHandle) -> Result<RawStepInfo, ApplyError> {
        self.query(&BrowserRequest::StepInfo {
            container: container.selector(),
        })
    }

    fn form_controls(&mut self, container: &ElementHandle) -> Result<Vec<RawControl>, ApplyError> {
        self.query(&BrowserRequest::FormControls {
            container: container.selector(),
        })
    }

    fn buttons(&mut self, container: &ElementHandle) -> Result<Vec<RawButton>, ApplyError> {
        self.query(&BrowserRequest::Buttons {
            container: container.selector(),
        })
    }

    fn click(&mut self, locator: &str, timeout_ms: u64) -> Result<(), ApplyError> {
        self.interact(ActionRequest {
            timeout_ms: Some(timeout_ms),
            ..ActionRequest::new("click", locator)
        })
    }

    fn check(&mut self, locator: &str, timeout_ms: u64) -> Result<(), ApplyError> {
        self.interact(ActionRequest {
            timeout_ms: Some(timeout_ms),
            ..ActionRequest::new("check", locator)
        })
    }

    fn fill(&mut self, locator: &str, text: &str) -> Result<(), ApplyError> {
        self.interact(ActionRequest {
            value: Some(text),
            ..ActionRequest::new("fill", locator)
        })
    }

    fn type_text(
        &mut self,
        locator: &str,
        text: &str,
        per_char_delay_ms: u64,
    ) -> Result<(), ApplyError> {
        self.interact(ActionRequest {
            value: Some(text),
            delay_ms: Some(per_char_delay_ms),
            ..ActionRequest::new("type", locator)
        })
    }

    fn select_option(
        &mut self,
        locator: &str,
        value: &str,
        timeout_ms: u64,
    ) -> Result<(), ApplyError> {
        self.interact(ActionRequest {
            value: Some(value),
            timeout_ms: Some(timeout_ms),
            ..ActionRequest::new("select_option", locator)
        })
    }

    fn scroll_into_view(&mut self, locator: &str) -> Result<(), ApplyError> {
        self.interact(ActionRequest::new("scroll_into_view", locator))
    }

    fn pause(&mut self, ms: u64) {
        thread::sleep(Duration::from_millis(ms));
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        let _ = self.quit();
    }
}
