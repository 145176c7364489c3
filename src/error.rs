use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ApplyError {
    /// Browser driver subprocess failed to spawn
    SubprocessSpawn { script: String, source: std::io::Error },

    /// I/O failure on the driver's stdin/stdout pipes
    SessionIO(String),

    /// Driver answered a command with ok=false or an unexpected payload
    SessionProtocol { command: String, error: String },

    /// JSON parsing failed (driver output, AI response, persisted files)
    JsonParse { context: String, source: serde_json::Error },

    /// JSON serialization failed (driver command, persisted files)
    JsonSerialize { context: String, source: serde_json::Error },

    /// A click/type/select against a live control failed
    Interaction { action: String, locator: String, error: String },

    /// Answer source returned an unusable reply
    AnswerSource(String),

    /// HTTP transport failure talking to an answer source
    Http(reqwest::Error),

    /// Filesystem failure on a persisted file
    Io { path: PathBuf, source: std::io::Error },

    /// Invalid configuration value
    Config(String),
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyError::SubprocessSpawn { script, source } => {
                write!(f, "Failed to spawn {} (is Node.js installed?): {}", script, source)
            }
            ApplyError::SessionIO(msg) => write!(f, "Browser session I/O error: {}", msg),
            ApplyError::SessionProtocol { command, error } => {
                write!(f, "Browser command '{}' failed: {}", command, error)
            }
            ApplyError::JsonParse { context, source } => {
                write!(f, "JSON parse error ({}): {}", context, source)
            }
            ApplyError::JsonSerialize { context, source } => {
                write!(f, "JSON serialize error ({}): {}", context, source)
            }
            ApplyError::Interaction { action, locator, error } => {
                write!(f, "{} on '{}' failed: {}", action, locator, error)
            }
            ApplyError::AnswerSource(msg) => write!(f, "Answer source error: {}", msg),
            ApplyError::Http(e) => write!(f, "HTTP error: {}", e),
            ApplyError::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
            ApplyError::Config(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ApplyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApplyError::SubprocessSpawn { source, .. } => Some(source),
            ApplyError::JsonParse { source, .. } => Some(source),
            ApplyError::JsonSerialize { source, .. } => Some(source),
            ApplyError::Http(source) => Some(source),
            ApplyError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApplyError {
    fn from(e: reqwest::Error) -> Self {
        ApplyError::Http(e)
    }
}
