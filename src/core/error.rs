use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigMissingKey,
    ConfigInvalidJson,
    ConfigInvalidValue,

    ValidationInvalidArgument,

    EventUnreadable,
    EventUnsupportedKind,
    EventMissingField,

    ToolSpawnFailed,
    ToolFailed,
    ToolNoCode,

    HttpTransportFailed,
    HttpStatusFailed,

    ResponseMalformed,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

/// Failure category a code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    InputResolution,
    ExternalTool,
    Network,
    MalformedResponse,
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigMissingKey => "config.missing_key",
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::EventUnreadable => "event.unreadable",
            ErrorCode::EventUnsupportedKind => "event.unsupported_kind",
            ErrorCode::EventMissingField => "event.missing_field",

            ErrorCode::ToolSpawnFailed => "tool.spawn_failed",
            ErrorCode::ToolFailed => "tool.failed",
            ErrorCode::ToolNoCode => "tool.no_code",

            ErrorCode::HttpTransportFailed => "http.transport_failed",
            ErrorCode::HttpStatusFailed => "http.status_failed",

            ErrorCode::ResponseMalformed => "response.malformed",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorCode::ConfigMissingKey
            | ErrorCode::ConfigInvalidJson
            | ErrorCode::ConfigInvalidValue
            | ErrorCode::ValidationInvalidArgument => ErrorKind::Config,

            ErrorCode::EventUnreadable
            | ErrorCode::EventUnsupportedKind
            | ErrorCode::EventMissingField => ErrorKind::InputResolution,

            ErrorCode::ToolSpawnFailed | ErrorCode::ToolFailed | ErrorCode::ToolNoCode => {
                ErrorKind::ExternalTool
            }

            ErrorCode::HttpTransportFailed | ErrorCode::HttpStatusFailed => ErrorKind::Network,

            ErrorCode::ResponseMalformed => ErrorKind::MalformedResponse,

            ErrorCode::InternalIoError
            | ErrorCode::InternalJsonError
            | ErrorCode::InternalUnexpected => ErrorKind::Internal,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMissingKeyDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFieldDetails {
    pub event: String,
    pub field: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolFailedDetails {
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub stderr: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpFailedDetails {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    pub fn config_missing_key(key: impl Into<String>, env: Option<String>) -> Self {
        let key = key.into();
        let hint = match &env {
            Some(var) => format!("Pass --{} or set {}", key, var),
            None => format!("Pass --{} or add it to the config file", key),
        };
        let details = to_details(ConfigMissingKeyDetails {
            key: key.clone(),
            env,
        });

        Self::new(
            ErrorCode::ConfigMissingKey,
            format!("Missing required setting '{}'", key),
            details,
        )
        .with_hint(hint)
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidJson,
            "Invalid JSON in configuration",
            serde_json::json!({ "path": path.into(), "error": err.to_string() }),
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        let details = to_details(ConfigInvalidValueDetails {
            key: key.into(),
            value,
            problem: problem.into(),
        });

        Self::new(
            ErrorCode::ConfigInvalidValue,
            "Invalid configuration value",
            details,
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
    ) -> Self {
        let details = to_details(InvalidArgumentDetails {
            field: field.into(),
            problem: problem.into(),
        });

        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            details,
        )
    }

    pub fn event_unreadable(path: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::EventUnreadable,
            "Cannot read event payload",
            serde_json::json!({ "path": path.into(), "error": error.into() }),
        )
        .with_hint("Set GITHUB_EVENT_PATH or pass --event-path")
    }

    pub fn event_unsupported_kind(kind: impl Into<String>) -> Self {
        let kind = kind.into();
        Self::new(
            ErrorCode::EventUnsupportedKind,
            format!("Cannot resolve branch/commit for event '{}'", kind),
            serde_json::json!({ "event": kind }),
        )
        .with_hint("Trigger the step on push or pull_request events")
    }

    pub fn event_missing_field(event: impl Into<String>, field: impl Into<String>) -> Self {
        let details = to_details(EventFieldDetails {
            event: event.into(),
            field: field.into(),
        });

        Self::new(
            ErrorCode::EventMissingField,
            "Event payload is missing a required field",
            details,
        )
    }

    pub fn tool_spawn_failed(command: impl Into<String>, error: impl Into<String>) -> Self {
        let command = command.into();
        Self::new(
            ErrorCode::ToolSpawnFailed,
            format!("Failed to start '{}'", command),
            serde_json::json!({ "command": command, "error": error.into() }),
        )
    }

    pub fn tool_failed(details: ToolFailedDetails) -> Self {
        let message = format!("'{}' reported an error", details.command);
        Self::new(ErrorCode::ToolFailed, message, to_details(details))
    }

    pub fn tool_no_code(path: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ToolNoCode,
            "Line counter found no code to measure",
            serde_json::json!({ "path": path.into() }),
        )
        .with_hint("Check that --source-path points at the tracked source tree")
    }

    pub fn http_transport_failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        let details = to_details(HttpFailedDetails {
            url: url.into(),
            status: None,
            error: error.into(),
        });

        Self::new(ErrorCode::HttpTransportFailed, "HTTP request failed", details)
    }

    pub fn http_status_failed(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        let details = to_details(HttpFailedDetails {
            url: url.into(),
            status: Some(status),
            error: body.into(),
        });

        Self::new(
            ErrorCode::HttpStatusFailed,
            format!("HTTP {} from remote service", status),
            details,
        )
    }

    pub fn response_malformed(source: impl Into<String>, problem: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResponseMalformed,
            "Unexpected response shape",
            serde_json::json!({ "source": source.into(), "problem": problem.into() }),
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalIoError, "IO error", details)
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalJsonError, "JSON error", details)
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}
