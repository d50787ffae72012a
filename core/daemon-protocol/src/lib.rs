//! Wire protocol types for the presence daemon.
//!
//! This crate is shared by every editor-side client to prevent schema drift.
//! The daemon remains the authority on what a session looks like; clients
//! reuse these types to build requests and decode its replies.
//!
//! Requests are JSON bodies POSTed to the daemon's loopback address. Replies
//! are the bare result value: `true`, a path string, or a [`SessionSnapshot`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_ADDRESS: &str = "http://127.0.0.1:8080";
pub const DEFAULT_EDITOR_KIND: &str = "Visual Studio Code";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    IsRunning,
    SetPath,
    Ping,
    GetPath,
    GetInfo,
    ImLeaving,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::IsRunning => "is_running",
            Method::SetPath => "set_path",
            Method::Ping => "ping",
            Method::GetPath => "get_path",
            Method::GetInfo => "get_info",
            Method::ImLeaving => "im_leaving",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Envelope carried by every call. `id` lets the daemon multiplex several
/// connected editors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub editor: String,
    pub id: u32,
    pub method: Method,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    pub fn new(editor: impl Into<String>, id: u32, method: Method) -> Self {
        Self {
            editor: editor.into(),
            id,
            method,
            params: None,
        }
    }

    pub fn set_path(editor: impl Into<String>, id: u32, params: &SetPathParams) -> Self {
        Self {
            editor: editor.into(),
            id,
            method: Method::SetPath,
            // A struct of two strings always serializes.
            params: serde_json::to_value(params).ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPathParams {
    pub path: String,
    pub language: String,
}

/// Commit counters tracked by the daemon. The sign encodes direction:
/// positive is ahead, negative is behind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Counters {
    #[serde(rename = "localCommistOnStart", alias = "localCommitsOnStart")]
    pub local_ahead_at_session_start: i64,
    #[serde(rename = "aheadOfLocal")]
    pub ahead_of_local: i64,
    #[serde(rename = "remoteCommitsOnStart")]
    pub remote_ahead_at_session_start: i64,
    #[serde(rename = "aheadOfRemote")]
    pub ahead_of_remote: i64,
    #[serde(rename = "pushedToRemote")]
    pub pushed_to_remote: i64,
}

/// The daemon's view of the repository behind the current editor's path.
///
/// When `valid` is false every other field is meaningless. The default value
/// is the canonical "not in a repository" snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSnapshot {
    pub valid: bool,
    #[serde(rename = "name")]
    pub repo_name: String,
    #[serde(rename = "prettyName")]
    pub repo_display_name: String,
    pub branch: String,
    #[serde(rename = "path")]
    pub repo_path: String,
    #[serde(rename = "hasOrigin")]
    pub has_remote: bool,
    #[serde(rename = "cache")]
    pub counters: Counters,
}

/// Describes a reply that did not have the shape its method promises.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorInfo {}

pub fn parse_snapshot(value: Value) -> Result<SessionSnapshot, ErrorInfo> {
    if !value.is_object() {
        return Err(ErrorInfo::new(
            "invalid_snapshot",
            format!("expected an object, got {}", kind_of(&value)),
        ));
    }
    serde_json::from_value(value).map_err(|err| {
        ErrorInfo::new(
            "invalid_snapshot",
            format!("snapshot payload is invalid: {}", err),
        )
    })
}

pub fn parse_running(value: Value) -> Result<bool, ErrorInfo> {
    value.as_bool().ok_or_else(|| {
        ErrorInfo::new(
            "invalid_running",
            format!("expected a bool, got {}", kind_of(&value)),
        )
    })
}

pub fn parse_path(value: Value) -> Result<String, ErrorInfo> {
    match value {
        Value::String(path) => Ok(path),
        other => Err(ErrorInfo::new(
            "invalid_path",
            format!("expected a string, got {}", kind_of(&other)),
        )),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn oneshot_request_omits_params() {
        let request = Request::new("Visual Studio Code", 4242, Method::Ping);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({"editor": "Visual Studio Code", "id": 4242, "method": "ping"})
        );
    }

    #[test]
    fn set_path_request_carries_params() {
        let params = SetPathParams {
            path: "/repo/src/main.rs".to_string(),
            language: "rust".to_string(),
        };
        let request = Request::set_path("nvim", 7, &params);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["method"], "set_path");
        assert_eq!(value["params"]["path"], "/repo/src/main.rs");
        assert_eq!(value["params"]["language"], "rust");
    }

    #[test]
    fn method_names_match_wire_names() {
        for method in [
            Method::IsRunning,
            Method::SetPath,
            Method::Ping,
            Method::GetPath,
            Method::GetInfo,
            Method::ImLeaving,
        ] {
            let wire = serde_json::to_value(method).unwrap();
            assert_eq!(wire, Value::String(method.as_str().to_string()));
        }
    }

    #[test]
    fn parses_daemon_snapshot() {
        let value = json!({
            "valid": true,
            "name": "presence",
            "prettyName": "Presence",
            "branch": "master",
            "path": "/home/me/presence",
            "hasOrigin": true,
            "cache": {
                "localCommistOnStart": 1,
                "aheadOfLocal": 2,
                "remoteCommitsOnStart": 3,
                "aheadOfRemote": 5,
                "pushedToRemote": -1
            }
        });

        let snapshot = parse_snapshot(value).expect("parse snapshot");
        assert!(snapshot.valid);
        assert_eq!(snapshot.repo_display_name, "Presence");
        assert!(snapshot.has_remote);
        assert_eq!(snapshot.counters.local_ahead_at_session_start, 1);
        assert_eq!(snapshot.counters.ahead_of_remote, 5);
        assert_eq!(snapshot.counters.pushed_to_remote, -1);
    }

    #[test]
    fn accepts_corrected_counter_spelling() {
        let value = json!({"valid": true, "cache": {"localCommitsOnStart": 4}});
        let snapshot = parse_snapshot(value).unwrap();
        assert_eq!(snapshot.counters.local_ahead_at_session_start, 4);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let snapshot = parse_snapshot(json!({"valid": false})).unwrap();
        assert_eq!(snapshot, SessionSnapshot::default());
    }

    #[test]
    fn rejects_non_object_snapshot() {
        assert!(parse_snapshot(json!(true)).is_err());
        assert!(parse_snapshot(json!("nope")).is_err());
    }

    #[test]
    fn rejects_mistyped_snapshot_field() {
        let err = parse_snapshot(json!({"valid": "yes"})).unwrap_err();
        assert_eq!(err.code, "invalid_snapshot");
    }

    #[test]
    fn parses_scalar_replies() {
        assert!(parse_running(json!(true)).unwrap());
        assert!(parse_running(json!("true")).is_err());
        assert_eq!(parse_path(json!("/repo")).unwrap(), "/repo");
        assert!(parse_path(json!(null)).is_err());
    }
}
