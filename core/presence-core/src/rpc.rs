//! Typed daemon calls.
//!
//! Wraps a [`Transport`] with the envelope fields every request carries and
//! decodes each reply into the shape its method promises. Stateless; the
//! session client layers the state machine on top.

use std::sync::Arc;

use presence_daemon_protocol::{
    parse_path, parse_running, parse_snapshot, Method, Request, SessionSnapshot, SetPathParams,
};

use crate::error::CallError;
use crate::transport::Transport;

#[derive(Clone)]
pub struct DaemonRpc {
    transport: Arc<dyn Transport>,
    editor: String,
    instance_id: u32,
}

impl DaemonRpc {
    pub fn new(transport: Arc<dyn Transport>, editor: impl Into<String>, instance_id: u32) -> Self {
        Self {
            transport,
            editor: editor.into(),
            instance_id,
        }
    }

    pub fn editor(&self) -> &str {
        &self.editor
    }

    pub fn instance_id(&self) -> u32 {
        self.instance_id
    }

    pub async fn is_running(&self) -> Result<bool, CallError> {
        let value = self.call(Method::IsRunning).await?;
        parse_running(value).map_err(|info| CallError::shape(Method::IsRunning, info))
    }

    pub async fn set_path(&self, path: &str, language: &str) -> Result<SessionSnapshot, CallError> {
        let params = SetPathParams {
            path: path.to_string(),
            language: language.to_string(),
        };
        let request = Request::set_path(self.editor.clone(), self.instance_id, &params);
        let value = self.transport.call(&request).await?;
        parse_snapshot(value).map_err(|info| CallError::shape(Method::SetPath, info))
    }

    pub async fn ping(&self) -> Result<SessionSnapshot, CallError> {
        let value = self.call(Method::Ping).await?;
        parse_snapshot(value).map_err(|info| CallError::shape(Method::Ping, info))
    }

    pub async fn get_path(&self) -> Result<String, CallError> {
        let value = self.call(Method::GetPath).await?;
        parse_path(value).map_err(|info| CallError::shape(Method::GetPath, info))
    }

    pub async fn get_info(&self) -> Result<SessionSnapshot, CallError> {
        let value = self.call(Method::GetInfo).await?;
        parse_snapshot(value).map_err(|info| CallError::shape(Method::GetInfo, info))
    }

    /// The reply body, if any, carries nothing we act on.
    pub async fn im_leaving(&self) -> Result<(), CallError> {
        self.call(Method::ImLeaving).await.map(|_| ())
    }

    async fn call(&self, method: Method) -> Result<serde_json::Value, CallError> {
        let request = Request::new(self.editor.clone(), self.instance_id, method);
        self.transport.call(&request).await
    }
}
