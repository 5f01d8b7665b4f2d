//! Typed wrappers over [`SessionStore::api_call`] for the upstream
//! endpoints the application consumes.

use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::SessionError;
use crate::models::{LectureSession, SessionSummary, SessionTranslation};
use crate::session::{ApiReply, ApiRequest, SessionStore};

fn decode_data<T: DeserializeOwned>(reply: ApiReply) -> Result<T, SessionError> {
    let data = reply.into_result()?;
    serde_json::from_value(data).map_err(|err| SessionError::Protocol(err.to_string()))
}

impl SessionStore {
    /// `Session/GetAll`: every published session (student browsing).
    pub async fn sessions_all(&self) -> Result<Vec<LectureSession>, SessionError> {
        let reply = self.api_call("/Session/GetAll", ApiRequest::get()).await?;
        decode_data(reply)
    }

    /// `Session/GetAllUserSessions`: sessions owned by the caller.
    pub async fn sessions_for_user(&self) -> Result<Vec<LectureSession>, SessionError> {
        let reply = self
            .api_call("/Session/GetAllUserSessions", ApiRequest::get())
            .await?;
        decode_data(reply)
    }

    pub async fn session(&self, id: Uuid) -> Result<LectureSession, SessionError> {
        let reply = self
            .api_call(&format!("/Session/Get/{id}"), ApiRequest::get())
            .await?;
        decode_data(reply)
    }

    /// `Session/Create`: multipart upload of a recording. The form carries
    /// `name`, `language` and the `file` part; no content-type override is
    /// set so the transport picks the boundary. Returns the envelope's
    /// `data` verbatim (the upstream is vague about the created shape).
    pub async fn create_session(
        &self,
        name: &str,
        language: &str,
        file_name: &str,
        recording: Vec<u8>,
    ) -> Result<Value, SessionError> {
        let file = Part::bytes(recording).file_name(file_name.to_owned());
        let form = Form::new()
            .text("name", name.to_owned())
            .text("language", language.to_owned())
            .part("file", file);

        let reply = self
            .api_call("/Session/Create", ApiRequest::post().multipart(form))
            .await?;
        reply.into_result()
    }

    pub async fn delete_session(&self, id: Uuid) -> Result<(), SessionError> {
        let reply = self
            .api_call(&format!("/Session/Delete/{id}"), ApiRequest::delete())
            .await?;
        reply.into_result().map(|_| ())
    }

    /// `Summary/Get/{session}`: the generated summary, once ready.
    pub async fn summary(&self, session_id: Uuid) -> Result<SessionSummary, SessionError> {
        let reply = self
            .api_call(&format!("/Summary/Get/{session_id}"), ApiRequest::get())
            .await?;
        decode_data(reply)
    }

    pub async fn translations(
        &self,
        session_id: Uuid,
    ) -> Result<Vec<SessionTranslation>, SessionError> {
        let reply = self
            .api_call(
                &format!("/SessionTranslation/GetAll/{session_id}"),
                ApiRequest::get(),
            )
            .await?;
        decode_data(reply)
    }

    pub async fn translation(&self, id: Uuid) -> Result<SessionTranslation, SessionError> {
        let reply = self
            .api_call(&format!("/SessionTranslation/GetById/{id}"), ApiRequest::get())
            .await?;
        decode_data(reply)
    }

    pub async fn create_translation(
        &self,
        session_id: Uuid,
        language: &str,
    ) -> Result<SessionTranslation, SessionError> {
        let reply = self
            .api_call(
                &format!("/SessionTranslation/Create/{session_id}"),
                ApiRequest::post().json(json!({ "language": language })),
            )
            .await?;
        decode_data(reply)
    }
}
