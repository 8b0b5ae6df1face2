//! Interaction endpoint handler and its HTTP error mapping.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::ids::{ApplicationId, ChannelId, GuildId, InteractionId, MessageId, UserId};
use crate::platform::{
    ComponentInteractionEvent, InteractionResponse, ModalInteractionEvent, SubmittedField,
};
use crate::registry::{ComponentRegistry, ModalRegistry};
use crate::web::signature::SignatureVerifier;

const SIGNATURE_HEADER: &str = "x-signature-ed25519";
const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

/// Errors mapped onto HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request signature")]
    Unauthorized,

    #[error("Missing required request signature header(s)")]
    MissingSignatureHeaders,

    #[error("Content-Type must be application/json")]
    UnsupportedContentType,

    #[error("Invalid interaction payload: {0}")]
    BadPayload(String),

    #[error("Request body too large")]
    PayloadTooLarge,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::MissingSignatureHeaders
            | Self::UnsupportedContentType
            | Self::BadPayload(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Shared state behind the interaction endpoint.
pub struct InteractionAppState {
    pub components: ComponentRegistry,
    pub modals: ModalRegistry,
    pub verifier: SignatureVerifier,
    pub max_body_bytes: usize,
}

/// Build the interaction endpoint router.
///
/// The body-size ceiling rejects oversized requests while they stream in,
/// before they are ever fully buffered.
pub fn router(state: InteractionAppState) -> Router {
    let max_body_bytes = state.max_body_bytes;
    Router::new()
        .route("/", post(handle_interaction))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(Arc::new(state))
}

#[derive(Deserialize)]
struct InteractionPayload {
    #[serde(rename = "type")]
    kind: u8,
    id: Option<String>,
    application_id: Option<String>,
    token: Option<String>,
    guild_id: Option<String>,
    channel_id: Option<String>,
    member: Option<MemberPayload>,
    user: Option<UserPayload>,
    message: Option<MessagePayload>,
    data: Option<DataPayload>,
}

#[derive(Deserialize)]
struct UserPayload {
    id: String,
}

#[derive(Deserialize)]
struct MemberPayload {
    user: Option<UserPayload>,
}

#[derive(Deserialize)]
struct MessagePayload {
    id: String,
}

#[derive(Deserialize)]
struct DataPayload {
    custom_id: Option<String>,
    #[serde(default)]
    values: Vec<String>,
    #[serde(default)]
    components: Vec<ModalRowPayload>,
}

#[derive(Deserialize)]
struct ModalRowPayload {
    #[serde(default)]
    components: Vec<ModalFieldPayload>,
}

#[derive(Deserialize)]
struct ModalFieldPayload {
    custom_id: String,
    #[serde(default)]
    value: String,
}

pub(crate) async fn handle_interaction(
    State(state): State<Arc<InteractionAppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<InteractionResponse>, ApiError> {
    // Backstop for callers that bypass the streaming limit layer.
    if body.len() > state.max_body_bytes {
        return Err(ApiError::PayloadTooLarge);
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .eq_ignore_ascii_case("application/json")
    {
        return Err(ApiError::UnsupportedContentType);
    }

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    let timestamp = headers.get(TIMESTAMP_HEADER).map(|value| value.as_bytes());
    let (Some(signature), Some(timestamp)) = (signature, timestamp) else {
        return Err(ApiError::MissingSignatureHeaders);
    };

    if !state.verifier.verify(timestamp, &body, signature) {
        return Err(ApiError::Unauthorized);
    }

    let payload: InteractionPayload = serde_json::from_slice(&body)
        .map_err(|error| ApiError::BadPayload(error.to_string()))?;

    match payload.kind {
        1 => {
            debug!("answering interaction ping");
            Ok(Json(InteractionResponse::pong()))
        }
        3 => {
            let event = component_event(payload)?;
            Ok(Json(state.components.dispatch_rest(event).await))
        }
        5 => {
            let event = modal_event(payload)?;
            Ok(Json(state.modals.dispatch_rest(event).await))
        }
        other => Err(ApiError::BadPayload(format!(
            "unsupported interaction type {other}"
        ))),
    }
}

fn parse_snowflake(raw: Option<&str>, field: &str) -> Result<u64, ApiError> {
    raw.and_then(|value| value.parse().ok())
        .ok_or_else(|| ApiError::BadPayload(format!("missing or malformed {field}")))
}

fn author_id(payload: &InteractionPayload) -> Result<UserId, ApiError> {
    let raw = payload
        .member
        .as_ref()
        .and_then(|member| member.user.as_ref())
        .or(payload.user.as_ref())
        .map(|user| user.id.as_str());
    parse_snowflake(raw, "author id").map(UserId)
}

fn component_event(payload: InteractionPayload) -> Result<ComponentInteractionEvent, ApiError> {
    let author_id = author_id(&payload)?;
    let data = payload
        .data
        .ok_or_else(|| ApiError::BadPayload("missing interaction data".into()))?;
    let custom_id = data
        .custom_id
        .ok_or_else(|| ApiError::BadPayload("missing custom_id".into()))?;

    Ok(ComponentInteractionEvent {
        interaction_id: InteractionId(parse_snowflake(payload.id.as_deref(), "interaction id")?),
        application_id: ApplicationId(parse_snowflake(
            payload.application_id.as_deref(),
            "application id",
        )?),
        token: payload
            .token
            .ok_or_else(|| ApiError::BadPayload("missing token".into()))?,
        custom_id,
        message_id: payload
            .message
            .map(|message| parse_snowflake(Some(message.id.as_str()), "message id").map(MessageId))
            .transpose()?,
        channel_id: payload
            .channel_id
            .as_deref()
            .and_then(|raw| raw.parse().ok())
            .map(ChannelId),
        guild_id: payload
            .guild_id
            .as_deref()
            .and_then(|raw| raw.parse().ok())
            .map(GuildId),
        author_id,
        values: data.values,
    })
}

fn modal_event(payload: InteractionPayload) -> Result<ModalInteractionEvent, ApiError> {
    let author_id = author_id(&payload)?;
    let data = payload
        .data
        .ok_or_else(|| ApiError::BadPayload("missing interaction data".into()))?;
    let custom_id = data
        .custom_id
        .ok_or_else(|| ApiError::BadPayload("missing custom_id".into()))?;

    let fields = data
        .components
        .into_iter()
        .flat_map(|row| row.components)
        .map(|field| SubmittedField {
            custom_id: field.custom_id,
            value: field.value,
        })
        .collect();

    Ok(ModalInteractionEvent {
        interaction_id: InteractionId(parse_snowflake(payload.id.as_deref(), "interaction id")?),
        application_id: ApplicationId(parse_snowflake(
            payload.application_id.as_deref(),
            "application id",
        )?),
        token: payload
            .token
            .ok_or_else(|| ApiError::BadPayload("missing token".into()))?,
        custom_id,
        message_id: payload
            .message
            .map(|message| parse_snowflake(Some(message.id.as_str()), "message id").map(MessageId))
            .transpose()?,
        channel_id: payload
            .channel_id
            .as_deref()
            .and_then(|raw| raw.parse().ok())
            .map(ChannelId),
        guild_id: payload
            .guild_id
            .as_deref()
            .and_then(|raw| raw.parse().ok())
            .map(GuildId),
        author_id,
        fields,
    })
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::{Signer, SigningKey};

    use super::*;
    use crate::context::ComponentContext;
    use crate::error::ExecutorError;
    use crate::executor::CallbackExecutor;
    use crate::platform::ResponseKind;
    use crate::registry::RegisterOptions;
    use crate::testing::RecordingTransport;

    struct Harness {
        signing: SigningKey,
        state: Arc<InteractionAppState>,
    }

    impl Harness {
        fn new() -> Self {
            let signing = SigningKey::from_bytes(&[9u8; 32]);
            let verifier =
                SignatureVerifier::from_hex(&hex::encode(signing.verifying_key().to_bytes()))
                    .unwrap();
            let transport = Arc::new(RecordingTransport::default());
            let state = Arc::new(InteractionAppState {
                components: ComponentRegistry::new(transport.clone()),
                modals: ModalRegistry::new(transport),
                verifier,
                max_body_bytes: 4096,
            });
            Self { signing, state }
        }

        fn headers(&self, body: &[u8]) -> HeaderMap {
            let timestamp = b"1700000000";
            let mut message = timestamp.to_vec();
            message.extend_from_slice(body);
            let signature = hex::encode(self.signing.sign(&message).to_bytes());

            let mut headers = HeaderMap::new();
            headers.insert(CONTENT_TYPE, "application/json".parse().unwrap());
            headers.insert(SIGNATURE_HEADER, signature.parse().unwrap());
            headers.insert(TIMESTAMP_HEADER, "1700000000".parse().unwrap());
            headers
        }

        async fn call(
            &self,
            headers: HeaderMap,
            body: &[u8],
        ) -> Result<Json<InteractionResponse>, ApiError> {
            handle_interaction(
                State(self.state.clone()),
                headers,
                Bytes::copy_from_slice(body),
            )
            .await
        }
    }

    #[tokio::test]
    async fn test_ping_pong() {
        let harness = Harness::new();
        let body = br#"{"type":1}"#;
        let Json(response) = harness.call(harness.headers(body), body).await.unwrap();
        assert_eq!(response.kind, ResponseKind::Pong);
    }

    #[tokio::test]
    async fn test_missing_signature_headers_rejected() {
        let harness = Harness::new();
        let body = br#"{"type":1}"#;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "application/json".parse().unwrap());

        let error = harness.call(headers, body).await.unwrap_err();
        assert!(matches!(error, ApiError::MissingSignatureHeaders));
    }

    #[tokio::test]
    async fn test_bad_signature_is_unauthorized() {
        let harness = Harness::new();
        let body = br#"{"type":1}"#;
        let mut headers = harness.headers(body);
        headers.insert(TIMESTAMP_HEADER, "1700000001".parse().unwrap());

        let error = harness.call(headers, body).await.unwrap_err();
        assert!(matches!(error, ApiError::Unauthorized));
        assert_eq!(
            error.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_wrong_content_type_rejected() {
        let harness = Harness::new();
        let body = br#"{"type":1}"#;
        let mut headers = harness.headers(body);
        headers.insert(CONTENT_TYPE, "text/plain".parse().unwrap());

        let error = harness.call(headers, body).await.unwrap_err();
        assert!(matches!(error, ApiError::UnsupportedContentType));
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let harness = Harness::new();
        let body = vec![b' '; 5000];
        let error = harness.call(harness.headers(&body), &body).await.unwrap_err();
        assert!(matches!(error, ApiError::PayloadTooLarge));
        assert_eq!(
            error.into_response().status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[tokio::test]
    async fn test_component_payload_dispatches_and_returns_response() {
        let harness = Harness::new();
        harness
            .state
            .components
            .register(
                Arc::new(
                    CallbackExecutor::new("hello", |mut ctx: ComponentContext| async move {
                        let metadata = ctx.id_metadata().unwrap_or_default().to_owned();
                        ctx.create_initial_response(
                            ResponseKind::MessageUpdate,
                            crate::platform::ResponseData::new().content(format!("hi {metadata}")),
                        )
                        .await?;
                        Ok::<(), ExecutorError>(())
                    })
                    .unwrap(),
                ),
                RegisterOptions::new(),
            )
            .await
            .unwrap();

        let body = serde_json::to_vec(&json!({
            "type": 3,
            "id": "11",
            "application_id": "22",
            "token": "tok",
            "member": { "user": { "id": "42" } },
            "message": { "id": "33" },
            "data": { "custom_id": "hello:world", "values": [] },
        }))
        .unwrap();

        let Json(response) = harness.call(harness.headers(&body), &body).await.unwrap();
        assert_eq!(response.kind, ResponseKind::MessageUpdate);
        assert_eq!(
            response.data.unwrap().content.as_deref(),
            Some("hi world")
        );
    }

    #[tokio::test]
    async fn test_unknown_component_returns_expired_notice() {
        let harness = Harness::new();
        let body = serde_json::to_vec(&json!({
            "type": 3,
            "id": "11",
            "application_id": "22",
            "token": "tok",
            "user": { "id": "42" },
            "data": { "custom_id": "ghost" },
        }))
        .unwrap();

        let Json(response) = harness.call(harness.headers(&body), &body).await.unwrap();
        assert_eq!(response.kind, ResponseKind::MessageCreate);
        assert_eq!(
            response.data.unwrap().content.as_deref(),
            Some("This is no longer available.")
        );
    }

    #[tokio::test]
    async fn test_modal_rows_flatten_into_fields() {
        let payload: InteractionPayload = serde_json::from_value(json!({
            "type": 5,
            "id": "1",
            "application_id": "2",
            "token": "tok",
            "user": { "id": "3" },
            "data": {
                "custom_id": "report",
                "components": [
                    { "components": [{ "custom_id": "reason", "value": "spam" }] },
                    { "components": [{ "custom_id": "details", "value": "lots" }] },
                ],
            },
        }))
        .unwrap();

        let event = modal_event(payload).unwrap();
        assert_eq!(event.fields.len(), 2);
        assert_eq!(event.fields[0].custom_id, "reason");
        assert_eq!(event.fields[1].value, "lots");
    }

    #[tokio::test]
    async fn test_unsupported_interaction_type_rejected() {
        let harness = Harness::new();
        let body = br#"{"type":2}"#;
        let error = harness.call(harness.headers(body), body).await.unwrap_err();
        assert!(matches!(error, ApiError::BadPayload(_)));
    }
}
