//! # Interaction Contexts
//!
//! Per-dispatch wrappers around an inbound interaction event. A context is
//! exclusively owned by the single in-flight invocation and tracks the
//! response protocol state so that invalid call sequences fail fast locally
//! instead of being bounced by the platform: one initial response per
//! interaction, and a deferred interaction is finalised by an edit, never a
//! second create.
//!
//! In the gateway flow responses go out through the
//! [`InteractionTransport`]; in the REST (HTTP endpoint) flow the first
//! response is instead resolved into the pending HTTP request via a oneshot
//! channel and any follow-up calls fall back to the transport.

use std::sync::Arc;

use tokio::sync::oneshot;

use crate::error::ResponseError;
use crate::ids::{ChannelId, GuildId, MessageId, UserId};
use crate::platform::{
    ActionRow, ComponentInteractionEvent, InteractionResponse, InteractionTransport, MessageFlags,
    ModalInteractionEvent, ResponseData, ResponseKind,
};

/// Progress of the response protocol for one interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseState {
    /// Nothing has been sent yet.
    None,
    /// A deferred message-create acknowledgement has been issued.
    Deferred,
    /// A deferred message-update acknowledgement has been issued.
    DeferredUpdate,
    /// An initial message has been created.
    Created,
    /// The source message has been updated as the initial response.
    MessageUpdated,
}

/// Shared response-emitting half of both context types.
pub(crate) struct Responder {
    transport: Option<Arc<dyn InteractionTransport>>,
    response_tx: Option<oneshot::Sender<InteractionResponse>>,
    state: ResponseState,
    interaction_id: crate::ids::InteractionId,
    application_id: crate::ids::ApplicationId,
    token: String,
    ephemeral_default: bool,
}

impl Responder {
    pub(crate) fn new(
        transport: Option<Arc<dyn InteractionTransport>>,
        response_tx: Option<oneshot::Sender<InteractionResponse>>,
        interaction_id: crate::ids::InteractionId,
        application_id: crate::ids::ApplicationId,
        token: String,
    ) -> Self {
        Self {
            transport,
            response_tx,
            state: ResponseState::None,
            interaction_id,
            application_id,
            token,
            ephemeral_default: false,
        }
    }

    fn transport(&self) -> Result<&Arc<dyn InteractionTransport>, ResponseError> {
        self.transport
            .as_ref()
            .ok_or_else(|| ResponseError::Platform(anyhow::anyhow!("no transport available")))
    }

    /// Emit the very first payload, preferring the pending HTTP response.
    async fn send_first(&mut self, response: InteractionResponse) -> Result<(), ResponseError> {
        if let Some(tx) = self.response_tx.take() {
            // The HTTP request may have been abandoned; the state transition
            // still happened from the executor's point of view.
            let _ = tx.send(response);
            return Ok(());
        }

        self.transport()?
            .create_response(self.interaction_id, &self.token, response)
            .await
            .map_err(ResponseError::Platform)
    }

    fn apply_ephemeral_default(&self, kind: ResponseKind, data: &mut ResponseData) {
        if self.ephemeral_default && kind == ResponseKind::MessageCreate && data.flags.is_none() {
            data.flags = Some(MessageFlags::EPHEMERAL);
        }
    }

    pub(crate) async fn create_initial_response(
        &mut self,
        kind: ResponseKind,
        data: Option<ResponseData>,
    ) -> Result<(), ResponseError> {
        debug_assert!(matches!(
            kind,
            ResponseKind::MessageCreate | ResponseKind::MessageUpdate
        ));

        if self.state != ResponseState::None {
            return Err(ResponseError::AlreadyResponded);
        }

        let data = data.map(|mut data| {
            self.apply_ephemeral_default(kind, &mut data);
            data
        });

        self.send_first(InteractionResponse::new(kind, data)).await?;
        self.state = match kind {
            ResponseKind::MessageUpdate => ResponseState::MessageUpdated,
            _ => ResponseState::Created,
        };
        Ok(())
    }

    pub(crate) async fn defer(&mut self, kind: ResponseKind) -> Result<(), ResponseError> {
        debug_assert!(matches!(
            kind,
            ResponseKind::DeferredMessageCreate | ResponseKind::DeferredMessageUpdate
        ));

        if self.state != ResponseState::None {
            return Err(ResponseError::AlreadyResponded);
        }

        self.send_first(InteractionResponse::new(kind, None)).await?;
        self.state = match kind {
            ResponseKind::DeferredMessageUpdate => ResponseState::DeferredUpdate,
            _ => ResponseState::Deferred,
        };
        Ok(())
    }

    pub(crate) async fn create_modal_response(
        &mut self,
        custom_id: String,
        title: String,
        components: Vec<ActionRow>,
    ) -> Result<(), ResponseError> {
        if self.state != ResponseState::None {
            return Err(ResponseError::AlreadyResponded);
        }

        let data = ResponseData {
            custom_id: Some(custom_id),
            title: Some(title),
            components,
            ..ResponseData::default()
        };
        self.send_first(InteractionResponse::new(ResponseKind::Modal, Some(data)))
            .await?;
        // A modal counts as the initial response for this interaction.
        self.state = ResponseState::Created;
        Ok(())
    }

    pub(crate) async fn edit_initial_response(
        &mut self,
        data: ResponseData,
    ) -> Result<(), ResponseError> {
        match self.state {
            ResponseState::None => return Err(ResponseError::NotResponded),
            ResponseState::Deferred => self.state = ResponseState::Created,
            ResponseState::DeferredUpdate => self.state = ResponseState::MessageUpdated,
            ResponseState::Created | ResponseState::MessageUpdated => {}
        }

        self.transport()?
            .edit_response(self.application_id, &self.token, data)
            .await
            .map_err(ResponseError::Platform)
    }

    pub(crate) async fn delete_initial_response(&mut self) -> Result<(), ResponseError> {
        if self.state == ResponseState::None {
            return Err(ResponseError::NotResponded);
        }

        self.transport()?
            .delete_response(self.application_id, &self.token)
            .await
            .map_err(ResponseError::Platform)
    }

    pub(crate) async fn create_followup(
        &mut self,
        data: ResponseData,
    ) -> Result<MessageId, ResponseError> {
        if !matches!(
            self.state,
            ResponseState::Created | ResponseState::MessageUpdated
        ) {
            return Err(ResponseError::NotResponded);
        }

        self.transport()?
            .create_followup(self.application_id, &self.token, data)
            .await
            .map_err(ResponseError::Platform)
    }
}

macro_rules! responder_methods {
    () => {
        /// Current progress of the response protocol.
        pub fn response_state(&self) -> ResponseState {
            self.responder.state
        }

        /// Default message-create responses to ephemeral.
        pub fn set_ephemeral_default(&mut self, state: bool) -> &mut Self {
            self.responder.ephemeral_default = state;
            self
        }

        /// Create the initial response.
        ///
        /// `kind` must be [`ResponseKind::MessageCreate`] or
        /// [`ResponseKind::MessageUpdate`]. Fails fast with
        /// [`ResponseError::AlreadyResponded`] once any initial response or
        /// deferral has been issued.
        pub async fn create_initial_response(
            &mut self,
            kind: ResponseKind,
            data: ResponseData,
        ) -> Result<(), ResponseError> {
            self.responder.create_initial_response(kind, Some(data)).await
        }

        /// Acknowledge the interaction without changing the message.
        pub async fn acknowledge_update(&mut self) -> Result<(), ResponseError> {
            self.responder
                .create_initial_response(ResponseKind::MessageUpdate, None)
                .await
        }

        /// Defer the initial response.
        ///
        /// `kind` must be [`ResponseKind::DeferredMessageCreate`] or
        /// [`ResponseKind::DeferredMessageUpdate`].
        pub async fn defer(&mut self, kind: ResponseKind) -> Result<(), ResponseError> {
            self.responder.defer(kind).await
        }

        /// Edit the initial response; also finalises a deferral.
        pub async fn edit_initial_response(
            &mut self,
            data: ResponseData,
        ) -> Result<(), ResponseError> {
            self.responder.edit_initial_response(data).await
        }

        /// Delete the initial response.
        pub async fn delete_initial_response(&mut self) -> Result<(), ResponseError> {
            self.responder.delete_initial_response().await
        }

        /// Create a follow-up message after the initial response.
        pub async fn create_followup(
            &mut self,
            data: ResponseData,
        ) -> Result<MessageId, ResponseError> {
            self.responder.create_followup(data).await
        }

        /// Respond with an ephemeral notice message.
        pub async fn respond_ephemeral(
            &mut self,
            content: impl Into<String>,
        ) -> Result<(), ResponseError> {
            self.responder
                .create_initial_response(
                    ResponseKind::MessageCreate,
                    Some(ResponseData::new().content(content).ephemeral()),
                )
                .await
        }
    };
}

/// Context passed to component executors for one dispatch.
pub struct ComponentContext {
    event: ComponentInteractionEvent,
    id_match: String,
    id_metadata: Option<String>,
    pub(crate) responder: Responder,
}

impl ComponentContext {
    pub(crate) fn new(
        event: ComponentInteractionEvent,
        id_match: String,
        id_metadata: Option<String>,
        responder: Responder,
    ) -> Self {
        Self {
            event,
            id_match,
            id_metadata,
            responder,
        }
    }

    /// The raw interaction event.
    pub fn event(&self) -> &ComponentInteractionEvent {
        &self.event
    }

    /// Match portion of the custom ID used to resolve this executor.
    pub fn id_match(&self) -> &str {
        &self.id_match
    }

    /// Metadata portion of the custom ID, round-tripped untouched.
    pub fn id_metadata(&self) -> Option<&str> {
        self.id_metadata.as_deref()
    }

    pub fn author_id(&self) -> UserId {
        self.event.author_id
    }

    pub fn guild_id(&self) -> Option<GuildId> {
        self.event.guild_id
    }

    pub fn channel_id(&self) -> Option<ChannelId> {
        self.event.channel_id
    }

    pub fn message_id(&self) -> Option<MessageId> {
        self.event.message_id
    }

    /// Selected option values for menu components; empty for buttons.
    pub fn selected_values(&self) -> &[String] {
        &self.event.values
    }

    /// Open a modal as the initial response.
    pub async fn create_modal_response(
        &mut self,
        custom_id: impl Into<String>,
        title: impl Into<String>,
        components: Vec<ActionRow>,
    ) -> Result<(), ResponseError> {
        self.responder
            .create_modal_response(custom_id.into(), title.into(), components)
            .await
    }

    responder_methods!();
}

/// Context passed to modal executors for one submission.
pub struct ModalContext {
    event: ModalInteractionEvent,
    id_match: String,
    id_metadata: Option<String>,
    pub(crate) responder: Responder,
}

impl ModalContext {
    pub(crate) fn new(
        event: ModalInteractionEvent,
        id_match: String,
        id_metadata: Option<String>,
        responder: Responder,
    ) -> Self {
        Self {
            event,
            id_match,
            id_metadata,
            responder,
        }
    }

    pub fn event(&self) -> &ModalInteractionEvent {
        &self.event
    }

    pub fn id_match(&self) -> &str {
        &self.id_match
    }

    pub fn id_metadata(&self) -> Option<&str> {
        self.id_metadata.as_deref()
    }

    pub fn author_id(&self) -> UserId {
        self.event.author_id
    }

    pub fn guild_id(&self) -> Option<GuildId> {
        self.event.guild_id
    }

    pub fn message_id(&self) -> Option<MessageId> {
        self.event.message_id
    }

    /// Value of a submitted field, by its declared identifier.
    pub fn field(&self, custom_id: &str) -> Option<&str> {
        self.event
            .fields
            .iter()
            .find(|field| field.custom_id == custom_id)
            .map(|field| field.value.as_str())
    }

    responder_methods!();
}
