//! Inbound interaction event shapes delivered by the platform client.

use serde::{Deserialize, Serialize};

use crate::ids::{ApplicationId, ChannelId, GuildId, InteractionId, MessageId, UserId};

/// A component (button press / menu selection) interaction event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentInteractionEvent {
    pub interaction_id: InteractionId,
    pub application_id: ApplicationId,
    /// Token used to respond to this interaction.
    pub token: String,
    /// The full custom identifier attached to the pressed control.
    pub custom_id: String,
    /// The message the control lives on, when the platform supplies it.
    pub message_id: Option<MessageId>,
    pub channel_id: Option<ChannelId>,
    pub guild_id: Option<GuildId>,
    pub author_id: UserId,
    /// Selected option values for menu components; empty for buttons.
    #[serde(default)]
    pub values: Vec<String>,
}

/// A single submitted modal field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedField {
    pub custom_id: String,
    pub value: String,
}

/// A modal submission interaction event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModalInteractionEvent {
    pub interaction_id: InteractionId,
    pub application_id: ApplicationId,
    pub token: String,
    /// The custom identifier the modal was opened with.
    pub custom_id: String,
    /// The message the modal was opened from, if any.
    pub message_id: Option<MessageId>,
    pub channel_id: Option<ChannelId>,
    pub guild_id: Option<GuildId>,
    pub author_id: UserId,
    /// Submitted field values in declaration order.
    #[serde(default)]
    pub fields: Vec<SubmittedField>,
}
