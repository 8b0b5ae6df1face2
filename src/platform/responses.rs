//! Outbound interaction response payloads.

use serde::{Serialize, Serializer};

use crate::platform::components::ActionRow;

/// Numeric response type understood by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    /// Acknowledgement of a ping from the HTTP boundary.
    Pong = 1,
    /// Create a new message as the initial response.
    MessageCreate = 4,
    /// Acknowledge now, send the message later via an edit.
    DeferredMessageCreate = 5,
    /// Acknowledge now, update the source message later via an edit.
    DeferredMessageUpdate = 6,
    /// Update the message the interacted control lives on.
    MessageUpdate = 7,
    /// Open a modal form.
    Modal = 9,
}

impl Serialize for ResponseKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

/// Message flags attached to a response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MessageFlags(pub u64);

impl MessageFlags {
    /// Response only visible to the triggering user.
    pub const EPHEMERAL: Self = Self(1 << 6);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for MessageFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Body of an interaction response.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResponseData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ActionRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<MessageFlags>,
    /// Only set for [`ResponseKind::Modal`] responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
    /// Only set for [`ResponseKind::Modal`] responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ResponseData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn embed(mut self, embed: serde_json::Value) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn components(mut self, components: Vec<ActionRow>) -> Self {
        self.components = components;
        self
    }

    pub fn ephemeral(mut self) -> Self {
        self.flags = Some(self.flags.unwrap_or_default() | MessageFlags::EPHEMERAL);
        self
    }
}

/// A complete interaction response: the kind plus an optional body.
#[derive(Debug, Clone, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: ResponseKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl InteractionResponse {
    pub fn new(kind: ResponseKind, data: Option<ResponseData>) -> Self {
        Self { kind, data }
    }

    pub fn pong() -> Self {
        Self::new(ResponseKind::Pong, None)
    }

    /// The standard user-visible reply for an expired or unknown custom ID.
    pub fn expired_notice() -> Self {
        Self::new(
            ResponseKind::MessageCreate,
            Some(
                ResponseData::new()
                    .content("This is no longer available.")
                    .ephemeral(),
            ),
        )
    }
}
