//! # Platform Boundary
//!
//! The chat-platform client is an external collaborator: this module pins
//! down the shapes the library needs from it and nothing more. Inbound
//! interaction events, outbound response payloads, the rendered component
//! tree and the [`InteractionTransport`] trait the contexts talk through
//! all live here; the concrete gateway/REST client is supplied by the host.

pub mod components;
pub mod events;
pub mod responses;
pub mod transport;

pub use components::{
    ActionRow, Button, ButtonStyle, Component, ComponentType, FieldStyle, SelectMenu, SelectOption,
    TextInput,
};
pub use events::{ComponentInteractionEvent, ModalInteractionEvent, SubmittedField};
pub use responses::{InteractionResponse, MessageFlags, ResponseData, ResponseKind};
pub use transport::InteractionTransport;
