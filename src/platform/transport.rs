//! Transport seam through which contexts talk to the platform's REST API.

use async_trait::async_trait;

use crate::ids::{ApplicationId, InteractionId, MessageId};
use crate::platform::responses::{InteractionResponse, ResponseData};

/// The response-emitting surface the platform client must supply.
///
/// Implementations wrap the host's concrete REST client. All calls are
/// scoped by the interaction token handed out with each event; the library
/// never needs broader API access than this.
#[async_trait]
pub trait InteractionTransport: Send + Sync {
    /// Create the initial response for an interaction.
    async fn create_response(
        &self,
        interaction_id: InteractionId,
        token: &str,
        response: InteractionResponse,
    ) -> anyhow::Result<()>;

    /// Edit the initial response (also used to finalise a deferral).
    async fn edit_response(
        &self,
        application_id: ApplicationId,
        token: &str,
        data: ResponseData,
    ) -> anyhow::Result<()>;

    /// Delete the initial response.
    async fn delete_response(&self, application_id: ApplicationId, token: &str)
        -> anyhow::Result<()>;

    /// Create a follow-up message after the initial response.
    async fn create_followup(
        &self,
        application_id: ApplicationId,
        token: &str,
        data: ResponseData,
    ) -> anyhow::Result<MessageId>;
}
