//! Test doubles for the platform boundary.
//!
//! [`RecordingTransport`] captures every response call instead of talking
//! to a real platform, for use in this crate's tests and downstream ones.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::ids::{ApplicationId, InteractionId, MessageId};
use crate::platform::{InteractionResponse, InteractionTransport, ResponseData};

/// An [`InteractionTransport`] that records calls in memory.
#[derive(Default)]
pub struct RecordingTransport {
    created: Mutex<Vec<InteractionResponse>>,
    edited: Mutex<Vec<ResponseData>>,
    deleted: Mutex<usize>,
    followups: Mutex<Vec<ResponseData>>,
}

impl RecordingTransport {
    /// Initial responses created so far.
    pub fn created(&self) -> Vec<InteractionResponse> {
        self.created.lock().unwrap().clone()
    }

    /// Edits issued so far.
    pub fn edited(&self) -> Vec<ResponseData> {
        self.edited.lock().unwrap().clone()
    }

    /// Number of initial-response deletions.
    pub fn deleted(&self) -> usize {
        *self.deleted.lock().unwrap()
    }

    /// Follow-up messages created so far.
    pub fn followups(&self) -> Vec<ResponseData> {
        self.followups.lock().unwrap().clone()
    }

    /// Content of the last created initial response, if any.
    pub fn last_created_content(&self) -> Option<String> {
        self.created
            .lock()
            .unwrap()
            .last()
            .and_then(|response| response.data.as_ref())
            .and_then(|data| data.content.clone())
    }
}

#[async_trait]
impl InteractionTransport for RecordingTransport {
    async fn create_response(
        &self,
        _interaction_id: InteractionId,
        _token: &str,
        response: InteractionResponse,
    ) -> anyhow::Result<()> {
        self.created.lock().unwrap().push(response);
        Ok(())
    }

    async fn edit_response(
        &self,
        _application_id: ApplicationId,
        _token: &str,
        data: ResponseData,
    ) -> anyhow::Result<()> {
        self.edited.lock().unwrap().push(data);
        Ok(())
    }

    async fn delete_response(
        &self,
        _application_id: ApplicationId,
        _token: &str,
    ) -> anyhow::Result<()> {
        *self.deleted.lock().unwrap() += 1;
        Ok(())
    }

    async fn create_followup(
        &self,
        _application_id: ApplicationId,
        _token: &str,
        data: ResponseData,
    ) -> anyhow::Result<MessageId> {
        let mut followups = self.followups.lock().unwrap();
        followups.push(data);
        Ok(MessageId(followups.len() as u64))
    }
}
