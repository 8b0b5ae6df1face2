//! Navigation-button executor driving a [`Paginator`].

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::ComponentContext;
use crate::custom_id;
use crate::error::{ExecutorError, PaginationError};
use crate::executor::ComponentExecutor;
use crate::ids::UserId;
use crate::pagination::{
    Page, PageSource, Paginator, BLACK_CROSS, LEFT_DOUBLE_TRIANGLE, LEFT_TRIANGLE,
    RIGHT_DOUBLE_TRIANGLE, RIGHT_TRIANGLE, STOP_SQUARE,
};
use crate::platform::{ActionRow, Button, ButtonStyle, Component, ResponseKind};

/// One navigation trigger of a paginated message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationAction {
    First,
    Previous,
    Stop,
    Next,
    Last,
}

impl NavigationAction {
    /// Every trigger, in rendering order.
    pub const ALL: [Self; 5] = [Self::First, Self::Previous, Self::Stop, Self::Next, Self::Last];

    /// The default enabled trigger set.
    pub const DEFAULT: [Self; 3] = [Self::Previous, Self::Stop, Self::Next];

    /// The emoji conventionally shown for this trigger.
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::First => LEFT_DOUBLE_TRIANGLE,
            Self::Previous => LEFT_TRIANGLE,
            Self::Stop => BLACK_CROSS,
            Self::Next => RIGHT_TRIANGLE,
            Self::Last => RIGHT_DOUBLE_TRIANGLE,
        }
    }

    /// Map a reaction emoji onto its trigger, for reaction-driven callers.
    pub fn from_emoji(emoji: &str) -> Option<Self> {
        match emoji {
            LEFT_DOUBLE_TRIANGLE => Some(Self::First),
            LEFT_TRIANGLE => Some(Self::Previous),
            STOP_SQUARE | BLACK_CROSS => Some(Self::Stop),
            RIGHT_TRIANGLE => Some(Self::Next),
            RIGHT_DOUBLE_TRIANGLE => Some(Self::Last),
            _ => None,
        }
    }
}

struct NavButton {
    action: NavigationAction,
    custom_id: String,
}

/// Component executor paginating a lazy page source.
///
/// Renders one row of navigation buttons (only the enabled triggers) and
/// maps presses onto the engine. Boundary presses acknowledge without
/// re-sending content; "stop" deletes the message and closes the executor.
pub struct ComponentPaginator {
    paginator: Paginator,
    buttons: Vec<NavButton>,
    authors: Option<HashSet<UserId>>,
}

impl ComponentPaginator {
    /// Paginator with the default {previous, stop, next} triggers.
    pub fn new(source: PageSource) -> Self {
        Self::with_triggers(source, &NavigationAction::DEFAULT)
    }

    /// Paginator with an explicit trigger set, rendered in the given order.
    pub fn with_triggers(source: PageSource, triggers: &[NavigationAction]) -> Self {
        let buttons = triggers
            .iter()
            .map(|&action| NavButton {
                action,
                custom_id: custom_id::generate(),
            })
            .collect();
        Self {
            paginator: Paginator::new(source),
            buttons,
            authors: None,
        }
    }

    /// Restrict the paginator to the given users; anyone else gets an
    /// ephemeral refusal.
    pub fn authors(mut self, authors: impl IntoIterator<Item = UserId>) -> Self {
        self.authors = Some(authors.into_iter().collect());
        self
    }

    /// Pull the next page, typically to build the message the paginator
    /// is first attached to.
    pub async fn get_next_entry(&self) -> Option<Page> {
        self.paginator.get_next_entry().await
    }

    /// The underlying pagination engine.
    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    #[cfg(test)]
    pub(crate) fn custom_id_for(&self, action: NavigationAction) -> Option<&str> {
        self.buttons
            .iter()
            .find(|button| button.action == action)
            .map(|button| button.custom_id.as_str())
    }

    async fn respond_with_page(
        &self,
        ctx: &mut ComponentContext,
        page: Option<Page>,
    ) -> Result<(), ExecutorError> {
        match page {
            Some(page) => {
                ctx.create_initial_response(ResponseKind::MessageUpdate, page.to_response_data())
                    .await?
            }
            // Boundary press: acknowledge, leave content and controls as-is.
            None => ctx.acknowledge_update().await?,
        }
        Ok(())
    }

    async fn handle(
        &self,
        action: NavigationAction,
        mut ctx: ComponentContext,
    ) -> Result<(), ExecutorError> {
        match action {
            NavigationAction::First => {
                let page = self.paginator.get_first_entry().await;
                self.respond_with_page(&mut ctx, page).await
            }
            NavigationAction::Previous => {
                let page = self.paginator.get_previous_entry().await;
                self.respond_with_page(&mut ctx, page).await
            }
            NavigationAction::Next => {
                let page = self.paginator.get_next_entry().await;
                self.respond_with_page(&mut ctx, page).await
            }
            NavigationAction::Last => match self.paginator.get_last_entry().await {
                Ok(page) => self.respond_with_page(&mut ctx, page).await,
                Err(PaginationError::UnsupportedOperation) => {
                    ctx.respond_ephemeral("Jumping to the last entry isn't supported here.")
                        .await?;
                    Ok(())
                }
            },
            NavigationAction::Stop => {
                self.paginator.close_source().await;
                ctx.defer(ResponseKind::DeferredMessageUpdate).await?;
                ctx.delete_initial_response().await?;
                Err(ExecutorError::Closed)
            }
        }
    }
}

#[async_trait]
impl ComponentExecutor for ComponentPaginator {
    fn custom_ids(&self) -> Vec<String> {
        self.buttons
            .iter()
            .map(|button| button.custom_id.clone())
            .collect()
    }

    async fn execute(&self, mut ctx: ComponentContext) -> Result<(), ExecutorError> {
        if let Some(authors) = &self.authors {
            if !authors.contains(&ctx.author_id()) {
                ctx.respond_ephemeral("You are not allowed to use this component")
                    .await?;
                return Ok(());
            }
        }

        let action = self
            .buttons
            .iter()
            .find(|button| button.custom_id == ctx.id_match())
            .map(|button| button.action);

        match action {
            Some(action) => self.handle(action, ctx).await,
            None => {
                tracing::warn!(id_match = ctx.id_match(), "unknown paginator trigger");
                Ok(())
            }
        }
    }

    fn rows(&self) -> Vec<ActionRow> {
        let components = self
            .buttons
            .iter()
            .map(|button| {
                Component::Button(
                    Button::new(ButtonStyle::Secondary, button.custom_id.clone())
                        .emoji(button.action.emoji().to_owned()),
                )
            })
            .collect();
        vec![ActionRow::new(components)]
    }
}
