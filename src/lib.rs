#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Switchboard Core
//!
//! A convenience layer for chat-platform bots: routes inbound component
//! (button/select-menu) and modal interactions to registered handlers,
//! paginates lazy content behind navigation buttons, exposes the bot's
//! interaction endpoint as an HTTP application, and reports guild counts
//! to bot-list services.
//!
//! ## Overview
//!
//! Controls and modals carry an opaque *custom identifier* of the shape
//! `match[:metadata]`. The registries map the match portion to an
//! executor, enforce sliding/fixed/never expiry plus use limits, evict
//! expired registrations from a background sweep task, and convert lookup
//! misses into a user-visible ephemeral notice. The metadata portion is
//! round-tripped untouched to the invoked handler's context.
//!
//! The platform client stays outside this crate: events come in as the
//! structs in [`platform`], and responses leave through the
//! [`platform::InteractionTransport`] trait (or, for the HTTP flow, the
//! pending request's response body).
//!
//! ## Module Organization
//!
//! - [`custom_id`] - custom-identifier codec
//! - [`timeout`] - expiry policies
//! - [`executor`] - callback, column and modal executors
//! - [`registry`] - component/modal registries, dispatch and sweeping
//! - [`context`] - per-dispatch contexts and the response protocol
//! - [`pagination`] - pagination engine and navigation components
//! - [`platform`] - event/response data model and the transport seam
//! - [`web`] - axum interaction endpoint
//! - [`resilience`] - retry backoff
//! - [`list_status`] - guild-count reporting to bot-list services
//! - [`links`] - message/invite/webhook link parsing
//! - [`config`] / [`logging`] / [`error`] - ambient concerns
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use switchboard_core::executor::CallbackExecutor;
//! use switchboard_core::registry::{ComponentRegistry, RegisterOptions};
//! use switchboard_core::timeout::Timeout;
//!
//! # async fn example(transport: Arc<dyn switchboard_core::platform::InteractionTransport>) -> anyhow::Result<()> {
//! let registry = ComponentRegistry::new(transport);
//! registry.open();
//!
//! let executor = CallbackExecutor::new("greet", |mut ctx: switchboard_core::context::ComponentContext| async move {
//!     ctx.respond_ephemeral("hello!").await?;
//!     Ok::<(), switchboard_core::error::ExecutorError>(())
//! })?;
//! registry
//!     .register(
//!         Arc::new(executor),
//!         RegisterOptions::new().timeout(Timeout::Sliding(std::time::Duration::from_secs(60))),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod custom_id;
pub mod error;
pub mod executor;
pub mod ids;
pub mod links;
pub mod list_status;
pub mod logging;
pub mod pagination;
pub mod platform;
pub mod registry;
pub mod resilience;
pub mod testing;
pub mod timeout;
pub mod web;

pub use config::SwitchboardConfig;
pub use context::{ComponentContext, ModalContext, ResponseState};
pub use error::{
    ExecutorError, PaginationError, RegistryError, ResponseError, ValidationError,
};
pub use executor::{ActionColumn, CallbackExecutor, ComponentExecutor, Modal, ModalExecutor};
pub use pagination::{ComponentPaginator, Page, PageSource, Paginator};
pub use registry::{ComponentRegistry, DispatchOutcome, ModalRegistry, RegisterOptions};
pub use timeout::Timeout;
