//! # Executor Abstraction
//!
//! Executors are the polymorphic handler units a registry dispatches to.
//! Three variants exist: a single-callback executor
//! ([`CallbackExecutor`](callback::CallbackExecutor)), a multi-control
//! column ([`ActionColumn`](column::ActionColumn)) and a declarative modal
//! ([`Modal`](modal::Modal)). Each declares the custom-ID match keys it
//! answers to; the registry indexes every declared key to the same
//! registration.
//!
//! Executors are shared by reference (`Arc`) between the registry and the
//! caller that built them; an executor can request its own deregistration
//! by returning [`ExecutorError::Closed`] from `execute`.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::context::{ComponentContext, ModalContext};
use crate::error::ExecutorError;
use crate::platform::ActionRow;

pub mod callback;
pub mod column;
pub mod modal;

pub use callback::CallbackExecutor;
pub use column::{ActionColumn, ColumnTemplate, ControlKind, ControlLabel};
pub use modal::{Modal, ModalTemplate, TextField};

/// Boxed future returned by interaction callbacks.
pub type CallbackFuture = Pin<Box<dyn Future<Output = Result<(), ExecutorError>> + Send>>;

/// A component callback: an async function consuming a component context.
///
/// Blanket-implemented for async closures, so
/// `|mut ctx: ComponentContext| async move { ... }` works directly.
pub trait ComponentCallback: Send + Sync {
    fn call(&self, ctx: ComponentContext) -> CallbackFuture;
}

impl<F, Fut> ComponentCallback for F
where
    F: Fn(ComponentContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), ExecutorError>> + Send + 'static,
{
    fn call(&self, ctx: ComponentContext) -> CallbackFuture {
        Box::pin((self)(ctx))
    }
}

/// A modal callback: an async function consuming a modal context.
pub trait ModalCallback: Send + Sync {
    fn call(&self, ctx: ModalContext) -> CallbackFuture;
}

impl<F, Fut> ModalCallback for F
where
    F: Fn(ModalContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), ExecutorError>> + Send + 'static,
{
    fn call(&self, ctx: ModalContext) -> CallbackFuture {
        Box::pin((self)(ctx))
    }
}

/// A handler unit dispatchable from a component registry.
#[async_trait]
pub trait ComponentExecutor: Send + Sync {
    /// The custom-ID match keys this executor answers to.
    fn custom_ids(&self) -> Vec<String>;

    /// Handle one interaction.
    async fn execute(&self, ctx: ComponentContext) -> Result<(), ExecutorError>;

    /// The renderable control set for this executor, if it has one.
    fn rows(&self) -> Vec<ActionRow> {
        Vec::new()
    }
}

/// A handler unit dispatchable from a modal registry.
#[async_trait]
pub trait ModalExecutor: Send + Sync {
    /// The custom-ID match keys this executor answers to.
    fn custom_ids(&self) -> Vec<String>;

    /// Handle one modal submission.
    async fn execute(&self, ctx: ModalContext) -> Result<(), ExecutorError>;

    /// The renderable field rows for this executor, if it has any.
    fn rows(&self) -> Vec<ActionRow> {
        Vec::new()
    }
}
