//! Single-callback executor: one match key, one handler.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::ComponentContext;
use crate::custom_id;
use crate::error::{ExecutorError, ValidationError};
use crate::executor::{ComponentCallback, ComponentExecutor};

/// The simplest executor: routes every dispatch for its match key to a
/// single callback.
pub struct CallbackExecutor {
    custom_id: String,
    callback: Arc<dyn ComponentCallback>,
}

impl CallbackExecutor {
    /// Build an executor answering to `custom_id`.
    ///
    /// Use a fixed string here when the registration must be resolvable
    /// after a process restart.
    pub fn new(
        custom_id: impl Into<String>,
        callback: impl ComponentCallback + 'static,
    ) -> Result<Self, ValidationError> {
        let custom_id = custom_id.into();
        custom_id::validate_match(&custom_id)?;
        Ok(Self {
            custom_id,
            callback: Arc::new(callback),
        })
    }

    /// Build an executor with a generated per-process match key.
    pub fn generated(callback: impl ComponentCallback + 'static) -> Self {
        Self {
            custom_id: custom_id::generate(),
            callback: Arc::new(callback),
        }
    }

    pub fn custom_id(&self) -> &str {
        &self.custom_id
    }
}

#[async_trait]
impl ComponentExecutor for CallbackExecutor {
    fn custom_ids(&self) -> Vec<String> {
        vec![self.custom_id.clone()]
    }

    async fn execute(&self, ctx: ComponentContext) -> Result<(), ExecutorError> {
        self.callback.call(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn noop(_ctx: ComponentContext) -> Result<(), ExecutorError> {
        Ok(())
    }

    #[test]
    fn test_rejects_invalid_match() {
        assert!(CallbackExecutor::new("a:b", noop).is_err());
        assert!(CallbackExecutor::new("", noop).is_err());
    }

    #[test]
    fn test_generated_ids_differ() {
        let first = CallbackExecutor::generated(noop);
        let second = CallbackExecutor::generated(noop);
        assert_ne!(first.custom_ids(), second.custom_ids());
    }
}
