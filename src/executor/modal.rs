//! Declarative modal executor: typed input fields plus a submit callback.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::ModalContext;
use crate::custom_id;
use crate::error::{ExecutorError, ValidationError};
use crate::executor::{ModalCallback, ModalExecutor};
use crate::platform::components::MAX_ROWS;
use crate::platform::{ActionRow, Component, FieldStyle, TextInput};

/// Maximum number of input fields a modal may declare.
pub const MAX_FIELDS: usize = MAX_ROWS;

/// Descriptor of one modal text input.
#[derive(Debug, Clone)]
pub struct TextField {
    custom_id: String,
    label: String,
    style: FieldStyle,
    required: bool,
    default: Option<String>,
    placeholder: Option<String>,
}

impl TextField {
    pub fn new(
        custom_id: impl Into<String>,
        label: impl Into<String>,
        style: FieldStyle,
    ) -> Self {
        Self {
            custom_id: custom_id.into(),
            label: label.into(),
            style,
            required: true,
            default: None,
            placeholder: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn custom_id(&self) -> &str {
        &self.custom_id
    }

    fn render(&self) -> TextInput {
        let mut input = TextInput::new(self.custom_id.clone(), self.label.clone(), self.style);
        input.required = self.required;
        input.value = self.default.clone();
        input.placeholder = self.placeholder.clone();
        input
    }
}

fn validate_fields(fields: &[TextField]) -> Result<(), ValidationError> {
    if fields.len() > MAX_FIELDS {
        return Err(ValidationError::TooManyFields {
            max_fields: MAX_FIELDS,
        });
    }

    for (index, field) in fields.iter().enumerate() {
        if fields[..index]
            .iter()
            .any(|other| other.custom_id == field.custom_id)
        {
            return Err(ValidationError::DuplicateId {
                custom_id: field.custom_id.clone(),
            });
        }
    }

    Ok(())
}

/// A modal form: up to five declared fields and a submit callback.
///
/// Submitted values are matched back to the declared fields by custom ID
/// and exposed on the [`ModalContext`].
pub struct Modal {
    custom_id: String,
    title: String,
    fields: Vec<TextField>,
    callback: Arc<dyn ModalCallback>,
}

impl Modal {
    pub fn new(
        custom_id: impl Into<String>,
        title: impl Into<String>,
        callback: impl ModalCallback + 'static,
    ) -> Result<Self, ValidationError> {
        let custom_id = custom_id.into();
        custom_id::validate_match(&custom_id)?;
        Ok(Self {
            custom_id,
            title: title.into(),
            fields: Vec::new(),
            callback: Arc::new(callback),
        })
    }

    /// Append a declared field.
    pub fn add_field(mut self, field: TextField) -> Result<Self, ValidationError> {
        self.fields.push(field);
        if let Err(error) = validate_fields(&self.fields) {
            self.fields.pop();
            return Err(error);
        }
        Ok(self)
    }

    /// Copy-construct the declared fields from a template.
    pub fn from_template(
        template: &ModalTemplate,
        custom_id: impl Into<String>,
        title: impl Into<String>,
        callback: impl ModalCallback + 'static,
    ) -> Result<Self, ValidationError> {
        let mut modal = Self::new(custom_id, title, callback)?;
        modal.fields = template.fields.clone();
        Ok(modal)
    }

    pub fn custom_id(&self) -> &str {
        &self.custom_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

#[async_trait]
impl ModalExecutor for Modal {
    fn custom_ids(&self) -> Vec<String> {
        vec![self.custom_id.clone()]
    }

    async fn execute(&self, ctx: ModalContext) -> Result<(), ExecutorError> {
        self.callback.call(ctx).await
    }

    fn rows(&self) -> Vec<ActionRow> {
        self.fields
            .iter()
            .map(|field| ActionRow::new(vec![Component::TextInput(field.render())]))
            .collect()
    }
}

/// Immutable, reusable field declaration shared across modal instances.
#[derive(Debug, Clone, Default)]
pub struct ModalTemplate {
    fields: Vec<TextField>,
}

impl ModalTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_field(mut self, field: TextField) -> Result<Self, ValidationError> {
        self.fields.push(field);
        if let Err(error) = validate_fields(&self.fields) {
            self.fields.pop();
            return Err(error);
        }
        Ok(self)
    }
}
