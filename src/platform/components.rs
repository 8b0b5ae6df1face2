//! Rendered component tree sent back to the platform.
//!
//! This is the library's own serializable model of message controls: rows
//! of buttons, select menus and modal text inputs. Numeric `type`
//! discriminants follow the platform's component taxonomy so the payloads
//! serialize straight into responses.

use serde::{Serialize, Serializer};

/// Maximum number of rows a message or modal may carry.
pub const MAX_ROWS: usize = 5;

/// Maximum number of unit-width controls per row.
pub const MAX_ROW_WIDTH: usize = 5;

/// Wire discriminant of a component node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    ActionRow = 1,
    Button = 2,
    TextMenu = 3,
    TextInput = 4,
    UserMenu = 5,
    RoleMenu = 6,
    MentionableMenu = 7,
    ChannelMenu = 8,
}

impl ComponentType {
    /// Whether this component occupies a full row on its own.
    pub const fn is_full_width(self) -> bool {
        !matches!(self, Self::Button)
    }
}

impl Serialize for ComponentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

/// Visual style of a button control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonStyle {
    Primary = 1,
    Secondary = 2,
    Success = 3,
    Danger = 4,
    Link = 5,
}

impl Serialize for ButtonStyle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

/// Input style of a modal text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldStyle {
    /// Single-line input.
    Short = 1,
    /// Multi-line input.
    Paragraph = 2,
}

impl Serialize for FieldStyle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

/// A horizontal row of controls.
#[derive(Debug, Clone, Serialize)]
pub struct ActionRow {
    #[serde(rename = "type")]
    kind: ComponentType,
    pub components: Vec<Component>,
}

impl ActionRow {
    pub fn new(components: Vec<Component>) -> Self {
        Self {
            kind: ComponentType::ActionRow,
            components,
        }
    }
}

/// Any control that can appear inside a row.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Component {
    Button(Button),
    SelectMenu(SelectMenu),
    TextInput(TextInput),
}

impl Component {
    pub(crate) fn component_type(&self) -> ComponentType {
        match self {
            Self::Button(button) => button.kind,
            Self::SelectMenu(menu) => menu.kind,
            Self::TextInput(input) => input.kind,
        }
    }
}

/// A clickable button, either callback-bound or an external link.
#[derive(Debug, Clone, Serialize)]
pub struct Button {
    #[serde(rename = "type")]
    kind: ComponentType,
    pub style: ButtonStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
}

impl Button {
    /// A callback-bound button carrying a custom identifier.
    pub fn new(style: ButtonStyle, custom_id: impl Into<String>) -> Self {
        Self {
            kind: ComponentType::Button,
            style,
            custom_id: Some(custom_id.into()),
            url: None,
            label: None,
            emoji: None,
            disabled: false,
        }
    }

    /// A link button pointing at an external URL.
    pub fn link(url: impl Into<String>) -> Self {
        Self {
            kind: ComponentType::Button,
            style: ButtonStyle::Link,
            custom_id: None,
            url: Some(url.into()),
            label: None,
            emoji: None,
            disabled: false,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = Some(emoji.into());
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// One selectable option of a text select menu.
#[derive(Debug, Clone, Serialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub default: bool,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            description: None,
            default: false,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A select menu control; always occupies a full row.
#[derive(Debug, Clone, Serialize)]
pub struct SelectMenu {
    #[serde(rename = "type")]
    kind: ComponentType,
    pub custom_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub min_values: u8,
    pub max_values: u8,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
}

impl SelectMenu {
    pub fn new(kind: ComponentType, custom_id: impl Into<String>) -> Self {
        debug_assert!(kind.is_full_width() && kind != ComponentType::ActionRow);
        Self {
            kind,
            custom_id: custom_id.into(),
            options: Vec::new(),
            placeholder: None,
            min_values: 1,
            max_values: 1,
            disabled: false,
        }
    }

    pub fn options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = options;
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn value_range(mut self, min_values: u8, max_values: u8) -> Self {
        self.min_values = min_values;
        self.max_values = max_values;
        self
    }
}

/// A text input field rendered inside a modal.
#[derive(Debug, Clone, Serialize)]
pub struct TextInput {
    #[serde(rename = "type")]
    kind: ComponentType,
    pub custom_id: String,
    pub label: String,
    pub style: FieldStyle,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl TextInput {
    pub fn new(custom_id: impl Into<String>, label: impl Into<String>, style: FieldStyle) -> Self {
        Self {
            kind: ComponentType::TextInput,
            custom_id: custom_id.into(),
            label: label.into(),
            style,
            required: true,
            value: None,
            placeholder: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_serializes_with_numeric_type() {
        let button = Button::new(ButtonStyle::Secondary, "next").label("Next");
        let value = serde_json::to_value(&button).unwrap();
        assert_eq!(value["type"], 2);
        assert_eq!(value["style"], 2);
        assert_eq!(value["custom_id"], "next");
        assert!(value.get("url").is_none());
        assert!(value.get("disabled").is_none());
    }

    #[test]
    fn test_link_button_has_no_custom_id() {
        let button = Button::link("https://example.com").label("Docs");
        let value = serde_json::to_value(&button).unwrap();
        assert_eq!(value["style"], 5);
        assert_eq!(value["url"], "https://example.com");
        assert!(value.get("custom_id").is_none());
    }

    #[test]
    fn test_action_row_nests_components() {
        let row = ActionRow::new(vec![Component::Button(Button::new(
            ButtonStyle::Primary,
            "ok",
        ))]);
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["type"], 1);
        assert_eq!(value["components"][0]["type"], 2);
    }

    #[test]
    fn test_menus_are_full_width() {
        assert!(ComponentType::UserMenu.is_full_width());
        assert!(ComponentType::TextMenu.is_full_width());
        assert!(!ComponentType::Button.is_full_width());
    }
}
