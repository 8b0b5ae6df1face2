//! Column executor: row-packed interactive controls under one registration.
//!
//! A column is an ordered list of control descriptors. Rendering packs them
//! into at most five rows, five unit-width controls per row; a select menu
//! occupies a full row on its own. Declaration order is preserved and a new
//! row opens whenever the next control would not fit in the last one.
//!
//! Each callback-bound control contributes its own match key, so a single
//! registration covers the whole column and dispatch resolves the pressed
//! control by the match portion of the inbound custom ID.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::context::ComponentContext;
use crate::custom_id;
use crate::error::{ExecutorError, ValidationError};
use crate::executor::{ComponentCallback, ComponentExecutor};
use crate::platform::components::{MAX_ROWS, MAX_ROW_WIDTH};
use crate::platform::{ActionRow, Button, ButtonStyle, Component, ComponentType, SelectMenu, SelectOption};

/// The closed set of control kinds a column can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Button,
    LinkButton,
    TextMenu,
    UserMenu,
    RoleMenu,
    ChannelMenu,
    MentionableMenu,
}

impl ControlKind {
    /// Width in button-equivalents when packed into a row.
    const fn width(self) -> usize {
        match self {
            Self::Button | Self::LinkButton => 1,
            _ => MAX_ROW_WIDTH,
        }
    }

    fn menu_type(self) -> Option<ComponentType> {
        match self {
            Self::TextMenu => Some(ComponentType::TextMenu),
            Self::UserMenu => Some(ComponentType::UserMenu),
            Self::RoleMenu => Some(ComponentType::RoleMenu),
            Self::ChannelMenu => Some(ComponentType::ChannelMenu),
            Self::MentionableMenu => Some(ComponentType::MentionableMenu),
            Self::Button | Self::LinkButton => None,
        }
    }
}

/// Visible face of a button control.
#[derive(Debug, Clone)]
pub enum ControlLabel {
    Text(String),
    Emoji(String),
}

#[derive(Clone)]
struct Control {
    kind: ControlKind,
    /// Match key for callback-bound controls; [`None`] for link buttons.
    fragment: Option<String>,
    label: Option<ControlLabel>,
    style: ButtonStyle,
    url: Option<String>,
    options: Vec<SelectOption>,
    callback: Option<Arc<dyn ComponentCallback>>,
}

impl Control {
    fn render(&self, metadata: Option<&str>) -> Result<Component, ValidationError> {
        if let Some(menu_type) = self.kind.menu_type() {
            let fragment = self.fragment.as_deref().unwrap_or_default();
            let custom_id = custom_id::join(fragment, metadata)?;
            let mut menu = SelectMenu::new(menu_type, custom_id);
            if !self.options.is_empty() {
                menu = menu.options(self.options.clone());
            }
            return Ok(Component::SelectMenu(menu));
        }

        let mut button = match (&self.fragment, &self.url) {
            (Some(fragment), _) => Button::new(self.style, custom_id::join(fragment, metadata)?),
            (None, Some(url)) => Button::link(url.clone()),
            (None, None) => unreachable!("control has neither fragment nor url"),
        };
        match &self.label {
            Some(ControlLabel::Text(text)) => button = button.label(text.clone()),
            Some(ControlLabel::Emoji(emoji)) => button = button.emoji(emoji.clone()),
            None => {}
        }
        Ok(Component::Button(button))
    }
}

fn pack(controls: &[Control], metadata: Option<&str>) -> Result<Vec<ActionRow>, ValidationError> {
    let mut rows: Vec<Vec<Component>> = Vec::new();
    let mut last_width = 0;

    for control in controls {
        let width = control.kind.width();
        if rows.is_empty() || last_width + width > MAX_ROW_WIDTH {
            if rows.len() == MAX_ROWS {
                return Err(ValidationError::ColumnFull { max_rows: MAX_ROWS });
            }
            rows.push(Vec::new());
            last_width = 0;
        }
        rows.last_mut().expect("row was just pushed").push(control.render(metadata)?);
        last_width += width;
    }

    Ok(rows.into_iter().map(ActionRow::new).collect())
}

/// Multi-control executor rendering as row-packed message components.
#[derive(Clone, Default)]
pub struct ActionColumn {
    controls: Vec<Control>,
}

impl std::fmt::Debug for ActionColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionColumn")
            .field("controls", &self.controls.len())
            .finish()
    }
}

impl ActionColumn {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_control(mut self, control: Control) -> Result<Self, ValidationError> {
        if let Some(fragment) = &control.fragment {
            custom_id::validate_match(fragment)?;
            if self.controls.iter().any(|c| c.fragment.as_deref() == Some(fragment)) {
                return Err(ValidationError::DuplicateId {
                    custom_id: fragment.clone(),
                });
            }
        }

        self.controls.push(control);
        // Packing enforces the row caps; undo the push if it no longer fits.
        if let Err(error) = pack(&self.controls, None) {
            self.controls.pop();
            return Err(error);
        }
        Ok(self)
    }

    /// Append a callback-bound button.
    pub fn add_button(
        self,
        fragment: impl Into<String>,
        style: ButtonStyle,
        label: ControlLabel,
        callback: impl ComponentCallback + 'static,
    ) -> Result<Self, ValidationError> {
        self.push_control(Control {
            kind: ControlKind::Button,
            fragment: Some(fragment.into()),
            label: Some(label),
            style,
            url: None,
            options: Vec::new(),
            callback: Some(Arc::new(callback)),
        })
    }

    /// Append a link button; link buttons carry no callback.
    pub fn add_link_button(
        self,
        url: impl Into<String>,
        label: ControlLabel,
    ) -> Result<Self, ValidationError> {
        self.push_control(Control {
            kind: ControlKind::LinkButton,
            fragment: None,
            label: Some(label),
            style: ButtonStyle::Link,
            url: Some(url.into()),
            options: Vec::new(),
            callback: None,
        })
    }

    /// Append a text select menu with static options.
    pub fn add_text_menu(
        self,
        fragment: impl Into<String>,
        options: Vec<SelectOption>,
        callback: impl ComponentCallback + 'static,
    ) -> Result<Self, ValidationError> {
        self.add_menu(ControlKind::TextMenu, fragment, options, callback)
    }

    pub fn add_user_menu(
        self,
        fragment: impl Into<String>,
        callback: impl ComponentCallback + 'static,
    ) -> Result<Self, ValidationError> {
        self.add_menu(ControlKind::UserMenu, fragment, Vec::new(), callback)
    }

    pub fn add_role_menu(
        self,
        fragment: impl Into<String>,
        callback: impl ComponentCallback + 'static,
    ) -> Result<Self, ValidationError> {
        self.add_menu(ControlKind::RoleMenu, fragment, Vec::new(), callback)
    }

    pub fn add_channel_menu(
        self,
        fragment: impl Into<String>,
        callback: impl ComponentCallback + 'static,
    ) -> Result<Self, ValidationError> {
        self.add_menu(ControlKind::ChannelMenu, fragment, Vec::new(), callback)
    }

    pub fn add_mentionable_menu(
        self,
        fragment: impl Into<String>,
        callback: impl ComponentCallback + 'static,
    ) -> Result<Self, ValidationError> {
        self.add_menu(ControlKind::MentionableMenu, fragment, Vec::new(), callback)
    }

    /// Append any menu kind. `options` is only meaningful for text menus.
    pub fn add_menu(
        self,
        kind: ControlKind,
        fragment: impl Into<String>,
        options: Vec<SelectOption>,
        callback: impl ComponentCallback + 'static,
    ) -> Result<Self, ValidationError> {
        debug_assert!(kind.menu_type().is_some());
        self.push_control(Control {
            kind,
            fragment: Some(fragment.into()),
            label: None,
            style: ButtonStyle::Secondary,
            url: None,
            options,
            callback: Some(Arc::new(callback)),
        })
    }

    /// Render the column with per-message metadata appended to every
    /// callback-bound control's custom ID.
    pub fn rows_with_metadata(
        &self,
        metadata: Option<&str>,
    ) -> Result<Vec<ActionRow>, ValidationError> {
        pack(&self.controls, metadata)
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }
}

#[async_trait]
impl ComponentExecutor for ActionColumn {
    fn custom_ids(&self) -> Vec<String> {
        self.controls
            .iter()
            .filter_map(|control| control.fragment.clone())
            .collect()
    }

    async fn execute(&self, ctx: ComponentContext) -> Result<(), ExecutorError> {
        let control = self
            .controls
            .iter()
            .find(|control| control.fragment.as_deref() == Some(ctx.id_match()));

        match control.and_then(|control| control.callback.clone()) {
            Some(callback) => callback.call(ctx).await,
            None => {
                warn!(id_match = ctx.id_match(), "no control bound for dispatched custom ID");
                Ok(())
            }
        }
    }

    fn rows(&self) -> Vec<ActionRow> {
        // Packing was validated on every push, so this cannot fail.
        pack(&self.controls, None).unwrap_or_default()
    }
}

/// Immutable, reusable column declaration.
///
/// Templates are shared descriptor lists; instances copy-construct from
/// them so no mutable state is ever shared between registrations.
#[derive(Clone, Default)]
pub struct ColumnTemplate {
    column: ActionColumn,
}

impl ColumnTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_button(
        mut self,
        fragment: impl Into<String>,
        style: ButtonStyle,
        label: ControlLabel,
        callback: impl ComponentCallback + 'static,
    ) -> Result<Self, ValidationError> {
        self.column = self.column.add_button(fragment, style, label, callback)?;
        Ok(self)
    }

    pub fn add_link_button(
        mut self,
        url: impl Into<String>,
        label: ControlLabel,
    ) -> Result<Self, ValidationError> {
        self.column = self.column.add_link_button(url, label)?;
        Ok(self)
    }

    pub fn add_menu(
        mut self,
        kind: ControlKind,
        fragment: impl Into<String>,
        options: Vec<SelectOption>,
        callback: impl ComponentCallback + 'static,
    ) -> Result<Self, ValidationError> {
        self.column = self.column.add_menu(kind, fragment, options, callback)?;
        Ok(self)
    }

    /// Copy-construct a fresh column from this template.
    pub fn instantiate(&self) -> ActionColumn {
        self.column.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecutorError;

    async fn noop(_ctx: ComponentContext) -> Result<(), ExecutorError> {
        Ok(())
    }

    fn buttons(count: usize) -> ActionColumn {
        let mut column = ActionColumn::new();
        for index in 0..count {
            column = column
                .add_button(
                    format!("btn-{index}"),
                    ButtonStyle::Secondary,
                    ControlLabel::Text(format!("{index}")),
                    noop,
                )
                .unwrap();
        }
        column
    }

    #[test]
    fn test_five_buttons_share_one_row() {
        assert_eq!(buttons(5).rows().len(), 1);
        assert_eq!(buttons(6).rows().len(), 2);
    }

    #[test]
    fn test_menu_occupies_full_row() {
        let column = buttons(1)
            .add_user_menu("pick-user", noop)
            .unwrap();
        let rows = column.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].components.len(), 1);
        assert_eq!(rows[1].components.len(), 1);
    }

    #[test]
    fn test_twenty_five_buttons_fit_and_twenty_six_do_not() {
        let column = buttons(25);
        assert_eq!(column.rows().len(), 5);
        let error = column
            .add_button("one-too-many", ButtonStyle::Secondary, ControlLabel::Text("x".into()), noop)
            .unwrap_err();
        assert!(matches!(error, ValidationError::ColumnFull { .. }));
    }

    #[test]
    fn test_sixth_menu_rejected() {
        let mut column = ActionColumn::new();
        for index in 0..5 {
            column = column.add_user_menu(format!("menu-{index}"), noop).unwrap();
        }
        assert!(column.add_user_menu("menu-5", noop).is_err());
    }

    #[test]
    fn test_duplicate_fragment_rejected() {
        let error = buttons(1)
            .add_button("btn-0", ButtonStyle::Primary, ControlLabel::Text("dup".into()), noop)
            .unwrap_err();
        assert!(matches!(error, ValidationError::DuplicateId { .. }));
    }

    #[test]
    fn test_link_buttons_have_no_custom_id() {
        let column = ActionColumn::new()
            .add_link_button("https://example.com", ControlLabel::Text("Docs".into()))
            .unwrap();
        assert!(column.custom_ids().is_empty());
        let rows = column.rows();
        let value = serde_json::to_value(&rows[0]).unwrap();
        assert!(value["components"][0].get("custom_id").is_none());
    }

    #[test]
    fn test_metadata_is_appended_to_custom_ids() {
        let rows = buttons(1).rows_with_metadata(Some("user42")).unwrap();
        let value = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(value["components"][0]["custom_id"], "btn-0:user42");
    }

    #[test]
    fn test_oversized_metadata_rejected_at_render() {
        let column = buttons(1);
        let metadata = "x".repeat(120);
        assert!(matches!(
            column.rows_with_metadata(Some(&metadata)),
            Err(ValidationError::IdTooLong { .. })
        ));
    }

    #[test]
    fn test_template_instances_are_independent() {
        let template = ColumnTemplate::new()
            .add_button("go", ButtonStyle::Primary, ControlLabel::Text("Go".into()), noop)
            .unwrap();
        let first = template.instantiate();
        let second = template
            .instantiate()
            .add_button("extra", ButtonStyle::Secondary, ControlLabel::Text("E".into()), noop)
            .unwrap();
        assert_eq!(first.custom_ids().len(), 1);
        assert_eq!(second.custom_ids().len(), 2);
    }
}
