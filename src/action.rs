/// TableView Actions
///
/// Actions are the operations a page offers on its records: row actions in a
/// row's kebab menu, bulk actions over the selection, and toolbar actions
/// that need no selection at all. An action is either a button or a
/// separator between groups of buttons.
///
/// A button's `SelectionRequirement` says what it may run against:
///
/// - `None`: no target (toolbar actions such as "Create provider")
/// - `Single`: exactly one record (row actions such as "Edit")
/// - `Multiple`: one or more selected records (bulk actions such as
///   "Delete selected")
///
/// Handlers receive the table mutably together with the target records, so
/// they can update the collection directly. Persisting the result is up to
/// the handler.

use crate::error::Result;
use crate::record::Record;
use crate::table::Table;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Button,
    Separator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionRequirement {
    None,
    Single,
    Multiple,
}

/// What a handler is run against
#[derive(Debug, Clone, Copy)]
pub enum ActionTarget<'a> {
    None,
    Single(&'a Record),
    Multiple(&'a [Record]),
}

impl<'a> ActionTarget<'a> {
    /// Target records as a slice (empty for `None`)
    pub fn records(&self) -> &'a [Record] {
        match *self {
            ActionTarget::None => &[],
            ActionTarget::Single(record) => std::slice::from_ref(record),
            ActionTarget::Multiple(records) => records,
        }
    }
}

pub type ActionHandler = Rc<dyn Fn(&mut Table, ActionTarget<'_>) -> Result<()>>;

/// Button text, fixed or derived from the record it applies to
#[derive(Clone)]
pub enum ActionLabel {
    Static(String),
    /// e.g. "Disable" for an active provider, "Enable" for an inactive one
    Dynamic {
        fallback: String,
        label: Rc<dyn Fn(&Record) -> String>,
    },
}

impl ActionLabel {
    pub fn for_record(&self, record: Option<&Record>) -> String {
        match (self, record) {
            (ActionLabel::Static(label), _) => label.clone(),
            (ActionLabel::Dynamic { label, .. }, Some(record)) => label(record),
            (ActionLabel::Dynamic { fallback, .. }, None) => fallback.clone(),
        }
    }

    /// Label used in logs and error messages
    pub fn name(&self) -> &str {
        match self {
            ActionLabel::Static(label) => label,
            ActionLabel::Dynamic { fallback, .. } => fallback,
        }
    }
}

impl fmt::Debug for ActionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionLabel::Static(label) => f.debug_tuple("Static").field(label).finish(),
            ActionLabel::Dynamic { fallback, .. } => f.debug_struct("Dynamic").field("fallback", fallback).finish(),
        }
    }
}

#[derive(Clone)]
pub struct ActionButton {
    label: ActionLabel,
    selection: SelectionRequirement,
    handler: ActionHandler,
    is_danger: bool,
    is_pinned: bool,
}

impl ActionButton {
    pub fn new<F>(label: impl Into<String>, selection: SelectionRequirement, handler: F) -> Self
    where
        F: Fn(&mut Table, ActionTarget<'_>) -> Result<()> + 'static,
    {
        ActionButton {
            label: ActionLabel::Static(label.into()),
            selection,
            handler: Rc::new(handler),
            is_danger: false,
            is_pinned: false,
        }
    }

    /// Derive the label from the target record; `fallback` is used when
    /// there is no single record to ask.
    pub fn with_dynamic_label<L>(mut self, fallback: impl Into<String>, label: L) -> Self
    where
        L: Fn(&Record) -> String + 'static,
    {
        self.label = ActionLabel::Dynamic {
            fallback: fallback.into(),
            label: Rc::new(label),
        };
        self
    }

    /// Destructive action; renderers style it as a danger item.
    pub fn danger(mut self) -> Self {
        self.is_danger = true;
        self
    }

    /// Show on the toolbar or row instead of inside the overflow menu.
    pub fn pinned(mut self) -> Self {
        self.is_pinned = true;
        self
    }

    pub fn label(&self) -> &ActionLabel {
        &self.label
    }

    pub fn selection(&self) -> SelectionRequirement {
        self.selection
    }

    pub fn is_danger(&self) -> bool {
        self.is_danger
    }

    pub fn is_pinned(&self) -> bool {
        self.is_pinned
    }

    pub(crate) fn invoke(&self, table: &mut Table, target: ActionTarget<'_>) -> Result<()> {
        (self.handler)(table, target)
    }
}

impl fmt::Debug for ActionButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionButton")
            .field("label", &self.label)
            .field("selection", &self.selection)
            .field("is_danger", &self.is_danger)
            .field("is_pinned", &self.is_pinned)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    Button(ActionButton),
    Separator,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Button(_) => ActionKind::Button,
            Action::Separator => ActionKind::Separator,
        }
    }

    pub fn as_button(&self) -> Option<&ActionButton> {
        match self {
            Action::Button(button) => Some(button),
            Action::Separator => None,
        }
    }

    /// Label to show for `record`; separators have none.
    pub fn label_for(&self, record: Option<&Record>) -> Option<String> {
        self.as_button().map(|b| b.label.for_record(record))
    }

    pub(crate) fn name(&self) -> &str {
        match self {
            Action::Button(button) => button.label.name(),
            Action::Separator => "separator",
        }
    }
}

impl From<ActionButton> for Action {
    fn from(button: ActionButton) -> Self {
        Action::Button(button)
    }
}

/// Actions from `actions` that apply to a single row.
pub fn row_actions(actions: &[Action]) -> impl Iterator<Item = &Action> {
    actions.iter().filter(|a| match a {
        Action::Button(b) => b.selection == SelectionRequirement::Single,
        Action::Separator => true,
    })
}
