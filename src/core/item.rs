//! A single menu entry: an action, a separator, or a submenu pointer.

use super::{ItemId, MenuId};

/// Opaque reference to a host-side label (the subroutine an action item
/// fires). The core only stores it; resolution and execution live in the
/// host, behind [`crate::app::hosts::LabelResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRef(String);

impl LabelRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// What an item does when picked: nothing (plain item or separator), fire a
/// host label, or open another menu.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ItemTarget {
    #[default]
    None,
    Label(LabelRef),
    Submenu(MenuId),
}

impl ItemTarget {
    /// The submenu this target points at, if any.
    pub fn submenu(&self) -> Option<MenuId> {
        match self {
            Self::Submenu(id) => Some(*id),
            _ => None,
        }
    }
}

/// One entry in a [`super::Menu`]'s ordered item list.
///
/// An empty `name` denotes a separator. The `id` is process-unique and stays
/// stable for the item's lifetime, including while it points at a submenu; it
/// is released only when the item is deleted or converted into a separator.
#[derive(Debug, Clone)]
pub struct MenuItem {
    name: String,
    id: Option<ItemId>,
    target: ItemTarget,
    checked: bool,
    enabled: bool,
}

impl MenuItem {
    /// New items start enabled and unchecked.
    pub(crate) fn new(name: impl Into<String>, id: Option<ItemId>, target: ItemTarget) -> Self {
        Self {
            name: name.into(),
            id,
            target,
            checked: false,
            enabled: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> Option<ItemId> {
        self.id
    }

    pub fn target(&self) -> &ItemTarget {
        &self.target
    }

    pub fn submenu(&self) -> Option<MenuId> {
        self.target.submenu()
    }

    pub fn is_separator(&self) -> bool {
        self.name.is_empty()
    }

    pub fn checked(&self) -> bool {
        self.checked
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn set_checked(&mut self, checked: bool) {
        self.checked = checked;
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn set_target(&mut self, target: ItemTarget) {
        self.target = target;
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Turns the item into a separator: the name empties, the identity is
    /// released for reuse, and any label/submenu target is dropped.
    pub(crate) fn make_separator(&mut self) {
        self.name.clear();
        self.id = None;
        self.target = ItemTarget::None;
    }
}
