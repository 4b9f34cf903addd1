//! A named, ordered collection of menu items, optionally backed by exactly
//! one native popup handle.
//!
//! The native handle is a cache derived from the model: it is `None` until
//! the menu is first displayed (or explicitly materialized), always safe to
//! drop, and replayable from the item list at any time. Structural edits on a
//! materialized menu update the handle in place where the platform supports
//! it cheaply; everything else falls back to destroy-then-lazily-recreate.
//! The cross-menu parts of that synchronization (recursive materialization,
//! destroy cascades, reference scrubbing) live in
//! [`super::registry::MenuRegistry`].

use crate::platform::NativeHandle;

use super::{caseless_eq, ItemId, ItemTarget, MenuId, MenuItem};

/// A user-defined popup menu.
#[derive(Debug)]
pub struct Menu {
    id: MenuId,
    name: String,
    items: Vec<MenuItem>,
    include_standard_items: bool,
    /// Weak reference to the current default item. Never a separator.
    default: Option<ItemId>,
    handle: Option<NativeHandle>,
    is_tray: bool,
}

impl Menu {
    pub(crate) fn new(id: MenuId, name: impl Into<String>, is_tray: bool) -> Self {
        Self {
            id,
            name: name.into(),
            items: Vec::new(),
            include_standard_items: false,
            default: None,
            handle: None,
            is_tray,
        }
    }

    pub fn id(&self) -> MenuId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn item(&self, pos: usize) -> Option<&MenuItem> {
        self.items.get(pos)
    }

    pub fn standard_items_included(&self) -> bool {
        self.include_standard_items
    }

    pub fn default_item(&self) -> Option<ItemId> {
        self.default
    }

    pub fn handle(&self) -> Option<NativeHandle> {
        self.handle
    }

    pub fn is_tray(&self) -> bool {
        self.is_tray
    }

    /// Case-insensitive item lookup. Separators (empty names) are never
    /// matched because callers always pass a non-empty name.
    pub fn find_item(&self, name: &str) -> Option<usize> {
        if name.is_empty() {
            return None;
        }
        self.items.iter().position(|it| caseless_eq(it.name(), name))
    }

    /// True when `name` is already taken by any item of this menu.
    pub(crate) fn has_name(&self, name: &str) -> bool {
        self.find_item(name).is_some()
    }

    /// True when some item of this menu uses `id`.
    pub(crate) fn uses_identity(&self, id: ItemId) -> bool {
        self.items.iter().any(|it| it.id() == Some(id))
    }

    /// Submenu targets referenced by this menu's items, in item order.
    pub(crate) fn submenu_refs(&self) -> Vec<MenuId> {
        self.items.iter().filter_map(MenuItem::submenu).collect()
    }

    /// Positions (ascending) of items whose submenu target is `target`.
    pub(crate) fn positions_referencing(&self, target: MenuId) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, it)| it.submenu() == Some(target))
            .map(|(pos, _)| pos)
            .collect()
    }

    pub(crate) fn item_mut(&mut self, pos: usize) -> &mut MenuItem {
        &mut self.items[pos]
    }

    pub(crate) fn push_item(&mut self, item: MenuItem) {
        self.items.push(item);
    }

    pub(crate) fn remove_item(&mut self, pos: usize) -> MenuItem {
        self.items.remove(pos)
    }

    pub(crate) fn clear_items(&mut self) {
        self.items.clear();
    }

    pub(crate) fn set_standard_items_included(&mut self, included: bool) {
        self.include_standard_items = included;
    }

    pub(crate) fn set_default(&mut self, default: Option<ItemId>) {
        self.default = default;
    }

    /// Whether `id` currently holds default status.
    pub(crate) fn is_default(&self, id: Option<ItemId>) -> bool {
        id.is_some() && self.default == id
    }

    pub(crate) fn set_handle(&mut self, handle: NativeHandle) {
        self.handle = Some(handle);
    }

    pub(crate) fn take_handle(&mut self) -> Option<NativeHandle> {
        self.handle.take()
    }

    /// A menu with no user items and no standard block has nothing to
    /// display; showing it is treated as a success no-op.
    pub(crate) fn is_empty_shell(&self) -> bool {
        self.items.is_empty() && !self.include_standard_items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu() -> Menu {
        Menu::new(MenuId::from_raw(1), "File", false)
    }

    #[test]
    fn item_lookup_is_case_insensitive() {
        let mut m = menu();
        m.push_item(MenuItem::new(
            "Open",
            Some(ItemId::from_raw(100)),
            ItemTarget::None,
        ));
        assert_eq!(m.find_item("open"), Some(0));
        assert_eq!(m.find_item("OPEN"), Some(0));
        assert_eq!(m.find_item("close"), None);
    }

    #[test]
    fn separators_are_never_found_by_name() {
        let mut m = menu();
        m.push_item(MenuItem::new("", None, ItemTarget::None));
        assert_eq!(m.find_item(""), None);
        assert!(m.item(0).is_some_and(MenuItem::is_separator));
    }

    #[test]
    fn separator_conversion_releases_identity_and_target() {
        let mut m = menu();
        m.push_item(MenuItem::new(
            "Sub",
            Some(ItemId::from_raw(101)),
            ItemTarget::Submenu(MenuId::from_raw(2)),
        ));
        m.item_mut(0).make_separator();
        let it = m.item(0).unwrap();
        assert!(it.is_separator());
        assert_eq!(it.id(), None);
        assert_eq!(it.submenu(), None);
    }

    #[test]
    fn empty_shell_requires_no_items_and_no_standard_block() {
        let mut m = menu();
        assert!(m.is_empty_shell());
        m.set_standard_items_included(true);
        assert!(!m.is_empty_shell());
    }
}
