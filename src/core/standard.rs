//! The fixed block of built-in entries any menu can include.
//!
//! The block is appended to the native handle as a unit; its entries are not
//! part of the owning menu's item model and carry no per-item state. Their
//! ids are reserved below [`USER_ID_BASE`] so they can never collide with a
//! user item's allocated identity.

use super::ItemId;

/// First identity handed out to user items; everything below is reserved for
/// the standard block.
pub const USER_ID_BASE: u32 = 100;

pub const ID_OPEN: ItemId = ItemId::from_raw(1);
pub const ID_HELP: ItemId = ItemId::from_raw(2);
pub const ID_RELOAD: ItemId = ItemId::from_raw(3);
pub const ID_EDIT: ItemId = ItemId::from_raw(4);
pub const ID_SUSPEND: ItemId = ItemId::from_raw(5);
pub const ID_PAUSE: ItemId = ItemId::from_raw(6);
pub const ID_EXIT: ItemId = ItemId::from_raw(7);

/// The tray menu falls back to this entry as its default action when a
/// user-defined default is cleared while the standard block is present.
pub const PRIMARY: ItemId = ID_OPEN;

/// One entry of the standard block; `id == None` is a separator.
pub struct StandardEntry {
    pub id: Option<ItemId>,
    pub label: &'static str,
}

const fn action(id: ItemId, label: &'static str) -> StandardEntry {
    StandardEntry {
        id: Some(id),
        label,
    }
}

const SEPARATOR: StandardEntry = StandardEntry {
    id: None,
    label: "",
};

/// The block, in append order.
pub const STANDARD_ITEMS: &[StandardEntry] = &[
    action(ID_OPEN, "&Open"),
    action(ID_HELP, "&Help"),
    SEPARATOR,
    action(ID_RELOAD, "&Reload Script"),
    action(ID_EDIT, "&Edit Script"),
    SEPARATOR,
    action(ID_SUSPEND, "&Suspend"),
    action(ID_PAUSE, "&Pause"),
    action(ID_EXIT, "E&xit"),
];
