pub mod error;
pub mod item;
pub mod menu;
pub mod registry;
pub mod standard;

use std::fmt;

/// Process-wide identity of an action item, as seen by the native layer.
///
/// The native layer exposes a single flat command-id namespace across every
/// menu, so these are allocated registry-wide (see
/// [`registry::MenuRegistry::allocate_identity`]). User items live at
/// [`standard::USER_ID_BASE`] and above; the fixed standard-item block owns
/// the ids below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u32);

impl ItemId {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable handle naming a menu inside the registry.
///
/// Cross-menu references (submenu targets) are stored as `MenuId` rather than
/// as owning pointers; deleting the referenced menu proactively scrubs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MenuId(u32);

impl MenuId {
    pub(crate) const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for MenuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Case-insensitive name comparison used for menu and item lookup.
pub(crate) fn caseless_eq(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

pub use error::MenuError;
pub use item::{ItemTarget, LabelRef, MenuItem};
pub use menu::Menu;
pub use registry::MenuRegistry;
