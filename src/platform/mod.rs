//! Platform-specific integration helpers.
//!
//! Keep OS quirks here to avoid leaking them into the app's core logic. The
//! menu model talks to the operating system exclusively through
//! [`MenuBackend`]; the core treats the handles it returns as a disposable
//! cache and is prepared for the platform to invalidate them behind its back
//! (destroying a popup takes its attached submenus with it, and detaching a
//! submenu from an entry may discard the submenu's handle).

pub mod headless;

#[cfg(target_os = "macos")]
pub mod macos;

use crate::core::{ItemId, MenuError};

/// Backend-issued handle of one native popup menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(u64);

impl NativeHandle {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// How a native entry is addressed for in-place mutation.
///
/// Entries that represent submenus have no usable command id at the native
/// layer and can only be addressed by position; everything else is addressed
/// by its stable command id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeItemRef {
    Command(ItemId),
    Position(usize),
}

/// The native popup-menu surface.
///
/// `create_popup` and `track` report real failures; the in-place mutators
/// return `false` on failure and the model deliberately does not roll back
/// (the handle is a cache that can always be dropped and replayed).
pub trait MenuBackend {
    /// Allocates an empty popup. Failing here means the platform is out of
    /// menu resources.
    fn create_popup(&mut self) -> Result<NativeHandle, MenuError>;

    /// Destroys a popup. Attached submenu handles may be destroyed with it;
    /// callers must re-check liveness of anything they still reference.
    fn destroy(&mut self, handle: NativeHandle);

    /// Whether the platform still considers `handle` a valid menu.
    fn is_alive(&self, handle: NativeHandle) -> bool;

    fn append_action(
        &mut self,
        handle: NativeHandle,
        id: ItemId,
        label: &str,
        checked: bool,
        enabled: bool,
    );

    fn append_separator(&mut self, handle: NativeHandle);

    fn append_submenu(
        &mut self,
        handle: NativeHandle,
        submenu: NativeHandle,
        label: &str,
        checked: bool,
        enabled: bool,
    );

    fn remove_item(&mut self, handle: NativeHandle, item: NativeItemRef) -> bool;

    fn set_checked(&mut self, handle: NativeHandle, item: NativeItemRef, checked: bool) -> bool;

    /// Disabling also grays the entry.
    fn set_enabled(&mut self, handle: NativeHandle, item: NativeItemRef, enabled: bool) -> bool;

    fn set_label(&mut self, handle: NativeHandle, item: NativeItemRef, label: &str) -> bool;

    /// Turns the entry into a separator in place, detaching any submenu.
    fn convert_to_separator(&mut self, handle: NativeHandle, item: NativeItemRef) -> bool;

    /// Repoints an entry between "opens `submenu`" and "plain item with
    /// command id `id`". The id must be re-asserted because a formerly
    /// submenu entry has no usable command id at the native layer.
    fn set_item_target(
        &mut self,
        handle: NativeHandle,
        item: NativeItemRef,
        id: ItemId,
        submenu: Option<NativeHandle>,
    ) -> bool;

    /// Marks one entry as the menu's default; `None` clears the indicator.
    /// The platform enforces single-default as a side effect.
    fn set_default(&mut self, handle: NativeHandle, item: Option<NativeItemRef>) -> bool;

    /// Position of the entry whose attached submenu is `submenu`, if any.
    fn submenu_position(&self, handle: NativeHandle, submenu: NativeHandle) -> Option<usize>;

    /// Displays the popup at the current pointer location and blocks until
    /// the user picks an entry or dismisses the menu.
    ///
    /// Implementations foreground-activate the host's main window first (so
    /// an outside click can dismiss the menu) and post a no-op wakeup after
    /// dismissal to work around the platform quirk where a second click can
    /// otherwise be swallowed.
    fn track(&mut self, handle: NativeHandle) -> Result<Option<ItemId>, MenuError>;
}
