//! The process-wide named collection of menus.
//!
//! The registry owns every [`Menu`] (insertion order is creation order),
//! allocates command identities across all of them, and orchestrates the
//! operations that touch more than one menu at a time: recursive
//! materialization of submenus, destroy cascades, and scrubbing of dangling
//! submenu references. Everything runs on the single thread that drives
//! command dispatch, so there is no locking anywhere in the model.

use tracing::{debug, warn};

use crate::platform::{MenuBackend, NativeHandle, NativeItemRef};

use super::{
    caseless_eq,
    standard::{PRIMARY, STANDARD_ITEMS, USER_ID_BASE},
    ItemId, ItemTarget, Menu, MenuError, MenuId, MenuItem,
};

/// Name of the reserved, always-present tray menu.
pub const TRAY_MENU_NAME: &str = "Tray";

/// Everything a native entry needs to be replayed onto a fresh handle.
enum ReplayEntry {
    Separator,
    Action {
        id: ItemId,
        name: String,
        checked: bool,
        enabled: bool,
    },
    Submenu {
        menu: MenuId,
        name: String,
        checked: bool,
        enabled: bool,
    },
}

/// The process-wide menu collection, including the reserved tray menu.
#[derive(Debug)]
pub struct MenuRegistry {
    menus: Vec<Menu>,
    next_menu_id: u32,
    tray: MenuId,
    /// Set while a popup is on screen. Display blocks the dispatching
    /// thread, so no command can observe it mid-mutation; the flag exists so
    /// hosts and destruction logic can special-case an open display.
    menu_visible: bool,
}

impl MenuRegistry {
    /// Creates the registry with its reserved tray menu.
    pub fn new() -> Self {
        let tray = MenuId::from_raw(0);
        Self {
            menus: vec![Menu::new(tray, TRAY_MENU_NAME, true)],
            next_menu_id: 1,
            tray,
            menu_visible: false,
        }
    }

    pub fn tray(&self) -> MenuId {
        self.tray
    }

    pub fn menus(&self) -> &[Menu] {
        &self.menus
    }

    pub fn menu(&self, id: MenuId) -> Option<&Menu> {
        self.index_of(id).map(|idx| &self.menus[idx])
    }

    /// True while a menu is being displayed.
    pub fn menu_visible(&self) -> bool {
        self.menu_visible
    }

    /// Case-insensitive lookup by menu name.
    pub fn find(&self, name: &str) -> Option<MenuId> {
        if name.is_empty() {
            return None;
        }
        self.menus
            .iter()
            .find(|m| caseless_eq(m.name(), name))
            .map(Menu::id)
    }

    /// Finds or creates the named menu. Creation never pre-creates a native
    /// handle; the menu is appended in creation order.
    pub fn create_if_absent(&mut self, name: &str) -> Result<MenuId, MenuError> {
        if name.is_empty() {
            return Err(MenuError::BlankParameter);
        }
        if let Some(id) = self.find(name) {
            return Ok(id);
        }
        let id = MenuId::from_raw(self.next_menu_id);
        self.next_menu_id += 1;
        self.menus.push(Menu::new(id, name, false));
        debug!(menu = name, "created menu");
        Ok(id)
    }

    /// Returns the first command id not used by any live item in any menu.
    ///
    /// The pool is scanned fresh on every allocation rather than cached or
    /// incremented, so ids freed by item deletion or separator conversion
    /// are reclaimed and heavy add/delete churn cannot exhaust the id space.
    pub fn allocate_identity(&self) -> Result<ItemId, MenuError> {
        for candidate in USER_ID_BASE..u32::MAX {
            let id = ItemId::from_raw(candidate);
            if !self.menus.iter().any(|m| m.uses_identity(id)) {
                return Ok(id);
            }
        }
        Err(MenuError::ResourceExhausted)
    }

    /// Deletes a whole menu.
    ///
    /// Every other menu first loses the items whose submenu target is the
    /// doomed menu (with full per-item delete semantics, so default-item and
    /// native bookkeeping stay coherent), then the menu is unlinked and its
    /// items and handle released. Menus the doomed menu itself referenced as
    /// submenus are *not* deleted: cross-menu submenu relationships are
    /// reference, not ownership.
    pub fn delete_menu(
        &mut self,
        menu: MenuId,
        backend: &mut dyn MenuBackend,
    ) -> Result<(), MenuError> {
        if menu == self.tray {
            return Err(MenuError::TrayMenuProtected);
        }
        let idx = self.require(menu)?;

        let others: Vec<MenuId> = self
            .menus
            .iter()
            .filter(|m| m.id() != menu)
            .map(Menu::id)
            .collect();
        for other in others {
            let Some(oidx) = self.index_of(other) else {
                continue;
            };
            let positions = self.menus[oidx].positions_referencing(menu);
            // Reverse order keeps the remaining positions valid while we
            // delete.
            for pos in positions.into_iter().rev() {
                self.delete_item(other, pos, backend)?;
            }
        }

        self.destroy_at(idx, backend);
        let removed = self.menus.remove(idx);
        debug!(menu = removed.name(), "deleted menu");
        Ok(())
    }

    /// Appends a new owned item. `name == ""` adds a separator; plain items
    /// and submenu pointers carry the caller-allocated identity.
    ///
    /// If the menu is already materialized the native handle is extended in
    /// place rather than rebuilt, with the item defaults (enabled,
    /// unchecked).
    pub fn add_item(
        &mut self,
        menu: MenuId,
        name: &str,
        id: Option<ItemId>,
        target: ItemTarget,
        backend: &mut dyn MenuBackend,
    ) -> Result<(), MenuError> {
        let idx = self.require(menu)?;
        debug_assert!(
            name.is_empty() || !self.menus[idx].has_name(name),
            "caller must have ensured the item name is not yet taken"
        );

        let submenu = target.submenu();
        self.menus[idx].push_item(MenuItem::new(name, id, target));

        let Some(handle) = self.menus[idx].handle() else {
            return Ok(());
        };
        if name.is_empty() {
            backend.append_separator(handle);
        } else if let Some(sub) = submenu {
            let cidx = self.require(sub)?;
            let child = self.materialize_at(cidx, backend)?;
            backend.append_submenu(handle, child, name, false, true);
        } else if let Some(id) = id {
            backend.append_action(handle, id, name, false, true);
        }
        Ok(())
    }

    /// Convenience wrapper for appending a separator line.
    pub fn add_separator(
        &mut self,
        menu: MenuId,
        backend: &mut dyn MenuBackend,
    ) -> Result<(), MenuError> {
        self.add_item(menu, "", None, ItemTarget::None, backend)
    }

    /// Unlinks and frees one item.
    ///
    /// The native entry is removed by command id, or by position when the
    /// item currently represents a submenu (the native layer cannot address
    /// submenu entries by id). If the item held default status the default
    /// is cleared, with the tray's standard-primary fallback applied.
    pub fn delete_item(
        &mut self,
        menu: MenuId,
        pos: usize,
        backend: &mut dyn MenuBackend,
    ) -> Result<(), MenuError> {
        let idx = self.require(menu)?;
        let native = self.native_ref(idx, pos, backend);
        let item = self.menus[idx].remove_item(pos);
        if self.menus[idx].is_default(item.id()) {
            self.menus[idx].set_default(None);
            self.reset_native_default(idx, backend);
        }
        if let (Some(handle), Some(native)) = (self.menus[idx].handle(), native) {
            if !backend.remove_item(handle, native) {
                warn!(item = item.name(), "native menu entry removal failed");
            }
        }
        Ok(())
    }

    /// Removes every owned item at once.
    ///
    /// Rather than issuing N native removals (each submenu entry would need
    /// a position lookup), the native handle is destroyed outright and
    /// recreated lazily on the next display. The default item is cleared
    /// unconditionally.
    pub fn delete_all_items(
        &mut self,
        menu: MenuId,
        backend: &mut dyn MenuBackend,
    ) -> Result<(), MenuError> {
        let idx = self.require(menu)?;
        if self.menus[idx].items().is_empty() {
            return Ok(());
        }
        self.destroy_at(idx, backend);
        self.menus[idx].clear_items();
        self.menus[idx].set_default(None);
        Ok(())
    }

    /// Retargets an existing item between label, submenu, and plain form,
    /// preserving its stable identity.
    ///
    /// A no-op when the submenu target is unchanged (label updates are pure
    /// model state). When the menu is materialized the entry is converted in
    /// place; the platform sometimes discards the detached submenu's handle
    /// as a side effect of that conversion, in which case the submenu is
    /// marked for lazy recreation.
    pub fn modify_item(
        &mut self,
        menu: MenuId,
        pos: usize,
        new_target: ItemTarget,
        backend: &mut dyn MenuBackend,
    ) -> Result<(), MenuError> {
        let idx = self.require(menu)?;
        let old_sub = self.menus[idx].items()[pos].submenu();
        let new_sub = new_target.submenu();
        if old_sub == new_sub {
            self.menus[idx].item_mut(pos).set_target(new_target);
            return Ok(());
        }

        let Some(handle) = self.menus[idx].handle() else {
            // Deferred: the change is replayed when the handle is created.
            self.menus[idx].item_mut(pos).set_target(new_target);
            return Ok(());
        };

        let child = match new_sub {
            Some(sub) => {
                let cidx = self.require(sub)?;
                Some(self.materialize_at(cidx, backend)?)
            }
            None => None,
        };
        let (Some(native), Some(id)) = (
            self.native_ref(idx, pos, backend),
            self.menus[idx].items()[pos].id(),
        ) else {
            self.menus[idx].item_mut(pos).set_target(new_target);
            return Ok(());
        };

        if backend.set_item_target(handle, native, id, child) {
            // The item must stop referencing the old submenu before the
            // invalidation cascade below runs, or the cascade would destroy
            // this menu's handle as a stale parent.
            self.menus[idx].item_mut(pos).set_target(new_target);
            if let Some(old) = old_sub {
                self.destroy_if_invalidated(old, backend);
            }
        } else {
            // Best-effort: the entry keeps its old shape natively and in the
            // model; the command still succeeds.
            warn!(pos, "native submenu conversion failed; keeping previous target");
        }
        Ok(())
    }

    /// Renames an item, or converts it to a separator when `new_name` is
    /// empty.
    ///
    /// A non-empty name that collides case-insensitively with any existing
    /// item (including a casing change of the item itself) fails without
    /// mutating anything. Separator conversion releases the item's identity,
    /// drops its target, and clears default status if it held it.
    pub fn rename_item(
        &mut self,
        menu: MenuId,
        pos: usize,
        new_name: &str,
        backend: &mut dyn MenuBackend,
    ) -> Result<(), MenuError> {
        let idx = self.require(menu)?;

        if !new_name.is_empty() {
            if self.menus[idx].has_name(new_name) {
                return Err(MenuError::NameConflict(new_name.to_string()));
            }
            let native = self.native_ref(idx, pos, backend);
            self.menus[idx].item_mut(pos).set_name(new_name);
            if let (Some(handle), Some(native)) = (self.menus[idx].handle(), native) {
                if !backend.set_label(handle, native, new_name) {
                    warn!(name = new_name, "native label update failed");
                }
            }
            return Ok(());
        }

        // Separator conversion.
        let native = self.native_ref(idx, pos, backend);
        let old_sub = self.menus[idx].items()[pos].submenu();
        let id = self.menus[idx].items()[pos].id();
        if self.menus[idx].is_default(id) {
            self.menus[idx].set_default(None);
            self.reset_native_default(idx, backend);
        }
        self.menus[idx].item_mut(pos).make_separator();
        if let (Some(handle), Some(native)) = (self.menus[idx].handle(), native) {
            if backend.convert_to_separator(handle, native) {
                if let Some(old) = old_sub {
                    self.destroy_if_invalidated(old, backend);
                }
            } else {
                warn!(pos, "native separator conversion failed");
            }
        }
        Ok(())
    }

    pub fn set_item_checked(
        &mut self,
        menu: MenuId,
        pos: usize,
        checked: bool,
        backend: &mut dyn MenuBackend,
    ) -> Result<(), MenuError> {
        let idx = self.require(menu)?;
        self.menus[idx].item_mut(pos).set_checked(checked);
        self.sync_item_flag(idx, pos, backend, |b, h, r| b.set_checked(h, r, checked));
        Ok(())
    }

    pub fn toggle_item_checked(
        &mut self,
        menu: MenuId,
        pos: usize,
        backend: &mut dyn MenuBackend,
    ) -> Result<(), MenuError> {
        let idx = self.require(menu)?;
        let checked = !self.menus[idx].items()[pos].checked();
        self.set_item_checked(menu, pos, checked, backend)
    }

    /// Disabling an item also grays it.
    pub fn set_item_enabled(
        &mut self,
        menu: MenuId,
        pos: usize,
        enabled: bool,
        backend: &mut dyn MenuBackend,
    ) -> Result<(), MenuError> {
        let idx = self.require(menu)?;
        self.menus[idx].item_mut(pos).set_enabled(enabled);
        self.sync_item_flag(idx, pos, backend, |b, h, r| b.set_enabled(h, r, enabled));
        Ok(())
    }

    pub fn toggle_item_enabled(
        &mut self,
        menu: MenuId,
        pos: usize,
        backend: &mut dyn MenuBackend,
    ) -> Result<(), MenuError> {
        let idx = self.require(menu)?;
        let enabled = !self.menus[idx].items()[pos].enabled();
        self.set_item_enabled(menu, pos, enabled, backend)
    }

    /// Makes the item at `pos` the menu's single default. Any prior default
    /// is displaced as a side effect of the same native call.
    pub fn set_default_item(
        &mut self,
        menu: MenuId,
        pos: usize,
        backend: &mut dyn MenuBackend,
    ) -> Result<(), MenuError> {
        let idx = self.require(menu)?;
        let id = self.menus[idx].items()[pos].id();
        if id.is_none() {
            // A separator can never be default.
            return Ok(());
        }
        if self.menus[idx].default_item() == id {
            return Ok(());
        }
        self.menus[idx].set_default(id);
        self.sync_item_flag(idx, pos, backend, |b, h, r| b.set_default(h, Some(r)));
        Ok(())
    }

    /// Clears the default item. For the tray menu this falls back to the
    /// built-in primary action when the standard block is included;
    /// otherwise the menu simply has no default.
    pub fn clear_default(
        &mut self,
        menu: MenuId,
        backend: &mut dyn MenuBackend,
    ) -> Result<(), MenuError> {
        let idx = self.require(menu)?;
        if self.menus[idx].default_item().is_none() {
            return Ok(());
        }
        self.menus[idx].set_default(None);
        self.reset_native_default(idx, backend);
        Ok(())
    }

    /// Turns on the standard block.
    ///
    /// The handle is created immediately (if absent) and the block appended
    /// in place, so user items added earlier keep their position; the block
    /// lands wherever the append puts it, not necessarily at the top. A
    /// replay after the handle is next dropped puts the block first again.
    pub fn include_standard_items(
        &mut self,
        menu: MenuId,
        backend: &mut dyn MenuBackend,
    ) -> Result<(), MenuError> {
        let idx = self.require(menu)?;
        if self.menus[idx].standard_items_included() {
            return Ok(());
        }
        let handle = self.materialize_at(idx, backend)?;
        let set_primary_default =
            self.menus[idx].is_tray() && self.menus[idx].default_item().is_none();
        append_standard_block(handle, set_primary_default, backend);
        self.menus[idx].set_standard_items_included(true);
        Ok(())
    }

    /// Turns off the standard block. There is no cheap in-place removal of
    /// an interleaved block, so the handle is destroyed and recreated lazily
    /// on the next display.
    pub fn exclude_standard_items(
        &mut self,
        menu: MenuId,
        backend: &mut dyn MenuBackend,
    ) -> Result<(), MenuError> {
        let idx = self.require(menu)?;
        if !self.menus[idx].standard_items_included() {
            return Ok(());
        }
        self.menus[idx].set_standard_items_included(false);
        self.destroy_at(idx, backend);
        Ok(())
    }

    /// Depth-first search of the submenu reference graph: does `haystack`
    /// reach `needle` through any chain of submenu items?
    ///
    /// Used exclusively as the pre-condition check before attaching a
    /// submenu; because every attachment is vetted here, the graph stays
    /// acyclic and the recursion needs no visited set.
    pub fn contains_menu(&self, haystack: MenuId, needle: MenuId) -> bool {
        let Some(idx) = self.index_of(haystack) else {
            return false;
        };
        self.menus[idx]
            .submenu_refs()
            .into_iter()
            .any(|sub| sub == needle || self.contains_menu(sub, needle))
    }

    /// Builds the native handle from the current model if it does not exist
    /// yet, and returns it.
    ///
    /// The replay order is fixed: standard block first (when included, with
    /// the tray primary default applied when no user default exists), then
    /// every owned item in list order — recursively materializing submenus —
    /// and finally the default-item indicator.
    pub fn materialize(
        &mut self,
        menu: MenuId,
        backend: &mut dyn MenuBackend,
    ) -> Result<NativeHandle, MenuError> {
        let idx = self.require(menu)?;
        self.materialize_at(idx, backend)
    }

    /// Drops the native handle and everything that transitively displays it.
    pub fn destroy_handle(
        &mut self,
        menu: MenuId,
        backend: &mut dyn MenuBackend,
    ) -> Result<(), MenuError> {
        let idx = self.require(menu)?;
        self.destroy_at(idx, backend);
        Ok(())
    }

    /// Displays the menu at the pointer and blocks until dismissal.
    ///
    /// Showing a menu with nothing in it (no items, no standard block) is a
    /// success no-op. Returns the selected item's identity, if any; routing
    /// that selection to its label is the host's concern.
    pub fn show(
        &mut self,
        menu: MenuId,
        backend: &mut dyn MenuBackend,
    ) -> Result<Option<ItemId>, MenuError> {
        let idx = self.require(menu)?;
        if self.menus[idx].is_empty_shell() {
            return Ok(None);
        }
        let handle = self.materialize_at(idx, backend)?;
        self.menu_visible = true;
        let picked = backend.track(handle);
        self.menu_visible = false;
        picked
    }

    fn index_of(&self, id: MenuId) -> Option<usize> {
        self.menus.iter().position(|m| m.id() == id)
    }

    fn require(&self, id: MenuId) -> Result<usize, MenuError> {
        self.index_of(id)
            .ok_or_else(|| MenuError::MenuNotFound(id.to_string()))
    }

    /// Native address of the item at `pos`, or `None` when the menu (or, for
    /// submenu entries, the submenu) has no live handle to address through.
    fn native_ref(
        &self,
        idx: usize,
        pos: usize,
        backend: &dyn MenuBackend,
    ) -> Option<NativeItemRef> {
        let menu = &self.menus[idx];
        let handle = menu.handle()?;
        let item = menu.item(pos)?;
        match item.submenu() {
            Some(sub) => {
                let child = self.menu(sub)?.handle()?;
                backend
                    .submenu_position(handle, child)
                    .map(NativeItemRef::Position)
            }
            None => item.id().map(NativeItemRef::Command),
        }
    }

    /// Applies one best-effort native mutation to the item at `pos`.
    fn sync_item_flag(
        &mut self,
        idx: usize,
        pos: usize,
        backend: &mut dyn MenuBackend,
        op: impl FnOnce(&mut dyn MenuBackend, NativeHandle, NativeItemRef) -> bool,
    ) {
        let Some(handle) = self.menus[idx].handle() else {
            return;
        };
        let Some(native) = self.native_ref(idx, pos, backend) else {
            return;
        };
        if !op(backend, handle, native) {
            warn!(pos, "native menu item update failed");
        }
    }

    /// Re-applies the native default indicator after the model default was
    /// cleared.
    fn reset_native_default(&mut self, idx: usize, backend: &mut dyn MenuBackend) {
        let Some(handle) = self.menus[idx].handle() else {
            return;
        };
        let fallback = self.menus[idx].is_tray() && self.menus[idx].standard_items_included();
        let native = fallback.then_some(NativeItemRef::Command(PRIMARY));
        if !backend.set_default(handle, native) {
            warn!("native default-item reset failed");
        }
    }

    fn materialize_at(
        &mut self,
        idx: usize,
        backend: &mut dyn MenuBackend,
    ) -> Result<NativeHandle, MenuError> {
        if let Some(handle) = self.menus[idx].handle() {
            return Ok(handle);
        }
        let handle = backend.create_popup()?;
        // Recording the handle before replaying items also stops runaway
        // recursion if the acyclicity invariant were ever violated.
        self.menus[idx].set_handle(handle);

        if self.menus[idx].standard_items_included() {
            let set_primary_default =
                self.menus[idx].is_tray() && self.menus[idx].default_item().is_none();
            append_standard_block(handle, set_primary_default, backend);
        }

        let entries: Vec<ReplayEntry> = self.menus[idx]
            .items()
            .iter()
            .map(|it| match it.submenu() {
                Some(menu) => ReplayEntry::Submenu {
                    menu,
                    name: it.name().to_string(),
                    checked: it.checked(),
                    enabled: it.enabled(),
                },
                None => match it.id() {
                    Some(id) => ReplayEntry::Action {
                        id,
                        name: it.name().to_string(),
                        checked: it.checked(),
                        enabled: it.enabled(),
                    },
                    None => ReplayEntry::Separator,
                },
            })
            .collect();
        for entry in entries {
            match entry {
                ReplayEntry::Separator => backend.append_separator(handle),
                ReplayEntry::Action {
                    id,
                    name,
                    checked,
                    enabled,
                } => backend.append_action(handle, id, &name, checked, enabled),
                ReplayEntry::Submenu {
                    menu,
                    name,
                    checked,
                    enabled,
                } => {
                    let Some(cidx) = self.index_of(menu) else {
                        // Dangling references are scrubbed at delete time;
                        // nothing to attach if one slipped through.
                        warn!(%menu, "submenu reference to unknown menu skipped");
                        continue;
                    };
                    let child = self.materialize_at(cidx, backend)?;
                    backend.append_submenu(handle, child, &name, checked, enabled);
                }
            }
        }

        if let Some(default) = self.menus[idx].default_item() {
            let pos = self.menus[idx]
                .items()
                .iter()
                .position(|it| it.id() == Some(default));
            if let Some(pos) = pos {
                if let Some(native) = self.native_ref(idx, pos, backend) {
                    if !backend.set_default(handle, Some(native)) {
                        warn!("native default-item indicator failed during replay");
                    }
                }
            }
        }
        Ok(handle)
    }

    /// Destroys the handle at `idx` and cascades:
    ///
    /// (a) submenus whose handles the platform invalidated as a side effect
    ///     of destroying this one are marked destroyed too (recursively), and
    /// (b) every other menu that displays this menu as a submenu entry is
    ///     destroyed so no stale contents can ever be shown.
    ///
    /// Termination is guarded by handle liveness (each menu gives up its
    /// handle exactly once), not by a visited set; the submenu graph is kept
    /// acyclic at attach time.
    fn destroy_at(&mut self, idx: usize, backend: &mut dyn MenuBackend) {
        let Some(handle) = self.menus[idx].take_handle() else {
            return;
        };
        if backend.is_alive(handle) {
            backend.destroy(handle);
        }

        // (a) the platform destroys attached submenus along with the parent.
        for sub in self.menus[idx].submenu_refs() {
            self.destroy_if_invalidated(sub, backend);
        }

        // (b) menus still displaying this one must not keep a stale entry.
        let me = self.menus[idx].id();
        for j in 0..self.menus.len() {
            if j == idx || self.menus[j].handle().is_none() {
                continue;
            }
            if !self.menus[j].positions_referencing(me).is_empty() {
                self.destroy_at(j, backend);
            }
        }
    }

    /// If `menu`'s native handle has been invalidated behind our back,
    /// propagate the destruction through our bookkeeping.
    fn destroy_if_invalidated(&mut self, menu: MenuId, backend: &mut dyn MenuBackend) {
        let Some(idx) = self.index_of(menu) else {
            return;
        };
        if let Some(handle) = self.menus[idx].handle() {
            if !backend.is_alive(handle) {
                self.destroy_at(idx, backend);
            }
        }
    }
}

impl Default for MenuRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Appends the fixed built-in block to a native handle.
fn append_standard_block(
    handle: NativeHandle,
    set_primary_default: bool,
    backend: &mut dyn MenuBackend,
) {
    for entry in STANDARD_ITEMS {
        match entry.id {
            Some(id) => backend.append_action(handle, id, entry.label, false, true),
            None => backend.append_separator(handle),
        }
    }
    if set_primary_default {
        // No user-defined default, so the built-in primary action takes the
        // indicator.
        if !backend.set_default(handle, Some(NativeItemRef::Command(PRIMARY))) {
            warn!("native default-item indicator failed for standard block");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::headless::HeadlessBackend;

    fn setup() -> (MenuRegistry, HeadlessBackend) {
        (MenuRegistry::new(), HeadlessBackend::new())
    }

    #[test]
    fn tray_menu_exists_and_is_protected() {
        let (mut reg, mut backend) = setup();
        let tray = reg.find("tray").expect("reserved tray menu");
        assert_eq!(tray, reg.tray());
        assert!(matches!(
            reg.delete_menu(tray, &mut backend),
            Err(MenuError::TrayMenuProtected)
        ));
    }

    #[test]
    fn menu_lookup_is_case_insensitive_and_blank_names_fail() {
        let (mut reg, _) = setup();
        let id = reg.create_if_absent("File").unwrap();
        assert_eq!(reg.find("FILE"), Some(id));
        assert_eq!(reg.find(""), None);
        assert!(matches!(
            reg.create_if_absent(""),
            Err(MenuError::BlankParameter)
        ));
    }

    #[test]
    fn identities_start_at_the_user_base_and_reclaim_gaps() {
        let (mut reg, mut backend) = setup();
        let menu = reg.create_if_absent("m").unwrap();

        let a = reg.allocate_identity().unwrap();
        assert_eq!(a.raw(), USER_ID_BASE);
        reg.add_item(menu, "a", Some(a), ItemTarget::None, &mut backend)
            .unwrap();

        let b = reg.allocate_identity().unwrap();
        reg.add_item(menu, "b", Some(b), ItemTarget::None, &mut backend)
            .unwrap();
        assert_ne!(a, b);

        // Deleting "a" frees its id; the next allocation reclaims the gap
        // instead of growing past "b".
        reg.delete_item(menu, 0, &mut backend).unwrap();
        let c = reg.allocate_identity().unwrap();
        assert_eq!(c, a);
        assert_ne!(c, b);
    }

    #[test]
    fn identity_scan_spans_every_menu() {
        let (mut reg, mut backend) = setup();
        let m1 = reg.create_if_absent("one").unwrap();
        let m2 = reg.create_if_absent("two").unwrap();
        let a = reg.allocate_identity().unwrap();
        reg.add_item(m1, "a", Some(a), ItemTarget::None, &mut backend)
            .unwrap();
        let b = reg.allocate_identity().unwrap();
        reg.add_item(m2, "b", Some(b), ItemTarget::None, &mut backend)
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn contains_menu_walks_the_reference_graph() {
        let (mut reg, mut backend) = setup();
        let top = reg.create_if_absent("top").unwrap();
        let mid = reg.create_if_absent("mid").unwrap();
        let leaf = reg.create_if_absent("leaf").unwrap();
        let id = reg.allocate_identity().unwrap();
        reg.add_item(top, "m", Some(id), ItemTarget::Submenu(mid), &mut backend)
            .unwrap();
        let id = reg.allocate_identity().unwrap();
        reg.add_item(mid, "l", Some(id), ItemTarget::Submenu(leaf), &mut backend)
            .unwrap();

        assert!(reg.contains_menu(top, mid));
        assert!(reg.contains_menu(top, leaf));
        assert!(!reg.contains_menu(leaf, top));
        assert!(!reg.contains_menu(mid, top));
    }

    #[test]
    fn empty_menu_show_is_a_success_noop() {
        let (mut reg, mut backend) = setup();
        let menu = reg.create_if_absent("empty").unwrap();
        let picked = reg.show(menu, &mut backend).unwrap();
        assert_eq!(picked, None);
        assert!(reg.menu(menu).unwrap().handle().is_none());
        assert_eq!(backend.displays(), 0);
    }
}
