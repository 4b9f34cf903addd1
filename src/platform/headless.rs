//! An in-process simulation of the native popup-menu surface.
//!
//! This backend drives the test suite and hosts on platforms without a real
//! popup implementation. It reproduces the two platform behaviors the menu
//! model has to survive: destroying a popup destroys every submenu attached
//! to it, and detaching a submenu from an entry (retargeting or separator
//! conversion) discards the detached submenu's handle.

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use crate::core::{ItemId, MenuError};

use super::{MenuBackend, NativeHandle, NativeItemRef};

#[derive(Debug, Clone)]
enum Entry {
    Action {
        id: ItemId,
        label: String,
        checked: bool,
        enabled: bool,
    },
    Separator,
    Submenu {
        submenu: NativeHandle,
        label: String,
        checked: bool,
        enabled: bool,
    },
}

#[derive(Debug, Default)]
struct Popup {
    entries: Vec<Entry>,
    /// Index of the entry carrying the default mark. The mark sticks to the
    /// entry, so removals of other entries shift it along.
    default: Option<usize>,
    alive: bool,
}

fn flag(on: bool, text: &str) -> &str {
    if on {
        text
    } else {
        ""
    }
}

/// Simulated backend with scripted display selections and introspection
/// counters for tests.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    popups: HashMap<u64, Popup>,
    next_handle: u64,
    selections: VecDeque<Option<ItemId>>,
    displays: usize,
    foreground_activations: usize,
    wakeups: usize,
    fail_next_create: bool,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the outcome of the next display: the entry the simulated user
    /// picks, or `None` for dismissal by an outside click.
    pub fn queue_selection(&mut self, picked: Option<ItemId>) {
        self.selections.push_back(picked);
    }

    /// Makes the next `create_popup` fail, as if the platform ran out of
    /// menu resources.
    pub fn fail_next_create(&mut self) {
        self.fail_next_create = true;
    }

    /// Number of popups actually put on screen.
    pub fn displays(&self) -> usize {
        self.displays
    }

    /// Number of foreground activations performed before a display.
    pub fn foreground_activations(&self) -> usize {
        self.foreground_activations
    }

    /// Number of post-dismissal no-op wakeups posted.
    pub fn wakeups(&self) -> usize {
        self.wakeups
    }

    /// Renders a popup (submenus inlined and indented) for comparison in
    /// tests. Handle values never appear in the output, so two
    /// materializations of the same model render identically.
    pub fn layout(&self, handle: NativeHandle) -> String {
        let mut out = String::new();
        self.render(handle, 0, &mut out);
        out
    }

    fn render(&self, handle: NativeHandle, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        let Some(popup) = self.popups.get(&handle.raw()) else {
            out.push_str(&format!("{indent}<unknown>\n"));
            return;
        };
        if !popup.alive {
            out.push_str(&format!("{indent}<destroyed>\n"));
            return;
        }
        for (pos, entry) in popup.entries.iter().enumerate() {
            let default = popup.default == Some(pos);
            match entry {
                Entry::Separator => out.push_str(&format!("{indent}---\n")),
                Entry::Action {
                    id,
                    label,
                    checked,
                    enabled,
                } => {
                    out.push_str(&format!(
                        "{indent}[{label}] id={id}{}{}{}\n",
                        flag(*checked, " checked"),
                        flag(!*enabled, " disabled"),
                        flag(default, " (default)"),
                    ));
                }
                Entry::Submenu {
                    submenu,
                    label,
                    checked,
                    enabled,
                } => {
                    out.push_str(&format!(
                        "{indent}[{label}] >{}{}{}\n",
                        flag(*checked, " checked"),
                        flag(!*enabled, " disabled"),
                        flag(default, " (default)"),
                    ));
                    self.render(*submenu, depth + 1, out);
                }
            }
        }
    }

    /// Marks a popup destroyed, taking every attached submenu with it --
    /// exactly what the real platform does behind the model's back.
    fn kill(&mut self, handle: NativeHandle) {
        let Some(popup) = self.popups.get_mut(&handle.raw()) else {
            return;
        };
        if !popup.alive {
            return;
        }
        popup.alive = false;
        let attached: Vec<NativeHandle> = popup
            .entries
            .iter()
            .filter_map(|e| match e {
                Entry::Submenu { submenu, .. } => Some(*submenu),
                _ => None,
            })
            .collect();
        for sub in attached {
            self.kill(sub);
        }
    }

    fn position(&self, handle: NativeHandle, item: NativeItemRef) -> Option<usize> {
        let popup = self.popups.get(&handle.raw())?;
        if !popup.alive {
            return None;
        }
        match item {
            NativeItemRef::Position(pos) => (pos < popup.entries.len()).then_some(pos),
            // The flat command-id namespace never addresses submenu entries.
            NativeItemRef::Command(id) => popup
                .entries
                .iter()
                .position(|e| matches!(e, Entry::Action { id: aid, .. } if *aid == id)),
        }
    }

    fn entry_mut(&mut self, handle: NativeHandle, item: NativeItemRef) -> Option<&mut Entry> {
        let pos = self.position(handle, item)?;
        self.popups
            .get_mut(&handle.raw())
            .and_then(|p| p.entries.get_mut(pos))
    }

    fn live_popup_mut(&mut self, handle: NativeHandle) -> Option<&mut Popup> {
        self.popups
            .get_mut(&handle.raw())
            .filter(|popup| popup.alive)
    }
}

impl MenuBackend for HeadlessBackend {
    fn create_popup(&mut self) -> Result<NativeHandle, MenuError> {
        if self.fail_next_create {
            self.fail_next_create = false;
            return Err(MenuError::ResourceExhausted);
        }
        self.next_handle += 1;
        let handle = NativeHandle::from_raw(self.next_handle);
        self.popups.insert(
            handle.raw(),
            Popup {
                alive: true,
                ..Popup::default()
            },
        );
        Ok(handle)
    }

    fn destroy(&mut self, handle: NativeHandle) {
        self.kill(handle);
    }

    fn is_alive(&self, handle: NativeHandle) -> bool {
        self.popups
            .get(&handle.raw())
            .is_some_and(|popup| popup.alive)
    }

    fn append_action(
        &mut self,
        handle: NativeHandle,
        id: ItemId,
        label: &str,
        checked: bool,
        enabled: bool,
    ) {
        if let Some(popup) = self.live_popup_mut(handle) {
            popup.entries.push(Entry::Action {
                id,
                label: label.to_string(),
                checked,
                enabled,
            });
        }
    }

    fn append_separator(&mut self, handle: NativeHandle) {
        if let Some(popup) = self.live_popup_mut(handle) {
            popup.entries.push(Entry::Separator);
        }
    }

    fn append_submenu(
        &mut self,
        handle: NativeHandle,
        submenu: NativeHandle,
        label: &str,
        checked: bool,
        enabled: bool,
    ) {
        if let Some(popup) = self.live_popup_mut(handle) {
            popup.entries.push(Entry::Submenu {
                submenu,
                label: label.to_string(),
                checked,
                enabled,
            });
        }
    }

    fn remove_item(&mut self, handle: NativeHandle, item: NativeItemRef) -> bool {
        let Some(pos) = self.position(handle, item) else {
            return false;
        };
        if let Some(popup) = self.live_popup_mut(handle) {
            popup.entries.remove(pos);
            popup.default = match popup.default {
                Some(d) if d == pos => None,
                Some(d) if d > pos => Some(d - 1),
                other => other,
            };
            true
        } else {
            false
        }
    }

    fn set_checked(&mut self, handle: NativeHandle, item: NativeItemRef, checked: bool) -> bool {
        match self.entry_mut(handle, item) {
            Some(Entry::Action { checked: c, .. }) | Some(Entry::Submenu { checked: c, .. }) => {
                *c = checked;
                true
            }
            _ => false,
        }
    }

    fn set_enabled(&mut self, handle: NativeHandle, item: NativeItemRef, enabled: bool) -> bool {
        match self.entry_mut(handle, item) {
            Some(Entry::Action { enabled: e, .. }) | Some(Entry::Submenu { enabled: e, .. }) => {
                *e = enabled;
                true
            }
            _ => false,
        }
    }

    fn set_label(&mut self, handle: NativeHandle, item: NativeItemRef, label: &str) -> bool {
        match self.entry_mut(handle, item) {
            Some(Entry::Action { label: l, .. }) | Some(Entry::Submenu { label: l, .. }) => {
                *l = label.to_string();
                true
            }
            _ => false,
        }
    }

    fn convert_to_separator(&mut self, handle: NativeHandle, item: NativeItemRef) -> bool {
        let Some(entry) = self.entry_mut(handle, item) else {
            return false;
        };
        let detached = match entry {
            Entry::Submenu { submenu, .. } => Some(*submenu),
            Entry::Action { .. } => None,
            Entry::Separator => return true,
        };
        *entry = Entry::Separator;
        if let Some(submenu) = detached {
            // The platform discards a submenu handle once nothing points at
            // it from this entry.
            self.kill(submenu);
        }
        true
    }

    fn set_item_target(
        &mut self,
        handle: NativeHandle,
        item: NativeItemRef,
        id: ItemId,
        submenu: Option<NativeHandle>,
    ) -> bool {
        let Some(entry) = self.entry_mut(handle, item) else {
            return false;
        };
        let (label, checked, enabled, old_submenu) = match entry {
            Entry::Action {
                label,
                checked,
                enabled,
                ..
            } => (label.clone(), *checked, *enabled, None),
            Entry::Submenu {
                label,
                checked,
                enabled,
                submenu: old,
            } => (label.clone(), *checked, *enabled, Some(*old)),
            Entry::Separator => return false,
        };
        *entry = match submenu {
            Some(submenu) => Entry::Submenu {
                submenu,
                label,
                checked,
                enabled,
            },
            None => Entry::Action {
                id,
                label,
                checked,
                enabled,
            },
        };
        if let Some(old) = old_submenu {
            if Some(old) != submenu {
                self.kill(old);
            }
        }
        true
    }

    fn set_default(&mut self, handle: NativeHandle, item: Option<NativeItemRef>) -> bool {
        let resolved = match item {
            Some(item) => match self.position(handle, item) {
                Some(pos) => Some(pos),
                None => return false,
            },
            None => None,
        };
        match self.live_popup_mut(handle) {
            Some(popup) => {
                popup.default = resolved;
                true
            }
            None => false,
        }
    }

    fn submenu_position(&self, handle: NativeHandle, submenu: NativeHandle) -> Option<usize> {
        let popup = self.popups.get(&handle.raw())?;
        popup
            .entries
            .iter()
            .position(|e| matches!(e, Entry::Submenu { submenu: s, .. } if *s == submenu))
    }

    fn track(&mut self, handle: NativeHandle) -> Result<Option<ItemId>, MenuError> {
        if !self.is_alive(handle) {
            debug!("display requested for a dead handle");
            return Ok(None);
        }
        self.foreground_activations += 1;
        self.displays += 1;
        let picked = self.selections.pop_front().unwrap_or(None);
        // The no-op wakeup keeps the platform from swallowing the click that
        // follows dismissal.
        self.wakeups += 1;
        Ok(picked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend_with_popup() -> (HeadlessBackend, NativeHandle) {
        let mut backend = HeadlessBackend::new();
        let handle = backend.create_popup().unwrap();
        (backend, handle)
    }

    #[test]
    fn destroying_a_popup_kills_attached_submenus() {
        let (mut backend, parent) = backend_with_popup();
        let child = backend.create_popup().unwrap();
        let grandchild = backend.create_popup().unwrap();
        backend.append_submenu(child, grandchild, "deep", false, true);
        backend.append_submenu(parent, child, "sub", false, true);

        backend.destroy(parent);
        assert!(!backend.is_alive(parent));
        assert!(!backend.is_alive(child));
        assert!(!backend.is_alive(grandchild));
    }

    #[test]
    fn retargeting_discards_the_detached_submenu_handle() {
        let (mut backend, parent) = backend_with_popup();
        let child = backend.create_popup().unwrap();
        backend.append_submenu(parent, child, "sub", false, true);

        let ok = backend.set_item_target(
            parent,
            NativeItemRef::Position(0),
            ItemId::from_raw(100),
            None,
        );
        assert!(ok);
        assert!(!backend.is_alive(child));
        assert!(backend.is_alive(parent));
    }

    #[test]
    fn command_ids_never_address_submenu_entries() {
        let (mut backend, parent) = backend_with_popup();
        let child = backend.create_popup().unwrap();
        let id = ItemId::from_raw(100);
        backend.append_submenu(parent, child, "sub", false, true);
        backend.append_action(parent, id, "plain", false, true);

        // Removal by command finds the plain entry, not the submenu.
        assert!(backend.remove_item(parent, NativeItemRef::Command(id)));
        assert_eq!(backend.submenu_position(parent, child), Some(0));
    }

    #[test]
    fn scripted_selection_is_returned_once() {
        let (mut backend, handle) = backend_with_popup();
        backend.append_action(handle, ItemId::from_raw(100), "x", false, true);
        backend.queue_selection(Some(ItemId::from_raw(100)));

        assert_eq!(
            backend.track(handle).unwrap(),
            Some(ItemId::from_raw(100))
        );
        assert_eq!(backend.track(handle).unwrap(), None);
        assert_eq!(backend.displays(), 2);
        assert_eq!(backend.wakeups(), 2);
    }
}
