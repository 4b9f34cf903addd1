#![allow(deprecated)] // Keep Cocoa warnings localized
#![allow(unexpected_cfgs)] // Suppress warnings from the `sel!` macro in older `objc` crates

//! [`MenuBackend`] over AppKit's `NSMenu`.
//!
//! AppKit differs from the model's worst-case platform in two comfortable
//! ways: handles stay valid until we release them (no behind-the-back
//! invalidation, so the core's liveness cascades simply never fire), and
//! there is no default-item indicator to maintain. Items are addressed by
//! their tag, which carries the process-wide command id.

use std::cell::Cell;
use std::collections::HashMap;

use cocoa::appkit::{NSApp, NSMenu, NSMenuItem};
use cocoa::base::{id, nil, BOOL, NO, YES};
use cocoa::foundation::{NSPoint, NSString};
use objc::declare::ClassDecl;
use objc::runtime::{Class, Object, Sel};
use objc::{class, msg_send, sel, sel_impl};
use tracing::{debug, warn};

use crate::core::{ItemId, MenuError};

use super::super::{MenuBackend, NativeHandle, NativeItemRef};

const HANDLER_CLASS: &str = "ScriptMenuActionHandler";

thread_local! {
    /// Tag of the entry picked during the current tracking session.
    static PICKED: Cell<Option<isize>> = const { Cell::new(None) };
    /// The shared action-handler instance (AppKit menus are main-thread only).
    static HANDLER: Cell<id> = const { Cell::new(nil) };
}

fn ns(s: &str) -> id {
    unsafe { NSString::alloc(nil).init_str(s) }
}

extern "C" fn menu_action_fired(_this: &Object, _sel: Sel, sender: id) {
    let tag: isize = unsafe { msg_send![sender, tag] };
    PICKED.with(|picked| picked.set(Some(tag)));
}

/// Lazily registers and instantiates the Objective-C class that receives
/// menu item actions.
fn action_handler() -> id {
    HANDLER.with(|handler| {
        if handler.get() != nil {
            return handler.get();
        }
        let class = Class::get(HANDLER_CLASS).or_else(|| {
            let superclass = class!(NSObject);
            let mut decl = ClassDecl::new(HANDLER_CLASS, superclass)?;
            unsafe {
                decl.add_method(
                    sel!(menuActionFired:),
                    menu_action_fired as extern "C" fn(&Object, Sel, id),
                );
            }
            Some(decl.register())
        });
        match class {
            Some(class) => {
                let instance: id = unsafe { msg_send![class, new] };
                handler.set(instance);
                instance
            }
            None => {
                // Selections are lost but menus still display.
                warn!("could not register the menu action handler class");
                nil
            }
        }
    })
}

/// The AppKit-backed popup implementation.
#[derive(Debug, Default)]
pub struct CocoaMenuBackend {
    menus: HashMap<u64, id>,
    next_handle: u64,
}

impl CocoaMenuBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn menu(&self, handle: NativeHandle) -> Option<id> {
        self.menus.get(&handle.raw()).copied()
    }

    fn index_of(&self, menu: id, item: NativeItemRef) -> Option<isize> {
        unsafe {
            let index: isize = match item {
                NativeItemRef::Command(id) => {
                    msg_send![menu, indexOfItemWithTag: id.raw() as isize]
                }
                NativeItemRef::Position(pos) => pos as isize,
            };
            let count: isize = msg_send![menu, numberOfItems];
            (index >= 0 && index < count).then_some(index)
        }
    }

    fn item_at(&self, menu: id, item: NativeItemRef) -> Option<id> {
        let index = self.index_of(menu, item)?;
        let found: id = unsafe { msg_send![menu, itemAtIndex: index] };
        (found != nil).then_some(found)
    }
}

impl MenuBackend for CocoaMenuBackend {
    fn create_popup(&mut self) -> Result<NativeHandle, MenuError> {
        let menu = unsafe {
            let menu = NSMenu::alloc(nil).initWithTitle_(ns(""));
            if menu == nil {
                return Err(MenuError::ResourceExhausted);
            }
            // Enabled state is driven by the model, not by responder chains.
            menu.setAutoenablesItems(NO);
            menu
        };
        self.next_handle += 1;
        let handle = NativeHandle::from_raw(self.next_handle);
        self.menus.insert(handle.raw(), menu);
        Ok(handle)
    }

    fn destroy(&mut self, handle: NativeHandle) {
        if let Some(menu) = self.menus.remove(&handle.raw()) {
            unsafe {
                let _: () = msg_send![menu, release];
            }
        }
    }

    fn is_alive(&self, handle: NativeHandle) -> bool {
        self.menus.contains_key(&handle.raw())
    }

    fn append_action(
        &mut self,
        handle: NativeHandle,
        id: ItemId,
        label: &str,
        checked: bool,
        enabled: bool,
    ) {
        let Some(menu) = self.menu(handle) else {
            return;
        };
        unsafe {
            let item = NSMenuItem::alloc(nil).initWithTitle_action_keyEquivalent_(
                ns(label),
                sel!(menuActionFired:),
                ns(""),
            );
            let _: () = msg_send![item, setTarget: action_handler()];
            let _: () = msg_send![item, setTag: id.raw() as isize];
            let _: () = msg_send![item, setEnabled: if enabled { YES } else { NO }];
            let _: () = msg_send![item, setState: checked as isize];
            menu.addItem_(item);
            let _: () = msg_send![item, release];
        }
    }

    fn append_separator(&mut self, handle: NativeHandle) {
        let Some(menu) = self.menu(handle) else {
            return;
        };
        unsafe {
            let sep = NSMenuItem::separatorItem(nil);
            menu.addItem_(sep);
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
        let (Some(menu), Some(child)) = (self.menu(handle), self.menu(submenu)) else {
            return;
        };
        unsafe {
            let item = NSMenuItem::alloc(nil).initWithTitle_action_keyEquivalent_(
                ns(label),
                sel!(menuActionFired:),
                ns(""),
            );
            item.setSubmenu_(child);
            let _: () = msg_send![item, setEnabled: if enabled { YES } else { NO }];
            let _: () = msg_send![item, setState: checked as isize];
            menu.addItem_(item);
            let _: () = msg_send![item, release];
        }
    }

    fn remove_item(&mut self, handle: NativeHandle, item: NativeItemRef) -> bool {
        let Some(menu) = self.menu(handle) else {
            return false;
        };
        let Some(index) = self.index_of(menu, item) else {
            return false;
        };
        unsafe {
            let _: () = msg_send![menu, removeItemAtIndex: index];
        }
        true
    }

    fn set_checked(&mut self, handle: NativeHandle, item: NativeItemRef, checked: bool) -> bool {
        let Some(menu) = self.menu(handle) else {
            return false;
        };
        let Some(found) = self.item_at(menu, item) else {
            return false;
        };
        unsafe {
            let _: () = msg_send![found, setState: checked as isize];
        }
        true
    }

    fn set_enabled(&mut self, handle: NativeHandle, item: NativeItemRef, enabled: bool) -> bool {
        let Some(menu) = self.menu(handle) else {
            return false;
        };
        let Some(found) = self.item_at(menu, item) else {
            return false;
        };
        unsafe {
            let _: () = msg_send![found, setEnabled: if enabled { YES } else { NO }];
        }
        true
    }

    fn set_label(&mut self, handle: NativeHandle, item: NativeItemRef, label: &str) -> bool {
        let Some(menu) = self.menu(handle) else {
            return false;
        };
        let Some(found) = self.item_at(menu, item) else {
            return false;
        };
        unsafe {
            let _: () = msg_send![found, setTitle: ns(label)];
        }
        true
    }

    fn convert_to_separator(&mut self, handle: NativeHandle, item: NativeItemRef) -> bool {
        // NSMenuItem cannot morph in place; swap the entry for a separator at
        // the same index.
        let Some(menu) = self.menu(handle) else {
            return false;
        };
        let Some(index) = self.index_of(menu, item) else {
            return false;
        };
        unsafe {
            let _: () = msg_send![menu, removeItemAtIndex: index];
            let sep = NSMenuItem::separatorItem(nil);
            let _: () = msg_send![menu, insertItem: sep atIndex: index];
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
        let Some(menu) = self.menu(handle) else {
            return false;
        };
        let Some(found) = self.item_at(menu, item) else {
            return false;
        };
        let child = submenu.and_then(|s| self.menu(s));
        if submenu.is_some() && child.is_none() {
            return false;
        }
        unsafe {
            match child {
                Some(child) => {
                    found.setSubmenu_(child);
                }
                None => {
                    let _: () = msg_send![found, setSubmenu: nil];
                    let _: () = msg_send![found, setTarget: action_handler()];
                    let _: () = msg_send![found, setAction: sel!(menuActionFired:)];
                }
            }
            let _: () = msg_send![found, setTag: id.raw() as isize];
        }
        true
    }

    fn set_default(&mut self, handle: NativeHandle, _item: Option<NativeItemRef>) -> bool {
        // AppKit popups have no default-item affordance; accept the call so
        // the model's bookkeeping stays quiet.
        debug!(handle = handle.raw(), "default-item indicator ignored on AppKit");
        true
    }

    fn submenu_position(&self, handle: NativeHandle, submenu: NativeHandle) -> Option<usize> {
        let menu = self.menu(handle)?;
        let child = self.menu(submenu)?;
        unsafe {
            let count: isize = msg_send![menu, numberOfItems];
            for index in 0..count {
                let item: id = msg_send![menu, itemAtIndex: index];
                let attached: id = msg_send![item, submenu];
                if attached == child {
                    return Some(index as usize);
                }
            }
        }
        None
    }

    fn track(&mut self, handle: NativeHandle) -> Result<Option<ItemId>, MenuError> {
        let Some(menu) = self.menu(handle) else {
            debug!("display requested for a dead handle");
            return Ok(None);
        };
        PICKED.with(|picked| picked.set(None));
        unsafe {
            // Activate first so a click outside the menu can dismiss it.
            let app = NSApp();
            let _: () = msg_send![app, activateIgnoringOtherApps: YES];
            let location: NSPoint = msg_send![class!(NSEvent), mouseLocation];
            // Blocks in AppKit's menu-tracking loop until selection or
            // dismissal. No post-dismissal wakeup is needed here; AppKit does
            // not swallow the follow-up click.
            let _: BOOL = msg_send![menu, popUpMenuPositioningItem: nil
                                          atLocation: location
                                          inView: nil];
        }
        let picked = PICKED.with(Cell::take);
        Ok(picked.and_then(|tag| u32::try_from(tag).ok().map(ItemId::from_raw)))
    }
}
