//! Trait seams for the host services the menu core delegates to.
//!
//! Label execution and tray-icon resource management are external
//! collaborators: the core validates and routes to them, nothing more.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info};

use crate::core::{LabelRef, MenuError};

/// Resolves a label name to the host's opaque label token.
///
/// What happens when a menu item fires that label is entirely the host's
/// business; the core only stores the token on the item.
pub trait LabelResolver {
    fn find_label(&self, name: &str) -> Option<LabelRef>;
}

/// The tray icon and tooltip, as a simple OS resource wrapper owned by the
/// host.
pub trait TrayIconHost {
    /// Sets the tray tooltip; `None` restores the host default.
    fn set_tooltip(&mut self, tip: Option<&str>);

    /// (Re-)enables the tray icon with whatever icon is current.
    fn show_icon(&mut self);

    /// Replaces a custom icon with the host's standard one.
    fn restore_default_icon(&mut self);

    /// Loads a custom icon from `path` (1-based `icon_number` selects the
    /// resource within the file).
    fn set_icon(&mut self, path: &str, icon_number: u32) -> Result<(), MenuError>;

    /// Removes the tray icon entirely.
    fn hide_icon(&mut self);
}

/// Accepts every non-empty label name. Suits hosts that bind labels late,
/// and the demo REPL.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissiveLabels;

impl LabelResolver for PermissiveLabels {
    fn find_label(&self, name: &str) -> Option<LabelRef> {
        (!name.is_empty()).then(|| LabelRef::new(name))
    }
}

/// Resolves only a fixed set of label names.
#[derive(Debug, Clone, Default)]
pub struct StaticLabels {
    names: Vec<String>,
}

impl StaticLabels {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl LabelResolver for StaticLabels {
    fn find_label(&self, name: &str) -> Option<LabelRef> {
        self.names
            .iter()
            .find(|n| n.eq_ignore_ascii_case(name))
            .map(|n| LabelRef::new(n.as_str()))
    }
}

/// Observable state of [`LoggingTrayIcon`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrayIconState {
    pub tooltip: Option<String>,
    pub custom_icon: Option<(String, u32)>,
    pub hidden: bool,
}

/// Tray-icon host that records state and logs; enough for headless hosts and
/// tests. The state lives behind an `Rc` so a caller can keep a handle for
/// inspection after boxing the host (everything runs on one thread).
#[derive(Debug, Default)]
pub struct LoggingTrayIcon {
    state: Rc<RefCell<TrayIconState>>,
}

impl LoggingTrayIcon {
    pub fn state(&self) -> Rc<RefCell<TrayIconState>> {
        Rc::clone(&self.state)
    }
}

impl TrayIconHost for LoggingTrayIcon {
    fn set_tooltip(&mut self, tip: Option<&str>) {
        debug!(?tip, "tray tooltip updated");
        self.state.borrow_mut().tooltip = tip.map(str::to_string);
    }

    fn show_icon(&mut self) {
        info!("tray icon enabled");
        self.state.borrow_mut().hidden = false;
    }

    fn restore_default_icon(&mut self) {
        info!("tray icon restored to default");
        self.state.borrow_mut().custom_icon = None;
    }

    fn set_icon(&mut self, path: &str, icon_number: u32) -> Result<(), MenuError> {
        if path.trim().is_empty() {
            return Err(MenuError::IconLoad(path.to_string()));
        }
        info!(path, icon_number, "tray icon replaced");
        let mut state = self.state.borrow_mut();
        state.custom_icon = Some((path.to_string(), icon_number));
        state.hidden = false;
        Ok(())
    }

    fn hide_icon(&mut self) {
        info!("tray icon removed");
        self.state.borrow_mut().hidden = true;
    }
}
