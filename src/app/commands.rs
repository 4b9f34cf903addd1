//! Contains the verb table and the per-command dispatch logic.
//!
//! A command arrives as four opaque strings — target menu name, verb, and up
//! to two verb-dependent parameters — already tokenized by the host's script
//! layer. Dispatch is state-free per call: it validates preconditions, finds
//! or (for `add`) creates the target menu and item, and invokes exactly one
//! registry operation. A failed command returns a typed error with the model
//! unchanged.

use crate::core::registry::TRAY_MENU_NAME;
use crate::core::{caseless_eq, ItemId, ItemTarget, MenuError, MenuId, MenuRegistry};
use crate::platform::MenuBackend;

use super::hosts::{LabelResolver, TrayIconHost};

/// Marker prefix distinguishing a submenu target from a label target in the
/// second `add` parameter.
pub const SUBMENU_PREFIX: char = ':';

/// One tokenized script command.
#[derive(Debug, Clone, Copy)]
pub struct MenuCommand<'a> {
    pub menu: &'a str,
    pub verb: &'a str,
    pub param1: &'a str,
    pub param2: &'a str,
}

/// The recognized verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuVerb {
    UseErrorLevel,
    Tip,
    Icon,
    NoIcon,
    Show,
    Add,
    Delete,
    DeleteAll,
    Rename,
    Check,
    Uncheck,
    ToggleCheck,
    Enable,
    Disable,
    ToggleEnable,
    Default,
    NoDefault,
    Standard,
    NoStandard,
}

impl MenuVerb {
    /// Case-insensitive verb lookup.
    pub fn parse(verb: &str) -> Option<Self> {
        let verb = match verb.to_lowercase().as_str() {
            "useerrorlevel" => Self::UseErrorLevel,
            "tip" => Self::Tip,
            "icon" => Self::Icon,
            "noicon" => Self::NoIcon,
            "show" => Self::Show,
            "add" => Self::Add,
            "delete" => Self::Delete,
            "deleteall" => Self::DeleteAll,
            "rename" => Self::Rename,
            "check" => Self::Check,
            "uncheck" => Self::Uncheck,
            "togglecheck" => Self::ToggleCheck,
            "enable" => Self::Enable,
            "disable" => Self::Disable,
            "toggleenable" => Self::ToggleEnable,
            "default" => Self::Default,
            "nodefault" => Self::NoDefault,
            "standard" => Self::Standard,
            "nostandard" => Self::NoStandard,
            _ => return None,
        };
        Some(verb)
    }
}

/// What a successfully dispatched command produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The command completed; nothing further to report.
    Completed,
    /// The menu was displayed; the user picked this entry (or dismissed).
    Shown(Option<ItemId>),
    /// The command failed, and the failure was recorded in the process-wide
    /// error indicator instead of propagating (error-level convention).
    Failed,
}

pub(crate) fn dispatch(
    registry: &mut MenuRegistry,
    backend: &mut dyn MenuBackend,
    labels: &dyn LabelResolver,
    tray_icon: &mut dyn TrayIconHost,
    use_error_level: &mut bool,
    cmd: &MenuCommand<'_>,
) -> Result<CommandOutcome, MenuError> {
    let Some(verb) = MenuVerb::parse(cmd.verb) else {
        return Err(MenuError::InvalidCommand(cmd.verb.to_string()));
    };
    let is_tray = caseless_eq(cmd.menu, TRAY_MENU_NAME);

    // Handle early on anything that doesn't require the menu to be found or
    // created.
    match verb {
        MenuVerb::UseErrorLevel => {
            // Anything except an explicit "off" turns the convention on. The
            // new mode applies from the next command.
            *use_error_level = !cmd.param1.eq_ignore_ascii_case("off");
            return Ok(CommandOutcome::Completed);
        }
        MenuVerb::Tip => {
            require_tray(is_tray, cmd)?;
            let tip = (!cmd.param1.is_empty()).then_some(cmd.param1);
            tray_icon.set_tooltip(tip);
            return Ok(CommandOutcome::Completed);
        }
        MenuVerb::Icon => {
            require_tray(is_tray, cmd)?;
            return handle_icon(tray_icon, cmd);
        }
        MenuVerb::NoIcon => {
            require_tray(is_tray, cmd)?;
            tray_icon.hide_icon();
            return Ok(CommandOutcome::Completed);
        }
        _ => {}
    }

    // Menus are created only in conjunction with the add command.
    let menu = match registry.find(cmd.menu) {
        Some(menu) => menu,
        None if verb == MenuVerb::Add => registry.create_if_absent(cmd.menu)?,
        None => return Err(MenuError::MenuNotFound(cmd.menu.to_string())),
    };

    // Verbs that need only the menu.
    match verb {
        MenuVerb::Show => return Ok(CommandOutcome::Shown(registry.show(menu, backend)?)),
        MenuVerb::Add if cmd.param1.is_empty() => {
            registry.add_separator(menu, backend)?;
            return Ok(CommandOutcome::Completed);
        }
        MenuVerb::Delete if cmd.param1.is_empty() => {
            registry.delete_menu(menu, backend)?;
            return Ok(CommandOutcome::Completed);
        }
        MenuVerb::DeleteAll => {
            registry.delete_all_items(menu, backend)?;
            return Ok(CommandOutcome::Completed);
        }
        // A default command without an item is the same as no-default.
        MenuVerb::Default if cmd.param1.is_empty() => {
            registry.clear_default(menu, backend)?;
            return Ok(CommandOutcome::Completed);
        }
        MenuVerb::NoDefault => {
            registry.clear_default(menu, backend)?;
            return Ok(CommandOutcome::Completed);
        }
        MenuVerb::Standard => {
            registry.include_standard_items(menu, backend)?;
            return Ok(CommandOutcome::Completed);
        }
        MenuVerb::NoStandard => {
            registry.exclude_standard_items(menu, backend)?;
            return Ok(CommandOutcome::Completed);
        }
        _ => {}
    }

    // Everything remaining operates on a named item.
    if cmd.param1.is_empty() {
        return Err(MenuError::BlankParameter);
    }

    if verb == MenuVerb::Add {
        // The target defaults to the item name itself when none is given.
        let target = resolve_target(registry, labels, menu, cmd)?;
        return match registry.menu(menu).and_then(|m| m.find_item(cmd.param1)) {
            // Add on an existing item updates its label or submenu.
            Some(pos) => {
                registry.modify_item(menu, pos, target, backend)?;
                Ok(CommandOutcome::Completed)
            }
            None => {
                let id = registry.allocate_identity()?;
                registry.add_item(menu, cmd.param1, Some(id), target, backend)?;
                Ok(CommandOutcome::Completed)
            }
        };
    }

    // Items are never created on demand for non-add verbs: a change kept
    // separate from an addition can't land an item in the wrong position.
    let Some(pos) = registry.menu(menu).and_then(|m| m.find_item(cmd.param1)) else {
        return Err(MenuError::ItemNotFound(cmd.param1.to_string()));
    };

    match verb {
        MenuVerb::Rename => registry.rename_item(menu, pos, cmd.param2, backend)?,
        MenuVerb::Check => registry.set_item_checked(menu, pos, true, backend)?,
        MenuVerb::Uncheck => registry.set_item_checked(menu, pos, false, backend)?,
        MenuVerb::ToggleCheck => registry.toggle_item_checked(menu, pos, backend)?,
        MenuVerb::Enable => registry.set_item_enabled(menu, pos, true, backend)?,
        MenuVerb::Disable => registry.set_item_enabled(menu, pos, false, backend)?,
        MenuVerb::ToggleEnable => registry.toggle_item_enabled(menu, pos, backend)?,
        MenuVerb::Default => registry.set_default_item(menu, pos, backend)?,
        MenuVerb::Delete => registry.delete_item(menu, pos, backend)?,
        // Every other verb returned above.
        _ => return Err(MenuError::InvalidCommand(cmd.verb.to_string())),
    }
    Ok(CommandOutcome::Completed)
}

fn require_tray(is_tray: bool, cmd: &MenuCommand<'_>) -> Result<(), MenuError> {
    if is_tray {
        Ok(())
    } else {
        Err(MenuError::TrayOnlyCommand(cmd.verb.to_string()))
    }
}

/// Resolves the label-or-submenu parameter of an `add` command.
fn resolve_target(
    registry: &MenuRegistry,
    labels: &dyn LabelResolver,
    menu: MenuId,
    cmd: &MenuCommand<'_>,
) -> Result<ItemTarget, MenuError> {
    let requested = if cmd.param2.is_empty() {
        cmd.param1
    } else {
        cmd.param2
    };
    if let Some(name) = requested.strip_prefix(SUBMENU_PREFIX) {
        let submenu = registry
            .find(name)
            .ok_or_else(|| MenuError::SubmenuNotFound(name.to_string()))?;
        // Reject an attachment that would make the target an ancestor of
        // itself; this is the only place cycles can be introduced.
        if submenu == menu || registry.contains_menu(submenu, menu) {
            return Err(MenuError::SelfReferentialSubmenu(name.to_string()));
        }
        return Ok(ItemTarget::Submenu(submenu));
    }
    labels
        .find_label(requested)
        .map(ItemTarget::Label)
        .ok_or_else(|| MenuError::LabelNotFound(requested.to_string()))
}

fn handle_icon(
    tray_icon: &mut dyn TrayIconHost,
    cmd: &MenuCommand<'_>,
) -> Result<CommandOutcome, MenuError> {
    if cmd.param1.is_empty() {
        tray_icon.show_icon();
        return Ok(CommandOutcome::Completed);
    }
    if cmd.param1 == "*" {
        tray_icon.restore_default_icon();
        return Ok(CommandOutcome::Completed);
    }
    let icon_number = cmd.param2.parse::<i64>().unwrap_or(1).max(1) as u32;
    tray_icon.set_icon(cmd.param1, icon_number)?;
    Ok(CommandOutcome::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbs_parse_case_insensitively() {
        assert_eq!(MenuVerb::parse("ADD"), Some(MenuVerb::Add));
        assert_eq!(MenuVerb::parse("deleteALL"), Some(MenuVerb::DeleteAll));
        assert_eq!(MenuVerb::parse("ToggleCheck"), Some(MenuVerb::ToggleCheck));
        assert_eq!(MenuVerb::parse("useerrorlevel"), Some(MenuVerb::UseErrorLevel));
        assert_eq!(MenuVerb::parse("bogus"), None);
        assert_eq!(MenuVerb::parse(""), None);
    }
}
