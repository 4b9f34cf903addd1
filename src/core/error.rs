//! Defines the custom error type for the `core` module.

use thiserror::Error;

/// The primary error type for menu operations.
///
/// Every failure is recoverable at the command level: a failed command leaves
/// the menu model unchanged and the caller decides whether to surface, log,
/// or abort (see the error-level convention in [`crate::app::MenuHost`]).
#[derive(Debug, Error)]
pub enum MenuError {
    /// The named menu does not exist (and the command is not `Add`).
    #[error("menu does not exist: {0}")]
    MenuNotFound(String),

    /// The named menu item does not exist within the target menu.
    #[error("the specified menu item cannot be changed because it doesn't exist: {0}")]
    ItemNotFound(String),

    /// The label a new item should fire does not exist in the host.
    #[error("label does not exist: {0}")]
    LabelNotFound(String),

    /// The menu named as a submenu target does not exist.
    #[error("submenu does not exist: {0}")]
    SubmenuNotFound(String),

    /// The verb is not a recognized menu command.
    #[error("unrecognized menu command: {0}")]
    InvalidCommand(String),

    /// An item rename collides case-insensitively with an existing sibling.
    #[error("the menu item's new name must not match that of an existing item: {0}")]
    NameConflict(String),

    /// Attaching this submenu would make the menu an ancestor of itself.
    #[error("this submenu must not contain its parent menu: {0}")]
    SelfReferentialSubmenu(String),

    /// The native layer could not allocate a popup handle, or the command id
    /// space is exhausted.
    #[error("out of native menu resources")]
    ResourceExhausted,

    /// The reserved tray menu cannot be deleted.
    #[error("tray menu must not be deleted")]
    TrayMenuProtected,

    /// A verb that only applies to the tray menu was used on another menu.
    #[error("command is only valid for the tray menu: {0}")]
    TrayOnlyCommand(String),

    /// A required parameter was blank.
    #[error("parameter must not be blank in this case")]
    BlankParameter,

    /// A custom tray icon could not be loaded from the given file.
    #[error("icon could not be loaded: {0}")]
    IconLoad(String),
}
