//! The host-facing command layer.
//!
//! [`MenuHost`] bundles the menu registry, the native backend, and the host
//! service seams into the single object a script-driven host talks to. All
//! state lives behind `&mut self`: the model is single-threaded by
//! construction, which is what makes lock-free mutation of the menu tree
//! sound.

pub mod commands;
pub mod hosts;

use tracing::warn;

use crate::core::{MenuError, MenuRegistry};
use crate::platform::MenuBackend;

use hosts::{LabelResolver, TrayIconHost};

pub use commands::{CommandOutcome, MenuCommand, MenuVerb, SUBMENU_PREFIX};

/// Owns everything a running host needs to execute menu commands.
pub struct MenuHost<B: MenuBackend> {
    registry: MenuRegistry,
    backend: B,
    labels: Box<dyn LabelResolver>,
    tray_icon: Box<dyn TrayIconHost>,
    /// When set, failed commands record a process-wide error indicator
    /// instead of surfacing the error to the caller.
    use_error_level: bool,
    last_error: bool,
}

impl<B: MenuBackend> MenuHost<B> {
    pub fn new(
        backend: B,
        labels: Box<dyn LabelResolver>,
        tray_icon: Box<dyn TrayIconHost>,
    ) -> Self {
        Self {
            registry: MenuRegistry::new(),
            backend,
            labels,
            tray_icon,
            use_error_level: false,
            last_error: false,
        }
    }

    pub fn registry(&self) -> &MenuRegistry {
        &self.registry
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn use_error_level(&self) -> bool {
        self.use_error_level
    }

    pub fn set_use_error_level(&mut self, enabled: bool) {
        self.use_error_level = enabled;
    }

    /// Whether the most recent command under the error-level convention
    /// failed.
    pub fn last_error(&self) -> bool {
        self.last_error
    }

    /// Executes one tokenized menu command and returns its typed result.
    pub fn perform(
        &mut self,
        menu: &str,
        verb: &str,
        param1: &str,
        param2: &str,
    ) -> Result<CommandOutcome, MenuError> {
        let cmd = MenuCommand {
            menu,
            verb,
            param1,
            param2,
        };
        commands::dispatch(
            &mut self.registry,
            &mut self.backend,
            self.labels.as_ref(),
            self.tray_icon.as_mut(),
            &mut self.use_error_level,
            &cmd,
        )
    }

    /// Executes one command, honoring the error-reporting convention.
    ///
    /// With the convention off, a failure propagates for the host to abort
    /// on. With it on, the failure is logged, recorded in [`Self::last_error`],
    /// and reported as [`CommandOutcome::Failed`] so the script can inspect
    /// the indicator and continue.
    pub fn perform_reporting(
        &mut self,
        menu: &str,
        verb: &str,
        param1: &str,
        param2: &str,
    ) -> Result<CommandOutcome, MenuError> {
        if self.use_error_level {
            self.last_error = false;
        }
        match self.perform(menu, verb, param1, param2) {
            Err(err) if self.use_error_level => {
                warn!(%err, menu, verb, "menu command failed");
                self.last_error = true;
                Ok(CommandOutcome::Failed)
            }
            other => other,
        }
    }
}
