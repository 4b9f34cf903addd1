//! Integration tests for the script-menu host.
//!
//! Commands flow through the real dispatcher against the headless backend,
//! which simulates the platform behaviors the model must survive (cascaded
//! handle invalidation, flat command-id addressing).

use proptest::prelude::*;

use script_menu::app::hosts::{LoggingTrayIcon, StaticLabels};
use script_menu::app::{CommandOutcome, MenuHost};
use script_menu::core::{standard, ItemId, ItemTarget, LabelRef, MenuError, MenuRegistry};
use script_menu::platform::headless::HeadlessBackend;
use script_menu::utils::test_helpers::setup_test_logging;

/// Contains the test infrastructure.
mod helpers {
    use super::*;

    /// `TestHarness` wires a full host (dispatcher, registry, headless
    /// backend) for driving script commands end to end.
    pub struct TestHarness {
        pub host: MenuHost<HeadlessBackend>,
    }

    impl TestHarness {
        pub fn new() -> Self {
            setup_test_logging();
            let host = MenuHost::new(
                HeadlessBackend::new(),
                Box::new(StaticLabels::new(["DoThing", "OpenLabel", "SaveLabel"])),
                Box::<LoggingTrayIcon>::default(),
            );
            Self { host }
        }

        /// Runs one command, returning its raw result.
        pub fn cmd(
            &mut self,
            menu: &str,
            verb: &str,
            param1: &str,
            param2: &str,
        ) -> Result<CommandOutcome, MenuError> {
            self.host.perform(menu, verb, param1, param2)
        }

        /// Runs a command that is expected to succeed.
        pub fn ok(&mut self, menu: &str, verb: &str, param1: &str, param2: &str) -> CommandOutcome {
            self.cmd(menu, verb, param1, param2)
                .unwrap_or_else(|e| panic!("command {menu},{verb},{param1},{param2} failed: {e}"))
        }

        /// Identity of a named item, if present.
        pub fn item_id(&self, menu: &str, item: &str) -> Option<ItemId> {
            let registry = self.host.registry();
            let menu = registry.menu(registry.find(menu)?)?;
            menu.item(menu.find_item(item)?)?.id()
        }

        /// Names of a menu's items, separators included (as empty strings).
        pub fn item_names(&self, menu: &str) -> Vec<String> {
            let registry = self.host.registry();
            let Some(menu) = registry.find(menu).and_then(|id| registry.menu(id)) else {
                return Vec::new();
            };
            menu.items().iter().map(|it| it.name().to_string()).collect()
        }

        /// Rendered native layout of a materialized menu.
        pub fn layout(&self, menu: &str) -> String {
            let registry = self.host.registry();
            let handle = registry
                .find(menu)
                .and_then(|id| registry.menu(id))
                .and_then(|m| m.handle())
                .expect("menu should be materialized");
            self.host.backend().layout(handle)
        }
    }
}

#[test]
fn add_creates_menu_and_items_with_defaults() {
    let mut harness = helpers::TestHarness::new();

    harness.ok("MyMenu", "add", "Open", "OpenLabel");
    harness.ok("MyMenu", "add", "", ""); // separator
    harness.ok("MyMenu", "add", "Save", "SaveLabel");

    let registry = harness.host.registry();
    let menu = registry.menu(registry.find("mymenu").expect("created")).unwrap();
    assert_eq!(menu.items().len(), 3);
    let open = menu.item(0).unwrap();
    assert!(open.enabled());
    assert!(!open.checked());
    assert!(menu.item(1).unwrap().is_separator());
    // Items are addressable case-insensitively.
    harness.ok("MYMENU", "check", "OPEN", "");
    let registry = harness.host.registry();
    let menu = registry.menu(registry.find("MyMenu").unwrap()).unwrap();
    assert!(menu.item(0).unwrap().checked());
}

#[test]
fn non_add_verbs_never_create_menus_or_items() {
    let mut harness = helpers::TestHarness::new();

    assert!(matches!(
        harness.cmd("ghost", "check", "X", ""),
        Err(MenuError::MenuNotFound(_))
    ));
    assert!(harness.host.registry().find("ghost").is_none());

    harness.ok("m", "add", "A", "DoThing");
    assert!(matches!(
        harness.cmd("m", "check", "missing", ""),
        Err(MenuError::ItemNotFound(_))
    ));
    assert_eq!(harness.item_names("m"), vec!["A"]);
}

#[test]
fn dispatcher_failures_are_typed_and_leave_the_model_unchanged() {
    let mut harness = helpers::TestHarness::new();
    harness.ok("m", "add", "A", "DoThing");

    assert!(matches!(
        harness.cmd("m", "frobnicate", "", ""),
        Err(MenuError::InvalidCommand(_))
    ));
    assert!(matches!(
        harness.cmd("m", "add", "B", "NoSuchLabel"),
        Err(MenuError::LabelNotFound(_))
    ));
    assert!(matches!(
        harness.cmd("m", "add", "B", ":NoSuchMenu"),
        Err(MenuError::SubmenuNotFound(_))
    ));
    assert!(matches!(
        harness.cmd("m", "rename", "", "x"),
        Err(MenuError::BlankParameter)
    ));
    assert!(matches!(
        harness.cmd("tray", "delete", "", ""),
        Err(MenuError::TrayMenuProtected)
    ));
    assert!(matches!(
        harness.cmd("m", "tip", "hello", ""),
        Err(MenuError::TrayOnlyCommand(_))
    ));
    assert!(matches!(
        harness.cmd("", "add", "X", "DoThing"),
        Err(MenuError::BlankParameter)
    ));

    // None of the failures touched the model.
    assert_eq!(harness.item_names("m"), vec!["A"]);
}

#[test]
fn rename_collisions_fail_without_mutation() {
    let mut harness = helpers::TestHarness::new();
    harness.ok("m", "add", "Open", "DoThing");
    harness.ok("m", "add", "Close", "DoThing");

    assert!(matches!(
        harness.cmd("m", "rename", "Close", "OPEN"),
        Err(MenuError::NameConflict(_))
    ));
    assert_eq!(harness.item_names("m"), vec!["Open", "Close"]);

    harness.ok("m", "rename", "Close", "Quit");
    assert_eq!(harness.item_names("m"), vec!["Open", "Quit"]);
}

#[test]
fn deleting_a_menu_scrubs_references_everywhere() {
    let mut harness = helpers::TestHarness::new();
    harness.ok("SubM", "add", "Inside", "DoThing");
    harness.ok("Main", "add", "UseSub", ":SubM");
    harness.ok("Main", "add", "Keep", "DoThing");
    harness.ok("Main", "default", "UseSub", "");
    harness.ok("Other", "add", "AlsoSub", ":SubM");

    harness.ok("SubM", "delete", "", "");

    let registry = harness.host.registry();
    assert!(registry.find("SubM").is_none());
    assert_eq!(harness.item_names("Main"), vec!["Keep"]);
    assert_eq!(harness.item_names("Other"), Vec::<String>::new());
    // The removed item held default status; it was cleared along the way.
    let registry = harness.host.registry();
    let main = registry.menu(registry.find("Main").unwrap()).unwrap();
    assert_eq!(main.default_item(), None);
}

#[test]
fn submenu_attachments_reject_cycles() {
    let mut harness = helpers::TestHarness::new();
    harness.ok("C", "add", "leaf", "DoThing");
    harness.ok("B", "add", "toC", ":C");
    harness.ok("A", "add", "toB", ":B");

    // Direct self-reference and transitive ancestry are both conflicts.
    assert!(matches!(
        harness.cmd("A", "add", "self", ":A"),
        Err(MenuError::SelfReferentialSubmenu(_))
    ));
    assert!(matches!(
        harness.cmd("C", "add", "toA", ":A"),
        Err(MenuError::SelfReferentialSubmenu(_))
    ));

    // The legitimate attachment is retrievable from the model.
    let registry = harness.host.registry();
    let a = registry.menu(registry.find("A").unwrap()).unwrap();
    let b = registry.find("B").unwrap();
    assert_eq!(a.item(0).unwrap().submenu(), Some(b));
}

#[test]
fn identities_are_registry_wide_and_freed_ids_are_reclaimed() {
    let mut harness = helpers::TestHarness::new();
    harness.ok("m", "add", "A", "DoThing");
    harness.ok("other", "add", "X", "DoThing");
    harness.ok("m", "add", "B", "DoThing");

    let a = harness.item_id("m", "A").expect("id for A");
    let x = harness.item_id("other", "X").expect("id for X");
    let b = harness.item_id("m", "B").expect("id for B");
    assert!(a != x && a != b && x != b);

    // Deleting A frees its id; the next add may reuse it, and must not
    // collide with any live item anywhere.
    harness.ok("m", "delete", "A", "");
    harness.ok("m", "add", "C", "DoThing");
    let c = harness.item_id("m", "C").expect("id for C");
    assert_eq!(c, a);
    assert!(c != b && c != x);
}

#[test]
fn separator_conversion_releases_identity_and_default_status() {
    let mut harness = helpers::TestHarness::new();
    harness.ok("m", "add", "A", "DoThing");
    harness.ok("m", "add", "B", "DoThing");
    harness.ok("m", "default", "A", "");
    let a = harness.item_id("m", "A").expect("id for A");

    harness.ok("m", "rename", "A", "");

    let registry = harness.host.registry();
    let menu = registry.menu(registry.find("m").unwrap()).unwrap();
    assert!(menu.item(0).unwrap().is_separator());
    assert_eq!(menu.item(0).unwrap().id(), None);
    assert_eq!(menu.default_item(), None);

    // The released id is available for the next item.
    harness.ok("m", "add", "C", "DoThing");
    assert_eq!(harness.item_id("m", "C"), Some(a));
}

#[test]
fn only_the_last_default_survives() {
    let mut harness = helpers::TestHarness::new();
    harness.ok("m", "add", "A", "DoThing");
    harness.ok("m", "add", "B", "DoThing");
    harness.ok("m", "default", "A", "");
    harness.ok("m", "default", "B", "");

    let b = harness.item_id("m", "B");
    let registry = harness.host.registry();
    let menu = registry.menu(registry.find("m").unwrap()).unwrap();
    assert_eq!(menu.default_item(), b);

    harness.ok("m", "show", "", "");
    let layout = harness.layout("m");
    assert!(layout.contains("[B]") && layout.contains("(default)"));
    assert!(!layout.contains("[A] id=100 (default)"));
}

#[test]
fn tray_no_default_falls_back_to_the_standard_primary() {
    let mut harness = helpers::TestHarness::new();
    harness.ok("tray", "standard", "", "");
    harness.ok("tray", "add", "Mine", "DoThing");
    harness.ok("tray", "default", "Mine", "");
    assert!(harness.layout("tray").contains("[Mine] id=100 (default)"));

    harness.ok("tray", "nodefault", "", "");
    let layout = harness.layout("tray");
    let first_line = layout.lines().next().unwrap_or("");
    assert_eq!(
        first_line,
        format!("[&Open] id={} (default)", standard::PRIMARY)
    );
    assert!(!layout.contains("[Mine] id=100 (default)"));
}

#[test]
fn standard_items_append_in_place_and_leave_lazily() {
    let mut harness = helpers::TestHarness::new();
    harness.ok("m", "add", "First", "DoThing");
    harness.ok("m", "standard", "", "");

    // Turned on late: the block lands after the existing user item.
    let layout = harness.layout("m");
    let first_line = layout.lines().next().unwrap_or("");
    assert_eq!(first_line, "[First] id=100");
    assert!(layout.contains("[&Open]"));

    // Turning it off destroys the handle; the next display rebuilds without
    // the block.
    harness.ok("m", "nostandard", "", "");
    {
        let registry = harness.host.registry();
        let menu = registry.menu(registry.find("m").unwrap()).unwrap();
        assert!(menu.handle().is_none());
        assert!(!menu.standard_items_included());
    }
    harness.ok("m", "show", "", "");
    let layout = harness.layout("m");
    assert!(!layout.contains("[&Open]"));
    assert!(layout.contains("[First]"));

    // A replayed handle always puts the block first again.
    harness.ok("n", "add", "", ""); // separator creates the menu
    harness.ok("n", "standard", "", "");
    harness.ok("n", "deleteall", "", ""); // drops the handle, keeps the flag
    harness.ok("n", "add", "Late", "DoThing");
    harness.ok("n", "show", "", "");
    let layout = harness.layout("n");
    let first_line = layout.lines().next().unwrap_or("");
    assert_eq!(first_line, "[&Open] id=1");
    assert!(layout.ends_with("[Late] id=101\n"));
}

#[test]
fn delete_all_defers_recreation_and_clears_the_default() {
    let mut harness = helpers::TestHarness::new();
    harness.ok("m", "add", "A", "DoThing");
    harness.ok("m", "standard", "", "");
    harness.ok("m", "default", "A", "");

    harness.ok("m", "deleteall", "", "");

    let registry = harness.host.registry();
    let menu = registry.menu(registry.find("m").unwrap()).unwrap();
    assert!(menu.handle().is_none());
    assert!(menu.items().is_empty());
    assert_eq!(menu.default_item(), None);
    assert!(menu.standard_items_included());

    // Recreated lazily with just the standard block.
    harness.ok("m", "show", "", "");
    let layout = harness.layout("m");
    assert!(layout.contains("[&Open]"));
    assert!(!layout.contains("[A]"));
}

#[test]
fn show_returns_the_scripted_selection_and_tracks_visibility() {
    let mut harness = helpers::TestHarness::new();
    harness.ok("m", "add", "Pick", "DoThing");
    let id = harness.item_id("m", "Pick").expect("id");

    harness.host.backend_mut().queue_selection(Some(id));
    let outcome = harness.ok("m", "show", "", "");
    assert_eq!(outcome, CommandOutcome::Shown(Some(id)));
    assert!(!harness.host.registry().menu_visible());

    let backend = harness.host.backend();
    assert_eq!(backend.displays(), 1);
    assert_eq!(backend.foreground_activations(), 1);
    assert_eq!(backend.wakeups(), 1);
}

#[test]
fn native_popup_exhaustion_surfaces_as_a_typed_error() {
    let mut harness = helpers::TestHarness::new();
    harness.ok("m", "add", "A", "DoThing");

    harness.host.backend_mut().fail_next_create();
    assert!(matches!(
        harness.cmd("m", "show", "", ""),
        Err(MenuError::ResourceExhausted)
    ));

    // The model is intact and the next display materializes normally.
    {
        let registry = harness.host.registry();
        let menu = registry.menu(registry.find("m").unwrap()).unwrap();
        assert!(menu.handle().is_none());
        assert_eq!(menu.items().len(), 1);
    }
    assert_eq!(harness.ok("m", "show", "", ""), CommandOutcome::Shown(None));
}

#[test]
fn showing_an_empty_menu_is_a_success_noop() {
    let mut harness = helpers::TestHarness::new();
    harness.ok("m", "add", "X", "DoThing");
    harness.ok("m", "delete", "X", "");

    let outcome = harness.ok("m", "show", "", "");
    assert_eq!(outcome, CommandOutcome::Shown(None));
    assert_eq!(harness.host.backend().displays(), 0);
}

#[test]
fn retargeting_between_submenu_and_label_preserves_the_identity() {
    let mut harness = helpers::TestHarness::new();
    harness.ok("A", "add", "inner", "DoThing");
    harness.ok("m", "add", "Sub", ":A");
    let id = harness.item_id("m", "Sub").expect("id");
    harness.ok("m", "show", "", "");

    {
        let registry = harness.host.registry();
        let a = registry.menu(registry.find("A").unwrap()).unwrap();
        assert!(a.handle().is_some(), "submenu materialized with its parent");
    }

    // Submenu -> label: the platform discards the detached submenu handle,
    // and the model notices.
    harness.ok("m", "add", "Sub", "DoThing");
    let registry = harness.host.registry();
    let a = registry.menu(registry.find("A").unwrap()).unwrap();
    assert!(a.handle().is_none(), "detached submenu marked for recreation");
    assert_eq!(harness.item_id("m", "Sub"), Some(id));
    assert!(harness.layout("m").contains(&format!("[Sub] id={id}")));

    // Label -> submenu again, and a repeat of the same target is a no-op.
    harness.ok("m", "add", "Sub", ":A");
    harness.ok("m", "add", "Sub", ":A");
    let registry = harness.host.registry();
    let m = registry.menu(registry.find("m").unwrap()).unwrap();
    assert_eq!(m.item(0).unwrap().submenu(), registry.find("A"));
    assert_eq!(harness.item_id("m", "Sub"), Some(id));
}

#[test]
fn destroy_cascades_through_submenu_chains() {
    setup_test_logging();
    let mut registry = MenuRegistry::new();
    let mut backend = HeadlessBackend::new();

    let top = registry.create_if_absent("top").unwrap();
    let mid = registry.create_if_absent("mid").unwrap();
    let leaf = registry.create_if_absent("leaf").unwrap();
    let id = registry.allocate_identity().unwrap();
    registry
        .add_item(leaf, "l", Some(id), ItemTarget::None, &mut backend)
        .unwrap();
    let id = registry.allocate_identity().unwrap();
    registry
        .add_item(mid, "toLeaf", Some(id), ItemTarget::Submenu(leaf), &mut backend)
        .unwrap();
    let id = registry.allocate_identity().unwrap();
    registry
        .add_item(top, "toMid", Some(id), ItemTarget::Submenu(mid), &mut backend)
        .unwrap();

    registry.materialize(top, &mut backend).unwrap();
    assert!(registry.menu(mid).unwrap().handle().is_some());
    assert!(registry.menu(leaf).unwrap().handle().is_some());

    // Destroying the middle menu invalidates its attached leaf (platform
    // side effect) and the parent that displayed it (stale-content rule).
    registry.destroy_handle(mid, &mut backend).unwrap();
    assert!(registry.menu(top).unwrap().handle().is_none());
    assert!(registry.menu(mid).unwrap().handle().is_none());
    assert!(registry.menu(leaf).unwrap().handle().is_none());
}

#[test]
fn rematerialization_replays_an_identical_layout() {
    setup_test_logging();
    let mut registry = MenuRegistry::new();
    let mut backend = HeadlessBackend::new();

    let x = registry.create_if_absent("x").unwrap();
    let inner = registry.allocate_identity().unwrap();
    registry
        .add_item(x, "Inner", Some(inner), ItemTarget::None, &mut backend)
        .unwrap();

    let m = registry.create_if_absent("m").unwrap();
    registry.add_separator(m, &mut backend).unwrap();
    let open = registry.allocate_identity().unwrap();
    registry
        .add_item(
            m,
            "Open",
            Some(open),
            ItemTarget::Label(LabelRef::new("OpenLabel")),
            &mut backend,
        )
        .unwrap();
    let sub = registry.allocate_identity().unwrap();
    registry
        .add_item(m, "Sub", Some(sub), ItemTarget::Submenu(x), &mut backend)
        .unwrap();

    let first = registry.materialize(m, &mut backend).unwrap();
    let before = backend.layout(first);
    assert_eq!(before, "---\n[Open] id=101\n[Sub] >\n  [Inner] id=100\n");

    registry.destroy_handle(m, &mut backend).unwrap();
    assert!(registry.menu(x).unwrap().handle().is_none());

    let second = registry.materialize(m, &mut backend).unwrap();
    assert_eq!(backend.layout(second), before);
}

#[test]
fn error_level_convention_records_instead_of_propagating() {
    let mut harness = helpers::TestHarness::new();
    harness.ok("tray", "useerrorlevel", "on", "");
    assert!(harness.host.use_error_level());

    let outcome = harness
        .host
        .perform_reporting("ghost", "check", "X", "")
        .expect("failure is absorbed");
    assert_eq!(outcome, CommandOutcome::Failed);
    assert!(harness.host.last_error());

    // A following success resets the indicator.
    harness
        .host
        .perform_reporting("m", "add", "A", "DoThing")
        .expect("success");
    assert!(!harness.host.last_error());

    // With the convention off, failures surface again.
    harness.ok("tray", "useerrorlevel", "off", "");
    assert!(harness
        .host
        .perform_reporting("ghost", "check", "X", "")
        .is_err());
}

#[test]
fn tray_icon_verbs_delegate_to_the_host() {
    setup_test_logging();
    let tray_icon = LoggingTrayIcon::default();
    let state = tray_icon.state();
    let mut host = MenuHost::new(
        HeadlessBackend::new(),
        Box::new(StaticLabels::new(["DoThing"])),
        Box::new(tray_icon),
    );

    host.perform("tray", "tip", "my host", "").unwrap();
    assert_eq!(state.borrow().tooltip.as_deref(), Some("my host"));
    host.perform("tray", "tip", "", "").unwrap();
    assert_eq!(state.borrow().tooltip, None);

    host.perform("tray", "icon", "icons/app.ico", "2").unwrap();
    assert_eq!(
        state.borrow().custom_icon,
        Some(("icons/app.ico".to_string(), 2))
    );
    host.perform("tray", "icon", "*", "").unwrap();
    assert_eq!(state.borrow().custom_icon, None);

    host.perform("tray", "noicon", "", "").unwrap();
    assert!(state.borrow().hidden);
    host.perform("tray", "icon", "", "").unwrap();
    assert!(!state.borrow().hidden);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// For any sequence of add/delete/rename/separator commands, non-empty
    /// item names stay unique case-insensitively among live siblings.
    #[test]
    fn sibling_names_stay_unique(
        ops in proptest::collection::vec((0u8..4, 0usize..5, 0usize..5), 1..40)
    ) {
        const NAMES: [&str; 5] = ["alpha", "Beta", "GAMMA", "delta", "Epsilon"];
        let mut harness = helpers::TestHarness::new();

        for (op, a, b) in ops {
            let name = NAMES[a];
            // Failures (duplicates, missing items) are expected; the model
            // must stay consistent regardless.
            let _ = match op {
                0 => harness.cmd("m", "add", name, "DoThing"),
                1 => harness.cmd("m", "delete", name, ""),
                2 => harness.cmd("m", "rename", name, NAMES[b]),
                _ => harness.cmd("m", "rename", name, ""),
            };

            let mut seen = std::collections::HashSet::new();
            for item_name in harness.item_names("m") {
                if !item_name.is_empty() {
                    prop_assert!(
                        seen.insert(item_name.to_lowercase()),
                        "duplicate sibling name {item_name}"
                    );
                }
            }
        }
    }
}
