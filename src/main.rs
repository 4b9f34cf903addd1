use std::io::{self, BufRead, Write};

use script_menu::app::hosts::{LoggingTrayIcon, PermissiveLabels};
use script_menu::app::{CommandOutcome, MenuHost};
use script_menu::config::HostConfig;

#[cfg(target_os = "macos")]
use script_menu::platform::macos::CocoaMenuBackend as HostBackend;
#[cfg(not(target_os = "macos"))]
use script_menu::platform::headless::HeadlessBackend as HostBackend;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let config = HostConfig::load().unwrap_or_default();

    let mut host = MenuHost::new(
        HostBackend::new(),
        Box::new(PermissiveLabels),
        Box::<LoggingTrayIcon>::default(),
    );
    host.set_use_error_level(config.use_error_level);
    if config.tray_standard_items {
        host.perform("tray", "standard", "", "")?;
    }
    if let Some(tip) = &config.tray_tooltip {
        host.perform("tray", "tip", tip, "")?;
    }

    println!("script-menu host. Commands: <menu>, <verb>[, <param1>[, <param2>]]");
    println!("Example: mymenu, add, Open, OpenLabel  |  mymenu, show  |  exit");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        let mut fields = line.splitn(4, ',').map(str::trim);
        let menu = fields.next().unwrap_or("");
        let verb = fields.next().unwrap_or("");
        let param1 = fields.next().unwrap_or("");
        let param2 = fields.next().unwrap_or("");

        match host.perform_reporting(menu, verb, param1, param2) {
            Ok(CommandOutcome::Completed) => {}
            Ok(CommandOutcome::Shown(Some(id))) => println!("picked item id {id}"),
            Ok(CommandOutcome::Shown(None)) => println!("menu dismissed"),
            Ok(CommandOutcome::Failed) => println!("command failed (error level set)"),
            Err(err) => println!("error: {err}"),
        }
    }
    Ok(())
}
