//! Interactive line console.
//!
//! Each input line is parsed with clap in multicall mode, turned into a
//! [`Message`] for the [`App`], and new activity log entries are echoed after
//! every event.

use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::fmt::Write as _;
use std::io::Write;

use super::args::{HostEdits, HostFields};
use crate::app::App;
use crate::constants;
use crate::event::{Event, EventHandler};
use crate::logger;
use crate::message::Message;
use crate::state::ConnectionState;

#[derive(Parser, Debug)]
#[command(multicall = true)]
struct ConsoleLine {
    #[command(subcommand)]
    command: ConsoleCommand,
}

/// Console commands
#[derive(Subcommand, Debug)]
enum ConsoleCommand {
    /// Show tunnel, host and update status
    Status,
    /// List hosts
    Hosts,
    /// Choose the host used by `wake` and `rdp`
    Select { name: String },
    /// Add a host: add <name> <ip> <mac> <user>
    Add(HostFields),
    /// Change a host: edit <name> [--name N] [--ip IP] [--mac MAC] [--user U]
    Edit {
        original: String,
        #[command(flatten)]
        edits: HostEdits,
    },
    /// Remove a host
    Remove { name: String },
    /// Set the WireGuard configuration file
    Config { path: String },
    /// Save hosts and settings
    Save,
    /// Bring the tunnel up
    Connect,
    /// Take the tunnel down
    Disconnect,
    /// Connect or disconnect, depending on the current state
    Toggle,
    /// Wake a host (default: selected)
    Wake { host: Option<String> },
    /// Remote desktop to a host (default: selected)
    Rdp { host: Option<String> },
    /// Check for updates
    Check,
    /// Download the available update
    Download,
    /// Install the downloaded update and restart
    Install,
    /// Show the activity log
    Log {
        /// Empty the in-memory log instead
        #[arg(long)]
        clear: bool,
    },
    /// Leave the console
    #[command(alias = "exit")]
    Quit,
}

/// What a console line asks for.
#[derive(Debug)]
pub enum ConsoleAction {
    Send(Message),
    Status,
    Hosts,
    Log,
    /// Text to show as-is (help, parse errors).
    Output(String),
}

/// Splits a line into words. Single or double quotes group words.
pub fn split_words(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err("Unterminated quote.".to_string());
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// Parses one console line. Blank lines yield `None`.
pub fn interpret(line: &str, app: &App) -> Option<ConsoleAction> {
    let words = match split_words(line) {
        Ok(words) if words.is_empty() => return None,
        Ok(words) => words,
        Err(e) => return Some(ConsoleAction::Output(e)),
    };

    let command = match ConsoleLine::try_parse_from(words) {
        Ok(parsed) => parsed.command,
        Err(e) => return Some(ConsoleAction::Output(e.render().to_string())),
    };

    let action = match command {
        ConsoleCommand::Status => ConsoleAction::Status,
        ConsoleCommand::Hosts => ConsoleAction::Hosts,
        ConsoleCommand::Select { name } => ConsoleAction::Send(Message::SelectHost(name)),
        ConsoleCommand::Add(fields) => match fields.to_profile() {
            Ok(host) => ConsoleAction::Send(Message::AddHost(host)),
            Err(e) => ConsoleAction::Output(e.to_string()),
        },
        ConsoleCommand::Edit { original, edits } => {
            let Some(current) = app.settings.host(&original) else {
                return Some(ConsoleAction::Output(format!("Host not found: {original}")));
            };
            match edits.apply(current) {
                Ok(host) => ConsoleAction::Send(Message::UpdateHost { original, host }),
                Err(e) => ConsoleAction::Output(e.to_string()),
            }
        }
        ConsoleCommand::Remove { name } => ConsoleAction::Send(Message::RemoveHost(name)),
        ConsoleCommand::Config { path } => ConsoleAction::Send(Message::SetConfigPath(path)),
        ConsoleCommand::Save => ConsoleAction::Send(Message::Save),
        ConsoleCommand::Connect => ConsoleAction::Send(Message::Connect),
        ConsoleCommand::Disconnect => ConsoleAction::Send(Message::Disconnect),
        ConsoleCommand::Toggle => ConsoleAction::Send(Message::ToggleVpn),
        ConsoleCommand::Wake { host } => ConsoleAction::Send(Message::Wake(host)),
        ConsoleCommand::Rdp { host } => ConsoleAction::Send(Message::LaunchRdp(host)),
        ConsoleCommand::Check => ConsoleAction::Send(Message::CheckUpdates),
        ConsoleCommand::Download => ConsoleAction::Send(Message::DownloadUpdate),
        ConsoleCommand::Install => ConsoleAction::Send(Message::InstallUpdate),
        ConsoleCommand::Log { clear: true } => ConsoleAction::Send(Message::ClearLogs),
        ConsoleCommand::Log { clear: false } => ConsoleAction::Log,
        ConsoleCommand::Quit => ConsoleAction::Send(Message::Quit),
    };
    Some(action)
}

/// Multi-line status summary.
pub fn status_text(app: &App) -> String {
    let mut out = String::new();

    let vpn = match &app.session.state {
        ConnectionState::Connected { since } => {
            format!("Connected ({}s)", since.elapsed().as_secs())
        }
        other => other.label().to_string(),
    };
    let _ = writeln!(out, "VPN:     {vpn}");
    if !app.session.last_message.is_empty() {
        let _ = writeln!(out, "         {}", app.session.last_message.trim_end());
    }

    let config = if app.settings.wireguard_config_path.is_empty() {
        "(not set)"
    } else {
        app.settings.wireguard_config_path.as_str()
    };
    let _ = writeln!(out, "Config:  {config}");

    let host = app
        .selected_host
        .as_deref()
        .and_then(|name| app.settings.host(name))
        .map_or_else(
            || "(none)".to_string(),
            |h| format!("{} ({}, {})", h.name, h.ip_address, h.mac_address),
        );
    let _ = writeln!(out, "Host:    {host}");

    let update = if let Some(transfer) = &app.transfer {
        match transfer.percent() {
            Some(pct) => format!("downloading {pct}%"),
            None => format!("downloading {} bytes", transfer.downloaded_bytes),
        }
    } else if app.checking_update {
        "checking...".to_string()
    } else if let Some(path) = &app.downloaded_update {
        format!("downloaded to {}, ready to install", path.display())
    } else if let Some(release) = &app.available_update {
        format!("{} available", release.latest_version)
    } else {
        constants::CURRENT_VERSION.to_string()
    };
    let _ = writeln!(out, "Update:  {update}");

    if app.dirty {
        let _ = writeln!(out, "Unsaved changes. Type 'save' to keep them.");
    }
    out
}

/// Host table with the selection marked.
pub fn hosts_text(app: &App) -> String {
    if app.settings.hosts.is_empty() {
        return "No hosts. Add one with: add <name> <ip> <mac> <user>\n".to_string();
    }
    let mut out = String::new();
    for host in &app.settings.hosts {
        let marker = if app.selected_host.as_deref() == Some(host.name.as_str()) {
            '*'
        } else {
            ' '
        };
        let _ = writeln!(
            out,
            "{marker} {:<20} {:<16} {:<18} {}",
            host.name, host.ip_address, host.mac_address, host.rdp_user
        );
    }
    out
}

fn print_new_logs<W: Write>(out: &mut W, seen: &mut u64) -> Result<usize> {
    let entries = logger::get_logs_since(*seen);
    for entry in &entries {
        writeln!(out, "{entry}")?;
        *seen = entry.seq;
    }
    Ok(entries.len())
}

fn prompt<W: Write>(out: &mut W) -> Result<()> {
    write!(out, "> ")?;
    out.flush()?;
    Ok(())
}

/// Runs the console until `quit`, end of input, or an update handoff.
///
/// # Errors
///
/// Returns an error if output cannot be written or the event source dies.
pub fn run<W: Write>(app: &mut App, events: &EventHandler, out: &mut W) -> Result<()> {
    let mut seen = 0u64;
    let mut last_decile: Option<u8> = None;

    writeln!(
        out,
        "{} {}. Type 'help' for commands.",
        constants::APP_NAME,
        constants::CURRENT_VERSION
    )?;
    print_new_logs(out, &mut seen)?;
    prompt(out)?;

    while !app.should_quit {
        match events.next()? {
            Event::Input(line) => {
                match interpret(&line, app) {
                    Some(ConsoleAction::Send(msg)) => app.handle_message(msg),
                    Some(ConsoleAction::Status) => write!(out, "{}", status_text(app))?,
                    Some(ConsoleAction::Hosts) => write!(out, "{}", hosts_text(app))?,
                    Some(ConsoleAction::Log) => {
                        for entry in logger::get_logs() {
                            writeln!(out, "{entry}")?;
                        }
                    }
                    Some(ConsoleAction::Output(text)) => writeln!(out, "{}", text.trim_end())?,
                    None => {}
                }
                app.process_external();
                print_new_logs(out, &mut seen)?;
                if !app.should_quit {
                    prompt(out)?;
                }
            }
            Event::Tick => {
                app.process_external();
                let mut printed = print_new_logs(out, &mut seen)?;

                let decile = app.transfer.as_ref().and_then(|t| t.percent()).map(|p| p / 10);
                if decile.is_some() && decile != last_decile {
                    if let Some(pct) = app.transfer.as_ref().and_then(|t| t.percent()) {
                        writeln!(out, "Download progress: {pct}%")?;
                        printed += 1;
                    }
                }
                last_decile = decile;

                if printed > 0 && !app.should_quit {
                    prompt(out)?;
                }
            }
            Event::Eof => {
                writeln!(out)?;
                app.handle_message(Message::Quit);
            }
        }
    }

    if app.busy() && !app.handoff_ready() {
        writeln!(out, "Waiting for running operations to finish...")?;
        app.wait_idle();
    }
    print_new_logs(out, &mut seen)?;
    Ok(())
}
