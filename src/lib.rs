//! hostdeck - manage a set of remote hosts from one place.
//!
//! Brings a WireGuard tunnel up and down, wakes machines with Wake-on-LAN
//! magic packets, opens remote desktop sessions, and keeps itself up to date
//! from a release feed.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod error;
pub mod event;
pub mod logger;
pub mod message;
pub mod platform;
pub mod process;
pub mod state;
pub mod update;
pub mod utils;
pub mod vpn;

pub use error::{Error, Result};
