//! Host-side services: settings persistence, Wake-on-LAN and remote desktop.

pub mod rdp;
pub mod store;
pub mod wol;
