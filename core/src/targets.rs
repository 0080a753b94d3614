//! Log targets shared by every crate in the workspace.

pub const TOPOLOGY: &str = "statusboard::topology";
pub const POLLING: &str = "statusboard::polling";
pub const PROBE: &str = "statusboard::probe";
pub const CONFIG: &str = "statusboard::config";
pub const UI: &str = "statusboard::ui";

pub const ALL: [&str; 5] = [TOPOLOGY, POLLING, PROBE, CONFIG, UI];
