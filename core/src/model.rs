use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

pub type EpochSeconds = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub i64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One monitored endpoint. `url` is `host:port` without a scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub name: String,
    pub url: String,
}

impl Server {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub servers: Vec<Server>,
}

impl Group {
    pub fn new(id: i64, name: impl Into<String>, servers: Vec<Server>) -> Self {
        Self {
            id: GroupId(id),
            name: name.into(),
            servers,
        }
    }
}

/// Position of a server inside the active group's server sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey(pub usize);

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ItemState {
    #[default]
    Connecting,
    Online,
    Offline,
}

impl ItemState {
    pub const ALL: [ItemState; 3] = [ItemState::Connecting, ItemState::Online, ItemState::Offline];

    pub fn label(self) -> &'static str {
        match self {
            ItemState::Connecting => "Connecting...",
            ItemState::Online => "Online",
            ItemState::Offline => "Offline",
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemStatus {
    pub state: ItemState,
    /// When the latest committed probe resolved; `None` before the first one.
    pub last_checked: Option<EpochSeconds>,
}

impl ItemStatus {
    pub fn connecting() -> Self {
        Self::default()
    }
}

pub fn now_epoch_seconds() -> EpochSeconds {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_list_decodes_from_service_json() {
        let body = r#"[
            {"id": 1, "name": "G1", "servers": [{"name": "S1", "url": "h:1"}]},
            {"id": 7, "name": "Empty", "servers": []}
        ]"#;

        let groups: Vec<Group> = serde_json::from_str(body).expect("decode groups");

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].id, GroupId(1));
        assert_eq!(groups[0].servers[0], Server::new("S1", "h:1"));
        assert!(groups[1].servers.is_empty());
    }

    #[test]
    fn group_without_servers_field_is_rejected() {
        let body = r#"[{"id": 1, "name": "G1"}]"#;
        assert!(serde_json::from_str::<Vec<Group>>(body).is_err());
    }

    #[test]
    fn new_item_status_is_connecting_and_unchecked() {
        let status = ItemStatus::connecting();
        assert_eq!(status.state, ItemState::Connecting);
        assert_eq!(status.last_checked, None);
    }
}
