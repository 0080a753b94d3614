use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::model::{ItemKey, ItemState, ItemStatus, Server};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ItemState),
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 4] = [
        StatusFilter::All,
        StatusFilter::Only(ItemState::Connecting),
        StatusFilter::Only(ItemState::Online),
        StatusFilter::Only(ItemState::Offline),
    ];

    pub fn matches(self, state: ItemState) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == state,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("All"),
            StatusFilter::Only(state) => f.write_str(state.label()),
        }
    }
}

/// Display density of the item grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Density {
    #[default]
    Normal,
    Small,
}

impl Density {
    pub const ALL: [Density; 2] = [Density::Normal, Density::Small];

    pub fn columns(self) -> usize {
        match self {
            Density::Normal => 4,
            Density::Small => 6,
        }
    }

    pub fn padding(self) -> u16 {
        match self {
            Density::Normal => 16,
            Density::Small => 8,
        }
    }
}

impl fmt::Display for Density {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Density::Normal => f.write_str("Normal"),
            Density::Small => f.write_str("Small"),
        }
    }
}

/// Poll cadence shared by every active item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefreshInterval {
    millis: u64,
}

impl RefreshInterval {
    pub const PRESETS: [RefreshInterval; 6] = [
        RefreshInterval::from_millis(15_000),
        RefreshInterval::from_millis(30_000),
        RefreshInterval::from_millis(60_000),
        RefreshInterval::from_millis(300_000),
        RefreshInterval::from_millis(900_000),
        RefreshInterval::from_millis(1_800_000),
    ];

    pub const fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    pub fn millis(self) -> u64 {
        self.millis
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_millis(self.millis)
    }
}

impl Default for RefreshInterval {
    fn default() -> Self {
        RefreshInterval::from_millis(30_000)
    }
}

impl fmt::Display for RefreshInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self.millis;
        if millis >= 60_000 && millis % 60_000 == 0 {
            write!(f, "{} min", millis / 60_000)
        } else if millis >= 1_000 && millis % 1_000 == 0 {
            write!(f, "{} sec", millis / 1_000)
        } else {
            write!(f, "{millis} ms")
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    /// Case-sensitive substring of the server name; empty matches everything.
    pub name: String,
    pub status: StatusFilter,
    pub size: Density,
    pub time: RefreshInterval,
}

impl Filter {
    pub fn interval(&self) -> Duration {
        self.time.as_duration()
    }

    pub fn admits(&self, server: &Server, state: ItemState) -> bool {
        server.name.contains(self.name.as_str()) && self.status.matches(state)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleItem {
    pub key: ItemKey,
    pub server: Server,
    pub status: ItemStatus,
}

/// Derives the visible subset of `items` in source order.
///
/// An item without a status record is treated as `Connecting`, the state it
/// holds before its first probe resolves.
pub fn visible(
    items: &[Server],
    statuses: &HashMap<ItemKey, ItemStatus>,
    filter: &Filter,
) -> Vec<VisibleItem> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, server)| {
            let key = ItemKey(index);
            let status = statuses.get(&key).copied().unwrap_or_default();
            filter.admits(server, status.state).then(|| VisibleItem {
                key,
                server: server.clone(),
                status,
            })
        })
        .collect()
}
