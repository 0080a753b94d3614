use statusboard_core::{
    Config, Density, Error, Group, GroupId, ItemKey, RefreshInterval, StatusFilter,
};

use crate::logging::{LogLevel, LogStore, ReloadHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Dashboard,
    Logs,
}

#[derive(Debug, Clone)]
pub enum Message {
    Tick,
    Reload,
    TopologyLoaded {
        run_id: u64,
        result: Result<Vec<Group>, LoadErrorInfo>,
    },
    SelectGroup(GroupId),
    NameChanged(String),
    ClearName,
    StatusChanged(StatusFilter),
    DensityChanged(Density),
    RefreshChanged(RefreshInterval),
    RefreshItem(ItemKey),
    SelectTab(Tab),
    LogLevelChanged(LogLevel),
    ToggleTarget(String, bool),
}

/// Both renderings of a topology load failure, carried back to `update`.
#[derive(Debug, Clone)]
pub struct LoadErrorInfo {
    pub(crate) summary: String,
    pub(crate) detail: String,
}

impl From<Error> for LoadErrorInfo {
    fn from(error: Error) -> Self {
        Self {
            summary: error.user_summary(),
            detail: error.technical_detail(),
        }
    }
}

pub struct Flags {
    pub log_store: LogStore,
    pub reload_handle: ReloadHandle,
    pub config: Config,
}
