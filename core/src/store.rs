use tracing::{debug, info, warn};

use crate::api::MonitorApi;
use crate::model::{Group, GroupId};
use crate::{targets, Error};

/// Snapshot of the monitored topology.
///
/// At most one of `loading` and `error` is set, and `selected` is either
/// `None` or the id of a group in `data`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupStoreState {
    pub data: Option<Vec<Group>>,
    pub selected: Option<GroupId>,
    pub loading: bool,
    pub error: Option<String>,
}

impl GroupStoreState {
    pub fn groups(&self) -> &[Group] {
        self.data.as_deref().unwrap_or_default()
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups().iter().find(|group| group.id == id)
    }

    pub fn selected_group(&self) -> Option<&Group> {
        self.selected.and_then(|id| self.group(id))
    }

    pub fn is_selected(&self, id: GroupId) -> bool {
        self.selected == Some(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupAction {
    Select(GroupId),
    Data(Vec<Group>),
    Loading,
    Error(String),
}

#[derive(Debug, Default)]
pub struct GroupStore {
    state: GroupStoreState,
}

impl GroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GroupStoreState {
        &self.state
    }

    pub fn apply(&mut self, action: GroupAction) {
        match action {
            GroupAction::Select(id) => {
                self.state.selected = Some(id);
                self.state.loading = false;
                self.state.error = None;
            }
            GroupAction::Data(groups) => {
                self.state.selected = groups.first().map(|group| group.id);
                self.state.data = Some(groups);
                self.state.loading = false;
                self.state.error = None;
            }
            GroupAction::Loading => {
                self.state.loading = true;
                self.state.error = None;
            }
            GroupAction::Error(message) => {
                self.state.data = None;
                self.state.selected = None;
                self.state.loading = false;
                self.state.error = Some(message);
            }
        }
    }

    /// Selects a group of the current topology. Unknown ids are ignored so
    /// `selected` never points outside `data`.
    pub fn select(&mut self, id: GroupId) -> bool {
        if self.state.group(id).is_none() {
            warn!(target: targets::TOPOLOGY, group = %id, "ignoring selection of unknown group");
            return false;
        }
        self.apply(GroupAction::Select(id));
        debug!(target: targets::TOPOLOGY, group = %id, "group selected");
        true
    }

    pub fn begin_load(&mut self) {
        self.apply(GroupAction::Loading);
        debug!(target: targets::TOPOLOGY, "topology load started");
    }

    /// Commits a load result. Returns true when the topology was replaced.
    pub fn finish_load(&mut self, result: Result<Vec<Group>, Error>) -> bool {
        match result {
            Ok(groups) => {
                self.complete_load(groups);
                true
            }
            Err(error) => {
                warn!(target: targets::TOPOLOGY, "{}", error.technical_detail());
                self.fail_load(error.user_summary());
                false
            }
        }
    }

    pub fn complete_load(&mut self, groups: Vec<Group>) {
        let count = groups.len();
        self.apply(GroupAction::Data(groups));
        info!(
            target: targets::TOPOLOGY,
            groups = count,
            selected = ?self.state.selected,
            "topology loaded"
        );
    }

    pub fn fail_load(&mut self, message: String) {
        self.apply(GroupAction::Error(message));
    }

    pub async fn load(&mut self, api: &dyn MonitorApi) -> bool {
        self.begin_load();
        let result = api.fetch_groups().await;
        self.finish_load(result)
    }
}
