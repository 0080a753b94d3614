//! Composition of topology, pollers, classification and filtering.
//!
//! The controller owns the active item set: the servers of the selected
//! group, one status record and one poller per server. Any topology change
//! retires the whole set before the next one is built, and every build runs
//! under a fresh lease so results from retired probes can never land on the
//! new items.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, trace};

use crate::api::MonitorApi;
use crate::classify::{classify, ProbeOutcome};
use crate::filter::{visible, Density, Filter, RefreshInterval, StatusFilter, VisibleItem};
use crate::model::{now_epoch_seconds, EpochSeconds, Group, GroupId, ItemKey, ItemState, ItemStatus, Server};
use crate::scheduler::{probe_task, PollingScheduler, ProbeTask};
use crate::store::{GroupStore, GroupStoreState};
use crate::{targets, Error};

#[derive(Debug)]
struct BoardEntry {
    lease: u64,
    issued: u64,
    status: ItemStatus,
}

/// Live status of every active item.
///
/// A record is only written by the probe that was issued last for its key,
/// and only while the key is still registered under the probe's lease.
#[derive(Debug, Default)]
pub struct StatusBoard {
    entries: HashMap<ItemKey, BoardEntry>,
}

impl StatusBoard {
    pub fn status(&self, key: ItemKey) -> Option<ItemStatus> {
        self.entries.get(&key).map(|entry| entry.status)
    }

    pub fn statuses(&self) -> HashMap<ItemKey, ItemStatus> {
        self.entries
            .iter()
            .map(|(key, entry)| (*key, entry.status))
            .collect()
    }

    fn register(&mut self, key: ItemKey, lease: u64) {
        self.entries.insert(
            key,
            BoardEntry {
                lease,
                issued: 0,
                status: ItemStatus::connecting(),
            },
        );
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    /// Marks `key` Connecting and hands out the probe's sequence number.
    fn issue(&mut self, key: ItemKey, lease: u64) -> Option<u64> {
        let entry = self.entries.get_mut(&key).filter(|entry| entry.lease == lease)?;
        entry.issued += 1;
        entry.status.state = ItemState::Connecting;
        Some(entry.issued)
    }

    fn commit(
        &mut self,
        key: ItemKey,
        lease: u64,
        sequence: u64,
        state: ItemState,
        checked_at: EpochSeconds,
    ) -> bool {
        match self.entries.get_mut(&key) {
            Some(entry) if entry.lease == lease && entry.issued == sequence => {
                entry.status = ItemStatus {
                    state,
                    last_checked: Some(checked_at),
                };
                true
            }
            _ => false,
        }
    }
}

fn lock_board(board: &Mutex<StatusBoard>) -> MutexGuard<'_, StatusBoard> {
    board.lock().unwrap_or_else(PoisonError::into_inner)
}

/// What the presentation layer should show in the item area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardView {
    Idle,
    Loading,
    Failed(String),
    NoData,
    Items(Vec<VisibleItem>),
}

pub struct MonitorController {
    api: Arc<dyn MonitorApi>,
    store: GroupStore,
    filter: Filter,
    board: Arc<Mutex<StatusBoard>>,
    scheduler: PollingScheduler<ItemKey>,
    active: Vec<Server>,
    epoch: u64,
    load_run: u64,
    load_in_flight: bool,
}

impl MonitorController {
    pub fn new(api: Arc<dyn MonitorApi>, store: GroupStore, filter: Filter) -> Self {
        Self {
            api,
            store,
            filter,
            board: Arc::new(Mutex::new(StatusBoard::default())),
            scheduler: PollingScheduler::new(),
            active: Vec::new(),
            epoch: 0,
            load_run: 0,
            load_in_flight: false,
        }
    }

    pub fn api(&self) -> Arc<dyn MonitorApi> {
        Arc::clone(&self.api)
    }

    pub fn groups_state(&self) -> &GroupStoreState {
        self.store.state()
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn active_servers(&self) -> &[Server] {
        &self.active
    }

    pub fn active_item_count(&self) -> usize {
        self.scheduler.len()
    }

    pub fn item_status(&self, key: ItemKey) -> Option<ItemStatus> {
        lock_board(&self.board).status(key)
    }

    pub fn statuses(&self) -> HashMap<ItemKey, ItemStatus> {
        lock_board(&self.board).statuses()
    }

    pub async fn load(&mut self) {
        let run_id = self.begin_load();
        let api = Arc::clone(&self.api);
        let result = api.fetch_groups().await;
        self.finish_load_run(run_id, result);
    }

    /// True from `begin_load` until its fetch resolves. Unlike the store's
    /// `loading` flag this survives a group selection made meanwhile.
    pub fn is_loading(&self) -> bool {
        self.load_in_flight
    }

    /// Starts a topology fetch and returns its run id.
    pub fn begin_load(&mut self) -> u64 {
        self.load_run = self.load_run.wrapping_add(1);
        self.load_in_flight = true;
        self.store.begin_load();
        self.load_run
    }

    /// Claims the result of fetch `run_id`. False for a superseded run,
    /// whose result must be dropped.
    pub fn claim_load(&mut self, run_id: u64) -> bool {
        if run_id != self.load_run || !self.load_in_flight {
            debug!(
                target: targets::TOPOLOGY,
                run_id,
                current = self.load_run,
                "stale topology load discarded"
            );
            return false;
        }
        self.load_in_flight = false;
        true
    }

    pub fn finish_load_run(&mut self, run_id: u64, result: Result<Vec<Group>, Error>) -> bool {
        if !self.claim_load(run_id) {
            return false;
        }
        self.finish_load(result);
        true
    }

    pub fn finish_load(&mut self, result: Result<Vec<Group>, Error>) {
        self.load_in_flight = false;
        match result {
            Ok(groups) => self.complete_load(groups),
            Err(error) => {
                self.store.finish_load(Err(error));
                self.retire_items();
            }
        }
    }

    pub fn complete_load(&mut self, groups: Vec<Group>) {
        self.load_in_flight = false;
        self.store.complete_load(groups);
        self.activate_selected();
    }

    pub fn fail_load(&mut self, message: String) {
        self.load_in_flight = false;
        self.store.fail_load(message);
        self.retire_items();
    }

    /// Switches to `id` and restarts classification for its servers.
    pub fn select_group(&mut self, id: GroupId) -> bool {
        if !self.store.select(id) {
            return false;
        }
        self.activate_selected();
        true
    }

    pub fn set_name_filter(&mut self, name: impl Into<String>) {
        self.filter.name = name.into();
    }

    pub fn clear_name_filter(&mut self) {
        self.filter.name.clear();
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.filter.status = status;
    }

    pub fn set_density(&mut self, size: Density) {
        self.filter.size = size;
    }

    /// Changes the shared cadence. Displayed states are left as they are.
    pub fn set_refresh(&mut self, time: RefreshInterval) {
        if self.filter.time == time {
            return;
        }
        self.filter.time = time;
        self.scheduler.reschedule_all(self.filter.interval());
        info!(
            target: targets::POLLING,
            interval_ms = time.millis(),
            items = self.scheduler.len(),
            "poll interval changed"
        );
    }

    /// Probes one active item right away.
    pub fn refresh_item(&self, key: ItemKey) -> bool {
        self.scheduler.fire(&key)
    }

    pub fn visible_items(&self) -> Vec<VisibleItem> {
        let statuses = self.statuses();
        visible(&self.active, &statuses, &self.filter)
    }

    pub fn view(&self) -> DashboardView {
        let state = self.store.state();
        if state.loading {
            return DashboardView::Loading;
        }
        if let Some(error) = &state.error {
            return DashboardView::Failed(error.clone());
        }
        if state.data.is_none() {
            return DashboardView::Idle;
        }
        if state.selected_group().is_none() || self.active.is_empty() {
            return DashboardView::NoData;
        }

        // may be empty when the filter hides every item
        DashboardView::Items(self.visible_items())
    }

    pub fn shutdown(&mut self) {
        self.retire_items();
    }

    fn retire_items(&mut self) {
        self.scheduler.stop_all();
        lock_board(&self.board).clear();
        self.active.clear();
    }

    fn activate_selected(&mut self) {
        self.retire_items();

        let Some(group) = self.store.state().selected_group() else {
            debug!(target: targets::POLLING, "no group selected, nothing to poll");
            return;
        };
        let servers = group.servers.clone();
        let group_id = group.id;

        self.epoch = self.epoch.wrapping_add(1);
        let lease = self.epoch;
        {
            let mut board = lock_board(&self.board);
            for index in 0..servers.len() {
                board.register(ItemKey(index), lease);
            }
        }

        let interval = self.filter.interval();
        for (index, server) in servers.iter().enumerate() {
            let key = ItemKey(index);
            let task = self.probe_for(key, lease, server.url.clone());
            self.scheduler.start(key, interval, task);
        }

        info!(
            target: targets::POLLING,
            group = %group_id,
            items = servers.len(),
            epoch = lease,
            "group activated"
        );
        self.active = servers;
    }

    fn probe_for(&self, key: ItemKey, lease: u64, url: String) -> ProbeTask {
        let api = Arc::clone(&self.api);
        let board = Arc::clone(&self.board);
        probe_task(move || run_probe(Arc::clone(&api), Arc::clone(&board), key, lease, url.clone()))
    }
}

impl Drop for MonitorController {
    fn drop(&mut self) {
        self.retire_items();
    }
}

async fn run_probe(
    api: Arc<dyn MonitorApi>,
    board: Arc<Mutex<StatusBoard>>,
    key: ItemKey,
    lease: u64,
    url: String,
) {
    let issued = lock_board(&board).issue(key, lease);
    let Some(sequence) = issued else {
        trace!(target: targets::PROBE, key = %key, url = %url, "item retired, probe skipped");
        return;
    };

    let outcome = api.ping(&url).await;
    let state = classify(&outcome);
    if let ProbeOutcome::Failed(details) = &outcome {
        debug!(target: targets::PROBE, key = %key, url = %url, details = %details, "probe failed");
    }

    let committed = lock_board(&board).commit(key, lease, sequence, state, now_epoch_seconds());
    if committed {
        debug!(target: targets::PROBE, key = %key, url = %url, state = %state, "status updated");
    } else {
        trace!(target: targets::PROBE, key = %key, url = %url, sequence, "stale probe result discarded");
    }
}
