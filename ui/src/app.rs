mod styles;
mod types;
mod views;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use iced::{Application, Command, Element, Subscription, Theme};
use tracing::{debug, info, warn};

use statusboard_core::{
    targets, Config, DashboardView, Filter, Group, GroupStore, HttpMonitorApi, MonitorApi,
    MonitorController,
};

use crate::logging::{apply_log_level, LogEntry, LogLevel, LogStore, ReloadHandle};

pub use types::{Flags, LoadErrorInfo, Message, Tab};

/// How often the dashboard re-reads live statuses and captured logs.
const VIEW_TICK: Duration = Duration::from_millis(250);

pub struct DashboardApp {
    log_store: LogStore,
    reload_handle: ReloadHandle,
    log_entries: Vec<LogEntry>,
    log_level: LogLevel,
    known_targets: HashSet<String>,
    enabled_targets: HashSet<String>,
    config: Config,
    controller: MonitorController,
    dashboard: DashboardView,
    active_tab: Tab,
}

impl Application for DashboardApp {
    type Executor = crate::executor::DashboardExecutor;
    type Message = Message;
    type Theme = Theme;
    type Flags = Flags;

    fn new(flags: Flags) -> (Self, Command<Message>) {
        let api: Arc<dyn MonitorApi> = Arc::new(HttpMonitorApi::from_config(&flags.config));
        let filter = Filter {
            time: flags.config.refresh_interval(),
            ..Filter::default()
        };
        let controller = MonitorController::new(api, GroupStore::new(), filter);
        let known_targets: HashSet<String> =
            targets::ALL.iter().map(|value| value.to_string()).collect();
        let enabled_targets = known_targets.clone();

        let mut app = Self {
            log_store: flags.log_store,
            reload_handle: flags.reload_handle,
            log_entries: Vec::new(),
            log_level: LogLevel::default(),
            known_targets,
            enabled_targets,
            config: flags.config,
            controller,
            dashboard: DashboardView::Idle,
            active_tab: Tab::Dashboard,
        };
        let command = app.start_load();
        (app, command)
    }

    fn title(&self) -> String {
        self.config.display_name.clone()
    }

    fn update(&mut self, message: Message) -> Command<Message> {
        let command = match message {
            Message::Tick => {
                self.refresh_logs();
                Command::none()
            }
            Message::Reload => self.start_load(),
            Message::TopologyLoaded { run_id, result } => {
                self.finish_load(run_id, result);
                Command::none()
            }
            Message::SelectGroup(id) => {
                self.controller.select_group(id);
                Command::none()
            }
            Message::NameChanged(value) => {
                self.controller.set_name_filter(value);
                Command::none()
            }
            Message::ClearName => {
                self.controller.clear_name_filter();
                Command::none()
            }
            Message::StatusChanged(status) => {
                self.controller.set_status_filter(status);
                Command::none()
            }
            Message::DensityChanged(size) => {
                self.controller.set_density(size);
                Command::none()
            }
            Message::RefreshChanged(time) => {
                self.controller.set_refresh(time);
                Command::none()
            }
            Message::RefreshItem(key) => {
                if !self.controller.refresh_item(key) {
                    debug!(target: targets::UI, key = %key, "refresh requested for inactive item");
                }
                Command::none()
            }
            Message::SelectTab(tab) => {
                self.active_tab = tab;
                Command::none()
            }
            Message::LogLevelChanged(level) => {
                self.log_level = level;
                apply_log_level(&self.reload_handle, level);
                info!(target: targets::UI, level = %level, "log level changed");
                Command::none()
            }
            Message::ToggleTarget(target, enabled) => {
                if enabled {
                    self.enabled_targets.insert(target);
                } else {
                    self.enabled_targets.remove(&target);
                }
                Command::none()
            }
        };

        self.dashboard = self.controller.view();
        command
    }

    fn subscription(&self) -> Subscription<Message> {
        iced::time::every(VIEW_TICK).map(|_| Message::Tick)
    }

    fn view(&self) -> Element<'_, Message> {
        self.root_view()
    }
}

impl DashboardApp {
    fn refresh_logs(&mut self) {
        let entries = self.log_store.snapshot();
        for entry in &entries {
            if self.known_targets.insert(entry.target.clone()) {
                self.enabled_targets.insert(entry.target.clone());
            }
        }
        self.log_entries = entries;
    }

    fn sorted_targets(&self) -> Vec<String> {
        let mut targets: Vec<String> = self.known_targets.iter().cloned().collect();
        targets.sort();
        targets
    }

    fn visible_entries(&self) -> Vec<&LogEntry> {
        self.log_entries
            .iter()
            .filter(|entry| self.enabled_targets.contains(&entry.target))
            .collect()
    }

    /// Fetches the topology unless a fetch is already in flight.
    fn start_load(&mut self) -> Command<Message> {
        if self.controller.is_loading() {
            debug!(target: targets::UI, "topology load already in flight");
            return Command::none();
        }

        let run_id = self.controller.begin_load();
        self.dashboard = self.controller.view();
        let api = self.controller.api();

        Command::perform(
            async move { api.fetch_groups().await.map_err(LoadErrorInfo::from) },
            move |result| Message::TopologyLoaded { run_id, result },
        )
    }

    fn finish_load(&mut self, run_id: u64, result: Result<Vec<Group>, LoadErrorInfo>) {
        if !self.controller.claim_load(run_id) {
            return;
        }
        match result {
            Ok(groups) => self.controller.complete_load(groups),
            Err(error) => {
                warn!(target: targets::TOPOLOGY, "{}", error.detail);
                self.controller.fail_load(error.summary);
            }
        }
    }
}
