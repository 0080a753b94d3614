pub mod api;
pub mod classify;
pub mod config;
pub mod controller;
pub mod error;
pub mod filter;
pub mod model;
pub mod scheduler;
pub mod store;
pub mod targets;

pub use api::{ApiFuture, HttpMonitorApi, MockMonitorApi, MonitorApi};
pub use classify::{classify, is_truthy, ProbeOutcome, ALIVE_FIELD};
pub use config::{Config, ConfigFile};
pub use controller::{DashboardView, MonitorController, StatusBoard};
pub use error::Error;
pub use filter::{visible, Density, Filter, RefreshInterval, StatusFilter, VisibleItem};
pub use model::{
    now_epoch_seconds, EpochSeconds, Group, GroupId, ItemKey, ItemState, ItemStatus, Server,
};
pub use scheduler::{probe_task, PollingScheduler, ProbeFuture, ProbeTask, MIN_INTERVAL};
pub use store::{GroupAction, GroupStore, GroupStoreState};
