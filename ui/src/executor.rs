use std::future::Future;

use iced::executor::Executor;
use iced::futures;
use tokio::runtime::{Builder, Runtime};

/// One worker is enough: every probe is non-blocking IO.
const WORKER_THREADS: usize = 1;

/// Tokio-backed executor. `enter` keeps the runtime current while the
/// dashboard handles messages, so pollers started from `update` can spawn.
#[derive(Debug)]
pub struct DashboardExecutor {
    runtime: Runtime,
}

impl Executor for DashboardExecutor {
    fn new() -> Result<Self, futures::io::Error> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(WORKER_THREADS)
            .thread_name("statusboard-io")
            .enable_all()
            .build()?;
        Ok(Self { runtime })
    }

    fn spawn(&self, future: impl Future<Output = ()> + Send + 'static) {
        let _ = self.runtime.spawn(future);
    }

    fn enter<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.runtime.enter();
        f()
    }
}
