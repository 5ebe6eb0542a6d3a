mod session_worker;
mod worker_handle;

pub use session_worker::{SessionWorker, TickOutcome, TickReport};
pub use worker_handle::WorkerHandle;
pub(crate) use worker_handle::WorkerShared;
