//! Search module / 搜索模块
//!
//! - Local filtering over the in-memory dataset
//! - Debounced remote search with a bounded timeout
//! - Orchestration of both into one consistent outcome
//!
//! Call direction: session → orchestrator → filter; the remote call itself
//! runs outside the orchestrator and reports back with its ticket.

pub mod dataset;
pub mod debounce;
pub mod filter;
pub mod orchestrator;
pub mod remote;

pub use dataset::{load_dataset, seed_entries};
pub use debounce::DebouncedInvoker;
pub use filter::filter_entries;
pub use orchestrator::{OutcomeStatus, Phase, SearchOrchestrator, SearchOutcome, SearchTicket};
pub use remote::{RemoteOutcome, RemoteSearchClient, SearchBackend};
