pub mod app;
pub mod collector;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod stats;
pub mod storage;
pub mod ui;
pub mod state;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::{ActivityStore, JsonFileBackend, MemoryBackend, StateBackend, StoreEvent};
