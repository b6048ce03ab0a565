//! Terminal UI for CarParter chat, the center map and the vehicle list
//!
//! Built on Ratatui. Backend I/O runs on a separate task (see `backend`).

mod app;
mod backend;
mod compose;
mod help;
mod log_pane;
mod map;
mod messages;
mod sidebar;
mod ui;
mod vehicles;

pub use app::{run, TuiOptions};
pub use log_pane::LogSink;
