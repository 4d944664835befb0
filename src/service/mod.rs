//! Service layer module.
//!
//! Board operations, CSV export and the admin gate.

pub mod admin;
pub mod board;
pub mod export;

pub use admin::AdminGate;
pub use board::BoardService;
pub use export::{EXPORT_FILENAME, export_csv};
