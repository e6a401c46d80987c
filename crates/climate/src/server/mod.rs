//! Climate Server
//!
//! REST API for rooms and readings, plus WebSocket pushes of assessment
//! changes to subscribed dashboards.

pub mod api;
pub mod handler;
pub mod protocol;
pub mod router;
pub mod state;

pub use protocol::{ChangeType, ClientMessage, ErrorCode, ServerMessage};
pub use router::create_router;
pub use state::AppState;
