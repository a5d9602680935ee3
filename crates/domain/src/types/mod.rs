//! Domain types and models
//!
//! Payloads exchanged with the Rollcall backend. Field names follow the
//! backend's camelCase JSON.

pub mod attendance;
pub mod user;

pub use attendance::{AttendanceAck, ClockInRequest, ClockOutRequest, InTimeStatus, OutTimeStatus};
pub use user::CurrentUser;
