//! Attendance endpoints
//!
//! Thin typed wrappers over the authenticated [`ApiClient`](crate::api::ApiClient):
//! every call here gets bearer attachment and the refresh-then-retry cycle
//! for free.

mod client;

pub use client::AttendanceClient;
