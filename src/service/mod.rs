//! Operations that sit between the HTTP handlers and the stores.

pub mod attendance;
