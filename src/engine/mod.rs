//! Attendance-to-payroll calculation: raw rows → normalized rows → summary →
//! export rows. Nothing in here touches the store.

pub mod calculator;
pub mod export;
pub mod hours;
pub mod ingest;
pub mod normalizer;
