#![forbid(unsafe_code)]

//! Core domain model and business logic for the Gains workout tracker.
//!
//! This crate provides:
//! - Domain types (exercises, workout types, sessions, set logs)
//! - The built-in push/pull/legs program and rotation schedule
//! - The active session store with optimistic backend sync
//! - Rest and elapsed timers, swipe/key navigation
//! - Persistence (JSONL workout journal, resume snapshot, schedule state)

pub mod types;
pub mod error;
pub mod clock;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod schedule;
pub mod journal;
pub mod remote;
pub mod sync;
pub mod local_log;
pub mod resume;
pub mod alerts;
pub mod rest_timer;
pub mod elapsed;
pub mod ticker;
pub mod navigator;
pub mod session;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use clock::{Clock, ManualClock, SystemClock};
pub use catalog::{get_default_program, Program};
pub use config::Config;
pub use schedule::ScheduleState;
pub use remote::WorkoutLogApi;
pub use sync::{is_new_personal_record, SyncController};
pub use local_log::LocalWorkoutLog;
pub use resume::{ResumeSnapshot, ResumeStore};
pub use rest_timer::{RestPhase, RestTimer};
pub use elapsed::ElapsedTimer;
pub use navigator::{NavIntent, NavKey, Navigable, SwipeNavigator};
pub use session::{SessionStore, SetLogged, SetRejection, WorkoutSummary};
