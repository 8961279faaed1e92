//! The device-side local notification capability boundary.
//!
//! This crate isolates everything that talks to the OS notification store:
//!
//! - [`DeviceNotificationAdapter`] — the async trait the engine schedules
//!   and cancels through.
//! - [`LocalAdapter`] — the real implementation: an in-process trigger
//!   store with a background firing loop that broadcasts
//!   [`FiredNotification`]s.
//! - [`NoopAdapter`] — the degraded-mode implementation used when the
//!   runtime does not support local scheduling.
//! - [`capability`] — the startup probe that picks between the two.
//!
//! Degraded capability is a normal, silent mode: every operation on the
//! no-op adapter succeeds with an empty result, and nothing here ever
//! surfaces "unsupported" as an error.

pub mod adapter;
pub mod capability;
pub mod local;
pub mod noop;

pub use adapter::{
    AdapterError, DeviceNotificationAdapter, FiredNotification, PermissionStatus,
    ScheduledTrigger,
};
pub use local::LocalAdapter;
pub use noop::NoopAdapter;
