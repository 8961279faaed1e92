//! Runtime capability probe and adapter selection.
//!
//! Some execution environments (sandboxed previews, headless test runners)
//! have no usable local notification facility. The probe runs once at
//! startup and picks the adapter implementation for the whole process;
//! every scheduling operation still consults
//! [`is_supported`](crate::DeviceNotificationAdapter::is_supported) on the
//! selected adapter, so callers never branch on runtime identity
//! themselves.

use std::sync::Arc;
use std::time::Duration;

use crate::adapter::DeviceNotificationAdapter;
use crate::local::LocalAdapter;
use crate::noop::NoopAdapter;

/// Env var overriding the capability probe. Set to `off`, `0`, or `false`
/// to force degraded mode.
pub const CAPABILITY_ENV: &str = "FLUXPAY_LOCAL_NOTIFICATIONS";

/// Whether local scheduling is available in this runtime.
pub fn detect() -> bool {
    match std::env::var(CAPABILITY_ENV) {
        Ok(value) => !matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "off" | "0" | "false" | "no"
        ),
        Err(_) => true,
    }
}

/// Pick the adapter for this process based on the capability probe.
pub fn select_adapter(tick: Duration) -> Arc<dyn DeviceNotificationAdapter> {
    if detect() {
        Arc::new(LocalAdapter::with_tick(tick))
    } else {
        tracing::info!("Local notifications unsupported in this runtime, running degraded");
        Arc::new(NoopAdapter::new())
    }
}
