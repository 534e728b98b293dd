/// Rejections closer than this to the end of the cooldown are let through,
/// absorbing clock jitter.
pub const TOLERANCE_SECONDS: f64 = 0.05;

/// Early retries are only punished while the remaining wait is below this.
/// Anything longer is a ban and is left as is.
pub const RETALIATION_LIMIT_SECONDS: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasConfig {
    /// Minimum time between two accepted writes of one caller.
    pub cooldown_seconds: f64,
    /// Callers idle for longer count as old in stats.
    pub stale_after_seconds: f64,
    pub default_ban_seconds: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: 59.0,
            stale_after_seconds: 24.0 * 3600.0,
            default_ban_seconds: 12.0 * 3600.0,
        }
    }
}
