pub const LOG_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/logs");
pub const CRASH_LOG: &str = "crash.log";
pub const LATEST_LOG: &str = "latest.log";
pub const DIST_DIR: &str = "frontend/dist";

/// Upper bound on samples a single HTTP call may request, regardless of what a caller asks for.
pub const PLANNING_MAX_SAMPLE_BUDGET: u32 = 2000;