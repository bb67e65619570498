//! Process exit codes
//!
//! A completed run exits with the last non-zero child exit code, so these
//! codes only apply when the run never got that far.

use rt_core::error::ConfigError;
use rt_core::RtError;

/// Run completed and every child exited cleanly
pub const SUCCESS: i32 = 0;

/// Bad command line
pub const USAGE: i32 = 1;

/// Config file does not exist
pub const CONFIG_MISSING: i32 = 2;

/// Config file could not be parsed or validated
pub const CONFIG_INVALID: i32 = 3;

/// No child could be started
pub const NO_CHILDREN: i32 = 4;

/// A second Ctrl+C / SIGTERM cut the run short
pub const INTERRUPTED: i32 = 130;

/// Exit code for an error that ended the run early
pub fn for_error(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<RtError>() {
        Some(e) => for_rt_error(e),
        None => USAGE,
    }
}

fn for_rt_error(err: &RtError) -> i32 {
    match err {
        RtError::Config(ConfigError::NotFound(_)) => CONFIG_MISSING,
        RtError::Config(_) => CONFIG_INVALID,
        RtError::NoChildren => NO_CHILDREN,
        _ => USAGE,
    }
}
