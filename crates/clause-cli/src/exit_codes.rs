//! Process exit codes. Part of the CLI contract: CI gates key off them.

pub const SUCCESS: i32 = 0;
pub const VIOLATIONS: i32 = 1; // Violations at or above --fail-on (or a blocking warning)
pub const CONFIG_ERROR: i32 = 2; // Config, pack or map could not be loaded or built
pub const DEGENERATE_INPUT: i32 = 3; // Empty text or no standards; nothing was validated
