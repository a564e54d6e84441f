//! Process exit codes

/// Success
pub const EXIT_SUCCESS: i32 = 0;
/// A diagnostic was reported
pub const EXIT_DIAGNOSTIC: i32 = 1;
/// An error was raised past the diagnostic layer
pub const EXIT_ERROR: i32 = 2;
