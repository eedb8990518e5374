//! CLI Exit Code Registry
//!
//! Single source of truth for `srecon` exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                             |
//! |------|-----------------------------------------------------|
//! | 0    | Success                                             |
//! | 1    | General error (unspecified)                         |
//! | 2    | CLI usage error (bad args)                          |
//! | 3    | Invalid recon config                                |
//! | 4    | Runtime error (unreadable or corrupt input, output) |
//! | 5    | Unmatched entities remain (`run --strict`)          |
//! | 6    | Target conflicts with `fail_on_conflict = true`     |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant below
//! 2. Document what triggers it
//! 3. Update the table above

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Recon (3-6)
// =============================================================================

/// Config failed to parse or validate.
pub const EXIT_RECON_INVALID_CONFIG: u8 = 3;

/// Input could not be read or parsed, or an output could not be written.
/// Outputs are staged first: when input or staging fails, `run` leaves
/// every destination untouched. Only a failure while moving staged files
/// into place can leave some outputs updated.
pub const EXIT_RECON_RUNTIME: u8 = 4;

/// `run --strict` and at least one entity stayed unmatched.
/// Outputs are still written.
pub const EXIT_RECON_UNMATCHED: u8 = 5;

/// Two sources claimed the same target and the config sets
/// `fail_on_conflict`. Outputs are still written.
pub const EXIT_RECON_CONFLICT: u8 = 6;
