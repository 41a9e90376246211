//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                            |
//! |------|----------------------------------------------------|
//! | 0    | Success (skipped keys do not change this)          |
//! | 1    | General error (unspecified)                        |
//! | 2    | CLI usage error (bad args)                         |
//! | 3    | No polarization present in both DMRG and TFA data  |
//! | 4    | Invalid run config (parse or validation)           |
//! | 5    | Input file could not be read                       |
//! | 6    | At least one comparison artifact was not written   |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `recon_exit_code` or the relevant command

use polcmp_recon::ReconError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Compare (3-9)
// =============================================================================

/// Reference and variational datasets share no polarization key.
/// Raised before any output directory is created.
pub const EXIT_NO_COMMON: u8 = 3;

/// Config TOML failed to parse or validate, or the file pattern is invalid.
pub const EXIT_INVALID_CONFIG: u8 = 4;

/// The reference file or config file could not be read.
pub const EXIT_INPUT_IO: u8 = 5;

/// An output directory could not be created or a table/plot write failed.
pub const EXIT_EXPORT: u8 = 6;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        ReconError::Pattern { .. } => EXIT_INVALID_CONFIG,
        ReconError::Io { .. } => EXIT_INPUT_IO,
        ReconError::NoCommonPolarizations { .. } => EXIT_NO_COMMON,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_NO_COMMON,
            EXIT_INVALID_CONFIG,
            EXIT_INPUT_IO,
            EXIT_EXPORT,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn engine_errors_map_to_codes() {
        let empty = ReconError::NoCommonPolarizations { reference_keys: 2, variational_keys: 0 };
        assert_eq!(recon_exit_code(&empty), EXIT_NO_COMMON);
        assert_eq!(recon_exit_code(&ReconError::ConfigValidation("x".into())), EXIT_INVALID_CONFIG);
        assert_eq!(recon_exit_code(&ReconError::io("ferU-4.txt", "gone")), EXIT_INPUT_IO);
    }
}
