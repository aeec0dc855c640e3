use thiserror::Error;

/// Fail-fast scan errors callers can match on. Everything else in the crate
/// propagates as `anyhow::Error` with context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// The series cannot host one candidate window plus the current window
    /// after warm-up.
    #[error(
        "insufficient history: {actual} bars available, need at least {required} \
         (2 x window {window} + {warmup} warm-up bars); fetch more history or \
         decrease --window"
    )]
    InsufficientHistory {
        required: usize,
        window: usize,
        warmup: usize,
        actual: usize,
    },

    /// No requested feature produced enough valid points inside the current
    /// window, so there is nothing to compare candidates against.
    #[error(
        "no usable features in the current window [{start}, {end}): every requested \
         feature had fewer than {min_valid} valid points"
    )]
    NoUsableFeatures {
        start: usize,
        end: usize,
        min_valid: usize,
    },
}
