//! Error types for squaremat operations.
//!
//! Allocation, construction and multiplication report failures through
//! [`MatmulError`] instead of panicking, so benchmark and validation drivers
//! can decide for themselves whether a failure is fatal.

use thiserror::Error;

/// Errors that can occur while building or multiplying matrices.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatmulError {
    /// The global allocator could not satisfy a request.
    #[error("Memory allocation failed: {message} (requested {requested_size} bytes with {requested_alignment} byte alignment)")]
    Allocation {
        requested_size: usize,
        requested_alignment: usize,
        message: String,
    },

    /// Invalid layout parameters were provided.
    #[error("Invalid memory layout: {message} (size: {size}, alignment: {alignment})")]
    Layout {
        size: usize,
        alignment: usize,
        message: String,
    },

    /// The huge page pool has no room left for the request.
    #[error("Huge page pool exhausted: requested {requested} bytes, {remaining} of {capacity} bytes remaining")]
    PoolExhausted {
        requested: usize,
        remaining: usize,
        capacity: usize,
    },

    /// Reserving the pool's backing region failed.
    #[error("Failed to map {size} bytes for the huge page pool: {message}")]
    MapFailed { size: usize, message: String },

    /// A literal constructor received the wrong number of elements.
    #[error("Dimension mismatch: expected {expected} elements, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A random fill was requested over an empty range.
    #[error("Invalid bounds: lower bound {lower} exceeds upper bound {upper}")]
    InvalidBounds { lower: String, upper: String },

    /// The right-hand operand's transposed shadow no longer mirrors its data.
    #[error("Stale transpose: {strategy} reads the right operand's transposed copy, call compute_transpose() first")]
    StaleTranspose { strategy: &'static str },

    /// Input validation error.
    #[error("Validation error: {message}")]
    Validation { message: String },
}

/// Result type alias for squaremat operations.
pub type Result<T> = std::result::Result<T, MatmulError>;

/// Creates an allocation error.
pub fn allocation_error(size: usize, alignment: usize, message: impl Into<String>) -> MatmulError {
    MatmulError::Allocation {
        requested_size: size,
        requested_alignment: alignment,
        message: message.into(),
    }
}

/// Creates a layout error.
pub fn layout_error(size: usize, alignment: usize, message: impl Into<String>) -> MatmulError {
    MatmulError::Layout {
        size,
        alignment,
        message: message.into(),
    }
}

/// Creates a validation error.
pub fn validation_error(message: impl Into<String>) -> MatmulError {
    MatmulError::Validation {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_error_display() {
        let error = allocation_error(1024, 64, "out of memory");
        let display = format!("{}", error);
        assert!(display.contains("Memory allocation failed"));
        assert!(display.contains("1024 bytes"));
        assert!(display.contains("64 byte alignment"));
        assert!(display.contains("out of memory"));
    }

    #[test]
    fn test_layout_error_display() {
        let error = layout_error(1000, 31, "alignment must be power of two");
        let display = format!("{}", error);
        assert!(display.contains("Invalid memory layout"));
        assert!(display.contains("size: 1000"));
        assert!(display.contains("alignment: 31"));
    }

    #[test]
    fn test_pool_exhausted_display() {
        let error = MatmulError::PoolExhausted {
            requested: 128,
            remaining: 64,
            capacity: 4096,
        };
        let display = error.to_string();
        assert!(display.contains("128 bytes"));
        assert!(display.contains("64 of 4096"));
    }

    #[test]
    fn test_stale_transpose_names_strategy() {
        let error = MatmulError::StaleTranspose {
            strategy: "TRANSPOSED",
        };
        assert!(error.to_string().contains("TRANSPOSED"));
        assert!(error.to_string().contains("compute_transpose"));
    }

    #[test]
    fn test_error_equality() {
        let error1 = allocation_error(1024, 64, "test");
        let error2 = allocation_error(1024, 64, "test");
        let error3 = allocation_error(2048, 64, "test");

        assert_eq!(error1, error2);
        assert_ne!(error1, error3);
    }

    #[test]
    fn test_error_trait_implementation() {
        let error = validation_error("lower bound must be below upper bound");
        let _: &dyn std::error::Error = &error;
        assert!(std::error::Error::source(&error).is_none());
    }
}
