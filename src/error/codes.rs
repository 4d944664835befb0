//! Error code constants.
//!
//! Error codes are organized by category:
//! - 1xxx: Reservation errors
//! - 2xxx: Authentication errors
//! - 3xxx: Validation errors
//! - 5xxx: Internal/System errors

/// Error code type with semantic categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(i32);

impl ErrorCode {
    // ===== Reservation Errors (1xxx) =====

    /// Slot already claimed by someone else.
    pub const ALREADY_RESERVED: Self = Self(1001);

    /// Reset attempted without confirmation.
    pub const RESET_NOT_CONFIRMED: Self = Self(1002);

    // ===== Authentication Errors (2xxx) =====

    /// Admin passphrase missing or wrong.
    pub const UNAUTHORIZED: Self = Self(2001);

    // ===== Validation Errors (3xxx) =====

    /// Bad request / invalid parameters.
    pub const BAD_REQUEST: Self = Self(3001);

    /// Participant name missing or blank.
    pub const INVALID_NAME: Self = Self(3002);

    /// Slot number outside `00`..`99`.
    pub const INVALID_SLOT: Self = Self(3003);

    // ===== Internal/System Errors (5xxx) =====

    /// Storage backend error.
    pub const STORAGE_ERROR: Self = Self(5001);

    /// Service unavailable.
    pub const SERVICE_UNAVAILABLE: Self = Self(5003);

    /// Get the error code as an i32.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Get the category of this error code.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self.0 {
            1000..=1999 => ErrorCategory::Reservation,
            2000..=2999 => ErrorCategory::Authentication,
            3000..=3999 => ErrorCategory::Validation,
            5000..=5999 => ErrorCategory::Internal,
            _ => ErrorCategory::Unknown,
        }
    }
}

/// Error category based on error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Reservation conflicts (1xxx).
    Reservation,
    /// Authentication errors (2xxx).
    Authentication,
    /// Validation errors (3xxx).
    Validation,
    /// Internal/system errors (5xxx).
    Internal,
    /// Unknown category.
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reservation => write!(f, "reservation"),
            Self::Authentication => write!(f, "authentication"),
            Self::Validation => write!(f, "validation"),
            Self::Internal => write!(f, "internal"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::ALREADY_RESERVED.as_i32(), 1001);
        assert_eq!(ErrorCode::UNAUTHORIZED.as_i32(), 2001);
        assert_eq!(ErrorCode::INVALID_NAME.as_i32(), 3002);
        assert_eq!(ErrorCode::SERVICE_UNAVAILABLE.as_i32(), 5003);
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            ErrorCode::ALREADY_RESERVED.category(),
            ErrorCategory::Reservation
        );
        assert_eq!(
            ErrorCode::UNAUTHORIZED.category(),
            ErrorCategory::Authentication
        );
        assert_eq!(ErrorCode::INVALID_SLOT.category(), ErrorCategory::Validation);
        assert_eq!(
            ErrorCode::STORAGE_ERROR.category(),
            ErrorCategory::Internal
        );
        assert_eq!(ErrorCategory::Reservation.to_string(), "reservation");
    }
}
