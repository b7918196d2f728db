//! Core traits for the CRM console
//!
//! This module defines the small behaviors shared by schema nodes and
//! renderers: self-consistency checks and naming.

use crate::error::ConsoleResult;

// ============================================================================
// Validatable Trait
// ============================================================================

/// Trait for types that can check their own consistency
///
/// Schema documents implement this to catch configuration defects (bounds
/// that cross, orders naming missing children) before any form is built.
///
/// # Example
///
/// ```rust,ignore
/// use crm_core::{ConsoleError, ConsoleResult, Validatable};
///
/// struct Bounds {
///     min: f64,
///     max: f64,
/// }
///
/// impl Validatable for Bounds {
///     fn validate(&self) -> ConsoleResult<()> {
///         if self.min > self.max {
///             return Err(ConsoleError::invalid_schema("bounds", "minimum above maximum"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Validatable {
    /// Validate the current state of the object
    fn validate(&self) -> ConsoleResult<()>;

    /// Check if the object is valid without returning error details
    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Get all validation errors (for types that can have multiple errors)
    fn validation_errors(&self) -> Vec<String> {
        match self.validate() {
            Ok(()) => vec![],
            Err(e) => vec![e.to_string()],
        }
    }
}

// ============================================================================
// Named Trait
// ============================================================================

/// Trait for types that have a field name
pub trait Named {
    /// Get the name
    fn name(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConsoleError;

    struct TestValidatable {
        valid: bool,
    }

    impl Validatable for TestValidatable {
        fn validate(&self) -> ConsoleResult<()> {
            if self.valid {
                Ok(())
            } else {
                Err(ConsoleError::invalid_schema("root", "Invalid state"))
            }
        }
    }

    #[test]
    fn test_validatable_trait() {
        let valid = TestValidatable { valid: true };
        assert!(valid.is_valid());
        assert!(valid.validation_errors().is_empty());

        let invalid = TestValidatable { valid: false };
        assert!(!invalid.is_valid());
        assert_eq!(
            invalid.validation_errors(),
            vec!["Invalid schema at 'root': Invalid state".to_string()]
        );
    }
}
