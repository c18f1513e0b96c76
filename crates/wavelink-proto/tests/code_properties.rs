//! Property tests for the error-code table.

use proptest::prelude::*;
use wavelink_proto::{ErrorCode, error_reason};

proptest! {
    /// `error_reason` is total: any i32 yields a non-empty string.
    #[test]
    fn error_reason_is_total(code in any::<i32>()) {
        let reason = error_reason(code);
        prop_assert!(!reason.is_empty());
    }

    /// Codes recognized by the table map back to themselves.
    #[test]
    fn from_code_is_consistent(code in any::<i32>()) {
        if let Some(parsed) = ErrorCode::from_code(code) {
            prop_assert_eq!(parsed.code(), code);
            prop_assert_eq!(error_reason(code), parsed.reason());
        } else {
            prop_assert_eq!(error_reason(code), "unknown error");
        }
    }
}
