//! Proptest strategies for task fields.

use compute_engine::constants::task_types;
use proptest::prelude::*;

/// Optional field as a caller may send it: absent, empty, or a real value
pub fn optional_field_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        "[a-zA-Z0-9_:.-]{1,24}".prop_map(Some),
    ]
}

pub fn required_field_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,32}"
}

pub fn task_type_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(task_types::REPORT.to_string()),
        Just(task_types::PROJECT_EXPORT.to_string()),
        Just(task_types::VIEW_REFRESH.to_string()),
        "[A-Z_]{1,16}",
    ]
}
