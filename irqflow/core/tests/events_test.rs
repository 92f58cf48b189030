//! Event tests for irqflow-core
//! These tests run on the host with std, but exercise no_std compatible code

use irqflow_core::{CoreError, EventKind, TaskMessage};

#[test]
fn test_message_is_a_copy_value() {
    let original = TaskMessage::new(EventKind::Button);
    let copy = original;
    assert_eq!(original, copy);
    assert_eq!(copy.kind(), EventKind::Button);
}

#[test]
fn test_kinds_are_distinguished_by_tag() {
    assert_ne!(TaskMessage::BUTTON, TaskMessage::WAKE);
    assert_ne!(EventKind::Wake.raw(), EventKind::Timer.raw());
}

#[test]
fn test_raw_kind_conversion() {
    assert_eq!(EventKind::try_from(1), Ok(EventKind::Wake));
    assert_eq!(EventKind::try_from(99), Err(CoreError::UnknownEvent(99)));
}

#[test]
fn test_display_uses_upper_case_names() {
    assert_eq!(EventKind::Button.to_string(), "BUTTON");
    assert_eq!(TaskMessage::WAKE.to_string(), "TaskMessage(WAKE)");
}
