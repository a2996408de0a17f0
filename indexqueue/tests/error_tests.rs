use indexqueue::QueueError;

#[test]
fn error_display_invalid_operand() {
    let err = QueueError::InvalidOperand("Doc has no key".into());
    assert!(format!("{err}").contains("invalid operand"));
}

#[test]
fn error_display_invalid_operation_code_carries_value() {
    let err = QueueError::InvalidOperationCode { code: 7 };
    assert_eq!(format!("{err}"), "invalid operation code: 7");
}

#[test]
fn error_from_type_conversion() {
    let conversion = indexqueue_types::Operation::try_from(-3).unwrap_err();
    let err: QueueError = conversion.into();
    assert!(matches!(err, QueueError::InvalidOperationCode { code: -3 }));
}

#[test]
fn error_display_processor() {
    let err = QueueError::processor("solr", "connection refused");
    let msg = format!("{err}");
    assert!(msg.contains("solr"));
    assert!(msg.contains("connection refused"));
}

#[test]
fn error_display_invalid_state() {
    let err = QueueError::InvalidState {
        reason: "entry has no key".into(),
    };
    assert!(format!("{err}").contains("entry has no key"));
}

#[test]
fn error_from_serde_json() {
    let serde_err: Result<serde_json::Value, _> = serde_json::from_str("not json");
    let err: QueueError = serde_err.unwrap_err().into();
    assert!(format!("{err}").contains("serialization"));
}

#[test]
fn error_is_debug() {
    let err = QueueError::LockPoisoned;
    let _ = format!("{err:?}");
}
