use std::path::PathBuf;

use todo::error::{exit_codes, Error, JsonError};
use todo::task::TaskDraft;
use todo::validate::validate;

#[test]
fn exit_codes_map_correctly() {
    let user = Error::InvalidArgument("bad".to_string());
    assert_eq!(user.exit_code(), exit_codes::USER_ERROR);

    let duplicate = Error::DuplicateAttachment {
        name: "a.txt".to_string(),
        size: 3,
    };
    assert_eq!(duplicate.exit_code(), exit_codes::USER_ERROR);

    let lock = Error::LockFailed(PathBuf::from("todos.lock"));
    assert_eq!(lock.exit_code(), exit_codes::OPERATION_FAILED);
    assert_eq!(lock.kind(), "lock_failed");

    let op = Error::OperationFailed("boom".to_string());
    assert_eq!(op.exit_code(), exit_codes::OPERATION_FAILED);
}

#[test]
fn json_error_includes_code() {
    let err = Error::TaskNotFound(9);
    let json = JsonError::from(&err);
    assert_eq!(json.code, exit_codes::USER_ERROR);
    assert_eq!(json.kind, "not_found");
    assert!(json.message.contains("Task not found"));
    assert_eq!(json.details, Some(serde_json::json!({ "id": 9 })));
}

#[test]
fn validation_error_details_list_every_violation() {
    let today = chrono::NaiveDate::from_ymd_opt(2026, 10, 19).expect("date");
    let errors = validate(&TaskDraft::new(" ", ""), today).expect_err("invalid draft");
    let err = Error::from(errors);

    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    assert_eq!(
        err.details(),
        Some(serde_json::json!({ "errors": ["missing_title", "missing_due_date"] }))
    );
    assert!(err.to_string().contains("title is required"));
}
