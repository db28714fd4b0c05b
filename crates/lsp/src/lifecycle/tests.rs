use super::*;

#[test]
fn requests_before_initialize_are_rejected() {
	let lifecycle = Lifecycle::new();
	let err = lifecycle.admit_request("textDocument/hover").unwrap_err();
	assert_eq!(err.code, ErrorCode::SERVER_NOT_INITIALIZED);
	assert_eq!(lifecycle.state(), ConnectionState::Uninitialized);
}

#[test]
fn full_sequence_moves_forward() {
	let lifecycle = Lifecycle::new();
	lifecycle.admit_request("initialize").unwrap();
	assert_eq!(lifecycle.state(), ConnectionState::Initializing);
	lifecycle.initialized();
	assert_eq!(lifecycle.state(), ConnectionState::Initialized);
	assert!(lifecycle.admit_notification("initialized"));
	lifecycle.admit_request("textDocument/hover").unwrap();
	lifecycle.admit_request("shutdown").unwrap();
	assert_eq!(lifecycle.state(), ConnectionState::ShuttingDown);
	assert_eq!(lifecycle.exit(), Some(0));
	assert_eq!(lifecycle.state(), ConnectionState::Exited);
}

#[test]
fn second_initialize_is_invalid() {
	let lifecycle = Lifecycle::new();
	lifecycle.admit_request("initialize").unwrap();
	lifecycle.initialized();
	let err = lifecycle.admit_request("initialize").unwrap_err();
	assert_eq!(err.code, ErrorCode::INVALID_REQUEST);
	assert_eq!(lifecycle.state(), ConnectionState::Initialized);
}

#[test]
fn requests_after_shutdown_are_invalid() {
	let lifecycle = Lifecycle::new();
	lifecycle.admit_request("initialize").unwrap();
	lifecycle.initialized();
	lifecycle.admit_request("shutdown").unwrap();
	let err = lifecycle.admit_request("textDocument/completion").unwrap_err();
	assert_eq!(err.code, ErrorCode::INVALID_REQUEST);
	assert!(!lifecycle.admit_notification("textDocument/didOpen"));
}

#[test]
fn exit_without_shutdown_is_status_one() {
	let lifecycle = Lifecycle::new();
	lifecycle.admit_request("initialize").unwrap();
	lifecycle.initialized();
	assert_eq!(lifecycle.exit(), Some(1));
	assert_eq!(lifecycle.exit(), None);
}

#[test]
fn exit_before_initialize_is_status_one() {
	assert_eq!(Lifecycle::new().exit(), Some(1));
}

#[test]
fn state_never_moves_backward() {
	let lifecycle = Lifecycle::new();
	lifecycle.admit_request("initialize").unwrap();
	lifecycle.initialized();
	lifecycle.admit_request("shutdown").unwrap();
	lifecycle.initialized();
	assert_eq!(lifecycle.state(), ConnectionState::ShuttingDown);
}

#[test]
fn notifications_wait_for_initialize() {
	let lifecycle = Lifecycle::new();
	assert!(!lifecycle.admit_notification("textDocument/didOpen"));
	lifecycle.admit_request("initialize").unwrap();
	assert!(!lifecycle.admit_notification("initialized"));
	lifecycle.initialized();
	assert!(lifecycle.admit_notification("textDocument/didOpen"));
}

#[test]
fn traffic_waits_while_initializing() {
	let lifecycle = Lifecycle::new();
	lifecycle.admit_request("initialize").unwrap();
	let err = lifecycle.admit_request("textDocument/hover").unwrap_err();
	assert_eq!(err.code, ErrorCode::SERVER_NOT_INITIALIZED);
	let err = lifecycle.admit_request("shutdown").unwrap_err();
	assert_eq!(err.code, ErrorCode::SERVER_NOT_INITIALIZED);
	assert!(!lifecycle.admit_notification("textDocument/didOpen"));
	assert_eq!(lifecycle.state(), ConnectionState::Initializing);
}

#[test]
fn aborted_initialize_can_be_retried() {
	let lifecycle = Lifecycle::new();
	lifecycle.admit_request("initialize").unwrap();
	lifecycle.abort_initialize();
	assert_eq!(lifecycle.state(), ConnectionState::Uninitialized);
	assert_eq!(
		lifecycle.admit_request("textDocument/hover").unwrap_err().code,
		ErrorCode::SERVER_NOT_INITIALIZED
	);

	lifecycle.admit_request("initialize").unwrap();
	lifecycle.initialized();
	lifecycle.abort_initialize();
	assert_eq!(lifecycle.state(), ConnectionState::Initialized);
}
