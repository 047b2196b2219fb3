use crate::server::{ErrorCode, LifecycleError, StartResult};

use std::collections::HashSet;

use googletest::assert_that;
use googletest::prelude::{eq, none, some};

#[test]
fn given_all_codes_then_negative_and_distinct() {
    let raw: HashSet<i32> = ErrorCode::ALL.iter().map(|c| c.as_raw()).collect();

    assert_that!(raw.len(), eq(ErrorCode::ALL.len()));
    assert!(raw.iter().all(|code| *code < ErrorCode::SUCCESS));
}

#[test]
fn given_published_values_then_codes_match() {
    assert_that!(ErrorCode::PortAllocationFailure.as_raw(), eq(-1));
    assert_that!(ErrorCode::ServiceInitFailure.as_raw(), eq(-2));
    assert_that!(ErrorCode::AlreadyInProgress.as_raw(), eq(-3));
    assert_that!(ErrorCode::InternalFailure.as_raw(), eq(-4));
}

#[test]
fn given_raw_code_when_from_raw_then_maps_back() {
    for code in ErrorCode::ALL {
        assert_that!(ErrorCode::from_raw(code.as_raw()), some(eq(code)));
    }
    assert_that!(ErrorCode::from_raw(ErrorCode::SUCCESS), none());
    assert_that!(ErrorCode::from_raw(-99), none());
}

#[test]
fn given_lifecycle_errors_then_mapped_to_expected_codes() {
    assert_that!(
        LifecycleError::service_init("boom").code(),
        eq(ErrorCode::ServiceInitFailure)
    );
    assert_that!(
        LifecycleError::already_in_progress().code(),
        eq(ErrorCode::AlreadyInProgress)
    );
    assert_that!(
        LifecycleError::internal("boom").code(),
        eq(ErrorCode::InternalFailure)
    );
    assert_that!(
        LifecycleError::shutdown("boom").code(),
        eq(ErrorCode::InternalFailure)
    );
}

#[test]
fn given_success_when_into_raw_then_zero_with_port() {
    let result = StartResult::from(Ok(4242));

    assert!(result.is_started());
    assert_that!(result.into_raw(), eq((0, Some(4242))));
}

#[test]
fn given_failure_when_into_raw_then_code_without_port() {
    let result = StartResult::from(Err(LifecycleError::service_init("boom")));

    assert!(!result.is_started());
    assert_that!(result.port(), none());
    assert_that!(result.into_raw(), eq((-2, None)));
}
