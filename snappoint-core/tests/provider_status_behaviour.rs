//! Behavioural coverage for provider status classification.

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use snappoint_core::{ProviderError, ProviderErrorKind, ProviderStatus};

/// Scenario state shared between steps.
pub struct StatusContext {
    status: RefCell<Option<ProviderStatus>>,
    outcome: RefCell<Option<Result<(), ProviderError>>>,
}

#[fixture]
/// Build an empty context for each scenario.
pub fn context() -> StatusContext {
    StatusContext {
        status: RefCell::new(None),
        outcome: RefCell::new(None),
    }
}

fn set_status(context: &StatusContext, code: &str) {
    *context.status.borrow_mut() = Some(ProviderStatus::from_code(code));
}

fn failure(context: &StatusContext) -> ProviderError {
    match context.outcome.borrow().clone() {
        Some(Err(err)) => err,
        other => panic!("expected a provider failure, got {other:?}"),
    }
}

#[given("a provider response with status REQUEST_DENIED")]
fn denied(context: &StatusContext) {
    set_status(context, "REQUEST_DENIED");
}

#[given("a provider response with status UNKNOWN_ERROR")]
fn unknown(context: &StatusContext) {
    set_status(context, "UNKNOWN_ERROR");
}

#[given("a provider response with status ZERO_RESULTS")]
fn zero_results(context: &StatusContext) {
    set_status(context, "ZERO_RESULTS");
}

#[when("the status is checked")]
fn check(context: &StatusContext) {
    let outcome = context
        .status
        .borrow()
        .as_ref()
        .map(ProviderStatus::check);
    *context.outcome.borrow_mut() = outcome;
}

#[then("the failure is classified as access denied")]
fn is_access_denied(context: &StatusContext) {
    assert_eq!(failure(context).kind(), ProviderErrorKind::AccessDenied);
}

#[then("the failure is classified as other")]
fn is_other(context: &StatusContext) {
    assert_eq!(failure(context).kind(), ProviderErrorKind::Other);
}

#[then("the failure reports the original status code")]
fn reports_code(context: &StatusContext) {
    assert_eq!(
        failure(context),
        ProviderError::Service {
            code: "UNKNOWN_ERROR".into()
        }
    );
}

#[then("no failure is reported")]
fn no_failure(context: &StatusContext) {
    assert!(matches!(*context.outcome.borrow(), Some(Ok(()))));
}

#[scenario(path = "tests/features/provider_status.feature", index = 0)]
fn denied_credentials(context: StatusContext) {
    let _ = context;
}

#[scenario(path = "tests/features/provider_status.feature", index = 1)]
fn unknown_status(context: StatusContext) {
    let _ = context;
}

#[scenario(path = "tests/features/provider_status.feature", index = 2)]
fn zero_results_pass(context: StatusContext) {
    let _ = context;
}
