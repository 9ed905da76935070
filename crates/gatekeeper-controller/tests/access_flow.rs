//! End-to-end access flows over the full pipeline: scripted reader, real
//! authorization client against a stubbed endpoint, real sequencer over
//! recording outputs, real audit ring over a simulated EEPROM. Virtual
//! time throughout, so every hold and deadline is exact and free.

mod common;

use common::{ConstantPoller, ScriptedPoller, StubEndpoint, rig};
use gatekeeper_controller::ControllerState;
use gatekeeper_core::{AccessDecision, AuthorizationResult, ResultKind, TagEvent};
use gatekeeper_storage::{AuditSink, StorageError};
use std::time::Duration;
use tokio::time::Instant;

const BADGE: u64 = 62_984_291_464;

#[tokio::test(start_paused = true)]
async fn granted_badge_is_let_through_and_audited() {
    let endpoint = StubEndpoint::new(b"1", Duration::ZERO);
    let (mut controller, handles) =
        rig(ScriptedPoller::new([BADGE]), endpoint.clone()).await;

    let outcome = controller.run_once().await.unwrap().expect("one event");

    assert_eq!(outcome.serial_number, BADGE);
    assert_eq!(outcome.result, AuthorizationResult::Granted);
    assert_eq!(outcome.decision, AccessDecision::Granted);

    // The endpoint saw the decimal serial once
    assert_eq!(endpoint.requests(), vec![r#"{"sn":"62984291464"}"#]);

    // The audit record landed in slot zero: serial big-endian, then kind
    let record = outcome.record.expect("audit committed");
    assert_eq!(record.slot_address, 0);
    let raw = handles.eeprom.read(0, 9);
    assert_eq!(&raw[..8], &BADGE.to_be_bytes());
    assert_eq!(raw[8], ResultKind::Granted.as_byte());

    // The grant indicator lit, the deny indicator never did
    assert!(handles.grant.changes().contains(&true));
    assert!(handles.deny.changes().iter().all(|high| !high));

    // Full cycle, back at idle
    assert_eq!(controller.state(), ControllerState::Idle);
    assert_eq!(controller.machine().history().len(), 5);
}

#[tokio::test(start_paused = true)]
async fn slow_endpoint_times_out_into_denial() {
    let endpoint = StubEndpoint::new(b"1", Duration::from_secs(3));
    let (mut controller, handles) = rig(ScriptedPoller::new([]), endpoint).await;

    let started = Instant::now();
    let outcome = controller.handle_event(TagEvent::new(BADGE)).await.unwrap();

    assert_eq!(outcome.result, AuthorizationResult::TimedOut);
    assert_eq!(outcome.decision, AccessDecision::Denied);

    // The audit trail distinguishes a timeout from an explicit refusal
    assert_eq!(handles.eeprom.read(8, 1)[0], ResultKind::TimedOut.as_byte());

    // The deny sequence played: indicator lit, three buzz pulses
    assert!(handles.deny.changes().contains(&true));
    assert!(handles.grant.changes().iter().all(|high| !high));
    let pulses = handles
        .buzzer
        .history()
        .iter()
        .filter(|duty| **duty == 0.8)
        .count();
    assert_eq!(pulses, 3);

    // The whole cycle is bounded: processing cue plus the rest of the
    // 500ms deadline plus the 1500ms deny sequence plus audit settle
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(2000), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(2100), "elapsed {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn explicit_refusal_is_audited_as_denied() {
    let endpoint = StubEndpoint::new(b"0", Duration::ZERO);
    let (mut controller, handles) = rig(ScriptedPoller::new([]), endpoint).await;

    let outcome = controller.handle_event(TagEvent::new(BADGE)).await.unwrap();

    assert_eq!(outcome.result, AuthorizationResult::Denied);
    assert_eq!(outcome.decision, AccessDecision::Denied);
    assert_eq!(handles.eeprom.read(8, 1)[0], ResultKind::Denied.as_byte());
}

#[tokio::test(start_paused = true)]
async fn timeout_and_refusal_drive_the_same_outputs() {
    let slow = StubEndpoint::new(b"1", Duration::from_secs(3));
    let (mut timed_out, timeout_handles) = rig(ScriptedPoller::new([]), slow).await;
    timed_out.handle_event(TagEvent::new(BADGE)).await.unwrap();

    let refusing = StubEndpoint::new(b"0", Duration::ZERO);
    let (mut refused, refusal_handles) = rig(ScriptedPoller::new([]), refusing).await;
    refused.handle_event(TagEvent::new(BADGE)).await.unwrap();

    // A visitor at the door cannot tell the two apart
    assert_eq!(
        timeout_handles.buzzer.history(),
        refusal_handles.buzzer.history()
    );
    assert_eq!(
        timeout_handles.deny.changes(),
        refusal_handles.deny.changes()
    );
}

#[tokio::test(start_paused = true)]
async fn audit_failure_never_wedges_the_door() {
    use gatekeeper_actuate::Sequencer;
    use gatekeeper_authz::AuthzClient;
    use gatekeeper_controller::AccessController;
    use gatekeeper_core::AuditRecord;
    use gatekeeper_hardware::mock::{MockPin, MockPwm};

    struct FailingSink;

    impl AuditSink for FailingSink {
        async fn commit(
            &mut self,
            _serial_number: u64,
            _kind: ResultKind,
        ) -> Result<AuditRecord, StorageError> {
            Err(StorageError::InvalidArgument("log wedged".to_string()))
        }
    }

    let (grant, grant_handle) = MockPin::new();
    let (deny, _) = MockPin::new();
    let (buzzer, _) = MockPwm::new();

    let mut controller = AccessController::new(
        ScriptedPoller::new([]),
        AuthzClient::new(StubEndpoint::new(b"1", Duration::ZERO)),
        Sequencer::new(grant, deny, buzzer),
        FailingSink,
    );

    let outcome = controller.handle_event(TagEvent::new(BADGE)).await.unwrap();

    // The decision stood and the cycle completed; only the record is gone
    assert_eq!(outcome.decision, AccessDecision::Granted);
    assert!(outcome.record.is_none());
    assert!(grant_handle.changes().contains(&true));
    assert_eq!(controller.state(), ControllerState::Idle);
}

#[tokio::test(start_paused = true)]
async fn held_badge_causes_exactly_one_flight_at_a_time() {
    let endpoint = StubEndpoint::new(b"1", Duration::ZERO);
    let (mut controller, handles) =
        rig(ConstantPoller::new(BADGE), endpoint.clone()).await;

    let loop_task = tokio::spawn(async move { controller.run().await });

    // One granted cycle is roughly 1280ms of virtual time (260ms cue +
    // 1000ms grant hold + audit settle). The badge is offered on every
    // 100ms poll, yet only one request can be in flight.
    tokio::time::sleep(Duration::from_millis(1300)).await;
    assert_eq!(endpoint.requests().len(), 1);

    tokio::time::sleep(Duration::from_millis(1300)).await;
    assert_eq!(endpoint.requests().len(), 2);
    assert_eq!(handles.eeprom.read(8, 1)[0], ResultKind::Granted.as_byte());

    loop_task.abort();
}
