//! Shared rig for the access flow tests: real pipeline stages over mock
//! hardware and a stubbed authorization endpoint.

use gatekeeper_actuate::Sequencer;
use gatekeeper_authz::{AuthzClient, AuthzError, AuthzTransport, HttpResponse};
use gatekeeper_controller::AccessController;
use gatekeeper_core::TagEvent;
use gatekeeper_hardware::mock::{
    MockPin, MockPinHandle, MockPwm, MockPwmHandle, SimEeprom, SimEepromHandle,
};
use gatekeeper_reader::TagPoller;
use gatekeeper_storage::{AuditLog, Eeprom25lc040, IndexRecovery};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Authorization endpoint stub: waits `delay`, then answers 200 with a
/// fixed body. Records every request body it receives.
#[derive(Debug, Clone)]
pub struct StubEndpoint {
    body: &'static [u8],
    delay: Duration,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubEndpoint {
    pub fn new(body: &'static [u8], delay: Duration) -> Self {
        Self {
            body,
            delay,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl AuthzTransport for StubEndpoint {
    async fn post(
        &self,
        _path: &'static str,
        body: String,
    ) -> Result<HttpResponse, AuthzError> {
        self.requests.lock().unwrap().push(body);
        tokio::time::sleep(self.delay).await;
        Ok(HttpResponse {
            status: 200,
            body: self.body.to_vec(),
        })
    }
}

/// Poller fed from a fixed queue of serials; yields `None` once drained.
pub struct ScriptedPoller {
    serials: VecDeque<u64>,
}

impl ScriptedPoller {
    pub fn new(serials: impl IntoIterator<Item = u64>) -> Self {
        Self {
            serials: serials.into_iter().collect(),
        }
    }
}

impl TagPoller for ScriptedPoller {
    async fn poll(&mut self) -> Option<TagEvent> {
        self.serials.pop_front().map(TagEvent::new)
    }
}

/// Poller that sees the same badge on every poll, as if it were held
/// against the reader.
pub struct ConstantPoller {
    serial: u64,
}

impl ConstantPoller {
    pub fn new(serial: u64) -> Self {
        Self { serial }
    }
}

impl TagPoller for ConstantPoller {
    async fn poll(&mut self) -> Option<TagEvent> {
        Some(TagEvent::new(self.serial))
    }
}

/// Inspection handles for everything the pipeline touches.
pub struct RigHandles {
    pub grant: MockPinHandle,
    pub deny: MockPinHandle,
    pub buzzer: MockPwmHandle,
    pub eeprom: SimEepromHandle,
}

/// A full controller over mock outputs, a fresh simulated EEPROM, and the
/// given poller and endpoint.
pub async fn rig<P: TagPoller>(
    poller: P,
    endpoint: StubEndpoint,
) -> (
    AccessController<P, AuthzClient<StubEndpoint>, Sequencer<MockPin, MockPin, MockPwm>, AuditLog<SimEeprom>>,
    RigHandles,
) {
    let (grant, grant_handle) = MockPin::new();
    let (deny, deny_handle) = MockPin::new();
    let (buzzer, buzzer_handle) = MockPwm::new();
    let (device, eeprom_handle) = SimEeprom::new();

    let audit = AuditLog::attach(Eeprom25lc040::new(device), IndexRecovery::Persisted)
        .await
        .expect("fresh simulated device");

    let controller = AccessController::new(
        poller,
        AuthzClient::new(endpoint),
        Sequencer::new(grant, deny, buzzer),
        audit,
    );

    (
        controller,
        RigHandles {
            grant: grant_handle,
            deny: deny_handle,
            buzzer: buzzer_handle,
            eeprom: eeprom_handle,
        },
    )
}
