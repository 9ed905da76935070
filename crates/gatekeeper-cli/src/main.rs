//! Demo binary: the full access pipeline over simulated hardware.
//!
//! Presents a handful of badges to a mock reader, carries each through the
//! controller (processing cue, authorization, grant/deny sequence, audit
//! commit), and dumps the resulting audit ring.
//!
//! By default authorization is decided locally (even serials grant, odd
//! serials deny). Set `GATEKEEPER_AUTHZ_ADDR` to a `host:port` to POST
//! against a real endpoint instead; the endpoint answers `1` to grant.

use anyhow::Result;
use gatekeeper_actuate::Sequencer;
use gatekeeper_authz::{
    Authorizer, AuthzClient, AuthzError, AuthzTransport, HttpResponse, HttpTransport,
    HttpTransportConfig,
};
use gatekeeper_controller::AccessController;
use gatekeeper_core::constants::AUDIT_SLOT_SIZE;
use gatekeeper_core::{ResultKind, TagEvent};
use gatekeeper_hardware::mock::{MockPin, MockPwm, SimEeprom, SimEepromHandle};
use gatekeeper_reader::TagPoller;
use gatekeeper_storage::{AuditLog, Eeprom25lc040, IndexRecovery};
use std::collections::VecDeque;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Badges the demo presents, in order.
const DEMO_BADGES: [u64; 4] = [62_984_291_464, 1_193_046, 3_735_928_559, 287_454_020];

/// Mock reader fed from a fixed queue of badge serials.
struct DemoReader {
    badges: VecDeque<u64>,
}

impl DemoReader {
    fn new(badges: impl IntoIterator<Item = u64>) -> Self {
        Self {
            badges: badges.into_iter().collect(),
        }
    }
}

impl TagPoller for DemoReader {
    async fn poll(&mut self) -> Option<TagEvent> {
        self.badges.pop_front().map(TagEvent::new)
    }
}

/// Local stand-in for the authorization endpoint: even serials grant, odd
/// serials deny, so the demo shows both sequences.
#[derive(Debug, Clone)]
struct LocalEndpoint;

impl AuthzTransport for LocalEndpoint {
    async fn post(
        &self,
        _path: &'static str,
        body: String,
    ) -> Result<HttpResponse, AuthzError> {
        let grants = body
            .chars()
            .rev()
            .find(char::is_ascii_digit)
            .is_some_and(|last| last.to_digit(10).unwrap_or(1) % 2 == 0);
        Ok(HttpResponse {
            status: 200,
            body: if grants { b"1".to_vec() } else { b"0".to_vec() },
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatekeeper=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match std::env::var("GATEKEEPER_AUTHZ_ADDR") {
        Ok(addr) => {
            info!(addr, "authorizing against a live endpoint");
            let transport = HttpTransport::new(HttpTransportConfig {
                server_addr: addr.parse()?,
                ..HttpTransportConfig::default()
            });
            run_demo(AuthzClient::new(transport)).await
        }
        Err(_) => {
            info!("authorizing locally (even serials grant, odd serials deny)");
            run_demo(AuthzClient::new(LocalEndpoint)).await
        }
    }
}

async fn run_demo<A: Authorizer>(authorizer: A) -> Result<()> {
    let (grant, _) = MockPin::new();
    let (deny, _) = MockPin::new();
    let (buzzer, _) = MockPwm::new();
    let (device, eeprom) = SimEeprom::new();

    let audit = AuditLog::attach(Eeprom25lc040::new(device), IndexRecovery::Persisted).await?;
    let mut controller = AccessController::new(
        DemoReader::new(DEMO_BADGES),
        authorizer,
        Sequencer::new(grant, deny, buzzer),
        audit,
    );

    let mut committed = 0;
    while let Some(outcome) = controller.run_once().await? {
        info!(
            serial = outcome.serial_number,
            result = ?outcome.result,
            decision = ?outcome.decision,
            slot = outcome.record.as_ref().map(|r| r.slot_address),
            at = %outcome.decided_at,
            "badge decided"
        );
        committed += 1;
    }

    dump_audit_ring(&eeprom, committed);
    Ok(())
}

/// Print the committed slots of the audit ring straight from the array.
fn dump_audit_ring(eeprom: &SimEepromHandle, committed: usize) {
    info!("audit ring ({committed} records):");
    for slot in 0..committed {
        let raw = eeprom.read(slot * AUDIT_SLOT_SIZE, 9);
        let mut serial: u64 = 0;
        for byte in &raw[..8] {
            serial = (serial << 8) | u64::from(*byte);
        }
        let kind = ResultKind::from_byte(raw[8])
            .map(|k| format!("{k:?}"))
            .unwrap_or_else(|| format!("corrupt ({:#04x})", raw[8]));
        info!("  slot {slot}: serial {serial} -> {kind}");
    }
}
