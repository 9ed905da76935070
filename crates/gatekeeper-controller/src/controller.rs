//! The access controller event loop.

use crate::state::{ControllerState, StateMachine};
use chrono::{DateTime, Utc};
use gatekeeper_actuate::{Actuator, SequenceKind};
use gatekeeper_authz::Authorizer;
use gatekeeper_core::constants::{DEFAULT_AUTHZ_DEADLINE, DEFAULT_POLL_INTERVAL};
use gatekeeper_core::{AccessDecision, AuditRecord, AuthorizationResult, Result, TagEvent};
use gatekeeper_reader::TagPoller;
use gatekeeper_storage::AuditSink;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Timing knobs of the controller loop.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Interval between reader polls while idle.
    pub poll_interval: Duration,

    /// Authorization deadline, armed the moment a tag event is accepted.
    pub authz_deadline: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            authz_deadline: DEFAULT_AUTHZ_DEADLINE,
        }
    }
}

/// Everything the pipeline produced for one badge presentation.
#[derive(Debug, Clone)]
pub struct AccessOutcome {
    /// The badge serial that was decided.
    pub serial_number: u64,

    /// Verbatim authorization result, before reduction.
    pub result: AuthorizationResult,

    /// The decision that actually drove the outputs.
    pub decision: AccessDecision,

    /// Where the audit record landed, if the commit succeeded.
    pub record: Option<AuditRecord>,

    /// Wall-clock time the decision was made.
    pub decided_at: DateTime<Utc>,
}

/// The access controller: one task owning the reader, the authorizer, the
/// actuator, the audit sink, and the state machine end to end.
///
/// Single-visitor by design: one badge presentation is carried through the
/// whole `Idle → … → Idle` cycle before the reader is polled again, so
/// there is never more than one authorization in flight and tags presented
/// mid-pipeline are simply not seen. The deadline is armed the moment the
/// event is accepted; the time the processing cue takes comes out of the
/// authorization budget, not on top of it.
///
/// Liveness: no driver fault unwinds past `handle_event`. A failing
/// actuator or audit sink is logged and the cycle completes; a wedged
/// reader or authorization path degrades to "every tag denied".
pub struct AccessController<P, A, S, Q> {
    poller: P,
    authorizer: A,
    actuator: S,
    audit: Q,
    machine: StateMachine,
    config: ControllerConfig,
}

impl<P, A, S, Q> AccessController<P, A, S, Q>
where
    P: TagPoller,
    A: Authorizer,
    S: Actuator,
    Q: AuditSink,
{
    /// Bind the four pipeline stages together with default timing.
    pub fn new(poller: P, authorizer: A, actuator: S, audit: Q) -> Self {
        Self::with_config(poller, authorizer, actuator, audit, ControllerConfig::default())
    }

    /// Bind the pipeline with explicit timing.
    pub fn with_config(
        poller: P,
        authorizer: A,
        actuator: S,
        audit: Q,
        config: ControllerConfig,
    ) -> Self {
        Self {
            poller,
            authorizer,
            actuator,
            audit,
            machine: StateMachine::new(),
            config,
        }
    }

    /// The state the pipeline is currently in.
    pub fn state(&self) -> ControllerState {
        *self.machine.current_state()
    }

    /// The state machine, for diagnostics.
    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    /// Carry one tag event through the full pipeline.
    ///
    /// Always comes back to `Idle` with a decision; the only error path is
    /// an illegal transition, which means the controller was called while
    /// a previous event was still mid-cycle.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` if the pipeline is not in `Idle`.
    pub async fn handle_event(&mut self, event: TagEvent) -> Result<AccessOutcome> {
        let serial = event.serial_number;

        self.machine.transition_to(ControllerState::Pending)?;
        info!(serial, "tag event accepted");

        // The deadline covers the whole pipeline from acceptance, so the
        // processing cue eats into the authorization budget.
        let deadline_at = Instant::now() + self.config.authz_deadline;
        if let Err(e) = self.actuator.run(SequenceKind::Pending).await {
            warn!(serial, "processing cue failed: {e}");
        }

        self.machine.transition_to(ControllerState::Deciding)?;
        let remaining = deadline_at.saturating_duration_since(Instant::now());
        let result = self.authorizer.authorize(serial, remaining).await;
        let decision = result.reduce();
        info!(serial, result = ?result, decision = ?decision, "decision made");

        self.machine.transition_to(ControllerState::Actuating)?;
        let sequence = match decision {
            AccessDecision::Granted => SequenceKind::Granted,
            AccessDecision::Denied => SequenceKind::Denied,
        };
        if let Err(e) = self.actuator.run(sequence).await {
            warn!(serial, "decision sequence failed: {e}");
        }

        self.machine.transition_to(ControllerState::Logging)?;
        let record = match self.audit.commit(serial, result.kind()).await {
            Ok(record) => Some(record),
            Err(e) => {
                // Best effort: a full or faulty log never holds the door
                warn!(serial, "audit commit failed: {e}");
                None
            }
        };

        self.machine.transition_to(ControllerState::Idle)?;

        Ok(AccessOutcome {
            serial_number: serial,
            result,
            decision,
            record,
            decided_at: Utc::now(),
        })
    }

    /// Poll the reader once and, if a tag event fires from `Idle`, carry
    /// it through the pipeline.
    ///
    /// Events observed while the pipeline is mid-cycle are dropped with a
    /// debug log; the single-visitor design has nowhere to queue them.
    ///
    /// # Errors
    ///
    /// Propagates `handle_event` errors.
    pub async fn run_once(&mut self) -> Result<Option<AccessOutcome>> {
        let Some(event) = self.poller.poll().await else {
            return Ok(None);
        };

        if self.state() != ControllerState::Idle {
            debug!(
                serial = event.serial_number,
                state = %self.machine.current_state(),
                "dropping event observed mid-pipeline"
            );
            return Ok(None);
        }

        self.handle_event(event).await.map(Some)
    }

    /// Drive the pipeline forever at the configured poll cadence.
    ///
    /// Polls skipped while a badge is mid-pipeline are not made up for;
    /// the loop resumes its cadence from the next tick.
    pub async fn run(&mut self) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            deadline_ms = self.config.authz_deadline.as_millis() as u64,
            "access controller running"
        );

        loop {
            ticker.tick().await;
            if let Err(e) = self.run_once().await {
                // An illegal transition is a pipeline bug; recover the
                // machine rather than wedging the door.
                warn!("pipeline error, resetting to idle: {e}");
                self.machine.reset();
            }
        }
    }
}
