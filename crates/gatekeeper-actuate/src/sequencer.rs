//! Plays [`SequenceKind`]s against the physical outputs.

use crate::sequence::{SequenceKind, Step};
use gatekeeper_hardware::{OutputPin, PwmOutput, Result};
use tracing::{debug, trace};

/// Something that can play an actuation sequence to completion.
pub trait Actuator: Send {
    /// Play `kind` from start to finish, blocking for its total duration.
    fn run(&mut self, kind: SequenceKind) -> impl Future<Output = Result<()>> + Send;
}

/// Sequencer over two indicator pins and the buzzer PWM channel.
///
/// Owns all three outputs exclusively, so sequences can never interleave.
/// Whatever happens mid-sequence, the outputs are driven back to idle
/// (indicators off, buzzer silent) before `run` returns.
#[derive(Debug)]
pub struct Sequencer<G, D, Z> {
    grant: G,
    deny: D,
    buzzer: Z,
}

impl<G, D, Z> Sequencer<G, D, Z>
where
    G: OutputPin,
    D: OutputPin,
    Z: PwmOutput,
{
    /// Take ownership of the grant indicator, deny indicator, and buzzer.
    pub fn new(grant: G, deny: D, buzzer: Z) -> Self {
        Self {
            grant,
            deny,
            buzzer,
        }
    }

    async fn apply(&mut self, step: &Step) -> Result<()> {
        self.grant.set_level(step.grant).await?;
        self.deny.set_level(step.deny).await?;
        self.buzzer.set_duty(step.duty).await
    }

    async fn play(&mut self, kind: SequenceKind) -> Result<()> {
        for step in kind.steps() {
            trace!(
                grant = step.grant,
                deny = step.deny,
                duty = step.duty,
                hold_ms = step.hold.as_millis() as u64,
                "step"
            );
            self.apply(step).await?;
            tokio::time::sleep(step.hold).await;
        }
        Ok(())
    }

    async fn idle(&mut self) -> Result<()> {
        self.grant.set_level(false).await?;
        self.deny.set_level(false).await?;
        self.buzzer.set_duty(0.0).await
    }
}

impl<G, D, Z> Actuator for Sequencer<G, D, Z>
where
    G: OutputPin + Send,
    D: OutputPin + Send,
    Z: PwmOutput + Send,
{
    async fn run(&mut self, kind: SequenceKind) -> Result<()> {
        debug!(?kind, duration_ms = kind.total_duration().as_millis() as u64, "running sequence");

        // Idle the outputs even when a step fails partway through; the
        // first error still wins.
        let played = self.play(kind).await;
        let idled = self.idle().await;
        played.and(idled)
    }
}
