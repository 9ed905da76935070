//! MFRC522 driver: register framing, tag polling, presence tracking.

use crate::presence::PresenceFilter;
use crate::registers::{
    CMD_IDLE, CMD_SOFT_RESET, CMD_TRANSCEIVE, ERROR_MASK, FIFO_FLUSH, IRQ_RX, IRQ_TIMER,
    PICC_ANTICOLL, PICC_REQA, REQA_FRAMING, Register, START_SEND,
};
use gatekeeper_core::TagEvent;
use gatekeeper_core::constants::{DEFAULT_ABSENT_AFTER, DEFAULT_PRESENT_AFTER};
use gatekeeper_hardware::{HardwareError, Result, SpiBus};
use std::future::Future;
use tracing::{debug, info, trace};

/// Bounded number of interrupt-register reads per transceive before the
/// attempt counts as a miss. Keeps `poll` within one bus-transaction
/// latency budget instead of spinning on a silent field.
const IRQ_POLL_ATTEMPTS: usize = 8;

/// Source of tag events for the access pipeline.
///
/// The controller is generic over this seam; the MFRC522 driver implements
/// it for production and tests substitute scripted pollers.
pub trait TagPoller: Send {
    /// Poll the field once.
    ///
    /// Returns a [`TagEvent`] only on a presence edge. "No tag", a bus
    /// fault, and a tag already being tracked all return `None`.
    fn poll(&mut self) -> impl Future<Output = Option<TagEvent>> + Send;
}

/// Presence hysteresis configuration for [`Rc522`].
#[derive(Debug, Clone, Copy)]
pub struct Rc522Config {
    /// Consecutive agreeing reads before a tag counts as present.
    pub present_after: u8,

    /// Consecutive failed polls before the tag counts as absent.
    pub absent_after: u8,
}

impl Default for Rc522Config {
    fn default() -> Self {
        Self {
            present_after: DEFAULT_PRESENT_AFTER,
            absent_after: DEFAULT_ABSENT_AFTER,
        }
    }
}

/// MFRC522 contactless reader driver.
///
/// Owns its bus handle exclusively; all register access is serialized by
/// construction because every transaction goes through `&mut self`.
#[derive(Debug)]
pub struct Rc522<B> {
    bus: B,
    filter: PresenceFilter,
}

impl<B: SpiBus> Rc522<B> {
    /// Create a driver with default presence hysteresis.
    pub fn new(bus: B) -> Self {
        Self::with_config(bus, Rc522Config::default())
    }

    /// Create a driver with explicit hysteresis thresholds.
    pub fn with_config(bus: B, config: Rc522Config) -> Self {
        Self {
            bus,
            filter: PresenceFilter::new(config.present_after, config.absent_after),
        }
    }

    /// Initialize the chip: soft reset, 14443-A timing defaults, antenna
    /// on. Returns the version register for a link sanity check.
    ///
    /// # Errors
    ///
    /// Returns a bus error if any init transaction fails; init faults are
    /// worth escalating, unlike poll faults.
    pub async fn init(&mut self) -> Result<u8> {
        self.write_register(Register::Command, CMD_SOFT_RESET).await?;

        // Timeout timer: ~25us ticks, 30-tick reload window
        self.write_register(Register::TMode, 0x8D).await?;
        self.write_register(Register::TPrescaler, 0x3E).await?;
        self.write_register(Register::TReloadLo, 30).await?;
        self.write_register(Register::TReloadHi, 0).await?;

        // 100% ASK modulation, CRC preset 0x6363
        self.write_register(Register::TxAsk, 0x40).await?;
        self.write_register(Register::Mode, 0x3D).await?;

        let tx_control = self.read_register(Register::TxControl).await?;
        if tx_control & 0x03 != 0x03 {
            self.write_register(Register::TxControl, tx_control | 0x03)
                .await?;
        }

        let version = self.read_register(Register::Version).await?;
        info!(version = format_args!("{version:#04x}"), "reader initialized");
        Ok(version)
    }

    /// Whether the presence filter currently tracks a tag.
    pub fn tag_present(&self) -> bool {
        self.filter.is_present()
    }

    async fn write_register(&mut self, reg: Register, value: u8) -> Result<()> {
        self.bus.write(&[reg.write_address(), value]).await
    }

    /// Multi-byte register write: address byte plus `n` data bytes.
    async fn write_register_all(&mut self, reg: Register, data: &[u8]) -> Result<()> {
        let mut frame = Vec::with_capacity(data.len() + 1);
        frame.push(reg.write_address());
        frame.extend_from_slice(data);
        self.bus.write(&frame).await
    }

    /// 16-bit read exchange; the data byte arrives at offset 1.
    async fn read_register(&mut self, reg: Register) -> Result<u8> {
        let mut rx = [0u8; 1];
        self.bus.transfer(&[reg.read_address()], &mut rx).await?;
        Ok(rx[0])
    }

    /// Run one transceive: load the FIFO, start transmission with the
    /// given bit framing, wait for a response, check the error register.
    async fn transceive(&mut self, data: &[u8], bit_framing: u8) -> Result<()> {
        self.write_register(Register::Command, CMD_IDLE).await?;
        self.write_register(Register::FifoLevel, FIFO_FLUSH).await?;
        self.write_register_all(Register::FifoData, data).await?;
        self.write_register(Register::Command, CMD_TRANSCEIVE).await?;
        self.write_register(Register::BitFraming, START_SEND | bit_framing)
            .await?;

        self.wait_for_response().await?;

        let error = self.read_register(Register::Error).await?;
        if error & ERROR_MASK != 0 {
            return Err(HardwareError::bus(format!(
                "transceive error bits {error:#04x}"
            )));
        }
        Ok(())
    }

    async fn wait_for_response(&mut self) -> Result<()> {
        for _ in 0..IRQ_POLL_ATTEMPTS {
            let irq = self.read_register(Register::ComIrq).await?;
            if irq & IRQ_RX != 0 {
                return Ok(());
            }
            if irq & IRQ_TIMER != 0 {
                return Err(HardwareError::bus("no response before timer expiry"));
            }
            tokio::task::yield_now().await;
        }
        Err(HardwareError::bus("no response from field"))
    }

    /// REQA short frame: wakes idle tags in the field.
    async fn request(&mut self) -> Result<()> {
        self.transceive(&[PICC_REQA], REQA_FRAMING).await
    }

    /// Cascade-level-1 anticollision: returns the 4-byte UID after
    /// verifying its BCC.
    async fn anticollision(&mut self) -> Result<[u8; 4]> {
        self.transceive(&PICC_ANTICOLL, 0).await?;

        let level = self.read_register(Register::FifoLevel).await?;
        if level < 5 {
            return Err(HardwareError::bus(format!(
                "anticollision returned {level} bytes, expected 5"
            )));
        }

        let mut frame = [0u8; 5];
        for byte in &mut frame {
            *byte = self.read_register(Register::FifoData).await?;
        }

        let uid = [frame[0], frame[1], frame[2], frame[3]];
        let bcc = uid.iter().fold(0, |acc, b| acc ^ b);
        if bcc != frame[4] {
            return Err(HardwareError::bus(format!(
                "UID BCC mismatch: computed {bcc:#04x}, got {:#04x}",
                frame[4]
            )));
        }
        Ok(uid)
    }

    /// One complete tag read: REQA then anticollision, UID widened
    /// most-significant-byte-first.
    async fn read_serial(&mut self) -> Result<u64> {
        self.request().await?;
        let uid = self.anticollision().await?;
        Ok(uid.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
    }
}

impl<B: SpiBus> TagPoller for Rc522<B> {
    async fn poll(&mut self) -> Option<TagEvent> {
        let reading = match self.read_serial().await {
            Ok(serial) => {
                trace!(serial, "tag read");
                Some(serial)
            }
            Err(err) => {
                // Card absence and bus glitches are indistinguishable here
                trace!(%err, "poll miss");
                None
            }
        };

        let edge = self.filter.observe(reading);
        if let Some(serial) = edge {
            debug!(serial, "tag presence edge");
        }
        edge.map(TagEvent::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatekeeper_hardware::mock::{MockSpiBus, MockSpiBusHandle};

    /// Script every bus transaction of one successful poll for `uid`.
    fn script_poll(handle: &MockSpiBusHandle, uid: [u8; 4]) {
        script_poll_with_bcc(handle, uid, uid.iter().fold(0, |acc, b| acc ^ b));
    }

    fn script_poll_with_bcc(handle: &MockSpiBusHandle, uid: [u8; 4], bcc: u8) {
        // REQA transceive
        handle.expect_write(vec![0x02, CMD_IDLE]);
        handle.expect_write(vec![0x14, FIFO_FLUSH]);
        handle.expect_write(vec![0x12, PICC_REQA]);
        handle.expect_write(vec![0x02, CMD_TRANSCEIVE]);
        handle.expect_write(vec![0x1A, START_SEND | REQA_FRAMING]);
        handle.expect_transfer(vec![0x88], vec![IRQ_RX]);
        handle.expect_transfer(vec![0x8C], vec![0x00]);

        // Anticollision transceive
        handle.expect_write(vec![0x02, CMD_IDLE]);
        handle.expect_write(vec![0x14, FIFO_FLUSH]);
        handle.expect_write(vec![0x12, 0x93, 0x20]);
        handle.expect_write(vec![0x02, CMD_TRANSCEIVE]);
        handle.expect_write(vec![0x1A, START_SEND]);
        handle.expect_transfer(vec![0x88], vec![IRQ_RX]);
        handle.expect_transfer(vec![0x8C], vec![0x00]);

        // FIFO holds UID + BCC
        handle.expect_transfer(vec![0x94], vec![0x05]);
        for byte in uid {
            handle.expect_transfer(vec![0x92], vec![byte]);
        }
        handle.expect_transfer(vec![0x92], vec![bcc]);
    }

    fn immediate_reader(bus: MockSpiBus) -> Rc522<MockSpiBus> {
        Rc522::with_config(
            bus,
            Rc522Config {
                present_after: 1,
                absent_after: 1,
            },
        )
    }

    #[tokio::test]
    async fn init_configures_timer_and_antenna() {
        let (bus, handle) = MockSpiBus::new();
        handle.expect_write(vec![0x02, CMD_SOFT_RESET]);
        handle.expect_write(vec![0x54, 0x8D]); // TMode
        handle.expect_write(vec![0x56, 0x3E]); // TPrescaler
        handle.expect_write(vec![0x5A, 30]); // TReloadLo
        handle.expect_write(vec![0x58, 0]); // TReloadHi
        handle.expect_write(vec![0x2A, 0x40]); // TxAsk
        handle.expect_write(vec![0x22, 0x3D]); // Mode
        handle.expect_transfer(vec![0xA8], vec![0x80]); // TxControl, antenna off
        handle.expect_write(vec![0x28, 0x83]); // antenna on
        handle.expect_transfer(vec![0xEE], vec![0x92]); // Version

        let mut reader = immediate_reader(bus);
        assert_eq!(reader.init().await.unwrap(), 0x92);
        assert_eq!(handle.remaining(), 0);
    }

    #[tokio::test]
    async fn init_skips_antenna_write_when_already_on() {
        let (bus, handle) = MockSpiBus::new();
        handle.expect_write(vec![0x02, CMD_SOFT_RESET]);
        handle.expect_write(vec![0x54, 0x8D]);
        handle.expect_write(vec![0x56, 0x3E]);
        handle.expect_write(vec![0x5A, 30]);
        handle.expect_write(vec![0x58, 0]);
        handle.expect_write(vec![0x2A, 0x40]);
        handle.expect_write(vec![0x22, 0x3D]);
        handle.expect_transfer(vec![0xA8], vec![0x83]); // drivers already enabled
        handle.expect_transfer(vec![0xEE], vec![0x92]);

        let mut reader = immediate_reader(bus);
        assert_eq!(reader.init().await.unwrap(), 0x92);
        assert_eq!(handle.remaining(), 0);
    }

    #[tokio::test]
    async fn poll_emits_event_with_widened_serial() {
        let (bus, handle) = MockSpiBus::new();
        script_poll(&handle, [0xDE, 0xAD, 0xBE, 0xEF]);

        let mut reader = immediate_reader(bus);
        let event = reader.poll().await.expect("presence edge");
        assert_eq!(event.serial_number, 0xDEAD_BEEF);
        assert_eq!(handle.remaining(), 0);
    }

    #[tokio::test]
    async fn repeated_reads_do_not_re_trigger() {
        let (bus, handle) = MockSpiBus::new();
        script_poll(&handle, [0x01, 0x02, 0x03, 0x04]);
        script_poll(&handle, [0x01, 0x02, 0x03, 0x04]);

        let mut reader = immediate_reader(bus);
        assert!(reader.poll().await.is_some());
        // Same tag still in the field: no new event
        assert!(reader.poll().await.is_none());
        assert!(reader.tag_present());
    }

    #[tokio::test]
    async fn bus_failure_reads_as_no_tag() {
        let (bus, handle) = MockSpiBus::new();
        handle.fail_next();

        let mut reader = immediate_reader(bus);
        assert!(reader.poll().await.is_none());
        assert!(!reader.tag_present());
    }

    #[tokio::test]
    async fn bcc_mismatch_discards_the_read() {
        let (bus, handle) = MockSpiBus::new();
        script_poll_with_bcc(&handle, [0x01, 0x02, 0x03, 0x04], 0x00);

        let mut reader = immediate_reader(bus);
        assert!(reader.poll().await.is_none());
        assert!(!reader.tag_present());
    }

    #[tokio::test]
    async fn transceive_error_bits_count_as_miss() {
        let (bus, handle) = MockSpiBus::new();
        handle.expect_write(vec![0x02, CMD_IDLE]);
        handle.expect_write(vec![0x14, FIFO_FLUSH]);
        handle.expect_write(vec![0x12, PICC_REQA]);
        handle.expect_write(vec![0x02, CMD_TRANSCEIVE]);
        handle.expect_write(vec![0x1A, START_SEND | REQA_FRAMING]);
        handle.expect_transfer(vec![0x88], vec![IRQ_RX]);
        handle.expect_transfer(vec![0x8C], vec![0x08]); // collision bit

        let mut reader = immediate_reader(bus);
        assert!(reader.poll().await.is_none());
    }

    #[tokio::test]
    async fn timer_expiry_is_an_empty_field() {
        let (bus, handle) = MockSpiBus::new();
        handle.expect_write(vec![0x02, CMD_IDLE]);
        handle.expect_write(vec![0x14, FIFO_FLUSH]);
        handle.expect_write(vec![0x12, PICC_REQA]);
        handle.expect_write(vec![0x02, CMD_TRANSCEIVE]);
        handle.expect_write(vec![0x1A, START_SEND | REQA_FRAMING]);
        handle.expect_transfer(vec![0x88], vec![IRQ_TIMER]);

        let mut reader = immediate_reader(bus);
        assert!(reader.poll().await.is_none());
        // No further transactions after the timer fired
        assert_eq!(handle.remaining(), 0);
    }
}
