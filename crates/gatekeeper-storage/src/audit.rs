//! Persistent audit ring over the EEPROM.
//!
//! The 512-byte array is carved into 16-byte slots, one access decision
//! per slot: the badge serial big-endian in bytes 0..8, the outcome kind
//! in byte 8, the remainder reserved (`0xFF`). Slots are consumed in
//! order and wrap, so the log always holds the most recent decisions.
//! The last page of the array is not a slot; it persists the next-slot
//! index so the ring survives power cycles.

use crate::eeprom::Eeprom25lc040;
use crate::error::{StorageError, StorageResult};
use gatekeeper_core::constants::{
    AUDIT_INDEX_ADDR, AUDIT_SLOT_COUNT, AUDIT_SLOT_SIZE,
};
use gatekeeper_core::{AuditRecord, ResultKind};
use gatekeeper_hardware::SpiBus;
use tracing::{debug, warn};

/// How the ring position is established when the log is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexRecovery {
    /// Read the persisted next-slot index and resume there. A fresh or
    /// unreadable index falls back to slot zero.
    #[default]
    Persisted,

    /// Start at slot zero regardless of what is persisted, overwriting
    /// older entries as the ring advances.
    Reset,
}

/// Sink for committed access decisions.
pub trait AuditSink: Send {
    /// Persist one decision and return the record describing where it
    /// landed.
    fn commit(
        &mut self,
        serial_number: u64,
        kind: ResultKind,
    ) -> impl Future<Output = StorageResult<AuditRecord>> + Send;
}

/// Audit ring backed by a [`Eeprom25lc040`].
#[derive(Debug)]
pub struct AuditLog<B> {
    eeprom: Eeprom25lc040<B>,
    next_slot: u16,
    recovery: IndexRecovery,
}

impl<B: SpiBus> AuditLog<B> {
    /// Attach to the audit region, establishing the ring position per
    /// `recovery`.
    ///
    /// # Errors
    ///
    /// Returns a bus error if the persisted index cannot be read.
    pub async fn attach(
        mut eeprom: Eeprom25lc040<B>,
        recovery: IndexRecovery,
    ) -> StorageResult<Self> {
        let next_slot = match recovery {
            IndexRecovery::Reset => 0,
            IndexRecovery::Persisted => {
                let raw = eeprom.read_byte(AUDIT_INDEX_ADDR).await?;
                let slot = u16::from(raw);
                if slot < AUDIT_SLOT_COUNT {
                    slot
                } else {
                    // 0xFF on a fresh chip, anything else is stale
                    if raw != 0xFF {
                        warn!(raw, "persisted audit index out of range, restarting ring");
                    }
                    0
                }
            }
        };

        debug!(next_slot, ?recovery, "audit log attached");
        Ok(Self {
            eeprom,
            next_slot,
            recovery,
        })
    }

    /// Slot the next commit will occupy.
    pub fn next_slot(&self) -> u16 {
        self.next_slot
    }

    /// Read back the serial number stored in `slot`, reassembled
    /// most-significant byte first.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a slot outside the ring, or a bus
    /// error if a read fails.
    pub async fn read_serial(&mut self, slot: u16) -> StorageResult<u64> {
        let base = Self::slot_address(slot)?;

        let mut serial: u64 = 0;
        for offset in 0..8 {
            let byte = self.eeprom.read_byte(base + offset).await?;
            serial = (serial << 8) | u64::from(byte);
        }
        Ok(serial)
    }

    /// Read back the full record stored in `slot`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a slot outside the ring,
    /// `CorruptRecord` if the outcome byte does not name a known kind,
    /// or a bus error if a read fails.
    pub async fn read_record(&mut self, slot: u16) -> StorageResult<AuditRecord> {
        let base = Self::slot_address(slot)?;
        let serial_number = self.read_serial(slot).await?;

        let kind_byte = self.eeprom.read_byte(base + 8).await?;
        let result_kind = ResultKind::from_byte(kind_byte).ok_or_else(|| {
            StorageError::CorruptRecord {
                slot_address: base,
                message: format!("unknown outcome byte {kind_byte:#04x}"),
            }
        })?;

        Ok(AuditRecord {
            serial_number,
            result_kind,
            slot_address: base,
        })
    }

    fn slot_address(slot: u16) -> StorageResult<u16> {
        if slot >= AUDIT_SLOT_COUNT {
            return Err(StorageError::InvalidArgument(format!(
                "slot {slot} outside ring of {AUDIT_SLOT_COUNT}"
            )));
        }
        Ok(slot * AUDIT_SLOT_SIZE as u16)
    }
}

impl<B: SpiBus + Sync> AuditSink for AuditLog<B> {
    async fn commit(
        &mut self,
        serial_number: u64,
        kind: ResultKind,
    ) -> StorageResult<AuditRecord> {
        let slot_address = Self::slot_address(self.next_slot)?;

        let mut page = [0xFFu8; AUDIT_SLOT_SIZE];
        page[..8].copy_from_slice(&serial_number.to_be_bytes());
        page[8] = kind.as_byte();
        self.eeprom.write_page(slot_address, &page).await?;

        let record = AuditRecord {
            serial_number,
            result_kind: kind,
            slot_address,
        };

        self.next_slot = (self.next_slot + 1) % AUDIT_SLOT_COUNT;
        if self.recovery == IndexRecovery::Persisted {
            self.eeprom
                .write_byte(AUDIT_INDEX_ADDR, self.next_slot as u8)
                .await?;
        }

        debug!(
            serial = serial_number,
            kind = ?kind,
            address = format_args!("{slot_address:#05x}"),
            "audit record committed"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatekeeper_hardware::mock::SimEeprom;
    use rstest::rstest;

    async fn fresh_log() -> (AuditLog<SimEeprom>, gatekeeper_hardware::mock::SimEepromHandle) {
        let (device, handle) = SimEeprom::new();
        let log = AuditLog::attach(Eeprom25lc040::new(device), IndexRecovery::Persisted)
            .await
            .unwrap();
        (log, handle)
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(62_984_291_464)]
    #[case(u64::MAX)]
    #[tokio::test(start_paused = true)]
    async fn serial_survives_the_round_trip(#[case] serial: u64) {
        let (mut log, _handle) = fresh_log().await;

        let record = log.commit(serial, ResultKind::Granted).await.unwrap();
        assert_eq!(record.slot_address, 0);
        assert_eq!(log.read_serial(0).await.unwrap(), serial);
    }

    #[tokio::test(start_paused = true)]
    async fn record_carries_the_outcome() {
        let (mut log, handle) = fresh_log().await;

        log.commit(0xAB_CD, ResultKind::TimedOut).await.unwrap();

        let record = log.read_record(0).await.unwrap();
        assert_eq!(record.serial_number, 0xAB_CD);
        assert_eq!(record.result_kind, ResultKind::TimedOut);

        // On the wire: 8 bytes of serial, outcome, reserved 0xFF tail
        let raw = handle.read(0, 16);
        assert_eq!(&raw[..8], &0xAB_CDu64.to_be_bytes());
        assert_eq!(raw[8], ResultKind::TimedOut.as_byte());
        assert!(raw[9..].iter().all(|b| *b == 0xFF));
    }

    #[tokio::test(start_paused = true)]
    async fn slots_advance_and_wrap() {
        let (mut log, _handle) = fresh_log().await;

        for i in 0..u64::from(AUDIT_SLOT_COUNT) {
            let record = log.commit(i, ResultKind::Denied).await.unwrap();
            assert_eq!(record.slot_address, i as u16 * 16);
        }

        // The ring has wrapped; the next commit overwrites slot zero
        let record = log.commit(999, ResultKind::Granted).await.unwrap();
        assert_eq!(record.slot_address, 0);
        assert_eq!(log.read_serial(0).await.unwrap(), 999);
        // Its neighbor is untouched
        assert_eq!(log.read_serial(1).await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ring_position_survives_reattach() {
        let (device, _handle) = SimEeprom::new();

        let mut log = AuditLog::attach(
            Eeprom25lc040::new(device.clone()),
            IndexRecovery::Persisted,
        )
        .await
        .unwrap();
        log.commit(1, ResultKind::Granted).await.unwrap();
        log.commit(2, ResultKind::Denied).await.unwrap();
        drop(log);

        let log = AuditLog::attach(Eeprom25lc040::new(device), IndexRecovery::Persisted)
            .await
            .unwrap();
        assert_eq!(log.next_slot(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_recovery_ignores_the_persisted_index() {
        let (device, _handle) = SimEeprom::new();

        let mut log = AuditLog::attach(
            Eeprom25lc040::new(device.clone()),
            IndexRecovery::Persisted,
        )
        .await
        .unwrap();
        log.commit(1, ResultKind::Granted).await.unwrap();

        let mut log = AuditLog::attach(Eeprom25lc040::new(device), IndexRecovery::Reset)
            .await
            .unwrap();
        assert_eq!(log.next_slot(), 0);

        log.commit(7, ResultKind::Denied).await.unwrap();
        assert_eq!(log.read_serial(0).await.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_chip_starts_at_slot_zero() {
        let (log, _handle) = fresh_log().await;
        assert_eq!(log.next_slot(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_range_persisted_index_restarts_the_ring() {
        let (device, handle) = SimEeprom::new();
        handle.write_raw(usize::from(AUDIT_INDEX_ADDR), &[200]);

        let log = AuditLog::attach(Eeprom25lc040::new(device), IndexRecovery::Persisted)
            .await
            .unwrap();
        assert_eq!(log.next_slot(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_outcome_byte_is_a_corrupt_record() {
        let (mut log, handle) = fresh_log().await;

        log.commit(5, ResultKind::Granted).await.unwrap();
        handle.write_raw(8, &[0x7F]);

        let result = log.read_record(0).await;
        assert!(matches!(
            result,
            Err(StorageError::CorruptRecord { slot_address: 0, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_range_slot_is_rejected() {
        let (mut log, _handle) = fresh_log().await;

        let result = log.read_serial(AUDIT_SLOT_COUNT).await;
        assert!(matches!(result, Err(StorageError::InvalidArgument(_))));
    }
}
