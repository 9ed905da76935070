//! 25LC040-class serial EEPROM driver.
//!
//! Frames the six-instruction command set of a 4-Kbit SPI EEPROM
//! (Microchip 25LC040A data sheet, section 3): READ/WRITE carry the ninth
//! address bit folded into bit 3 of the instruction byte, WREN/WRDI gate
//! the write latch, RDSR/WRSR access the status register.
//!
//! Two invariants the driver enforces rather than documents:
//!
//! - every write instruction is bracketed by `write_enable` before and
//!   `write_disable` after, and is followed by the device's fixed internal
//!   write-cycle settle delay before any further transaction;
//! - a page write never exceeds the 16-byte page size. Oversized requests
//!   fail with `InvalidArgument` before any bus traffic.
//!
//! Addresses beyond the device capacity are a protocol-level constraint
//! and are not validated here; callers respect the 512-byte range.

use crate::error::{StorageError, StorageResult};
use gatekeeper_core::constants::{EEPROM_PAGE_SIZE, EEPROM_WRITE_SETTLE};
use gatekeeper_hardware::SpiBus;
use tracing::trace;

// Instruction set, 25LC040A data sheet table 2-1
const CMD_WRSR: u8 = 0x01;
const CMD_WRITE: u8 = 0x02;
const CMD_READ: u8 = 0x03;
const CMD_WRDI: u8 = 0x04;
const CMD_RDSR: u8 = 0x05;
const CMD_WREN: u8 = 0x06;

/// Bit of the instruction byte carrying address bit 8.
const ADDR_MSB_BIT: u8 = 0x08;

/// Fold the ninth address bit into the instruction byte.
fn instruction(opcode: u8, address: u16) -> [u8; 2] {
    let msb = if address & 0x100 != 0 { ADDR_MSB_BIT } else { 0 };
    [opcode | msb, address as u8]
}

/// Driver for a 4-Kbit (512 x 8) serial EEPROM.
///
/// Owns its bus handle exclusively. All operations are `&mut self`, so
/// transactions on one device never interleave.
#[derive(Debug)]
pub struct Eeprom25lc040<B> {
    bus: B,
}

impl<B: SpiBus> Eeprom25lc040<B> {
    /// Take ownership of the device's bus handle.
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Read one byte.
    ///
    /// # Errors
    ///
    /// Returns a bus error if the transaction does not complete.
    pub async fn read_byte(&mut self, address: u16) -> StorageResult<u8> {
        let mut rx = [0u8; 1];
        self.bus
            .transfer(&instruction(CMD_READ, address), &mut rx)
            .await?;
        Ok(rx[0])
    }

    /// Write one byte, bracketed by write-enable/disable and followed by
    /// the device's settle delay.
    ///
    /// # Errors
    ///
    /// Returns a bus error if any transaction in the bracket fails.
    pub async fn write_byte(&mut self, address: u16, data: u8) -> StorageResult<()> {
        self.write_enable().await?;

        let [opcode, low] = instruction(CMD_WRITE, address);
        self.bus.write(&[opcode, low, data]).await?;
        self.settle().await;

        self.write_disable().await
    }

    /// Write up to one page of contiguous bytes in a single transaction.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` without touching the bus if `data` is
    /// empty or longer than the 16-byte page size, or a bus error if a
    /// transaction in the bracket fails.
    pub async fn write_page(&mut self, address: u16, data: &[u8]) -> StorageResult<()> {
        if data.is_empty() {
            return Err(StorageError::InvalidArgument(
                "page write needs at least one byte".into(),
            ));
        }
        if data.len() > EEPROM_PAGE_SIZE {
            return Err(StorageError::InvalidArgument(format!(
                "page write of {} bytes exceeds page size {EEPROM_PAGE_SIZE}",
                data.len()
            )));
        }

        self.write_enable().await?;

        let [opcode, low] = instruction(CMD_WRITE, address);
        let mut frame = Vec::with_capacity(2 + data.len());
        frame.push(opcode);
        frame.push(low);
        frame.extend_from_slice(data);
        self.bus.write(&frame).await?;
        self.settle().await;

        trace!(address = format_args!("{address:#05x}"), len = data.len(), "page written");
        self.write_disable().await
    }

    /// Set the write-enable latch.
    ///
    /// # Errors
    ///
    /// Returns a bus error if the transaction does not complete.
    pub async fn write_enable(&mut self) -> StorageResult<()> {
        self.bus.write(&[CMD_WREN]).await.map_err(Into::into)
    }

    /// Clear the write-enable latch.
    ///
    /// # Errors
    ///
    /// Returns a bus error if the transaction does not complete.
    pub async fn write_disable(&mut self) -> StorageResult<()> {
        self.bus.write(&[CMD_WRDI]).await.map_err(Into::into)
    }

    /// Read the status register.
    ///
    /// # Errors
    ///
    /// Returns a bus error if the transaction does not complete.
    pub async fn read_status(&mut self) -> StorageResult<u8> {
        let mut rx = [0u8; 1];
        self.bus.transfer(&[CMD_RDSR], &mut rx).await?;
        Ok(rx[0])
    }

    /// Write the status register (block-protection bits), with the same
    /// bracket and settle as a data write.
    ///
    /// # Errors
    ///
    /// Returns a bus error if any transaction in the bracket fails.
    pub async fn write_status(&mut self, status: u8) -> StorageResult<()> {
        self.write_enable().await?;
        self.bus.write(&[CMD_WRSR, status]).await?;
        self.settle().await;
        self.write_disable().await
    }

    /// Fixed internal write-cycle delay. A hard serialization point: the
    /// next transaction must not start before it elapses.
    async fn settle(&self) {
        tokio::time::sleep(EEPROM_WRITE_SETTLE).await;
    }
}
