//! MFRC522 register map subset and command constants.
//!
//! Only the registers the polling path touches are listed; the full map is
//! in the MFRC522 datasheet, section 9.

/// Registers used by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum Register {
    /// Starts and stops command execution.
    Command = 0x01,

    /// Interrupt request bits for command completion.
    ComIrq = 0x04,

    /// Error bits of the last command.
    Error = 0x06,

    /// FIFO buffer input/output.
    FifoData = 0x09,

    /// Number of bytes in the FIFO; writing bit 7 flushes it.
    FifoLevel = 0x0A,

    /// Bit-oriented framing adjustments; bit 7 starts transmission.
    BitFraming = 0x0D,

    /// Transmit and receive mode defaults.
    Mode = 0x11,

    /// Antenna driver control.
    TxControl = 0x14,

    /// Transmit modulation (100% ASK).
    TxAsk = 0x15,

    /// Timer mode and prescaler high bits.
    TMode = 0x2A,

    /// Timer prescaler low bits.
    TPrescaler = 0x2B,

    /// Timer reload value, high byte.
    TReloadHi = 0x2C,

    /// Timer reload value, low byte.
    TReloadLo = 0x2D,

    /// Chip version, for the init-time probe.
    Version = 0x37,
}

impl Register {
    /// Address byte for a write: `(addr << 1)` with bits 7 and 0 clear.
    pub(crate) fn write_address(self) -> u8 {
        ((self as u8) << 1) & 0x7E
    }

    /// Address byte for a read: write address with bit 7 set.
    pub(crate) fn read_address(self) -> u8 {
        self.write_address() | 0x80
    }
}

// MFRC522 command set (datasheet table 149)
pub(crate) const CMD_IDLE: u8 = 0x00;
pub(crate) const CMD_TRANSCEIVE: u8 = 0x0C;
pub(crate) const CMD_SOFT_RESET: u8 = 0x0F;

// ComIrqReg bits
pub(crate) const IRQ_RX: u8 = 0x20;
pub(crate) const IRQ_TIMER: u8 = 0x01;

// ErrorReg bits that invalidate a received frame:
// protocol, parity, CRC and collision errors
pub(crate) const ERROR_MASK: u8 = 0x1B;

// FifoLevelReg flush bit
pub(crate) const FIFO_FLUSH: u8 = 0x80;

// BitFramingReg: StartSend plus the short-frame bit count for REQA
pub(crate) const START_SEND: u8 = 0x80;
pub(crate) const REQA_FRAMING: u8 = 0x07;

// ISO 14443-3 request codes
pub(crate) const PICC_REQA: u8 = 0x26;
pub(crate) const PICC_ANTICOLL: [u8; 2] = [0x93, 0x20];
