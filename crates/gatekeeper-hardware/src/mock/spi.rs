//! Bus test doubles: a strict scripted bus and a functional EEPROM model.

use crate::error::{HardwareError, Result};
use crate::traits::SpiBus;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One recorded bus transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusTransaction {
    /// Bytes clocked out.
    pub tx: Vec<u8>,

    /// Bytes clocked back in (0 for write-only transactions).
    pub rx_len: usize,
}

#[derive(Debug)]
enum Exchange {
    /// Expect a write-only transaction with exactly these bytes.
    Write { expect_tx: Vec<u8> },

    /// Expect a transfer with exactly these bytes, answer with `reply`.
    Transfer { expect_tx: Vec<u8>, reply: Vec<u8> },

    /// Fail the next transaction, whatever it is.
    Fault,
}

#[derive(Debug, Default)]
struct ScriptState {
    script: VecDeque<Exchange>,
    log: Vec<BusTransaction>,
}

/// Strict scripted bus.
///
/// Every transaction must match the next scripted exchange byte for byte;
/// anything else fails the transaction with a bus error. All traffic,
/// matching or not, lands in the transaction log so tests can assert both
/// what happened and what did not.
///
/// # Examples
///
/// ```
/// use gatekeeper_hardware::SpiBus;
/// use gatekeeper_hardware::mock::MockSpiBus;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> gatekeeper_hardware::Result<()> {
/// let (mut bus, handle) = MockSpiBus::new();
/// handle.expect_transfer(vec![0xB7], vec![0x92]);
///
/// let mut rx = [0u8; 1];
/// bus.transfer(&[0xB7], &mut rx).await?;
/// assert_eq!(rx[0], 0x92);
/// assert_eq!(handle.log().len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MockSpiBus {
    state: Arc<Mutex<ScriptState>>,
}

/// Handle for scripting a [`MockSpiBus`] and inspecting its traffic.
#[derive(Debug, Clone)]
pub struct MockSpiBusHandle {
    state: Arc<Mutex<ScriptState>>,
}

impl MockSpiBus {
    /// Create a scripted bus with its controlling handle.
    pub fn new() -> (Self, MockSpiBusHandle) {
        let state = Arc::new(Mutex::new(ScriptState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockSpiBusHandle { state },
        )
    }
}

impl MockSpiBusHandle {
    /// Script an expected write-only transaction.
    pub fn expect_write(&self, tx: Vec<u8>) {
        self.state
            .lock()
            .unwrap()
            .script
            .push_back(Exchange::Write { expect_tx: tx });
    }

    /// Script an expected transfer and the bytes it answers with.
    pub fn expect_transfer(&self, tx: Vec<u8>, reply: Vec<u8>) {
        self.state
            .lock()
            .unwrap()
            .script
            .push_back(Exchange::Transfer {
                expect_tx: tx,
                reply,
            });
    }

    /// Script a bus fault for the next transaction.
    pub fn fail_next(&self) {
        self.state.lock().unwrap().script.push_back(Exchange::Fault);
    }

    /// Snapshot of every transaction attempted so far.
    pub fn log(&self) -> Vec<BusTransaction> {
        self.state.lock().unwrap().log.clone()
    }

    /// Number of scripted exchanges not yet consumed.
    pub fn remaining(&self) -> usize {
        self.state.lock().unwrap().script.len()
    }
}

impl SpiBus for MockSpiBus {
    async fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.log.push(BusTransaction {
            tx: tx.to_vec(),
            rx_len: rx.len(),
        });

        match state.script.pop_front() {
            Some(Exchange::Transfer { expect_tx, reply }) => {
                if expect_tx != tx {
                    return Err(HardwareError::bus(format!(
                        "unexpected transfer: scripted {expect_tx:02X?}, got {tx:02X?}"
                    )));
                }
                if reply.len() != rx.len() {
                    return Err(HardwareError::bus(format!(
                        "reply length {} does not match rx buffer {}",
                        reply.len(),
                        rx.len()
                    )));
                }
                rx.copy_from_slice(&reply);
                Ok(())
            }
            Some(Exchange::Write { expect_tx }) => Err(HardwareError::bus(format!(
                "scripted write {expect_tx:02X?} but transfer {tx:02X?} was issued"
            ))),
            Some(Exchange::Fault) => Err(HardwareError::bus("injected bus fault")),
            None => Err(HardwareError::bus(format!(
                "unscripted transfer {tx:02X?}"
            ))),
        }
    }

    async fn write(&mut self, tx: &[u8]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.log.push(BusTransaction {
            tx: tx.to_vec(),
            rx_len: 0,
        });

        match state.script.pop_front() {
            Some(Exchange::Write { expect_tx }) => {
                if expect_tx != tx {
                    return Err(HardwareError::bus(format!(
                        "unexpected write: scripted {expect_tx:02X?}, got {tx:02X?}"
                    )));
                }
                Ok(())
            }
            Some(Exchange::Transfer { expect_tx, .. }) => Err(HardwareError::bus(format!(
                "scripted transfer {expect_tx:02X?} but write {tx:02X?} was issued"
            ))),
            Some(Exchange::Fault) => Err(HardwareError::bus("injected bus fault")),
            None => Err(HardwareError::bus(format!("unscripted write {tx:02X?}"))),
        }
    }
}

// 25LC040 instruction set, mirrored from the storage driver's framing.
const SIM_WRSR: u8 = 0x01;
const SIM_WRITE: u8 = 0x02;
const SIM_READ: u8 = 0x03;
const SIM_WRDI: u8 = 0x04;
const SIM_RDSR: u8 = 0x05;
const SIM_WREN: u8 = 0x06;

const SIM_CAPACITY: usize = 512;
const SIM_PAGE_SIZE: usize = 16;

/// Instruction bit carrying address bit 8.
const SIM_ADDR_MSB_BIT: u8 = 0x08;

#[derive(Debug)]
struct SimState {
    memory: [u8; SIM_CAPACITY],
    status: u8,
    write_enabled: bool,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            // Fresh EEPROMs read back all ones
            memory: [0xFF; SIM_CAPACITY],
            status: 0,
            write_enabled: false,
        }
    }
}

/// Functional model of a 4-Kbit (512 x 8) serial EEPROM.
///
/// Speaks the same instruction set the storage driver frames: READ/WRITE
/// with the ninth address bit folded into the instruction byte, WREN/WRDI
/// write-latch gating, RDSR/WRSR status access. Faithful to the silicon in
/// the ways that catch driver bugs:
///
/// - writes without a preceding WREN are silently ignored
/// - the write latch clears itself after a completed write
/// - page writes wrap within their 16-byte page, not across it
///
/// # Examples
///
/// ```
/// use gatekeeper_hardware::SpiBus;
/// use gatekeeper_hardware::mock::SimEeprom;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> gatekeeper_hardware::Result<()> {
/// let (mut device, handle) = SimEeprom::new();
/// device.write(&[0x06]).await?;             // WREN
/// device.write(&[0x02, 0x10, 0xAA]).await?; // WRITE 0x010 = 0xAA
/// assert_eq!(handle.read(0x10, 1), vec![0xAA]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SimEeprom {
    state: Arc<Mutex<SimState>>,
}

/// Handle for inspecting and seeding a [`SimEeprom`]'s memory directly.
#[derive(Debug, Clone)]
pub struct SimEepromHandle {
    state: Arc<Mutex<SimState>>,
}

impl SimEeprom {
    /// Create a blank (all `0xFF`) simulated device with its handle.
    pub fn new() -> (Self, SimEepromHandle) {
        let state = Arc::new(Mutex::new(SimState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            SimEepromHandle { state },
        )
    }
}

impl SimEepromHandle {
    /// Read `len` bytes starting at `addr` straight out of the array.
    pub fn read(&self, addr: usize, len: usize) -> Vec<u8> {
        let state = self.state.lock().unwrap();
        (0..len)
            .map(|i| state.memory[(addr + i) % SIM_CAPACITY])
            .collect()
    }

    /// Seed memory directly, bypassing the wire protocol.
    pub fn write_raw(&self, addr: usize, bytes: &[u8]) {
        let mut state = self.state.lock().unwrap();
        for (i, byte) in bytes.iter().enumerate() {
            state.memory[(addr + i) % SIM_CAPACITY] = *byte;
        }
    }

    /// Current state of the write-enable latch.
    pub fn write_enabled(&self) -> bool {
        self.state.lock().unwrap().write_enabled
    }
}

fn sim_addr(instruction: u8, low: u8) -> usize {
    let msb = usize::from(instruction & SIM_ADDR_MSB_BIT != 0);
    (msb << 8) | usize::from(low)
}

impl SpiBus for SimEeprom {
    async fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        if tx.is_empty() {
            return Err(HardwareError::bus("empty transaction"));
        }

        let state = self.state.lock().unwrap();
        match tx[0] & !SIM_ADDR_MSB_BIT {
            SIM_READ => {
                if tx.len() != 2 {
                    return Err(HardwareError::bus("READ needs instruction + address"));
                }
                let addr = sim_addr(tx[0], tx[1]);
                for (i, byte) in rx.iter_mut().enumerate() {
                    // Sequential reads roll over the whole array
                    *byte = state.memory[(addr + i) % SIM_CAPACITY];
                }
                Ok(())
            }
            SIM_RDSR => {
                if rx.len() != 1 {
                    return Err(HardwareError::bus("RDSR returns exactly one byte"));
                }
                // Bit 1 is the write-enable latch; WIP (bit 0) never reads
                // busy because the settle delay model completes writes
                // instantaneously.
                rx[0] = state.status | (u8::from(state.write_enabled) << 1);
                Ok(())
            }
            other => Err(HardwareError::bus(format!(
                "instruction {other:#04x} is not a read"
            ))),
        }
    }

    async fn write(&mut self, tx: &[u8]) -> Result<()> {
        if tx.is_empty() {
            return Err(HardwareError::bus("empty transaction"));
        }

        let mut state = self.state.lock().unwrap();
        match tx[0] & !SIM_ADDR_MSB_BIT {
            SIM_WREN => {
                state.write_enabled = true;
                Ok(())
            }
            SIM_WRDI => {
                state.write_enabled = false;
                Ok(())
            }
            SIM_WRITE => {
                if tx.len() < 3 {
                    return Err(HardwareError::bus(
                        "WRITE needs instruction + address + data",
                    ));
                }
                if state.write_enabled {
                    let addr = sim_addr(tx[0], tx[1]);
                    let page_base = addr & !(SIM_PAGE_SIZE - 1);
                    let offset = addr % SIM_PAGE_SIZE;
                    for (i, byte) in tx[2..].iter().enumerate() {
                        // Writes wrap within the page, as on the silicon
                        let a = page_base + (offset + i) % SIM_PAGE_SIZE;
                        state.memory[a % SIM_CAPACITY] = *byte;
                    }
                    state.write_enabled = false;
                }
                Ok(())
            }
            SIM_WRSR => {
                if tx.len() != 2 {
                    return Err(HardwareError::bus("WRSR needs exactly one data byte"));
                }
                if state.write_enabled {
                    state.status = tx[1] & !0x02;
                    state.write_enabled = false;
                }
                Ok(())
            }
            other => Err(HardwareError::bus(format!(
                "instruction {other:#04x} is not a write"
            ))),
        }
    }
}
