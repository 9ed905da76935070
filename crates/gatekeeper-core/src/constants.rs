//! Timing and layout constants shared by the gatekeeper crates.
//!
//! Register addresses and instruction opcodes stay private to the driver
//! that frames them; this module only holds the values more than one crate
//! has to agree on: audit ring layout, polling cadence, actuation timing,
//! and the authorization deadline.

use std::time::Duration;

// ============================================================================
// Tag UIDs
// ============================================================================

/// Minimum UID length in bytes (per ISO 14443).
pub const MIN_UID_LENGTH: usize = 4;

/// Maximum UID length in bytes (per ISO 14443).
pub const MAX_UID_LENGTH: usize = 10;

// ============================================================================
// Nonvolatile storage layout
// ============================================================================

/// Total EEPROM capacity in bytes (25LC040-class device).
pub const EEPROM_CAPACITY: usize = 512;

/// Device page size in bytes. Page writes must never exceed this.
pub const EEPROM_PAGE_SIZE: usize = 16;

/// Settle time for the device's internal write cycle.
///
/// The driver sleeps this long after every write instruction instead of
/// polling the status register. This is a hard serialization point: the
/// next bus operation must not start before it elapses.
pub const EEPROM_WRITE_SETTLE: Duration = Duration::from_millis(10);

/// One audit slot occupies one device page: 8 bytes of big-endian serial
/// number, 1 result-kind byte, 7 reserved bytes.
pub const AUDIT_SLOT_SIZE: usize = EEPROM_PAGE_SIZE;

/// Number of audit slots in the ring.
///
/// The last page of the device is reserved for the persisted ring index,
/// so the ring holds one page less than the raw capacity would allow.
pub const AUDIT_SLOT_COUNT: u16 = (EEPROM_CAPACITY / AUDIT_SLOT_SIZE) as u16 - 1;

/// Byte address of the reserved index page.
pub const AUDIT_INDEX_ADDR: u16 = (EEPROM_CAPACITY - EEPROM_PAGE_SIZE) as u16;

// ============================================================================
// Reader cadence
// ============================================================================

/// Interval between reader polls while idle.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Consecutive agreeing reads before a tag counts as present.
pub const DEFAULT_PRESENT_AFTER: u8 = 2;

/// Consecutive failed polls before the tag counts as absent again.
pub const DEFAULT_ABSENT_AFTER: u8 = 3;

// ============================================================================
// Authorization
// ============================================================================

/// Request path on the authorization endpoint.
pub const AUTHZ_PATH: &str = "/check_access";

/// Default deadline for one authorization attempt, armed when the pipeline
/// enters `Pending`. A request still in flight when it elapses is abandoned
/// and the event is denied.
pub const DEFAULT_AUTHZ_DEADLINE: Duration = Duration::from_millis(500);

// ============================================================================
// Actuation timing
// ============================================================================

/// Buzzer duty cycle during a deny pulse.
pub const DENY_BUZZ_DUTY: f32 = 0.8;

/// Length of each deny buzz pulse and of the silence that follows it.
pub const DENY_BUZZ_HOLD: Duration = Duration::from_millis(250);

/// Number of buzz/silence repetitions in the denied sequence.
pub const DENY_BUZZ_REPEATS: usize = 3;

/// How long the grant indicator stays lit after a granted decision.
pub const GRANT_HOLD: Duration = Duration::from_millis(1000);
