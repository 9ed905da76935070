//! Presence hysteresis.
//!
//! Marginal RF coupling makes single polls unreliable in both directions:
//! a tag at the edge of the field reads intermittently, and a bus glitch
//! looks exactly like an empty field. The filter requires a run of
//! agreeing successful reads before declaring a tag present and a run of
//! consecutive misses before declaring it absent, and emits the serial
//! number only on the absent-to-present edge. A tag held in the field
//! produces exactly one event, not one per poll.

/// Debouncing presence tracker for a single reader.
///
/// # Examples
///
/// ```
/// use gatekeeper_reader::PresenceFilter;
///
/// let mut filter = PresenceFilter::new(2, 3);
///
/// assert_eq!(filter.observe(Some(42)), None);     // first agreeing read
/// assert_eq!(filter.observe(Some(42)), Some(42)); // presence edge
/// assert_eq!(filter.observe(Some(42)), None);     // still present, no event
/// ```
#[derive(Debug)]
pub struct PresenceFilter {
    present_after: u8,
    absent_after: u8,
    hits: u8,
    misses: u8,
    present: bool,
    candidate: u64,
}

impl PresenceFilter {
    /// Create a filter requiring `present_after` consecutive agreeing reads
    /// to declare presence and `absent_after` consecutive misses to declare
    /// absence. Both thresholds are clamped to at least 1.
    pub fn new(present_after: u8, absent_after: u8) -> Self {
        Self {
            present_after: present_after.max(1),
            absent_after: absent_after.max(1),
            hits: 0,
            misses: 0,
            present: false,
            candidate: 0,
        }
    }

    /// Feed one poll outcome; `None` covers both "no tag" and a failed bus
    /// transaction. Returns the serial number exactly when the filter
    /// crosses the absent-to-present edge.
    pub fn observe(&mut self, reading: Option<u64>) -> Option<u64> {
        match reading {
            Some(serial) => {
                self.misses = 0;

                if self.present {
                    // Last-scanned record only; a different serial while
                    // present is not a presence change
                    self.candidate = serial;
                    return None;
                }

                if self.hits > 0 && self.candidate == serial {
                    self.hits += 1;
                } else {
                    self.candidate = serial;
                    self.hits = 1;
                }

                if self.hits >= self.present_after {
                    self.present = true;
                    self.hits = 0;
                    Some(serial)
                } else {
                    None
                }
            }
            None => {
                self.hits = 0;

                if self.present {
                    self.misses += 1;
                    if self.misses >= self.absent_after {
                        self.present = false;
                        self.misses = 0;
                    }
                }

                None
            }
        }
    }

    /// Whether a tag is currently considered present.
    pub fn is_present(&self) -> bool {
        self.present
    }

    /// Serial of the most recent successful read.
    pub fn last_serial(&self) -> u64 {
        self.candidate
    }
}
