//! Write coalescing for slice saves.
//!
//! At most one network write per slice is outstanding. Saves arriving while
//! a write is outstanding are coalesced: they do not write themselves. When
//! trailing writes are enabled the newest coalesced value is kept in a single
//! slot and handed back to the writer once its write settles, so it is
//! eventually written (latest value wins; intermediate values are skipped).
//!
//! Flow:
//! 1. `admit()` - start a write, or coalesce into the trailing slot
//! 2. `settle()` - write finished; take the trailing value to write next
//! 3. `abandon()` - write failed; release the slot and return what was queued

/// What a save should do after admission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission<T> {
    /// No write outstanding: the caller owns the write of this value.
    Write(T),
    /// A write is outstanding: the caller must not write.
    Coalesced,
}

/// One in-flight write plus an optional trailing slot.
#[derive(Debug)]
pub struct WriteCoalescer<T> {
    keep_trailing: bool,
    in_flight: bool,
    trailing: Option<T>,
    coalesced_total: u64,
}

impl<T> WriteCoalescer<T> {
    /// Create an idle coalescer.
    ///
    /// With `keep_trailing = false` coalesced values are dropped outright.
    pub fn new(keep_trailing: bool) -> Self {
        Self {
            keep_trailing,
            in_flight: false,
            trailing: None,
            coalesced_total: 0,
        }
    }

    /// Request a write of `value`.
    pub fn admit(&mut self, value: T) -> Admission<T> {
        if self.in_flight {
            self.coalesced_total = self.coalesced_total.saturating_add(1);
            if self.keep_trailing {
                self.trailing = Some(value);
            }
            return Admission::Coalesced;
        }
        self.in_flight = true;
        Admission::Write(value)
    }

    /// The outstanding write succeeded.
    ///
    /// Returns the value to write next, in which case the caller still owns
    /// the in-flight slot. Returns `None` when the coalescer is idle again.
    pub fn settle(&mut self) -> Option<T> {
        match self.trailing.take() {
            Some(next) => Some(next),
            None => {
                self.in_flight = false;
                None
            }
        }
    }

    /// The outstanding write failed. Releases the slot.
    ///
    /// Returns the trailing value, if any, so the caller can back it up.
    pub fn abandon(&mut self) -> Option<T> {
        self.in_flight = false;
        self.trailing.take()
    }

    /// Whether a write is outstanding.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Whether a value waits in the trailing slot.
    pub fn has_trailing(&self) -> bool {
        self.trailing.is_some()
    }

    /// How many saves have been coalesced since creation.
    pub fn coalesced_total(&self) -> u64 {
        self.coalesced_total
    }
}

impl<T> Default for WriteCoalescer<T> {
    fn default() -> Self {
        Self::new(true)
    }
}
