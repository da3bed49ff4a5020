//! Single-slot, time-windowed undo buffer for the most recent scan.
//!
//! One instance per scanning session, single owner; concurrent sessions each
//! get their own buffer rather than sharing one behind a lock.

pub const DEFAULT_WINDOW_MS: i64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Scan {
    code: String,
    at_ms: i64,
}

/// Holds at most one undoable scan. A new `record` always evicts the previous
/// entry, expired or not; expired entries are only noticed lazily on inspection.
#[derive(Debug)]
pub struct ScanBuffer {
    window_ms: i64,
    last: Option<Scan>,
}

impl Default for ScanBuffer {
    fn default() -> Self {
        ScanBuffer::new(DEFAULT_WINDOW_MS)
    }
}

impl ScanBuffer {
    pub fn new(window_ms: i64) -> Self {
        ScanBuffer {
            window_ms,
            last: None,
        }
    }

    /// Remember `code` as the one undoable scan, discarding any prior entry.
    pub fn record(&mut self, code: impl Into<String>, now_ms: i64) {
        self.last = Some(Scan {
            code: code.into(),
            at_ms: now_ms,
        });
    }

    /// True while a held scan is still inside the undo window. The boundary
    /// instant (`now - at == window`) still counts as undoable.
    pub fn can_undo(&self, now_ms: i64) -> bool {
        match &self.last {
            Some(scan) => now_ms - scan.at_ms <= self.window_ms,
            None => false,
        }
    }

    /// Take the held code if it is still undoable; otherwise leave the state
    /// untouched and return `None`.
    pub fn undo(&mut self, now_ms: i64) -> Option<String> {
        if self.can_undo(now_ms) {
            self.last.take().map(|scan| scan.code)
        } else {
            None
        }
    }
}
