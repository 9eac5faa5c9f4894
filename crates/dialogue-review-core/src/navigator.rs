//! Bounded position within the fixed dialogue list.

/// Current dialogue position. Movement is bounded and never wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigator {
    current: usize,
    len: usize,
}

impl Navigator {
    /// Start at index 0 of a list with `len` dialogues.
    pub fn new(len: usize) -> Self {
        Self { current: 0, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current index, `None` when the list is empty.
    pub fn current(&self) -> Option<usize> {
        (!self.is_empty()).then_some(self.current)
    }

    /// Advance one dialogue. Returns `false` (and stays put) at the last one.
    pub fn next(&mut self) -> bool {
        if !self.can_next() {
            return false;
        }
        self.current += 1;
        true
    }

    /// Step back one dialogue. Returns `false` (and stays put) at the first one.
    pub fn previous(&mut self) -> bool {
        if !self.can_previous() {
            return false;
        }
        self.current -= 1;
        true
    }

    pub fn can_previous(&self) -> bool {
        !self.is_empty() && self.current > 0
    }

    pub fn can_next(&self) -> bool {
        !self.is_empty() && self.current < self.len - 1
    }

    /// Position as a percentage, counting the current dialogue as seen.
    pub fn progress_percent(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        (self.current + 1) as f64 / self.len as f64 * 100.0
    }
}
