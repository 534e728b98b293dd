use std::fmt;

/// Callers partitioned by their cooldown timestamp, plus accepted writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CanvasStats {
    pub old: usize,
    pub current: usize,
    pub banned: usize,
    pub bytes_written: usize,
}

impl fmt::Display for CanvasStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bytes written, known users {{old: {}, current: {}, banned: {}}}",
            self.bytes_written, self.old, self.current, self.banned
        )
    }
}
