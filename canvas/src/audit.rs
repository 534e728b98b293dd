use structures::WriteEvent;

/// Append-only record of accepted writes. Nothing is ever removed.
pub trait AuditLog: Send {
    fn append(&mut self, event: WriteEvent);
    fn events(&self) -> &[WriteEvent];

    fn len(&self) -> usize {
        self.events().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    events: Vec<WriteEvent>,
}

impl From<Vec<WriteEvent>> for MemoryAuditLog {
    fn from(events: Vec<WriteEvent>) -> Self {
        Self { events }
    }
}

impl AuditLog for MemoryAuditLog {
    fn append(&mut self, event: WriteEvent) {
        self.events.push(event);
    }

    fn events(&self) -> &[WriteEvent] {
        &self.events
    }
}
