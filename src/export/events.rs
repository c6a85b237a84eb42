//! Progress events emitted during an export.

use std::path::PathBuf;
use std::sync::Mutex;

/// A step of the export pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportEvent {
    /// The source tree was resolved and staging attached.
    Started {
        /// Source tree identifier
        source: String,
        /// Number of top-level blocks
        blocks: usize,
    },

    /// Blocks were packed into pages.
    Packed {
        /// Number of pages
        pages: u32,
        /// Number of rescaled blocks
        rescaled: usize,
    },

    /// A page was rasterized.
    PageCaptured {
        /// 1-indexed page number
        page: u32,
        /// Total number of pages
        total: u32,
    },

    /// The document was assembled.
    Assembled {
        /// Encoded size in bytes
        bytes: usize,
    },

    /// The document was written to disk.
    Emitted {
        /// Output path
        path: PathBuf,
    },
}

impl ExportEvent {
    /// Check if this event reports a captured page.
    pub fn is_capture(&self) -> bool {
        matches!(self, ExportEvent::PageCaptured { .. })
    }
}

/// Receives export progress.
pub trait ExportObserver: Send + Sync {
    /// Called once per event, in pipeline order.
    fn on_event(&self, event: &ExportEvent);
}

impl<F> ExportObserver for F
where
    F: Fn(&ExportEvent) + Send + Sync,
{
    fn on_event(&self, event: &ExportEvent) {
        self(event)
    }
}

/// Observer that records every event.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<ExportEvent>>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events, oldest first.
    pub fn events(&self) -> Vec<ExportEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Page numbers of capture events, in order.
    pub fn captured_pages(&self) -> Vec<u32> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ExportEvent::PageCaptured { page, .. } => Some(page),
                _ => None,
            })
            .collect()
    }
}

impl ExportObserver for EventLog {
    fn on_event(&self, event: &ExportEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_records_in_order() {
        let log = EventLog::new();
        log.on_event(&ExportEvent::PageCaptured { page: 1, total: 2 });
        log.on_event(&ExportEvent::Assembled { bytes: 10 });
        log.on_event(&ExportEvent::PageCaptured { page: 2, total: 2 });

        assert_eq!(log.events().len(), 3);
        assert_eq!(log.captured_pages(), vec![1, 2]);
        assert!(log.events()[0].is_capture());
    }

    #[test]
    fn test_closure_observer() {
        let seen = Mutex::new(0);
        let observer = |_: &ExportEvent| {
            if let Ok(mut n) = seen.lock() {
                *n += 1;
            }
        };
        observer.on_event(&ExportEvent::Assembled { bytes: 1 });
        assert_eq!(*seen.lock().unwrap(), 1);
    }
}
