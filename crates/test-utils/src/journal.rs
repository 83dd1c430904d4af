use std::sync::{Arc, Mutex};

/// Start/finish marker recorded by journal-backed test tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEvent {
    Started(String),
    Finished(String),
}

/// Shared, ordered log of task starts and finishes.
///
/// Cloning shares the underlying log.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    events: Arc<Mutex<Vec<JournalEvent>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self, task: &str) {
        self.push(JournalEvent::Started(task.to_string()));
    }

    pub fn finish(&self, task: &str) {
        self.push(JournalEvent::Finished(task.to_string()));
    }

    fn push(&self, event: JournalEvent) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<JournalEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Names of the tasks that started, in start order.
    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                JournalEvent::Started(name) => Some(name),
                JournalEvent::Finished(_) => None,
            })
            .collect()
    }

    pub fn finished(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                JournalEvent::Finished(name) => Some(name),
                JournalEvent::Started(_) => None,
            })
            .collect()
    }

    pub fn start_count(&self, task: &str) -> usize {
        self.started().iter().filter(|n| *n == task).count()
    }

    pub fn has_started(&self, task: &str) -> bool {
        self.start_count(task) > 0
    }

    /// Position of an event in the log.
    pub fn position(&self, event: &JournalEvent) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }

    /// True if `first` finished before `second` started.
    pub fn finished_before_started(&self, first: &str, second: &str) -> bool {
        let finished = self.position(&JournalEvent::Finished(first.to_string()));
        let started = self.position(&JournalEvent::Started(second.to_string()));
        matches!((finished, started), (Some(f), Some(s)) if f < s)
    }

    /// Highest number of simultaneously running invocations of `task`.
    pub fn max_concurrent(&self, task: &str) -> usize {
        let mut running = 0usize;
        let mut peak = 0usize;
        for event in self.events() {
            match event {
                JournalEvent::Started(name) if name == task => {
                    running += 1;
                    peak = peak.max(running);
                }
                JournalEvent::Finished(name) if name == task => {
                    running = running.saturating_sub(1);
                }
                _ => {}
            }
        }
        peak
    }
}
