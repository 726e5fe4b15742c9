use chrono::{DateTime, Local};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Event {
    pub at: DateTime<Local>,
    pub level: Level,
    pub message: String,
}

/// Ordered record of everything that happened during one run.
///
/// Stages append here instead of writing to a process-wide log target; the
/// accumulated events become the body of the run-summary email. Entries are
/// mirrored to the `log` facade so `RUST_LOG` still gives live output.
#[derive(Debug, Default)]
pub struct RunLog {
    events: Vec<Event>,
}

impl RunLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::info!("{message}");
        self.push(Level::Info, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::error!("{message}");
        self.push(Level::Error, message);
    }

    fn push(&mut self, level: Level, message: String) {
        self.events.push(Event {
            at: Local::now(),
            level,
            message,
        });
    }

    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| e.level == Level::Error)
            .count()
    }

    /// Renders the whole log as the plain-text summary body.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for e in &self.events {
            let tag = match e.level {
                Level::Info => "INFO ",
                Level::Error => "ERROR",
            };
            out.push_str(&format!(
                "{} {} {}\n",
                e.at.format("%Y-%m-%d %H:%M:%S"),
                tag,
                e.message
            ));
        }
        out
    }
}
