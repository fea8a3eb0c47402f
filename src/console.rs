// src/console.rs

//! Where mirrored agent output and status lines are written.

use std::io::Write;
use std::sync::{Arc, Mutex};

/// Sink for everything the orchestrator shows the operator.
///
/// `out`/`err` take text verbatim (no newline is added) so agent chunks are
/// mirrored exactly as they arrived.
pub trait Console: Send {
    fn out(&mut self, text: &str);
    fn err(&mut self, text: &str);

    fn out_line(&mut self, line: &str) {
        self.out(line);
        self.out("\n");
    }

    fn err_line(&mut self, line: &str) {
        self.err(line);
        self.err("\n");
    }
}

/// The process's own stdout and stderr, flushed after every write.
#[derive(Debug, Default)]
pub struct StdConsole;

impl Console for StdConsole {
    fn out(&mut self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        // A closed stdout must not bring the run down.
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }

    fn err(&mut self, text: &str) {
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(text.as_bytes());
        let _ = stderr.flush();
    }
}

/// Console that records output in memory; clones share the same buffers.
#[derive(Debug, Clone, Default)]
pub struct CapturedConsole {
    out: Arc<Mutex<String>>,
    err: Arc<Mutex<String>>,
}

impl CapturedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stdout_text(&self) -> String {
        self.out.lock().unwrap().clone()
    }

    pub fn stderr_text(&self) -> String {
        self.err.lock().unwrap().clone()
    }
}

impl Console for CapturedConsole {
    fn out(&mut self, text: &str) {
        self.out.lock().unwrap().push_str(text);
    }

    fn err(&mut self, text: &str) {
        self.err.lock().unwrap().push_str(text);
    }
}
