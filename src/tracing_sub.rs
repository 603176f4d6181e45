use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, OnceLock};

use tracing::Level;

const DEFAULT_MAX_LINES: usize = 2000;

static GLOBAL_CAPTURE: OnceLock<LogCapture> = OnceLock::new();

/// Routes every later log line into `capture` instead of stderr.
///
/// Only the first installed capture wins; returns `false` if one was
/// already set.
pub fn install_capture(capture: LogCapture) -> bool {
    GLOBAL_CAPTURE.set(capture).is_ok()
}

pub fn global_capture() -> Option<LogCapture> {
    GLOBAL_CAPTURE.get().cloned()
}

#[derive(Debug)]
struct CaptureBuffer {
    lines: VecDeque<String>,
    max_lines: usize,
}

impl CaptureBuffer {
    fn push_line(&mut self, line: String) {
        self.lines.push_back(line);
        while self.lines.len() > self.max_lines {
            self.lines.pop_front();
        }
    }
}

/// Bounded in-memory log sink, used by the simulator to print what the
/// coordinator logged during a scenario.
#[derive(Clone, Debug)]
pub struct LogCapture {
    inner: Arc<Mutex<CaptureBuffer>>,
}

impl LogCapture {
    pub fn new(max_lines: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CaptureBuffer {
                lines: VecDeque::new(),
                max_lines: max_lines.max(1),
            })),
        }
    }

    pub fn push(&self, line: impl Into<String>) {
        if let Ok(mut buffer) = self.inner.lock() {
            buffer.push_line(line.into());
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.inner
            .lock()
            .map(|buffer| buffer.lines.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn writer(&self) -> CaptureWriter {
        CaptureWriter {
            capture: self.clone(),
            pending: Vec::new(),
        }
    }
}

impl Default for LogCapture {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINES)
    }
}

#[derive(Debug)]
pub struct CaptureWriter {
    capture: LogCapture,
    pending: Vec<u8>,
}

impl CaptureWriter {
    fn flush_pending(&mut self, force: bool) {
        if self.pending.is_empty() {
            return;
        }
        let end = if force {
            self.pending.len()
        } else {
            let Some(pos) = self.pending.iter().rposition(|b| *b == b'\n') else {
                return;
            };
            pos + 1
        };
        let drained: Vec<u8> = self.pending.drain(..end).collect();
        let text = String::from_utf8_lossy(&drained);
        for line in text.split('\n').filter(|line| !line.is_empty()) {
            self.capture.push(line);
        }
    }
}

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        self.flush_pending(false);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_pending(true);
        Ok(())
    }
}

impl Drop for CaptureWriter {
    fn drop(&mut self) {
        self.flush_pending(true);
    }
}

pub struct DelegatingWriter {
    inner: DelegatingInner,
}

enum DelegatingInner {
    Capture(CaptureWriter),
    Stderr(io::Stderr),
}

impl DelegatingWriter {
    fn new() -> Self {
        if let Some(capture) = global_capture() {
            DelegatingWriter {
                inner: DelegatingInner::Capture(capture.writer()),
            }
        } else {
            DelegatingWriter {
                inner: DelegatingInner::Stderr(io::stderr()),
            }
        }
    }
}

impl Write for DelegatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            DelegatingInner::Capture(w) => w.write(buf),
            DelegatingInner::Stderr(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            DelegatingInner::Capture(w) => w.flush(),
            DelegatingInner::Stderr(s) => s.flush(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SubscriberMakeWriter;

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SubscriberMakeWriter {
    type Writer = DelegatingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        DelegatingWriter::new()
    }
}

/// Initialize the tracing subscriber at `level`, writing to the installed
/// capture when there is one and to stderr otherwise. Safe to call multiple
/// times; subsequent calls are no-ops for the global subscriber.
pub fn init_default(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(SubscriberMakeWriter)
        .with_target(false)
        .with_thread_names(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_splits_lines_and_keeps_partial_until_flush() {
        let capture = LogCapture::new(10);
        let mut writer = capture.writer();
        writer.write_all(b"first\nsecond").unwrap();
        assert_eq!(capture.lines(), vec!["first".to_string()]);
        writer.flush().unwrap();
        assert_eq!(capture.lines(), vec!["first", "second"]);
    }

    #[test]
    fn capture_is_bounded() {
        let capture = LogCapture::new(2);
        for line in ["a", "b", "c"] {
            capture.push(line);
        }
        assert_eq!(capture.lines(), vec!["b", "c"]);
    }
}
