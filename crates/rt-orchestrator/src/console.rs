//! Operator console rendering
//!
//! Child lines are printed as `[name] line` on the stream they came from,
//! in the child's color. Orchestrator notices go to stderr.
//!
//! Callers only enqueue lines. A dedicated writer thread owns both streams
//! and renders them in enqueue order, so a paused terminal or a full pipe
//! stalls that thread alone, never a pump or the input router. Call
//! [`Console::finish`] before the process exits to drain what is queued.

use std::io::Write;
use std::thread::JoinHandle;

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use rt_core::ConsoleColor;

/// Which child stream a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Stdout => "stdout",
            StreamKind::Stderr => "stderr",
        }
    }
}

type Output = Box<dyn Write + Send>;

/// One queued line
#[derive(Debug)]
struct Line {
    stream: StreamKind,
    color: Option<ConsoleColor>,
    text: String,
}

/// Queue in front of the operator's terminal
#[derive(Debug)]
pub struct Console {
    tx: Mutex<Option<mpsc::UnboundedSender<Line>>>,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    /// Console writing to the process's stdout/stderr
    pub fn new() -> Self {
        Self::with_outputs(Box::new(std::io::stdout()), Box::new(std::io::stderr()))
    }

    /// Console writing to the given streams
    pub fn with_outputs(stdout: Output, stderr: Output) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let spawned = std::thread::Builder::new()
            .name("round-table-console".into())
            .spawn(move || render(rx, stdout, stderr));

        match spawned {
            Ok(writer) => Self {
                tx: Mutex::new(Some(tx)),
                writer: Mutex::new(Some(writer)),
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to start console writer, output disabled");
                Self::silent()
            }
        }
    }

    /// Console that discards everything (tests, embedding)
    pub fn silent() -> Self {
        Self {
            tx: Mutex::new(None),
            writer: Mutex::new(None),
        }
    }

    /// Render one child line. `None` keeps the terminal's current color.
    pub fn child_line(&self, name: &str, stream: StreamKind, color: Option<ConsoleColor>, line: &str) {
        self.enqueue(stream, color, format!("[{}] {}\n", name, line));
    }

    /// Orchestrator status line on stderr
    pub fn notice(&self, msg: &str) {
        self.status(None, msg);
    }

    /// Orchestrator error line on stderr, in red
    pub fn error(&self, msg: &str) {
        self.status(Some(ConsoleColor::Red), msg);
    }

    /// Stop accepting lines and wait until everything queued is written
    pub fn finish(&self) {
        self.tx.lock().take();
        let writer = self.writer.lock().take();
        if let Some(writer) = writer {
            if writer.join().is_err() {
                tracing::warn!("Console writer panicked");
            }
        }
    }

    fn status(&self, color: Option<ConsoleColor>, msg: &str) {
        self.enqueue(StreamKind::Stderr, color, format!("[round-table] {}\n", msg));
    }

    fn enqueue(&self, stream: StreamKind, color: Option<ConsoleColor>, text: String) {
        if let Some(tx) = self.tx.lock().as_ref() {
            // only fails once the writer is gone
            let _ = tx.send(Line {
                stream,
                color,
                text,
            });
        }
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        self.finish();
    }
}

fn render(mut rx: mpsc::UnboundedReceiver<Line>, mut stdout: Output, mut stderr: Output) {
    while let Some(line) = rx.blocking_recv() {
        let out = match line.stream {
            StreamKind::Stdout => &mut stdout,
            StreamKind::Stderr => &mut stderr,
        };
        if let Err(e) = write_colored(out, line.color, &line.text) {
            tracing::trace!(stream = line.stream.as_str(), error = %e, "Console write failed");
        }
    }
}

fn write_colored<W: Write>(out: &mut W, color: Option<ConsoleColor>, text: &str) -> std::io::Result<()> {
    match color {
        Some(color) => crossterm::execute!(
            out,
            SetForegroundColor(terminal_color(color)),
            Print(text),
            ResetColor
        ),
        None => crossterm::execute!(out, Print(text)),
    }
}

/// Map a palette entry to the terminal color crossterm emits
pub fn terminal_color(color: ConsoleColor) -> Color {
    match color {
        ConsoleColor::Black => Color::Black,
        ConsoleColor::DarkBlue => Color::DarkBlue,
        ConsoleColor::DarkGreen => Color::DarkGreen,
        ConsoleColor::DarkCyan => Color::DarkCyan,
        ConsoleColor::DarkRed => Color::DarkRed,
        ConsoleColor::DarkMagenta => Color::DarkMagenta,
        ConsoleColor::DarkYellow => Color::DarkYellow,
        ConsoleColor::Gray => Color::Grey,
        ConsoleColor::DarkGray => Color::DarkGrey,
        ConsoleColor::Blue => Color::Blue,
        ConsoleColor::Green => Color::Green,
        ConsoleColor::Cyan => Color::Cyan,
        ConsoleColor::Red => Color::Red,
        ConsoleColor::Magenta => Color::Magenta,
        ConsoleColor::Yellow => Color::Yellow,
        ConsoleColor::White => Color::White,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Blocks its first write until the gate opens, like a paused terminal
    struct GatedWriter {
        gate: std::sync::mpsc::Receiver<()>,
        open: bool,
        inner: SharedBuf,
    }

    impl Write for GatedWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.open {
                let _ = self.gate.recv();
                self.open = true;
            }
            self.inner.write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_lines_rendered_in_order_per_stream() {
        let out = SharedBuf::default();
        let err = SharedBuf::default();
        let console = Console::with_outputs(Box::new(out.clone()), Box::new(err.clone()));

        console.child_line("a", StreamKind::Stdout, None, "one");
        console.notice("Spawned [a]");
        console.child_line("a", StreamKind::Stderr, None, "oops");
        console.child_line("b", StreamKind::Stdout, None, "two");
        console.finish();

        assert_eq!(out.text(), "[a] one\n[b] two\n");
        assert_eq!(err.text(), "[round-table] Spawned [a]\n[a] oops\n");
    }

    #[test]
    fn test_blocked_terminal_does_not_block_callers() {
        let (open, gate) = std::sync::mpsc::channel();
        let out = SharedBuf::default();
        let writer = GatedWriter {
            gate,
            open: false,
            inner: out.clone(),
        };
        let console = Console::with_outputs(Box::new(writer), Box::new(std::io::sink()));

        for i in 0..100 {
            console.child_line("a", StreamKind::Stdout, None, &i.to_string());
        }
        std::thread::sleep(Duration::from_millis(20));
        assert!(out.text().is_empty());

        open.send(()).unwrap();
        console.finish();
        assert_eq!(out.text().lines().count(), 100);
        assert!(out.text().ends_with("[a] 99\n"));
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_status_write_keeps_rendering() {
        let out = SharedBuf::default();
        let console = Console::with_outputs(Box::new(out.clone()), Box::new(BrokenWriter));

        console.error("lost");
        console.notice("also lost");
        console.child_line("a", StreamKind::Stdout, None, "still here");
        console.finish();

        assert_eq!(out.text(), "[a] still here\n");
    }

    #[test]
    fn test_lines_after_finish_are_dropped() {
        let out = SharedBuf::default();
        let console = Console::with_outputs(Box::new(out.clone()), Box::new(std::io::sink()));
        console.finish();
        console.child_line("a", StreamKind::Stdout, None, "late");
        console.finish();
        assert!(out.text().is_empty());
    }

    #[test]
    fn test_write_colored_plain() {
        let mut buf = Vec::new();
        write_colored(&mut buf, None, "[a] hi\n").unwrap();
        assert_eq!(buf, b"[a] hi\n");
    }

    #[test]
    fn test_write_colored_resets() {
        let mut buf = Vec::new();
        write_colored(&mut buf, Some(ConsoleColor::Red), "[a] hi\n").unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("[a] hi"));
        assert!(text.starts_with('\u{1b}'));
        assert!(text.ends_with("\u{1b}[0m"));
    }

    #[test]
    fn test_gray_maps_to_grey() {
        assert_eq!(terminal_color(ConsoleColor::Gray), Color::Grey);
        assert_eq!(terminal_color(ConsoleColor::DarkGray), Color::DarkGrey);
    }
}
