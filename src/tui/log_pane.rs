//! In-TUI log pane
//!
//! While the alternate screen is up, tracing output goes to a `LogSink`
//! instead of stderr. The pane drains the sink on every loop turn and shows
//! the tail, coloured by level.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex};

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use tracing_subscriber::fmt::MakeWriter;

/// Lines the sink holds between drains; older ones are dropped.
const SINK_CAPACITY: usize = 500;
/// Scrollback kept by the pane.
const SCROLLBACK: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Other,
}

impl LogLevel {
    /// Level of a line formatted by the tracing `fmt` layer.
    fn of(line: &str) -> Self {
        let mut words = line.split_whitespace().take(2);
        let level = words
            .find(|w| matches!(*w, "ERROR" | "WARN" | "INFO" | "DEBUG" | "TRACE"))
            .unwrap_or("");
        match level {
            "ERROR" => LogLevel::Error,
            "WARN" => LogLevel::Warn,
            "INFO" => LogLevel::Info,
            "DEBUG" | "TRACE" => LogLevel::Debug,
            _ => LogLevel::Other,
        }
    }

    fn color(&self) -> Color {
        match self {
            LogLevel::Error => Color::Red,
            LogLevel::Warn => Color::Yellow,
            LogLevel::Info => Color::Green,
            LogLevel::Debug => Color::DarkGray,
            LogLevel::Other => Color::White,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub level: LogLevel,
    pub text: String,
}

/// Shared line buffer that tracing writes into.
#[derive(Clone, Default)]
pub struct LogSink {
    lines: Arc<Mutex<VecDeque<LogLine>>>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, text: String) {
        let mut lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        if lines.len() == SINK_CAPACITY {
            lines.pop_front();
        }
        lines.push_back(LogLine {
            level: LogLevel::of(&text),
            text,
        });
    }

    fn take(&self) -> Vec<LogLine> {
        let mut lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        lines.drain(..).collect()
    }
}

/// Per-event writer handed out by `LogSink`. Splits output into lines.
pub struct SinkWriter {
    sink: LogSink,
    partial: Vec<u8>,
}

impl SinkWriter {
    fn emit(&mut self, bytes: &[u8]) {
        let text = String::from_utf8_lossy(bytes);
        let text = text.trim_end_matches(['\r', '\n']);
        if !text.is_empty() {
            self.sink.push(text.to_string());
        }
    }
}

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.partial.extend_from_slice(buf);
        while let Some(end) = self.partial.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=end).collect();
            self.emit(&line);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if !self.partial.is_empty() {
            let rest = std::mem::take(&mut self.partial);
            self.emit(&rest);
        }
        Ok(())
    }
}

impl Drop for SinkWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = SinkWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SinkWriter {
            sink: self.clone(),
            partial: Vec::new(),
        }
    }
}

/// Toggleable log pane (Ctrl+L).
pub struct LogPane {
    sink: LogSink,
    lines: VecDeque<LogLine>,
    pub visible: bool,
    /// Lines scrolled back from the newest; 0 follows the tail.
    back: usize,
}

impl LogPane {
    pub fn new(sink: LogSink) -> Self {
        Self {
            sink,
            lines: VecDeque::new(),
            visible: false,
            back: 0,
        }
    }

    /// Pull new lines out of the sink. Call once per loop turn.
    pub fn poll(&mut self) {
        for line in self.sink.take() {
            if self.lines.len() == SCROLLBACK {
                self.lines.pop_front();
                self.back = self.back.saturating_sub(1);
            }
            self.lines.push_back(line);
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        self.back = 0;
    }

    pub fn older(&mut self, n: usize) {
        self.back = (self.back + n).min(self.lines.len().saturating_sub(1));
    }

    pub fn newer(&mut self, n: usize) {
        self.back = self.back.saturating_sub(n);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Lines to show in a pane `height` rows tall, oldest first.
    fn window(&self, height: usize) -> impl Iterator<Item = &LogLine> {
        let end = self.lines.len().saturating_sub(self.back);
        let start = end.saturating_sub(height);
        self.lines.range(start..end)
    }
}

pub fn render(area: Rect, buf: &mut Buffer, pane: &LogPane) {
    let title = if pane.back > 0 {
        format!(" Log (-{}) ", pane.back)
    } else {
        " Log ".to_string()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    block.render(area, buf);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let lines: Vec<Line> = pane
        .window(inner.height as usize)
        .map(|l| Line::from(Span::styled(l.text.clone(), Style::default().fg(l.level.color()))))
        .collect();
    Paragraph::new(lines).render(inner, buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_detection() {
        assert_eq!(LogLevel::of("2025-08-01T10:00:00Z  WARN token expired"), LogLevel::Warn);
        assert_eq!(LogLevel::of("ERROR boom"), LogLevel::Error);
        assert_eq!(LogLevel::of("2025-08-01T10:00:00Z DEBUG GET http://x"), LogLevel::Debug);
        assert_eq!(LogLevel::of("plain text mentioning INFO later on"), LogLevel::Other);
    }

    #[test]
    fn test_writer_splits_lines_and_flushes_rest() {
        let sink = LogSink::new();
        {
            let mut w = sink.make_writer();
            write!(w, " INFO first\n WARN sec").unwrap();
            write!(w, "ond\ntail").unwrap();
        }
        let lines = sink.take();
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec![" INFO first", " WARN second", "tail"]);
        assert_eq!(lines[1].level, LogLevel::Warn);
    }

    #[test]
    fn test_sink_drops_oldest() {
        let sink = LogSink::new();
        for i in 0..SINK_CAPACITY + 10 {
            sink.push(format!("line {}", i));
        }
        let lines = sink.take();
        assert_eq!(lines.len(), SINK_CAPACITY);
        assert_eq!(lines[0].text, "line 10");
        assert!(sink.take().is_empty());
    }

    #[test]
    fn test_pane_scrolls_within_bounds() {
        let sink = LogSink::new();
        for i in 0..20 {
            sink.push(format!("line {}", i));
        }
        let mut pane = LogPane::new(sink);
        pane.poll();
        assert_eq!(pane.len(), 20);

        pane.older(5);
        assert_eq!(pane.window(3).map(|l| l.text.as_str()).collect::<Vec<_>>(), vec!["line 12", "line 13", "line 14"]);

        pane.older(100);
        assert_eq!(pane.back, 19);
        pane.newer(100);
        assert_eq!(pane.back, 0);
        assert_eq!(pane.window(1).next().unwrap().text, "line 19");
    }

    #[test]
    fn test_toggle_returns_to_tail() {
        let mut pane = LogPane::new(LogSink::new());
        pane.older(3);
        pane.toggle();
        assert!(pane.visible);
        assert_eq!(pane.back, 0);
    }
}
