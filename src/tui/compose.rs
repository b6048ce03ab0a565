//! Compose box and the single-line text input it is built on.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
    Frame,
};
use unicode_width::UnicodeWidthChar;

/// Editable text with a character cursor. Used by the compose box and the
/// vehicle form fields.
#[derive(Debug, Default, Clone)]
pub struct TextInput {
    pub input: String,
    /// Cursor position (character offset into `input`).
    pub cursor_pos: usize,
}

impl TextInput {
    pub fn with_text(text: &str) -> Self {
        Self {
            input: text.to_string(),
            cursor_pos: text.chars().count(),
        }
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = self.char_to_byte(self.cursor_pos);
        self.input.insert(byte_pos, c);
        self.cursor_pos += 1;
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    pub fn backspace(&mut self) {
        if self.cursor_pos > 0 {
            let byte_pos = self.char_to_byte(self.cursor_pos);
            let prev_byte_pos = self.char_to_byte(self.cursor_pos - 1);
            self.input.drain(prev_byte_pos..byte_pos);
            self.cursor_pos -= 1;
        }
    }

    pub fn delete(&mut self) {
        if self.cursor_pos < self.input.chars().count() {
            let byte_pos = self.char_to_byte(self.cursor_pos);
            let next_byte_pos = self.char_to_byte(self.cursor_pos + 1);
            self.input.drain(byte_pos..next_byte_pos);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor_pos = self.cursor_pos.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor_pos < self.input.chars().count() {
            self.cursor_pos += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor_pos = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor_pos = self.input.chars().count();
    }

    /// Ctrl+U
    pub fn clear(&mut self) {
        self.input.clear();
        self.cursor_pos = 0;
    }

    /// Take the trimmed text and clear the input. `None` if it is blank.
    pub fn take(&mut self) -> Option<String> {
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return None;
        }
        self.clear();
        Some(text)
    }

    pub fn value(&self) -> &str {
        &self.input
    }

    fn char_to_byte(&self, char_pos: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }
}

/// Slice of an input that fits in `width` columns with the cursor in view.
#[derive(Debug, PartialEq)]
pub struct InputWindow {
    pub visible: String,
    /// Cursor column within `visible`.
    pub cursor_col: usize,
}

/// Newlines show as `" | "`. Hangul and other wide characters take two
/// columns, so scrolling works in columns rather than characters.
pub fn input_window(input: &TextInput, width: usize) -> InputWindow {
    let mut cells: Vec<(char, usize)> = Vec::new();
    let mut cursor_idx = 0;
    for (i, ch) in input.input.chars().enumerate() {
        if i == input.cursor_pos {
            cursor_idx = cells.len();
        }
        if ch == '\n' {
            cells.extend([(' ', 1), ('|', 1), (' ', 1)]);
        } else {
            cells.push((ch, ch.width().unwrap_or(0)));
        }
    }
    if input.cursor_pos >= input.input.chars().count() {
        cursor_idx = cells.len();
    }

    if width == 0 {
        return InputWindow {
            visible: String::new(),
            cursor_col: 0,
        };
    }

    // Leftmost cell such that the cursor (plus one column for it) fits.
    let mut start = 0;
    let mut span: usize = cells[..cursor_idx].iter().map(|(_, w)| w).sum();
    while span + 1 > width && start < cursor_idx {
        span -= cells[start].1;
        start += 1;
    }

    let mut visible = String::new();
    let mut used = 0;
    for &(ch, w) in &cells[start..] {
        if used + w > width {
            break;
        }
        visible.push(ch);
        used += w;
    }

    InputWindow {
        visible,
        cursor_col: span,
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Border + hint line + input line + border.
pub const COMPOSE_HEIGHT: u16 = 4;

/// Render the compose box. `room_name` is `None` when no room is open.
pub fn render(
    area: Rect,
    frame: &mut Frame,
    state: &TextInput,
    room_name: Option<&str>,
    focused: bool,
) {
    let (border_style, border_type) = if focused {
        (Style::default().fg(Color::Yellow), BorderType::Double)
    } else {
        (Style::default().fg(Color::DarkGray), BorderType::Plain)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(border_style);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let hint_area = Rect::new(inner.x, inner.y, inner.width, 1);
    render_hint(hint_area, frame.buffer_mut(), focused);

    if inner.height >= 2 {
        let input_area = Rect::new(inner.x, inner.y + 1, inner.width, 1);
        // One column of left margin.
        let window = input_window(state, (input_area.width as usize).saturating_sub(1));

        render_input(input_area, frame.buffer_mut(), state, &window, room_name);

        if focused && room_name.is_some() {
            let x = input_area.x + 1 + window.cursor_col as u16;
            frame.set_cursor_position((x.min(input_area.right().saturating_sub(1)), input_area.y));
        }
    }
}

fn render_hint(area: Rect, buf: &mut Buffer, focused: bool) {
    let style = if focused {
        Style::default().fg(Color::Gray)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let send_style = if focused {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let line = Line::from(vec![
        Span::styled(" Enter ", send_style),
        Span::styled("전송  ", style),
        Span::styled("Alt+Enter ", send_style),
        Span::styled("줄바꿈  ", style),
        Span::styled("Ctrl+U ", send_style),
        Span::styled("지우기", style),
    ]);
    Paragraph::new(line).render(area, buf);
}

fn render_input(
    area: Rect,
    buf: &mut Buffer,
    state: &TextInput,
    window: &InputWindow,
    room_name: Option<&str>,
) {
    let line = match room_name {
        None => Line::from(Span::styled(
            " 채팅방을 선택하세요",
            Style::default().fg(Color::DarkGray),
        )),
        Some(name) if state.input.is_empty() => Line::from(Span::styled(
            format!(" {}에 메시지 보내기...", name),
            Style::default().fg(Color::DarkGray),
        )),
        Some(_) => Line::from(Span::styled(
            format!(" {}", window.visible),
            Style::default().fg(Color::White),
        )),
    };
    Paragraph::new(line).render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editing_multibyte_text() {
        let mut input = TextInput::default();
        for c in "안녕하세요".chars() {
            input.insert_char(c);
        }
        input.move_left();
        input.backspace();
        assert_eq!(input.value(), "안녕하요");
        input.move_home();
        input.delete();
        assert_eq!(input.value(), "녕하요");
        assert_eq!(input.cursor_pos, 0);
    }

    #[test]
    fn test_take_trims_and_rejects_blank() {
        let mut input = TextInput::with_text("   ");
        assert_eq!(input.take(), None);
        assert_eq!(input.value(), "   ");

        let mut input = TextInput::with_text("  예약 문의  ");
        assert_eq!(input.take().as_deref(), Some("예약 문의"));
        assert_eq!(input.value(), "");
        assert_eq!(input.cursor_pos, 0);
    }

    #[test]
    fn test_window_fits_without_scrolling() {
        let input = TextInput::with_text("abc");
        assert_eq!(
            input_window(&input, 10),
            InputWindow {
                visible: "abc".to_string(),
                cursor_col: 3
            }
        );
    }

    #[test]
    fn test_window_counts_wide_chars_as_two_columns() {
        let input = TextInput::with_text("가나다라");
        let window = input_window(&input, 5);
        // Cursor at the end needs one column, so only "다라" (4 columns) fits.
        assert_eq!(window.visible, "다라");
        assert_eq!(window.cursor_col, 4);
    }

    #[test]
    fn test_window_keeps_cursor_at_start_visible() {
        let mut input = TextInput::with_text("abcdefghij");
        input.move_home();
        let window = input_window(&input, 4);
        assert_eq!(window.visible, "abcd");
        assert_eq!(window.cursor_col, 0);
    }

    #[test]
    fn test_window_flattens_newlines() {
        let mut input = TextInput::with_text("a");
        input.insert_newline();
        input.insert_char('b');
        let window = input_window(&input, 20);
        assert_eq!(window.visible, "a | b");
        assert_eq!(window.cursor_col, 5);
    }
}
