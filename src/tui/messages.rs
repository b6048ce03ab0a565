//! Messages pane: history of the open chat room, with optimistic sends.

use std::collections::HashSet;

use chrono::{DateTime, Local, NaiveDateTime};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::models::{ChatMessage, MessageDraft};

/// Id prefix of messages that exist only locally until the server echoes them.
pub const TEMP_PREFIX: &str = "temp-";

pub fn is_temp(msg: &ChatMessage) -> bool {
    msg.message_id.starts_with(TEMP_PREFIX)
}

/// State for the messages pane.
#[derive(Default)]
pub struct MessagesState {
    /// Room whose messages are shown. `None` before any room is opened.
    pub room_id: Option<String>,
    pub header: String,
    pub messages: Vec<ChatMessage>,
    /// Index of the highlighted message.
    pub selected: usize,
    pub loading: bool,
    /// Sender id of the local user, to tell own messages apart.
    pub my_id: String,
}

impl MessagesState {
    pub fn new(my_id: &str) -> Self {
        Self {
            my_id: my_id.to_string(),
            ..Self::default()
        }
    }

    /// Switch to a room and wait for its history.
    pub fn open(&mut self, room_id: &str, header: String) {
        self.room_id = Some(room_id.to_string());
        self.header = header;
        self.messages.clear();
        self.selected = 0;
        self.loading = true;
    }

    pub fn close(&mut self) {
        self.room_id = None;
        self.header.clear();
        self.messages.clear();
        self.selected = 0;
        self.loading = false;
    }

    pub fn is_open(&self, room_id: &str) -> bool {
        self.room_id.as_deref() == Some(room_id)
    }

    /// Replace the shown history. Responses for a room that is no longer
    /// open are dropped. Optimistic messages typed meanwhile are kept unless
    /// the history already holds the stored copy (a new message from the same
    /// sender with the same content).
    pub fn set_history(&mut self, room_id: &str, history: Vec<ChatMessage>) -> bool {
        if !self.is_open(room_id) {
            return false;
        }
        let (mut pending, shown): (Vec<ChatMessage>, Vec<ChatMessage>) =
            self.messages.drain(..).partition(is_temp);
        let known: HashSet<&str> = shown.iter().map(|m| m.message_id.as_str()).collect();
        for stored in history.iter().filter(|m| !known.contains(m.message_id.as_str())) {
            if let Some(i) = pending
                .iter()
                .position(|t| t.sender_id == stored.sender_id && t.content == stored.content)
            {
                pending.remove(i);
            }
        }
        self.messages = history;
        self.messages.extend(pending);
        self.loading = false;
        self.select_last();
        true
    }

    /// Show a message being sent before the server has it.
    pub fn add_optimistic(&mut self, room_id: &str, temp_id: &str, draft: &MessageDraft) -> bool {
        if !self.is_open(room_id) {
            return false;
        }
        self.messages.push(ChatMessage {
            message_id: temp_id.to_string(),
            room_id: room_id.to_string(),
            sender_id: draft.sender_id.clone(),
            sender_name: draft.sender_name.clone(),
            sender_type: draft.sender_type,
            content: draft.content.clone(),
            created_at: Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S").to_string(),
        });
        self.select_last();
        true
    }

    /// Swap a temp message for the stored one.
    pub fn confirm(&mut self, temp_id: &str, stored: ChatMessage) {
        match self.messages.iter_mut().find(|m| m.message_id == temp_id) {
            Some(slot) => *slot = stored,
            None => self.receive(stored),
        }
    }

    /// Drop a temp message whose send failed.
    pub fn discard(&mut self, temp_id: &str) {
        self.messages.retain(|m| m.message_id != temp_id);
        self.selected = self.selected.min(self.messages.len().saturating_sub(1));
    }

    /// A message pushed by the server. An echo of one of our own sends
    /// replaces the oldest temp message from the same sender; messages for
    /// other rooms and repeats are ignored.
    pub fn receive(&mut self, msg: ChatMessage) {
        if !self.is_open(&msg.room_id) {
            return;
        }
        if self.messages.iter().any(|m| m.message_id == msg.message_id) {
            return;
        }
        let temp = self
            .messages
            .iter()
            .position(|m| is_temp(m) && m.sender_id == msg.sender_id);
        match temp {
            Some(i) => self.messages[i] = msg,
            None => {
                self.messages.push(msg);
                self.select_last();
            }
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.messages.len() {
            self.selected += 1;
        }
    }

    pub fn select_last(&mut self) {
        self.selected = self.messages.len().saturating_sub(1);
    }
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Server timestamps come without an offset; mock ones are RFC 3339.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

/// "14:05" today, "어제" yesterday, "08/01" before that.
pub fn time_label(s: &str, now: NaiveDateTime) -> String {
    let Some(ts) = parse_timestamp(s) else {
        return String::new();
    };
    let days = (now.date() - ts.date()).num_days();
    match days {
        0 => ts.format("%H:%M").to_string(),
        1 => "어제".to_string(),
        _ => ts.format("%m/%d").to_string(),
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub fn render(area: Rect, buf: &mut Buffer, state: &MessagesState, focused: bool) {
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
    block.render(area, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let header_area = Rect::new(inner.x, inner.y, inner.width, 1);
    let header = if state.room_id.is_some() {
        state.header.as_str()
    } else {
        "채팅"
    };
    render_header(header_area, buf, header);

    let body = Rect::new(
        inner.x,
        inner.y + 1,
        inner.width,
        inner.height.saturating_sub(1),
    );
    if body.height == 0 {
        return;
    }

    let notice = if state.room_id.is_none() {
        Some("왼쪽 목록에서 채팅방을 선택하세요.")
    } else if state.loading && state.messages.is_empty() {
        Some("대화 내역을 불러오는 중...")
    } else if state.messages.is_empty() {
        Some("아직 주고받은 메시지가 없습니다.")
    } else {
        None
    };
    if let Some(text) = notice {
        let line = Line::from(Span::styled(format!(" {}", text), Style::default().fg(Color::DarkGray)));
        Paragraph::new(line).render(Rect::new(body.x, body.y, body.width, 1), buf);
        return;
    }

    let now = Local::now().naive_local();
    let (lines, ranges) = build_message_lines(state, body.width as usize, now);
    let total = lines.len();
    let height = body.height as usize;
    let scroll = compute_scroll(state.selected, &ranges, height, total);

    for (row, line) in lines.into_iter().skip(scroll).take(height).enumerate() {
        let line_area = Rect::new(body.x, body.y + row as u16, body.width, 1);
        Paragraph::new(line).render(line_area, buf);
    }

    if total > height {
        let x = body.x + body.width.saturating_sub(1);
        if scroll > 0 {
            let cell = &mut buf[(x, body.y)];
            cell.set_char('^');
            cell.set_style(Style::default().fg(Color::DarkGray));
        }
        if scroll + height < total {
            let cell = &mut buf[(x, body.y + body.height - 1)];
            cell.set_char('v');
            cell.set_style(Style::default().fg(Color::DarkGray));
        }
    }
}

fn render_header(area: Rect, buf: &mut Buffer, header: &str) {
    let line = Line::from(Span::styled(
        format!(" {} ", header),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    ));
    Paragraph::new(line)
        .style(Style::default().bg(Color::DarkGray))
        .render(area, buf);
}

/// All message lines plus each message's `[start, end)` line range.
fn build_message_lines(
    state: &MessagesState,
    width: usize,
    now: NaiveDateTime,
) -> (Vec<Line<'static>>, Vec<(usize, usize)>) {
    let mut lines = Vec::new();
    let mut ranges = Vec::new();

    for (i, msg) in state.messages.iter().enumerate() {
        let start = lines.len();
        let own = msg.sender_id == state.my_id;
        card_lines(&mut lines, msg, width, i == state.selected, own, now);
        ranges.push((start, lines.len()));
    }

    (lines, ranges)
}

/// Own messages are indented to the right, like a chat bubble.
fn card_lines(
    lines: &mut Vec<Line<'static>>,
    msg: &ChatMessage,
    width: usize,
    selected: bool,
    own: bool,
    now: NaiveDateTime,
) {
    let indent = if own { width / 4 } else { 0 };
    let card_width = width.saturating_sub(indent + 2);
    if card_width < 10 {
        return;
    }
    let text_width = card_width - 4;
    let margin = " ".repeat(indent);

    let border_style = if selected {
        Style::default().fg(Color::Yellow)
    } else if own {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::Gray)
    };

    let stamp = if is_temp(msg) {
        "전송 중".to_string()
    } else {
        time_label(&msg.created_at, now)
    };
    let name = truncate_to_width(&msg.sender_name, text_width.saturating_sub(stamp.width() + 1));
    let gap = text_width.saturating_sub(name.width() + stamp.width());

    let rule = format!("{}+{}+", margin, "-".repeat(card_width - 2));
    lines.push(Line::from(Span::styled(rule.clone(), border_style)));
    lines.push(Line::from(vec![
        Span::raw(margin.clone()),
        Span::styled("| ", border_style),
        Span::styled(
            name,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" ".repeat(gap)),
        Span::styled(stamp, Style::default().fg(Color::DarkGray)),
        Span::styled(" |", border_style),
    ]));

    let content_style = if is_temp(msg) {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::White)
    };
    for text in wrap_text(&msg.content, text_width) {
        let pad = text_width.saturating_sub(text.width());
        lines.push(Line::from(vec![
            Span::raw(margin.clone()),
            Span::styled("| ", border_style),
            Span::styled(format!("{}{}", text, " ".repeat(pad)), content_style),
            Span::styled(" |", border_style),
        ]));
    }
    lines.push(Line::from(Span::styled(rule, border_style)));
}

fn truncate_to_width(s: &str, max: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out
}

/// Word wrap by display width. Words wider than a line are split.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 {
        return Vec::new();
    }
    let mut out = Vec::new();
    for raw in text.lines() {
        let mut current = String::new();
        for word in raw.split_whitespace() {
            let sep = usize::from(!current.is_empty());
            if current.width() + sep + word.width() <= max_width {
                if sep == 1 {
                    current.push(' ');
                }
                current.push_str(word);
                continue;
            }
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            for ch in word.chars() {
                if current.width() + ch.width().unwrap_or(0) > max_width {
                    out.push(std::mem::take(&mut current));
                }
                current.push(ch);
            }
        }
        out.push(current);
    }
    out
}

/// Scroll offset keeping the selected message in view, bottom-aligned.
fn compute_scroll(selected: usize, ranges: &[(usize, usize)], height: usize, total: usize) -> usize {
    if total <= height {
        return 0;
    }
    let max_scroll = total - height;
    let Some(&(start, end)) = ranges.get(selected) else {
        return max_scroll;
    };
    if end - start >= height {
        return start.min(max_scroll);
    }
    end.saturating_sub(height).min(max_scroll)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SenderType;
    use chrono::NaiveDate;

    fn msg(id: &str, room: &str, sender: &str, content: &str) -> ChatMessage {
        ChatMessage {
            message_id: id.to_string(),
            room_id: room.to_string(),
            sender_id: sender.to_string(),
            sender_name: sender.to_string(),
            sender_type: SenderType::User,
            content: content.to_string(),
            created_at: "2025-08-01T10:00:00".to_string(),
        }
    }

    fn draft(content: &str) -> MessageDraft {
        MessageDraft {
            sender_id: "me".to_string(),
            sender_name: "나".to_string(),
            sender_type: SenderType::User,
            content: content.to_string(),
        }
    }

    fn opened(room: &str) -> MessagesState {
        let mut state = MessagesState::new("me");
        state.open(room, "room".to_string());
        state
    }

    #[test]
    fn test_history_for_other_room_is_ignored() {
        let mut state = opened("1");
        assert!(!state.set_history("2", vec![msg("a", "2", "x", "hi")]));
        assert!(state.messages.is_empty());
        assert!(state.loading);

        assert!(state.set_history("1", vec![msg("a", "1", "x", "hi")]));
        assert!(!state.loading);
        assert_eq!(state.messages.len(), 1);
    }

    #[test]
    fn test_echo_replaces_optimistic_message() {
        let mut state = opened("1");
        state.set_history("1", vec![msg("a", "1", "center", "안녕하세요")]);
        assert!(state.add_optimistic("1", "temp-1", &draft("예약 가능할까요?")));
        assert!(is_temp(&state.messages[1]));

        state.receive(msg("srv-9", "1", "me", "예약 가능할까요?"));

        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[1].message_id, "srv-9");
    }

    #[test]
    fn test_history_with_stored_copy_clears_optimistic_message() {
        let mut state = opened("1");
        state.add_optimistic("1", "temp-1", &draft("hi"));

        state.set_history("1", vec![msg("srv-1", "1", "me", "hi")]);
        state.receive(msg("srv-1", "1", "me", "hi"));

        let ids: Vec<&str> = state.messages.iter().map(|m| m.message_id.as_str()).collect();
        assert_eq!(ids, vec!["srv-1"]);
    }

    #[test]
    fn test_refresh_keeps_optimistic_message_matching_older_one() {
        let mut state = opened("1");
        state.set_history("1", vec![msg("srv-1", "1", "me", "hi")]);
        state.add_optimistic("1", "temp-1", &draft("hi"));

        state.set_history("1", vec![msg("srv-1", "1", "me", "hi")]);

        assert_eq!(state.messages.len(), 2);
        assert!(is_temp(&state.messages[1]));
    }

    #[test]
    fn test_incoming_from_other_sender_appends() {
        let mut state = opened("1");
        state.add_optimistic("1", "temp-1", &draft("hi"));
        state.receive(msg("srv-1", "1", "center", "네"));
        assert_eq!(state.messages.len(), 2);
        assert!(is_temp(&state.messages[0]));
        assert_eq!(state.selected, 1);
    }

    #[test]
    fn test_incoming_for_other_room_and_repeats_ignored() {
        let mut state = opened("1");
        state.receive(msg("srv-1", "2", "center", "다른 방"));
        assert!(state.messages.is_empty());

        state.receive(msg("srv-1", "1", "center", "네"));
        state.receive(msg("srv-1", "1", "center", "네"));
        assert_eq!(state.messages.len(), 1);
    }

    #[test]
    fn test_confirm_and_discard() {
        let mut state = opened("1");
        state.add_optimistic("1", "temp-1", &draft("first"));
        state.add_optimistic("1", "temp-2", &draft("second"));

        state.confirm("temp-1", msg("m-1", "1", "me", "first"));
        state.discard("temp-2");

        let ids: Vec<_> = state.messages.iter().map(|m| m.message_id.as_str()).collect();
        assert_eq!(ids, vec!["m-1"]);
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn test_history_keeps_pending_sends() {
        let mut state = opened("1");
        state.add_optimistic("1", "temp-1", &draft("typed early"));
        state.set_history("1", vec![msg("a", "1", "center", "old")]);
        let ids: Vec<_> = state.messages.iter().map(|m| m.message_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "temp-1"]);
    }

    #[test]
    fn test_optimistic_needs_open_room() {
        let mut state = MessagesState::new("me");
        assert!(!state.add_optimistic("1", "temp-1", &draft("hi")));
    }

    #[test]
    fn test_time_labels() {
        let now = NaiveDate::from_ymd_opt(2025, 8, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert_eq!(time_label("2025-08-02T08:15:00", now), "08:15");
        assert_eq!(time_label("2025-08-01T23:59:59.123", now), "어제");
        assert_eq!(time_label("2025-07-20T10:00:00", now), "07/20");
        assert_eq!(time_label("garbage", now), "");
    }

    #[test]
    fn test_wrap_text_by_width() {
        assert_eq!(wrap_text("hello world", 5), vec!["hello", "world"]);
        assert_eq!(wrap_text("가나다라마", 4), vec!["가나", "다라", "마"]);
        assert_eq!(wrap_text("a\n\nb", 10), vec!["a", "", "b"]);
    }

    #[test]
    fn test_scroll_follows_selection() {
        let ranges = vec![(0, 4), (4, 8), (8, 12)];
        assert_eq!(compute_scroll(2, &ranges, 6, 12), 6);
        assert_eq!(compute_scroll(0, &ranges, 6, 12), 0);
        assert_eq!(compute_scroll(0, &ranges, 20, 12), 0);
    }

    #[test]
    fn test_render_own_and_other_messages() {
        let mut state = opened("1");
        state.set_history(
            "1",
            vec![msg("a", "1", "center", "hello there"), msg("b", "1", "me", "reply text")],
        );
        let area = Rect::new(0, 0, 50, 14);
        let mut buf = Buffer::empty(area);
        render(area, &mut buf, &state, true);
        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("hello there"));
        assert!(text.contains("reply text"));
    }
}
