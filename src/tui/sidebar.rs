//! Sidebar widget: the chat room list.

use chrono::{Local, NaiveDateTime};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::messages::time_label;
use crate::models::ChatRoom;

/// Rows per room: name + time, then the last message preview.
const ROOM_ROWS: usize = 2;

pub struct SidebarState {
    pub rooms: Vec<ChatRoom>,
    pub selected: usize,
    pub loading: bool,
    /// Car centers see the user's name; users see the center's.
    pub viewer_is_center: bool,
}

impl SidebarState {
    pub fn new(viewer_is_center: bool) -> Self {
        Self {
            rooms: Vec::new(),
            selected: 0,
            loading: true,
            viewer_is_center,
        }
    }

    /// Replace the room list, keeping the selection on the same room.
    pub fn update_rooms(&mut self, rooms: Vec<ChatRoom>) {
        let current = self.selected_room().map(|r| r.room_id.clone());
        self.rooms = rooms;
        self.loading = false;
        self.selected = current
            .and_then(|id| self.rooms.iter().position(|r| r.room_id == id))
            .unwrap_or(0);
    }

    pub fn selected_room(&self) -> Option<&ChatRoom> {
        self.rooms.get(self.selected)
    }

    pub fn room(&self, room_id: &str) -> Option<&ChatRoom> {
        self.rooms.iter().find(|r| r.room_id == room_id)
    }

    /// Name of the other side of a room.
    pub fn counterpart<'a>(&self, room: &'a ChatRoom) -> &'a str {
        if self.viewer_is_center {
            &room.user.name
        } else {
            &room.car_center.name
        }
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.rooms.len() {
            self.selected += 1;
        }
    }

    /// Reflect a sent or received message in the room's preview.
    pub fn set_last_message(&mut self, room_id: &str, content: &str, at: &str) {
        if let Some(room) = self.rooms.iter_mut().find(|r| r.room_id == room_id) {
            room.last_message = Some(content.to_string());
            room.updated_at = at.to_string();
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub fn render(area: Rect, buf: &mut Buffer, state: &SidebarState, focused: bool) {
    let (border_style, border_type) = if focused {
        (Style::default().fg(Color::Yellow), BorderType::Double)
    } else {
        (Style::default().fg(Color::DarkGray), BorderType::Plain)
    };

    let title = if focused { ">> 채팅방" } else { "   채팅방" };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(border_style)
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    block.render(area, buf);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    if state.loading || state.rooms.is_empty() {
        let text = if state.loading {
            " 불러오는 중..."
        } else {
            " 채팅방이 없습니다."
        };
        let line = Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)));
        Paragraph::new(line).render(Rect::new(inner.x, inner.y, inner.width, 1), buf);
        return;
    }

    let visible = (inner.height as usize / ROOM_ROWS).max(1);
    let offset = compute_scroll_offset(state.selected, visible, state.rooms.len());
    let now = Local::now().naive_local();

    for (slot, idx) in (offset..state.rooms.len()).take(visible).enumerate() {
        let y = inner.y + (slot * ROOM_ROWS) as u16;
        if y >= inner.bottom() {
            break;
        }
        let room = &state.rooms[idx];
        let selected = idx == state.selected;
        render_room(buf, inner, y, state, room, selected, now);
    }
}

fn render_room(
    buf: &mut Buffer,
    inner: Rect,
    y: u16,
    state: &SidebarState,
    room: &ChatRoom,
    selected: bool,
    now: NaiveDateTime,
) {
    let name_style = if selected {
        Style::default()
            .fg(Color::White)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let cursor = if selected { "\u{25BA}" } else { " " };
    let label = format!("{} {}", cursor, state.counterpart(room));
    let stamp = time_label(&room.updated_at, now);
    render_row(
        buf,
        Rect::new(inner.x, y, inner.width, 1),
        &label,
        &stamp,
        name_style,
        Style::default().fg(Color::DarkGray),
    );

    if y + 1 < inner.bottom() {
        let preview = room
            .last_message
            .as_deref()
            .map(|m| m.replace('\n', " "))
            .unwrap_or_default();
        let preview_style = if selected {
            Style::default().fg(Color::Gray).bg(Color::DarkGray)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        render_row(
            buf,
            Rect::new(inner.x, y + 1, inner.width, 1),
            &format!("   {}", preview),
            "",
            preview_style,
            preview_style,
        );
    }
}

/// First visible row so the selected one stays on screen.
pub(super) fn compute_scroll_offset(selected: usize, visible: usize, total: usize) -> usize {
    if total <= visible || selected < visible {
        return 0;
    }
    selected
        .saturating_sub(visible - 1)
        .min(total.saturating_sub(visible))
}

/// Left-aligned text and a right-aligned badge, truncated by display width.
fn render_row(
    buf: &mut Buffer,
    area: Rect,
    left: &str,
    badge: &str,
    text_style: Style,
    badge_style: Style,
) {
    let width = area.width as usize;
    if width == 0 {
        return;
    }
    let badge_w = badge.width();
    let max_left = if badge_w > 0 {
        width.saturating_sub(badge_w + 1)
    } else {
        width
    };

    let mut left_truncated = String::new();
    let mut used = 0;
    for ch in left.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max_left {
            break;
        }
        left_truncated.push(ch);
        used += w;
    }
    let pad = width.saturating_sub(used + badge_w);

    let line = Line::from(vec![
        Span::styled(left_truncated, text_style),
        Span::styled(" ".repeat(pad), text_style),
        Span::styled(badge.to_string(), badge_style),
    ]);
    Paragraph::new(line).render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Participant;

    fn room(id: &str, center: &str) -> ChatRoom {
        ChatRoom {
            room_id: id.to_string(),
            user: Participant {
                id: "user1".to_string(),
                name: "김철수".to_string(),
            },
            car_center: Participant {
                id: format!("c{}", id),
                name: center.to_string(),
            },
            updated_at: "2025-08-01T10:00:00".to_string(),
            last_message: None,
        }
    }

    #[test]
    fn test_update_keeps_selected_room() {
        let mut state = SidebarState::new(false);
        state.update_rooms(vec![room("1", "A"), room("2", "B")]);
        state.move_down();
        assert_eq!(state.selected_room().unwrap().room_id, "2");

        state.update_rooms(vec![room("3", "C"), room("2", "B"), room("1", "A")]);
        assert_eq!(state.selected, 1);
        assert!(!state.loading);

        state.update_rooms(vec![room("9", "Z")]);
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn test_move_stays_in_bounds() {
        let mut state = SidebarState::new(false);
        state.move_down();
        assert_eq!(state.selected, 0);
        state.update_rooms(vec![room("1", "A"), room("2", "B")]);
        state.move_down();
        state.move_down();
        assert_eq!(state.selected, 1);
        state.move_up();
        state.move_up();
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn test_counterpart_depends_on_viewer() {
        let r = room("1", "강남 오토 서비스");
        assert_eq!(SidebarState::new(false).counterpart(&r), "강남 오토 서비스");
        assert_eq!(SidebarState::new(true).counterpart(&r), "김철수");
    }

    #[test]
    fn test_set_last_message() {
        let mut state = SidebarState::new(false);
        state.update_rooms(vec![room("1", "A")]);
        state.set_last_message("1", "새 메시지", "2025-08-02T09:00:00");
        state.set_last_message("404", "ignored", "2025-08-02T09:00:00");
        let r = state.room("1").unwrap();
        assert_eq!(r.last_message.as_deref(), Some("새 메시지"));
        assert_eq!(r.updated_at, "2025-08-02T09:00:00");
    }

    #[test]
    fn test_scroll_offset() {
        assert_eq!(compute_scroll_offset(0, 3, 10), 0);
        assert_eq!(compute_scroll_offset(5, 3, 10), 3);
        assert_eq!(compute_scroll_offset(9, 3, 10), 7);
        assert_eq!(compute_scroll_offset(4, 10, 5), 0);
    }
}
