//! Help popup overlay: keyboard shortcuts by category.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const POPUP_WIDTH: u16 = 76;
const POPUP_HEIGHT: u16 = 24;

struct Shortcut {
    key: &'static str,
    desc: &'static str,
}

struct Category {
    title: &'static str,
    shortcuts: &'static [Shortcut],
}

const NAVIGATION: Category = Category {
    title: "이동",
    shortcuts: &[
        Shortcut {
            key: "Up/Down",
            desc: "목록 이동 / 메시지 스크롤",
        },
        Shortcut {
            key: "Tab",
            desc: "다음 영역",
        },
        Shortcut {
            key: "Shift+Tab",
            desc: "이전 영역",
        },
        Shortcut {
            key: "Enter",
            desc: "채팅방 열기 / 카센터 선택",
        },
        Shortcut {
            key: "Esc",
            desc: "채팅방 닫기 (목록에서)",
        },
    ],
};

const VIEWS: Category = Category {
    title: "화면",
    shortcuts: &[
        Shortcut {
            key: "F1",
            desc: "채팅",
        },
        Shortcut {
            key: "F2",
            desc: "카센터 지도",
        },
        Shortcut {
            key: "v",
            desc: "내 차량",
        },
        Shortcut {
            key: "Ctrl+L",
            desc: "로그 창",
        },
    ],
};

const MESSAGING: Category = Category {
    title: "메시지",
    shortcuts: &[
        Shortcut {
            key: "Enter",
            desc: "전송",
        },
        Shortcut {
            key: "Alt+Enter",
            desc: "줄바꿈",
        },
        Shortcut {
            key: "Ctrl+U",
            desc: "입력 지우기",
        },
        Shortcut {
            key: "Esc",
            desc: "입력창 나가기 / 닫기",
        },
    ],
};

const MISC: Category = Category {
    title: "기타",
    shortcuts: &[
        Shortcut {
            key: "Ctrl+R",
            desc: "새로고침",
        },
        Shortcut {
            key: "PgUp/PgDn",
            desc: "로그 스크롤",
        },
        Shortcut {
            key: "q",
            desc: "종료",
        },
        Shortcut {
            key: "?",
            desc: "도움말",
        },
    ],
};

/// Render the help popup centred on screen.
pub fn render_help_popup(frame: &mut Frame) {
    let area = frame.area();
    let popup_area = centered_rect(POPUP_WIDTH, POPUP_HEIGHT, area);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(vec![
            Span::styled(
                " 도움말 ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("(? 닫기) ", Style::default().fg(Color::Gray)),
        ]))
        .title_bottom(Line::from(Span::styled(
            " 아무 키나 누르면 닫힙니다 ",
            Style::default().fg(Color::Gray),
        )));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let [left_col, right_col] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(inner);

    frame.render_widget(
        Paragraph::new(column_lines(&[&NAVIGATION, &VIEWS])),
        inset(left_col, 1, 1),
    );
    frame.render_widget(
        Paragraph::new(column_lines(&[&MESSAGING, &MISC])),
        inset(right_col, 1, 1),
    );
}

fn column_lines(categories: &[&Category]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for (i, cat) in categories.iter().enumerate() {
        if i > 0 {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            cat.title,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            "\u{2500}".repeat(32),
            Style::default().fg(Color::DarkGray),
        )));
        for sc in cat.shortcuts {
            lines.push(Line::from(vec![
                Span::styled(format!("{:<12}", sc.key), Style::default().fg(Color::Yellow)),
                Span::styled(sc.desc, Style::default().fg(Color::Gray)),
            ]));
        }
    }

    lines
}

/// Sub-rect of at most `width` x `height`, centred in `area`.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width.saturating_sub(2));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}

fn inset(area: Rect, h: u16, v: u16) -> Rect {
    Rect::new(
        area.x + h,
        area.y + v,
        area.width.saturating_sub(h * 2),
        area.height.saturating_sub(v * 2),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_clamps_to_area() {
        let area = Rect::new(0, 0, 40, 10);
        assert_eq!(centered_rect(76, 24, area), Rect::new(1, 1, 38, 8));
        assert_eq!(centered_rect(20, 4, area), Rect::new(10, 3, 20, 4));
    }
}
