//! UI rendering for the TUI

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use super::app::{App, Modal, Pane, View};
use super::compose;
use super::help;
use super::log_pane;
use super::map;
use super::messages;
use super::sidebar;
use super::vehicles;

const SIDEBAR_WIDTH: u16 = 28;
const LOG_HEIGHT: u16 = 10;

fn status_indicator(is_online: bool) -> (&'static str, Color) {
    if is_online {
        ("*", Color::Green)
    } else {
        ("o", Color::Red)
    }
}

/// Main render function. Takes `&mut` because the map records its viewport.
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    let [header_area, main_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(header_area, frame.buffer_mut(), app);

    let (view_area, log_area) = if app.log.visible {
        let [view, log] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(LOG_HEIGHT)]).areas(main_area);
        (view, Some(log))
    } else {
        (main_area, None)
    };

    match app.view {
        View::Chat => render_chat(frame, view_area, app),
        View::Map => map::render(
            view_area,
            frame.buffer_mut(),
            &mut app.map,
            &app.centers,
            app.map_selected,
            true,
        ),
    }

    if let Some(log_area) = log_area {
        log_pane::render(log_area, frame.buffer_mut(), &app.log);
    }

    render_status(status_area, frame.buffer_mut(), app);

    match app.modal {
        Some(Modal::Vehicles) => vehicles::render(
            view_area,
            frame.buffer_mut(),
            &app.vehicles,
            app.vehicles_loading,
            app.vehicle_selected,
        ),
        Some(Modal::VehicleForm {
            ref form,
            ref error,
        }) => vehicles::render_form(view_area, frame.buffer_mut(), form, error.as_deref()),
        None => {}
    }

    if app.show_help {
        help::render_help_popup(frame);
    }
}

fn render_chat(frame: &mut Frame, area: Rect, app: &App) {
    let [sidebar_area, content_area] =
        Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Fill(1)]).areas(area);

    sidebar::render(
        sidebar_area,
        frame.buffer_mut(),
        &app.sidebar,
        app.active_pane == Pane::Sidebar,
    );

    let [messages_area, compose_area] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(compose::COMPOSE_HEIGHT),
    ])
    .areas(content_area);

    messages::render(
        messages_area,
        frame.buffer_mut(),
        &app.messages,
        app.active_pane == Pane::Messages,
    );

    let room_name = app.room_name();
    compose::render(
        compose_area,
        frame,
        &app.compose,
        room_name.as_deref(),
        app.active_pane == Pane::Compose && app.modal.is_none(),
    );
}

fn render_header(area: Rect, buf: &mut Buffer, app: &App) {
    let title_text = " CarParter";
    let title = Span::styled(
        title_text,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let tabs = match app.view {
        View::Chat => "  [F1 채팅]  F2 지도 ",
        View::Map => "  F1 채팅  [F2 지도] ",
    };
    let mock_badge = if app.is_mock { " MOCK " } else { "" };
    let user = format!(" {} ({}) ", app.identity.name, app.identity.role_label());
    let help_text = " [?] 도움말 ";

    let used = title_text.width() + tabs.width() + mock_badge.width() + user.width() + help_text.width();
    let padding = (area.width as usize).saturating_sub(used);

    let line = Line::from(vec![
        title,
        Span::styled(tabs, Style::default().fg(Color::Gray)),
        Span::raw(" ".repeat(padding)),
        Span::styled(
            mock_badge,
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(help_text, Style::default().fg(Color::Gray)),
        Span::styled(user, Style::default().fg(Color::Cyan)),
    ]);

    Paragraph::new(line)
        .style(Style::default().bg(Color::DarkGray))
        .render(area, buf);
}

fn render_status(area: Rect, buf: &mut Buffer, app: &App) {
    if let Some(ref msg) = app.status_message {
        let style = if app.status_is_error {
            Style::default().fg(Color::Red).bg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Green).bg(Color::DarkGray)
        };
        let line = Line::from(Span::styled(format!(" {} ", msg), style));
        Paragraph::new(line)
            .style(Style::default().bg(Color::DarkGray))
            .render(area, buf);
        return;
    }

    let (conn_symbol, conn_color) = status_indicator(app.is_online);
    let sep = Span::styled(" | ", Style::default().fg(Color::Black));

    let room = app.room_name().unwrap_or_else(|| "(없음)".to_string());
    let mut spans = vec![
        Span::styled(
            format!(" {} {} ", conn_symbol, app.connection_state),
            Style::default().fg(conn_color),
        ),
        sep.clone(),
        Span::styled(room, Style::default().fg(Color::Yellow)),
    ];
    match app.view {
        View::Chat => {
            spans.push(sep.clone());
            spans.push(Span::styled(
                format!("Tab: {}", app.active_pane.as_str()),
                Style::default().fg(Color::Cyan),
            ));
        }
        View::Map => {
            if let Some(viewport) = app.map.viewport() {
                spans.push(sep.clone());
                spans.push(Span::styled(
                    format!(
                        "중심 {:.4}, {:.4} (레벨 {})",
                        viewport.center.0, viewport.center.1, viewport.level
                    ),
                    Style::default().fg(Color::Cyan),
                ));
            }
        }
    }
    spans.push(sep.clone());
    spans.push(Span::styled("v: 내 차량", Style::default().fg(Color::Gray)));
    spans.push(sep);
    spans.push(Span::styled(
        format!("C-l: 로그 ({})", app.log.len()),
        Style::default().fg(Color::Gray),
    ));

    Paragraph::new(Line::from(spans))
        .style(Style::default().bg(Color::DarkGray))
        .render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::app::Identity;
    use crate::tui::backend::CommandSender;
    use crate::tui::log_pane::LogSink;
    use ratatui::{backend::TestBackend, Terminal};
    use tokio::sync::mpsc;

    fn screen(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn app(is_mock: bool) -> (App, mpsc::UnboundedReceiver<crate::tui::backend::BackendCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            App::new(Identity::mock(), is_mock, CommandSender::new(tx), LogSink::new()),
            rx,
        )
    }

    #[test]
    fn test_header_shows_mock_badge() {
        let (mut mock, _rx) = app(true);
        assert!(screen(&mut mock).contains("MOCK"));
        let (mut live, _rx) = app(false);
        assert!(!screen(&mut live).contains("MOCK"));
    }

    #[test]
    fn test_map_status_shows_viewport_center() {
        let (mut app, _rx) = app(false);
        assert!(!screen(&mut app).contains("37.5665, 126.9780"));
        app.view = View::Map;
        assert!(screen(&mut app).contains("37.5665, 126.9780"));
    }

    #[test]
    fn test_first_map_render_requests_centers() {
        let (mut app, mut rx) = app(false);
        app.view = View::Map;
        screen(&mut app);
        screen(&mut app);

        let mut loads = 0;
        while let Ok(cmd) = rx.try_recv() {
            if matches!(cmd, crate::tui::backend::BackendCommand::LoadCenters { .. }) {
                loads += 1;
            }
        }
        assert_eq!(loads, 1);
    }
}
