//! Vehicle list modal and the add/edit form behind it.
//!
//! The modal only projects what it is given: the parent owns the vehicle
//! list, the loading flag and the selection, and reacts to the returned
//! `VehicleAction`.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget},
};

use super::compose::{input_window, TextInput};
use super::help::centered_rect;
use super::sidebar::compute_scroll_offset;
use crate::models::{UserCar, UserCarForm};

pub const EMPTY_TITLE: &str = "등록된 차량이 없습니다.";
pub const EMPTY_HINT: &str = "첫 차량을 등록하여 견적을 받아보세요.";

const LIST_POPUP: (u16, u16) = (60, 16);
const FORM_POPUP: (u16, u16) = (52, 9);

/// What the user asked the modal to do.
#[derive(Debug, Clone, PartialEq)]
pub enum VehicleAction {
    Close,
    AddNew,
    Edit(UserCar),
}

/// Which block the modal body shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalBody {
    Loading,
    Empty,
    List,
}

/// Loading wins over everything; the empty state only shows once loaded.
pub fn body(vehicles: &[UserCar], is_loading: bool) -> ModalBody {
    if is_loading {
        ModalBody::Loading
    } else if vehicles.is_empty() {
        ModalBody::Empty
    } else {
        ModalBody::List
    }
}

/// Keys for the list modal. Moves `selected` for Up/Down; returns the
/// action for anything the parent must handle.
pub fn handle_key(
    key: KeyEvent,
    vehicles: &[UserCar],
    selected: &mut usize,
) -> Option<VehicleAction> {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('v') => Some(VehicleAction::Close),
        KeyCode::Char('a') | KeyCode::Char('n') => Some(VehicleAction::AddNew),
        KeyCode::Enter | KeyCode::Char('e') => vehicles
            .get(*selected)
            .cloned()
            .map(VehicleAction::Edit),
        KeyCode::Up | KeyCode::Char('k') => {
            *selected = selected.saturating_sub(1);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if *selected + 1 < vehicles.len() {
                *selected += 1;
            }
            None
        }
        _ => None,
    }
}

/// Render the vehicle list modal centred over `area`.
pub fn render(area: Rect, buf: &mut Buffer, vehicles: &[UserCar], is_loading: bool, selected: usize) {
    let popup = centered_rect(LIST_POPUP.0, LIST_POPUP.1, area);
    Clear.render(popup, buf);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            " 내 차량 ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .title_bottom(Line::from(Span::styled(
            " a 추가  Enter 수정  Esc 닫기 ",
            Style::default().fg(Color::DarkGray),
        )));

    let inner = block.inner(popup);
    block.render(popup, buf);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let lines: Vec<Line> = match body(vehicles, is_loading) {
        ModalBody::Loading => vec![Line::from(Span::styled(
            " 차량 정보를 불러오는 중...",
            Style::default().fg(Color::DarkGray),
        ))],
        ModalBody::Empty => vec![
            Line::from(""),
            Line::from(Span::styled(
                EMPTY_TITLE,
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ))
            .centered(),
            Line::from(Span::styled(EMPTY_HINT, Style::default().fg(Color::Gray))).centered(),
        ],
        ModalBody::List => {
            let visible = inner.height as usize;
            let offset = compute_scroll_offset(selected, visible, vehicles.len());
            vehicles
                .iter()
                .enumerate()
                .skip(offset)
                .take(visible)
                .map(|(i, car)| vehicle_line(car, i == selected))
                .collect()
        }
    };
    Paragraph::new(lines).render(inner, buf);
}

fn vehicle_line(car: &UserCar, selected: bool) -> Line<'static> {
    let cursor = if selected { "\u{25BA}" } else { " " };
    let style = if selected {
        Style::default()
            .fg(Color::White)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    Line::from(vec![
        Span::styled(format!("{} {}", cursor, car.car_model), style),
        Span::styled(format!("  {}", car.car_number), style.fg(Color::Cyan)),
        Span::styled(format!("  {}년식", car.model_year), style.fg(Color::DarkGray)),
    ])
}

// ---------------------------------------------------------------------------
// Add/edit form
// ---------------------------------------------------------------------------

const FIELD_LABELS: [&str; 3] = ["차종", "차량 번호", "연식"];

/// What a key press in the form resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum FormOutcome {
    Cancel,
    Submit(UserCarForm),
    /// Submit was attempted but a field is invalid.
    Invalid(String),
}

/// Form for creating or editing one vehicle.
#[derive(Debug, Clone)]
pub struct VehicleForm {
    /// `None` when registering a new vehicle.
    pub vehicle_id: Option<i64>,
    fields: [TextInput; 3],
    focus: usize,
}

impl VehicleForm {
    pub fn new() -> Self {
        Self {
            vehicle_id: None,
            fields: Default::default(),
            focus: 0,
        }
    }

    pub fn edit(car: &UserCar) -> Self {
        Self {
            vehicle_id: Some(car.user_car_id),
            fields: [
                TextInput::with_text(&car.car_model),
                TextInput::with_text(&car.car_number),
                TextInput::with_text(&car.model_year.to_string()),
            ],
            focus: 0,
        }
    }

    /// Validate the fields into a request body.
    pub fn to_form(&self) -> Result<UserCarForm, String> {
        let [model, number, year] = &self.fields;
        let car_model = model.value().trim();
        let car_number = number.value().trim();
        if car_model.is_empty() {
            return Err("차종을 입력해주세요.".to_string());
        }
        if car_number.is_empty() {
            return Err("차량 번호를 입력해주세요.".to_string());
        }
        let model_year = year
            .value()
            .trim()
            .parse::<i32>()
            .ok()
            .filter(|y| (1900..=2100).contains(y))
            .ok_or_else(|| "연식은 네 자리 숫자로 입력해주세요.".to_string())?;
        Ok(UserCarForm {
            car_model: car_model.to_string(),
            car_number: car_number.to_string(),
            model_year,
        })
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<FormOutcome> {
        let count = FIELD_LABELS.len();
        match key.code {
            KeyCode::Esc => return Some(FormOutcome::Cancel),
            KeyCode::Enter => {
                return Some(match self.to_form() {
                    Ok(form) => FormOutcome::Submit(form),
                    Err(msg) => FormOutcome::Invalid(msg),
                })
            }
            KeyCode::Tab | KeyCode::Down => self.focus = (self.focus + 1) % count,
            KeyCode::BackTab | KeyCode::Up => self.focus = (self.focus + count - 1) % count,
            _ => edit_field(&mut self.fields[self.focus], key),
        }
        None
    }
}

fn edit_field(field: &mut TextInput, key: KeyEvent) {
    match key.code {
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => field.clear(),
        KeyCode::Char(c) => field.insert_char(c),
        KeyCode::Backspace => field.backspace(),
        KeyCode::Delete => field.delete(),
        KeyCode::Left => field.move_left(),
        KeyCode::Right => field.move_right(),
        KeyCode::Home => field.move_home(),
        KeyCode::End => field.move_end(),
        _ => {}
    }
}

impl Default for VehicleForm {
    fn default() -> Self {
        Self::new()
    }
}

pub fn render_form(area: Rect, buf: &mut Buffer, form: &VehicleForm, error: Option<&str>) {
    let popup = centered_rect(FORM_POPUP.0, FORM_POPUP.1, area);
    Clear.render(popup, buf);

    let title = if form.vehicle_id.is_some() {
        " 차량 정보 수정 "
    } else {
        " 차량 등록 "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .title_bottom(Line::from(Span::styled(
            " Tab 다음  Enter 저장  Esc 취소 ",
            Style::default().fg(Color::DarkGray),
        )));

    let inner = block.inner(popup);
    block.render(popup, buf);

    let rows = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .split(inner);

    for (i, label) in FIELD_LABELS.iter().enumerate() {
        let focused = i == form.focus;
        let label_style = if focused {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let label_text = format!(" {:<8}", label);
        let label_w = unicode_width::UnicodeWidthStr::width(label_text.as_str());
        let window = input_window(
            &form.fields[i],
            (rows[i].width as usize).saturating_sub(label_w + 1),
        );
        let mut spans = vec![
            Span::styled(label_text, label_style),
            Span::styled(window.visible, Style::default().fg(Color::White)),
        ];
        if focused {
            spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
        }
        Paragraph::new(Line::from(spans)).render(rows[i], buf);
    }

    if let Some(msg) = error {
        Paragraph::new(Line::from(Span::styled(
            format!(" {}", msg),
            Style::default().fg(Color::Red),
        )))
        .render(rows[4], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn car(id: i64, model: &str) -> UserCar {
        UserCar {
            user_car_id: id,
            car_model: model.to_string(),
            car_number: format!("12가 {:04}", id),
            model_year: 2020,
            created_at: "2025-08-01T10:00:00".to_string(),
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn screen(vehicles: &[UserCar], is_loading: bool) -> String {
        screen_at(vehicles, is_loading, 0)
    }

    fn screen_at(vehicles: &[UserCar], is_loading: bool, selected: usize) -> String {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| render(f.area(), f.buffer_mut(), vehicles, is_loading, selected))
            .unwrap();
        // Wide glyphs occupy two cells; skip the filler cell after each.
        let mut out = String::new();
        let mut skip = 0;
        for cell in terminal.backend().buffer().content() {
            if skip > 0 {
                skip -= 1;
                continue;
            }
            out.push_str(cell.symbol());
            skip = unicode_width::UnicodeWidthStr::width(cell.symbol()).saturating_sub(1);
        }
        out
    }

    #[test]
    fn test_body_projection() {
        let cars = vec![car(1, "Avante")];
        assert_eq!(body(&[], true), ModalBody::Loading);
        assert_eq!(body(&cars, true), ModalBody::Loading);
        assert_eq!(body(&[], false), ModalBody::Empty);
        assert_eq!(body(&cars, false), ModalBody::List);
    }

    #[test]
    fn test_render_list() {
        let text = screen(&[car(1, "Avante"), car(2, "Sonata")], false);
        assert!(text.contains("Avante"));
        assert!(text.contains("Sonata"));
    }

    #[test]
    fn test_long_list_scrolls_to_selection() {
        let cars: Vec<UserCar> = (1..=20).map(|i| car(i, &format!("Model{:02}", i))).collect();

        let top = screen_at(&cars, false, 0);
        assert!(top.contains("Model01"));
        assert!(!top.contains("Model20"));

        let bottom = screen_at(&cars, false, 19);
        assert!(bottom.contains("Model20"));
        assert!(!bottom.contains("Model01"));
    }

    #[test]
    fn test_render_loading_hides_list() {
        let text = screen(&[car(1, "Avante")], true);
        assert!(!text.contains("Avante"));
        assert!(!text.contains(EMPTY_TITLE));
    }

    #[test]
    fn test_empty_state_only_when_loaded_and_empty() {
        assert!(screen(&[], false).contains(EMPTY_TITLE));
        assert!(screen(&[], false).contains(EMPTY_HINT));
        assert!(!screen(&[], true).contains(EMPTY_TITLE));
        assert!(!screen(&[car(1, "Avante")], false).contains(EMPTY_TITLE));
    }

    #[test]
    fn test_keys_map_to_actions() {
        let cars = vec![car(1, "Avante"), car(2, "Sonata")];
        let mut selected = 0;

        assert_eq!(handle_key(key(KeyCode::Esc), &cars, &mut selected), Some(VehicleAction::Close));
        assert_eq!(handle_key(key(KeyCode::Char('a')), &cars, &mut selected), Some(VehicleAction::AddNew));

        assert_eq!(handle_key(key(KeyCode::Down), &cars, &mut selected), None);
        assert_eq!(handle_key(key(KeyCode::Down), &cars, &mut selected), None);
        assert_eq!(selected, 1);
        assert_eq!(
            handle_key(key(KeyCode::Enter), &cars, &mut selected),
            Some(VehicleAction::Edit(cars[1].clone()))
        );
    }

    #[test]
    fn test_edit_without_vehicles_does_nothing() {
        let mut selected = 0;
        assert_eq!(handle_key(key(KeyCode::Enter), &[], &mut selected), None);
    }

    #[test]
    fn test_form_submit_and_validation() {
        let mut form = VehicleForm::new();
        for c in "K5".chars() {
            form.handle_key(key(KeyCode::Char(c)));
        }
        form.handle_key(key(KeyCode::Tab));
        for c in "34나 5678".chars() {
            form.handle_key(key(KeyCode::Char(c)));
        }
        form.handle_key(key(KeyCode::Tab));
        for c in "19".chars() {
            form.handle_key(key(KeyCode::Char(c)));
        }
        assert!(matches!(
            form.handle_key(key(KeyCode::Enter)),
            Some(FormOutcome::Invalid(_))
        ));

        for c in "99".chars() {
            form.handle_key(key(KeyCode::Char(c)));
        }
        assert_eq!(
            form.handle_key(key(KeyCode::Enter)),
            Some(FormOutcome::Submit(UserCarForm {
                car_model: "K5".to_string(),
                car_number: "34나 5678".to_string(),
                model_year: 1999,
            }))
        );
    }

    #[test]
    fn test_edit_form_prefills() {
        let form = VehicleForm::edit(&car(7, "Morning"));
        assert_eq!(form.vehicle_id, Some(7));
        let body = form.to_form().unwrap();
        assert_eq!(body.car_model, "Morning");
        assert_eq!(body.model_year, 2020);
    }
}
