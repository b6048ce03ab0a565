//! Map of car centers.
//!
//! A canvas centred on Seoul City Hall with one marker per center that has
//! coordinates. The widget keeps no selection of its own: the parent passes
//! the selected marker index in and receives activations through a handler.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Line as CanvasLine},
        Block, BorderType, Borders, Paragraph, Widget,
    },
};

use crate::models::CarCenter;

/// Initial centre, as `(latitude, longitude)`.
pub const MAP_CENTER: (f64, f64) = (37.5665, 126.9780);
/// Initial zoom level. Each level doubles the visible span.
pub const MAP_LEVEL: u8 = 8;

const MARKER_GLYPH: &str = "●";

/// A center that can be placed on the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker<'a> {
    pub center: &'a CarCenter,
    pub lat: f64,
    pub lng: f64,
}

/// Markers for every center with both coordinates, in input order.
pub fn markers(centers: &[CarCenter]) -> Vec<Marker<'_>> {
    centers
        .iter()
        .filter_map(|center| {
            let (lat, lng) = center.coordinates()?;
            Some(Marker { center, lat, lng })
        })
        .collect()
}

/// Geographic window shown in a terminal area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: (f64, f64),
    pub level: u8,
    /// Canvas area (inside the border).
    pub area: Rect,
}

impl Viewport {
    fn half_lng(&self) -> f64 {
        0.0005 * 2f64.powi(i32::from(self.level))
    }

    /// Terminal cells are roughly twice as tall as wide.
    fn half_lat(&self) -> f64 {
        self.half_lng() * 0.8
    }

    pub fn x_bounds(&self) -> [f64; 2] {
        let (_, lng) = self.center;
        [lng - self.half_lng(), lng + self.half_lng()]
    }

    pub fn y_bounds(&self) -> [f64; 2] {
        let (lat, _) = self.center;
        [lat - self.half_lat(), lat + self.half_lat()]
    }

    /// Terminal cell a coordinate is drawn in, matching where the canvas
    /// places printed labels. `None` when outside the window.
    pub fn project(&self, lat: f64, lng: f64) -> Option<(u16, u16)> {
        let [left, right] = self.x_bounds();
        let [bottom, top] = self.y_bounds();
        if self.area.width == 0 || self.area.height == 0 {
            return None;
        }
        if lng < left || lng > right || lat < bottom || lat > top {
            return None;
        }
        let res_x = f64::from(self.area.width) - 1.0;
        let res_y = f64::from(self.area.height) - 1.0;
        let x = ((lng - left) * res_x / (right - left)) as u16 + self.area.x;
        let y = ((top - lat) * res_y / (top - bottom)) as u16 + self.area.y;
        Some((x, y))
    }
}

type OnCreate = Box<dyn FnOnce(&Viewport) + Send>;

/// The map view. Holds the viewport once laid out, and the one-shot
/// `on_create` callback.
pub struct CenterMap {
    viewport: Option<Viewport>,
    on_create: Option<OnCreate>,
}

impl CenterMap {
    pub fn new() -> Self {
        Self {
            viewport: None,
            on_create: None,
        }
    }

    /// Called with the viewport the first time the map is laid out.
    pub fn on_create(mut self, callback: impl FnOnce(&Viewport) + Send + 'static) -> Self {
        self.on_create = Some(Box::new(callback));
        self
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    /// Fit the viewport to `area`. Fires `on_create` on the first call.
    pub fn layout(&mut self, area: Rect) {
        let viewport = Viewport {
            center: MAP_CENTER,
            level: MAP_LEVEL,
            area,
        };
        self.viewport = Some(viewport);
        if let Some(callback) = self.on_create.take() {
            callback(&viewport);
        }
    }

    /// Hit-test a mouse click. Calls `on_marker` with the center under
    /// `(col, row)` and returns whether one was hit. The glyph's cell and the
    /// one to its right both count.
    pub fn click(
        &self,
        centers: &[CarCenter],
        col: u16,
        row: u16,
        on_marker: impl FnOnce(&CarCenter),
    ) -> bool {
        let Some(viewport) = self.viewport else {
            return false;
        };
        let hit = markers(centers).into_iter().find(|m| {
            viewport
                .project(m.lat, m.lng)
                .is_some_and(|(x, y)| y == row && (col == x || col == x + 1))
        });
        match hit {
            Some(marker) => {
                on_marker(marker.center);
                true
            }
            None => false,
        }
    }

    /// Keyboard activation of the `selected`-th marker.
    pub fn activate(
        &self,
        centers: &[CarCenter],
        selected: usize,
        on_marker: impl FnOnce(&CarCenter),
    ) -> bool {
        match markers(centers).get(selected) {
            Some(marker) => {
                on_marker(marker.center);
                true
            }
            None => false,
        }
    }
}

impl Default for CenterMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Render the map. Lays out the viewport as a side effect.
pub fn render(
    area: Rect,
    buf: &mut Buffer,
    map: &mut CenterMap,
    centers: &[CarCenter],
    selected: Option<usize>,
    focused: bool,
) {
    let (border_style, border_type) = if focused {
        (Style::default().fg(Color::Yellow), BorderType::Double)
    } else {
        (Style::default().fg(Color::DarkGray), BorderType::Plain)
    };

    let marks = markers(centers);
    let title = format!(" 카센터 지도 ({}곳) ", marks.len());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(border_style)
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    block.render(area, buf);
    if inner.width < 3 || inner.height < 3 {
        return;
    }

    // Last row is the caption of the selected center.
    let canvas_area = Rect::new(inner.x, inner.y, inner.width, inner.height - 1);
    let caption_area = Rect::new(inner.x, inner.y + inner.height - 1, inner.width, 1);

    map.layout(canvas_area);
    let Some(viewport) = map.viewport else {
        return;
    };
    let [left, right] = viewport.x_bounds();
    let [bottom, top] = viewport.y_bounds();
    let (lat0, lng0) = viewport.center;

    Canvas::default()
        .x_bounds([left, right])
        .y_bounds([bottom, top])
        .paint(|ctx| {
            ctx.draw(&CanvasLine {
                x1: left,
                y1: lat0,
                x2: right,
                y2: lat0,
                color: Color::DarkGray,
            });
            ctx.draw(&CanvasLine {
                x1: lng0,
                y1: bottom,
                x2: lng0,
                y2: top,
                color: Color::DarkGray,
            });
            ctx.layer();
            for (i, m) in marks.iter().enumerate() {
                let style = if selected == Some(i) {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Red)
                };
                ctx.print(m.lng, m.lat, Span::styled(MARKER_GLYPH, style));
            }
        })
        .render(canvas_area, buf);

    let caption = match selected.and_then(|i| marks.get(i)) {
        Some(m) => Line::from(vec![
            Span::styled(
                format!(" {} ", m.center.center_name),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(m.center.address.clone(), Style::default().fg(Color::Gray)),
        ]),
        None if marks.is_empty() => Line::from(Span::styled(
            " 표시할 카센터가 없습니다.",
            Style::default().fg(Color::DarkGray),
        )),
        None => Line::from(Span::styled(
            " ←/→ 선택  Enter 열기  클릭으로 선택",
            Style::default().fg(Color::DarkGray),
        )),
    };
    Paragraph::new(caption).render(caption_area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CenterStatus;
    use std::sync::{Arc, Mutex};

    fn center(id: &str, lat: Option<f64>, lng: Option<f64>) -> CarCenter {
        CarCenter {
            center_id: id.to_string(),
            center_name: format!("{} 정비소", id),
            business_registration_number: None,
            address: "서울 중구".to_string(),
            phone_number: "02-000-0000".to_string(),
            status: CenterStatus::Active,
            description: None,
            opening_hours: None,
            latitude: lat,
            longitude: lng,
        }
    }

    fn laid_out(area: Rect) -> CenterMap {
        let mut map = CenterMap::new();
        map.layout(area);
        map
    }

    #[test]
    fn test_markers_skip_missing_coordinates() {
        let centers = vec![
            center("a", Some(37.5), Some(127.0)),
            center("b", None, Some(127.0)),
            center("c", Some(37.5), None),
            center("d", None, None),
            center("e", Some(37.6), Some(126.9)),
        ];
        let ids: Vec<_> = markers(&centers)
            .iter()
            .map(|m| m.center.center_id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "e"]);
    }

    fn near(actual: (u16, u16), expected: (u16, u16)) -> bool {
        actual.0.abs_diff(expected.0) <= 1 && actual.1.abs_diff(expected.1) <= 1
    }

    #[test]
    fn test_projection_of_map_center_is_middle_cell() {
        let map = laid_out(Rect::new(0, 0, 41, 21));
        let viewport = map.viewport().unwrap();
        let cell = viewport.project(MAP_CENTER.0, MAP_CENTER.1).unwrap();
        assert!(near(cell, (20, 10)), "got {:?}", cell);
    }

    #[test]
    fn test_projection_of_corners() {
        let map = laid_out(Rect::new(0, 0, 41, 21));
        let viewport = map.viewport().unwrap();
        let [left, _] = viewport.x_bounds();
        let [_, top] = viewport.y_bounds();
        assert_eq!(viewport.project(top, left), Some((0, 0)));
    }

    #[test]
    fn test_projection_outside_window() {
        let map = laid_out(Rect::new(0, 0, 40, 20));
        let viewport = map.viewport().unwrap();
        assert_eq!(viewport.project(35.1796, 129.0756), None);
    }

    #[test]
    fn test_projection_offsets_by_area_origin() {
        let map = laid_out(Rect::new(5, 3, 41, 21));
        let viewport = map.viewport().unwrap();
        let cell = viewport.project(MAP_CENTER.0, MAP_CENTER.1).unwrap();
        assert!(near(cell, (25, 13)), "got {:?}", cell);
    }

    #[test]
    fn test_click_hits_marker() {
        let centers = vec![
            center("far", Some(35.0), Some(129.0)),
            center("hall", Some(MAP_CENTER.0), Some(MAP_CENTER.1)),
        ];
        let map = laid_out(Rect::new(0, 0, 41, 21));
        let (x, y) = map
            .viewport()
            .unwrap()
            .project(MAP_CENTER.0, MAP_CENTER.1)
            .unwrap();

        let mut hit = None;
        assert!(map.click(&centers, x + 1, y, |c| hit = Some(c.center_id.clone())));
        assert_eq!(hit.as_deref(), Some("hall"));

        assert!(!map.click(&centers, 0, 0, |_| panic!("no marker there")));
    }

    #[test]
    fn test_click_before_layout_misses() {
        let centers = vec![center("hall", Some(MAP_CENTER.0), Some(MAP_CENTER.1))];
        let map = CenterMap::new();
        assert!(!map.click(&centers, 20, 10, |_| panic!("not laid out")));
        assert!(map.viewport().is_none());
    }

    #[test]
    fn test_activate_by_marker_index() {
        let centers = vec![
            center("none", None, None),
            center("x", Some(37.5), Some(127.0)),
        ];
        let map = CenterMap::new();
        let mut hit = None;
        assert!(map.activate(&centers, 0, |c| hit = Some(c.center_id.clone())));
        assert_eq!(hit.as_deref(), Some("x"));
        assert!(!map.activate(&centers, 1, |_| panic!("out of range")));
    }

    #[test]
    fn test_on_create_fires_once() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = calls.clone();
        let mut map = CenterMap::new().on_create(move |v| seen.lock().unwrap().push(v.level));

        map.layout(Rect::new(0, 0, 40, 20));
        map.layout(Rect::new(0, 0, 80, 30));

        assert_eq!(*calls.lock().unwrap(), vec![MAP_LEVEL]);
        assert_eq!(map.viewport().unwrap().area.width, 80);
    }

    #[test]
    fn test_render_draws_markers_and_caption() {
        let centers = vec![center("hall", Some(MAP_CENTER.0), Some(MAP_CENTER.1))];
        let mut map = CenterMap::new();
        let area = Rect::new(0, 0, 40, 16);
        let mut buf = Buffer::empty(area);

        render(area, &mut buf, &mut map, &centers, Some(0), true);

        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains(MARKER_GLYPH));
        assert!(text.contains("hall"));
        assert!(map.viewport().is_some());
    }
}
