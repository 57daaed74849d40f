//! Drawing an overlay surface as an inline label.
//!
//! The label box hugs its content, never wraps, and is centered on the anchor. The box is a focus
//! ring around one cell of horizontal padding; a selection renders reversed.

use std::ops::Range;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Clear;
use ratatui::widgets::Widget;
use unicode_width::UnicodeWidthStr;

use crate::render::renderable::Renderable;
use crate::surface::EditableSurface;

/// Below this alpha the label is drawn dimmed, the closest a terminal gets to translucency.
const DIM_ALPHA_THRESHOLD: f32 = 0.5;

pub struct LabelView<'a> {
    surface: &'a EditableSurface,
}

impl<'a> LabelView<'a> {
    pub fn new(surface: &'a EditableSurface) -> Self {
        Self { surface }
    }

    fn lines(&self) -> Vec<(usize, &'a str)> {
        let text = self.surface.text();
        let mut start = 0;
        text.split('\n')
            .map(|line| {
                let entry = (start, line);
                start += line.len() + 1;
                entry
            })
            .collect()
    }

    /// Width and height of the label box, focus ring included.
    fn box_size(&self) -> (u16, u16) {
        let style = self.surface.style();
        let lines = self.lines();
        let content_width = lines
            .iter()
            .map(|(_, line)| UnicodeWidthStr::width(*line))
            .max()
            .unwrap_or(0)
            .max(1);
        let content_width = u16::try_from(content_width).unwrap_or(u16::MAX);
        let content_height = u16::try_from(lines.len())
            .unwrap_or(u16::MAX)
            .max(style.min_height);

        let ring = self.ring_width();
        let width = content_width
            .saturating_add(style.padding.saturating_mul(2))
            .saturating_add(ring * 2);
        (width, content_height.saturating_add(ring * 2))
    }

    fn ring_width(&self) -> u16 {
        u16::from(self.surface.style().focus_ring)
    }

    /// Where text starts inside a label box.
    fn text_origin(&self, label: Rect) -> (u16, u16) {
        let ring = self.ring_width();
        (
            label.x + ring + self.surface.style().padding,
            label.y + ring,
        )
    }

    fn base_style(&self) -> Style {
        let style = self.surface.style();
        let mut base = Style::default();
        if let Ok(color) = style.stroke_color.parse::<Color>() {
            base = base.fg(color);
        }
        if style.alpha < DIM_ALPHA_THRESHOLD {
            base = base.add_modifier(Modifier::DIM);
        }
        base
    }

    fn styled_line(&self, line_start: usize, line: &'a str, base: Style) -> Line<'a> {
        let Some(selection) = self.surface.selection().filter(|s| !s.is_collapsed()) else {
            return Line::from(Span::styled(line, base));
        };
        let line_range = line_start..line_start + line.len();
        let selected = clip(selection.range(), &line_range);
        let local = |pos: usize| pos - line_start;
        let before = &line[..local(selected.start)];
        let inside = &line[local(selected.start)..local(selected.end)];
        let after = &line[local(selected.end)..];
        Line::from(vec![
            Span::styled(before, base),
            Span::styled(inside, base.add_modifier(Modifier::REVERSED)),
            Span::styled(after, base),
        ])
    }
}

/// Intersection of `range` with `within`, collapsed onto `within.start` when they do not overlap.
fn clip(range: Range<usize>, within: &Range<usize>) -> Range<usize> {
    let start = range.start.clamp(within.start, within.end);
    let end = range.end.clamp(start, within.end);
    start..end
}

/// The screen area an overlay surface occupies inside `frame`.
pub fn label_area(surface: &EditableSurface, frame: Rect) -> Rect {
    let (width, height) = LabelView::new(surface).box_size();
    let anchor = surface.style().anchor;
    let x = anchor
        .x
        .saturating_sub(width / 2)
        .min(frame.right().saturating_sub(width))
        .max(frame.x);
    let y = anchor
        .y
        .saturating_sub(height / 2)
        .min(frame.bottom().saturating_sub(height))
        .max(frame.y);
    Rect::new(x, y, width, height).intersection(frame)
}

impl Renderable for LabelView<'_> {
    fn render(&self, area: Rect, buf: &mut Buffer) {
        let label = label_area(self.surface, area);
        if label.is_empty() {
            return;
        }
        let base = self.base_style();
        Clear.render(label, buf);
        if self.surface.style().focus_ring {
            Block::bordered().border_style(base).render(label, buf);
        }

        let (x, y) = self.text_origin(label);
        let inner_right = label.right().saturating_sub(self.ring_width());
        let inner_bottom = label.bottom().saturating_sub(self.ring_width());
        let width = inner_right.saturating_sub(x);
        for (row, (line_start, line)) in (y..inner_bottom).zip(self.lines()) {
            let line = self.styled_line(line_start, line, base);
            buf.set_line(x, row, &line, width);
        }
    }

    fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        let head = self.surface.selection()?.head;
        let label = label_area(self.surface, area);
        let (x, y) = self.text_origin(label);
        let text = self.surface.text();
        let before = &text[..head];
        let row = before.matches('\n').count();
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = UnicodeWidthStr::width(&before[line_start..]);
        let cursor = (
            x.saturating_add(u16::try_from(column).ok()?),
            y.saturating_add(u16::try_from(row).ok()?),
        );
        (cursor.0 < label.right() && cursor.1 < label.bottom()).then_some(cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostWindow;
    use crate::host::OverlayHost;
    use crate::surface::Selection;
    use crate::surface::SurfaceStyle;
    use pretty_assertions::assert_eq;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use textlabel_protocol::AnchorPoint;
    use textlabel_protocol::SessionConfig;

    fn surface(text: &str, anchor: AnchorPoint, opacity: u8) -> EditableSurface {
        let style = SurfaceStyle::from_config(&SessionConfig {
            init_text: String::new(),
            anchor,
            stroke_color: "red".to_string(),
            font: "mono".to_string(),
            opacity,
        });
        let mut surface = EditableSurface::new(OverlayHost::new().allocate_surface_id(), style);
        surface.set_text(text);
        surface
    }

    fn rows(buf: &Buffer) -> Vec<String> {
        let area = buf.area;
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(area.x + x, area.y + y)].symbol())
                    .collect::<String>()
            })
            .collect()
    }

    fn draw(surface: &EditableSurface, width: u16, height: u16) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("terminal");
        terminal
            .draw(|frame| {
                LabelView::new(surface).render(frame.area(), frame.buffer_mut());
            })
            .expect("draw");
        terminal.backend().buffer().clone()
    }

    #[test]
    fn label_is_centered_on_anchor() {
        let surface = surface("hi", AnchorPoint::new(10, 3), 100);

        let buf = draw(&surface, 20, 7);

        assert_eq!(
            rows(&buf),
            vec![
                "                    ",
                "                    ",
                "       ┌────┐       ",
                "       │ hi │       ",
                "       └────┘       ",
                "                    ",
                "                    ",
            ]
        );
        assert_eq!(buf[(9, 3)].fg, Color::Red);
    }

    #[test]
    fn label_grows_with_content_and_keeps_lines_unwrapped() {
        let surface = surface("one\nthree", AnchorPoint::new(10, 3), 100);

        assert_eq!(
            label_area(&surface, Rect::new(0, 0, 20, 7)),
            Rect::new(6, 1, 9, 4)
        );
        let buf = draw(&surface, 20, 7);
        assert_eq!(rows(&buf)[2], "      │ one   │     ");
        assert_eq!(rows(&buf)[3], "      │ three │     ");
    }

    #[test]
    fn label_near_the_edge_is_kept_on_screen() {
        let surface = surface("edge", AnchorPoint::new(0, 0), 100);
        assert_eq!(
            label_area(&surface, Rect::new(0, 0, 20, 7)),
            Rect::new(0, 0, 8, 3)
        );
    }

    #[test]
    fn selection_renders_reversed_and_caret_follows_head() {
        let mut surface = surface("hello", AnchorPoint::new(10, 3), 100);
        surface
            .set_selection(Selection { anchor: 1, head: 3 })
            .expect("select");

        let buf = draw(&surface, 20, 7);

        let reversed: Vec<bool> = (9..14)
            .map(|x| buf[(x, 3)].modifier.contains(Modifier::REVERSED))
            .collect();
        assert_eq!(reversed, vec![true, true, false, false, false]);
        assert_eq!(
            LabelView::new(&surface).cursor_pos(Rect::new(0, 0, 20, 7)),
            Some((11, 3))
        );
    }

    #[test]
    fn low_opacity_dims_and_unknown_colors_fall_back() {
        let mut surface = surface("x", AnchorPoint::new(5, 2), 30);
        assert!(
            LabelView::new(&surface)
                .base_style()
                .add_modifier
                .contains(Modifier::DIM)
        );

        surface = EditableSurface::new(
            surface.id(),
            SurfaceStyle {
                stroke_color: "not a color".to_string(),
                ..surface.style().clone()
            },
        );
        assert_eq!(LabelView::new(&surface).base_style().fg, None);
    }
}
