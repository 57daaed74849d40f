use ratatui::buffer::Buffer;
use ratatui::layout::Rect;

/// Something that draws itself into a frame area and may own the terminal cursor.
pub trait Renderable {
    fn render(&self, area: Rect, buf: &mut Buffer);
    fn cursor_pos(&self, _area: Rect) -> Option<(u16, u16)> {
        None
    }
}

impl Renderable for () {
    fn render(&self, _area: Rect, _buf: &mut Buffer) {}
}
