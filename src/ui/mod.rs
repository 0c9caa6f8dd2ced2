pub mod columns;
pub mod help;
pub mod plain;
pub mod view;
pub mod widget;

use std::io;

pub use plain::PlainRenderer;
pub use view::DashboardView;
pub use widget::WidgetRenderer;

/// A drawing backend for the dashboard.
pub trait Renderer {
    /// Draw the full screen.
    fn render(&mut self, view: &DashboardView<'_>) -> io::Result<()>;

    /// Redraw after a countdown tick. Backends that can update the status
    /// line alone override this.
    fn render_status(&mut self, view: &DashboardView<'_>) -> io::Result<()> {
        self.render(view)
    }
}
