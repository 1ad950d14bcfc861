// window.rs — Display the composite in a minifb window.
//
// The window is opened once, after every cell has been rendered, and the
// loop only re-presents the same framebuffer until the user closes the
// window or presses Escape. Nothing is recomputed.

use minifb::{Key, Window, WindowOptions};
use tracing::info;

use crate::layout::Composite;

/// Title used by the binary.
pub const WINDOW_TITLE: &str = "Mandelbrot & Julia Sets";

/// Open a window sized to `composite` and block until it is closed.
pub fn show(title: &str, composite: &Composite) -> Result<(), minifb::Error> {
    let (w, h) = (composite.width(), composite.height());
    let mut window = Window::new(
        title,
        w,
        h,
        WindowOptions {
            resize: false,
            ..Default::default()
        },
    )?;
    window.set_target_fps(60);

    info!(width = w, height = h, "window open, press Escape or close to exit");

    while window.is_open() && !window.is_key_down(Key::Escape) {
        window.update_with_buffer(composite.pixels(), w, h)?;
    }
    Ok(())
}
