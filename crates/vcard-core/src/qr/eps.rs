//! Encapsulated PostScript canvas.

use std::fmt::Write;

use qrcode::Color;
use qrcode::render::{Canvas, Pixel};

/// Gray level in `0.0..=1.0`, as taken by `setgray`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gray(pub f32);

impl Pixel for Gray {
    type Image = String;
    type Canvas = EpsCanvas;

    fn default_unit_size() -> (u32, u32) {
        (1, 1)
    }

    fn default_color(color: Color) -> Self {
        Gray(color.select(0.0, 1.0))
    }
}

#[doc(hidden)]
pub struct EpsCanvas {
    height: u32,
    body: String,
}

impl Canvas for EpsCanvas {
    type Pixel = Gray;
    type Image = String;

    fn new(width: u32, height: u32, dark_pixel: Gray, light_pixel: Gray) -> Self {
        let body = format!(
            concat!(
                "%!PS-Adobe-3.0 EPSF-3.0\n",
                "%%Creator: vcard-core\n",
                "%%BoundingBox: 0 0 {w} {h}\n",
                "%%EndComments\n",
                "{light} setgray\n",
                "0 0 {w} {h} rectfill\n",
                "{dark} setgray\n",
            ),
            w = width,
            h = height,
            light = light_pixel.0,
            dark = dark_pixel.0,
        );
        Self { height, body }
    }

    fn draw_dark_pixel(&mut self, x: u32, y: u32) {
        self.draw_dark_rect(x, y, 1, 1);
    }

    // PostScript puts the origin bottom-left.
    fn draw_dark_rect(&mut self, left: u32, top: u32, width: u32, height: u32) {
        let bottom = self.height - top - height;
        let _ = writeln!(self.body, "{left} {bottom} {width} {height} rectfill");
    }

    fn into_image(mut self) -> String {
        self.body.push_str("showpage\n%%EOF\n");
        self.body
    }
}
