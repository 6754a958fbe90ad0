//! Single-page PDF canvas.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use qrcode::Color;
use qrcode::render::{Canvas, Pixel};

/// Gray level in `0.0..=1.0`, as taken by the `g` operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gray(pub f32);

impl Pixel for Gray {
    type Image = PdfPage;
    type Canvas = PdfCanvas;

    fn default_unit_size() -> (u32, u32) {
        (1, 1)
    }

    fn default_color(color: Color) -> Self {
        Gray(color.select(0.0, 1.0))
    }
}

fn rect(left: u32, bottom: u32, width: u32, height: u32) -> Operation {
    Operation::new(
        "re",
        vec![
            i64::from(left).into(),
            i64::from(bottom).into(),
            i64::from(width).into(),
            i64::from(height).into(),
        ],
    )
}

#[doc(hidden)]
pub struct PdfCanvas {
    page: PdfPage,
}

impl Canvas for PdfCanvas {
    type Pixel = Gray;
    type Image = PdfPage;

    fn new(width: u32, height: u32, dark_pixel: Gray, light_pixel: Gray) -> Self {
        let operations = vec![
            Operation::new("g", vec![light_pixel.0.into()]),
            rect(0, 0, width, height),
            Operation::new("f", vec![]),
            Operation::new("g", vec![dark_pixel.0.into()]),
        ];
        Self {
            page: PdfPage {
                width,
                height,
                operations,
            },
        }
    }

    fn draw_dark_pixel(&mut self, x: u32, y: u32) {
        self.draw_dark_rect(x, y, 1, 1);
    }

    fn draw_dark_rect(&mut self, left: u32, top: u32, width: u32, height: u32) {
        let bottom = self.page.height - top - height;
        self.page.operations.push(rect(left, bottom, width, height));
    }

    fn into_image(mut self) -> PdfPage {
        self.page.operations.push(Operation::new("f", vec![]));
        self.page
    }
}

/// Drawing operations of one page, in PDF user space (origin bottom left).
pub struct PdfPage {
    width: u32,
    height: u32,
    operations: Vec<Operation>,
}

impl PdfPage {
    /// Serializes the page as a complete one-page document.
    pub fn into_document(self) -> lopdf::Result<Vec<u8>> {
        let content = Content {
            operations: self.operations,
        }
        .encode()?;

        let mut doc = Document::with_version("1.4");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                i64::from(self.width).into(),
                i64::from(self.height).into(),
            ],
            "Resources" => dictionary! {},
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(bytes)
    }
}
