//! Single-page PDF holding one RGB image

use std::path::Path;

use image::RgbImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use super::OutputError;

const POINTS_PER_INCH: f32 = 72.0;

/// Text drawn over the image in white Helvetica. Position and size are in
/// image pixels, `(x, y)` being the top-left of the text line.
#[derive(Debug, Clone, PartialEq)]
pub struct Caption {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

/// Write `image` as a one-page PDF whose page is the image's size at `dpi`
pub fn write_pdf(
    image: &RgbImage,
    path: &Path,
    dpi: f32,
    caption: Option<&Caption>,
) -> Result<(), OutputError> {
    if !(dpi.is_finite() && dpi > 0.0) {
        return Err(OutputError::InvalidDpi(dpi));
    }
    let scale = POINTS_PER_INCH / dpi;
    let page_w = image.width() as f32 * scale;
    let page_h = image.height() as f32 * scale;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width() as i64,
            "Height" => image.height() as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        image.as_raw().clone(),
    ));
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! { "Im1" => image_id },
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut operations = vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                page_w.into(),
                0.into(),
                0.into(),
                page_h.into(),
                0.into(),
                0.into(),
            ],
        ),
        Operation::new("Do", vec!["Im1".into()]),
        Operation::new("Q", vec![]),
    ];
    if let Some(caption) = caption {
        let size = caption.size * scale;
        // PDF origin is bottom-left; place the baseline one font size below y
        let baseline = page_h - (caption.y + caption.size) * scale;
        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), size.into()]),
            Operation::new("rg", vec![1.into(), 1.into(), 1.into()]),
            Operation::new("Td", vec![(caption.x * scale).into(), baseline.into()]),
            Operation::new("Tj", vec![Object::string_literal(win_ansi(&caption.text))]),
            Operation::new("ET", vec![]),
        ]);
    }
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), page_w.into(), page_h.into()],
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

    doc.compress();
    let mut file = std::fs::File::create(path)?;
    doc.save_to(&mut file)?;
    Ok(())
}

/// Encode `text` for a WinAnsi Type1 font. Characters the encoding lacks
/// become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            _ => b'?',
        })
        .collect()
}
