//! End-to-end runs against a scratch directory

use std::path::Path;
use std::sync::Arc;

use image::{ColorType, Rgba, RgbaImage};
use lopdf::{Document as PdfDocument, Object};
use pretty_assertions::assert_eq;

use layerfill::substitute;
use layerfill::template::{find_child, find_group};
use layerfill::{
    run, ComposeConfig, FillConfig, FillError, InputPaths, Inputs, RunOutcome, SlotError, Template,
};

const TEMPLATE: &str = r#"
canvas [width: 120, height: 80, background: #ffffff]

group "模板" {
    fill "背景" [width: 120, height: 80, color: #eeeeee]
    group "改文本" {
        text "文字1" [x: 4, y: 4, font_size: 12] "title placeholder"
        text "文字2" [x: 4, y: 20, font_size: 10] "body placeholder"
    }
    group "改图" {
        placed "圆1" [x: 10, y: 40, width: 30, height: 30]
        placed "圆2" [x: 60, y: 40, width: 30, height: 30, mask: ellipse]
        fill "frame" [x: 0, y: 0, width: 2, height: 2, color: #000000]
    }
    placed "logo" [x: 100, y: 0, width: 20, height: 20]
}
"#;

const PHOTO: Rgba<u8> = Rgba([0, 0, 255, 255]);

fn write_fixture(dir: &Path, template: &str) -> FillConfig {
    std::fs::create_dir_all(dir.join("template")).unwrap();
    std::fs::create_dir_all(dir.join("text")).unwrap();
    std::fs::write(dir.join("template/test.layers"), template).unwrap();
    std::fs::write(dir.join("text/1.txt"), "Hello\n").unwrap();
    std::fs::write(dir.join("text/2.txt"), "  World  ").unwrap();
    // PNG bytes under the default .jpg name; decoding goes by content
    RgbaImage::from_pixel(8, 8, PHOTO)
        .save_with_format(dir.join("sample_image.jpg"), image::ImageFormat::Png)
        .unwrap();
    FillConfig::default().with_paths(InputPaths::default().rooted_at(dir))
}

fn pdf_image_info(path: &Path) -> (i64, i64, Vec<u8>, i64) {
    let doc = PdfDocument::load(path).unwrap();
    assert_eq!(doc.get_pages().len(), 1);
    doc.objects
        .values()
        .find_map(|obj| {
            let Object::Stream(stream) = obj else {
                return None;
            };
            let dict = &stream.dict;
            if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
                return None;
            }
            Some((
                dict.get(b"Width").ok()?.as_i64().ok()?,
                dict.get(b"Height").ok()?.as_i64().ok()?,
                dict.get(b"ColorSpace").ok()?.as_name().ok()?.to_vec(),
                dict.get(b"BitsPerComponent").ok()?.as_i64().ok()?,
            ))
        })
        .expect("PDF should embed an image")
}

#[test]
fn test_full_run_writes_png_and_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_fixture(dir.path(), TEMPLATE);

    let outcome = run(&config).unwrap();
    let report = match outcome {
        RunOutcome::Composed(report) => report,
        other => panic!("expected a composed run, got {:?}", other),
    };
    assert!(report.substitution.is_complete());
    assert_eq!(report.substitution.images, Ok(2));

    let png = image::open(&config.paths.output_png).unwrap();
    assert_eq!(png.color(), ColorType::Rgba8);
    assert_eq!((png.width(), png.height()), (120, 80));

    // Both placed slots now show the photo
    let png = png.to_rgba8();
    assert_eq!(*png.get_pixel(25, 55), PHOTO);
    assert_eq!(*png.get_pixel(75, 55), PHOTO);
    // Ellipse mask keeps the corner of the second slot empty
    assert_eq!(*png.get_pixel(60, 40), Rgba([238, 238, 238, 255]));
    // The placed layer outside the image group keeps its white payload
    assert_eq!(*png.get_pixel(110, 10), Rgba([255, 255, 255, 255]));

    let (w, h, color_space, bpc) = pdf_image_info(&config.paths.output_pdf);
    assert_eq!((w, h), (120, 80));
    assert_eq!(color_space, b"DeviceRGB".to_vec());
    assert_eq!(bpc, 8);
}

#[test]
fn test_placeholder_template_writes_only_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_fixture(dir.path(), "// This is a placeholder\n");

    let outcome = run(&config).unwrap();
    assert!(matches!(outcome, RunOutcome::Placeholder { .. }));
    assert!(config.paths.output_pdf.exists());
    assert!(!config.paths.output_png.exists());

    let (w, h, color_space, _) = pdf_image_info(&config.paths.output_pdf);
    assert_eq!((w, h), (600, 400));
    assert_eq!(color_space, b"DeviceRGB".to_vec());
}

#[test]
fn test_placeholder_check_runs_before_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_fixture(dir.path(), "This is a placeholder");
    std::fs::remove_file(&config.paths.first_text).unwrap();
    std::fs::remove_file(&config.paths.image).unwrap();

    assert!(matches!(run(&config), Ok(RunOutcome::Placeholder { .. })));
}

#[test]
fn test_custom_sentinel() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_fixture(dir.path(), TEMPLATE).with_sentinel("placeholder");
    // The stock template mentions "placeholder" in its text layers
    assert!(matches!(run(&config), Ok(RunOutcome::Placeholder { .. })));
}

#[test]
fn test_missing_text_input_writes_nothing() {
    for missing in ["text/1.txt", "text/2.txt"] {
        let dir = tempfile::tempdir().unwrap();
        let config = write_fixture(dir.path(), TEMPLATE);
        std::fs::remove_file(dir.path().join(missing)).unwrap();

        let err = run(&config).unwrap_err();
        assert!(matches!(err, FillError::MissingText { .. }), "{}", err);
        assert!(!config.paths.output_png.exists());
        assert!(!config.paths.output_pdf.exists());
    }
}

#[test]
fn test_missing_image_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_fixture(dir.path(), TEMPLATE);
    std::fs::remove_file(&config.paths.image).unwrap();

    let err = run(&config).unwrap_err();
    assert!(matches!(err, FillError::Image { .. }));
    assert!(!config.paths.output_png.exists());
    assert!(!config.paths.output_pdf.exists());
}

#[test]
fn test_template_syntax_error_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_fixture(dir.path(), "canvas [width: 10, height: 10]\ngroup \"g\" {");

    let err = run(&config).unwrap_err();
    assert!(matches!(err, FillError::Template { .. }));
    assert!(err.report().contains("test.layers"));
    assert!(!config.paths.output_png.exists());
    assert!(!config.paths.output_pdf.exists());
}

#[test]
fn test_missing_groups_still_write_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_fixture(
        dir.path(),
        r#"
        canvas [width: 20, height: 20]
        group "other" {
            text "文字1" "untouched"
        }
        "#,
    );

    let report = match run(&config).unwrap() {
        RunOutcome::Composed(report) => report,
        other => panic!("expected a composed run, got {:?}", other),
    };
    assert!(config.paths.output_png.exists());
    assert!(config.paths.output_pdf.exists());
    assert_eq!(report.substitution.warnings().len(), 3);
    assert_eq!(
        report.substitution.images,
        Err(SlotError::GroupMissing {
            name: "模板".to_string(),
            parent: None,
        })
    );
}

#[test]
fn test_substitution_fills_named_slots() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_fixture(dir.path(), TEMPLATE);
    let inputs = Inputs::load(&config.paths).unwrap();
    let mut template = Template::from_file(&config.paths.template).unwrap();
    let before = template.clone();

    let report = substitute::apply(&mut template, &config.slots, &inputs);
    assert!(report.is_complete());

    let text_group = find_group(&template.layers, "改文本").unwrap();
    let first = find_child(text_group, "文字1").unwrap().as_text().unwrap();
    let second = find_child(text_group, "文字2").unwrap().as_text().unwrap();
    assert_eq!(first.content, "Hello");
    assert_eq!(second.content, "World");
    // Typography is kept
    assert_eq!(first.font_size, 12.0);

    let image_group = find_group(&template.layers, "改图").unwrap();
    let placed: Vec<_> = image_group
        .children()
        .unwrap()
        .iter()
        .filter_map(|l| l.as_placed())
        .collect();
    assert_eq!(placed.len(), 2);
    for p in &placed {
        assert!(Arc::ptr_eq(p.content(), &inputs.image));
    }

    // Layers outside the image group are untouched
    let outer = find_group(&template.layers, "模板").unwrap();
    let outer_before = find_group(&before.layers, "模板").unwrap();
    assert_eq!(find_child(outer, "logo"), find_child(outer_before, "logo"));
    assert_eq!(find_child(outer, "背景"), find_child(outer_before, "背景"));
}

#[test]
fn test_debug_config_still_runs() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_fixture(dir.path(), TEMPLATE).with_debug(true);
    assert!(matches!(run(&config), Ok(RunOutcome::Composed(_))));
}

#[test]
fn test_config_file_overrides_slots() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(
        dir.path(),
        r#"
        canvas [width: 20, height: 20]
        group "root" {
            group "photos" {
                placed "p" [width: 20, height: 20]
            }
        }
        "#,
    );
    let config_path = dir.path().join("layerfill.toml");
    std::fs::write(
        &config_path,
        r#"
        [slots]
        outer_group = "root"
        image_group = "photos"
        "#,
    )
    .unwrap();
    let config = FillConfig::from_file(&config_path)
        .unwrap()
        .with_paths(InputPaths::default().rooted_at(dir.path()));

    let report = match run(&config).unwrap() {
        RunOutcome::Composed(report) => report,
        other => panic!("expected a composed run, got {:?}", other),
    };
    assert_eq!(report.substitution.images, Ok(1));
    let png = image::open(&config.paths.output_png).unwrap().to_rgba8();
    assert_eq!(*png.get_pixel(10, 10), PHOTO);
}

fn dark_pixels_in(png: &RgbaImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) -> usize {
    ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
        .filter(|&(x, y)| png.get_pixel(x, y)[0] < 100)
        .count()
}

#[test]
fn test_text_slots_drawn_with_default_font() {
    let dir = tempfile::tempdir().unwrap();
    let font = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf");
    let config = write_fixture(dir.path(), TEMPLATE)
        .with_compose(ComposeConfig::new().with_default_font(font));
    run(&config).unwrap();

    let png = image::open(&config.paths.output_png).unwrap().to_rgba8();
    assert!(dark_pixels_in(&png, 4..100, 4..19) > 10, "first text missing");
    assert!(dark_pixels_in(&png, 4..100, 20..33) > 10, "second text missing");
}

#[test]
fn test_text_slots_skipped_without_font() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_fixture(dir.path(), TEMPLATE);
    run(&config).unwrap();

    let png = image::open(&config.paths.output_png).unwrap().to_rgba8();
    assert_eq!(dark_pixels_in(&png, 4..100, 4..33), 0);
}
