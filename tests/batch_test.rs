use image::{Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use scan_deskew::batch;
use scan_deskew::codec;
use scan_deskew::correction::rotate;
use scan_deskew::document::RasterFormat;
use scan_deskew::pdf::{writer, PageRasterizer, RasterPages};
use scan_deskew::{Config, DeskewError, ItemProcessor};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// White page with dark horizontal bands standing in for text lines
fn ruled_page() -> RgbImage {
    let mut img = RgbImage::from_pixel(600, 600, Rgb([255, 255, 255]));
    for band in 0..4 {
        let top = 120 + band * 100;
        for y in top..top + 12 {
            for x in 100..500 {
                img.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
    }
    img
}

fn write_png(path: &Path, angle: f64) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    rotate(&ruled_page(), angle).save(path).unwrap();
}

fn write_pdf(path: &Path, angles: &[f64]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let pages: Vec<Vec<u8>> = angles
        .iter()
        .map(|angle| codec::encode_png(&rotate(&ruled_page(), *angle)).unwrap())
        .collect();
    fs::write(path, writer::assemble(&pages, 300).unwrap()).unwrap();
}

/// Page edge in points; 600 px at 300 DPI
const PAGE_PT: i64 = 144;

/// One-page PDF built directly with lopdf, not through the crate's writer
fn single_page_pdf(path: &Path, operations: Vec<Operation>, image: Option<Stream>) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let mut resources = Dictionary::new();
    if let Some(image) = image {
        let image_id = doc.add_object(image);
        resources.set("XObject", dictionary! { "Im1" => image_id });
    }
    let content = Content { operations }.encode().unwrap();
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(PAGE_PT),
            Object::Integer(PAGE_PT),
        ],
        "Resources" => resources,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

/// Vector page: filled bars turned by `angle` degrees about the page center
fn write_vector_pdf(path: &Path, angle: f64) {
    let (sin, cos) = angle.to_radians().sin_cos();
    let center = (PAGE_PT / 2) as f64;
    let mut ops = vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![real(cos), real(sin), real(-sin), real(cos), real(center), real(center)],
        ),
        Operation::new("g", vec![Object::Integer(0)]),
    ];
    for bar in 0..4 {
        let y = -36.0 + bar as f64 * 24.0;
        ops.push(Operation::new("re", vec![real(-48.0), real(y), real(96.0), real(3.0)]));
        ops.push(Operation::new("f", vec![]));
    }
    ops.push(Operation::new("Q", vec![]));
    single_page_pdf(path, ops, None);
}

/// Scan page: a JPEG (DCTDecode) image painted over the whole page
fn write_jpeg_scan_pdf(path: &Path, angle: f64) {
    let page = rotate(&ruled_page(), angle);
    let jpeg = codec::encode(&page, RasterFormat::Jpeg, 90).unwrap();
    let image = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(page.width()),
            "Height" => i64::from(page.height()),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg,
    );
    let ops = vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                Object::Integer(PAGE_PT),
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_PT),
                Object::Integer(0),
                Object::Integer(0),
            ],
        ),
        Operation::new("Do", vec![Object::Name(b"Im1".to_vec())]),
        Operation::new("Q", vec![]),
    ];
    single_page_pdf(path, ops, Some(image));
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_png_and_pdf_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    write_png(&input.join("page.png"), 5.0);
    write_pdf(&input.join("book.pdf"), &[3.0, -4.0]);

    let summary = batch::run(&Config::new(&input, &output)).await.unwrap();

    assert_eq!(summary.discovered, 2);
    assert_eq!(summary.succeeded, 2);
    assert!(summary.failures.is_empty());
    assert_eq!(file_names(&output), vec!["corrected_book.pdf", "corrected_page.png"]);

    let doc = lopdf::Document::load(output.join("corrected_book.pdf")).unwrap();
    assert_eq!(doc.get_pages().len(), 2);

    let png = image::open(output.join("corrected_page.png")).unwrap();
    assert_eq!((png.width(), png.height()), (600, 600));
}

#[tokio::test]
async fn test_pdfs_from_other_producers() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    write_vector_pdf(&input.join("vector.pdf"), 4.0);
    write_jpeg_scan_pdf(&input.join("scan.pdf"), -3.0);

    let summary = batch::run(&Config::new(&input, &output)).await.unwrap();

    assert!(summary.failures.is_empty(), "failures: {:?}", summary.failures);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(file_names(&output), vec!["corrected_scan.pdf", "corrected_vector.pdf"]);
    for artifact in &summary.outputs {
        assert_eq!(artifact.pages, 1);
        let doc = lopdf::Document::load(&artifact.output).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }
}

#[test]
fn test_vector_page_is_rendered_and_measured() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bars.pdf");
    let output = dir.path().join("out");
    fs::create_dir_all(&output).unwrap();
    write_vector_pdf(&input, 5.0);

    let artifact = ItemProcessor::new(&Config::new(&input, &output))
        .process(&input)
        .unwrap();

    assert_eq!(artifact.pages, 1);
    assert!(
        (artifact.angles[0].abs() - 5.0).abs() <= 2.0,
        "angle {}",
        artifact.angles[0]
    );
}

#[tokio::test]
async fn test_corrected_output_is_level() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tilted.png");
    let output = dir.path().join("out");
    write_png(&input, 6.0);

    batch::run(&Config::new(&input, &output)).await.unwrap();

    let corrected = image::open(output.join("corrected_tilted.png")).unwrap().into_rgb8();
    assert!(scan_deskew::estimate_angle(&corrected).abs() <= 2.0);
}

#[tokio::test]
async fn test_corrupt_item_does_not_stop_batch() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    write_png(&input.join("good.png"), 2.0);
    write_pdf(&input.join("good.pdf"), &[1.0]);
    fs::write(input.join("broken.png"), b"this is not an image").unwrap();
    fs::write(input.join("broken.pdf"), b"%PDF-1.4 garbage").unwrap();

    let summary = batch::run(&Config::new(&input, &output)).await.unwrap();

    assert_eq!(summary.discovered, 4);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed(), 2);
    let mut failed: Vec<&str> = summary.failures.iter().map(|f| f.name.as_str()).collect();
    failed.sort();
    assert_eq!(failed, vec!["broken.pdf", "broken.png"]);
    assert_eq!(file_names(&output), vec!["corrected_good.pdf", "corrected_good.png"]);
}

#[tokio::test]
async fn test_nested_directories_and_mixed_case() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    write_png(&input.join("a/b/c/Deep.PNG"), 1.0);
    write_png(&input.join("x/scan.png"), -1.0);
    fs::write(input.join("x/readme.txt"), b"skip me").unwrap();

    let summary = batch::run(&Config::new(&input, &output)).await.unwrap();

    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(file_names(&output), vec!["corrected_Deep.PNG", "corrected_scan.png"]);
}

#[tokio::test]
async fn test_output_inside_input_is_not_reprocessed() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().to_path_buf();
    let output = input.join("corrected");
    write_png(&input.join("page.png"), 3.0);
    let config = Config::new(&input, &output);

    batch::run(&config).await.unwrap();
    let second = batch::run(&config).await.unwrap();

    assert_eq!(second.discovered, 1);
    assert_eq!(file_names(&output), vec!["corrected_page.png"]);
}

#[tokio::test]
async fn test_missing_input_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::new(dir.path().join("nope"), dir.path().join("out"));

    let err = batch::run(&config).await.unwrap_err();

    assert!(matches!(err, DeskewError::InputNotFound(_)));
}

#[tokio::test]
async fn test_parallel_jobs_process_everything() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    for i in 0..6 {
        write_png(&input.join(format!("page{}.png", i)), i as f64 - 3.0);
    }
    let mut config = Config::new(&input, &output);
    config.jobs = 3;

    let summary = batch::run(&config).await.unwrap();

    assert_eq!(summary.succeeded, 6);
    assert_eq!(file_names(&output).len(), 6);
}

/// Rasterizer that takes far longer than the item timeout
struct StalledRasterizer;

struct StalledPages;

impl PageRasterizer for StalledRasterizer {
    fn name(&self) -> &'static str {
        "stalled"
    }

    fn open(&self, _path: &Path) -> Result<Box<dyn RasterPages>, DeskewError> {
        std::thread::sleep(Duration::from_millis(1500));
        Ok(Box::new(StalledPages))
    }
}

impl RasterPages for StalledPages {
    fn page_count(&self) -> usize {
        1
    }

    fn render(&mut self, _index: usize, _dpi: u32) -> Result<RgbImage, DeskewError> {
        Ok(ruled_page())
    }
}

#[tokio::test]
async fn test_timed_out_item_leaves_no_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    write_pdf(&input.join("slow.pdf"), &[0.0]);
    write_png(&input.join("fast.png"), 2.0);

    let mut config = Config::new(&input, &output);
    config.item_timeout = Some(Duration::from_millis(300));
    let processor = Arc::new(ItemProcessor::with_rasterizer(
        &config,
        Arc::new(StalledRasterizer),
    ));

    let summary = batch::run_with(&config, processor).await.unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].name, "slow.pdf");
    assert!(summary.failures[0].message.contains("Timed out"));

    // Give the abandoned worker time to reach its abort check
    tokio::time::sleep(Duration::from_millis(2000)).await;
    assert_eq!(file_names(&output), vec!["corrected_fast.png"]);
}

#[tokio::test]
async fn test_report_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in");
    write_png(&input.join("page.png"), 1.0);
    fs::write(input.join("bad.jpg"), b"nope").unwrap();

    let summary = batch::run(&Config::new(&input, dir.path().join("out")))
        .await
        .unwrap();
    let report = dir.path().join("report.json");
    batch::write_report(&summary, &report).unwrap();

    let value: serde_json::Value = serde_json::from_slice(&fs::read(&report).unwrap()).unwrap();
    assert_eq!(value["succeeded"], 1);
    assert_eq!(value["outputs"][0]["kind"]["raster"], "png");
    assert_eq!(value["failures"][0]["name"], "bad.jpg");
}
