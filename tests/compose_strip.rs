use std::{io::Cursor, path::Path, sync::Arc};

use boothkit::{
    Booth, BoothConfig, ComposeRequest, ErrorKind, Graphic, LayoutCatalog, Overlays,
    layout::LogoPosition, strip,
};

const SLOT_COLORS: [[u8; 3]; 6] = [
    [220, 30, 30],
    [30, 200, 40],
    [30, 40, 210],
    [230, 200, 30],
    [160, 40, 180],
    [30, 190, 200],
];

fn jpeg(img: &image::RgbImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
        .unwrap();
    buf
}

fn png_rgba(img: &image::RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img.clone())
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn photos_800x600() -> Vec<image::RgbImage> {
    SLOT_COLORS
        .iter()
        .map(|&c| image::RgbImage::from_pixel(800, 600, image::Rgb(c)))
        .collect()
}

fn booth_in(dir: &Path) -> Booth {
    let cfg = BoothConfig {
        output_dir: dir.join("outputs"),
        asset_root: dir.join("assets"),
        public_base_url: "http://booth.local/static/outputs".to_owned(),
        ..BoothConfig::default()
    };
    Booth::from_config(cfg).unwrap()
}

fn request(template: &str, photos: &[image::RgbImage]) -> ComposeRequest {
    ComposeRequest {
        images: photos.iter().map(jpeg).collect(),
        template_id: template.to_owned(),
        ..ComposeRequest::default()
    }
}

fn close(a: [u8; 3], b: [u8; 3], tol: i16) -> bool {
    a.iter()
        .zip(b.iter())
        .all(|(&x, &y)| (i16::from(x) - i16::from(y)).abs() <= tol)
}

fn decode_qr(img: &image::GrayImage) -> String {
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        img.width() as usize,
        img.height() as usize,
        |x, y| img.get_pixel(x as u32, y as u32).0[0],
    );
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1);
    grids[0].decode().unwrap().1
}

#[test]
fn classic_2x3_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let booth = booth_in(dir.path());

    let result = booth
        .process(&request("classic-2x3", &photos_800x600()))
        .unwrap();
    assert_eq!(result.template_id, "classic-2x3");
    assert_eq!(result.template_name, "Classic 2x3");
    assert_eq!((result.width, result.height), (1200, 1800));

    let file_name = result.output_image_path.file_name().unwrap().to_str().unwrap();
    assert!(file_name.starts_with("photostrip-"));
    assert_eq!(
        result.output_image_address,
        format!("http://booth.local/static/outputs/{file_name}")
    );
    assert_eq!(result.output_public_path, format!("/static/outputs/{file_name}"));

    let out = image::open(&result.output_image_path).unwrap().to_rgb8();
    assert_eq!(out.dimensions(), (1200, 1800));

    let template = booth.catalog().resolve_strict("classic-2x3").unwrap();
    for (slot, &color) in template.slots.iter().zip(SLOT_COLORS.iter()) {
        let center = out.get_pixel(slot.left + slot.width / 2, slot.top + slot.height / 2).0;
        assert!(close(center, color, 12), "slot at ({}, {}): {center:?}", slot.left, slot.top);
    }
    // Gutters stay white.
    assert!(close(out.get_pixel(10, 10).0, [255, 255, 255], 6));
    assert!(close(out.get_pixel(600, 900).0, [255, 255, 255], 6));
    assert!(close(out.get_pixel(600, 1700).0, [255, 255, 255], 6));

    let code = result.code_image.as_ref().unwrap();
    assert_eq!((code.width, code.height), (300, 300));
    assert_eq!(decode_qr(&code.to_luma().unwrap()), result.output_image_address);

    // Callers get the code inline alongside the strip address.
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["outputImageAddress"], result.output_image_address.as_str());
    let data_url = json["codeImage"]["dataUrl"].as_str().unwrap();
    let b64 = data_url.strip_prefix("data:image/png;base64,").unwrap();
    let png = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, b64).unwrap();
    let inline = image::load_from_memory(&png).unwrap().to_luma8();
    assert_eq!(decode_qr(&inline), result.output_image_address);
}

#[test]
fn placement_covers_exactly_the_slots() {
    let catalog = LayoutCatalog::builtin().unwrap();
    let template = catalog.resolve_strict("classic-2x3").unwrap();
    let canvas = strip::render_strip(&photos_800x600(), template, Overlays::default()).unwrap();

    for (x, y, px) in canvas.enumerate_pixels() {
        let owner = template.slots.iter().position(|s| s.rect().contains(x, y));
        let expected = owner.map_or([255, 255, 255], |i| SLOT_COLORS[i]);
        assert_eq!(px.0, expected, "pixel ({x}, {y})");
    }
}

#[test]
fn composition_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let booth = booth_in(dir.path());
    let photos: Vec<_> = (0..6u8)
        .map(|i| {
            image::RgbImage::from_fn(640, 480, |x, y| {
                image::Rgb([(x as u8).wrapping_mul(i + 1), (y as u8) ^ i, i * 40])
            })
        })
        .collect();
    let req = request("classic-2x3", &photos);

    let a = booth.process(&req).unwrap();
    let b = booth.process(&req).unwrap();
    assert_eq!(a.content_hash, b.content_hash);
    assert_ne!(a.output_image_path, b.output_image_path);
    assert_eq!(
        std::fs::read(&a.output_image_path).unwrap(),
        std::fs::read(&b.output_image_path).unwrap()
    );
}

#[test]
fn extra_images_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let booth = booth_in(dir.path());
    let mut photos = photos_800x600();
    let six = booth.process(&request("classic-2x3", &photos)).unwrap();

    photos.push(image::RgbImage::from_pixel(10, 10, image::Rgb([0, 0, 0])));
    let seven = booth.process(&request("classic-2x3", &photos)).unwrap();
    assert_eq!(six.content_hash, seven.content_hash);

    // A trailing payload that would not even decode is never looked at.
    let mut req = request("classic-2x3", &photos_800x600());
    req.images.push(b"garbage".to_vec());
    assert!(booth.process(&req).is_ok());
}

#[test]
fn too_few_or_broken_photos_leave_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let booth = booth_in(dir.path());

    let err = booth
        .process(&request("classic-2x3", &photos_800x600()[..5]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let mut req = request("classic-2x3", &photos_800x600());
    req.images[3] = b"not a jpeg".to_vec();
    let err = booth.process(&req).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(err.to_string().contains("photo 4"));

    let outputs = dir.path().join("outputs");
    let count = std::fs::read_dir(&outputs).map(|d| d.count()).unwrap_or(0);
    assert_eq!(count, 0);
}

#[test]
fn code_failure_still_returns_the_strip() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = BoothConfig {
        output_dir: dir.path().join("outputs"),
        asset_root: dir.path().join("assets"),
        // Far beyond what a QR symbol can hold.
        public_base_url: format!("http://booth.local/{}", "x".repeat(3000)),
        ..BoothConfig::default()
    };
    let booth = Booth::from_config(cfg).unwrap();

    let result = booth
        .process(&request("horizontal-single", &photos_800x600()[..1]))
        .unwrap();
    assert!(result.code_image.is_none());
    assert!(result.output_image_path.is_file());
    assert!(result.output_image_address.len() > 3000);

    let json = serde_json::to_value(&result).unwrap();
    assert!(json["codeImage"].is_null());
}

#[test]
fn unknown_template_falls_back_to_default() {
    let dir = tempfile::tempdir().unwrap();
    let booth = booth_in(dir.path());
    let result = booth
        .process(&request("does-not-exist", &photos_800x600()))
        .unwrap();
    assert_eq!(result.template_id, "classic-2x3");
}

#[test]
fn missing_frame_asset_still_produces_output() {
    let dir = tempfile::tempdir().unwrap();
    let booth = booth_in(dir.path());
    let mut req = request("horizontal-single", &photos_800x600()[..1]);
    req.frame_id = Some("no-such-frame".to_owned());
    req.logo_id = Some("no-such-logo".to_owned());
    req.background_id = Some("beach".to_owned());

    let result = booth.process(&req).unwrap();
    let out = image::open(&result.output_image_path).unwrap();
    assert_eq!((out.width(), out.height()), (1800, 1200));
}

#[test]
fn frame_asset_is_applied_over_photos() {
    let dir = tempfile::tempdir().unwrap();
    let frames = dir.path().join("assets/frames");
    std::fs::create_dir_all(&frames).unwrap();
    // Opaque black left half, transparent right half, at a quarter of the canvas size.
    let frame = image::RgbaImage::from_fn(450, 300, |x, _| {
        if x < 225 {
            image::Rgba([0, 0, 0, 255])
        } else {
            image::Rgba([0, 0, 0, 0])
        }
    });
    std::fs::write(frames.join("half.png"), png_rgba(&frame)).unwrap();

    let booth = booth_in(dir.path());
    let mut req = request("horizontal-single", &photos_800x600()[..1]);
    req.frame_id = Some("half".to_owned());
    let result = booth.process(&req).unwrap();

    let out = image::open(&result.output_image_path).unwrap().to_rgb8();
    assert!(close(out.get_pixel(400, 600).0, [0, 0, 0], 10));
    assert!(close(out.get_pixel(1400, 600).0, SLOT_COLORS[0], 12));
}

#[test]
fn svg_logo_sits_under_the_frame() {
    let mut template = LayoutCatalog::builtin()
        .unwrap()
        .resolve_strict("horizontal-single")
        .unwrap()
        .clone();
    template.logo_position = Some(LogoPosition {
        left: 1500,
        top: 1000,
        width: 200,
        height: 100,
    });
    let logo_svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="20">
<rect width="20" height="20" fill="#0000ff"/></svg>"##;
    let logo = boothkit::assets::decode::decode_graphic(logo_svg).unwrap();
    let frame = Graphic::Raster(Arc::new(image::RgbaImage::from_fn(180, 120, |_, y| {
        if y >= 90 {
            image::Rgba([0, 255, 0, 255])
        } else {
            image::Rgba([0, 0, 0, 0])
        }
    })));
    let photos = [image::RgbImage::from_pixel(800, 600, image::Rgb([200, 0, 0]))];

    let logo_only = strip::render_strip(
        &photos,
        &template,
        Overlays {
            logo: Some(&logo),
            frame: None,
        },
    )
    .unwrap();
    // Contain fit: a 100x100 square centred in the 200x100 box.
    assert_eq!(logo_only.get_pixel(1600, 1050).0, [0, 0, 255]);
    assert_eq!(logo_only.get_pixel(1510, 1050).0, [200, 0, 0]);

    let both = strip::render_strip(
        &photos,
        &template,
        Overlays {
            logo: Some(&logo),
            frame: Some(&frame),
        },
    )
    .unwrap();
    assert_eq!(both.get_pixel(1600, 1050).0, [0, 255, 0]);
}
