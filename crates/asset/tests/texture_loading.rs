mod common;

use asset::gpu::{FilterMode, WrapMode};
use asset::{
    GraphicsContext, MockContext, TextureData, TextureError, load_texture, try_load_texture,
};
use common::{capture_logs, fixture_path, take_logs, write_fixture};
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use log::Level;

const TOP: [u8; 3] = [255, 0, 0];
const BOTTOM: [u8; 3] = [0, 0, 255];

/// 3x2 image: top row red, bottom row blue.
fn write_two_tone_png(name: &str) -> std::path::PathBuf {
    let path = fixture_path(name);
    let img = RgbImage::from_fn(3, 2, |_, y| if y == 0 { Rgb(TOP) } else { Rgb(BOTTOM) });
    img.save(&path).expect("save fixture png");
    path
}

#[test]
fn valid_image_is_uploaded_flipped() {
    let path = write_two_tone_png("two_tone.png");
    let mut ctx = MockContext::new();
    let handle = load_texture(&mut ctx, &path);

    let image = ctx.texture(handle).unwrap().image.as_ref().unwrap();
    assert_eq!((image.width, image.height), (3, 2));
    for x in 0..3 {
        assert_eq!(image.texel(x, 0), Some(BOTTOM));
        assert_eq!(image.texel(x, 1), Some(TOP));
    }
}

#[test]
fn sampler_repeats_and_filters_linearly() {
    let path = write_two_tone_png("sampler.png");
    let mut ctx = MockContext::new();
    let handle = load_texture(&mut ctx, &path);

    let sampler = ctx.texture(handle).unwrap().sampler.unwrap();
    assert_eq!(sampler.wrap_s, WrapMode::Repeat);
    assert_eq!(sampler.wrap_t, WrapMode::Repeat);
    assert_eq!(sampler.min_filter, FilterMode::Linear);
    assert_eq!(sampler.mag_filter, FilterMode::Linear);
}

#[test]
fn alpha_channel_is_dropped_for_rgb_upload() {
    let path = fixture_path("rgba.png");
    RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 40]))
        .save(&path)
        .unwrap();

    let tex = TextureData::load_flipped(&path).unwrap();
    assert_eq!(tex.source_channels, 4);
    assert!(tex.is_valid());

    let mut ctx = MockContext::new();
    let handle = load_texture(&mut ctx, &path);
    let image = ctx.texture(handle).unwrap().image.as_ref().unwrap();
    assert_eq!(image.pixels.len(), 2 * 2 * 3);
    assert_eq!(image.texel(1, 1), Some([10, 20, 30]));
}

#[test]
fn missing_file_returns_handle_and_logs_once() {
    capture_logs();
    let mut ctx = MockContext::new();
    let handle = load_texture(&mut ctx, "missing/textures/floor.jpg");

    assert_eq!(ctx.created_textures(), 1);
    assert!(ctx.texture(handle).unwrap().image.is_none());

    let errors = take_logs(Level::Error);
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(errors[0].contains("missing/textures/floor.jpg"), "{}", errors[0]);
}

#[test]
fn corrupt_file_returns_unpopulated_handle() {
    capture_logs();
    let path = write_fixture("corrupt.png", b"this is not a png");
    let mut ctx = MockContext::new();
    let handle = load_texture(&mut ctx, &path);
    assert!(ctx.texture(handle).unwrap().image.is_none());
    assert_eq!(take_logs(Level::Error).len(), 1);

    assert!(matches!(
        try_load_texture(&mut ctx, &path),
        Err(TextureError::Decode { .. })
    ));
    assert_eq!(ctx.created_textures(), 1);
}

#[test]
fn repeated_loads_give_distinct_handles_with_same_content() {
    let path = write_two_tone_png("repeat.png");
    let mut ctx = MockContext::new();
    let a = load_texture(&mut ctx, &path);
    let b = load_texture(&mut ctx, &path);
    assert_ne!(a, b);
    assert_eq!(ctx.live_textures(), 2);

    let image_a = ctx.texture(a).unwrap().image.clone().unwrap();
    let image_b = ctx.texture(b).unwrap().image.clone().unwrap();
    assert_eq!(image_a, image_b);

    ctx.delete_texture(a);
    assert!(ctx.texture(b).is_some());
}

#[test]
fn oversized_image_returns_handle_and_logs_once() {
    capture_logs();
    let path = write_two_tone_png("oversized.png");
    let mut ctx = MockContext::with_max_dimension(2);
    let handle = load_texture(&mut ctx, &path);

    assert_eq!(ctx.created_textures(), 1);
    assert!(ctx.texture(handle).unwrap().image.is_none());

    let errors = take_logs(Level::Error);
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(errors[0].contains("3x2"), "{}", errors[0]);
    assert!(errors[0].contains("oversized.png"), "{}", errors[0]);
}

#[test]
fn successful_upload_names_the_backend() {
    capture_logs();
    let path = write_two_tone_png("backend_name.png");
    let mut ctx = MockContext::new();
    load_texture(&mut ctx, &path);

    let infos = take_logs(Level::Info);
    let uploaded: Vec<&String> = infos.iter().filter(|m| m.contains("uploaded")).collect();
    assert_eq!(uploaded.len(), 1, "{infos:?}");
    assert!(uploaded[0].contains("(Mock)"), "{}", uploaded[0]);
}
