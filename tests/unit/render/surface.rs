use super::*;

fn solid(w: u32, h: u32, px: [u8; 4]) -> Bitmap {
    Bitmap::from_rgba8(w, h, px.repeat((w * h) as usize)).unwrap()
}

fn size(width: u64, height: u64) -> CanvasSize {
    CanvasSize { width, height }
}

#[test]
fn new_surface_is_transparent() {
    let raster = Surface::new(size(8, 4)).unwrap().finish();
    assert_eq!((raster.width, raster.height), (8, 4));
    assert!(raster.data.iter().all(|&b| b == 0));
}

#[test]
fn oversized_or_empty_surface_is_an_encoding_error() {
    let err = Surface::new(size(70_000, 10)).unwrap_err();
    assert!(err.to_string().contains("encoding error:"));
    assert!(Surface::new(size(0, 10)).is_err());
}

#[test]
fn fill_and_fill_rect_cover_exact_pixels() {
    let mut s = Surface::new(size(16, 16)).unwrap();
    s.fill(Rgba8::WHITE);
    s.fill_rect(Rect::new(4.0, 4.0, 8.0, 8.0), Rgba8::BLACK);
    let r = s.finish();
    assert_eq!(r.pixel(0, 0), Some([255, 255, 255, 255]));
    assert_eq!(r.pixel(5, 5), Some([0, 0, 0, 255]));
    assert_eq!(r.pixel(8, 8), Some([255, 255, 255, 255]));
    assert_eq!(r.pixel(16, 0), None);
}

#[test]
fn bitmap_is_scaled_into_destination() {
    let mut s = Surface::new(size(40, 40)).unwrap();
    let red = solid(2, 2, [255, 0, 0, 255]);
    let placement = Placement {
        scale_x: 10.0,
        scale_y: 5.0,
        dest: Rect::new(10.0, 10.0, 30.0, 20.0),
    };
    s.draw_bitmap(&red, &placement).unwrap();
    let r = s.finish();
    assert_eq!(r.pixel(20, 15), Some([255, 0, 0, 255]));
    assert_eq!(r.pixel(20, 25).unwrap()[3], 0);
    assert_eq!(r.pixel(5, 15).unwrap()[3], 0);
}

#[test]
fn clipped_bitmap_never_leaves_the_clip() {
    let mut s = Surface::new(size(40, 40)).unwrap();
    let blue = solid(4, 4, [0, 0, 255, 255]);
    let placement = Placement {
        scale_x: 10.0,
        scale_y: 10.0,
        dest: Rect::new(0.0, 0.0, 40.0, 40.0),
    };
    s.draw_bitmap_clipped(&blue, &placement, Rect::new(0.0, 0.0, 20.0, 20.0))
        .unwrap();
    let r = s.finish();
    assert_eq!(r.pixel(10, 10), Some([0, 0, 255, 255]));
    assert_eq!(r.pixel(30, 10).unwrap()[3], 0);
    assert_eq!(r.pixel(10, 30).unwrap()[3], 0);
}

#[test]
fn hex_color_form() {
    assert_eq!(Rgba8::LIGHT_GRAY.to_hex(), "#f3f4f6");
}

#[test]
fn oversized_bitmap_is_downscaled_to_its_destination() {
    let wide = solid(70_000, 1, [255, 0, 0, 255]);
    let dest = Rect::new(0.0, 0.0, 40.0, 10.0);
    let placement = Placement {
        scale_x: 40.0 / 70_000.0,
        scale_y: 10.0,
        dest,
    };
    let placed = PlacedBitmap::new(&wide, &placement).unwrap();
    assert_eq!((placed.width(), placed.height()), (40, 1));

    let mut s = Surface::new(size(40, 20)).unwrap();
    s.draw_placed(&placed);
    let r = s.finish();
    assert_eq!(r.pixel(20, 5), Some([255, 0, 0, 255]));
    assert_eq!(r.pixel(20, 15).unwrap()[3], 0);
}

#[test]
fn downscaled_side_stays_within_paint_limits() {
    assert_eq!(downscaled_side(70_000, 500.0), 500);
    assert_eq!(downscaled_side(70_000, 28_000_000.0), 65_535);
    assert_eq!(downscaled_side(3, 500.0), 3);
    assert_eq!(downscaled_side(70_000, 0.2), 1);
}
