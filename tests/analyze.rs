use chromagene::{analyze, color, AnalysisBuilder, AnalysisError, HeatmapCell, PALETTE_MIN_LAB_DISTANCE};
use pretty_assertions::assert_eq;

fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    rgba.repeat((width * height) as usize)
}

fn set(pixels: &mut [u8], width: u32, x: u32, y: u32, rgba: [u8; 4]) {
    let offset = ((y * width + x) * 4) as usize;
    pixels[offset..offset + 4].copy_from_slice(&rgba);
}

fn parse_hex(hex: &str) -> (u8, u8, u8) {
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).unwrap();
    (channel(1..3), channel(3..5), channel(5..7))
}

// white 1px border around quadrants of red, near-white, blue and dark green
fn bordered_image() -> (Vec<u8>, u32, u32) {
    let (width, height) = (20, 20);
    let mut pixels = solid(width, height, [255, 255, 255, 255]);

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let rgba = match (x < width / 2, y < height / 2) {
                (true, true) => [220, 30, 30, 255],
                (false, true) => [250, 250, 248, 255],
                (true, false) => [30, 60, 210, 255],
                (false, false) => [20, 90, 40, 255],
            };
            set(&mut pixels, width, x, y, rgba);
        }
    }

    (pixels, width, height)
}

#[test]
fn two_by_two_red() {
    let pixels = solid(2, 2, [255, 0, 0, 255]);
    let analysis = analyze(&pixels, 2, 2, false).unwrap();

    assert_eq!(analysis.pixel_count(), 4.0);
    assert_eq!(analysis.palette().len(), 1);
    assert_eq!(analysis.palette()[0].hex(), "#ff0000");
    assert_eq!(analysis.palette()[0].ratio(), 1.0);

    // red: L* 53 is the middle lightness bin, C* 104 is the top chroma bin
    let mut expected = [0.0; 9];
    expected[2 * 3 + 1] = 4.0;
    assert_eq!(analysis.heatmap_bins(), &expected);
}

#[test]
fn single_color_images_give_one_swatch() {
    for rgba in [[12, 34, 56, 255], [200, 200, 200, 255], [0, 0, 0, 255], [90, 250, 7, 255]] {
        let pixels = solid(16, 9, rgba);
        let analysis = analyze(&pixels, 16, 9, false).unwrap();

        assert_eq!(analysis.palette().len(), 1);

        let (r, g, b) = parse_hex(&analysis.palette()[0].hex());
        assert!((r as i16 - rgba[0] as i16).abs() <= 1);
        assert!((g as i16 - rgba[1] as i16).abs() <= 1);
        assert!((b as i16 - rgba[2] as i16).abs() <= 1);
        assert!((analysis.palette()[0].ratio() - 1.0).abs() < 1e-9);
    }
}

#[test]
fn histograms_sum_to_the_pixel_count() {
    let (width, height) = (37, 23);
    let pixels = (0..width * height)
        .flat_map(|i| [(i * 7 % 256) as u8, (i * 13 % 256) as u8, (i * 29 % 256) as u8, (i % 256) as u8])
        .collect::<Vec<_>>();

    for remove_background in [false, true] {
        let analysis = analyze(&pixels, width, height, remove_background).unwrap();
        let count = analysis.pixel_count();

        let heatmap: f64 = analysis.heatmap_bins().iter().sum();
        let lightness: f64 = analysis.lightness_bins().iter().sum();
        let saturation: f64 = analysis.saturation_bins().iter().sum();

        assert!((heatmap - count).abs() < 1e-6);
        assert!((lightness - count).abs() < 1e-6);
        assert!((saturation - count).abs() < 1e-6);
    }
}

#[test]
fn white_border_is_removed() {
    let (pixels, width, height) = bordered_image();

    let kept = analyze(&pixels, width, height, false).unwrap();
    let removed = analyze(&pixels, width, height, true).unwrap();

    let background = removed.background().expect("a uniform white border should be accepted");
    assert!(background.lab().l > 99.0);
    assert_eq!(background.threshold2(), 18.0 * 18.0);

    // the border (76 pixels) and the near-white quadrant (81 pixels) are both gone
    assert_eq!(kept.pixel_count(), 400.0);
    assert_eq!(removed.pixel_count(), 400.0 - 76.0 - 81.0);

    for swatch in removed.palette() {
        let (r, g, b) = parse_hex(&swatch.hex());
        assert!(r < 240 || g < 240 || b < 240, "{} looks like background", swatch.hex());
    }
}

#[test]
fn background_removal_never_adds_pixels() {
    let (pixels, width, height) = bordered_image();
    let mut noisy = pixels.clone();
    // break up the border so no color dominates it
    for x in 0..width {
        if x % 2 == 0 {
            set(&mut noisy, width, x, 0, [0, 0, 0, 255]);
            set(&mut noisy, width, x, height - 1, [255, 0, 255, 255]);
        }
    }
    for y in 0..height {
        set(&mut noisy, width, 0, y, [0, 255, 0, 255]);
    }

    for image in [&pixels, &noisy] {
        let kept = analyze(image, width, height, false).unwrap();
        let removed = analyze(image, width, height, true).unwrap();

        assert!(removed.pixel_count() <= kept.pixel_count());
    }

    let kept = analyze(&noisy, width, height, false).unwrap();
    let removed = analyze(&noisy, width, height, true).unwrap();
    assert!(removed.background().is_none());
    assert_eq!(removed.pixel_count(), kept.pixel_count());
}

#[test]
fn small_images_keep_their_background() {
    // 4x4 has only 12 border pixels, under the 24 sample minimum
    let pixels = solid(4, 4, [255, 255, 255, 255]);
    let analysis = analyze(&pixels, 4, 4, true).unwrap();

    assert!(analysis.background().is_none());
    assert_eq!(analysis.pixel_count(), 16.0);
}

#[test]
fn image_made_of_background_fails() {
    let pixels = solid(10, 10, [255, 255, 255, 255]);

    assert!(matches!(analyze(&pixels, 10, 10, true), Err(AnalysisError::EmptyAnalysis)));
}

#[test]
fn analysis_is_deterministic() {
    let (width, height) = (64, 48);
    let pixels = (0..width * height)
        .flat_map(|i| {
            let (x, y) = (i % width, i / width);
            [(x * 4) as u8, (y * 5) as u8, ((x + y) * 2) as u8, 255]
        })
        .collect::<Vec<_>>();

    let first = analyze(&pixels, width, height, true).unwrap();
    let second = analyze(&pixels, width, height, true).unwrap();

    assert_eq!(first, second);
    assert!(!first.palette().is_empty());
    assert!(first.palette().len() <= 8);
}

#[test]
fn distinct_colors_stay_apart() {
    let colors = [
        [230, 20, 20, 255],
        [20, 200, 40, 255],
        [30, 40, 220, 255],
        [240, 220, 30, 255],
        [20, 20, 20, 255],
        [245, 245, 245, 255],
    ];
    let pixels = colors.iter().flat_map(|rgba| rgba.repeat(40)).collect::<Vec<_>>();
    let analysis = analyze(&pixels, 24, 10, false).unwrap();

    let labs = analysis
        .palette()
        .iter()
        .map(|swatch| {
            let (r, g, b) = parse_hex(&swatch.hex());
            color::rgb8_to_lab(r, g, b)
        })
        .collect::<Vec<_>>();

    assert_eq!(labs.len(), colors.len());

    let threshold2 = PALETTE_MIN_LAB_DISTANCE * PALETTE_MIN_LAB_DISTANCE;
    for (i, left) in labs.iter().enumerate() {
        for right in &labs[i + 1..] {
            assert!(left.distance_squared(*right) >= threshold2);
        }
    }
}

#[test]
fn palette_ratios_add_up() {
    let mut pixels = solid(10, 10, [200, 40, 40, 255]);
    for i in 0..30 {
        set(&mut pixels, 10, i % 10, i / 10, [40, 40, 200, 255]);
    }

    let analysis = analyze(&pixels, 10, 10, false).unwrap();
    let ratios = analysis.palette().iter().map(|swatch| swatch.ratio()).collect::<Vec<_>>();

    assert_eq!(analysis.palette()[0].hex(), "#c82828");
    assert!((ratios[0] - 0.7).abs() < 1e-9);
    assert!((ratios[1] - 0.3).abs() < 1e-9);
}

#[test]
fn heatmap_has_nine_cells() {
    let (pixels, width, height) = bordered_image();
    let analysis = analyze(&pixels, width, height, false).unwrap();
    let cells = analysis.heatmap_cells().unwrap();

    let filled = cells.iter().flatten().filter(|cell| !cell.is_empty()).count();
    let non_zero = analysis.heatmap_bins().iter().filter(|bin| **bin > 0.0).count();

    assert_eq!(cells.iter().flatten().count(), 9);
    assert_eq!(filled, non_zero);
    assert!(cells.iter().flatten().any(|cell| matches!(cell, HeatmapCell::Filled { level: 7, .. })));
}

#[test]
fn translucent_pixels_weigh_less() {
    let mut pixels = solid(2, 1, [255, 0, 0, 255]);
    set(&mut pixels, 2, 1, 0, [0, 0, 255, 51]);

    let analysis = AnalysisBuilder::from_rgba(&pixels, 2, 1).unwrap().analyze().unwrap();

    assert!((analysis.pixel_count() - 1.2).abs() < 1e-9);
    assert_eq!(analysis.palette()[0].hex(), "#ff0000");
    assert!((analysis.palette()[1].ratio() - 0.2 / 1.2).abs() < 1e-9);
}
