use image::RgbaImage;

/// Pixels where alpha jumps by more than `threshold` while walking each
/// column top to bottom and then each row left to right. Column hits come
/// first; a pixel can appear twice.
pub fn contour_points(image: &RgbaImage, threshold: u8) -> Vec<(u32, u32)> {
    let (width, height) = image.dimensions();
    let alpha = |x: u32, y: u32| i16::from(image.get_pixel(x, y)[3]);
    let threshold = i16::from(threshold);
    let mut points = Vec::new();

    if width == 0 || height == 0 {
        return points;
    }

    for x in 0..width {
        let mut prev = alpha(x, 0);
        for y in 1..height {
            let current = alpha(x, y);
            if (current - prev).abs() > threshold {
                points.push((x, y));
                prev = current;
            }
        }
    }

    for y in 1..height {
        let mut prev = alpha(0, y);
        for x in 0..width {
            let current = alpha(x, y);
            if (current - prev).abs() > threshold {
                points.push((x, y));
                prev = current;
            }
        }
    }

    points
}
