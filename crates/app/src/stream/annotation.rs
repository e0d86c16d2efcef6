//! Skeleton overlay and verdict label drawing.

use anyhow::{Result, anyhow};
use capture::Frame;
use image::{DynamicImage, ImageBuffer, RgbImage, Rgba};
use pose_core::{LandmarkSet, POSE_CONNECTIONS};

use crate::stream::data::Verdict;

const BONE_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
const JOINT_COLOR: Rgba<u8> = Rgba([80, 180, 255, 255]);
const LABEL_BACKING: Rgba<u8> = Rgba([0, 0, 0, 180]);

/// Top-left anchor of the status label, matching the fixed position clients
/// expect.
const LABEL_POSITION: (i32, i32) = (10, 30);

/// Draw the skeleton (when landmarks are present) and the verdict label onto
/// a copy of the captured frame.
///
/// A frame with no detected body still gets the label; the overlay is simply
/// absent.
pub(crate) fn annotate_frame(
    frame: &Frame,
    landmarks: Option<&LandmarkSet>,
    verdict: Verdict,
) -> Result<RgbImage> {
    let width = frame.width;
    let height = frame.height;
    let rgba = rgb_to_rgba(&frame.data);
    let mut image = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_vec(width, height, rgba)
        .ok_or_else(|| anyhow!("failed to convert frame into image buffer"))?;

    if let Some(set) = landmarks {
        draw_skeleton(&mut image, set);
    }

    let (label_x, label_y) = LABEL_POSITION;
    let text = verdict.label();
    let text_width = text.chars().count() as i32 * 6;
    fill_rect(
        &mut image,
        label_x - 2,
        label_y - 1,
        label_x + text_width,
        label_y + 8,
        LABEL_BACKING,
    );
    draw_label(&mut image, label_x, label_y, text, verdict.color());

    Ok(DynamicImage::ImageRgba8(image).to_rgb8())
}

fn draw_skeleton(image: &mut ImageBuffer<Rgba<u8>, Vec<u8>>, set: &LandmarkSet) {
    let width = image.width() as f32;
    let height = image.height() as f32;
    let to_pixel = |point: [f32; 3]| {
        (
            (point[0] * width).round() as i32,
            (point[1] * height).round() as i32,
        )
    };

    for &(a, b) in POSE_CONNECTIONS {
        if let (Some(from), Some(to)) = (set.point(a), set.point(b)) {
            let (x0, y0) = to_pixel(from);
            let (x1, y1) = to_pixel(to);
            draw_line(image, x0, y0, x1, y1, BONE_COLOR);
        }
    }

    for point in set.points() {
        let (x, y) = to_pixel(*point);
        fill_rect(image, x - 1, y - 1, x + 1, y + 1, JOINT_COLOR);
    }
}

fn rgb_to_rgba(input: &[u8]) -> Vec<u8> {
    let pixels = input.len() / 3;
    let mut output = Vec::with_capacity(pixels * 4);
    for chunk in input.chunks_exact(3) {
        output.push(chunk[0]);
        output.push(chunk[1]);
        output.push(chunk[2]);
        output.push(255);
    }
    output
}

fn draw_line(
    image: &mut ImageBuffer<Rgba<u8>, Vec<u8>>,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    color: Rgba<u8>,
) {
    let width = image.width() as i32;
    let height = image.height() as i32;
    let steps = (x1 - x0).abs().max((y1 - y0).abs()).max(1);
    for step in 0..=steps {
        let t = step as f32 / steps as f32;
        let x = x0 + ((x1 - x0) as f32 * t).round() as i32;
        let y = y0 + ((y1 - y0) as f32 * t).round() as i32;
        if x >= 0 && x < width && y >= 0 && y < height {
            *image.get_pixel_mut(x as u32, y as u32) = color;
        }
    }
}

fn fill_rect(
    image: &mut ImageBuffer<Rgba<u8>, Vec<u8>>,
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
    color: Rgba<u8>,
) {
    let width = image.width() as i32;
    let height = image.height() as i32;
    let left = left.clamp(0, width.saturating_sub(1));
    let right = right.clamp(0, width.saturating_sub(1));
    let top = top.clamp(0, height.saturating_sub(1));
    let bottom = bottom.clamp(0, height.saturating_sub(1));

    for y in top..=bottom {
        for x in left..=right {
            *image.get_pixel_mut(x as u32, y as u32) = color;
        }
    }
}

fn draw_label(
    image: &mut ImageBuffer<Rgba<u8>, Vec<u8>>,
    mut x: i32,
    y: i32,
    text: &str,
    color: Rgba<u8>,
) {
    let height = image.height() as i32;
    let baseline = y;
    for ch in text.chars().flat_map(|c| c.to_uppercase()) {
        if let Some(glyph) = glyph_bits(ch) {
            for (row, pattern) in glyph.iter().enumerate() {
                let py = baseline + row as i32;
                if py < 0 || py >= height {
                    continue;
                }
                for col in 0..5 {
                    if (pattern >> (4 - col)) & 1 == 1 {
                        let px = x + col as i32;
                        if px >= 0 && px < image.width() as i32 {
                            *image.get_pixel_mut(px as u32, py as u32) = color;
                        }
                    }
                }
            }
        }
        x += 6;
    }
}

fn glyph_bits(ch: char) -> Option<[u8; 7]> {
    match ch {
        'A' => Some([
            0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001,
        ]),
        'C' => Some([
            0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110,
        ]),
        'E' => Some([
            0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b11111,
        ]),
        'F' => Some([
            0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b10000,
        ]),
        'I' => Some([
            0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110,
        ]),
        'M' => Some([
            0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001,
        ]),
        'N' => Some([
            0b10001, 0b11001, 0b10101, 0b10101, 0b10011, 0b10001, 0b10001,
        ]),
        'O' => Some([
            0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110,
        ]),
        'P' => Some([
            0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000,
        ]),
        'R' => Some([
            0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001,
        ]),
        'S' => Some([
            0b01111, 0b10000, 0b01110, 0b00001, 0b00001, 0b10001, 0b01110,
        ]),
        'T' => Some([
            0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100,
        ]),
        '0' => Some([
            0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110,
        ]),
        '1' => Some([
            0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110,
        ]),
        '2' => Some([
            0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111,
        ]),
        '3' => Some([
            0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110,
        ]),
        '4' => Some([
            0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010,
        ]),
        '5' => Some([
            0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110,
        ]),
        '6' => Some([
            0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110,
        ]),
        '7' => Some([
            0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000,
        ]),
        '8' => Some([
            0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110,
        ]),
        '9' => Some([
            0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100,
        ]),
        '.' => Some([0, 0, 0, 0, 0, 0b00110, 0b00110]),
        ' ' => Some([0, 0, 0, 0, 0, 0, 0]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pose_core::LANDMARK_COUNT;

    fn test_frame(width: u32, height: u32) -> Frame {
        Frame {
            data: vec![32; (width * height * 3) as usize],
            width,
            height,
            timestamp_ms: 0,
        }
    }

    fn centered_landmarks() -> LandmarkSet {
        LandmarkSet::from_points(vec![[0.5, 0.5, 0.0]; LANDMARK_COUNT])
    }

    fn has_pixel(image: &RgbImage, color: Rgba<u8>) -> bool {
        let target = image::Rgb([color[0], color[1], color[2]]);
        image.pixels().any(|pixel| *pixel == target)
    }

    #[test]
    fn label_is_drawn_in_verdict_color() {
        let frame = test_frame(160, 120);
        let matched = annotate_frame(&frame, None, Verdict::Match).unwrap();
        assert!(has_pixel(&matched, Verdict::Match.color()));
        assert!(!has_pixel(&matched, Verdict::NoMatch.color()));

        let missed = annotate_frame(&frame, None, Verdict::NoMatch).unwrap();
        assert!(has_pixel(&missed, Verdict::NoMatch.color()));
    }

    #[test]
    fn skeleton_overlay_appears_when_landmarks_present() {
        let frame = test_frame(160, 120);
        let annotated =
            annotate_frame(&frame, Some(&centered_landmarks()), Verdict::Match).unwrap();
        assert!(has_pixel(&annotated, JOINT_COLOR));
    }

    #[test]
    fn missing_skeleton_does_not_fail() {
        let frame = test_frame(32, 32);
        let annotated = annotate_frame(&frame, None, Verdict::NoMatch).unwrap();
        assert_eq!(annotated.dimensions(), (32, 32));
        assert!(!has_pixel(&annotated, JOINT_COLOR));
    }
}
