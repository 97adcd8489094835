use crate::normalize::min_max;

use image::{GrayImage, ImageBuffer};
use ndarray::{ArrayView2, Axis};
use rayon::prelude::*;

/// Intensity window applied when turning a plane into an 8-bit image.
///
/// Passed explicitly to every render call; unset bounds fall back to the
/// plane's own minimum and maximum.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RenderConfig {
    pub low: Option<f64>,
    pub high: Option<f64>,
}

impl RenderConfig {
    pub fn window(low: f64, high: f64) -> Self {
        Self {
            low: Some(low),
            high: Some(high),
        }
    }
}

#[inline]
fn normalize_to_u8(value: f64, low: f64, high: f64) -> u8 {
    if high <= low {
        return 0;
    }
    ((value - low) / (high - low) * 255.0).clamp(0.0, 255.0) as u8
}

/// Render a `(rows, cols)` plane as a grayscale image.
pub fn frame_to_image(frame: ArrayView2<'_, f64>, config: &RenderConfig) -> Option<GrayImage> {
    let (height, width) = frame.dim();
    if height == 0 || width == 0 {
        return None;
    }
    let (low, high) = match (config.low, config.high) {
        (Some(low), Some(high)) => (low, high),
        (low, high) => {
            let (min, max) = min_max(frame.insert_axis(Axis(0)));
            (low.unwrap_or(min), high.unwrap_or(max))
        }
    };

    let pixel_data: Vec<u8> = frame
        .outer_iter()
        .into_par_iter()
        .flat_map_iter(|row| {
            row.into_iter()
                .map(|&v| normalize_to_u8(v, low, high))
                .collect::<Vec<u8>>()
        })
        .collect();
    ImageBuffer::from_raw(width as u32, height as u32, pixel_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, arr2};

    #[test]
    fn test_auto_window_spans_plane() {
        let frame = arr2(&[[10.0, 20.0], [30.0, 110.0]]);
        let image = frame_to_image(frame.view(), &RenderConfig::default()).unwrap();
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.get_pixel(0, 0).0, [0]);
        assert_eq!(image.get_pixel(1, 1).0, [255]);
        assert_eq!(image.get_pixel(0, 1).0, [51]);
    }

    #[test]
    fn test_explicit_window_clamps() {
        let frame = arr2(&[[0.0, 50.0, 100.0]]);
        let image = frame_to_image(frame.view(), &RenderConfig::window(25.0, 75.0)).unwrap();
        assert_eq!(image.dimensions(), (3, 1));
        assert_eq!(image.as_raw(), &vec![0, 127, 255]);
    }

    #[test]
    fn test_constant_and_empty_planes() {
        let frame = Array2::<f64>::from_elem((2, 3), 4.0);
        let image = frame_to_image(frame.view(), &RenderConfig::default()).unwrap();
        assert!(image.pixels().all(|p| p.0 == [0]));

        let empty = Array2::<f64>::zeros((0, 3));
        assert!(frame_to_image(empty.view(), &RenderConfig::default()).is_none());
    }
}
