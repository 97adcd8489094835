use crate::enums::SampleType;

use ndarray::{Array3, ArrayView3, Zip};

/// Rescale `pages` so that its minimum lands on the lowest level of
/// `output` and its maximum on the highest.
///
/// Integer outputs span the full range of the type, float outputs span
/// `[0, 1]`. Values are then cast to `output`. A constant input has no
/// range to stretch and comes out filled with the lowest level.
pub fn normalize(pages: ArrayView3<'_, f64>, output: SampleType) -> Array3<f64> {
    let (min_level, max_level) = output.integer_limits().unwrap_or((0.0, 1.0));
    let (data_min, data_max) = min_max(pages);

    let mut out = Array3::<f64>::zeros(pages.dim());
    if data_max == data_min {
        out.fill(output.cast(min_level));
        return out;
    }

    let span = max_level - min_level;
    let range = data_max - data_min;
    // multiply before dividing so integer inputs land exactly on integer levels
    Zip::from(&mut out).and(&pages).par_for_each(|o, &v| {
        *o = output.cast((v - data_min) * span / range + min_level);
    });
    out
}

/// `(min, max)` of a non-empty array.
pub(crate) fn min_max(pages: ArrayView3<'_, f64>) -> (f64, f64) {
    pages.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_ramp_u8_unchanged() {
        let ramp = Array::from_shape_fn((1, 16, 16), |(_, y, x)| (y * 16 + x) as f64);
        let out = normalize(ramp.view(), SampleType::U8);
        assert_eq!(out, ramp);
    }

    #[test]
    fn test_signed_output_spans_type() {
        let data = Array::from_shape_vec((1, 1, 3), vec![10.0, 20.0, 30.0]).unwrap();
        let out = normalize(data.view(), SampleType::I16);
        assert_eq!(out[[0, 0, 0]], -32768.0);
        assert_eq!(out[[0, 0, 2]], 32767.0);
    }

    #[test]
    fn test_float_output_spans_unit_range() {
        let data = Array::from_shape_vec((2, 1, 2), vec![-4.0, 0.0, 2.0, 4.0]).unwrap();
        let out = normalize(data.view(), SampleType::F64);
        assert!(f64_eq(out[[0, 0, 0]], 0.0));
        assert!(f64_eq(out[[0, 0, 1]], 0.5));
        assert!(f64_eq(out[[1, 0, 1]], 1.0));
    }

    #[test]
    fn test_constant_region_fills_lowest_level() {
        let data = Array3::<f64>::from_elem((2, 3, 3), 7.0);
        let out = normalize(data.view(), SampleType::U16);
        assert!(out.iter().all(|&v| v == 0.0));

        let out = normalize(data.view(), SampleType::I16);
        assert!(out.iter().all(|&v| v == -32768.0));
        assert!(out.iter().all(|v| v.is_finite()));
    }
}
