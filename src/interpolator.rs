use crate::enums::Interpolation;

use log::debug;
use ndarray::{Array3, ArrayView2, ArrayView3, Axis};
use rayon::prelude::*;

/// Backward-mapping resampler.
///
/// Every output voxel `o` reads the source at `inverse · o + offset`;
/// source coordinates outside the volume read as zero.
pub trait Resampler {
    fn resample(
        &self,
        volume: ArrayView3<'_, f64>,
        inverse: ArrayView2<'_, f64>,
        offset: [f64; 3],
        output_shape: (usize, usize, usize),
    ) -> Array3<f64>;
}

/// Resampler running on the CPU, one output page per rayon task.
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuResampler {
    pub interpolation: Interpolation,
}

impl CpuResampler {
    pub fn new(interpolation: Interpolation) -> Self {
        Self { interpolation }
    }
}

impl Resampler for CpuResampler {
    fn resample(
        &self,
        volume: ArrayView3<'_, f64>,
        inverse: ArrayView2<'_, f64>,
        offset: [f64; 3],
        output_shape: (usize, usize, usize),
    ) -> Array3<f64> {
        debug!(
            "resampling {:?} into {:?} with {:?}",
            volume.dim(),
            output_shape,
            self.interpolation
        );
        let m = |r: usize, c: usize| inverse[[r, c]];
        let mut out = Array3::<f64>::zeros(output_shape);
        if volume.is_empty() {
            return out;
        }

        out.axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(z, mut page)| {
                let z = z as f64;
                for ((y, x), value) in page.indexed_iter_mut() {
                    let (y, x) = (y as f64, x as f64);
                    let src = [
                        m(0, 0) * z + m(0, 1) * y + m(0, 2) * x + offset[0],
                        m(1, 0) * z + m(1, 1) * y + m(1, 2) * x + offset[1],
                        m(2, 0) * z + m(2, 1) * y + m(2, 2) * x + offset[2],
                    ];
                    *value = match self.interpolation {
                        Interpolation::Nearest => Interpolator::nearest(&volume, src),
                        Interpolation::Trilinear => Interpolator::trilinear(&volume, src),
                    };
                }
            });
        out
    }
}

pub(crate) struct Interpolator;

impl Interpolator {
    /// Tolerance for coordinates that land a rounding error outside the volume.
    const EDGE_EPSILON: f64 = 1e-9;

    #[inline]
    fn in_bounds(coord: f64, len: usize) -> bool {
        coord >= -Self::EDGE_EPSILON && coord <= (len - 1) as f64 + Self::EDGE_EPSILON
    }

    #[inline]
    pub(crate) fn nearest(volume: &ArrayView3<'_, f64>, src: [f64; 3]) -> f64 {
        let (depth, height, width) = volume.dim();
        let [z, y, x] = src;
        if !(Self::in_bounds(z, depth) && Self::in_bounds(y, height) && Self::in_bounds(x, width))
        {
            return 0.0;
        }
        let index = |c: f64, len: usize| (c.round().max(0.0) as usize).min(len - 1);
        volume[[index(z, depth), index(y, height), index(x, width)]]
    }

    #[inline]
    pub(crate) fn trilinear(volume: &ArrayView3<'_, f64>, src: [f64; 3]) -> f64 {
        let (depth, height, width) = volume.dim();
        let [z, y, x] = src;
        if !(Self::in_bounds(z, depth) && Self::in_bounds(y, height) && Self::in_bounds(x, width))
        {
            return 0.0;
        }
        let (z, y, x) = (
            z.clamp(0.0, (depth - 1) as f64),
            y.clamp(0.0, (height - 1) as f64),
            x.clamp(0.0, (width - 1) as f64),
        );

        let z0 = z.floor() as usize;
        let y0 = y.floor() as usize;
        let x0 = x.floor() as usize;
        let z1 = (z0 + 1).min(depth - 1);

        let dz = z - z0 as f64;
        let front = Self::bilinear_interpolate(&volume.index_axis(Axis(0), z0), y, x, y0, x0);
        if dz == 0.0 {
            return front;
        }
        let back = Self::bilinear_interpolate(&volume.index_axis(Axis(0), z1), y, x, y0, x0);
        front.mul_add(1.0 - dz, back * dz)
    }

    #[inline]
    fn bilinear_interpolate(
        slice: &ArrayView2<'_, f64>,
        y: f64,
        x: f64,
        y0: usize,
        x0: usize,
    ) -> f64 {
        let (height, width) = slice.dim();
        let y1 = (y0 + 1).min(height - 1);
        let x1 = (x0 + 1).min(width - 1);

        let dy = y - y0 as f64;
        let dx = x - x0 as f64;
        if dy == 0.0 && dx == 0.0 {
            return slice[[y0, x0]];
        }
        let one_minus_dx = 1.0 - dx;
        let one_minus_dy = 1.0 - dy;

        let v00 = slice[[y0, x0]];
        let v01 = slice[[y0, x1]];
        let v10 = slice[[y1, x0]];
        let v11 = slice[[y1, x1]];

        let v0 = v00.mul_add(one_minus_dx, v01 * dx);
        let v1 = v10.mul_add(one_minus_dx, v11 * dx);

        v0.mul_add(one_minus_dy, v1 * dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, Array2, arr2};

    fn ramp() -> Array3<f64> {
        Array::from_shape_fn((3, 4, 5), |(z, y, x)| (z * 100 + y * 10 + x) as f64)
    }

    #[test]
    fn test_identity_copies_voxels() {
        let volume = ramp();
        let identity = Array2::<f64>::eye(3);
        for interpolation in [Interpolation::Nearest, Interpolation::Trilinear] {
            let out = CpuResampler::new(interpolation).resample(
                volume.view(),
                identity.view(),
                [0.0; 3],
                (3, 4, 5),
            );
            assert_eq!(out, volume);
        }
    }

    #[test]
    fn test_out_of_bounds_reads_zero() {
        let volume = ramp();
        let identity = Array2::<f64>::eye(3);
        let out = CpuResampler::default().resample(
            volume.view(),
            identity.view(),
            [1.0, 0.0, 0.0],
            (3, 4, 5),
        );
        assert_eq!(out[[0, 1, 1]], 111.0);
        assert!(out.index_axis(Axis(0), 2).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_trilinear_midpoint() {
        let volume = ramp();
        let half = arr2(&[[0.5, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.5]]);
        let out = CpuResampler::default().resample(volume.view(), half.view(), [0.0; 3], (5, 4, 9));
        // source (0.5, 2, 1.5) sits between 21, 22, 121 and 122
        assert!((out[[1, 2, 3]] - 71.5).abs() < 1e-9);
    }

    #[test]
    fn test_flip_backward_mapping() {
        let volume = ramp();
        let flip = arr2(&[[-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        let out = CpuResampler::new(Interpolation::Nearest).resample(
            volume.view(),
            flip.view(),
            [2.0, 0.0, 0.0],
            (3, 4, 5),
        );
        assert_eq!(out[[0, 3, 4]], volume[[2, 3, 4]]);
        assert_eq!(out[[2, 0, 0]], volume[[0, 0, 0]]);
    }
}
