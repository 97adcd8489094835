use crate::affine::{TransformError, invert, resolve};
use crate::enums::{Interpolation, SampleType};
use crate::interpolator::{CpuResampler, Resampler};
use crate::raw_volume::RawVolume;
use crate::volume::VolumetricView;

use log::debug;
use ndarray::ArrayView2;

/// Applies 3x3 linear transforms to whole volumes.
///
/// The output is sized by [`resolve`] to hold every transformed corner, and
/// filled by backward mapping through the inverse matrix.
#[derive(Clone, Debug)]
pub struct VolumeTransformer<R = CpuResampler> {
    resampler: R,
}

impl VolumeTransformer<CpuResampler> {
    pub fn with_interpolation(interpolation: Interpolation) -> Self {
        Self::new(CpuResampler::new(interpolation))
    }
}

impl<R: Resampler> VolumeTransformer<R> {
    pub fn new(resampler: R) -> Self {
        Self { resampler }
    }

    /// Transform `volume` by `matrix` into a new buffer of the same sample
    /// type. `volume` is left untouched.
    ///
    /// # Errors
    ///
    /// [`TransformError::InvalidMatrixShape`] unless `matrix` is 3x3,
    /// [`TransformError::Singular`] if it has no inverse,
    /// [`TransformError::OutputTooLarge`] if the output cannot be allocated
    /// and [`TransformError::Volume`] if the resolved shape is empty, which
    /// happens for single-page inputs.
    ///
    /// Resampled values are rounded and saturated into the input's sample
    /// type when it is an integer type.
    pub fn transform(
        &self,
        volume: &RawVolume,
        matrix: ArrayView2<'_, f64>,
    ) -> Result<RawVolume, TransformError> {
        let inverse = invert(matrix)?;
        let bounds = resolve(volume.dim(), matrix)?;
        debug!(
            "affine transform of {:?}: output {:?}, offset {:?}",
            volume.dim(),
            bounds.shape,
            bounds.offset
        );
        let mut out = self.resampler.resample(
            volume.data().view(),
            inverse.view(),
            bounds.offset,
            bounds.shape,
        );
        let sample_type = volume.sample_type();
        if sample_type != SampleType::F64 {
            out.par_mapv_inplace(|v| sample_type.quantize(v));
        }
        Ok(RawVolume::new(out, sample_type)?)
    }

    /// Transform the derived pages of `view` and seed a new view with the
    /// result, keeping its scale factors and labels.
    pub fn transform_view(
        &self,
        view: &VolumetricView,
        matrix: ArrayView2<'_, f64>,
    ) -> Result<VolumetricView, TransformError> {
        let pages = view.pages().to_owned();
        let source = RawVolume::new(pages, view.output_sample_type())?;
        let raw = self.transform(&source, matrix)?;
        let selection = view.selection();
        let mut transformed = VolumetricView::with_scale(raw, selection.dx, selection.dz);
        transformed.labels = view.labels.clone();
        Ok(transformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, Array2, arr2, s};

    fn ramp_volume() -> RawVolume {
        let data = Array::from_shape_fn((4, 5, 6), |(z, y, x)| (z * 30 + y * 6 + x) as u16);
        RawVolume::from_array(&data).unwrap()
    }

    #[test]
    fn test_identity_round_trip() {
        let volume = ramp_volume();
        let identity = Array2::<f64>::eye(3);
        let out = VolumeTransformer::with_interpolation(Interpolation::Trilinear)
            .transform(&volume, identity.view())
            .unwrap();
        assert_eq!(out.dim(), (3, 4, 5));
        assert_eq!(out.sample_type(), SampleType::U16);
        assert_eq!(out.data(), &volume.data().slice(s![..3, ..4, ..5]));
        assert_eq!(volume.dim(), (4, 5, 6));
    }

    #[test]
    fn test_flip_reverses_pages() {
        let volume = ramp_volume();
        let flip = arr2(&[[-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        let out = VolumeTransformer::with_interpolation(Interpolation::Nearest)
            .transform(&volume, flip.view())
            .unwrap();
        assert_eq!(out.dim(), (3, 4, 5));
        // output page 0 reads source page 3
        assert_eq!(out.data()[[0, 1, 2]], volume.data()[[3, 1, 2]]);
        assert_eq!(out.data()[[2, 1, 2]], volume.data()[[1, 1, 2]]);
    }

    #[test]
    fn test_errors() {
        let volume = ramp_volume();
        let transformer = VolumeTransformer::with_interpolation(Interpolation::Trilinear);
        let singular = Array2::<f64>::zeros((3, 3));
        assert_eq!(
            transformer.transform(&volume, singular.view()).unwrap_err(),
            TransformError::Singular
        );
        let wide = Array2::<f64>::eye(4);
        assert_eq!(
            transformer.transform(&volume, wide.view()).unwrap_err(),
            TransformError::InvalidMatrixShape(4, 4)
        );
    }

    #[test]
    fn test_integer_output_is_rounded() {
        let data = Array::from_shape_fn((3, 2, 2), |(z, _, _)| z as u16);
        let volume = RawVolume::from_array(&data).unwrap();
        let stretch = arr2(&[[2.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        let out = VolumeTransformer::with_interpolation(Interpolation::Trilinear)
            .transform(&volume, stretch.view())
            .unwrap();
        assert_eq!(out.sample_type(), SampleType::U16);
        assert_eq!(out.dim(), (4, 1, 1));
        assert!(out.data().iter().all(|v| v.fract() == 0.0));
        // page 1 samples source depth 0.5
        assert_eq!(out.data()[[1, 0, 0]], 1.0);
        assert_eq!(out.data()[[2, 0, 0]], 1.0);
    }

    #[test]
    fn test_float_output_keeps_fractions() {
        let data = Array::from_shape_fn((3, 2, 2), |(z, _, _)| z as f64);
        let volume = RawVolume::from_array(&data).unwrap();
        let stretch = arr2(&[[2.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        let out = VolumeTransformer::with_interpolation(Interpolation::Trilinear)
            .transform(&volume, stretch.view())
            .unwrap();
        assert_eq!(out.data()[[1, 0, 0]], 0.5);
    }

    #[test]
    fn test_huge_scale_is_rejected() {
        let volume = RawVolume::from_array(&Array::from_elem((3, 2, 2), 1u16)).unwrap();
        let huge = arr2(&[[1e30, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        assert_eq!(
            VolumeTransformer::with_interpolation(Interpolation::Trilinear)
                .transform(&volume, huge.view())
                .unwrap_err(),
            TransformError::OutputTooLarge
        );
    }

    #[test]
    fn test_transform_view_seeds_new_view() {
        let mut view = VolumetricView::with_scale(ramp_volume(), 0.5, 2.0);
        view.set_page_range(1, 3).unwrap();
        let scale = arr2(&[[2.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        let transformed = VolumeTransformer::with_interpolation(Interpolation::Trilinear)
            .transform_view(&view, scale.view())
            .unwrap();
        assert_eq!(transformed.shape(), (2, 4, 5));
        assert_eq!(transformed.selection().dz, 2.0);
        // page 1 of the output sits halfway between selected pages 1 and 2
        let expected = (view.pages()[[0, 0, 0]] + view.pages()[[1, 0, 0]]) / 2.0;
        assert_eq!(transformed.pages()[[1, 0, 0]], expected);
        assert_eq!(view.shape(), (2, 5, 6));
    }
}
