use crate::enums::SampleType;

use ndarray::{Array2, Array3, ArcArray, Ix3, s};
use thiserror::Error;

/// Shared, immutable `(depth, height, width)` sample buffer.
pub type Samples = ArcArray<f64, Ix3>;

#[derive(Debug, Error, PartialEq)]
pub enum VolumeError {
    #[error("Cannot build a volume: {0}")]
    TypeConversion(String),
}

/// Pixel types a [`RawVolume`] can be built from.
pub trait Sample: Copy {
    const SAMPLE_TYPE: SampleType;

    fn to_f64(self) -> f64;
}

macro_rules! impl_sample {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Sample for $ty {
                const SAMPLE_TYPE: SampleType = SampleType::$variant;

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_sample!(
    u8 => U8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    f32 => F32,
    f64 => F64,
);

/// The pixel buffer backing a view.
///
/// Cloning a `RawVolume` shares the underlying samples; nothing in the crate
/// writes through a shared buffer, so clones stay valid when one owner
/// replaces its volume.
#[derive(Clone, Debug)]
pub struct RawVolume {
    data: Samples,
    sample_type: SampleType,
}

impl RawVolume {
    /// Wrap samples that are already widened to `f64`.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::TypeConversion`] if any axis is empty.
    pub fn new(data: Array3<f64>, sample_type: SampleType) -> Result<Self, VolumeError> {
        Self::from_samples(data.into_shared(), sample_type)
    }

    pub(crate) fn from_samples(data: Samples, sample_type: SampleType) -> Result<Self, VolumeError> {
        let (depth, height, width) = data.dim();
        if depth == 0 || height == 0 || width == 0 {
            return Err(VolumeError::TypeConversion(format!(
                "empty volume of shape {depth}x{height}x{width}"
            )));
        }
        Ok(Self { data, sample_type })
    }

    /// Wrap a buffer carved out of an existing, validated volume.
    pub(crate) fn derived(data: Samples, sample_type: SampleType) -> Self {
        debug_assert!(data.len() > 0, "derived volume is empty");
        Self { data, sample_type }
    }

    /// Build a volume from a typed array, remembering the source type.
    pub fn from_array<T: Sample>(data: &Array3<T>) -> Result<Self, VolumeError> {
        Self::new(data.mapv(Sample::to_f64), T::SAMPLE_TYPE)
    }

    /// Build a volume from a flat buffer laid out page after page, row-major.
    pub fn from_shape_vec<T: Sample>(
        shape: (usize, usize, usize),
        samples: Vec<T>,
    ) -> Result<Self, VolumeError> {
        let widened: Vec<f64> = samples.into_iter().map(Sample::to_f64).collect();
        let data = Array3::from_shape_vec(shape, widened)
            .map_err(|e| VolumeError::TypeConversion(e.to_string()))?;
        Self::new(data, T::SAMPLE_TYPE)
    }

    /// Stack equally-sized frames along the depth axis, in order.
    pub fn from_frames<T: Sample>(frames: &[Array2<T>]) -> Result<Self, VolumeError> {
        let first = frames
            .first()
            .ok_or_else(|| VolumeError::TypeConversion("no frames".to_string()))?;
        let (height, width) = first.dim();
        if frames.iter().any(|frame| frame.dim() != (height, width)) {
            return Err(VolumeError::TypeConversion(
                "inconsistent frame dimensions".to_string(),
            ));
        }

        let mut volume = Array3::<f64>::zeros((frames.len(), height, width));
        for (i, frame) in frames.iter().enumerate() {
            volume
                .slice_mut(s![i, .., ..])
                .assign(&frame.mapv(Sample::to_f64));
        }
        Self::new(volume, T::SAMPLE_TYPE)
    }

    /// Get the dimensions of the volume (depth, height, width)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    pub fn depth(&self) -> usize {
        self.data.dim().0
    }

    pub fn data(&self) -> &Samples {
        &self.data
    }

    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    /// Whether both volumes share the same buffer.
    pub fn shares_buffer_with(&self, other: &RawVolume) -> bool {
        self.data.as_ptr() == other.data.as_ptr()
    }
}
