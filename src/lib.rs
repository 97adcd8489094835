//! # volume-stack
//!
//! Lazy, cropped and normalized views over multi-page volumetric images,
//! such as microscopy z-stacks stored as multi-page TIFF files.
//!
//! A [`VolumetricView`] owns a [`RawVolume`] of shape `(pages, rows, cols)`
//! and exposes a sub-volume of it, selected by a page range and an in-plane
//! crop, optionally rescaled to the full range of an output type. The
//! selected pages are computed on first access and kept until the selection
//! or the normalization settings change; without normalization they share
//! memory with the raw buffer.
//!
//! Views can be:
//!  - sliced into the three orthogonal planes through a point
//!    ([`orthogonal_slices`])
//!  - transformed by a 3x3 linear map into a new volume sized to hold the
//!    result ([`VolumeTransformer`], [`affine::resolve`])
//!  - flipped, downsampled along the page axis or materialized in place
//!  - written back as multi-page TIFF ([`VolumeWriter`])
//!
//! # Examples
//!
//! ## Cropping and normalizing a stack
//!
//! ```no_run
//! # use volume_stack::{VolumeLoader, VolumeWriter, OutputType, SampleType};
//! let mut view = VolumeLoader::read_stack("stack.tif", 0.2, 1.0)
//!     .expect("should have loaded the stack");
//! view.set_page_range(10, 40).expect("page range should fit the stack");
//! view.set_crop(0, 256, 0, 256).expect("crop should fit the pages");
//! view.set_normalize(true);
//! view.set_output_type(OutputType::Explicit(SampleType::U8));
//! VolumeWriter::write_to_path(&view, "cropped.tif").expect("should have written the stack");
//! ```
//!
//! ## Rotating a volume
//!
//! ```
//! # use volume_stack::{Interpolation, RawVolume, VolumeTransformer};
//! # use ndarray::{Array3, arr2};
//! let volume = RawVolume::from_array(&Array3::<u16>::ones((4, 8, 8))).unwrap();
//! let flip = arr2(&[[-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
//! let flipped = VolumeTransformer::with_interpolation(Interpolation::Nearest)
//!     .transform(&volume, flip.view())
//!     .unwrap();
//! assert_eq!(flipped.dim(), (3, 7, 7));
//! ```

pub mod affine;
pub mod enums;
mod interpolator;
pub mod normalize;
pub mod padding;
pub mod raw_volume;
pub mod render;
pub mod selection;
pub mod slices;
pub mod transform;
pub mod volume;
pub mod volume_loader;
pub mod volume_writer;

pub use affine::{AffineBounds, TransformError};
pub use enums::{Interpolation, OutputType, PlaneAxis, SampleType};
pub use interpolator::{CpuResampler, Resampler};
pub use raw_volume::{RawVolume, VolumeError};
pub use render::RenderConfig;
pub use selection::{Region, SelectionError, SelectionState};
pub use slices::{OrthogonalSlices, SlicePoint, orthogonal_slices};
pub use transform::VolumeTransformer;
pub use volume::{StackLabels, VolumetricView};
pub use volume_loader::{VolumeLoader, VolumeLoaderError};
pub use volume_writer::{VolumeWriter, VolumeWriterError};
