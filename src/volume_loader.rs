use crate::{
    enums::SampleType,
    raw_volume::{RawVolume, Sample, VolumeError},
    volume::VolumetricView,
};

use log::{debug, info, warn};
use ndarray::{Array3, ArrayView3};
use rayon::prelude::*;
use std::{
    fs::File,
    io::{BufReader, Read, Seek},
    path::Path,
};
use thiserror::Error;
use tiff::{
    ColorType,
    decoder::{Decoder, DecodingResult},
};

#[derive(Debug, Error)]
pub enum VolumeLoaderError {
    #[error("No pages found")]
    NoValidImages,

    #[error("Inconsistent page dimensions or sample formats")]
    InconsistentDimensions,

    #[error("Unsupported color type {0}, only single-channel grayscale is supported")]
    UnsupportedColorType(String),

    #[error("Unsupported sample format")]
    UnsupportedSampleFormat,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error(transparent)]
    Volume(#[from] VolumeError),
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Load every page of a multi-page grayscale TIFF, in file order.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be decoded, is not grayscale, or
    /// its pages differ in size or sample format.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawVolume, VolumeLoaderError> {
        let path = path.as_ref();
        let volume = Self::load_from_reader(BufReader::new(File::open(path)?))?;
        info!("loaded {} with shape {:?}", path.display(), volume.dim());
        Ok(volume)
    }

    /// Load a stack from any seekable TIFF source.
    pub fn load_from_reader<R: Read + Seek>(reader: R) -> Result<RawVolume, VolumeLoaderError> {
        let mut decoder = Decoder::new(reader)?;
        let mut format: Option<(u32, u32, SampleType)> = None;
        let mut samples: Vec<f64> = Vec::new();
        let mut depth = 0;

        loop {
            match decoder.colortype()? {
                ColorType::Gray(_) => {}
                other => return Err(VolumeLoaderError::UnsupportedColorType(format!("{other:?}"))),
            }
            let (width, height) = decoder.dimensions()?;
            let (sample_type, page) = Self::widen(decoder.read_image()?)?;

            match format {
                None => format = Some((width, height, sample_type)),
                Some(first) if first != (width, height, sample_type) => {
                    return Err(VolumeLoaderError::InconsistentDimensions);
                }
                Some(_) => {}
            }
            if page.len() != width as usize * height as usize {
                return Err(VolumeLoaderError::InconsistentDimensions);
            }
            samples.extend(page);
            depth += 1;
            debug!("decoded page {depth} ({width}x{height}, {sample_type})");

            if !decoder.more_images() {
                break;
            }
            decoder.next_image()?;
        }

        let (width, height, sample_type) = format.ok_or(VolumeLoaderError::NoValidImages)?;
        let data = Array3::from_shape_vec((depth, height as usize, width as usize), samples)
            .map_err(|_| VolumeLoaderError::InconsistentDimensions)?;
        Ok(RawVolume::new(data, sample_type)?)
    }

    /// Load a file into a view with the given pixel sizes, titled after the
    /// file name.
    pub fn read_stack(
        path: impl AsRef<Path>,
        dx: f64,
        dz: f64,
    ) -> Result<VolumetricView, VolumeLoaderError> {
        let path = path.as_ref();
        let mut view = VolumetricView::with_scale(Self::load_from_path(path)?, dx, dz);
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            view.labels.title = stem.to_string();
        }
        Ok(view)
    }

    /// Load a stack and hand all of its pages to `f`.
    pub fn load_and_apply<T>(
        path: impl AsRef<Path>,
        f: impl FnOnce(ArrayView3<'_, f64>) -> T,
    ) -> Result<T, VolumeLoaderError> {
        let volume = Self::load_from_path(path)?;
        Ok(f(volume.data().view()))
    }

    /// [`VolumeLoader::load_and_apply`] over many files in parallel.
    ///
    /// Each file gets its own volume; a file that fails to load is reported
    /// in its slot and does not stop the others.
    pub fn load_and_apply_batch<P, T, F>(paths: &[P], f: F) -> Vec<Result<T, VolumeLoaderError>>
    where
        P: AsRef<Path> + Sync,
        T: Send,
        F: Fn(ArrayView3<'_, f64>) -> T + Sync,
    {
        info!(
            "processing {} files on {} threads",
            paths.len(),
            rayon::current_num_threads()
        );
        paths
            .par_iter()
            .map(|path| {
                let result = Self::load_and_apply(path, &f);
                if let Err(e) = &result {
                    warn!("{}: {e}", path.as_ref().display());
                }
                result
            })
            .collect()
    }

    fn widen(result: DecodingResult) -> Result<(SampleType, Vec<f64>), VolumeLoaderError> {
        fn widened<T: Sample>(samples: Vec<T>) -> (SampleType, Vec<f64>) {
            (T::SAMPLE_TYPE, samples.into_iter().map(Sample::to_f64).collect())
        }

        Ok(match result {
            DecodingResult::U8(v) => widened(v),
            DecodingResult::U16(v) => widened(v),
            DecodingResult::I16(v) => widened(v),
            DecodingResult::U32(v) => widened(v),
            DecodingResult::I32(v) => widened(v),
            DecodingResult::F32(v) => widened(v),
            DecodingResult::F64(v) => widened(v),
            _ => return Err(VolumeLoaderError::UnsupportedSampleFormat),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume_writer::VolumeWriter;
    use ndarray::Array;
    use std::io::Cursor;

    fn encode(view: &VolumetricView) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        VolumeWriter::write_to_writer(view, &mut buffer).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_load_pages_in_file_order() {
        let data = Array::from_shape_fn((3, 4, 5), |(z, y, x)| (z * 1000 + y * 10 + x) as u16);
        let view = VolumetricView::new(RawVolume::from_array(&data).unwrap());
        let volume = VolumeLoader::load_from_reader(Cursor::new(encode(&view))).unwrap();
        assert_eq!(volume.dim(), (3, 4, 5));
        assert_eq!(volume.sample_type(), SampleType::U16);
        assert_eq!(volume.data()[[2, 3, 4]], 2034.0);
        assert_eq!(volume.data()[[0, 1, 0]], 10.0);
    }

    #[test]
    fn test_load_signed_pages() {
        let data = Array::from_shape_fn((2, 2, 2), |(z, y, x)| -((z * 4 + y * 2 + x) as i16));
        let view = VolumetricView::new(RawVolume::from_array(&data).unwrap());
        let volume = VolumeLoader::load_from_reader(Cursor::new(encode(&view))).unwrap();
        assert_eq!(volume.sample_type(), SampleType::I16);
        assert_eq!(volume.data()[[1, 1, 1]], -7.0);
    }

    #[test]
    fn test_rejects_garbage() {
        let result = VolumeLoader::load_from_reader(Cursor::new(vec![0u8; 16]));
        assert!(matches!(result, Err(VolumeLoaderError::Tiff(_))));
    }

    #[test]
    fn test_batch_reports_failures_per_file() {
        let results = VolumeLoader::load_and_apply_batch(
            &["does/not/exist-1.tif", "does/not/exist-2.tif"],
            |pages| pages.sum(),
        );
        assert_eq!(results.len(), 2);
        assert!(results
            .iter()
            .all(|r| matches!(r, Err(VolumeLoaderError::Io(_)))));
    }
}
