use crate::{enums::SampleType, volume::VolumetricView};

use log::info;
use std::{
    fs::File,
    io::{BufWriter, Seek, Write},
    path::Path,
};
use thiserror::Error;
use tiff::encoder::{TiffEncoder, TiffValue, colortype};

#[derive(Debug, Error)]
pub enum VolumeWriterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),
}

pub struct VolumeWriter;

impl VolumeWriter {
    /// Write the derived pages of `view` as a multi-page TIFF at `path`.
    pub fn write_to_path(
        view: &VolumetricView,
        path: impl AsRef<Path>,
    ) -> Result<(), VolumeWriterError> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        Self::write_to_writer(view, &mut writer)?;
        writer.flush()?;
        info!(
            "wrote {} pages of {} to {}",
            view.frame_count(),
            view.output_sample_type(),
            path.display()
        );
        Ok(())
    }

    /// Encode the derived pages in order, the first page opening the file
    /// and the rest appended after it, in the view's output sample type.
    pub fn write_to_writer<W: Write + Seek>(
        view: &VolumetricView,
        writer: W,
    ) -> Result<(), VolumeWriterError> {
        let mut encoder = TiffEncoder::new(writer)?;
        match view.output_sample_type() {
            SampleType::U8 => {
                Self::write_pages::<colortype::Gray8, _>(&mut encoder, view, |v| v as u8)
            }
            SampleType::U16 => {
                Self::write_pages::<colortype::Gray16, _>(&mut encoder, view, |v| v as u16)
            }
            SampleType::I16 => {
                Self::write_pages::<colortype::GrayI16, _>(&mut encoder, view, |v| v as i16)
            }
            SampleType::U32 => {
                Self::write_pages::<colortype::Gray32, _>(&mut encoder, view, |v| v as u32)
            }
            SampleType::I32 => {
                Self::write_pages::<colortype::GrayI32, _>(&mut encoder, view, |v| v as i32)
            }
            SampleType::F32 => {
                Self::write_pages::<colortype::Gray32Float, _>(&mut encoder, view, |v| v as f32)
            }
            SampleType::F64 => {
                Self::write_pages::<colortype::Gray64Float, _>(&mut encoder, view, |v| v)
            }
        }
    }

    fn write_pages<C, W>(
        encoder: &mut TiffEncoder<W>,
        view: &VolumetricView,
        convert: impl Fn(f64) -> C::Inner,
    ) -> Result<(), VolumeWriterError>
    where
        C: colortype::ColorType,
        W: Write + Seek,
        [C::Inner]: TiffValue,
    {
        let (_, height, width) = view.shape();
        for frame in view.frames() {
            let data: Vec<C::Inner> = frame.iter().map(|&v| convert(v)).collect();
            encoder.write_image::<C>(width as u32, height as u32, &data)?;
        }
        Ok(())
    }
}
