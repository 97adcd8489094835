use std::{error::Error, path::PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use ndarray::Array2;
use volume_stack::{
    Interpolation, OutputType, PlaneAxis, RenderConfig, SampleType, SlicePoint, VolumeLoader,
    VolumeTransformer, VolumeWriter, VolumetricView, orthogonal_slices, render::frame_to_image,
};

#[derive(Debug, ValueEnum, Clone, Copy)]
enum ArgSampleType {
    U8,
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
}

impl From<ArgSampleType> for SampleType {
    fn from(value: ArgSampleType) -> Self {
        match value {
            ArgSampleType::U8 => SampleType::U8,
            ArgSampleType::U16 => SampleType::U16,
            ArgSampleType::I16 => SampleType::I16,
            ArgSampleType::U32 => SampleType::U32,
            ArgSampleType::I32 => SampleType::I32,
            ArgSampleType::F32 => SampleType::F32,
            ArgSampleType::F64 => SampleType::F64,
        }
    }
}

#[derive(Debug, ValueEnum, Clone, Copy)]
enum ArgInterpolation {
    Nearest,
    Trilinear,
}

impl From<ArgInterpolation> for Interpolation {
    fn from(value: ArgInterpolation) -> Self {
        match value {
            ArgInterpolation::Nearest => Interpolation::Nearest,
            ArgInterpolation::Trilinear => Interpolation::Trilinear,
        }
    }
}

#[derive(Debug, ValueEnum, Clone, Copy)]
enum ArgAxis {
    Depth,
    Vertical,
    Horizontal,
}

impl From<ArgAxis> for PlaneAxis {
    fn from(value: ArgAxis) -> Self {
        match value {
            ArgAxis::Depth => PlaneAxis::Depth,
            ArgAxis::Vertical => PlaneAxis::Vertical,
            ArgAxis::Horizontal => PlaneAxis::Horizontal,
        }
    }
}

/// Input stack and the view applied to it before any command runs.
#[derive(Args, Debug)]
struct ViewArgs {
    input: PathBuf,
    /// Lateral pixel size.
    #[arg(long, default_value_t = 1.0)]
    dx: f64,
    /// Page spacing.
    #[arg(long, default_value_t = 1.0)]
    dz: f64,
    /// Selection bounds: page start, page end, row start, row end, col start, col end.
    #[arg(long, num_args = 6, value_names = ["Z0", "Z1", "Y0", "Y1", "X0", "X1"])]
    select: Option<Vec<usize>>,
    /// Rescale the selection to the full range of the output type.
    #[arg(long)]
    normalize: bool,
    #[arg(long, value_enum)]
    output_type: Option<ArgSampleType>,
    /// Crop to the non-zero rectangle of the first page with content.
    #[arg(long)]
    unpad: bool,
}

impl ViewArgs {
    fn open(&self) -> Result<VolumetricView, Box<dyn Error + Send + Sync>> {
        let mut view = VolumeLoader::read_stack(&self.input, self.dx, self.dz)?;
        if self.unpad {
            view.unpad()?;
        }
        if let Some(bounds) = &self.select {
            let mut region = [None; 6];
            for (slot, &bound) in region.iter_mut().zip(bounds) {
                *slot = Some(bound);
            }
            view.select(region)?;
        }
        view.set_normalize(self.normalize);
        if let Some(output_type) = self.output_type {
            view.set_output_type(OutputType::Explicit(output_type.into()));
        }
        Ok(view)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the shape, sample type and statistics of the selection.
    Info {
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Write the selection as a multi-page TIFF.
    Export {
        #[command(flatten)]
        view: ViewArgs,
        dest_path: PathBuf,
        /// Flip the page order.
        #[arg(long)]
        reverse: bool,
        /// Keep every n-th page.
        #[arg(long)]
        downsample: Option<usize>,
    },
    /// Render the three orthogonal planes through a point as PNG files.
    Slices {
        #[command(flatten)]
        view: ViewArgs,
        /// Directory receiving depth.png, vertical.png and horizontal.png.
        dest_dir: PathBuf,
        #[arg(long)]
        z: Option<usize>,
        #[arg(long)]
        v: Option<usize>,
        #[arg(long)]
        h: Option<usize>,
    },
    /// Render a maximum intensity projection as a PNG file.
    Project {
        #[command(flatten)]
        view: ViewArgs,
        dest_path: PathBuf,
        #[arg(long, value_enum, default_value = "depth")]
        axis: ArgAxis,
    },
    /// Apply a 3x3 linear map, given row by row, and write the result as TIFF.
    Affine {
        #[command(flatten)]
        view: ViewArgs,
        dest_path: PathBuf,
        #[arg(long, num_args = 9, allow_negative_numbers = true, required = true)]
        matrix: Vec<f64>,
        #[arg(long, value_enum, default_value = "trilinear")]
        interpolation: ArgInterpolation,
    },
}

#[derive(Parser, Debug)]
#[command(about = "Crop, normalize, slice and transform multi-page TIFF stacks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<(), Box<dyn Error + Sync + Send>> {
    let env = env_logger::Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    match Cli::parse().command {
        Command::Info { view } => {
            let view = view.open()?;
            println!("{view}");
            println!("shape: {:?}", view.shape());
            println!("range in units: {:?}", view.range_in_units());
            println!(
                "min: {}, max: {}, mean: {}, std: {}",
                view.min(),
                view.max(),
                view.mean(),
                view.std()
            );
        }
        Command::Export {
            view,
            dest_path,
            reverse,
            downsample,
        } => {
            let mut view = view.open()?;
            if reverse {
                view.reverse_page_order();
            }
            if let Some(stride) = downsample {
                view.downsample(stride)?;
            }
            VolumeWriter::write_to_path(&view, &dest_path)?;
        }
        Command::Slices {
            view,
            dest_dir,
            z,
            v,
            h,
        } => {
            let view = view.open()?;
            let slices = orthogonal_slices(&view, SlicePoint { z, v, h })?;
            info!("slicing through {:?}", slices.point);
            std::fs::create_dir_all(&dest_dir)?;
            let config = RenderConfig::default();
            for (name, plane) in [
                ("depth", slices.depth_plane),
                ("vertical", slices.vertical_plane_t()),
                ("horizontal", slices.horizontal_plane),
            ] {
                if let Some(image) = frame_to_image(plane, &config) {
                    image.save(dest_dir.join(format!("{name}.png")))?;
                }
            }
        }
        Command::Project {
            view,
            dest_path,
            axis,
        } => {
            let view = view.open()?;
            let projection = view.project_max(axis.into());
            let image = frame_to_image(projection.view(), &RenderConfig::default())
                .ok_or("projection is empty")?;
            image.save(&dest_path)?;
            info!("wrote projection to {}", dest_path.display());
        }
        Command::Affine {
            view,
            dest_path,
            matrix,
            interpolation,
        } => {
            let view = view.open()?;
            let matrix = Array2::from_shape_vec((3, 3), matrix)?;
            let transformed = VolumeTransformer::with_interpolation(interpolation.into())
                .transform_view(&view, matrix.view())?;
            VolumeWriter::write_to_path(&transformed, &dest_path)?;
        }
    }

    Ok(())
}
