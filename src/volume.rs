use crate::enums::{OutputType, PlaneAxis, SampleType};
use crate::normalize::{min_max, normalize as normalize_pages};
use crate::padding::{PaddingError, estimate_zero_padding};
use crate::raw_volume::{RawVolume, Samples};
use crate::selection::{Region, SelectionError, SelectionState};

use log::debug;
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis, s};
use std::cell::OnceCell;
use std::fmt;

/// Text labels used when describing or plotting a stack.
#[derive(Clone, Debug, PartialEq)]
pub struct StackLabels {
    pub title: String,
    pub units: String,
    pub z_label: String,
}

impl Default for StackLabels {
    fn default() -> Self {
        Self {
            title: String::new(),
            units: "units".to_string(),
            z_label: "depth".to_string(),
        }
    }
}

/// A cropped, optionally normalized window onto a [`RawVolume`].
///
/// The derived pages are computed on first read and memoized; every method
/// that changes what [`VolumetricView::pages`] would return drops the memo.
/// An empty cell is the dirty state.
#[derive(Clone, Debug)]
pub struct VolumetricView {
    raw: RawVolume,
    selection: SelectionState,
    normalize: bool,
    output_type: OutputType,
    pub labels: StackLabels,
    cache: OnceCell<Samples>,
}

impl VolumetricView {
    pub fn new(raw: RawVolume) -> Self {
        Self::with_scale(raw, 1.0, 1.0)
    }

    /// Wrap `raw` with in-plane pixel size `dx` and axial size `dz`.
    pub fn with_scale(raw: RawVolume, dx: f64, dz: f64) -> Self {
        let selection = SelectionState::full(raw.dim(), dx, dz);
        Self {
            raw,
            selection,
            normalize: false,
            output_type: OutputType::Same,
            labels: StackLabels::default(),
            cache: OnceCell::new(),
        }
    }

    pub fn raw(&self) -> &RawVolume {
        &self.raw
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    #[inline]
    fn invalidate(&mut self) {
        self.cache.take();
    }

    /// The selected sub-volume, recomputed only after a mutation.
    ///
    /// Without normalization this shares memory with the raw buffer.
    pub fn pages(&self) -> &Samples {
        self.cache.get_or_init(|| self.compute_pages())
    }

    fn compute_pages(&self) -> Samples {
        let (pages, rows, cols) = (
            self.selection.pages(),
            self.selection.rows(),
            self.selection.cols(),
        );
        debug!("recomputing pages for selection {:?}", self.selection.bounds());
        let selected = self.raw.data().clone().slice_move(s![pages, rows, cols]);
        if self.normalize {
            normalize_pages(selected.view(), self.output_sample_type()).into_shared()
        } else {
            selected
        }
    }

    /// Element type of the values returned by [`VolumetricView::pages`].
    pub fn output_sample_type(&self) -> SampleType {
        if self.normalize {
            self.output_type.resolve(self.raw.sample_type())
        } else {
            self.raw.sample_type()
        }
    }

    /// Shape of the derived view.
    pub fn shape(&self) -> (usize, usize, usize) {
        self.selection.shape()
    }

    pub fn select(&mut self, region: Region) -> Result<(), SelectionError> {
        self.selection.apply(region, self.raw.dim())?;
        self.invalidate();
        Ok(())
    }

    pub fn set_page_range(&mut self, start: usize, end: usize) -> Result<(), SelectionError> {
        self.select([Some(start), Some(end), None, None, None, None])
    }

    pub fn set_crop(
        &mut self,
        row_start: usize,
        row_end: usize,
        col_start: usize,
        col_end: usize,
    ) -> Result<(), SelectionError> {
        self.select([
            None,
            None,
            Some(row_start),
            Some(row_end),
            Some(col_start),
            Some(col_end),
        ])
    }

    pub fn set_crop_rows(&mut self, start: usize, end: usize) -> Result<(), SelectionError> {
        self.select([None, None, Some(start), Some(end), None, None])
    }

    pub fn set_crop_cols(&mut self, start: usize, end: usize) -> Result<(), SelectionError> {
        self.select([None, None, None, None, Some(start), Some(end)])
    }

    /// Set the first page from a physical depth, relative to the keypage.
    pub fn set_start_in_units(&mut self, start: f64) -> Result<(), SelectionError> {
        let page = self.page_from_units(start, 1)?;
        self.select([Some(page), None, None, None, None, None])
    }

    /// Set the end page from a physical depth, relative to the keypage.
    pub fn set_end_in_units(&mut self, end: f64) -> Result<(), SelectionError> {
        let page = self.page_from_units(end, 0)?;
        self.select([None, Some(page), None, None, None, None])
    }

    fn page_from_units(&self, value: f64, shift: i64) -> Result<usize, SelectionError> {
        let page = self.selection.keypage + (value / self.selection.dz).floor() as i64 + shift;
        usize::try_from(page).map_err(|_| SelectionError::InvalidSelection {
            bounds: self.selection.bounds(),
            reason: "page computed from units is negative",
        })
    }

    pub fn reset_crop(&mut self) {
        let (_, height, width) = self.raw.dim();
        self.selection.reset_crop(height, width);
        self.invalidate();
    }

    pub fn reset_page_range(&mut self) {
        self.selection.reset_pages(self.raw.depth());
        self.invalidate();
    }

    /// Select the whole raw volume again.
    pub fn reset(&mut self) {
        self.reset_crop();
        self.reset_page_range();
        self.invalidate();
    }

    pub fn normalize(&self) -> bool {
        self.normalize
    }

    pub fn set_normalize(&mut self, normalize: bool) {
        self.normalize = normalize;
        self.invalidate();
    }

    pub fn output_type(&self) -> OutputType {
        self.output_type
    }

    pub fn set_output_type(&mut self, output_type: OutputType) {
        self.output_type = output_type;
        self.invalidate();
    }

    /// Replace the backing buffer and select all of it.
    fn reseed(&mut self, data: Samples, sample_type: SampleType) {
        let (depth, height, width) = data.dim();
        self.raw = RawVolume::derived(data, sample_type);
        self.selection.reset_pages(depth);
        self.selection.reset_crop(height, width);
        self.invalidate();
    }

    /// Make the current crop and normalization permanent.
    ///
    /// The previous raw buffer is released; copies made with
    /// [`VolumetricView::copy`] keep it.
    pub fn overwrite_raw(&mut self) {
        let pages = self.pages().to_owned().into_shared();
        let sample_type = self.output_sample_type();
        self.reseed(pages, sample_type);
        self.selection.keypage = (self.raw.depth() / 2) as i64;
    }

    /// Flip the derived view along the page axis and make it the raw buffer.
    ///
    /// The selection, which covered the whole derived view, is reflected to
    /// `[depth - end, depth - start)` of the new buffer, i.e. all of it. The
    /// keypage is mirrored so it still marks the same physical page.
    pub fn reverse_page_order(&mut self) {
        let end = self.selection.end_page() as i64;
        let keypage = self.selection.keypage;
        let reversed = self.pages().slice(s![..;-1, .., ..]).to_owned().into_shared();
        let sample_type = self.output_sample_type();
        self.reseed(reversed, sample_type);
        self.selection.keypage = end - 1 - keypage;
    }

    /// Keep every `stride`-th page of the derived view.
    ///
    /// `dz` doubles regardless of `stride`. The keypage is divided by
    /// `stride`, truncating toward zero, after rebasing it on the first
    /// selected page.
    pub fn downsample(&mut self, stride: usize) -> Result<(), SelectionError> {
        if stride == 0 {
            return Err(SelectionError::InvalidSelection {
                bounds: self.selection.bounds(),
                reason: "stride must be at least 1",
            });
        }
        let start = self.selection.start_page() as i64;
        let keypage = self.selection.keypage;
        let step = stride as isize;
        let kept = self
            .pages()
            .slice(s![..;step, .., ..])
            .to_owned()
            .into_shared();
        let sample_type = self.output_sample_type();
        self.reseed(kept, sample_type);
        self.selection.dz *= 2.0;
        self.selection.keypage = (keypage - start) / stride as i64;
        Ok(())
    }

    /// A new view over the same raw buffer with its own selection and flags.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// A view shaped like the derived pages, every voxel set to `value`.
    pub fn filled_like(&self, value: f64) -> Self {
        let data = Array3::from_elem(self.shape(), value).into_shared();
        let raw = RawVolume::derived(data, self.output_sample_type());
        let mut view = Self::with_scale(raw, self.selection.dx, self.selection.dz);
        view.labels = self.labels.clone();
        view.normalize = self.normalize;
        view.output_type = self.output_type;
        view
    }

    /// Crop to the non-zero rectangle of the first raw page with content.
    pub fn unpad(&mut self) -> Result<(), PaddingError> {
        let padding = self
            .raw
            .data()
            .axis_iter(Axis(0))
            .find_map(|frame| estimate_zero_padding(frame).ok())
            .ok_or(PaddingError::EmptyVolume)?;
        let (rows, cols) = (padding.rows, padding.cols);
        self.set_crop(rows.start, rows.end, cols.start, cols.end)?;
        Ok(())
    }

    /// Call `f` with the whole derived view.
    pub fn apply<R>(&self, f: impl FnOnce(ArrayView3<'_, f64>) -> R) -> R {
        f(self.pages().view())
    }

    /// Call `f` on each derived page, in page order.
    pub fn apply_to_pages<R>(&self, f: impl FnMut(ArrayView2<'_, f64>) -> R) -> Vec<R> {
        self.frames().map(f).collect()
    }

    pub fn frame_count(&self) -> usize {
        self.shape().0
    }

    pub fn frame_at(&self, index: usize) -> Result<ArrayView2<'_, f64>, SelectionError> {
        let len = self.frame_count();
        if index >= len {
            return Err(SelectionError::IndexOutOfRange {
                axis: 0,
                index,
                len,
            });
        }
        Ok(self.pages().index_axis(Axis(0), index))
    }

    pub fn frames(&self) -> impl ExactSizeIterator<Item = ArrayView2<'_, f64>> {
        self.pages().axis_iter(Axis(0))
    }

    /// Number of selected pages, counting the end page as the axis labels do.
    pub fn selection_length(&self) -> usize {
        self.selection.end_page() - self.selection.start_page() + 1
    }

    /// Physical depth of the start and end pages relative to the keypage.
    pub fn range_in_units(&self) -> [f64; 2] {
        let keypage = self.selection.keypage;
        let dz = self.selection.dz;
        [
            (self.selection.start_page() as i64 - keypage) as f64 * dz,
            (self.selection.end_page() as i64 - keypage) as f64 * dz,
        ]
    }

    pub fn max(&self) -> f64 {
        min_max(self.pages().view()).1
    }

    pub fn min(&self) -> f64 {
        min_max(self.pages().view()).0
    }

    pub fn mean(&self) -> f64 {
        self.pages().mean().unwrap_or(f64::NAN)
    }

    /// Population standard deviation.
    pub fn std(&self) -> f64 {
        self.pages().std(0.0)
    }

    /// Maximum intensity projection along `axis`.
    pub fn project_max(&self, axis: PlaneAxis) -> Array2<f64> {
        self.pages()
            .fold_axis(Axis(axis.index()), f64::NEG_INFINITY, |&acc, &v| acc.max(v))
    }
}

impl fmt::Display for VolumetricView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bounds = self.selection.bounds();
        let title = &self.labels.title;
        let units = &self.labels.units;
        if !title.is_empty() {
            write!(f, "\"{title}\" ")?;
        }
        write!(
            f,
            "{} pages of {} (dx=dy={}{units}, dz={}{units}, crop={:?}, page limits={:?})",
            self.frame_count(),
            self.raw.sample_type(),
            self.selection.dx,
            self.selection.dz,
            &bounds[2..],
            &bounds[..2],
        )
    }
}
