use std::ops::Range;

use crate::selection::SelectionError;

use ndarray::{ArrayView2, Axis, s};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PaddingError {
    #[error("The volume has no non-zero content")]
    EmptyVolume,

    #[error(transparent)]
    Selection(#[from] SelectionError),
}

/// Half-open bounding rectangle of the non-zero content of a frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Padding {
    pub rows: Range<usize>,
    pub cols: Range<usize>,
}

/// Find the rows and columns that carry any non-zero pixel.
///
/// # Errors
///
/// Returns [`PaddingError::EmptyVolume`] if every pixel is zero.
pub fn estimate_zero_padding(frame: ArrayView2<'_, f64>) -> Result<Padding, PaddingError> {
    let rows = non_zero_span(frame, Axis(0)).ok_or(PaddingError::EmptyVolume)?;
    let cols = non_zero_span(frame, Axis(1)).ok_or(PaddingError::EmptyVolume)?;
    Ok(Padding { rows, cols })
}

fn non_zero_span(frame: ArrayView2<'_, f64>, axis: Axis) -> Option<Range<usize>> {
    let occupied: Vec<bool> = frame
        .axis_iter(axis)
        .map(|lane| lane.iter().any(|&v| v != 0.0))
        .collect();
    let first = occupied.iter().position(|&o| o)?;
    let last = occupied.iter().rposition(|&o| o)?;
    Some(first..last + 1)
}

/// View of `frame` without its zero borders.
pub fn unpad(frame: ArrayView2<'_, f64>) -> Result<ArrayView2<'_, f64>, PaddingError> {
    let Padding { rows, cols } = estimate_zero_padding(frame)?;
    Ok(frame.slice_move(s![rows, cols]))
}
