use std::ops::Range;

use thiserror::Error;

/// Partial update of a selection, in
/// `[start_page, end_page, row_start, row_end, col_start, col_end]` order.
/// `None` keeps the current value.
pub type Region = [Option<usize>; 6];

#[derive(Clone, Debug, Error, PartialEq)]
pub enum SelectionError {
    #[error("Invalid selection {bounds:?}: {reason}")]
    InvalidSelection {
        bounds: [usize; 6],
        reason: &'static str,
    },

    #[error("Index {index} is out of range for axis {axis} of length {len}")]
    IndexOutOfRange {
        axis: usize,
        index: usize,
        len: usize,
    },
}

/// The half-open sub-box of the raw volume exposed by a view, plus the
/// physical calibration of the depth axis.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionState {
    bounds: [usize; 6],
    /// Raw page index at which the depth axis reads zero.
    pub keypage: i64,
    /// In-plane size of a pixel, in physical units.
    pub dx: f64,
    /// Axial size of a pixel, in physical units.
    pub dz: f64,
}

impl SelectionState {
    /// Select the whole of a `(depth, height, width)` volume.
    pub fn full(dim: (usize, usize, usize), dx: f64, dz: f64) -> Self {
        let (depth, height, width) = dim;
        Self {
            bounds: [0, depth, 0, height, 0, width],
            keypage: (depth / 2) as i64,
            dx,
            dz,
        }
    }

    pub fn bounds(&self) -> [usize; 6] {
        self.bounds
    }

    pub fn start_page(&self) -> usize {
        self.bounds[0]
    }

    pub fn end_page(&self) -> usize {
        self.bounds[1]
    }

    pub fn pages(&self) -> Range<usize> {
        self.bounds[0]..self.bounds[1]
    }

    pub fn rows(&self) -> Range<usize> {
        self.bounds[2]..self.bounds[3]
    }

    pub fn cols(&self) -> Range<usize> {
        self.bounds[4]..self.bounds[5]
    }

    /// Shape of the selected sub-volume.
    pub fn shape(&self) -> (usize, usize, usize) {
        let [p0, p1, r0, r1, c0, c1] = self.bounds;
        (p1 - p0, r1 - r0, c1 - c0)
    }

    /// Apply `region` against a volume of dimensions `dim`.
    ///
    /// The update is all-or-nothing: on error the state is left untouched.
    pub fn apply(
        &mut self,
        region: Region,
        dim: (usize, usize, usize),
    ) -> Result<(), SelectionError> {
        let mut bounds = self.bounds;
        for (field, value) in bounds.iter_mut().zip(region) {
            if let Some(value) = value {
                *field = value;
            }
        }
        Self::validate(bounds, dim)?;
        self.bounds = bounds;
        Ok(())
    }

    fn validate(bounds: [usize; 6], dim: (usize, usize, usize)) -> Result<(), SelectionError> {
        let (depth, height, width) = dim;
        let axes = [
            (bounds[0], bounds[1], depth),
            (bounds[2], bounds[3], height),
            (bounds[4], bounds[5], width),
        ];
        for (start, end, len) in axes {
            if end <= start {
                return Err(SelectionError::InvalidSelection {
                    bounds,
                    reason: "end must be greater than start",
                });
            }
            if end > len {
                return Err(SelectionError::InvalidSelection {
                    bounds,
                    reason: "end exceeds the volume extent",
                });
            }
        }
        Ok(())
    }

    pub(crate) fn reset_pages(&mut self, depth: usize) {
        self.bounds[0] = 0;
        self.bounds[1] = depth;
    }

    pub(crate) fn reset_crop(&mut self, height: usize, width: usize) {
        self.bounds[2..].copy_from_slice(&[0, height, 0, width]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_extent() {
        let state = SelectionState::full((10, 4, 6), 1.0, 0.5);
        assert_eq!(state.bounds(), [0, 10, 0, 4, 0, 6]);
        assert_eq!(state.keypage, 5);
        assert_eq!(state.shape(), (10, 4, 6));
    }

    #[test]
    fn test_apply_keeps_unspecified_fields() {
        let mut state = SelectionState::full((10, 4, 6), 1.0, 1.0);
        state
            .apply([Some(2), None, None, Some(3), Some(1), None], (10, 4, 6))
            .unwrap();
        assert_eq!(state.bounds(), [2, 10, 0, 3, 1, 6]);
        assert_eq!(state.pages(), 2..10);
        assert_eq!(state.rows(), 0..3);
        assert_eq!(state.cols(), 1..6);
    }

    #[test]
    fn test_apply_is_atomic() {
        let mut state = SelectionState::full((10, 4, 6), 1.0, 1.0);
        let err = state
            .apply([Some(2), Some(1), Some(1), None, None, None], (10, 4, 6))
            .unwrap_err();
        assert!(matches!(err, SelectionError::InvalidSelection { .. }));
        assert_eq!(state.bounds(), [0, 10, 0, 4, 0, 6]);

        assert!(state.apply([None, Some(11), None, None, None, None], (10, 4, 6)).is_err());
        assert!(state.apply([None, None, None, None, Some(6), None], (10, 4, 6)).is_err());
        assert_eq!(state.bounds(), [0, 10, 0, 4, 0, 6]);
    }
}
