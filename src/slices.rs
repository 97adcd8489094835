use crate::enums::PlaneAxis;
use crate::selection::SelectionError;
use crate::volume::VolumetricView;

use ndarray::{ArrayView2, s};

/// A point in the derived view. Unset coordinates default to the middle of
/// their axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlicePoint {
    /// Page index.
    pub z: Option<usize>,
    /// Row index.
    pub v: Option<usize>,
    /// Column index.
    pub h: Option<usize>,
}

impl SlicePoint {
    pub fn new(z: usize, v: usize, h: usize) -> Self {
        Self {
            z: Some(z),
            v: Some(v),
            h: Some(h),
        }
    }

    pub fn center() -> Self {
        Self::default()
    }
}

/// The three axis-aligned planes through a point, borrowed from the view.
#[derive(Clone, Debug)]
pub struct OrthogonalSlices<'a> {
    /// `(rows, cols)` plane of page `z`.
    pub depth_plane: ArrayView2<'a, f64>,
    /// `(pages, rows)` plane at column `h`.
    pub vertical_plane: ArrayView2<'a, f64>,
    /// `(pages, cols)` plane at row `v`.
    pub horizontal_plane: ArrayView2<'a, f64>,
    /// The resolved point, `(z, v, h)`.
    pub point: (usize, usize, usize),
}

impl<'a> OrthogonalSlices<'a> {
    /// `(rows, pages)` orientation of the vertical plane.
    pub fn vertical_plane_t(&self) -> ArrayView2<'a, f64> {
        self.vertical_plane.reversed_axes()
    }

    /// `(cols, pages)` orientation of the horizontal plane.
    pub fn horizontal_plane_t(&self) -> ArrayView2<'a, f64> {
        self.horizontal_plane.reversed_axes()
    }

    pub fn plane(&self, axis: PlaneAxis) -> ArrayView2<'a, f64> {
        match axis {
            PlaneAxis::Depth => self.depth_plane,
            PlaneAxis::Vertical => self.vertical_plane,
            PlaneAxis::Horizontal => self.horizontal_plane,
        }
    }
}

/// Extract the planes of `view`'s derived pages passing through `point`.
///
/// # Errors
///
/// Returns [`SelectionError::IndexOutOfRange`] if a coordinate falls outside
/// the derived shape.
pub fn orthogonal_slices(
    view: &VolumetricView,
    point: SlicePoint,
) -> Result<OrthogonalSlices<'_>, SelectionError> {
    let (depth, height, width) = view.shape();
    let resolve = |axis: usize, coord: Option<usize>, len: usize| {
        let index = coord.unwrap_or(len / 2);
        if index < len {
            Ok(index)
        } else {
            Err(SelectionError::IndexOutOfRange { axis, index, len })
        }
    };
    let z = resolve(0, point.z, depth)?;
    let v = resolve(1, point.v, height)?;
    let h = resolve(2, point.h, width)?;

    let pages = view.pages();
    Ok(OrthogonalSlices {
        depth_plane: pages.slice(s![z, .., ..]),
        vertical_plane: pages.slice(s![.., .., h]),
        horizontal_plane: pages.slice(s![.., v, ..]),
        point: (z, v, h),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw_volume::RawVolume;
    use ndarray::Array;

    fn cube_view() -> VolumetricView {
        let data = Array::from_shape_fn((4, 4, 4), |(z, y, x)| (z * 16 + y * 4 + x) as u8);
        VolumetricView::new(RawVolume::from_array(&data).unwrap())
    }

    #[test]
    fn test_planes_through_point() {
        let view = cube_view();
        let slices = orthogonal_slices(&view, SlicePoint::new(2, 2, 2)).unwrap();
        assert_eq!(slices.depth_plane.dim(), (4, 4));
        assert_eq!(slices.vertical_plane.dim(), (4, 4));
        assert_eq!(slices.horizontal_plane.dim(), (4, 4));

        assert_eq!(slices.depth_plane[[1, 3]], (32 + 4 + 3) as f64);
        assert_eq!(slices.vertical_plane[[1, 3]], (16 + 12 + 2) as f64);
        assert_eq!(slices.horizontal_plane[[1, 3]], (16 + 8 + 3) as f64);
    }

    #[test]
    fn test_transposed_planes() {
        let view = cube_view();
        let slices = orthogonal_slices(&view, SlicePoint::new(2, 2, 2)).unwrap();
        assert_eq!(slices.vertical_plane_t(), slices.vertical_plane.t());
        assert_eq!(slices.horizontal_plane_t(), slices.horizontal_plane.t());
        assert_eq!(slices.vertical_plane_t()[[3, 1]], slices.vertical_plane[[1, 3]]);
    }

    #[test]
    fn test_planes_are_views_of_cache() {
        let view = cube_view();
        let slices = orthogonal_slices(&view, SlicePoint::new(0, 0, 0)).unwrap();
        assert_eq!(slices.depth_plane.as_ptr(), view.pages().as_ptr());
    }

    #[test]
    fn test_default_point_is_center_of_selection() {
        let mut view = cube_view();
        view.select([Some(1), Some(4), Some(0), Some(2), None, None])
            .unwrap();
        let slices = orthogonal_slices(&view, SlicePoint::center()).unwrap();
        assert_eq!(slices.point, (1, 1, 2));
        assert_eq!(slices.plane(PlaneAxis::Vertical).dim(), (3, 2));
        assert_eq!(slices.plane(PlaneAxis::Horizontal).dim(), (3, 4));
    }

    #[test]
    fn test_out_of_range() {
        let mut view = cube_view();
        view.set_page_range(0, 2).unwrap();
        let err = orthogonal_slices(&view, SlicePoint::new(2, 0, 0)).unwrap_err();
        assert_eq!(
            err,
            SelectionError::IndexOutOfRange {
                axis: 0,
                index: 2,
                len: 2
            }
        );
    }
}
