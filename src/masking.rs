//! Rasterizing region polygons onto a model grid
//!
//! A grid cell belongs to a region when its centre point lies inside one of the
//! region's polygons. Centres on an edge follow a half-open rule: left and
//! bottom edges are inside, right and top edges are not, so a cell on the
//! border of two neighbouring basins lands in exactly one of them. Masks are
//! rebuilt for every (file, region) pair because grids may differ between files.

use crate::catalog::{RegionId, RegionPolygon};
use crate::errors::{Result, ZonalError};
use geo::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{BoundingRect, Coord, MultiPolygon, Rect};
use ndarray::{Array2, Array3, ArrayView2, Axis, Zip};

/// Boolean membership per (polygon, lat, lon)
#[derive(Debug, Clone)]
pub struct RegionMask {
    pub ids: Vec<RegionId>,
    pub mask: Array3<bool>,
}

impl RegionMask {
    /// Rasterizes each polygon of a region subset against cell centres.
    ///
    /// # Errors
    ///
    /// Returns [`ZonalError::InvalidGrid`] if the longitude and latitude grids
    /// differ in shape.
    pub fn rasterize(
        polygons: &[&RegionPolygon],
        lon: ArrayView2<'_, f64>,
        lat: ArrayView2<'_, f64>,
    ) -> Result<Self> {
        if lon.shape() != lat.shape() {
            return Err(ZonalError::grid(format!(
                "longitude grid {:?} and latitude grid {:?} differ in shape",
                lon.shape(),
                lat.shape()
            )));
        }

        let (ny, nx) = lon.dim();
        let mut mask = Array3::from_elem((polygons.len(), ny, nx), false);

        for (layer, polygon) in mask.outer_iter_mut().zip(polygons) {
            let Some(bounds) = polygon.geometry.bounding_rect() else {
                continue;
            };
            Zip::from(layer)
                .and(&lon)
                .and(&lat)
                .for_each(|inside, &x, &y| {
                    *inside = within_rect(&bounds, x, y) && covers_centre(&polygon.geometry, x, y);
                });
        }

        Ok(Self {
            ids: polygons.iter().map(|p| p.id.clone()).collect(),
            mask,
        })
    }

    /// Cells covered by any polygon of the region
    #[must_use]
    pub fn union(&self) -> Array2<bool> {
        let (_, ny, nx) = self.mask.dim();
        self.mask
            .axis_iter(Axis(0))
            .fold(Array2::from_elem((ny, nx), false), |mut acc, layer| {
                Zip::from(&mut acc).and(&layer).for_each(|a, &b| *a |= b);
                acc
            })
    }

    /// Number of cells inside the region
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.union().iter().filter(|&&inside| inside).count()
    }
}

/// Offsets used to decide which side of an edge a centre belongs to. The two
/// components differ so the offset never runs along a 45 degree edge.
const EDGE_NUDGE: (f64, f64) = (1e-9, 0.618e-9);

/// Point-in-polygon test with half-open edges.
///
/// A centre on the boundary is resolved by looking a hair to the north-east:
/// it counts only if the polygon continues there.
fn covers_centre(geometry: &MultiPolygon<f64>, x: f64, y: f64) -> bool {
    match geometry.coordinate_position(&Coord { x, y }) {
        CoordPos::Inside => true,
        CoordPos::Outside => false,
        CoordPos::OnBoundary => {
            let scale = x.abs().max(y.abs()).max(1.0);
            let ahead = Coord {
                x: x + EDGE_NUDGE.0 * scale,
                y: y + EDGE_NUDGE.1 * scale,
            };
            geometry.coordinate_position(&ahead) == CoordPos::Inside
        }
    }
}

fn within_rect(rect: &Rect<f64>, x: f64, y: f64) -> bool {
    x >= rect.min().x && x <= rect.max().x && y >= rect.min().y && y <= rect.max().y
}

/// Brings grid longitudes into the convention used by the polygons.
///
/// Grids on `[0, 360)` are shifted to `[-180, 180)` when the polygons never
/// cross 180; grids on `[-180, 180)` are shifted to `[0, 360)` when the
/// polygons extend beyond 180.
#[must_use]
pub fn wrap_longitudes(lon: ArrayView2<'_, f64>, polygon_bounds: Option<Rect<f64>>) -> Array2<f64> {
    let Some(bounds) = polygon_bounds else {
        return lon.to_owned();
    };

    let grid_east_of_180 = lon.iter().any(|&x| x > 180.0);
    let grid_west_of_0 = lon.iter().any(|&x| x < 0.0);

    if grid_east_of_180 && bounds.max().x <= 180.0 {
        lon.mapv(|x| if x >= 180.0 { x - 360.0 } else { x })
    } else if grid_west_of_0 && bounds.max().x > 180.0 && bounds.min().x >= 0.0 {
        lon.mapv(|x| if x < 0.0 { x + 360.0 } else { x })
    } else {
        lon.to_owned()
    }
}
