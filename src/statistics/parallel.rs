//! Parallel computation implementations for zonal reductions
//!
//! Each time group of a `(time, lat, lon)` grid is reduced independently, so
//! groups are spread across the Rayon pool and collected back in order.

use super::operations::StatOperation;
use ndarray::{Array2, Array3, Axis};
use rayon::prelude::*;

/// Reduces each group of time steps over the cells selected by `mask`.
///
/// `groups` lists the time-step indices sharing one timestamp; most groups
/// hold a single step. Cells outside the mask and non-finite cells are
/// ignored, and a group with no usable cell yields `NaN`. The output has one
/// entry per group, in group order.
pub fn parallel_masked_reduce(
    data: &Array3<f64>,
    mask: &Array2<bool>,
    groups: &[Vec<usize>],
    operation: StatOperation,
) -> Vec<f64> {
    let members: Vec<(usize, usize)> = mask
        .indexed_iter()
        .filter_map(|(index, &inside)| inside.then_some(index))
        .collect();

    log::debug!(
        "Computing {} over {} cells for {} time groups across {} threads",
        operation.as_str(),
        members.len(),
        groups.len(),
        rayon::current_num_threads()
    );

    groups
        .par_iter()
        .map(|steps| {
            let cells = steps.iter().flat_map(|&t| {
                let step = data.index_axis(Axis(0), t);
                members.iter().map(move |&(j, i)| step[[j, i]])
            });
            operation.apply(cells)
        })
        .collect()
}
