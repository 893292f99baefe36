//! Mapping a rectangular bin region to the block numbers that cover it.
//!
//! Two numbering schemes exist. Interchromosomal matrices (all versions)
//! and intrachromosomal matrices up to version 8 tile the matrix as a
//! square grid: block number = `row * blockColumnCount + col`, with the
//! intrachromosomal case also covering the region's reflection across the
//! diagonal, because only the upper triangle is stored.
//!
//! Version 9 intrachromosomal matrices tile along the diagonal instead:
//! block number = `depth * blockColumnCount + position`, where `position`
//! advances along the diagonal and `depth` grows logarithmically with the
//! distance from it.

use std::collections::BTreeSet;
use std::f64::consts::SQRT_2;

/// Block numbers covering `region` under the square-grid scheme.
///
/// `region` is `[col1, col2, row1, row2]` in bin units, inclusive. When
/// `intra` is set the reflected rectangle is covered as well.
pub(crate) fn blocks_for_region(
    region: [i64; 4],
    block_bin_count: i32,
    block_column_count: i32,
    intra: bool,
) -> BTreeSet<i32> {
    let bins = i64::from(block_bin_count);
    let columns = i64::from(block_column_count);
    let col1 = region[0] / bins;
    let col2 = (region[1] + 1) / bins;
    let row1 = region[2] / bins;
    let row2 = (region[3] + 1) / bins;

    let mut blocks = BTreeSet::new();
    for row in row1..=row2 {
        for col in col1..=col2 {
            blocks.insert((row * columns + col) as i32);
        }
    }
    if intra {
        for row in col1..=col2 {
            for col in row1..=row2 {
                blocks.insert((row * columns + col) as i32);
            }
        }
    }
    blocks
}

/// Block numbers covering `region` under the version-9 intrachromosomal
/// depth/position scheme.
pub(crate) fn blocks_for_region_v9_intra(
    region: [i64; 4],
    block_bin_count: i32,
    block_column_count: i32,
) -> BTreeSet<i32> {
    let bins = i64::from(block_bin_count);
    let columns = i64::from(block_column_count);

    let lower_position = (region[0] + region[2]) / 2 / bins;
    let higher_position = (region[1] + region[3]) / 2 / bins + 1;

    let depth = |a: i64, b: i64| {
        (1.0 + (a - b).abs() as f64 / SQRT_2 / bins as f64).log2() as i64
    };
    let nearer = depth(region[0], region[3]);
    let further = depth(region[1], region[2]);

    let mut nearer_depth = nearer.min(further);
    // a region straddling the diagonal always touches depth zero
    if (region[0] > region[3] && region[1] < region[2])
        || (region[1] > region[2] && region[0] < region[3])
    {
        nearer_depth = 0;
    }
    let further_depth = nearer.max(further) + 1;

    let mut blocks = BTreeSet::new();
    for depth in nearer_depth..=further_depth {
        for position in lower_position..=higher_position {
            blocks.insert((depth * columns + position) as i32);
        }
    }
    blocks
}
