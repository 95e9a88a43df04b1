//! CPU reference of the cell-mosaic fragment algorithm.
//!
//! The GPU evaluates this per fragment; the functions here mirror it step for
//! step in `f32` so the cell ownership rule can be inspected and tested
//! without a device. Results can differ from a GPU in the last bits of `sin`
//! for large arguments, so comparisons against rendered pixels should go
//! through the sampled colour, not the raw hash.

/// Cells per unit of clip space.
pub const CELL_FACTOR: f32 = 40.0;

/// Coefficients of the first hash component: `s.x * HASH_X[0] + s.y * HASH_X[1]`.
#[allow(clippy::excessive_precision)]
pub const HASH_X: [f32; 2] = [2345.678, 3488982.394];

/// Coefficients of the second hash component: `s.y * HASH_Y[0] + s.x * HASH_Y[1]`.
#[allow(clippy::excessive_precision)]
pub const HASH_Y: [f32; 2] = [38859.234, 129384.22];

/// Running minimum the neighbour search starts from.
pub const INITIAL_DISTANCE: f32 = 100.0;

/// Result of evaluating one fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSample {
    /// Integer coordinate of the winning cell, in cell space.
    pub cell: [f32; 2],
    /// Distance from the fragment to the winning feature point.
    pub distance: f32,
    /// Texture coordinate the fragment samples, already flipped to image rows.
    pub uv: [f32; 2],
}

/// Pseudo-random feature point offset inside the cell identified by `seed`.
pub fn feature_offset(seed: [f32; 2]) -> [f32; 2] {
    [
        fract((seed[0] * HASH_X[0] + seed[1] * HASH_X[1]).sin()),
        fract((seed[1] * HASH_Y[0] + seed[0] * HASH_Y[1]).sin()),
    ]
}

/// Nearest-feature-point evaluation at a fixed cell density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellNoise {
    factor: f32,
}

impl Default for CellNoise {
    fn default() -> Self {
        Self::new(CELL_FACTOR)
    }
}

impl CellNoise {
    pub fn new(factor: f32) -> Self {
        Self { factor }
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// Finds the owning cell for a point already scaled into cell space.
    ///
    /// Returns the cell coordinate and the distance to its feature point.
    pub fn nearest_cell(&self, uv: [f32; 2]) -> ([f32; 2], f32) {
        self.nearest_cell_with(uv, feature_offset)
    }

    /// Same search as [`CellNoise::nearest_cell`] with a caller-supplied hash.
    ///
    /// Neighbours are visited row by row (y outer, x inner, both -1..=1) and a
    /// candidate only wins when strictly closer, so on a tie the first cell
    /// visited keeps ownership.
    pub fn nearest_cell_with<H>(&self, uv: [f32; 2], hash: H) -> ([f32; 2], f32)
    where
        H: Fn([f32; 2]) -> [f32; 2],
    {
        let id = [uv[0].floor(), uv[1].floor()];
        let gv = [fract(uv[0]), fract(uv[1])];

        let mut min_dist = INITIAL_DISTANCE;
        let mut cell = id;
        for y in -1..=1 {
            for x in -1..=1 {
                let offset = [x as f32, y as f32];
                let neighbour = [id[0] + offset[0], id[1] + offset[1]];
                let jitter = hash(neighbour);
                let point = [offset[0] + jitter[0], offset[1] + jitter[1]];
                let d = length([gv[0] - point[0], gv[1] - point[1]]);
                if d < min_dist {
                    min_dist = d;
                    cell = neighbour;
                }
            }
        }
        (cell, min_dist)
    }

    /// Evaluates the fragment at clip-space position `p`.
    pub fn sample(&self, p: [f32; 2]) -> CellSample {
        let (cell, distance) = self.nearest_cell([p[0] * self.factor, p[1] * self.factor]);
        CellSample {
            cell,
            distance,
            uv: self.texture_coord(cell),
        }
    }

    /// Maps a cell back to image space, flipping rows so v = 0 is the top.
    pub fn texture_coord(&self, cell: [f32; 2]) -> [f32; 2] {
        let tex = [
            (cell[0] / self.factor) * 0.5 + 0.5,
            (cell[1] / self.factor) * 0.5 + 0.5,
        ];
        [tex[0], 1.0 - tex[1]]
    }
}

fn fract(value: f32) -> f32 {
    value - value.floor()
}

fn length(v: [f32; 2]) -> f32 {
    (v[0] * v[0] + v[1] * v[1]).sqrt()
}
