// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The adaptive subdivision renderer: border tracing, quadtree
//! recursion, and flood filling.
//!
//! The image is carved into fixed-size tiles, and each tile walked as
//! a quadtree.  For every cell the renderer establishes the
//! membership classification of the cell's border, one pixel at a
//! time, drawing the members as it goes.  A border that is uniformly
//! inside means the interior can be flood-filled without another
//! membership test.  A uniformly *outside* border is weaker evidence:
//! filament pixels can sit strictly inside a cell without touching
//! its border, so an outside cell is accepted only when the exterior
//! distance estimate certifies that the set boundary cannot reach the
//! cell at all.  Everything else splits into quarters and the
//! question recurses.  Below a minimum cell size the renderer stops
//! arguing and tests every interior pixel.
//!
//! Cells own their right and bottom border rows; their top and left
//! borders are the bottom and right rows of the neighbors above and
//! to the left (clamped at the image edge).  Because tiles run in
//! row-major order and children in top-left, top-right, bottom-left,
//! bottom-right order, a cell whose edge is flagged as already known
//! can read the neighbor's pixels back out of the bitmap instead of
//! recomputing them -- by the time it looks, the writer is
//! unconditionally done.  Border pixels are authoritative once
//! written and are never redrawn.

use bitmap::Bitmap;
use distance::{estimate, DistanceEstimate};
use escape::is_member;
use num::Complex;
use viewport::Viewport;

/// Which of a cell's four border edges were already computed by a
/// parent, a sibling, or a previously processed tile, and can be
/// read back from the bitmap instead of re-evaluated.
#[derive(Clone, Copy, Debug)]
struct Edges {
    top: bool,
    right: bool,
    bottom: bool,
    left: bool,
}

// After a parent's border trace, all four parent edges hold
// authoritative bits, and each earlier child leaves its own right and
// bottom borders behind for the later ones.  So the flags per child
// are fixed, provided the children run in exactly this order.
const TOP_LEFT: Edges = Edges {
    top: true,
    right: false,
    bottom: false,
    left: true,
};
const TOP_RIGHT: Edges = Edges {
    top: true,
    right: true,
    bottom: false,
    left: true,
};
const BOTTOM_LEFT: Edges = Edges {
    top: true,
    right: false,
    bottom: true,
    left: true,
};
const BOTTOM_RIGHT: Edges = Edges {
    top: true,
    right: true,
    bottom: true,
    left: true,
};

/// Counters describing how a render call spent its time.  The
/// interesting ratio is `oracle_calls` against the pixel count: the
/// whole point of subdivision is to keep it far below 1.0.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RenderStats {
    /// Quadtree cells visited, tiles included.
    pub cells: usize,
    /// Escape-time membership tests performed.
    pub oracle_calls: usize,
    /// Cells proven uniform and flood-filled (or left empty).
    pub flood_fills: usize,
    /// Cells that bottomed out at per-pixel evaluation.
    pub exact_cells: usize,
    /// Cells classified wholesale by the distance estimator.
    pub distance_skips: usize,
    /// Distance-estimator orbit evaluations.  These cost about as
    /// much as a membership test each but are not counted in
    /// `oracle_calls`.
    pub estimator_calls: usize,
}

/// Fatal precondition violations at the render boundary.  These are
/// design-time contract errors, not recoverable conditions.
#[derive(Debug, Fail)]
pub enum RenderError {
    /// The caller supplied a surface smaller than the image the
    /// viewport describes.
    #[fail(
        display = "surface is {}x{} pixels but the viewport needs {}x{}",
        surface_width, surface_height, viewport_width, viewport_height
    )]
    SurfaceTooSmall {
        /// Width of the supplied surface.
        surface_width: usize,
        /// Height of the supplied surface.
        surface_height: usize,
        /// Width the viewport requires.
        viewport_width: usize,
        /// Height the viewport requires.
        viewport_height: usize,
    },
}

/// The renderer's configuration.  Construction is cheap and the
/// struct is immutable during a render call; the bitmap passed to
/// [`render`] is the only thing that mutates.
///
/// [`render`]: struct.MarianiRenderer.html#method.render
#[derive(Clone, Copy, Debug)]
pub struct MarianiRenderer {
    limit: usize,
    tile_size: usize,
    min_cell: usize,
    distance_estimate: bool,
}

impl MarianiRenderer {
    /// A renderer with the reference geometry: 80-pixel tiles,
    /// 10-pixel minimum cells, distance estimation off.  `limit` is
    /// the iteration budget handed to the membership test.
    pub fn new(limit: usize) -> MarianiRenderer {
        MarianiRenderer {
            limit,
            tile_size: 80,
            min_cell: 10,
            distance_estimate: false,
        }
    }

    /// Use `size`-pixel square tiles at the top level.
    pub fn tile_size(mut self, size: usize) -> MarianiRenderer {
        self.tile_size = size;
        self
    }

    /// Stop subdividing below `size` pixels and evaluate per-pixel.
    pub fn min_cell(mut self, size: usize) -> MarianiRenderer {
        self.min_cell = size;
        self
    }

    /// Enable the distance-estimator fast path, which classifies
    /// whole cells far from the set boundary without tracing their
    /// borders.  Off by default: it trades exact agreement with the
    /// per-pixel test for speed in flat regions.
    pub fn distance_estimate(mut self, enabled: bool) -> MarianiRenderer {
        self.distance_estimate = enabled;
        self
    }

    /// Render the viewport's region of the plane into `frame`,
    /// setting the bit of every pixel classified inside the set.
    /// The frame is exclusively borrowed for the duration of the
    /// call and is the only state the render mutates.
    ///
    /// A degenerate viewport renders nothing and succeeds; a frame
    /// smaller than the viewport is a contract violation and fails.
    pub fn render(
        &self,
        viewport: &Viewport,
        frame: &mut Bitmap,
    ) -> Result<RenderStats, RenderError> {
        let width = viewport.width();
        let height = viewport.height();
        if frame.width() < width || frame.height() < height {
            return Err(RenderError::SurfaceTooSmall {
                surface_width: frame.width(),
                surface_height: frame.height(),
                viewport_width: width,
                viewport_height: height,
            });
        }
        if viewport.is_degenerate() {
            debug!("degenerate viewport, nothing to render");
            return Ok(RenderStats::default());
        }

        let tile = self.tile_size;
        let tiled_width = if tile == 0 { 0 } else { width - width % tile };
        let tiled_height = if tile == 0 { 0 } else { height - height % tile };

        let mut raster = Raster {
            viewport,
            frame,
            limit: self.limit,
            min_cell: self.min_cell,
            distance_estimate: self.distance_estimate,
            stats: RenderStats::default(),
        };

        if tile > 0 {
            // Row-major tile order; an interior tile's top and left
            // borders were drawn by the tile row above and the tile
            // to its left.
            for (y, x) in iproduct!(
                (0..tiled_height).step_by(tile),
                (0..tiled_width).step_by(tile)
            ) {
                let known = Edges {
                    top: y != 0,
                    right: false,
                    bottom: false,
                    left: x != 0,
                };
                raster.subdivide(x, y, tile, known);
            }
        }

        // Dimensions the tile grid doesn't divide leave right and
        // bottom remainder strips; those get the per-pixel treatment
        // so the partition of the image stays exact.
        for row in 0..height {
            for column in tiled_width..width {
                raster.probe_and_draw(column, row);
            }
        }
        for row in tiled_height..height {
            for column in 0..tiled_width {
                raster.probe_and_draw(column, row);
            }
        }

        let stats = raster.stats;
        debug!("render complete: {:?}", stats);
        Ok(stats)
    }
}

/// One render call's working state: the viewport, the exclusively
/// borrowed frame, and the configuration, threaded through the
/// recursion instead of any global.
struct Raster<'a> {
    viewport: &'a Viewport,
    frame: &'a mut Bitmap,
    limit: usize,
    min_cell: usize,
    distance_estimate: bool,
    stats: RenderStats,
}

impl<'a> Raster<'a> {
    /// The membership test for one pixel, sampled at its center.
    fn probe(&mut self, column: usize, row: usize) -> bool {
        self.stats.oracle_calls += 1;
        is_member(self.viewport.pixel_center(column, row), self.limit)
    }

    fn probe_and_draw(&mut self, column: usize, row: usize) {
        if self.probe(column, row) {
            self.frame.set(column, row);
        }
    }

    /// Process the cell at (x, y) with side `n`.  Termination is
    /// structural: every path either halves `n` or bottoms out, and
    /// odd sizes that cannot halve cleanly go per-pixel.
    fn subdivide(&mut self, x: usize, y: usize, n: usize, known: Edges) {
        if n == 0 {
            return;
        }
        self.stats.cells += 1;

        if self.distance_estimate && self.classify_by_distance(x, y, n) {
            return;
        }

        let (first, split) = self.trace_border(x, y, n, known);

        if !split {
            if first {
                self.flood_fill(x, y, n);
                return;
            }
            // An all-outside border does not prove an all-outside
            // interior: an isolated filament pixel can sit strictly
            // inside the cell.  Accept the cell only when the
            // exterior distance estimate rules that out; otherwise
            // keep looking inside.  With the fast path on the same
            // estimate already failed to certify this cell, so don't
            // repeat it.
            if !self.distance_estimate && self.confirm_exterior(x, y, n) {
                self.stats.flood_fills += 1;
                return;
            }
        }
        if n < self.min_cell || n % 2 != 0 {
            self.pixel_exact(x, y, n);
            return;
        }

        let half = n / 2;
        self.subdivide(x, y, half, TOP_LEFT);
        self.subdivide(x + half, y, half, TOP_RIGHT);
        self.subdivide(x, y + half, half, BOTTOM_LEFT);
        self.subdivide(x + half, y + half, half, BOTTOM_RIGHT);
    }

    /// Walk the cell's four border edges, drawing member pixels on
    /// the edges that haven't been computed yet and reading the rest
    /// back.  Returns the reference classification and whether any
    /// border pixel disagreed with it.
    ///
    /// Fresh edges are scanned to the end even after a disagreement:
    /// their pixels must land in the bitmap either way, because a
    /// later sibling will treat this edge as known.
    fn trace_border(&mut self, x: usize, y: usize, n: usize, known: Edges) -> (bool, bool) {
        // The top and left borders sit one pixel outside the cell,
        // except along the image edge where they clamp to the cell's
        // own first row and column.
        let c = if x == 0 { x } else { x - 1 };
        let r = if y == 0 { y } else { y - 1 };

        let first = if known.top {
            self.frame.get(c, r)
        } else {
            self.probe(c, r)
        };
        let mut split = false;

        if !known.top {
            for i in 0..n {
                let inside = self.probe(x + i, r);
                if inside != first {
                    split = true;
                }
                if inside {
                    self.frame.set(x + i, r);
                }
            }
        }
        if !known.right {
            for i in 0..n {
                let inside = self.probe(x + n - 1, y + i);
                if inside != first {
                    split = true;
                }
                if inside {
                    self.frame.set(x + n - 1, y + i);
                }
            }
        }
        if !known.bottom {
            for i in 0..n {
                let inside = self.probe(x + i, y + n - 1);
                if inside != first {
                    split = true;
                }
                if inside {
                    self.frame.set(x + i, y + n - 1);
                }
            }
        }
        if !known.left {
            for i in 0..n {
                let inside = self.probe(c, y + i);
                if inside != first {
                    split = true;
                }
                if inside {
                    self.frame.set(c, y + i);
                }
            }
        }

        if !split {
            // Check the known edges by reading back.  Interleaving
            // the four walks visits all four corners in the first
            // iterations, and corners are where disagreements live,
            // so the early exit usually triggers immediately.
            for i in 0..n {
                if known.top && self.frame.get(x + i, r) != first {
                    split = true;
                    break;
                }
                if known.right && self.frame.get(x + n - 1, y + i) != first {
                    split = true;
                    break;
                }
                if known.bottom && self.frame.get(x + n - 1 - i, y + n - 1) != first {
                    split = true;
                    break;
                }
                if known.left && self.frame.get(c, y + n - 1 - i) != first {
                    split = true;
                    break;
                }
            }
        }

        (first, split)
    }

    /// Paint the interior of a cell whose border was uniformly
    /// inside.  The border pixels were drawn during tracing and are
    /// not touched.
    fn flood_fill(&mut self, x: usize, y: usize, n: usize) {
        self.stats.flood_fills += 1;
        let c = if x == 0 { x } else { x - 1 };
        let r = if y == 0 { y } else { y - 1 };
        for row in r + 1..y + n - 1 {
            for column in c + 1..x + n - 1 {
                self.frame.set(column, row);
            }
        }
    }

    /// The recursion's base case: evaluate every interior pixel of
    /// the cell individually.  The ranges exclude the border pixels,
    /// which are already drawn -- including the cell's own first row
    /// and column when it sits on the image edge.
    fn pixel_exact(&mut self, x: usize, y: usize, n: usize) {
        self.stats.exact_cells += 1;
        let first_row = if y == 0 { 1 } else { 0 };
        let first_column = if x == 0 { 1 } else { 0 };
        for yi in first_row..n - 1 {
            for xi in first_column..n - 1 {
                self.probe_and_draw(x + xi, y + yi);
            }
        }
    }

    /// The cell's center sample point and the clearance a distance
    /// estimate must exceed before the whole cell can be classified
    /// from that one point.  The estimate can be off by a factor of
    /// four in either direction, so demand four half-diagonals.
    fn cell_clearance(&self, x: usize, y: usize, n: usize) -> (Complex<f64>, f64) {
        let (step_x, step_y) = self.viewport.step();
        let side = n as f64;
        let center = self
            .viewport
            .point(x as f64 + side / 2.0, y as f64 + side / 2.0);
        let margin = 4.0 * (side * step_x).hypot(side * step_y) / 2.0;
        (center, margin)
    }

    /// Certify a uniform-outside border: true when the exterior
    /// distance estimate proves the set boundary clears the whole
    /// cell, so no member pixel can hide in its interior.
    fn confirm_exterior(&mut self, x: usize, y: usize, n: usize) -> bool {
        let (center, margin) = self.cell_clearance(x, y, n);
        self.stats.estimator_calls += 1;
        match estimate(center, self.limit) {
            Some(DistanceEstimate::Exterior(d)) => d > margin,
            _ => false,
        }
    }

    /// The distance-estimator pre-check: when the cell's center is
    /// provably farther from the set boundary than the cell's whole
    /// extent, the cell is uniform and the border never needs
    /// tracing.  Returns true when the cell was classified.
    fn classify_by_distance(&mut self, x: usize, y: usize, n: usize) -> bool {
        let (center, margin) = self.cell_clearance(x, y, n);
        self.stats.estimator_calls += 1;
        match estimate(center, self.limit) {
            Some(DistanceEstimate::Exterior(d)) if d > margin => {
                // Outside pixels are unset pixels; skipping the cell
                // entirely leaves exactly the right bits behind.
                trace!("cell ({}, {})x{} skipped: exterior", x, y, n);
                self.stats.distance_skips += 1;
                true
            }
            Some(DistanceEstimate::Interior(d)) if d > margin => {
                trace!("cell ({}, {})x{} filled: interior", x, y, n);
                self.stats.distance_skips += 1;
                for row in y..y + n {
                    for column in x..x + n {
                        self.frame.set(column, row);
                    }
                }
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num::Complex;

    fn classic_viewport() -> Viewport {
        Viewport::new(
            400,
            240,
            Complex::new(-2.5, 1.0),
            Complex::new(1.0, -1.0),
        )
    }

    fn brute_force(viewport: &Viewport, limit: usize) -> Bitmap {
        let mut frame = Bitmap::new(viewport.width(), viewport.height());
        for row in 0..viewport.height() {
            for column in 0..viewport.width() {
                if is_member(viewport.pixel_center(column, row), limit) {
                    frame.set(column, row);
                }
            }
        }
        frame
    }

    fn assert_matches_brute_force(viewport: &Viewport, frame: &Bitmap, limit: usize) {
        let reference = brute_force(viewport, limit);
        for row in 0..viewport.height() {
            for column in 0..viewport.width() {
                assert_eq!(
                    frame.get(column, row),
                    reference.get(column, row),
                    "pixel ({}, {}) diverged from brute force",
                    column,
                    row
                );
            }
        }
    }

    #[test]
    fn matches_brute_force_on_the_classic_view() {
        let viewport = classic_viewport();
        let mut frame = Bitmap::new(400, 240);
        let stats = MarianiRenderer::new(64).render(&viewport, &mut frame).unwrap();
        assert_matches_brute_force(&viewport, &frame, 64);
        // And it had better have been cheaper than brute force.
        assert!(stats.oracle_calls < 400 * 240);
    }

    #[test]
    fn isolated_filament_pixels_are_drawn() {
        // Each of these pixels is a member whose whole neighborhood
        // classifies outside, so it sits in the interior of a cell
        // with a uniformly-outside border.  Trusting such a border
        // without an exterior-distance certificate loses them.
        let viewport = classic_viewport();
        let mut frame = Bitmap::new(400, 240);
        MarianiRenderer::new(64).render(&viewport, &mut frame).unwrap();
        for &(column, row) in &[(287, 21), (217, 40), (287, 218)] {
            assert!(
                is_member(viewport.pixel_center(column, row), 64),
                "({}, {}) should be a member",
                column,
                row
            );
            assert!(frame.get(column, row), "({}, {}) was not drawn", column, row);
        }
    }

    #[test]
    fn shared_tile_edges_are_written_once() {
        // Two side-by-side tiles over a region the set crosses, so
        // the shared column carries a non-trivial bit pattern.  The
        // right tile reuses the left tile's right border; processing
        // it must leave the writer's bits exactly as they were.
        let viewport = Viewport::new(
            160,
            80,
            Complex::new(-1.2, 0.8),
            Complex::new(0.4, 0.0),
        );
        let mut frame = Bitmap::new(160, 80);
        let mut raster = Raster {
            viewport: &viewport,
            frame: &mut frame,
            limit: 64,
            min_cell: 10,
            distance_estimate: false,
            stats: RenderStats::default(),
        };
        let fresh = Edges {
            top: false,
            right: false,
            bottom: false,
            left: false,
        };
        raster.subdivide(0, 0, 80, fresh);
        let shared: Vec<bool> = (0..80).map(|row| raster.frame.get(79, row)).collect();
        assert!(shared.iter().any(|&b| b));
        assert!(shared.iter().any(|&b| !b));

        raster.subdivide(80, 0, 80, Edges { left: true, ..fresh });
        for (row, &before) in shared.iter().enumerate() {
            assert_eq!(raster.frame.get(79, row), before, "row {}", row);
        }
    }

    #[test]
    fn classic_view_landmarks() {
        let viewport = classic_viewport();
        let mut frame = Bitmap::new(400, 240);
        MarianiRenderer::new(64).render(&viewport, &mut frame).unwrap();
        // The period-2 bulb center and the cardioid center are lit...
        assert!(frame.get(171, 120));
        assert!(frame.get(285, 120));
        // ...and the far corners are dark.
        assert!(!frame.get(0, 0));
        assert!(!frame.get(399, 0));
        assert!(!frame.get(0, 239));
        assert!(!frame.get(399, 239));
    }

    #[test]
    fn rendering_twice_is_idempotent() {
        let viewport = classic_viewport();
        let renderer = MarianiRenderer::new(64);
        let mut frame = Bitmap::new(400, 240);
        renderer.render(&viewport, &mut frame).unwrap();
        let after_one = frame.clone();
        renderer.render(&viewport, &mut frame).unwrap();
        assert_eq!(after_one.as_bytes(), frame.as_bytes());
    }

    #[test]
    fn padding_does_not_disturb_logical_pixels() {
        let viewport = classic_viewport();
        let renderer = MarianiRenderer::new(64);
        let mut plain = Bitmap::new(400, 240);
        let mut padded = Bitmap::with_padding(400, 240, 16);
        renderer.render(&viewport, &mut plain).unwrap();
        renderer.render(&viewport, &mut padded).unwrap();
        for row in 0..240 {
            for column in 0..400 {
                assert_eq!(plain.get(column, row), padded.get(column, row));
            }
        }
    }

    #[test]
    fn far_exterior_tile_resolves_at_the_root() {
        // An 80x80 view centered on 3+3i, nowhere near the set.
        let viewport = Viewport::new(
            80,
            80,
            Complex::new(2.5, 3.5),
            Complex::new(3.5, 2.5),
        );
        let mut frame = Bitmap::new(80, 80);
        let stats = MarianiRenderer::new(64)
            .distance_estimate(true)
            .render(&viewport, &mut frame)
            .unwrap();
        assert_eq!(stats.cells, 1);
        assert_eq!(stats.distance_skips, 1);
        assert_eq!(stats.oracle_calls, 0);
        assert!(frame.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn deep_interior_tile_fills_at_the_root() {
        // An 80x80 view deep inside the cardioid.
        let viewport = Viewport::new(
            80,
            80,
            Complex::new(-0.05, 0.05),
            Complex::new(0.05, -0.05),
        );
        let mut frame = Bitmap::new(80, 80);
        let stats = MarianiRenderer::new(64)
            .distance_estimate(true)
            .render(&viewport, &mut frame)
            .unwrap();
        assert_eq!(stats.cells, 1);
        assert_eq!(stats.distance_skips, 1);
        for row in 0..80 {
            for column in 0..80 {
                assert!(frame.get(column, row));
            }
        }
    }

    #[test]
    fn boundary_straddling_tile_subdivides_and_stays_exact() {
        // An 80x80 view across the cardioid's cusp: part inside,
        // part outside, so the border disagrees and the tile splits.
        let viewport = Viewport::new(
            80,
            80,
            Complex::new(0.0, 0.4),
            Complex::new(0.6, -0.2),
        );
        let mut frame = Bitmap::new(80, 80);
        let stats = MarianiRenderer::new(64).render(&viewport, &mut frame).unwrap();
        assert!(stats.cells > 1, "expected subdivision, got {:?}", stats);
        assert_matches_brute_force(&viewport, &frame, 64);
    }

    #[test]
    fn remainder_strips_are_rendered_exactly() {
        // 100x50 is not tileable by 80; the strips go per-pixel.
        let viewport = Viewport::new(
            100,
            50,
            Complex::new(-2.5, 1.0),
            Complex::new(1.0, -1.0),
        );
        let mut frame = Bitmap::new(100, 50);
        MarianiRenderer::new(64).render(&viewport, &mut frame).unwrap();
        assert_matches_brute_force(&viewport, &frame, 64);
    }

    #[test]
    fn small_tiles_and_cells_still_match_brute_force() {
        let viewport = Viewport::new(
            160,
            160,
            Complex::new(-2.0, 1.6),
            Complex::new(1.2, -1.6),
        );
        let mut frame = Bitmap::new(160, 160);
        MarianiRenderer::new(64)
            .tile_size(32)
            .min_cell(4)
            .render(&viewport, &mut frame)
            .unwrap();
        assert_matches_brute_force(&viewport, &frame, 64);
    }

    #[test]
    fn degenerate_viewports_render_nothing() {
        let p = Complex::new(0.5, 0.5);
        let viewport = Viewport::new(80, 80, p, p);
        let mut frame = Bitmap::new(80, 80);
        let stats = MarianiRenderer::new(64).render(&viewport, &mut frame).unwrap();
        assert_eq!(stats, RenderStats::default());
        assert!(frame.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn undersized_surfaces_are_rejected() {
        let viewport = classic_viewport();
        let mut frame = Bitmap::new(100, 100);
        match MarianiRenderer::new(64).render(&viewport, &mut frame) {
            Err(RenderError::SurfaceTooSmall {
                viewport_width, ..
            }) => assert_eq!(viewport_width, 400),
            other => panic!("expected SurfaceTooSmall, got {:?}", other),
        }
    }
}
