// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Orientation engine
//!
//! Each segment is oriented from one seed cell. The seed's outward sense is
//! decided by ray parity, then a breadth-first sweep over the segment's
//! adjacency makes every reachable cell agree with its already-oriented
//! neighbours, reversing cells where needed. Orientation status is
//! mesh-wide: a cell fixed while sweeping one segment keeps its order when
//! a later segment reaches it. The sweep still crosses such a cell,
//! remembering whether its order agrees with the current segment or runs
//! against it, so regions joined only through interface cells are reached.

use crate::error::AdaptResult;
use crate::geometry::adjacency::inconsistently_oriented;
use crate::geometry::{
    consistently_oriented, CellId, GeometryKernel, RayCrossing, RobustKernel, SegmentAdjacency,
    SegmentId, SurfaceMesh, TrianglePoints,
};
use crate::utils::math;
use ahash::AHashMap;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Ray directions tried before giving up on a non-degenerate parity count
const MAX_RAY_ATTEMPTS: usize = 8;

/// Golden angle, spreads successive tilts around the normal
const TILT_ANGLE: f64 = 2.399_963_229_728_653;

/// Mesh-wide orientation status of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellStatus {
    Unvisited,
    Consistent,
    Error,
}

/// Outcome of orienting one segment.
///
/// Counts describe the segment's cells right after its sweep; cells shared
/// with an earlier segment appear as `inherited` within `consistent`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentOrientation {
    pub segment: SegmentId,
    pub name: String,
    pub seed: Option<CellId>,
    pub seed_flipped: bool,
    pub consistent: usize,
    pub inherited: usize,
    pub corrected: usize,
    pub leftover: usize,
    pub errors: usize,
}

/// Aggregated orientation diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrientationReport {
    pub segments: Vec<SegmentOrientation>,
    /// Cells with status CONSISTENT at the end, each counted once
    pub consistent: usize,
    /// Cells reversed during propagation (seed flips excluded)
    pub corrected: usize,
    /// Segment cells never reached by any sweep
    pub leftover: usize,
    /// Cells that could not be made consistent
    pub errors: usize,
    /// Seeds reversed by the parity test
    pub seed_flips: usize,
}

impl OrientationReport {
    /// No leftovers and no errors
    pub fn is_clean(&self) -> bool {
        self.leftover == 0 && self.errors == 0
    }
}

/// Orientation side tables plus the report, indexed by cell id
#[derive(Debug, Clone)]
pub struct Orientation {
    status: Vec<CellStatus>,
    owner: Vec<Option<SegmentId>>,
    report: OrientationReport,
}

impl Orientation {
    pub fn status(&self, cell: CellId) -> CellStatus {
        self.status[cell]
    }

    /// Segment whose sweep fixed the cell's vertex order
    pub fn owner(&self, cell: CellId) -> Option<SegmentId> {
        self.owner[cell]
    }

    /// Number of cells covered by the tables
    pub fn cell_count(&self) -> usize {
        self.status.len()
    }

    pub fn report(&self) -> &OrientationReport {
        &self.report
    }

    pub fn into_report(self) -> OrientationReport {
        self.report
    }
}

/// Orient every segment using the exact kernel
pub fn orient(mesh: &mut SurfaceMesh) -> AdaptResult<Orientation> {
    orient_with(mesh, &RobustKernel)
}

/// Orient every segment in stored order, reversing cell vertex orders in place
pub fn orient_with<K: GeometryKernel + ?Sized>(
    mesh: &mut SurfaceMesh,
    kernel: &K,
) -> AdaptResult<Orientation> {
    mesh.require_cells("orientation")?;

    let mut sweep = Sweep {
        status: vec![CellStatus::Unvisited; mesh.cell_count()],
        owner: vec![None; mesh.cell_count()],
    };

    let segments: Vec<SegmentOrientation> = (0..mesh.segment_count())
        .map(|segment| sweep.orient_segment(mesh, kernel, segment))
        .collect();

    let mut report = OrientationReport {
        corrected: segments.iter().map(|s| s.corrected).sum(),
        seed_flips: segments.iter().filter(|s| s.seed_flipped).count(),
        segments,
        ..Default::default()
    };
    for (cell, status) in sweep.status.iter().enumerate() {
        match status {
            CellStatus::Consistent => report.consistent += 1,
            CellStatus::Error => report.errors += 1,
            CellStatus::Unvisited if mesh.membership(cell).count() > 0 => report.leftover += 1,
            CellStatus::Unvisited => {}
        }
    }

    info!(
        consistent = report.consistent,
        corrected = report.corrected,
        leftover = report.leftover,
        errors = report.errors,
        seed_flips = report.seed_flips,
        "orientation finished"
    );
    if !report.is_clean() {
        warn!(
            leftover = report.leftover,
            errors = report.errors,
            "orientation left cells unresolved"
        );
    }

    Ok(Orientation {
        status: sweep.status,
        owner: sweep.owner,
        report,
    })
}

/// Outcome of settling one candidate cell against its oriented neighbours
enum Settled {
    AsIs,
    Reversed,
    Failed,
}

struct Sweep {
    status: Vec<CellStatus>,
    owner: Vec<Option<SegmentId>>,
}

impl Sweep {
    fn orient_segment<K: GeometryKernel + ?Sized>(
        &mut self,
        mesh: &mut SurfaceMesh,
        kernel: &K,
        segment: SegmentId,
    ) -> SegmentOrientation {
        let adjacency = SegmentAdjacency::build(mesh, segment);
        let mut summary = SegmentOrientation {
            segment,
            name: mesh.segment(segment).name.clone(),
            ..Default::default()
        };

        if let Some(seed) = self.select_seed(mesh, segment) {
            summary.seed = Some(seed);
            if seed_points_inward(mesh, kernel, segment, seed) {
                mesh.flip_cell(seed);
                summary.seed_flipped = true;
            }
            summary.corrected = self.propagate(mesh, &adjacency, segment, seed);
        }

        for &cell in &mesh.segment(segment).cells {
            match self.status[cell] {
                CellStatus::Consistent => {
                    summary.consistent += 1;
                    if self.owner[cell] != Some(segment) {
                        summary.inherited += 1;
                    }
                }
                CellStatus::Unvisited => summary.leftover += 1,
                CellStatus::Error => summary.errors += 1,
            }
        }

        debug!(
            segment = %summary.name,
            seed = ?summary.seed,
            seed_flipped = summary.seed_flipped,
            consistent = summary.consistent,
            inherited = summary.inherited,
            corrected = summary.corrected,
            leftover = summary.leftover,
            errors = summary.errors,
            "segment oriented"
        );
        summary
    }

    /// First unvisited cell in stored order, preferring one with a usable normal
    fn select_seed(&self, mesh: &SurfaceMesh, segment: SegmentId) -> Option<CellId> {
        let mut first = None;
        for &cell in &mesh.segment(segment).cells {
            if self.status[cell] != CellStatus::Unvisited {
                continue;
            }
            if math::unit_normal(&mesh.triangle(cell)).is_some() {
                return Some(cell);
            }
            first.get_or_insert(cell);
        }
        first
    }

    /// Breadth-first sweep from the seed; returns the number of reversed cells
    fn propagate(
        &mut self,
        mesh: &mut SurfaceMesh,
        adjacency: &SegmentAdjacency,
        segment: SegmentId,
        seed: CellId,
    ) -> usize {
        self.claim(seed, segment);
        let mut corrected = 0;
        let mut queue = VecDeque::from([seed]);
        // Crossed cells owned elsewhere: true when their order agrees with this segment
        let mut crossed: AHashMap<CellId, bool> = AHashMap::new();

        while let Some(current) = queue.pop_front() {
            for candidate in adjacency.neighbors(mesh, current) {
                match self.status[candidate] {
                    CellStatus::Unvisited => {}
                    CellStatus::Consistent
                        if self.owner[candidate] != Some(segment)
                            && !crossed.contains_key(&candidate) =>
                    {
                        let Some(current_agrees) = self.agreement(current, segment, &crossed)
                        else {
                            continue;
                        };
                        let (a, b) = (mesh.cell(current), mesh.cell(candidate));
                        let agrees = if consistently_oriented(a, b) {
                            current_agrees
                        } else if inconsistently_oriented(a, b) {
                            !current_agrees
                        } else {
                            continue;
                        };
                        crossed.insert(candidate, agrees);
                        queue.push_back(candidate);
                        continue;
                    }
                    _ => continue,
                }
                match self.settle(mesh, adjacency, segment, &crossed, candidate) {
                    Settled::AsIs => {}
                    Settled::Reversed => corrected += 1,
                    Settled::Failed => {
                        self.status[candidate] = CellStatus::Error;
                        warn!(cell = candidate, segment, "cell cannot be oriented consistently");
                        continue;
                    }
                }
                self.claim(candidate, segment);
                queue.push_back(candidate);
            }
        }
        if !crossed.is_empty() {
            debug!(segment, crossed = crossed.len(), "swept through inherited cells");
        }
        corrected
    }

    /// Whether `cell`'s stored order is outward for `segment`, if known yet
    fn agreement(
        &self,
        cell: CellId,
        segment: SegmentId,
        crossed: &AHashMap<CellId, bool>,
    ) -> Option<bool> {
        if self.owner[cell] == Some(segment) {
            Some(true)
        } else {
            crossed.get(&cell).copied()
        }
    }

    /// Make `cell` agree with its oriented neighbours, reversing it at most once
    fn settle(
        &self,
        mesh: &mut SurfaceMesh,
        adjacency: &SegmentAdjacency,
        segment: SegmentId,
        crossed: &AHashMap<CellId, bool>,
        cell: CellId,
    ) -> Settled {
        if self.agrees_with_neighbors(mesh, adjacency, segment, crossed, cell) {
            return Settled::AsIs;
        }
        mesh.flip_cell(cell);
        if self.agrees_with_neighbors(mesh, adjacency, segment, crossed, cell) {
            return Settled::Reversed;
        }
        mesh.flip_cell(cell);
        Settled::Failed
    }

    /// Consistency with every neighbour whose relation to `segment` is known.
    /// A crossed cell wound against the segment must be traversed the other way.
    fn agrees_with_neighbors(
        &self,
        mesh: &SurfaceMesh,
        adjacency: &SegmentAdjacency,
        segment: SegmentId,
        crossed: &AHashMap<CellId, bool>,
        cell: CellId,
    ) -> bool {
        adjacency.neighbors(mesh, cell).into_iter().all(|n| {
            let (a, b) = (mesh.cell(cell), mesh.cell(n));
            match self.agreement(n, segment, crossed) {
                Some(true) => consistently_oriented(a, b),
                Some(false) => inconsistently_oriented(a, b),
                None => true,
            }
        })
    }

    fn claim(&mut self, cell: CellId, segment: SegmentId) {
        self.status[cell] = CellStatus::Consistent;
        self.owner[cell] = Some(segment);
    }
}

/// Parity test: an odd number of crossings along the seed normal means the
/// normal points into the region bounded by the segment.
fn seed_points_inward<K: GeometryKernel + ?Sized>(
    mesh: &SurfaceMesh,
    kernel: &K,
    segment: SegmentId,
    seed: CellId,
) -> bool {
    let Some(normal) = math::unit_normal(&mesh.triangle(seed)) else {
        warn!(cell = seed, segment, "seed cell is degenerate, keeping its order");
        return false;
    };

    let origin = mesh.barycenter(seed);
    let reach = 2.0 * mesh.segment_bounding_box(segment).diagonal() + 1.0;
    let others: Vec<TrianglePoints> = mesh
        .segment(segment)
        .cells
        .iter()
        .filter(|&&c| c != seed)
        .map(|&c| mesh.triangle(c))
        .collect();

    let (u, v) = math::tangent_basis(&normal);
    let mut hits = 0;
    for attempt in 0..MAX_RAY_ATTEMPTS {
        // Tilts stay in the open half-space of the normal
        let direction = tilted(&normal, &u, &v, attempt);
        let far = origin + direction * reach;
        let (count, degenerate) = count_crossings(kernel, &origin, &far, &others);
        hits = count;
        if !degenerate {
            return hits % 2 == 1;
        }
        debug!(cell = seed, attempt, "parity ray grazed an edge, tilting");
    }

    warn!(
        cell = seed,
        segment,
        hits,
        "every parity ray was degenerate, using the last count"
    );
    hits % 2 == 1
}

fn tilted(normal: &Vector3<f64>, u: &Vector3<f64>, v: &Vector3<f64>, attempt: usize) -> Vector3<f64> {
    if attempt == 0 {
        return *normal;
    }
    let angle = TILT_ANGLE * attempt as f64;
    let magnitude = 0.1 * attempt as f64;
    normal + (u * angle.cos() + v * angle.sin()) * magnitude
}

fn count_crossings<K: GeometryKernel + ?Sized>(
    kernel: &K,
    origin: &Point3<f64>,
    far: &Point3<f64>,
    triangles: &[TrianglePoints],
) -> (usize, bool) {
    let mut hits = 0;
    for triangle in triangles {
        match kernel.ray_crossing(origin, far, triangle) {
            RayCrossing::Hit => hits += 1,
            RayCrossing::Degenerate => return (hits, true),
            RayCrossing::Miss => {}
        }
    }
    (hits, false)
}
