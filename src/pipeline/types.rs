// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Aggregated pipeline report

use super::config::AbortPolicy;
use crate::adapt::{NormalReport, OrientationReport};
use crate::validation::{GeometryReport, TopologyReport};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

// Durations are written as fractional seconds
fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(duration.as_secs_f64())
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    Ok(Duration::from_secs_f64(secs.max(0.0)))
}

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Orientation,
    Normals,
    Topology,
    Geometry,
    Sewing,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Orientation => "orientation",
            Stage::Normals => "normals",
            Stage::Topology => "topology",
            Stage::Geometry => "geometry",
            Stage::Sewing => "sewing",
        }
    }
}

/// Wall time of one stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageTiming {
    pub stage: Stage,
    #[serde(serialize_with = "serialize_duration", deserialize_with = "deserialize_duration")]
    pub duration: Duration,
}

/// Sewing outcome without the mesh itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SewingSummary {
    pub vertices_before: usize,
    pub vertices_after: usize,
    pub merged_vertices: usize,
    pub collapsed_cells: usize,
}

/// Complete pipeline report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub timestamp: String,
    pub vertex_count: usize,
    pub cell_count: usize,
    pub segment_count: usize,
    pub orientation: OrientationReport,
    pub normals: NormalReport,
    pub topology: Option<TopologyReport>,
    pub geometry: Option<GeometryReport>,
    pub sewing: Option<SewingSummary>,
    pub timings: Vec<StageTiming>,
    #[serde(serialize_with = "serialize_duration", deserialize_with = "deserialize_duration")]
    pub total_duration: Duration,
}

impl PipelineReport {
    pub fn new(vertex_count: usize, cell_count: usize, segment_count: usize) -> Self {
        Self {
            timestamp: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            vertex_count,
            cell_count,
            segment_count,
            orientation: OrientationReport::default(),
            normals: NormalReport::default(),
            topology: None,
            geometry: None,
            sewing: None,
            timings: Vec::new(),
            total_duration: Duration::ZERO,
        }
    }

    pub fn record_timing(&mut self, stage: Stage, duration: Duration) {
        self.total_duration += duration;
        self.timings.push(StageTiming { stage, duration });
    }

    pub fn duration_of(&self, stage: Stage) -> Option<Duration> {
        self.timings
            .iter()
            .find(|t| t.stage == stage)
            .map(|t| t.duration)
    }

    /// Orientation errors and leftovers, interface sign conflicts and
    /// unresolved signs, topology defects and self-intersections
    pub fn defect_count(&self) -> usize {
        self.orientation.errors
            + self.orientation.leftover
            + self.normals.sign_conflicts
            + self.normals.unresolved
            + self.topology.as_ref().map_or(0, TopologyReport::defect_count)
            + self.geometry.as_ref().map_or(0, |g| g.intersection_count)
    }

    pub fn is_clean(&self) -> bool {
        self.defect_count() == 0
    }

    /// Whether the defect classes selected by `policy` are all absent
    pub fn ready_for_volume_meshing(&self, policy: &AbortPolicy) -> bool {
        self.blocking_reasons(policy).is_empty()
    }

    /// Defect classes that block the hand-off under `policy`
    pub fn blocking_reasons(&self, policy: &AbortPolicy) -> Vec<&'static str> {
        let mut reasons = Vec::new();
        if policy.orientation_errors && self.orientation.errors > 0 {
            reasons.push("orientation errors");
        }
        if policy.leftovers && self.orientation.leftover > 0 {
            reasons.push("unreached cells");
        }
        if policy.sign_conflicts && (self.normals.sign_conflicts > 0 || self.normals.unresolved > 0)
        {
            reasons.push("interface sign conflicts");
        }
        if policy.topology_defects && self.topology.as_ref().is_some_and(|t| !t.is_clean()) {
            reasons.push("topology defects");
        }
        if policy.geometry_defects && self.geometry.as_ref().is_some_and(|g| !g.is_clean()) {
            reasons.push("self-intersections");
        }
        reasons
    }
}
