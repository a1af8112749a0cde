// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Pipeline report writers: JSON, Markdown and terminal

use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use std::fs;
use std::path::Path;

use super::config::AbortPolicy;
use super::types::PipelineReport;

/// Pipeline reporter
pub struct PipelineReporter;

impl PipelineReporter {
    /// Write JSON report
    pub fn write_json(report: &PipelineReport, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
        fs::write(path.as_ref(), json)
            .with_context(|| format!("Failed to write report: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Write Markdown report
    pub fn write_markdown(report: &PipelineReport, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path.as_ref(), Self::markdown(report))
            .with_context(|| format!("Failed to write report: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Render the report as Markdown
    pub fn markdown(report: &PipelineReport) -> String {
        let mut md = String::new();

        // Header
        md.push_str("# Mesh Adaptation Report\n\n");
        md.push_str(&format!("**Generated:** {}\n\n", report.timestamp));
        md.push_str("---\n\n");

        // Summary
        md.push_str("## Summary\n\n");
        md.push_str(&format!("- **Vertices:** {}\n", report.vertex_count));
        md.push_str(&format!("- **Cells:** {}\n", report.cell_count));
        md.push_str(&format!("- **Segments:** {}\n", report.segment_count));
        md.push_str(&format!("- **Defects:** {}\n", report.defect_count()));
        md.push_str(&format!("- **Total Duration:** {:.3}s\n\n", report.total_duration.as_secs_f64()));
        md.push_str("---\n\n");

        // Orientation
        let orientation = &report.orientation;
        md.push_str("## Orientation\n\n");
        md.push_str(&format!("- **Consistent:** {}\n", orientation.consistent));
        md.push_str(&format!("- **Corrected:** {}\n", orientation.corrected));
        md.push_str(&format!("- **Seed flips:** {}\n", orientation.seed_flips));
        md.push_str(&format!("- **Leftover:** {}\n", orientation.leftover));
        md.push_str(&format!("- **Errors:** {}\n\n", orientation.errors));
        md.push_str("| Segment | Seed | Consistent | Inherited | Corrected | Leftover | Errors |\n");
        md.push_str("|---|---|---|---|---|---|---|\n");
        for segment in &orientation.segments {
            let seed = segment
                .seed
                .map_or_else(|| "-".to_string(), |cell| cell.to_string());
            md.push_str(&format!(
                "| {} | {}{} | {} | {} | {} | {} | {} |\n",
                segment.name,
                seed,
                if segment.seed_flipped { " (flipped)" } else { "" },
                segment.consistent,
                segment.inherited,
                segment.corrected,
                segment.leftover,
                segment.errors
            ));
        }
        md.push('\n');

        // Normals
        md.push_str("## Normals\n\n");
        md.push_str(&format!("- **Interface cells:** {}\n", report.normals.interface_cells));
        md.push_str(&format!("- **Sign conflicts:** {}\n", report.normals.sign_conflicts));
        md.push_str(&format!("- **Unresolved:** {}\n", report.normals.unresolved));
        md.push_str(&format!("- **Degenerate cells:** {}\n\n", report.normals.degenerate_cells));

        if let Some(ref topology) = report.topology {
            md.push_str("## Topology\n\n");
            md.push_str(&format!("- **Non-manifold edges:** {}\n", topology.non_manifold_edge_count));
            md.push_str(&format!("- **Duplicate vertices:** {}\n", topology.duplicate_vertex_count));
            md.push_str(&format!("- **Duplicate edges:** {}\n", topology.duplicate_edge_count));
            md.push_str(&format!("- **Duplicate cells:** {}\n", topology.duplicate_cell_count));
            md.push_str(&format!("- **Boundary edges:** {}\n\n", topology.boundary_edge_count));
        }

        if let Some(ref geometry) = report.geometry {
            md.push_str("## Geometry\n\n");
            md.push_str(&format!("- **Self-intersections:** {}\n", geometry.intersection_count));
            md.push_str(&format!("- **Pairs tested:** {}\n", geometry.candidate_pairs));
            for segment in geometry.segments.iter().filter(|s| s.intersection_count() > 0) {
                md.push_str(&format!("- `{}`:", segment.name));
                for (a, b) in &segment.intersecting_pairs {
                    md.push_str(&format!(" ({a}, {b})"));
                }
                md.push('\n');
            }
            md.push('\n');
        }

        if let Some(ref sewing) = report.sewing {
            md.push_str("## Sewing\n\n");
            md.push_str(&format!(
                "- **Vertices:** {} -> {}\n",
                sewing.vertices_before, sewing.vertices_after
            ));
            md.push_str(&format!("- **Merged:** {}\n", sewing.merged_vertices));
            md.push_str(&format!("- **Collapsed cells:** {}\n\n", sewing.collapsed_cells));
        }

        // Timings
        md.push_str("## Timings\n\n");
        for timing in &report.timings {
            md.push_str(&format!(
                "- **{}:** {:.3}s\n",
                timing.stage.as_str(),
                timing.duration.as_secs_f64()
            ));
        }
        md
    }

    /// Print terminal summary
    pub fn print_summary(report: &PipelineReport, policy: &AbortPolicy) {
        println!("\n{}", "═".repeat(80).white());
        println!("{}", "Mesh Adaptation Report".bold());
        println!("{}", "═".repeat(80).white());
        println!("  {} {}", "Timestamp:".white(), report.timestamp.cyan());
        println!(
            "  {} {} vertices, {} cells, {} segments",
            "Mesh:".white(),
            report.vertex_count.to_string().cyan(),
            report.cell_count.to_string().cyan(),
            report.segment_count.to_string().cyan()
        );
        println!(
            "  {} {:.3}s",
            "Duration:".white(),
            report.total_duration.as_secs_f64()
        );

        println!("\n{}", "Stages".bold());
        println!("{}", "─".repeat(80).white());

        let orientation = &report.orientation;
        println!(
            "  {} {}: {} consistent, {} corrected, {} leftover, {} errors",
            status_icon(orientation.is_clean()),
            "ORIENTATION".cyan(),
            orientation.consistent.to_string().green(),
            orientation.corrected.to_string().yellow(),
            count(orientation.leftover),
            count(orientation.errors)
        );
        println!(
            "  {} {}: {} interface cells, {} conflicts, {} unresolved",
            status_icon(report.normals.is_clean()),
            "NORMALS".cyan(),
            report.normals.interface_cells.to_string().white(),
            count(report.normals.sign_conflicts),
            count(report.normals.unresolved)
        );
        if let Some(ref topology) = report.topology {
            println!(
                "  {} {}: {} non-manifold edges, {} duplicate vertices, {} duplicate edges, {} duplicate cells",
                status_icon(topology.is_clean()),
                "TOPOLOGY".cyan(),
                count(topology.non_manifold_edge_count),
                count(topology.duplicate_vertex_count),
                count(topology.duplicate_edge_count),
                count(topology.duplicate_cell_count)
            );
        }
        if let Some(ref geometry) = report.geometry {
            println!(
                "  {} {}: {} self-intersections in {} pairs",
                status_icon(geometry.is_clean()),
                "GEOMETRY".cyan(),
                count(geometry.intersection_count),
                geometry.candidate_pairs.to_string().white()
            );
        }
        if let Some(ref sewing) = report.sewing {
            println!(
                "  {} {}: {} -> {} vertices ({} merged)",
                status_icon(true),
                "SEWING".cyan(),
                sewing.vertices_before.to_string().white(),
                sewing.vertices_after.to_string().white(),
                sewing.merged_vertices.to_string().yellow()
            );
        }

        let reasons = report.blocking_reasons(policy);
        println!("{}", "─".repeat(80).white());
        if reasons.is_empty() {
            println!("  {}", "Ready for volume meshing".green().bold());
        } else {
            println!("  {} {}", "Not ready:".red().bold(), reasons.join(", ").red());
        }
        println!("{}", "═".repeat(80).white());
    }
}

fn status_icon(clean: bool) -> ColoredString {
    if clean {
        "✓".green()
    } else {
        "✗".red()
    }
}

fn count(value: usize) -> ColoredString {
    if value > 0 {
        value.to_string().red()
    } else {
        value.to_string().green()
    }
}
