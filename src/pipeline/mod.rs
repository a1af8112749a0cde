// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Pipeline driver, configuration and reporting

pub mod config;
pub mod coordinator;
pub mod reporter;
pub mod types;

pub use config::{AbortPolicy, PipelineConfig};
pub use coordinator::{AdaptationPipeline, PipelineOutcome};
pub use reporter::PipelineReporter;
pub use types::{PipelineReport, SewingSummary, Stage, StageTiming};
