/*!
 * # contentqa - content quality pipeline
 *
 * A Rust library that evaluates generated text against caller requirements
 * and decides whether it can be published.
 *
 * ## Features
 *
 * - Six concurrent analyzer stages:
 *   - Search intent and keyword coverage
 *   - E-E-A-T signals (experience, expertise, authoritativeness, trust)
 *   - Source and citation validation, with optional reachability probes
 *   - Link placement
 *   - Linguistic variation
 *   - Mechanical error detection
 * - Weighted scoring with configurable stage weights
 * - Deterministic approval with rationale and recommendations
 * - Bounded, issue-driven refinement loop
 * - Cancellation of in-flight runs
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `errors`: Error taxonomy and the error response contract
 * - `quality`: Analyzers, scorer, approval system and refinement engine
 * - `pipeline`: The orchestrator and the final validation report
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod errors;
pub mod pipeline;
pub mod quality;

// Re-export main types for easier usage
pub use app_config::{Config, SharedConfig};
pub use errors::{ErrorResponse, PipelineError};
pub use pipeline::{EvaluationRequest, FinalValidationReport, PipelineResponse, QualityPipeline, RunOptions, Termination};
pub use quality::{ApprovalCriteria, ApprovalOutcome, QualityReport, Requirements};
