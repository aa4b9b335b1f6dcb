/*!
 * Quality pipeline orchestration.
 *
 * - `orchestrator`: the state machine driving analysis, approval and refinement
 * - `report`: the final validation report and the response contract built from it
 */

pub mod orchestrator;
pub mod report;

pub use orchestrator::{PipelineState, QualityPipeline, RunOptions};
pub use report::{
    EvaluationRequest, FinalValidationReport, PipelineResponse, RequestOptions, StatusDescriptor, Termination,
};
