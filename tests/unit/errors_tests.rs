/*!
 * Tests for error types and conversions
 */

use contentqa::errors::{ErrorResponse, PipelineError};
use contentqa::quality::{IssueKind, Stage};

#[test]
fn test_pipelineError_stageDegraded_shouldDisplayStageAndReason() {
    let error = PipelineError::StageDegraded {
        stage: Stage::Sources,
        reason: "timed out after 10s".to_string(),
    };
    let display = format!("{}", error);

    assert!(display.contains("sources"));
    assert!(display.contains("timed out after 10s"));
    assert!(!error.is_fatal());
}

#[test]
fn test_pipelineError_refinement_shouldDisplayKind() {
    let error = PipelineError::Refinement {
        kind: IssueKind::Citation,
        message: "no corrector".to_string(),
    };

    assert!(format!("{}", error).contains("citation"));
    assert!(error.is_fatal());
    assert!(!error.is_client_error());
}

#[test]
fn test_pipelineError_fromAnyhow_shouldBecomeInternal() {
    let source = anyhow::anyhow!("disk full").context("Failed to write report");
    let error = PipelineError::from(source);

    match &error {
        PipelineError::Internal(detail) => {
            assert!(detail.contains("Failed to write report"));
            assert!(detail.contains("disk full"));
        }
        other => panic!("unexpected variant: {:?}", other),
    }
    assert_eq!(ErrorResponse::from(&error).error.message, "internal pipeline error");
}

#[test]
fn test_errorResponse_cancelled_shouldSerializeCode() {
    let json = serde_json::to_value(ErrorResponse::from(&PipelineError::Cancelled)).unwrap();

    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "PIPELINE_CANCELLED");
}
