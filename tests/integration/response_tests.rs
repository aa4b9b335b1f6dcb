/*!
 * Request/response contract tests.
 *
 * Run the real pipeline from request JSON and check the serialized shape
 * callers depend on.
 */

use contentqa::app_config::Config;
use contentqa::errors::{ErrorResponse, PipelineError};
use contentqa::pipeline::{EvaluationRequest, QualityPipeline, StatusDescriptor};

use crate::common::sample_article;

fn request_json(content: &str) -> String {
    serde_json::json!({
        "content": content,
        "requirements": {
            "targetAudience": "home gardeners",
            "tone": "friendly",
            "keywords": ["pruning roses", "rose care"]
        },
        "options": { "maxRefinementIterations": 2 }
    })
    .to_string()
}

#[tokio::test]
async fn test_response_fromRequestJson_shouldUseCamelCaseContract() {
    let config = Config::default();
    let request: EvaluationRequest = serde_json::from_str(&request_json(sample_article())).unwrap();
    let options = request.options.resolve(&config);
    let pipeline = QualityPipeline::from_config(&config).unwrap();

    let report = pipeline.run(&request.content, &request.requirements, &options).await.unwrap();
    let response = report.to_response().unwrap();
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["success"], true);
    assert!(json["validation"]["overallScore"].is_number());
    assert_eq!(json["validation"]["subScores"].as_object().unwrap().len(), 6);
    assert!(json["approval"]["outcome"].is_string());
    assert!(json["approval"]["rationale"].as_array().is_some_and(|r| !r.is_empty()));
    assert_eq!(json["content"]["original"], sample_article());
    assert!(json["content"]["final"].is_string());
    assert_eq!(json["metadata"]["options"]["maxRefinementIterations"], 2);
    assert!(json["metadata"]["totalIterations"].as_u64().is_some_and(|n| (1..=2).contains(&n)));
    assert!(json["metadata"]["termination"]["reason"].is_string());
    assert!(json["metadata"]["runId"].is_string());
    assert!(json["processingTimeMs"].is_u64());
}

#[tokio::test]
async fn test_response_emptyContent_shouldMapToValidationErrorBody() {
    let config = Config::default();
    let request: EvaluationRequest = serde_json::from_str(&request_json("")).unwrap();
    let pipeline = QualityPipeline::from_config(&config).unwrap();

    let error = pipeline
        .run(&request.content, &request.requirements, &request.options.resolve(&config))
        .await
        .unwrap_err();
    let json = serde_json::to_value(ErrorResponse::from(&error)).unwrap();

    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    assert!(json["error"]["message"].as_str().unwrap().contains("content"));
}

#[test]
fn test_errorResponse_internal_shouldNotLeakDetail() {
    let error = PipelineError::Internal("every analyzer stage failed on revision 0".to_string());
    let json = serde_json::to_value(ErrorResponse::from(&error)).unwrap();

    assert_eq!(json["error"]["code"], "PIPELINE_INTERNAL_ERROR");
    assert_eq!(json["error"]["message"], "internal pipeline error");
}

#[test]
fn test_statusDescriptor_withProbeEnabled_shouldAdvertiseFeature() {
    let mut config = Config::default();
    config.sources.check_reachability = true;

    let status = StatusDescriptor::from_config(&config);
    let json = serde_json::to_value(&status).unwrap();

    assert_eq!(json["status"], "operational");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert!(status.features.iter().any(|f| f == "source-reachability"));
}
