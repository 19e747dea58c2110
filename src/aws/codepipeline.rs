//! CodePipeline management
//!
//! One pipeline shape: a CodeStar-connection source stage feeding an S3
//! deploy stage that extracts the artifact into the website bucket.

use crate::aws::context::AwsContext;
use crate::aws::error::{ProvisionError, Result, classify_sdk};
use crate::aws::tags;
use crate::types::PipelineSpec;
use aws_sdk_codepipeline::Client;
use aws_sdk_codepipeline::types::{
    ActionCategory, ActionDeclaration, ActionOwner, ActionTypeId, ArtifactStore,
    ArtifactStoreType, ExecutionMode, InputArtifact, OutputArtifact, PipelineDeclaration,
    PipelineType, StageDeclaration,
};
use tracing::info;

/// CodePipeline client for the deploy pipeline
pub struct PipelineClient {
    client: Client,
}

impl PipelineClient {
    /// Create a new pipeline client
    pub async fn new(region: &str) -> Result<Self> {
        let ctx = AwsContext::new(region).await;
        Ok(Self::from_context(&ctx))
    }

    /// Create a pipeline client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.codepipeline_client(),
        }
    }

    /// Create the pipeline.
    ///
    /// A taken name surfaces as [`ProvisionError::NameConflict`]; the ensure
    /// step treats that as reuse of the existing pipeline.
    pub async fn create_pipeline(&self, spec: &PipelineSpec) -> Result<()> {
        info!(
            pipeline = %spec.name,
            repository = %spec.source.full_repository_id(),
            branch = %spec.source.branch,
            "Creating pipeline"
        );

        let mut request = self
            .client
            .create_pipeline()
            .pipeline(build_pipeline_declaration(spec)?);
        for tag in tags::pipeline_tags(&spec.deploy_bucket)? {
            request = request.tags(tag);
        }

        match request.send().await {
            Ok(_) => {
                info!(pipeline = %spec.name, "Pipeline created");
                Ok(())
            }
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_pipeline_name_in_use_exception() {
                    Err(ProvisionError::NameConflict {
                        resource: "pipeline",
                        name: spec.name.clone(),
                    })
                } else {
                    Err(classify_sdk("create pipeline", "pipeline", &spec.name, &service_error))
                }
            }
        }
    }
}

/// Assemble the two-stage pipeline declaration.
pub(crate) fn build_pipeline_declaration(spec: &PipelineSpec) -> Result<PipelineDeclaration> {
    let source_action = ActionDeclaration::builder()
        .name("SourceAction")
        .action_type_id(
            ActionTypeId::builder()
                .category(ActionCategory::Source)
                .owner(ActionOwner::Aws)
                .provider("CodeStarSourceConnection")
                .version("1")
                .build()?,
        )
        .run_order(1)
        .configuration("ConnectionArn", &spec.source.connection_arn)
        .configuration("FullRepositoryId", spec.source.full_repository_id())
        .configuration("BranchName", &spec.source.branch)
        .configuration("OutputArtifactFormat", "CODE_ZIP")
        .configuration("DetectChanges", "true")
        .output_artifacts(OutputArtifact::builder().name("SourceArtifact").build()?)
        .region(&spec.region)
        .namespace("SourceVariables")
        .build()?;

    let deploy_action = ActionDeclaration::builder()
        .name("DeployAction")
        .action_type_id(
            ActionTypeId::builder()
                .category(ActionCategory::Deploy)
                .owner(ActionOwner::Aws)
                .provider("S3")
                .version("1")
                .build()?,
        )
        .run_order(1)
        .configuration("BucketName", &spec.deploy_bucket)
        .configuration("Extract", "true")
        .input_artifacts(InputArtifact::builder().name("SourceArtifact").build()?)
        .region(&spec.region)
        .namespace("DeployVariables")
        .build()?;

    Ok(PipelineDeclaration::builder()
        .name(&spec.name)
        .role_arn(&spec.role_arn)
        .artifact_store(
            ArtifactStore::builder()
                .r#type(ArtifactStoreType::S3)
                .location(&spec.artifact_bucket)
                .build()?,
        )
        .stages(
            StageDeclaration::builder()
                .name("Source")
                .actions(source_action)
                .build()?,
        )
        .stages(
            StageDeclaration::builder()
                .name("Deploy")
                .actions(deploy_action)
                .build()?,
        )
        .version(1)
        .execution_mode(ExecutionMode::Superseded)
        .pipeline_type(PipelineType::V1)
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceRepo;

    fn spec() -> PipelineSpec {
        PipelineSpec {
            name: "example-com-pipeline".to_string(),
            role_arn: "arn:aws:iam::123456789012:role/pipeline".to_string(),
            source: SourceRepo {
                owner: "octocat".to_string(),
                repo: "website".to_string(),
                branch: "main".to_string(),
                connection_arn: "arn:aws:codestar-connections:us-east-1:123:connection/abc"
                    .to_string(),
            },
            deploy_bucket: "example.com".to_string(),
            artifact_bucket: "example-com-artifacts-us-east-1".to_string(),
            region: "us-east-1".to_string(),
        }
    }

    #[test]
    fn declaration_has_source_then_deploy() {
        let declaration = build_pipeline_declaration(&spec()).unwrap();

        assert_eq!(declaration.name(), "example-com-pipeline");
        assert_eq!(declaration.role_arn(), "arn:aws:iam::123456789012:role/pipeline");

        let stages = declaration.stages();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0].name(), "Source");
        assert_eq!(stages[1].name(), "Deploy");
    }

    #[test]
    fn source_action_points_at_the_repository() {
        let declaration = build_pipeline_declaration(&spec()).unwrap();
        let action = &declaration.stages()[0].actions()[0];

        assert_eq!(action.action_type_id().unwrap().provider(), "CodeStarSourceConnection");
        let configuration = action.configuration().unwrap();
        assert_eq!(
            configuration.get("FullRepositoryId").map(String::as_str),
            Some("octocat/website")
        );
        assert_eq!(configuration.get("BranchName").map(String::as_str), Some("main"));
        assert_eq!(
            configuration.get("OutputArtifactFormat").map(String::as_str),
            Some("CODE_ZIP")
        );
    }

    #[test]
    fn deploy_action_extracts_into_the_website_bucket() {
        let declaration = build_pipeline_declaration(&spec()).unwrap();
        let action = &declaration.stages()[1].actions()[0];

        assert_eq!(action.action_type_id().unwrap().provider(), "S3");
        let configuration = action.configuration().unwrap();
        assert_eq!(configuration.get("BucketName").map(String::as_str), Some("example.com"));
        assert_eq!(configuration.get("Extract").map(String::as_str), Some("true"));
    }

    #[test]
    fn artifact_store_targets_the_artifact_bucket() {
        let declaration = build_pipeline_declaration(&spec()).unwrap();
        let store = declaration.artifact_store().unwrap();
        assert_eq!(store.location(), "example-com-artifacts-us-east-1");
        assert_eq!(store.r#type(), &ArtifactStoreType::S3);
    }
}
