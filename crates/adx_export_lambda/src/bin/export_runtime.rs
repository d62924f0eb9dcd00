use std::future::Future;
use std::time::Duration;

use adx_export_lambda::adapters::data_exchange::{DataExchange, ExportJobRequest};
use adx_export_lambda::adapters::publisher::{CompletionPublisher, OutboundMessage};
use adx_export_lambda::config::{OutboundTarget, RelayConfig};
use adx_export_lambda::error::ProviderError;
use adx_export_lambda::handlers::revision_event::{handle_revision_event, InvocationResponse};
use adx_export_lambda::logging::init_tracing;
use adx_export_lambda::runtime::contract::{
    Asset, ExportJobState, ExportJobStatus, RevisionReference,
};
use aws_sdk_dataexchange::types::{
    AssetDestinationEntry, ExportAssetsToS3RequestDetails, RequestDetails, Type,
};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::{error, info};

/// Drives an SDK future to completion from the synchronous handler code.
fn run_blocking<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

fn pause_blocking(interval: Duration) {
    tokio::task::block_in_place(|| std::thread::sleep(interval));
}

struct AwsDataExchange {
    client: aws_sdk_dataexchange::Client,
}

impl DataExchange for AwsDataExchange {
    fn list_revision_assets(
        &self,
        revision: &RevisionReference,
    ) -> Result<Vec<Asset>, ProviderError> {
        let client = self.client.clone();
        let dataset_id = revision.dataset_id.clone();
        let revision_id = revision.revision_id.clone();

        run_blocking(async move {
            let mut assets = Vec::new();
            let mut next_token: Option<String> = None;
            loop {
                let page = client
                    .list_revision_assets()
                    .data_set_id(&dataset_id)
                    .revision_id(&revision_id)
                    .set_next_token(next_token.take())
                    .send()
                    .await
                    .map_err(|error| {
                        ProviderError::new(
                            "ListRevisionAssets",
                            aws_sdk_dataexchange::error::DisplayErrorContext(&error).to_string(),
                        )
                    })?;

                assets.extend(page.assets().iter().map(|entry| Asset {
                    id: entry.id().to_string(),
                    name: entry.name().to_string(),
                }));

                match page.next_token() {
                    Some(token) => next_token = Some(token.to_string()),
                    None => break,
                }
            }
            Ok(assets)
        })
    }

    fn create_export_job(&self, request: &ExportJobRequest) -> Result<String, ProviderError> {
        let destinations = request
            .destinations
            .iter()
            .map(|destination| {
                AssetDestinationEntry::builder()
                    .asset_id(&destination.asset_id)
                    .bucket(&destination.bucket)
                    .key(&destination.key)
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|error| ProviderError::new("CreateJob", error.to_string()))?;
        let details = ExportAssetsToS3RequestDetails::builder()
            .data_set_id(&request.revision.dataset_id)
            .revision_id(&request.revision.revision_id)
            .set_asset_destinations(Some(destinations))
            .build()
            .map_err(|error| ProviderError::new("CreateJob", error.to_string()))?;
        let client = self.client.clone();

        run_blocking(async move {
            let output = client
                .create_job()
                .r#type(Type::ExportAssetsToS3)
                .details(RequestDetails::builder().export_assets_to_s3(details).build())
                .send()
                .await
                .map_err(|error| {
                    ProviderError::new(
                        "CreateJob",
                        aws_sdk_dataexchange::error::DisplayErrorContext(&error).to_string(),
                    )
                })?;
            output
                .id()
                .map(str::to_string)
                .ok_or_else(|| ProviderError::new("CreateJob", "response carried no job id"))
        })
    }

    fn start_job(&self, job_id: &str) -> Result<(), ProviderError> {
        let client = self.client.clone();
        let job_id = job_id.to_string();

        run_blocking(async move {
            client
                .start_job()
                .job_id(job_id)
                .send()
                .await
                .map(|_| ())
                .map_err(|error| {
                    ProviderError::new(
                        "StartJob",
                        aws_sdk_dataexchange::error::DisplayErrorContext(&error).to_string(),
                    )
                })
        })
    }

    fn get_job(&self, job_id: &str) -> Result<ExportJobStatus, ProviderError> {
        let client = self.client.clone();
        let job_id = job_id.to_string();

        run_blocking(async move {
            let output = client
                .get_job()
                .job_id(job_id)
                .send()
                .await
                .map_err(|error| {
                    ProviderError::new(
                        "GetJob",
                        aws_sdk_dataexchange::error::DisplayErrorContext(&error).to_string(),
                    )
                })?;

            let state = output
                .state()
                .map(|state| ExportJobState::from_provider_state(state.as_str()))
                .unwrap_or(ExportJobState::Submitted);
            let errors = output
                .errors()
                .iter()
                .map(|job_error| format!("{}: {}", job_error.code().as_str(), job_error.message()))
                .collect();
            Ok(ExportJobStatus { state, errors })
        })
    }
}

struct SqsCompletionPublisher {
    client: aws_sdk_sqs::Client,
    queue_url: String,
}

impl CompletionPublisher for SqsCompletionPublisher {
    fn publish(&self, message: &OutboundMessage) -> Result<(), ProviderError> {
        let client = self.client.clone();
        let queue_url = self.queue_url.clone();
        let message = message.clone();

        run_blocking(async move {
            client
                .send_message()
                .queue_url(queue_url)
                .message_body(message.body)
                .message_group_id(message.group_id)
                .send()
                .await
                .map(|_| ())
                .map_err(|error| {
                    ProviderError::new(
                        "SendMessage",
                        aws_sdk_sqs::error::DisplayErrorContext(&error).to_string(),
                    )
                })
        })
    }
}

struct SnsCompletionPublisher {
    client: aws_sdk_sns::Client,
    topic_arn: String,
}

impl CompletionPublisher for SnsCompletionPublisher {
    fn publish(&self, message: &OutboundMessage) -> Result<(), ProviderError> {
        let client = self.client.clone();
        let topic_arn = self.topic_arn.clone();
        let group_id = fifo_group_id(&self.topic_arn, &message.group_id);
        let message = message.clone();

        run_blocking(async move {
            client
                .publish()
                .topic_arn(topic_arn)
                .subject(message.subject)
                .message(message.body)
                .set_message_group_id(group_id)
                .send()
                .await
                .map(|_| ())
                .map_err(|error| {
                    ProviderError::new(
                        "Publish",
                        aws_sdk_sns::error::DisplayErrorContext(&error).to_string(),
                    )
                })
        })
    }
}

/// Standard topics reject a message group id; FIFO topics require one.
fn fifo_group_id(topic_arn: &str, group_id: &str) -> Option<String> {
    topic_arn
        .ends_with(".fifo")
        .then(|| group_id.to_string())
}

struct RuntimeDependencies {
    config: RelayConfig,
    data_exchange: AwsDataExchange,
    publisher: Box<dyn CompletionPublisher + Send + Sync>,
}

fn build_publisher(
    target: &OutboundTarget,
    aws_config: &aws_config::SdkConfig,
) -> Box<dyn CompletionPublisher + Send + Sync> {
    match target {
        OutboundTarget::Sqs {
            queue_url,
            endpoint_url,
        } => {
            let mut builder = aws_sdk_sqs::config::Builder::from(aws_config);
            if let Some(endpoint_url) = endpoint_url {
                builder = builder.endpoint_url(endpoint_url);
            }
            Box::new(SqsCompletionPublisher {
                client: aws_sdk_sqs::Client::from_conf(builder.build()),
                queue_url: queue_url.clone(),
            })
        }
        OutboundTarget::Sns { topic_arn } => Box::new(SnsCompletionPublisher {
            client: aws_sdk_sns::Client::new(aws_config),
            topic_arn: topic_arn.clone(),
        }),
    }
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<InvocationResponse, Error> {
    info!(request_id = %event.context.request_id, "invocation started");

    handle_revision_event(
        &event.payload,
        &deps.config,
        &deps.data_exchange,
        deps.publisher.as_ref(),
        &pause_blocking,
    )
    .map_err(|relay_error| {
        error!(error = %relay_error, "invocation failed");
        Error::from(relay_error)
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = RelayConfig::from_env().map_err(|config_error| {
        error!(error = %config_error, "invalid configuration");
        Error::from(config_error)
    })?;

    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.region.clone()))
        .load()
        .await;
    let deps = RuntimeDependencies {
        data_exchange: AwsDataExchange {
            client: aws_sdk_dataexchange::Client::new(&aws_config),
        },
        publisher: build_publisher(&config.outbound, &aws_config),
        config,
    };
    info!(
        bucket = %deps.config.destination.bucket,
        outbound = %deps.config.outbound.describe(),
        "export relay ready"
    );

    lambda_runtime::run(service_fn(|event: LambdaEvent<Value>| {
        handle_request(event, &deps)
    }))
    .await
}
