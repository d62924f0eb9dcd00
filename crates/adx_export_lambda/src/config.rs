use std::time::Duration;

use adx_export_core::contract::{
    ExportDestination, MessageShape, DEFAULT_ASSET_BATCH_SIZE, DEFAULT_DESTINATION_PREFIX,
    DEFAULT_TABLE_NAME,
};

use crate::error::ConfigError;
use crate::handlers::poll::PollPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundTarget {
    Sqs {
        queue_url: String,
        endpoint_url: Option<String>,
    },
    Sns {
        topic_arn: String,
    },
}

impl OutboundTarget {
    pub fn describe(&self) -> &str {
        match self {
            Self::Sqs { queue_url, .. } => queue_url,
            Self::Sns { topic_arn } => topic_arn,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub region: String,
    pub destination: ExportDestination,
    pub inbound_queue: String,
    pub outbound: OutboundTarget,
    pub message_shape: MessageShape,
    pub table_name: String,
    pub asset_batch_size: usize,
    pub poll_policy: PollPolicy,
}

impl RelayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration from `lookup`. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |name: &'static str| read(name).ok_or(ConfigError::Missing(name));

        let region = required("AWS_REGION")?;
        let bucket = required("S3_BUCKET")?;
        let inbound_queue = required("INBOUND_SQS_QUEUE")?;

        let channel = read("OUTBOUND_CHANNEL").unwrap_or_else(|| "sqs".to_string());
        let outbound = match channel.to_ascii_lowercase().as_str() {
            "sqs" => OutboundTarget::Sqs {
                queue_url: required("OUTBOUND_SQS_QUEUE")?,
                endpoint_url: read("OUTBOUND_SQS_ENDPOINT"),
            },
            "sns" => OutboundTarget::Sns {
                topic_arn: required("OUTBOUND_SNS_TOPIC")?,
            },
            _ => {
                return Err(ConfigError::Invalid {
                    name: "OUTBOUND_CHANNEL",
                    value: channel,
                    reason: "expected 'sqs' or 'sns'".to_string(),
                });
            }
        };

        let message_shape = match read("MESSAGE_SHAPE") {
            Some(value) => MessageShape::parse(&value).map_err(|error| ConfigError::Invalid {
                name: "MESSAGE_SHAPE",
                value,
                reason: error.message().to_string(),
            })?,
            None => MessageShape::default(),
        };

        let asset_batch_size =
            parse_positive(&read, "ASSET_BATCH_SIZE")?.unwrap_or(DEFAULT_ASSET_BATCH_SIZE);
        let interval = match read("POLL_INTERVAL_MS") {
            Some(value) => Duration::from_millis(value.parse::<u64>().map_err(|error| {
                ConfigError::Invalid {
                    name: "POLL_INTERVAL_MS",
                    value: value.clone(),
                    reason: error.to_string(),
                }
            })?),
            None => PollPolicy::default().interval,
        };
        let max_rounds = match parse_positive(&read, "POLL_MAX_ROUNDS")? {
            Some(value) => u32::try_from(value).map_err(|error| ConfigError::Invalid {
                name: "POLL_MAX_ROUNDS",
                value: value.to_string(),
                reason: error.to_string(),
            })?,
            None => PollPolicy::default().max_rounds,
        };

        Ok(Self {
            region,
            destination: ExportDestination {
                bucket,
                prefix: read("DESTINATION_PREFIX")
                    .unwrap_or_else(|| DEFAULT_DESTINATION_PREFIX.to_string()),
            },
            inbound_queue,
            outbound,
            message_shape,
            table_name: read("TABLE_NAME").unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            asset_batch_size,
            poll_policy: PollPolicy {
                interval,
                max_rounds,
            },
        })
    }
}

fn parse_positive(
    read: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<usize>, ConfigError> {
    let Some(value) = read(name) else {
        return Ok(None);
    };

    match value.parse::<usize>() {
        Ok(0) => Err(ConfigError::Invalid {
            name,
            value,
            reason: "must be a positive integer".to_string(),
        }),
        Ok(parsed) => Ok(Some(parsed)),
        Err(error) => Err(ConfigError::Invalid {
            name,
            value,
            reason: error.to_string(),
        }),
    }
}
