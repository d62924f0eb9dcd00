use crate::error::ProviderError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub subject: String,
    pub body: String,
    /// Ordering key for FIFO destinations; always the dataset id.
    pub group_id: String,
}

pub trait CompletionPublisher {
    fn publish(&self, message: &OutboundMessage) -> Result<(), ProviderError>;
}

impl<F> CompletionPublisher for F
where
    F: Fn(&OutboundMessage) -> Result<(), ProviderError>,
{
    fn publish(&self, message: &OutboundMessage) -> Result<(), ProviderError> {
        self(message)
    }
}
