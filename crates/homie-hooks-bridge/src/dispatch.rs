//! Per-message routing: filter check, translation, republish.

use homie_hooks_core::{Message, MessageHandler, TopicFilter};
use tracing::{debug, warn};

use crate::publisher::Publisher;
use crate::stats::BridgeStats;

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Published on the given topic.
    Republished(String),
    /// The handler declined to translate it.
    Skipped,
    /// Topic matches none of the bridge's subscriptions.
    NotSubscribed,
    /// Translated to the given topic, but publishing failed.
    Failed(String),
}

/// Route one inbound message.
///
/// Messages are handled one at a time in arrival order; nothing here
/// retries.
pub async fn dispatch<H, P>(
    handler: &H,
    publisher: &P,
    filters: &[TopicFilter],
    message: &Message,
) -> Dispatch
where
    H: MessageHandler + ?Sized,
    P: Publisher + ?Sized,
{
    if !filters.iter().any(|filter| filter.matches(&message.topic)) {
        debug!(category = "bridge", topic = %message.topic, "Ignoring message outside subscriptions");
        return Dispatch::NotSubscribed;
    }

    let Some(outbound) = handler.handle(message) else {
        debug!(category = "bridge", topic = %message.topic, "Unhandled");
        return Dispatch::Skipped;
    };

    let topic = outbound.topic.clone();
    match publisher.publish(outbound).await {
        Ok(()) => {
            debug!(category = "bridge", from = %message.topic, to = %topic, "Republished");
            Dispatch::Republished(topic)
        }
        Err(e) => {
            warn!(category = "bridge", "Failed to publish {}: {}", topic, e);
            Dispatch::Failed(topic)
        }
    }
}

/// [`dispatch`] and count the outcome.
pub async fn dispatch_counted<H, P>(
    handler: &H,
    publisher: &P,
    filters: &[TopicFilter],
    message: &Message,
    stats: &BridgeStats,
) -> Dispatch
where
    H: MessageHandler + ?Sized,
    P: Publisher + ?Sized,
{
    let outcome = dispatch(handler, publisher, filters, message).await;
    stats.record(&outcome);
    outcome
}
