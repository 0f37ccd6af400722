//! Hub command dispatcher — turns hub `call_service` events into device
//! actuations.
//!
//! The dispatcher waits for the transport, subscribes once, then handles the
//! message stream until it closes. Each message is handled on its own: a bad
//! message is logged and the stream carries on.

use std::error::Error;
use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;

use kiosk_bridge_domain::error::BridgeError;
use kiosk_bridge_domain::hub::{CALL_SERVICE, HubEvent, HubEventKind, HubMessage};
use kiosk_bridge_domain::service::{DeviceCommand, ServiceCall};

use crate::ports::{DeviceApi, HubTransport, StatePusher};
use crate::services::StateSynchronizer;

/// Where the dispatcher is in its subscription lifecycle.
///
/// Only ever moves forward; once `Subscribed` it stays there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Unsubscribed,
    Subscribing,
    Subscribed,
}

/// Subscribes to hub service calls and executes them on the device.
pub struct HubCommandDispatcher<T, P, D> {
    transport: T,
    sync: Arc<StateSynchronizer<P, D>>,
    subscription: watch::Sender<SubscriptionState>,
}

impl<T, P, D> HubCommandDispatcher<T, P, D>
where
    T: HubTransport,
    P: StatePusher + 'static,
    D: DeviceApi + 'static,
{
    pub fn new(transport: T, sync: Arc<StateSynchronizer<P, D>>) -> Self {
        let (subscription, _) = watch::channel(SubscriptionState::Unsubscribed);
        Self {
            transport,
            sync,
            subscription,
        }
    }

    /// Observe the subscription lifecycle.
    #[must_use]
    pub fn subscription(&self) -> watch::Receiver<SubscriptionState> {
        self.subscription.subscribe()
    }

    /// Subscribe, then handle hub messages until the stream closes.
    pub async fn run(self) {
        let mut messages = self.subscribe().await;
        loop {
            match messages.recv().await {
                Ok(message) => self.handle_message(&message),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "hub message stream lagged behind");
                }
                Err(RecvError::Closed) => {
                    tracing::info!("hub message stream closed, dispatcher stopping");
                    break;
                }
            }
        }
    }

    /// Poll the transport until it is ready, then subscribe to service calls.
    ///
    /// Retries forever at the configured interval; there is no backoff.
    async fn subscribe(&self) -> broadcast::Receiver<HubMessage> {
        let retry = self.sync.timings().subscribe_retry;
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            if self.transport.is_ready() {
                self.subscription.send_replace(SubscriptionState::Subscribing);
                // Receiver first, so nothing sent right after the ack is missed.
                let messages = self.transport.messages();
                match self.transport.subscribe_events(CALL_SERVICE).await {
                    Ok(()) => {
                        self.subscription.send_replace(SubscriptionState::Subscribed);
                        tracing::info!(attempt, "subscribed to hub service calls");
                        return messages;
                    }
                    Err(err) => {
                        self.subscription.send_replace(SubscriptionState::Unsubscribed);
                        tracing::warn!(attempt, error = %err, "hub subscription failed, retrying");
                    }
                }
            } else {
                tracing::debug!(attempt, "hub transport not ready, retrying");
            }
            tokio::time::sleep(retry).await;
        }
    }

    /// Handle one hub message. Never fails; problems are logged.
    pub fn handle_message(&self, message: &HubMessage) {
        if !message.is_event() {
            tracing::debug!(kind = %message.kind, "ignoring non-event hub message");
            return;
        }
        let Some(event) = &message.event else {
            tracing::debug!("hub event message without payload");
            return;
        };
        if let Err(err) = self.handle_event(event) {
            tracing::error!(
                event_type = %event.event_type,
                error = %error_chain(&err),
                "failed to handle hub event"
            );
        }
    }

    fn handle_event(&self, event: &HubEvent) -> Result<(), BridgeError> {
        match event.kind() {
            None => {
                tracing::trace!(event_type = %event.event_type, "unhandled hub event");
                Ok(())
            }
            Some(HubEventKind::StateChanged) => {
                tracing::debug!(
                    entity_id = event.data.get("entity_id").and_then(|id| id.as_str()),
                    "hub entity state changed"
                );
                Ok(())
            }
            Some(HubEventKind::CallService) => self.handle_service_call(event),
        }
    }

    fn handle_service_call(&self, event: &HubEvent) -> Result<(), BridgeError> {
        let call = ServiceCall::from_event_data(&event.data)?;
        tracing::debug!(domain = %call.domain, service = %call.service, "service call received");

        let plan = call.plan(self.sync.bindings())?;
        if let Some(service) = &plan.unsupported {
            tracing::warn!(domain = %call.domain, service = %service, "service not supported by the kiosk");
        }
        for command in &plan.commands {
            self.execute(command)?;
        }
        Ok(())
    }

    fn execute(&self, command: &DeviceCommand) -> Result<(), BridgeError> {
        tracing::info!(%command, "actuating device");
        self.sync.device().execute(command)?;
        if let DeviceCommand::SetScreenBrightness(level) = command {
            self.sync.update(|state| state.screen_brightness = Some(*level));
        }
        Ok(())
    }
}

/// `outer: inner: root` rendering of an error and its sources.
fn error_chain(err: &dyn Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
