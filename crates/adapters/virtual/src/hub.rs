//! In-process hub transport.

use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;

use kiosk_bridge_app::ports::HubTransport;
use kiosk_bridge_domain::error::BridgeError;
use kiosk_bridge_domain::hub::HubMessage;

use crate::lock;

/// A hub event stream driven by the caller.
///
/// Starts disconnected; [`connect`](Self::connect) flips it ready and
/// [`inject`](Self::inject) delivers messages to every listener.
pub struct VirtualHubTransport {
    ready: AtomicBool,
    token: Option<String>,
    subscriptions: Mutex<Vec<String>>,
    sender: broadcast::Sender<HubMessage>,
}

impl VirtualHubTransport {
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        let (sender, _) = broadcast::channel(64);
        Self {
            ready: AtomicBool::new(false),
            token,
            subscriptions: Mutex::new(Vec::new()),
            sender,
        }
    }

    pub fn connect(&self) {
        self.ready.store(true, Ordering::SeqCst);
        tracing::info!("virtual hub transport connected");
    }

    /// Event types subscribed to so far.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<String> {
        lock(&self.subscriptions).clone()
    }

    /// Deliver `message` as if the hub had sent it. Returns whether anyone
    /// was listening.
    pub fn inject(&self, message: HubMessage) -> bool {
        self.sender.send(message).is_ok()
    }
}

impl HubTransport for VirtualHubTransport {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn subscribe_events(&self, event_type: &str) -> impl Future<Output = Result<(), BridgeError>> + Send {
        let result = if self.is_ready() {
            lock(&self.subscriptions).push(event_type.to_string());
            tracing::debug!(event_type, "virtual hub subscription");
            Ok(())
        } else {
            Err(BridgeError::TransportNotReady)
        };
        async move { result }
    }

    fn messages(&self) -> broadcast::Receiver<HubMessage> {
        self.sender.subscribe()
    }

    fn access_token(&self) -> Option<String> {
        self.token.clone()
    }
}
