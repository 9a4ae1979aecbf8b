//! Event loop around the core.
//!
//! The runtime owns the [`Core`] and is the only place that mutates it.
//! Every HTTP effect runs on its own task. The task reports back over a
//! channel and the owner resolves the matching crux request on the next
//! [`Runtime::next_response`].

use std::collections::HashMap;
use std::sync::Arc;

use crux_core::Request;
use shared::capabilities::HttpRequest;
use shared::{Core, Effect, Event, HttpError, HttpResult, Settings, ViewModel};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::transport::Transport;

type Slot = u64;

/// Outcome of one request task. `None` means the task ended without
/// producing a result, for example because it panicked.
struct Completion {
    slot: Slot,
    outcome: Option<HttpResult>,
}

/// Reports a task's completion exactly once, even when the task unwinds.
struct CompletionGuard {
    slot: Slot,
    tx: Option<mpsc::UnboundedSender<Completion>>,
}

impl CompletionGuard {
    fn finish(mut self, result: HttpResult) {
        if let Some(tx) = self.tx.take() {
            Self::send(&tx, self.slot, Some(result));
        }
    }

    fn send(tx: &mpsc::UnboundedSender<Completion>, slot: Slot, outcome: Option<HttpResult>) {
        if tx.send(Completion { slot, outcome }).is_err() {
            warn!(slot, "runtime gone before response was applied");
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            Self::send(&tx, self.slot, None);
        }
    }
}

pub struct Runtime<T: Transport> {
    core: Core,
    transport: Arc<T>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: HashMap<Slot, Request<HttpRequest>>,
    next_slot: Slot,
}

impl<T: Transport> Runtime<T> {
    pub fn new(settings: Settings, transport: T) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut runtime = Self {
            core: Core::default(),
            transport: Arc::new(transport),
            tx,
            rx,
            in_flight: HashMap::new(),
            next_slot: 0,
        };
        runtime.dispatch(Event::Configure(Box::new(settings)));
        runtime
    }

    /// Applies `event` and starts any requests it produces.
    ///
    /// Returns `true` when the core asked for a render.
    pub fn dispatch(&mut self, event: Event) -> bool {
        let effects = self.core.process_event(event);
        self.run_effects(effects)
    }

    /// Waits for the next response and applies it.
    ///
    /// Never completes while nothing is in flight. Cancel safe: a response
    /// is only taken off the channel when it is applied in the same poll.
    pub async fn next_response(&mut self) -> bool {
        let Some(Completion { slot, outcome }) = self.rx.recv().await else {
            // The runtime holds a sender, so the channel never closes.
            return false;
        };
        let Some(mut request) = self.in_flight.remove(&slot) else {
            warn!(slot, "completion for an unknown request");
            return false;
        };

        let result = outcome.unwrap_or_else(|| {
            let operation = &request.operation;
            warn!(
                request_id = operation.request_id(),
                "request task ended without a response"
            );
            Err(HttpError::Connection {
                host: operation.url().host().to_string(),
                message: "request task ended without a response".to_string(),
                request_id: operation.request_id().to_string(),
            })
        });

        let effects = self.core.resolve(&mut request, result);
        self.run_effects(effects)
    }

    /// Drives responses until nothing is in flight, including follow-up
    /// requests started by earlier responses.
    pub async fn settle(&mut self) {
        while !self.in_flight.is_empty() {
            self.next_response().await;
        }
    }

    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    pub fn view(&self) -> ViewModel {
        self.core.view()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn run_effects(&mut self, effects: Vec<Effect>) -> bool {
        let mut render = false;
        for effect in effects {
            match effect {
                Effect::Http(request) => self.spawn_request(request),
                Effect::Render(_) => render = true,
            }
        }
        render
    }

    fn spawn_request(&mut self, request: Request<HttpRequest>) {
        let slot = self.next_slot;
        self.next_slot += 1;

        let operation = request.operation.clone();
        debug!(
            slot,
            request_id = operation.request_id(),
            method = operation.method().as_str(),
            url = %operation.url(),
            "dispatching request"
        );
        self.in_flight.insert(slot, request);

        let transport = Arc::clone(&self.transport);
        let guard = CompletionGuard {
            slot,
            tx: Some(self.tx.clone()),
        };
        tokio::spawn(async move {
            let result = transport.execute(&operation).await;
            guard.finish(result);
        });
    }
}
