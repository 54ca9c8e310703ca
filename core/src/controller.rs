//! The address-lookup controller.
//!
//! # Design
//! The controller owns the only copy of `LookupState` and is its only writer.
//! A submission runs in three steps so the network call can live anywhere:
//!
//! 1. `begin_submit` validates the code, enters `Awaiting`, and hands back the
//!    `HttpRequest` to execute.
//! 2. The caller executes it.
//! 3. `complete_submit` (a response arrived) or `fail_submit` (no response)
//!    resolves the outcome and returns to `Idle`.
//!
//! `submit` chains the steps over a [`Transport`]. While a lookup is
//! outstanding, further `begin_submit` calls are rejected; nothing is
//! cancelled and nothing is queued.
//!
//! Every transition is pushed to subscribers after the new state is in place.

use tracing::{debug, warn};

use crate::client::ViaCepClient;
use crate::error::{LookupError, SubmitError, TransportError};
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::postal_code::PostalCode;
use crate::state::{LookupState, Outcome};
use crate::types::Address;

/// Receives every new `LookupState`.
pub trait Subscriber {
    fn notify(&mut self, state: &LookupState);
}

impl<F> Subscriber for F
where
    F: FnMut(&LookupState),
{
    fn notify(&mut self, state: &LookupState) {
        self(state)
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct AddressLookupController {
    client: ViaCepClient,
    state: LookupState,
    subscribers: Vec<(SubscriptionId, Box<dyn Subscriber>)>,
    next_subscription: u64,
}

impl AddressLookupController {
    pub fn new(client: ViaCepClient) -> Self {
        Self {
            client,
            state: LookupState::default(),
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn state(&self) -> &LookupState {
        &self.state
    }

    pub fn client(&self) -> &ViaCepClient {
        &self.client
    }

    pub fn subscribe(&mut self, subscriber: impl Subscriber + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    /// Replace the input text. No validation happens here.
    pub fn update_code(&mut self, text: impl Into<String>) {
        let code = text.into();
        self.transition(|state| state.with_code(code));
    }

    /// Validate the current code and start a lookup.
    ///
    /// On `InvalidPostalCode` the state has already been resolved to the
    /// validation error and no request must be executed.
    pub fn begin_submit(&mut self) -> Result<HttpRequest, SubmitError> {
        if self.state.is_awaiting() {
            warn!(code = %self.state.code(), "submission rejected, lookup already in flight");
            return Err(SubmitError::InFlight);
        }

        let code = match PostalCode::parse(self.state.code()) {
            Ok(code) => code,
            Err(err) => {
                debug!(error = %err, "rejected before request");
                let raw = self.state.code().to_string();
                self.transition(|state| state.resolved(Outcome::Failed(err.user_message())));
                return Err(SubmitError::InvalidPostalCode(raw));
            }
        };

        let request = self.client.build_lookup(&code);
        debug!(code = %code, url = %request.url, "lookup started");
        self.transition(LookupState::awaiting);
        Ok(request)
    }

    /// Resolve the outstanding lookup with the response that arrived.
    pub fn complete_submit(&mut self, response: HttpResponse) -> Result<(), SubmitError> {
        if !self.state.is_awaiting() {
            warn!(status = response.status, "response dropped, no lookup in flight");
            return Err(SubmitError::NotAwaiting);
        }
        let result = self.client.parse_lookup(response);
        self.resolve(result);
        Ok(())
    }

    /// Resolve the outstanding lookup as a transport failure.
    pub fn fail_submit(&mut self, error: TransportError) -> Result<(), SubmitError> {
        if !self.state.is_awaiting() {
            warn!(error = %error, "failure dropped, no lookup in flight");
            return Err(SubmitError::NotAwaiting);
        }
        self.resolve(Err(error.into()));
        Ok(())
    }

    /// Run a full lookup over `transport` and return the resolved state.
    pub async fn submit<T: Transport>(&mut self, transport: &T) -> &LookupState {
        let request = match self.begin_submit() {
            Ok(request) => request,
            Err(_) => return &self.state,
        };

        let resolution = match transport.execute(request).await {
            Ok(response) => self.complete_submit(response),
            Err(err) => self.fail_submit(err),
        };
        if let Err(err) = resolution {
            warn!(error = %err, "lookup resolved out of order");
        }
        &self.state
    }

    fn resolve(&mut self, result: Result<Address, LookupError>) {
        let outcome = match result {
            Ok(address) => {
                debug!(postal_code = %address.postal_code, "lookup succeeded");
                Outcome::Found(address)
            }
            Err(err) => {
                debug!(error = %err, "lookup failed");
                Outcome::Failed(err.user_message())
            }
        };
        self.transition(|state| state.resolved(outcome));
    }

    fn transition(&mut self, f: impl FnOnce(LookupState) -> LookupState) {
        let current = std::mem::take(&mut self.state);
        self.state = f(current);
        for (_, subscriber) in &mut self.subscribers {
            subscriber.notify(&self.state);
        }
    }
}
