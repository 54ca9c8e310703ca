//! Postal-code (CEP) address lookup core.
//!
//! # Overview
//! `AddressLookupController` owns the input text and the outcome of the last
//! lookup, and pushes every change to its subscribers. Lookups go through
//! `ViaCepClient`, which builds `HttpRequest` values and parses
//! `HttpResponse` values without touching the network (host-does-IO
//! pattern).
//!
//! # Design
//! - `ViaCepClient` is stateless; it holds only `base_url`.
//! - The network round trip is either driven by the caller between
//!   `begin_submit` and `complete_submit` / `fail_submit`, or delegated to a
//!   [`Transport`] through `submit`.
//! - `LookupState` stores one `Outcome`, so an address and an error message
//!   are never present together.
//! - Types use owned `String` / `Vec` fields to simplify FFI mapping.

pub mod client;
pub mod controller;
pub mod error;
pub mod http;
pub mod postal_code;
pub mod state;
pub mod types;

pub use client::{ViaCepClient, DEFAULT_BASE_URL};
pub use controller::{AddressLookupController, Subscriber, SubscriptionId};
pub use error::{LookupError, SubmitError, TransportError, FALLBACK_MESSAGE, INVALID_POSTAL_CODE_MESSAGE};
pub use http::{HttpRequest, HttpResponse, Transport};
pub use postal_code::PostalCode;
pub use state::{LookupState, Outcome, Phase};
pub use types::Address;
