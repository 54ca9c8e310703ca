//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! tagged enums with explicit discriminants. Conversion functions live here
//! to keep `lib.rs` focused on the `extern "C"` surface.

use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use cep_core::{AddressLookupController, LookupState, Outcome, Phase, SubmitError, SubscriptionId};

/// Opaque handle to an `AddressLookupController`. C callers receive a pointer
/// to this and pass it back into every FFI function.
pub struct FfiController {
    pub(crate) inner: AddressLookupController,
    pub(crate) subscriptions: HashMap<u64, SubscriptionId>,
    pub(crate) next_subscription: u64,
}

impl FfiController {
    pub(crate) fn new(inner: AddressLookupController) -> Self {
        Self {
            inner,
            subscriptions: HashMap::new(),
            next_subscription: 1,
        }
    }
}

/// Copy a Rust string into a heap-allocated C string. Interior NUL bytes
/// cannot be represented in C and are dropped; the rest of the text is kept.
pub(crate) fn c_string(s: impl Into<String>) -> *mut c_char {
    let mut s = s.into();
    s.retain(|c| c != '\0');
    CString::new(s).unwrap_or_default().into_raw()
}

/// Read a borrowed C string. Null reads as empty; invalid UTF-8 is replaced.
pub(crate) fn read_c_str(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// A `GET` request the host must execute.
///
/// Returned by `cep_controller_begin_submit`. The host executes it and hands
/// the outcome back through `cep_controller_complete_submit` or
/// `cep_controller_fail_submit`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: cep_core::HttpRequest) -> *mut Self {
        let url = c_string(req.url);

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            url,
            headers,
            headers_len,
        }))
    }
}

/// An HTTP response described as C-compatible plain data.
///
/// The host constructs this on the stack after executing a request. The FFI
/// layer reads but does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

impl FfiHttpResponse {
    pub(crate) fn to_core(&self) -> cep_core::HttpResponse {
        cep_core::HttpResponse {
            status: self.status,
            headers: Vec::new(),
            body: read_c_str(self.body),
        }
    }
}

// ---------------------------------------------------------------------------
// Status codes
// ---------------------------------------------------------------------------

/// Result of a controller step.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiStatus {
    Ok = 0,
    InFlight = 1,
    NotAwaiting = 2,
    InvalidPostalCode = 3,
    NullArg = 4,
    Panic = 5,
}

impl From<SubmitError> for FfiStatus {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::InFlight => FfiStatus::InFlight,
            SubmitError::NotAwaiting => FfiStatus::NotAwaiting,
            SubmitError::InvalidPostalCode(_) => FfiStatus::InvalidPostalCode,
        }
    }
}

// ---------------------------------------------------------------------------
// State snapshot
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiPhase {
    Idle = 0,
    Awaiting = 1,
}

impl From<Phase> for FfiPhase {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Idle => FfiPhase::Idle,
            Phase::Awaiting => FfiPhase::Awaiting,
        }
    }
}

/// Tells the host which of `address` / `error_message` is set.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiOutcomeTag {
    Empty = 0,
    Found = 1,
    Failed = 2,
}

/// A resolved address exposed to C.
#[repr(C)]
pub struct FfiAddress {
    pub postal_code: *mut c_char,
    pub street: *mut c_char,
    pub district: *mut c_char,
    pub city: *mut c_char,
    pub state_code: *mut c_char,
}

/// Copy of the controller state.
///
/// `address` is non-null only when `outcome` is `Found`; `error_message` is
/// non-null only when `outcome` is `Failed`.
#[repr(C)]
pub struct FfiLookupState {
    pub code: *mut c_char,
    pub phase: FfiPhase,
    pub outcome: FfiOutcomeTag,
    pub address: *mut FfiAddress,
    pub error_message: *mut c_char,
}

impl FfiLookupState {
    pub(crate) fn from_core(state: &LookupState) -> *mut Self {
        let (outcome, address, error_message) = match state.outcome() {
            Outcome::Empty => (FfiOutcomeTag::Empty, std::ptr::null_mut(), std::ptr::null_mut()),
            Outcome::Found(a) => {
                let address = Box::new(FfiAddress {
                    postal_code: c_string(a.postal_code.as_str()),
                    street: c_string(a.street.as_str()),
                    district: c_string(a.district.as_str()),
                    city: c_string(a.city.as_str()),
                    state_code: c_string(a.state_code.as_str()),
                });
                (FfiOutcomeTag::Found, Box::into_raw(address), std::ptr::null_mut())
            }
            Outcome::Failed(message) => (
                FfiOutcomeTag::Failed,
                std::ptr::null_mut(),
                c_string(message.as_str()),
            ),
        };

        Box::into_raw(Box::new(FfiLookupState {
            code: c_string(state.code()),
            phase: state.phase().into(),
            outcome,
            address,
            error_message,
        }))
    }
}
