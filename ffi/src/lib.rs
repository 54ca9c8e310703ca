//! C-ABI wrapper around `cep-core`.
//!
//! # Overview
//! Exposes the address-lookup controller through `extern "C"` functions so a
//! presentation layer written in any language with a C FFI can drive it. The
//! host performs the HTTP round trip: `cep_controller_begin_submit` hands out
//! the request, and the host reports back with
//! `cep_controller_complete_submit` or `cep_controller_fail_submit`.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - State is read through `cep_controller_snapshot`, which copies the
//!   controller state into an `FfiLookupState`.
//! - Subscribers are plain C callbacks that receive the new state and a
//!   `user_data` pointer. They run synchronously inside the call that caused
//!   the transition and must not call back into the same controller; the
//!   state they are handed is the way to read it.
//! - The C caller owns all returned pointers and must call the matching
//!   `cep_free_*` function to release them.

pub mod types;

use std::ffi::CString;
use std::os::raw::{c_char, c_void};
use std::panic::{catch_unwind, AssertUnwindSafe};

use cep_core::{AddressLookupController, LookupState, TransportError, ViaCepClient};

use types::*;

/// Called after every state transition with the new state and the
/// `user_data` given to `cep_controller_subscribe`.
///
/// `state` is owned by the library and freed when the callback returns. Copy
/// anything that must outlive the call.
pub type FfiStateCallback = extern "C" fn(state: *const FfiLookupState, user_data: *mut c_void);

/// Store `status` through `out` when `out` is non-null.
fn write_status(out: *mut FfiStatus, status: FfiStatus) {
    if !out.is_null() {
        unsafe { *out = status };
    }
}

// ---------------------------------------------------------------------------
// Controller lifecycle
// ---------------------------------------------------------------------------

/// Create a controller that looks codes up under `base_url`.
///
/// A null `base_url` selects the public ViaCEP endpoint. Returns null only
/// if an internal panic occurs. Free with `cep_controller_free`.
#[unsafe(no_mangle)]
pub extern "C" fn cep_controller_new(base_url: *const c_char) -> *mut FfiController {
    catch_unwind(|| {
        let client = if base_url.is_null() {
            ViaCepClient::default()
        } else {
            ViaCepClient::new(&read_c_str(base_url))
        };
        let controller = AddressLookupController::new(client);
        Box::into_raw(Box::new(FfiController::new(controller)))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a controller created by `cep_controller_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn cep_controller_free(controller: *mut FfiController) {
    if !controller.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(controller) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Replace the input text. A null `text` clears it.
#[unsafe(no_mangle)]
pub extern "C" fn cep_controller_update_code(
    controller: *mut FfiController,
    text: *const c_char,
) -> FfiStatus {
    catch_unwind(AssertUnwindSafe(|| {
        if controller.is_null() {
            return FfiStatus::NullArg;
        }
        let controller = unsafe { &mut *controller };
        controller.inner.update_code(read_c_str(text));
        FfiStatus::Ok
    }))
    .unwrap_or(FfiStatus::Panic)
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// Start a lookup for the current code.
///
/// Returns the request the host must execute, or null. On null, `status_out`
/// (if non-null) says why: `InFlight` when a lookup is already outstanding,
/// `InvalidPostalCode` when the code failed validation (the state already
/// shows the error). Free the request with `cep_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn cep_controller_begin_submit(
    controller: *mut FfiController,
    status_out: *mut FfiStatus,
) -> *mut FfiHttpRequest {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        if controller.is_null() {
            return Err(FfiStatus::NullArg);
        }
        let controller = unsafe { &mut *controller };
        controller
            .inner
            .begin_submit()
            .map(FfiHttpRequest::from_core)
            .map_err(FfiStatus::from)
    }))
    .unwrap_or(Err(FfiStatus::Panic));

    match outcome {
        Ok(request) => {
            write_status(status_out, FfiStatus::Ok);
            request
        }
        Err(status) => {
            write_status(status_out, status);
            std::ptr::null_mut()
        }
    }
}

/// Resolve the outstanding lookup with the response the host received.
///
/// Any status code counts as a response; only call
/// `cep_controller_fail_submit` when no response arrived at all.
#[unsafe(no_mangle)]
pub extern "C" fn cep_controller_complete_submit(
    controller: *mut FfiController,
    response: *const FfiHttpResponse,
) -> FfiStatus {
    catch_unwind(AssertUnwindSafe(|| {
        if controller.is_null() || response.is_null() {
            return FfiStatus::NullArg;
        }
        let controller = unsafe { &mut *controller };
        let response = unsafe { &*response }.to_core();
        match controller.inner.complete_submit(response) {
            Ok(()) => FfiStatus::Ok,
            Err(e) => e.into(),
        }
    }))
    .unwrap_or(FfiStatus::Panic)
}

/// Resolve the outstanding lookup as a transport failure. `reason` may be
/// null; it is only logged, the state shows the generic message.
#[unsafe(no_mangle)]
pub extern "C" fn cep_controller_fail_submit(
    controller: *mut FfiController,
    reason: *const c_char,
) -> FfiStatus {
    catch_unwind(AssertUnwindSafe(|| {
        if controller.is_null() {
            return FfiStatus::NullArg;
        }
        let controller = unsafe { &mut *controller };
        let error = TransportError::new(read_c_str(reason));
        match controller.inner.fail_submit(error) {
            Ok(()) => FfiStatus::Ok,
            Err(e) => e.into(),
        }
    }))
    .unwrap_or(FfiStatus::Panic)
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Copy the current state. Returns null if `controller` is null.
/// Free with `cep_free_state`.
#[unsafe(no_mangle)]
pub extern "C" fn cep_controller_snapshot(controller: *const FfiController) -> *mut FfiLookupState {
    catch_unwind(AssertUnwindSafe(|| {
        if controller.is_null() {
            return std::ptr::null_mut();
        }
        let controller = unsafe { &*controller };
        FfiLookupState::from_core(controller.inner.state())
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Register `callback` to run after every state transition.
///
/// Returns a non-zero subscription id, or 0 if an argument is null.
#[unsafe(no_mangle)]
pub extern "C" fn cep_controller_subscribe(
    controller: *mut FfiController,
    callback: Option<FfiStateCallback>,
    user_data: *mut c_void,
) -> u64 {
    catch_unwind(AssertUnwindSafe(|| {
        let Some(callback) = callback else {
            return 0;
        };
        if controller.is_null() {
            return 0;
        }
        let controller = unsafe { &mut *controller };
        let id = controller.inner.subscribe(move |state: &LookupState| {
            let snapshot = FfiLookupState::from_core(state);
            callback(snapshot, user_data);
            cep_free_state(snapshot);
        });
        let handle = controller.next_subscription;
        controller.next_subscription += 1;
        controller.subscriptions.insert(handle, id);
        handle
    }))
    .unwrap_or(0)
}

/// Remove a subscription. Returns false for unknown ids.
#[unsafe(no_mangle)]
pub extern "C" fn cep_controller_unsubscribe(controller: *mut FfiController, subscription: u64) -> bool {
    catch_unwind(AssertUnwindSafe(|| {
        if controller.is_null() {
            return false;
        }
        let controller = unsafe { &mut *controller };
        match controller.subscriptions.remove(&subscription) {
            Some(id) => controller.inner.unsubscribe(id),
            None => false,
        }
    }))
    .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by `cep_controller_begin_submit`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn cep_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let req = unsafe { Box::from_raw(req) };
        free_c_string(req.url);
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                free_c_string(h.key);
                free_c_string(h.value);
            }
        }
    }));
}

/// Free an `FfiLookupState` returned by `cep_controller_snapshot`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn cep_free_state(state: *mut FfiLookupState) {
    if state.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let state = unsafe { Box::from_raw(state) };
        free_c_string(state.code);
        free_c_string(state.error_message);
        if !state.address.is_null() {
            let address = unsafe { Box::from_raw(state.address) };
            free_c_string(address.postal_code);
            free_c_string(address.street);
            free_c_string(address.district);
            free_c_string(address.city);
            free_c_string(address.state_code);
        }
    }));
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn cep_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| free_c_string(s)));
    }
}

fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::{CStr, CString};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const SE_BODY: &str = r#"{"cep":"01001-000","logradouro":"Praça da Sé","bairro":"Sé","localidade":"São Paulo","uf":"SP"}"#;

    fn new_controller() -> *mut FfiController {
        let url = CString::new("http://localhost:3000/ws").unwrap();
        let controller = cep_controller_new(url.as_ptr());
        assert!(!controller.is_null());
        controller
    }

    fn set_code(controller: *mut FfiController, code: &str) {
        let code = CString::new(code).unwrap();
        assert_eq!(cep_controller_update_code(controller, code.as_ptr()), FfiStatus::Ok);
    }

    fn str_at(ptr: *const c_char) -> String {
        unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string()
    }

    #[test]
    fn controller_new_and_free() {
        let controller = new_controller();
        cep_controller_free(controller);
    }

    #[test]
    fn controller_new_null_uses_default_endpoint() {
        let controller = cep_controller_new(std::ptr::null());
        assert!(!controller.is_null());
        let base = unsafe { &*controller }.inner.client().base_url().to_string();
        assert_eq!(base, cep_core::DEFAULT_BASE_URL);
        cep_controller_free(controller);
    }

    #[test]
    fn controller_free_null_is_safe() {
        cep_controller_free(std::ptr::null_mut());
    }

    #[test]
    fn update_code_is_visible_in_snapshot() {
        let controller = new_controller();
        set_code(controller, "01001-000");

        let state = cep_controller_snapshot(controller);
        let s = unsafe { &*state };
        assert_eq!(str_at(s.code), "01001-000");
        assert_eq!(s.phase, FfiPhase::Idle);
        assert_eq!(s.outcome, FfiOutcomeTag::Empty);
        assert!(s.address.is_null());
        assert!(s.error_message.is_null());

        cep_free_state(state);
        cep_controller_free(controller);
    }

    #[test]
    fn update_code_null_controller() {
        let code = CString::new("1").unwrap();
        assert_eq!(
            cep_controller_update_code(std::ptr::null_mut(), code.as_ptr()),
            FfiStatus::NullArg
        );
    }

    #[test]
    fn begin_submit_returns_templated_request() {
        let controller = new_controller();
        set_code(controller, "01001-000");

        let mut status = FfiStatus::Panic;
        let req = cep_controller_begin_submit(controller, &mut status);
        assert_eq!(status, FfiStatus::Ok);
        assert!(!req.is_null());

        let r = unsafe { &*req };
        assert_eq!(str_at(r.url), "http://localhost:3000/ws/01001000/json/");
        assert_eq!(r.headers_len, 1);
        let headers = unsafe { std::slice::from_raw_parts(r.headers, r.headers_len as usize) };
        assert_eq!(str_at(headers[0].key), "accept");
        assert_eq!(str_at(headers[0].value), "application/json");

        cep_free_request(req);
        cep_controller_free(controller);
    }

    #[test]
    fn begin_submit_while_in_flight_returns_null() {
        let controller = new_controller();
        set_code(controller, "01001000");
        let first = cep_controller_begin_submit(controller, std::ptr::null_mut());
        assert!(!first.is_null());

        let mut status = FfiStatus::Ok;
        let second = cep_controller_begin_submit(controller, &mut status);
        assert!(second.is_null());
        assert_eq!(status, FfiStatus::InFlight);

        cep_free_request(first);
        cep_controller_free(controller);
    }

    #[test]
    fn begin_submit_invalid_code_resolves_immediately() {
        let controller = new_controller();
        set_code(controller, "abc");

        let mut status = FfiStatus::Ok;
        let req = cep_controller_begin_submit(controller, &mut status);
        assert!(req.is_null());
        assert_eq!(status, FfiStatus::InvalidPostalCode);

        let state = cep_controller_snapshot(controller);
        let s = unsafe { &*state };
        assert_eq!(s.outcome, FfiOutcomeTag::Failed);
        assert_eq!(str_at(s.error_message), cep_core::INVALID_POSTAL_CODE_MESSAGE);

        cep_free_state(state);
        cep_controller_free(controller);
    }

    #[test]
    fn complete_submit_success_exposes_address() {
        let controller = new_controller();
        set_code(controller, "01001000");
        let req = cep_controller_begin_submit(controller, std::ptr::null_mut());
        cep_free_request(req);

        let body = CString::new(SE_BODY).unwrap();
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        assert_eq!(cep_controller_complete_submit(controller, &resp), FfiStatus::Ok);

        let state = cep_controller_snapshot(controller);
        let s = unsafe { &*state };
        assert_eq!(s.phase, FfiPhase::Idle);
        assert_eq!(s.outcome, FfiOutcomeTag::Found);
        assert!(s.error_message.is_null());
        let address = unsafe { &*s.address };
        assert_eq!(str_at(address.postal_code), "01001-000");
        assert_eq!(str_at(address.street), "Praça da Sé");
        assert_eq!(str_at(address.district), "Sé");
        assert_eq!(str_at(address.city), "São Paulo");
        assert_eq!(str_at(address.state_code), "SP");

        cep_free_state(state);
        cep_controller_free(controller);
    }

    #[test]
    fn complete_submit_failure_shows_server_message() {
        let controller = new_controller();
        set_code(controller, "00000000");
        cep_free_request(cep_controller_begin_submit(controller, std::ptr::null_mut()));

        let body = CString::new(r#"{"message":"invalid code"}"#).unwrap();
        let resp = FfiHttpResponse {
            status: 400,
            body: body.as_ptr(),
        };
        assert_eq!(cep_controller_complete_submit(controller, &resp), FfiStatus::Ok);

        let state = cep_controller_snapshot(controller);
        let s = unsafe { &*state };
        assert_eq!(s.outcome, FfiOutcomeTag::Failed);
        assert!(s.address.is_null());
        assert_eq!(str_at(s.error_message), "invalid code");

        cep_free_state(state);
        cep_controller_free(controller);
    }

    #[test]
    fn server_message_with_nul_keeps_remaining_text() {
        let controller = new_controller();
        set_code(controller, "00000000");
        cep_free_request(cep_controller_begin_submit(controller, std::ptr::null_mut()));

        let body = CString::new(r#"{"message":"bad\u0000code"}"#).unwrap();
        let resp = FfiHttpResponse {
            status: 400,
            body: body.as_ptr(),
        };
        assert_eq!(cep_controller_complete_submit(controller, &resp), FfiStatus::Ok);

        let state = cep_controller_snapshot(controller);
        let s = unsafe { &*state };
        assert_eq!(s.outcome, FfiOutcomeTag::Failed);
        assert_eq!(str_at(s.error_message), "badcode");

        cep_free_state(state);
        cep_controller_free(controller);
    }

    #[test]
    fn complete_submit_null_body_is_empty() {
        let controller = new_controller();
        set_code(controller, "01001000");
        cep_free_request(cep_controller_begin_submit(controller, std::ptr::null_mut()));

        let resp = FfiHttpResponse {
            status: 502,
            body: std::ptr::null(),
        };
        assert_eq!(cep_controller_complete_submit(controller, &resp), FfiStatus::Ok);

        let state = cep_controller_snapshot(controller);
        let s = unsafe { &*state };
        assert_eq!(str_at(s.error_message), cep_core::FALLBACK_MESSAGE);

        cep_free_state(state);
        cep_controller_free(controller);
    }

    #[test]
    fn fail_submit_shows_fallback() {
        let controller = new_controller();
        set_code(controller, "01001000");
        cep_free_request(cep_controller_begin_submit(controller, std::ptr::null_mut()));

        let reason = CString::new("dns failure").unwrap();
        assert_eq!(cep_controller_fail_submit(controller, reason.as_ptr()), FfiStatus::Ok);

        let state = cep_controller_snapshot(controller);
        let s = unsafe { &*state };
        assert_eq!(s.outcome, FfiOutcomeTag::Failed);
        assert_eq!(str_at(s.error_message), cep_core::FALLBACK_MESSAGE);

        cep_free_state(state);
        cep_controller_free(controller);
    }

    #[test]
    fn completion_without_lookup_is_not_awaiting() {
        let controller = new_controller();
        let body = CString::new(SE_BODY).unwrap();
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        assert_eq!(
            cep_controller_complete_submit(controller, &resp),
            FfiStatus::NotAwaiting
        );
        assert_eq!(
            cep_controller_fail_submit(controller, std::ptr::null()),
            FfiStatus::NotAwaiting
        );
        cep_controller_free(controller);
    }

    #[test]
    fn complete_submit_null_args() {
        let controller = new_controller();
        assert_eq!(
            cep_controller_complete_submit(controller, std::ptr::null()),
            FfiStatus::NullArg
        );
        cep_controller_free(controller);
    }

    static CALLS: AtomicUsize = AtomicUsize::new(0);
    static SEEN: Mutex<Vec<(FfiPhase, FfiOutcomeTag, String)>> = Mutex::new(Vec::new());

    extern "C" fn record_state(state: *const FfiLookupState, user_data: *mut c_void) {
        assert_eq!(user_data as usize, 0xCE9);
        let s = unsafe { &*state };
        let street = if s.address.is_null() {
            String::new()
        } else {
            str_at(unsafe { &*s.address }.street)
        };
        SEEN.lock().unwrap().push((s.phase, s.outcome, street));
        CALLS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn subscribe_and_unsubscribe() {
        let controller = new_controller();
        let id = cep_controller_subscribe(controller, Some(record_state), 0xCE9 as *mut c_void);
        assert_ne!(id, 0);

        set_code(controller, "01001000");
        cep_free_request(cep_controller_begin_submit(controller, std::ptr::null_mut()));
        let body = CString::new(SE_BODY).unwrap();
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        assert_eq!(cep_controller_complete_submit(controller, &resp), FfiStatus::Ok);
        assert_eq!(CALLS.load(Ordering::SeqCst), 3);
        assert_eq!(
            *SEEN.lock().unwrap(),
            vec![
                (FfiPhase::Idle, FfiOutcomeTag::Empty, String::new()),
                (FfiPhase::Awaiting, FfiOutcomeTag::Empty, String::new()),
                (FfiPhase::Idle, FfiOutcomeTag::Found, "Praça da Sé".to_string()),
            ]
        );

        assert!(cep_controller_unsubscribe(controller, id));
        assert!(!cep_controller_unsubscribe(controller, id));
        set_code(controller, "2");
        assert_eq!(CALLS.load(Ordering::SeqCst), 3);

        cep_controller_free(controller);
    }

    #[test]
    fn subscribe_without_callback_returns_zero() {
        let controller = new_controller();
        assert_eq!(
            cep_controller_subscribe(controller, None, std::ptr::null_mut()),
            0
        );
        cep_controller_free(controller);
    }

    #[test]
    fn snapshot_null_returns_null() {
        assert!(cep_controller_snapshot(std::ptr::null()).is_null());
    }

    #[test]
    fn free_request_null_is_safe() {
        cep_free_request(std::ptr::null_mut());
    }

    #[test]
    fn free_state_null_is_safe() {
        cep_free_state(std::ptr::null_mut());
    }

    #[test]
    fn free_string_null_is_safe() {
        cep_free_string(std::ptr::null_mut());
    }
}
