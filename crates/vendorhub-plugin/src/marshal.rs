//! Call marshaller — the single place where vendor calls are validated,
//! tagged with the vendor identity, and issued.

use tracing::debug;

use crate::error::VendorError;
use crate::host::ProcHandler;
use crate::procedure::{self, Procedure};
use crate::vendor::VendorHandle;

/// Runs a vendor-scoped procedure and reports why it did not take effect.
///
/// Preconditions are checked before anything touches `ph`: a missing table,
/// a missing vendor, or an invalid request returns an error with zero calls
/// issued. Otherwise the request is packed, the vendor is injected under
/// the reserved `vendor` key, and the hub's `success` flag decides the result.
pub fn try_run_simple_proc<P>(
    ph: Option<&ProcHandler>,
    vendor: Option<&VendorHandle>,
    request: &P,
) -> Result<(), VendorError>
where
    P: Procedure<Output = bool>,
{
    let ph = ph.ok_or(VendorError::Unavailable)?;
    let vendor = vendor.ok_or(VendorError::InvalidArgument("vendor"))?;
    request.validate()?;

    if procedure::invoke(ph, request, Some(vendor)) {
        Ok(())
    } else {
        Err(VendorError::RemoteFailure { procedure: P::ID })
    }
}

/// Boolean form of [`try_run_simple_proc`]. Every failure reads as `false`.
pub fn run_simple_proc<P>(
    ph: Option<&ProcHandler>,
    vendor: Option<&VendorHandle>,
    request: &P,
) -> bool
where
    P: Procedure<Output = bool>,
{
    match try_run_simple_proc(ph, vendor, request) {
        Ok(()) => true,
        Err(e) => {
            debug!(procedure = %P::ID, error = %e, "Vendor procedure did not take effect");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::procedure::{UnregisterRequest, keys};

    use super::*;

    fn vendor() -> VendorHandle {
        VendorHandle::from_opaque(Arc::new("vendor"))
    }

    #[test]
    fn test_preconditions_issue_no_calls() {
        let ph = ProcHandler::new();
        ph.add("vendor_request_unregister", |cd| cd.set_bool(keys::SUCCESS, true));
        let vendor = vendor();
        let request = UnregisterRequest { request_type: "ping" };

        assert_eq!(
            try_run_simple_proc(None, Some(&vendor), &request),
            Err(VendorError::Unavailable)
        );
        assert_eq!(
            try_run_simple_proc(Some(&ph), None, &request),
            Err(VendorError::InvalidArgument("vendor"))
        );
        let empty = UnregisterRequest { request_type: "" };
        assert!(!run_simple_proc(Some(&ph), Some(&vendor), &empty));
        assert_eq!(ph.call_count(), 0);

        assert!(run_simple_proc(Some(&ph), Some(&vendor), &request));
        assert_eq!(ph.call_count(), 1);
    }

    #[test]
    fn test_vendor_injected_and_success_read() {
        let ph = ProcHandler::new();
        let expected = vendor();
        let seen = expected.clone();
        ph.add("vendor_request_unregister", move |cd| {
            let same = cd
                .ptr(keys::VENDOR)
                .map(|p| Arc::ptr_eq(p, seen.as_opaque()))
                .unwrap_or(false);
            let ping = cd.string(keys::TYPE) == Some("ping");
            cd.set_bool(keys::SUCCESS, same && ping);
        });

        let request = UnregisterRequest { request_type: "ping" };
        assert!(run_simple_proc(Some(&ph), Some(&expected), &request));
    }

    #[test]
    fn test_remote_failure_when_success_missing() {
        let ph = ProcHandler::new();
        let request = UnregisterRequest { request_type: "ping" };
        assert_eq!(
            try_run_simple_proc(Some(&ph), Some(&vendor()), &request),
            Err(VendorError::RemoteFailure {
                procedure: crate::procedure::ProcedureId::VendorRequestUnregister
            })
        );
        assert_eq!(ph.call_count(), 1);
    }
}
