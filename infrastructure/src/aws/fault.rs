//! AWS SDK error conversion
//!
//! Every SDK error becomes a [`RemoteFault`]. Service errors keep their AWS
//! error code, so throttling and access errors are classified the same way
//! for every service. Errors without a code (connection failures, response
//! parsing) are permanent.

use aws_smithy_types::error::display::DisplayErrorContext;
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use costpilot_domain::RemoteFault;
use std::error::Error;

/// Code used for failures that never reached an AWS service.
pub const TRANSPORT_ERROR: &str = "TransportError";

/// Convert any SDK error (`SdkError<OperationError, _>` or a bare operation
/// error) into a [`RemoteFault`].
pub fn remote_fault<E>(operation: &str, err: &E) -> RemoteFault
where
    E: ProvideErrorMetadata + Error,
{
    match err.code() {
        Some(code) => {
            let message = err
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| format!("{} failed", operation));
            RemoteFault::from_code(code, message)
        }
        None => RemoteFault::permanent(
            TRANSPORT_ERROR,
            format!("{} failed: {}", operation, DisplayErrorContext(err)),
        ),
    }
}

/// The error code of an SDK error, if the service returned one.
pub fn error_code<E: ProvideErrorMetadata>(err: &E) -> Option<&str> {
    err.code()
}
