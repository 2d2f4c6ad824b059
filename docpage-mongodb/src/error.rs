//! Classification of driver failures into repository errors.

use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use tracing::warn;

use docpage_core::error::RepositoryError;

/// Server codes that describe the deployment rather than the request:
/// unreachable hosts, elections, stepdowns, shutdowns and timeouts.
const UNAVAILABLE_CODES: &[i32] = &[
    6,     // HostUnreachable
    7,     // HostNotFound
    89,    // NetworkTimeout
    91,    // ShutdownInProgress
    189,   // PrimarySteppedDown
    262,   // ExceededTimeLimit
    9001,  // SocketException
    10107, // NotWritablePrimary
    11600, // InterruptedAtShutdown
    11602, // InterruptedDueToReplStateChange
    13435, // NotPrimaryNoSecondaryOk
    13436, // NotPrimaryOrSecondary
];

/// Labels the driver attaches to errors worth retrying once the deployment recovers.
const TRANSIENT_LABELS: &[&str] = &["RetryableWriteError", "TransientTransactionError"];

/// Decides whether a server error code, together with whether the driver
/// labelled it transient, means the store is unavailable.
pub fn is_unavailable(code: i32, transient: bool) -> bool {
    transient || UNAVAILABLE_CODES.contains(&code)
}

/// Maps a driver error onto the repository taxonomy.
///
/// Commands the server refused (unknown pipeline stage, malformed operator,
/// duplicate key) and arguments the driver itself rejected are the caller's
/// fault and become [`RepositoryError::InvalidArgument`]. Server errors whose
/// code or labels point at the deployment, and everything else, are reported
/// as [`RepositoryError::StorageUnavailable`] with the driver's message.
pub fn classify(error: MongoError) -> RepositoryError {
    let transient = TRANSIENT_LABELS.iter().any(|label| error.contains_label(label));

    let classified = match error.kind.as_ref() {
        ErrorKind::Command(command) if !is_unavailable(command.code, transient) => {
            RepositoryError::InvalidArgument(command.message.clone())
        }
        ErrorKind::Write(WriteFailure::WriteError(write)) if !is_unavailable(write.code, transient) => {
            RepositoryError::InvalidArgument(write.message.clone())
        }
        ErrorKind::InvalidArgument { message, .. } => RepositoryError::InvalidArgument(message.clone()),
        _ => RepositoryError::StorageUnavailable(error.to_string()),
    };

    warn!(error = %classified, labels = ?error.labels(), "MongoDB operation failed");

    classified
}
