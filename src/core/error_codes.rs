//! Translation of MongoDB server error codes into HTTP statuses.
//!
//! Only a handful of codes are worth distinguishing for an HTTP caller.
//! Everything else, including errors that never reached the server
//! (network, pool, selection timeouts), is reported as an internal error.

use actix_web::http::StatusCode;
use mongodb::error::{BulkWriteError, Error, ErrorKind, WriteConcernError, WriteFailure};

/// One row of the driver error table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverErrorMapping {
    pub code: i32,
    pub name: &'static str,
    pub status: StatusCode,
    pub message: &'static str,
}

pub const UNKNOWN_ERROR_STATUS: StatusCode = StatusCode::INTERNAL_SERVER_ERROR;
pub const UNKNOWN_ERROR_MESSAGE: &str = "Internal database error";

pub const DUPLICATE_KEY: i32 = 11000;
pub const WRITE_CONFLICT: i32 = 112;

pub static DRIVER_ERROR_TABLE: &[DriverErrorMapping] = &[
    DriverErrorMapping {
        code: 2,
        name: "BadValue",
        status: StatusCode::BAD_REQUEST,
        message: "Invalid value in query or update",
    },
    DriverErrorMapping {
        code: 13,
        name: "Unauthorized",
        status: StatusCode::FORBIDDEN,
        message: "Not authorized to perform this operation",
    },
    DriverErrorMapping {
        code: 50,
        name: "MaxTimeMSExpired",
        status: StatusCode::GATEWAY_TIMEOUT,
        message: "Database operation timed out",
    },
    DriverErrorMapping {
        code: 66,
        name: "ImmutableField",
        status: StatusCode::BAD_REQUEST,
        message: "Attempted to modify an immutable field",
    },
    DriverErrorMapping {
        code: WRITE_CONFLICT,
        name: "WriteConflict",
        status: StatusCode::CONFLICT,
        message: "Write conflict, retry the operation",
    },
    DriverErrorMapping {
        code: 121,
        name: "DocumentValidationFailure",
        status: StatusCode::BAD_REQUEST,
        message: "Document failed validation",
    },
    DriverErrorMapping {
        code: 251,
        name: "NoSuchTransaction",
        status: StatusCode::CONFLICT,
        message: "Transaction is no longer active",
    },
    DriverErrorMapping {
        code: DUPLICATE_KEY,
        name: "DuplicateKey",
        status: StatusCode::CONFLICT,
        message: "Duplicate key",
    },
    // pre-2.6 servers report some duplicate key updates with this code
    DriverErrorMapping {
        code: 11001,
        name: "DuplicateKey",
        status: StatusCode::CONFLICT,
        message: "Duplicate key",
    },
];

/// Find the table row for a server error code
pub fn lookup(code: i32) -> Option<&'static DriverErrorMapping> {
    DRIVER_ERROR_TABLE.iter().find(|m| m.code == code)
}

/// Resolve an optional server code to a status and fixed message
pub fn translate(code: Option<i32>) -> (StatusCode, &'static str) {
    code.and_then(lookup)
        .map(|m| (m.status, m.message))
        .unwrap_or((UNKNOWN_ERROR_STATUS, UNKNOWN_ERROR_MESSAGE))
}

/// Extract the server error code carried by a driver error.
///
/// Bulk failures report the code of the first write error.
pub fn driver_error_code(err: &Error) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Command(command) => Some(command.code),
        ErrorKind::Write(WriteFailure::WriteError(write)) => Some(write.code),
        ErrorKind::Write(WriteFailure::WriteConcernError(concern)) => Some(concern.code),
        ErrorKind::BulkWrite(failure) => bulk_failure_code(
            failure.write_errors.as_deref(),
            failure.write_concern_error.as_ref(),
        ),
        _ => None,
    }
}

/// First write error wins, then the write concern error
fn bulk_failure_code(
    write_errors: Option<&[BulkWriteError]>,
    write_concern_error: Option<&WriteConcernError>,
) -> Option<i32> {
    write_errors
        .and_then(|errors| errors.first())
        .map(|e| e.code)
        .or_else(|| write_concern_error.map(|c| c.code))
}
