//! Type registry: wire string <-> typed value conversions
//!
//! Each [`TypeTag`](crate::schema::TypeTag) maps to exactly one incoming
//! decoder and (for response types) one outgoing encoder. Decoders are pure
//! apart from the filesystem existence check behind `ExtantFilePath`.

use std::path::{Path, PathBuf};

use crate::error::{SyncError, SyncResult};
use crate::paths;
use crate::schema::TypeTag;

/// A decoded argument or response value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Num(i64),
    Bool(bool),
    Path(PathBuf),
}

impl Value {
    /// Unwraps a string value; anything else is an engine contract violation.
    pub fn into_str(self) -> SyncResult<String> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(SyncError::internal(format!("expected string, got {other:?}"))),
        }
    }

    pub fn into_num(self) -> SyncResult<i64> {
        match self {
            Value::Num(n) => Ok(n),
            other => Err(SyncError::internal(format!("expected number, got {other:?}"))),
        }
    }

    pub fn into_bool(self) -> SyncResult<bool> {
        match self {
            Value::Bool(b) => Ok(b),
            other => Err(SyncError::internal(format!("expected boolean, got {other:?}"))),
        }
    }

    pub fn into_path(self) -> SyncResult<PathBuf> {
        match self {
            Value::Path(p) => Ok(p),
            other => Err(SyncError::internal(format!("expected path, got {other:?}"))),
        }
    }
}

/// Decodes one raw wire value into its typed form.
///
/// Path types take the trusted root as a side channel; the other types
/// ignore it. All failures are `BadRequest`.
pub fn decode(kind: TypeTag, raw: &str, root: &Path) -> SyncResult<Value> {
    match kind {
        TypeTag::String | TypeTag::Wildcard => Ok(Value::Str(raw.to_string())),
        TypeTag::Number => raw
            .trim()
            .parse::<i64>()
            .map(Value::Num)
            .map_err(|_| SyncError::bad_request(format!("failed to convert '{raw}' to int"))),
        TypeTag::Boolean => match raw {
            "true" | "TRUE" | "True" | "1" => Ok(Value::Bool(true)),
            "false" | "FALSE" | "False" | "0" => Ok(Value::Bool(false)),
            _ => Err(SyncError::bad_request(format!(
                "failed to convert '{raw}' to bool"
            ))),
        },
        TypeTag::FilePath => paths::resolve(raw, root).map(Value::Path),
        TypeTag::ExtantFilePath => {
            let resolved = paths::resolve(raw, root)?;
            if resolved.is_file() {
                Ok(Value::Path(resolved))
            } else {
                Err(SyncError::bad_request(format!(
                    "file {} doesn't exist",
                    resolved.display()
                )))
            }
        }
    }
}

/// Encodes one typed response value back into its wire string.
///
/// Failures here are engine contract violations, so they are all
/// `Internal`: a handler produced a value its schema cannot carry, or the
/// schema names a type with no outgoing converter (the path types).
pub fn encode(kind: TypeTag, value: Value) -> SyncResult<String> {
    match kind {
        TypeTag::String | TypeTag::Wildcard => match value {
            Value::Str(s) => Ok(s),
            other => Err(SyncError::internal(format!(
                "bad outgoing string: {other:?}"
            ))),
        },
        TypeTag::Number => match value {
            Value::Num(n) => Ok(n.to_string()),
            other => Err(SyncError::internal(format!(
                "bad outgoing number: {other:?}"
            ))),
        },
        TypeTag::Boolean | TypeTag::FilePath | TypeTag::ExtantFilePath => Err(SyncError::internal(
            format!("no outgoing converter for {kind:?}"),
        )),
    }
}
