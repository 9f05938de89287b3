//! Command protocol engine
//!
//! The validator owns the command schemas, the handler table, and the
//! response builders. `handle` turns a raw request body into typed
//! arguments, dispatches to the bound handler, and serializes the typed
//! response back to text, with every failure classified as a client or
//! server fault along the way.
//!
//! Handlers register through an explicit table ([`Binding`]) rather than
//! by reflection: each handler module contributes `(command, arity,
//! closure)` entries, and registration checks arity against the schema up
//! front.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::error::{SyncError, SyncResult};
use crate::schema::{CommandSchema, SchemaSet, TypeTag};
use crate::types::{self, Value};

/// Value length above which request/response logs elide the content.
const LOG_ELIDE_LEN: usize = 30;

type HandlerFn = Box<dyn Fn(Vec<Value>) -> SyncResult<Response> + Send + Sync>;

/// Typed response produced by a handler: ordered (name, value) fields.
///
/// The dispatch layer checks the field set exactly against the schema's
/// response arguments; a missing or extra field is a server fault.
#[derive(Debug, Default)]
pub struct Response {
    fields: Vec<(String, Value)>,
}

impl Response {
    /// An empty response (for commands with no response arguments).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds a named field, builder style.
    pub fn field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.push((name.into(), value));
        self
    }

    fn take(&mut self, name: &str) -> Option<Value> {
        let index = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(index).1)
    }
}

/// One entry in a handler module's binding table.
pub struct Binding {
    pub command: &'static str,
    pub arity: usize,
    run: HandlerFn,
}

impl Binding {
    pub fn new(
        command: &'static str,
        arity: usize,
        run: impl Fn(Vec<Value>) -> SyncResult<Response> + Send + Sync + 'static,
    ) -> Self {
        Self {
            command,
            arity,
            run: Box::new(run),
        }
    }
}

/// A handler module: anything that can list its command bindings.
pub trait CommandHandler {
    fn bindings(&self) -> Vec<Binding>;
}

/// Schema-driven parser, dispatcher, and response serializer.
pub struct CommandValidator {
    root: PathBuf,
    commands: HashMap<String, CommandSchema>,
    handlers: HashMap<String, HandlerFn>,
}

impl CommandValidator {
    /// Builds a validator over an immutable schema set and a trusted root.
    pub fn new(schemas: SchemaSet, root: impl Into<PathBuf>) -> Self {
        let commands = schemas
            .commands
            .into_iter()
            .map(|schema| (schema.name.clone(), schema))
            .collect();
        Self {
            root: root.into(),
            commands,
            handlers: HashMap::new(),
        }
    }

    /// Registers a handler module's bindings.
    ///
    /// A binding whose arity doesn't match its schema, or that duplicates
    /// an existing registration, is skipped with a warning; this is a
    /// configuration-time soft failure, never an error. Bindings naming no
    /// known command are silently ignored.
    pub fn register(&mut self, handler: &dyn CommandHandler) {
        for binding in handler.bindings() {
            let Some(schema) = self.commands.get(binding.command) else {
                continue;
            };
            if self.handlers.contains_key(binding.command) {
                warn!(command = binding.command, "duplicate handler; keeping first");
                continue;
            }
            if binding.arity != schema.arguments.len() {
                warn!(
                    command = binding.command,
                    expected = schema.arguments.len(),
                    actual = binding.arity,
                    "handler arity mismatch; not registered"
                );
                continue;
            }
            self.handlers.insert(binding.command.to_string(), binding.run);
        }
    }

    /// Handles one raw request body and returns the raw response body.
    pub fn handle(&self, request: &str) -> SyncResult<String> {
        let lines: Vec<&str> = request.split('\n').collect();
        let command = lines.first().copied().unwrap_or("");
        let schema = self
            .commands
            .get(command)
            .ok_or_else(|| SyncError::bad_request(format!("command '{command}' is invalid")))?;

        let mut arguments = Vec::with_capacity(schema.arguments.len());
        let mut received = Vec::new();
        let mut line_index = 1;
        for argument in &schema.arguments {
            let raw = if argument.kind == TypeTag::Wildcard {
                // A wildcard consumes everything left, line breaks included.
                let joined = lines.get(line_index..).unwrap_or(&[]).join("\n");
                line_index = lines.len();
                joined
            } else {
                let line = lines.get(line_index).copied().ok_or_else(|| {
                    SyncError::bad_request(format!("missing argument '{}'", argument.name))
                })?;
                line_index += 1;
                line.to_string()
            };
            received.push(describe(&argument.name, &raw, argument.kind));
            arguments.push(types::decode(argument.kind, &raw, &self.root).map_err(|e| match e {
                e @ (SyncError::BadRequest { .. } | SyncError::Internal { .. }) => e,
                other => SyncError::bad_request(format!(
                    "bad argument '{}' (type {:?}): {other}",
                    argument.name, argument.kind
                )),
            })?);
        }
        info!(command, "received command: {}", received.join(", "));

        let handler = self.handlers.get(command).ok_or_else(|| {
            SyncError::bad_request(format!("handler for '{command}' not registered"))
        })?;
        let response = (handler)(arguments).map_err(SyncError::classify)?;
        self.build_response(schema, response)
    }

    /// Serializes a handler's typed response against the schema.
    fn build_response(&self, schema: &CommandSchema, mut response: Response) -> SyncResult<String> {
        let mut parts = Vec::with_capacity(schema.response_arguments.len());
        let mut sent = Vec::new();
        for argument in &schema.response_arguments {
            let value = response.take(&argument.name).ok_or_else(|| {
                SyncError::internal(format!(
                    "response for '{}' missing argument '{}'",
                    schema.name, argument.name
                ))
            })?;
            let encoded = types::encode(argument.kind, value)?;
            sent.push(describe(&argument.name, &encoded, argument.kind));
            parts.push(encoded);
        }
        if let Some((name, _)) = response.fields.first() {
            return Err(SyncError::internal(format!(
                "response for '{}' has unexpected argument '{name}'",
                schema.name
            )));
        }
        info!(command = %schema.name, "sending response: {}", sent.join(", "));
        Ok(parts.join("\n"))
    }
}

/// Log form of one argument. Only long wildcard values are elided; the
/// other types are short by construction and always logged verbatim.
fn describe(name: &str, raw: &str, kind: TypeTag) -> String {
    if kind != TypeTag::Wildcard || raw.len() < LOG_ELIDE_LEN {
        format!("{name}: '{raw}'")
    } else {
        format!("{name}: string of length {}", raw.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaSet;

    struct EchoHandler;

    impl CommandHandler for EchoHandler {
        fn bindings(&self) -> Vec<Binding> {
            vec![
                Binding::new("hash", 1, |mut args| {
                    let contents = args.remove(0).into_str()?;
                    Ok(Response::empty()
                        .field("Hash", Value::Str(contents.len().to_string())))
                }),
                // arity mismatch: watch_poll takes one argument
                Binding::new("watch_poll", 2, |_| Ok(Response::empty())),
                // no such command in the schema set
                Binding::new("frobnicate", 0, |_| Ok(Response::empty())),
            ]
        }
    }

    fn validator() -> CommandValidator {
        let mut validator = CommandValidator::new(SchemaSet::builtin(), "/srv/tree");
        validator.register(&EchoHandler);
        validator
    }

    #[test]
    fn test_unknown_command_is_bad_request() {
        let err = validator().handle("frobnicate\nx").unwrap_err();
        assert_eq!(err.code(), 400);
        assert!(err.to_string().contains("invalid"));
    }

    #[test]
    fn test_unregistered_handler_is_bad_request() {
        // `watch_stop` exists in the schema but nothing binds it here
        let err = validator().handle("watch_stop\n5").unwrap_err();
        assert_eq!(err.code(), 400);
        assert!(err.to_string().contains("not registered"));
    }

    #[test]
    fn test_register_skips_arity_mismatch() {
        let v = validator();
        let err = v.handle("watch_poll\n3").unwrap_err();
        assert!(err.to_string().contains("not registered"));
    }

    #[test]
    fn test_register_keeps_first_binding() {
        struct Second;
        impl CommandHandler for Second {
            fn bindings(&self) -> Vec<Binding> {
                vec![Binding::new("hash", 1, |_| {
                    Ok(Response::empty().field("Hash", Value::Str("other".to_string())))
                })]
            }
        }
        let mut v = validator();
        v.register(&Second);
        assert_eq!(v.handle("hash\nabc").unwrap(), "3");
    }

    #[test]
    fn test_wildcard_consumes_remaining_lines() {
        let v = validator();
        assert_eq!(v.handle("hash\nfoo\nbar").unwrap(), "7");
        assert_eq!(v.handle("hash\n").unwrap(), "0");
        assert_eq!(v.handle("hash").unwrap(), "0");
    }

    #[test]
    fn test_missing_argument_is_bad_request() {
        let err = validator().handle("watch_start").unwrap_err();
        assert_eq!(err.code(), 400);
        assert!(err.to_string().contains("missing argument"));
    }

    #[test]
    fn test_bad_argument_value() {
        struct Poll;
        impl CommandHandler for Poll {
            fn bindings(&self) -> Vec<Binding> {
                vec![Binding::new("watch_poll", 1, |_| Ok(Response::empty()))]
            }
        }
        let mut v = CommandValidator::new(SchemaSet::builtin(), "/srv/tree");
        v.register(&Poll);
        let err = v.handle("watch_poll\nnot-a-number").unwrap_err();
        assert_eq!(err.code(), 400);
        assert!(err.to_string().contains("not-a-number"));
    }

    #[test]
    fn test_response_shape_violations_are_internal() {
        struct Broken;
        impl CommandHandler for Broken {
            fn bindings(&self) -> Vec<Binding> {
                vec![
                    Binding::new("hash", 1, |_| Ok(Response::empty())),
                    Binding::new("watch_poll", 1, |_| {
                        Ok(Response::empty()
                            .field("FileChange", Value::Str(String::new()))
                            .field("Extra", Value::Num(1)))
                    }),
                ]
            }
        }
        let mut v = CommandValidator::new(SchemaSet::builtin(), "/srv/tree");
        v.register(&Broken);

        let err = v.handle("hash\nabc").unwrap_err();
        assert_eq!(err.code(), 500);
        assert!(err.to_string().contains("missing argument 'Hash'"));

        let err = v.handle("watch_poll\n0").unwrap_err();
        assert_eq!(err.code(), 500);
        assert!(err.to_string().contains("unexpected argument 'Extra'"));
    }

    #[test]
    fn test_handler_io_error_becomes_bad_request() {
        struct Failing;
        impl CommandHandler for Failing {
            fn bindings(&self) -> Vec<Binding> {
                vec![Binding::new("hash", 1, |_| {
                    Err(std::io::Error::new(std::io::ErrorKind::Other, "disk on fire").into())
                })]
            }
        }
        let mut v = CommandValidator::new(SchemaSet::builtin(), "/srv/tree");
        v.register(&Failing);
        let err = v.handle("hash\nabc").unwrap_err();
        assert_eq!(err.code(), 400);
        assert!(err.to_string().contains("disk on fire"));
    }

    #[test]
    fn test_describe_elides_only_long_wildcard_values() {
        let long = "x".repeat(40);
        assert_eq!(
            describe("Contents", &long, TypeTag::Wildcard),
            "Contents: string of length 40"
        );
        assert_eq!(
            describe("File", &long, TypeTag::FilePath),
            format!("File: '{long}'")
        );
        assert_eq!(
            describe("Contents", "short", TypeTag::Wildcard),
            "Contents: 'short'"
        );
    }

    #[test]
    fn test_response_joins_in_schema_order() {
        let set = SchemaSet::from_json(
            r#"{"Commands": [{
                "Name": "pair",
                "Arguments": [],
                "ResponseArguments": [
                    {"Name": "First", "Type": "String"},
                    {"Name": "Second", "Type": "Number"}
                ]
            }]}"#,
        )
        .unwrap();
        struct Pair;
        impl CommandHandler for Pair {
            fn bindings(&self) -> Vec<Binding> {
                vec![Binding::new("pair", 0, |_| {
                    // declared out of schema order on purpose
                    Ok(Response::empty()
                        .field("Second", Value::Num(2))
                        .field("First", Value::Str("one".to_string())))
                })]
            }
        }
        let mut v = CommandValidator::new(set, "/srv/tree");
        v.register(&Pair);
        assert_eq!(v.handle("pair").unwrap(), "one\n2");
    }
}
