//! Declarative command schemas
//!
//! A schema describes one protocol command: its name, the ordered argument
//! list, and the ordered response-argument list. Schemas are loaded once at
//! startup (from the built-in set or a JSON file) and are immutable
//! thereafter. An unknown type tag in a schema file fails deserialization,
//! so a bad schema is a startup error rather than a runtime one.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{SyncError, SyncResult};

/// Wire type of a single argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum TypeTag {
    /// Raw line, passed through unchanged
    String,
    /// Integer literal
    Number,
    /// Boolean literal (`true`/`TRUE`/`True`/`1`, `false`/`FALSE`/`False`/`0`)
    Boolean,
    /// Root-relative path; traversal and hidden segments rejected
    FilePath,
    /// Like `FilePath`, but the resolved path must be an existing file
    ExtantFilePath,
    /// Consumes all remaining request lines as one string; must be terminal
    #[serde(rename = "*")]
    Wildcard,
}

/// One named, typed argument slot.
#[derive(Debug, Clone, Deserialize)]
pub struct ArgumentSpec {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub kind: TypeTag,
}

/// Immutable description of one command.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandSchema {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Arguments", default)]
    pub arguments: Vec<ArgumentSpec>,
    #[serde(rename = "ResponseArguments", default)]
    pub response_arguments: Vec<ArgumentSpec>,
}

/// The full command list handed to the validator at construction.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaSet {
    #[serde(rename = "Commands")]
    pub commands: Vec<CommandSchema>,
}

impl SchemaSet {
    /// Parses a schema set from JSON text and checks its structure.
    pub fn from_json(text: &str) -> SyncResult<Self> {
        let set: SchemaSet = serde_json::from_str(text)?;
        set.check()?;
        Ok(set)
    }

    /// Loads a schema set from a JSON file.
    pub fn load(path: &Path) -> SyncResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// The built-in command set used when no schema file is supplied.
    pub fn builtin() -> Self {
        let set = SchemaSet {
            commands: vec![
                command(
                    "parse",
                    vec![
                        arg("Directory", TypeTag::FilePath),
                        arg("Depth", TypeTag::Number),
                        arg("Hash", TypeTag::Boolean),
                    ],
                    vec![arg("Tree", TypeTag::Wildcard)],
                ),
                command(
                    "hash",
                    vec![arg("Contents", TypeTag::Wildcard)],
                    vec![arg("Hash", TypeTag::String)],
                ),
                command(
                    "read",
                    vec![arg("File", TypeTag::ExtantFilePath)],
                    vec![arg("Contents", TypeTag::Wildcard)],
                ),
                command(
                    "write",
                    vec![
                        arg("File", TypeTag::FilePath),
                        arg("Contents", TypeTag::Wildcard),
                    ],
                    vec![],
                ),
                command("delete", vec![arg("File", TypeTag::ExtantFilePath)], vec![]),
                command(
                    "watch_start",
                    vec![arg("Directory", TypeTag::FilePath)],
                    vec![arg("ID", TypeTag::Number)],
                ),
                command(
                    "watch_poll",
                    vec![arg("ID", TypeTag::Number)],
                    vec![arg("FileChange", TypeTag::String)],
                ),
                command("watch_stop", vec![arg("ID", TypeTag::Number)], vec![]),
            ],
        };
        debug_assert!(set.check().is_ok());
        set
    }

    /// Structural checks: unique command names, and a wildcard argument may
    /// only appear as the final argument of its list.
    fn check(&self) -> SyncResult<()> {
        let mut seen = std::collections::HashSet::new();
        for schema in &self.commands {
            if !seen.insert(schema.name.as_str()) {
                return Err(SyncError::internal(format!(
                    "duplicate command '{}' in schema",
                    schema.name
                )));
            }
            for (i, argument) in schema.arguments.iter().enumerate() {
                if argument.kind == TypeTag::Wildcard && i + 1 != schema.arguments.len() {
                    return Err(SyncError::internal(format!(
                        "command '{}': wildcard argument '{}' must be terminal",
                        schema.name, argument.name
                    )));
                }
            }
        }
        Ok(())
    }
}

fn command(
    name: &str,
    arguments: Vec<ArgumentSpec>,
    response_arguments: Vec<ArgumentSpec>,
) -> CommandSchema {
    CommandSchema {
        name: name.to_string(),
        arguments,
        response_arguments,
    }
}

fn arg(name: &str, kind: TypeTag) -> ArgumentSpec {
    ArgumentSpec {
        name: name.to_string(),
        kind,
    }
}
