//! Read/write/delete file handlers
//!
//! Plain I/O passthroughs; path validation has already happened in the
//! type registry by the time these run.

use std::fs;
use std::path::Path;

use crate::error::SyncResult;
use crate::types::Value;
use crate::validator::{Binding, CommandHandler, Response};

/// Handles the `read`, `write`, and `delete` commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadWriteHandler;

impl ReadWriteHandler {
    pub fn read(&self, file: &Path) -> SyncResult<String> {
        Ok(fs::read_to_string(file)?)
    }

    pub fn write(&self, file: &Path, contents: &str) -> SyncResult<()> {
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(file, contents)?;
        Ok(())
    }

    pub fn delete(&self, file: &Path) -> SyncResult<()> {
        fs::remove_file(file)?;
        Ok(())
    }
}

impl CommandHandler for ReadWriteHandler {
    fn bindings(&self) -> Vec<Binding> {
        let handler = *self;
        vec![
            Binding::new("read", 1, move |mut args| {
                let file = args.remove(0).into_path()?;
                let contents = handler.read(&file)?;
                Ok(Response::empty().field("Contents", Value::Str(contents)))
            }),
            Binding::new("write", 2, move |mut args| {
                let file = args.remove(0).into_path()?;
                let contents = args.remove(0).into_str()?;
                handler.write(&file, &contents)?;
                Ok(Response::empty())
            }),
            Binding::new("delete", 1, move |mut args| {
                let file = args.remove(0).into_path()?;
                handler.delete(&file)?;
                Ok(Response::empty())
            }),
        ]
    }
}
