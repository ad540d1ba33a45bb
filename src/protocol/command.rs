//! Command definitions
//!
//! Parsing text lines into commands and executing them against a database.

use bytes::Bytes;

use crate::error::{LodeError, Result};
use crate::storage::Database;

use super::{Payload, Response};

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Keys,
    Set,
    Get,
    Del,
    ListShow,
    ListInsert,
    ListGet,
    ListDelete,
    Recover,
    Ping,
}

impl CommandType {
    /// Look up a command by its first token, ignoring case
    pub fn from_token(token: &str) -> Option<Self> {
        let command = match token.to_ascii_lowercase().as_str() {
            "keys" => CommandType::Keys,
            "set" => CommandType::Set,
            "get" => CommandType::Get,
            "del" => CommandType::Del,
            "rkey" => CommandType::ListShow,
            "rset" => CommandType::ListInsert,
            "rget" => CommandType::ListGet,
            "rdel" => CommandType::ListDelete,
            "recover" => CommandType::Recover,
            "ping" => CommandType::Ping,
            _ => return None,
        };
        Some(command)
    }

    /// Lowercase wire name
    pub fn token(&self) -> &'static str {
        match self {
            CommandType::Keys => "keys",
            CommandType::Set => "set",
            CommandType::Get => "get",
            CommandType::Del => "del",
            CommandType::ListShow => "rkey",
            CommandType::ListInsert => "rset",
            CommandType::ListGet => "rget",
            CommandType::ListDelete => "rdel",
            CommandType::Recover => "recover",
            CommandType::Ping => "ping",
        }
    }

    /// What the arguments must be, for arity errors
    fn needs(&self) -> &'static str {
        match self {
            CommandType::Set => "both key and value",
            CommandType::Get | CommandType::Del => "key",
            CommandType::ListInsert | CommandType::ListGet | CommandType::ListDelete => "value",
            CommandType::Keys | CommandType::ListShow | CommandType::Recover | CommandType::Ping => {
                "no arguments"
            }
        }
    }

    /// Whether the command changes database state
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            CommandType::Set
                | CommandType::Del
                | CommandType::ListInsert
                | CommandType::ListDelete
                | CommandType::Recover
        )
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List all keys
    Keys,

    /// Insert or overwrite a key
    Set { key: String, value: String },

    /// Get a value by key
    Get { key: String },

    /// Delete a key
    Del { key: String },

    /// Render the secondary list
    ListShow,

    /// Append to the secondary list
    ListInsert { value: String },

    /// Find a value in the secondary list
    ListGet { value: String },

    /// Remove a value from the secondary list
    ListDelete { value: String },

    /// Rebuild the database from its journal
    Recover,

    /// Ping (health check)
    Ping,
}

impl Command {
    /// Parse one command line
    ///
    /// The line is split on whitespace; the first token picks the command
    /// (case-insensitive) and the argument count is checked before anything
    /// is built.
    pub fn parse(line: &str) -> Result<Self> {
        let mut tokens = line.split_whitespace();
        let first = tokens.next().ok_or(LodeError::EmptyCommand)?;
        let args: Vec<&str> = tokens.collect();

        let command_type = CommandType::from_token(first)
            .ok_or_else(|| LodeError::UnknownCommand(first.to_string()))?;

        let command = match (command_type, args.as_slice()) {
            (CommandType::Keys, []) => Command::Keys,
            (CommandType::Set, [key, value]) => Command::Set {
                key: key.to_string(),
                value: value.to_string(),
            },
            (CommandType::Get, [key]) => Command::Get {
                key: key.to_string(),
            },
            (CommandType::Del, [key]) => Command::Del {
                key: key.to_string(),
            },
            (CommandType::ListShow, []) => Command::ListShow,
            (CommandType::ListInsert, [value]) => Command::ListInsert {
                value: value.to_string(),
            },
            (CommandType::ListGet, [value]) => Command::ListGet {
                value: value.to_string(),
            },
            (CommandType::ListDelete, [value]) => Command::ListDelete {
                value: value.to_string(),
            },
            (CommandType::Recover, []) => Command::Recover,
            (CommandType::Ping, []) => Command::Ping,
            (command_type, _) => {
                return Err(LodeError::WrongArity {
                    command: command_type.token(),
                    needs: command_type.needs(),
                })
            }
        };

        Ok(command)
    }

    /// Render the command as a request line
    ///
    /// Arguments must be non-empty single words; anything else would be
    /// parsed by the server as a different command.
    pub fn to_line(&self) -> Result<String> {
        let name = self.command_type().token().to_ascii_uppercase();
        let line = match self {
            Command::Keys | Command::ListShow | Command::Recover | Command::Ping => name,
            Command::Set { key, value } => format!(
                "{} {} {}",
                name,
                word(key, LodeError::MissingKey)?,
                word(value, LodeError::MissingValue)?
            ),
            Command::Get { key } | Command::Del { key } => {
                format!("{} {}", name, word(key, LodeError::MissingKey)?)
            }
            Command::ListInsert { value }
            | Command::ListGet { value }
            | Command::ListDelete { value } => {
                format!("{} {}", name, word(value, LodeError::MissingValue)?)
            }
        };
        Ok(line)
    }

    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Keys => CommandType::Keys,
            Command::Set { .. } => CommandType::Set,
            Command::Get { .. } => CommandType::Get,
            Command::Del { .. } => CommandType::Del,
            Command::ListShow => CommandType::ListShow,
            Command::ListInsert { .. } => CommandType::ListInsert,
            Command::ListGet { .. } => CommandType::ListGet,
            Command::ListDelete { .. } => CommandType::ListDelete,
            Command::Recover => CommandType::Recover,
            Command::Ping => CommandType::Ping,
        }
    }

    /// Run the command against `db`
    pub fn execute(&self, db: &Database) -> Result<Payload> {
        match self {
            Command::Keys => {
                let mut keys = db.keys();
                keys.sort_unstable();
                Ok(Payload::List(keys))
            }
            Command::Set { key, value } => {
                require(key, LodeError::MissingKey)?;
                require(value, LodeError::MissingValue)?;
                db.set(key, Bytes::copy_from_slice(value.as_bytes()))?;
                Ok(Payload::text(format!(
                    "SET executed key: {} , value: {}",
                    key, value
                )))
            }
            Command::Get { key } => {
                require(key, LodeError::MissingKey)?;
                let value = db.get(key)?;
                Ok(Payload::text(lossy(value.data())))
            }
            Command::Del { key } => {
                require(key, LodeError::MissingKey)?;
                db.del(key)?;
                Ok(Payload::text(format!("DEL executed key: {}", key)))
            }
            Command::ListShow => Ok(Payload::text(lossy(&db.list_show()?))),
            Command::ListInsert { value } => {
                require(value, LodeError::MissingValue)?;
                db.list_insert(Bytes::copy_from_slice(value.as_bytes()))?;
                Ok(Payload::text(format!("RSET executed value: {}", value)))
            }
            Command::ListGet { value } => {
                require(value, LodeError::MissingValue)?;
                let found = db.list_get(value.as_bytes())?;
                Ok(Payload::text(lossy(&found)))
            }
            Command::ListDelete { value } => {
                require(value, LodeError::MissingValue)?;
                db.list_delete(value.as_bytes())?;
                Ok(Payload::text(format!("RDEL executed value: {}", value)))
            }
            Command::Recover => {
                db.recover()?;
                Ok(Payload::text("recovered successfully"))
            }
            Command::Ping => Ok(Payload::text("PONG")),
        }
    }
}

/// Parse and execute one line, folding any failure into an error response
pub fn execute_line(db: &Database, line: &str) -> Response {
    let result = Command::parse(line).and_then(|command| {
        tracing::trace!("Executing {:?} on database {}", command, db.id());
        let payload = command.execute(db)?;
        if command.command_type().is_mutating() {
            tracing::debug!("Database {} applied {}", db.id(), command.command_type().token());
        }
        Ok(payload)
    });

    match result {
        Ok(payload) => Response::ok(payload),
        Err(err) => {
            if !err.is_client_error() {
                tracing::warn!("Command {:?} failed: {}", line, err);
            }
            Response::from(err)
        }
    }
}

fn require(arg: &str, missing: LodeError) -> Result<()> {
    if arg.is_empty() {
        Err(missing)
    } else {
        Ok(())
    }
}

fn word(arg: &str, missing: LodeError) -> Result<&str> {
    require(arg, missing)?;
    if arg.chars().any(char::is_whitespace) {
        return Err(LodeError::InvalidArgument(arg.to_string()));
    }
    Ok(arg)
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
