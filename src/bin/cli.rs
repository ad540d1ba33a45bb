//! LodeKV CLI Client
//!
//! Command-line interface for interacting with LodeKV.

use std::time::Duration;

use clap::{Parser, Subcommand};
use lodekv::protocol::{Command, Response};
use lodekv::Client;

/// LodeKV CLI
#[derive(Parser, Debug)]
#[command(name = "lodekv-cli")]
#[command(about = "CLI for the LodeKV key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8001")]
    server: String,

    /// Seconds to wait for the server
    #[arg(short, long, default_value = "5")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List all keys
    Keys,

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Show the secondary list
    Rkey,

    /// Append a value to the secondary list
    Rset { value: String },

    /// Find a value in the secondary list
    Rget { value: String },

    /// Remove a value from the secondary list
    Rdel { value: String },

    /// Rebuild the database from its journal
    Recover,

    /// Ping the server
    Ping,
}

impl From<Commands> for Command {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Keys => Command::Keys,
            Commands::Set { key, value } => Command::Set { key, value },
            Commands::Get { key } => Command::Get { key },
            Commands::Del { key } => Command::Del { key },
            Commands::Rkey => Command::ListShow,
            Commands::Rset { value } => Command::ListInsert { value },
            Commands::Rget { value } => Command::ListGet { value },
            Commands::Rdel { value } => Command::ListDelete { value },
            Commands::Recover => Command::Recover,
            Commands::Ping => Command::Ping,
        }
    }
}

fn main() {
    let args = Args::parse();

    // Keys and values travel as single words
    let line = match Command::from(args.command).to_line() {
        Ok(line) => line,
        Err(e) => {
            eprintln!("Invalid command: {}", e);
            std::process::exit(2);
        }
    };

    let mut client = match Client::connect(&args.server, Duration::from_secs(args.timeout)) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to connect to {}: {}", args.server, e);
            std::process::exit(1);
        }
    };

    match client.request(&line) {
        Ok(Response::Ok(payload)) => match payload.as_list() {
            Some(items) => items.iter().for_each(|item| println!("{}", item)),
            None => println!("{}", payload.as_text().unwrap_or_default()),
        },
        Ok(Response::Error(message)) => {
            eprintln!("(error) {}", message);
            std::process::exit(2);
        }
        Err(e) => {
            eprintln!("Request failed: {}", e);
            std::process::exit(1);
        }
    }
}
