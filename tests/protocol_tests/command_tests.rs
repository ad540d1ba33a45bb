//! Command Tests
//!
//! Parsing of command lines and their execution against a database.

use lodekv::error::LodeError;
use lodekv::protocol::{execute_line, Command, CommandType, Payload, Response};
use lodekv::Database;

fn text(s: &str) -> Response {
    Response::Ok(Payload::text(s))
}

fn error_text(line: &str) -> String {
    Command::parse(line).unwrap_err().to_string()
}

// =============================================================================
// Parsing Tests
// =============================================================================

#[test]
fn test_parse_every_command() {
    assert_eq!(Command::parse("KEYS").unwrap(), Command::Keys);
    assert_eq!(
        Command::parse("SET hello world").unwrap(),
        Command::Set {
            key: "hello".to_string(),
            value: "world".to_string()
        }
    );
    assert_eq!(
        Command::parse("GET hello").unwrap(),
        Command::Get {
            key: "hello".to_string()
        }
    );
    assert_eq!(
        Command::parse("DEL hello").unwrap(),
        Command::Del {
            key: "hello".to_string()
        }
    );
    assert_eq!(Command::parse("RKEY").unwrap(), Command::ListShow);
    assert_eq!(
        Command::parse("RSET v").unwrap(),
        Command::ListInsert {
            value: "v".to_string()
        }
    );
    assert_eq!(
        Command::parse("RGET v").unwrap(),
        Command::ListGet {
            value: "v".to_string()
        }
    );
    assert_eq!(
        Command::parse("RDEL v").unwrap(),
        Command::ListDelete {
            value: "v".to_string()
        }
    );
    assert_eq!(Command::parse("RECOVER").unwrap(), Command::Recover);
    assert_eq!(Command::parse("PING").unwrap(), Command::Ping);
}

#[test]
fn test_parse_is_case_insensitive() {
    assert_eq!(Command::parse("keys").unwrap(), Command::Keys);
    assert_eq!(
        Command::parse("sEt a b").unwrap().command_type(),
        CommandType::Set
    );
}

#[test]
fn test_parse_collapses_whitespace() {
    assert_eq!(
        Command::parse("  SET   a \t b  ").unwrap(),
        Command::Set {
            key: "a".to_string(),
            value: "b".to_string()
        }
    );
}

#[test]
fn test_parse_empty_line() {
    assert!(matches!(Command::parse(""), Err(LodeError::EmptyCommand)));
    assert!(matches!(Command::parse("   "), Err(LodeError::EmptyCommand)));
    assert_eq!(error_text(""), "empty command");
}

#[test]
fn test_parse_unknown_command() {
    assert_eq!(error_text("FLY away"), "invalid command: FLY");
}

#[test]
fn test_parse_wrong_arity_messages() {
    assert_eq!(error_text("SET a"), "set command needs both key and value");
    assert_eq!(error_text("SET a b c"), "set command needs both key and value");
    assert_eq!(error_text("GET"), "get command needs key");
    assert_eq!(error_text("DEL a b"), "del command needs key");
    assert_eq!(error_text("KEYS a"), "keys command needs no arguments");
    assert_eq!(error_text("RKEY a"), "rkey command needs no arguments");
    assert_eq!(error_text("RSET"), "rset command needs value");
    assert_eq!(error_text("RGET a b"), "rget command needs value");
    assert_eq!(error_text("RDEL"), "rdel command needs value");
    assert_eq!(error_text("RECOVER now"), "recover command needs no arguments");
}

#[test]
fn test_mutating_commands() {
    assert!(CommandType::Set.is_mutating());
    assert!(CommandType::Del.is_mutating());
    assert!(CommandType::ListInsert.is_mutating());
    assert!(CommandType::ListDelete.is_mutating());
    assert!(CommandType::Recover.is_mutating());
    assert!(!CommandType::Get.is_mutating());
    assert!(!CommandType::Keys.is_mutating());
    assert!(!CommandType::Ping.is_mutating());
}

#[test]
fn test_token_round_trips_through_lookup() {
    for command_type in [
        CommandType::Keys,
        CommandType::ListShow,
        CommandType::ListDelete,
        CommandType::Recover,
    ] {
        assert_eq!(CommandType::from_token(command_type.token()), Some(command_type));
    }
    assert_eq!(CommandType::from_token("nope"), None);
}

// =============================================================================
// Execution Tests
// =============================================================================

#[test]
fn test_set_get_keys_scenario() {
    let db = Database::new(0);

    assert_eq!(
        execute_line(&db, "SET hello world"),
        text("SET executed key: hello , value: world")
    );
    assert_eq!(execute_line(&db, "GET hello"), text("world"));
    assert_eq!(
        execute_line(&db, "GET missing"),
        Response::error("there is no item with key of missing")
    );

    execute_line(&db, "SET world hello");
    assert_eq!(
        execute_line(&db, "KEYS"),
        Response::Ok(Payload::List(vec!["hello".to_string(), "world".to_string()]))
    );
}

#[test]
fn test_keys_on_empty_database() {
    let db = Database::new(0);
    assert_eq!(execute_line(&db, "KEYS"), Response::Ok(Payload::List(vec![])));
}

#[test]
fn test_del_scenario() {
    let db = Database::new(0);
    execute_line(&db, "SET a 1");

    assert_eq!(execute_line(&db, "DEL a"), text("DEL executed key: a"));
    assert_eq!(
        execute_line(&db, "DEL a"),
        Response::error("there is no item with key of a")
    );
}

#[test]
fn test_list_scenario() {
    let db = Database::new(0);

    assert_eq!(execute_line(&db, "RKEY"), Response::error("list is empty"));
    assert_eq!(execute_line(&db, "RSET a"), text("RSET executed value: a"));
    execute_line(&db, "RSET b");

    assert_eq!(execute_line(&db, "RKEY"), text("a, b"));
    assert_eq!(execute_line(&db, "RGET b"), text("b"));
    assert_eq!(
        execute_line(&db, "RGET z"),
        Response::error("value not found in the list")
    );
    assert_eq!(execute_line(&db, "RDEL a"), text("RDEL executed value: a"));
    assert_eq!(execute_line(&db, "RKEY"), text("b"));
}

#[test]
fn test_recover_without_journal() {
    let db = Database::new(0);
    assert_eq!(
        execute_line(&db, "RECOVER"),
        Response::error("no journal for database 0")
    );
}

#[test]
fn test_ping() {
    assert_eq!(execute_line(&Database::new(0), "ping"), text("PONG"));
}

#[test]
fn test_empty_arguments_rejected_on_execute() {
    let db = Database::new(0);

    let set = Command::Set {
        key: String::new(),
        value: "v".to_string(),
    };
    assert!(matches!(set.execute(&db), Err(LodeError::MissingKey)));

    let set = Command::Set {
        key: "k".to_string(),
        value: String::new(),
    };
    assert_eq!(set.execute(&db).unwrap_err().to_string(), "must enter a value");

    let insert = Command::ListInsert {
        value: String::new(),
    };
    assert!(matches!(insert.execute(&db), Err(LodeError::MissingValue)));
    assert!(db.is_empty());
    assert_eq!(db.list_len(), 0);
}

// =============================================================================
// Request Line Tests
// =============================================================================

#[test]
fn test_to_line_round_trips_through_parse() {
    let commands = [
        Command::Keys,
        Command::Set {
            key: "hello".to_string(),
            value: "world".to_string(),
        },
        Command::Del {
            key: "hello".to_string(),
        },
        Command::ListDelete {
            value: "v".to_string(),
        },
        Command::Recover,
    ];

    for command in commands {
        let line = command.to_line().unwrap();
        assert_eq!(Command::parse(&line).unwrap(), command);
    }
    assert_eq!(Command::ListShow.to_line().unwrap(), "RKEY");
}

#[test]
fn test_to_line_rejects_whitespace_in_arguments() {
    let set = Command::Set {
        key: "k".to_string(),
        value: "two words".to_string(),
    };
    let err = set.to_line().unwrap_err();

    assert!(matches!(err, LodeError::InvalidArgument(ref arg) if arg == "two words"));
    assert_eq!(
        err.to_string(),
        "argument \"two words\" must be a single word without whitespace"
    );

    let get = Command::Get {
        key: "a\tb".to_string(),
    };
    assert!(matches!(get.to_line(), Err(LodeError::InvalidArgument(_))));
}

#[test]
fn test_to_line_rejects_empty_arguments() {
    let del = Command::Del { key: String::new() };
    assert!(matches!(del.to_line(), Err(LodeError::MissingKey)));

    let insert = Command::ListInsert {
        value: String::new(),
    };
    assert!(matches!(insert.to_line(), Err(LodeError::MissingValue)));
}
