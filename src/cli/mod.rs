//! Command-line front end.
//!
//! [`run`] executes parsed [`Args`](args::Args) against an agent through any
//! [`Connector`], writing result lines and error messages to a writer.
//! The crate ships no transport, so binaries wire in their own connector:
//!
//! ```rust,ignore
//! use clap::Parser;
//! use snmp_session::cli::{self, args::Args};
//!
//! fn main() -> std::process::ExitCode {
//!     let args = Args::parse();
//!     args.init_tracing();
//!     cli::run(&args, &my_transport::UdpConnector, &mut std::io::stdout()).into()
//! }
//! ```
//!
//! This module is only available with the `cli` feature.

pub mod args;
pub mod output;

use std::io::Write;

use crate::error::{Error, Result};
use crate::session::BlockingSession;
use crate::transport::{Connector, Transport};

use args::{Args, Operation};
use output::Formatter;

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Ok = 0,
    Err = 1,
}

impl From<Exit> for std::process::ExitCode {
    fn from(exit: Exit) -> Self {
        std::process::ExitCode::from(exit as u8)
    }
}

/// Validate `args`, open a blocking session and run the selected command.
pub fn run<C: Connector, W: Write>(args: &Args, connector: &C, out: &mut W) -> Exit {
    let builder = match args.validate().and_then(|()| args.session_builder()) {
        Ok(builder) => builder,
        Err(msg) => {
            let _ = writeln!(out, "error: {}", msg);
            return Exit::Err;
        }
    };
    let result = builder
        .open_blocking(connector)
        .and_then(|mut session| execute(&mut session, args, &args.formatter(), out));
    match result {
        Ok(()) => Exit::Ok,
        Err(err) => {
            let _ = writeln!(out, "{}", error_message(&err));
            Exit::Err
        }
    }
}

fn execute<T: Transport, W: Write>(
    session: &mut BlockingSession<T>,
    args: &Args,
    formatter: &Formatter,
    out: &mut W,
) -> Result<()> {
    match args.operation() {
        Operation::Get => {
            for oid in &args.oids {
                let value = session.get(oid)?;
                writeln!(out, "{}", formatter.format(oid, &value))?;
            }
        }
        Operation::GetMany => {
            for (oid, value) in session.get_many(&args.oids)? {
                writeln!(out, "{}", formatter.format(&oid, &value))?;
            }
        }
        Operation::GetNext => {
            for oid in &args.oids {
                for row in session.get_next(oid) {
                    let row = row?;
                    writeln!(out, "{}", formatter.format(&row.oid, &row.value))?;
                }
            }
        }
        Operation::GetBulk => {
            for oid in &args.oids {
                for row in session.get_bulk(oid, None) {
                    let row = row?;
                    writeln!(out, "{}", formatter.format(&row.oid, &row.value))?;
                }
            }
        }
    }
    Ok(())
}

fn error_message(err: &Error) -> String {
    match err {
        Error::Timeout { .. } => "ERROR: Timed out".to_string(),
        Error::Auth { .. } => "ERROR: Authentication failed".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthErrorKind;
    use crate::oid;
    use crate::transport::{MockAgent, MockResponse, RefreshKind};
    use crate::value::Value;
    use clap::Parser;

    fn agent() -> MockAgent {
        MockAgent::new()
            .insert(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), Value::from("Linux"))
            .insert(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), Value::TimeTicks(4200))
            .insert(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), Value::from("core-1"))
            .insert(oid!(1, 3, 6, 1, 2, 1, 2, 1, 0), Value::Integer(2))
    }

    fn run_with(agent: &MockAgent, argv: &[&str]) -> (Exit, String) {
        let args =
            Args::try_parse_from(std::iter::once("snmp-session").chain(argv.iter().copied()))
                .unwrap();
        let mut out = Vec::new();
        let exit = run(&args, agent, &mut out);
        (exit, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_get() {
        let (exit, out) = run_with(&agent(), &["127.0.0.1", "-c", "public", "1.3.6.1.2.1.1.5.0"]);
        assert_eq!(exit, Exit::Ok);
        assert_eq!(out, "1.3.6.1.2.1.1.5.0 = core-1\n");
    }

    #[test]
    fn test_get_many_is_sorted_and_skips_missing() {
        let (exit, out) = run_with(
            &agent(),
            &[
                "127.0.0.1",
                "-c",
                "public",
                "-Oq",
                "1.3.6.1.2.1.1.5.0",
                "1.3.6.1.2.1.1.9.0",
                "1.3.6.1.2.1.1.1.0",
            ],
        );
        assert_eq!(exit, Exit::Ok);
        assert_eq!(out, "1.3.6.1.2.1.1.1.0 Linux\n1.3.6.1.2.1.1.5.0 core-1\n");
    }

    #[test]
    fn test_walks() {
        let expected = "1.3.6.1.2.1.1.1.0 = Linux\n1.3.6.1.2.1.1.3.0 = 4200\n1.3.6.1.2.1.1.5.0 = core-1\n";
        for command in ["GETNEXT", "GETBULK"] {
            let (exit, out) = run_with(
                &agent(),
                &["127.0.0.1", "-c", "public", "--command", command, "1.3.6.1.2.1.1"],
            );
            assert_eq!(exit, Exit::Ok);
            assert_eq!(out, expected);
        }
    }

    #[test]
    fn test_missing_instance_fails() {
        let (exit, out) = run_with(&agent(), &["127.0.0.1", "-c", "public", "1.3.6.1.2.1.1.9.0"]);
        assert_eq!(exit, Exit::Err);
        assert_eq!(out, "no such instance: 1.3.6.1.2.1.1.9.0\n");
    }

    #[test]
    fn test_timeout_message() {
        let (exit, out) = run_with(
            &MockAgent::new().silent(),
            &["127.0.0.1", "-c", "public", "-t", "0.1", "1.3.6.1.2.1.1.5.0"],
        );
        assert_eq!(exit, Exit::Err);
        assert_eq!(out, "ERROR: Timed out\n");
    }

    #[test]
    fn test_auth_failure_message() {
        let agent = agent().respond(MockResponse::AuthFailure(AuthErrorKind::WrongDigest));
        let (exit, out) = run_with(
            &agent,
            &["127.0.0.1", "-3", "-u", "admin", "-a", "SHA", "-A", "authpass", "1.3.6.1.2.1.1.5.0"],
        );
        assert_eq!(exit, Exit::Err);
        assert_eq!(out, "ERROR: Authentication failed\n");
    }

    #[test]
    fn test_v3_session_is_refreshed_before_requests() {
        let args = Args::try_parse_from([
            "snmp-session",
            "127.0.0.1",
            "-3",
            "-u",
            "admin",
            "-a",
            "SHA",
            "-A",
            "authpass",
            "1.3.6.1.2.1.1.5.0",
        ])
        .unwrap();
        let mut session = args
            .session_builder()
            .unwrap()
            .open_blocking(&agent())
            .unwrap();
        assert_eq!(
            session.transport().refresh_rounds(),
            vec![RefreshKind::Discovery, RefreshKind::Sync]
        );
        let mut out = Vec::new();
        execute(&mut session, &args, &args.formatter(), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1.3.6.1.2.1.1.5.0 = core-1\n");
    }

    #[test]
    fn test_validation_error() {
        let (exit, out) = run_with(&agent(), &["127.0.0.1", "1.3.6.1"]);
        assert_eq!(exit, Exit::Err);
        assert_eq!(out, "error: SNMP v2c requires -c/--community\n");
    }
}
