//! Command-line arguments.
//!
//! Parsing is done by clap; the cross-option rules clap cannot express
//! (security options per version, paired protocol/passphrase options,
//! output flags) are checked by [`Args::validate`].

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::oid::Oid;
use crate::session::SessionBuilder;
use crate::v3::{AuthKey, AuthProtocol, PrivKey, PrivProtocol, User};
use crate::version::Version;

use super::output::Formatter;

/// SNMP version for CLI argument parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SnmpVersion {
    #[value(name = "v1")]
    V1,
    /// Default.
    #[default]
    #[value(name = "v2c")]
    V2c,
    #[value(name = "v3")]
    V3,
}

impl std::fmt::Display for SnmpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::V1 => write!(f, "v1"),
            Self::V2c => write!(f, "v2c"),
            Self::V3 => write!(f, "v3"),
        }
    }
}

impl From<SnmpVersion> for Version {
    fn from(v: SnmpVersion) -> Self {
        match v {
            SnmpVersion::V1 => Version::V1,
            SnmpVersion::V2c => Version::V2c,
            SnmpVersion::V3 => Version::V3,
        }
    }
}

/// Request kind selected with `--command`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Command {
    #[default]
    #[value(name = "GET")]
    Get,
    #[value(name = "GETNEXT")]
    GetNext,
    #[value(name = "GETBULK")]
    GetBulk,
}

/// What the tool will actually run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// GET of exactly one OID.
    Get,
    /// GET of any other number of OIDs.
    GetMany,
    /// GETNEXT walk of each OID.
    GetNext,
    /// GETBULK walk of each OID.
    GetBulk,
}

/// Whether `s` is a dotted OID under `1.3.6`.
pub fn is_valid_oid(s: &str) -> bool {
    let Some(rest) = s.strip_prefix("1.3.6") else {
        return false;
    };
    rest.is_empty()
        || rest.strip_prefix('.').is_some_and(|tail| {
            tail.split('.')
                .all(|arc| !arc.is_empty() && arc.bytes().all(|b| b.is_ascii_digit()))
        })
}

fn parse_oid(s: &str) -> Result<Oid, String> {
    if !is_valid_oid(s) {
        return Err(format!("Invalid OID: {}", s));
    }
    Oid::parse(s).map_err(|e| e.to_string())
}

/// SNMP client arguments.
#[derive(Debug, Parser)]
#[command(name = "snmp-session", about = "SNMP Client")]
pub struct Args {
    /// Agent host or address.
    #[arg(value_name = "ADDRESS")]
    pub address: String,

    /// OIDs to query.
    #[arg(value_name = "OID", value_parser = parse_oid)]
    pub oids: Vec<Oid>,

    /// SNMP protocol version.
    #[arg(long = "snmp-version", value_enum, default_value = "v2c")]
    pub snmp_version: SnmpVersion,

    /// SNMP v1 (overrides --snmp-version).
    #[arg(short = '1', group = "version_flag")]
    pub v1: bool,

    /// SNMP v2c (overrides --snmp-version).
    #[arg(short = '2', group = "version_flag")]
    pub v2c: bool,

    /// SNMP v3 (overrides --snmp-version).
    #[arg(short = '3', group = "version_flag")]
    pub v3: bool,

    /// Request kind.
    #[arg(long = "command", value_enum, default_value = "GET")]
    pub command: Command,

    /// Agent port.
    #[arg(short = 'p', long = "port", default_value = "161")]
    pub port: u16,

    /// Community (v1/v2c).
    #[arg(short = 'c', long = "community")]
    pub community: Option<String>,

    /// User name (v3).
    #[arg(short = 'u', long = "user")]
    pub user: Option<String>,

    /// Authentication protocol (v3): MD5, SHA, SHA-224, SHA-256, SHA-384, SHA-512.
    #[arg(short = 'a', long = "auth-protocol")]
    pub auth_protocol: Option<AuthProtocol>,

    /// Authentication passphrase (v3).
    #[arg(short = 'A', long = "auth-pass")]
    pub auth_pass: Option<String>,

    /// Privacy protocol (v3): DES, 3DES, AES, AES-192, AES-256.
    #[arg(short = 'x', long = "priv-protocol")]
    pub priv_protocol: Option<PrivProtocol>,

    /// Privacy passphrase (v3).
    #[arg(short = 'X', long = "priv-pass")]
    pub priv_pass: Option<String>,

    /// Output flags, repeated or combined:
    /// a ascii strings, x hex strings, T ascii and hex,
    /// q space separator, Q " = " separator, v values only.
    #[arg(short = 'O', value_name = "FLAGS", action = clap::ArgAction::Append)]
    pub output_flags: Vec<String>,

    /// Request timeout in seconds.
    #[arg(short = 't', long = "timeout", default_value = "3")]
    pub timeout: f64,

    /// Log protocol activity to stderr.
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,
}

impl Args {
    /// Effective version: shorthand flags win over `--snmp-version`.
    pub fn version(&self) -> SnmpVersion {
        if self.v1 {
            SnmpVersion::V1
        } else if self.v2c {
            SnmpVersion::V2c
        } else if self.v3 {
            SnmpVersion::V3
        } else {
            self.snmp_version
        }
    }

    pub fn operation(&self) -> Operation {
        match self.command {
            Command::Get if self.oids.len() == 1 => Operation::Get,
            Command::Get => Operation::GetMany,
            Command::GetNext => Operation::GetNext,
            Command::GetBulk => Operation::GetBulk,
        }
    }

    /// All `-O` occurrences merged.
    pub fn output_flags(&self) -> String {
        self.output_flags.concat()
    }

    pub fn formatter(&self) -> Formatter {
        Formatter::from_flags(&self.output_flags())
    }

    pub fn timeout_duration(&self) -> Result<Duration, String> {
        Duration::try_from_secs_f64(self.timeout)
            .ok()
            .filter(|t| !t.is_zero())
            .ok_or_else(|| "-t/--timeout must be a positive number".to_string())
    }

    /// Check rules spanning several options.
    pub fn validate(&self) -> Result<(), String> {
        Formatter::validate_flags(&self.output_flags())?;
        self.timeout_duration()?;
        let version = self.version();
        if version == SnmpVersion::V1 && self.command == Command::GetBulk {
            return Err("GETBULK is not defined for SNMPv1".to_string());
        }
        match version {
            SnmpVersion::V1 | SnmpVersion::V2c => self.validate_community(version),
            SnmpVersion::V3 => self.validate_usm(version),
        }
    }

    fn validate_community(&self, version: SnmpVersion) -> Result<(), String> {
        if self.community.is_none() {
            return Err(format!("SNMP {} requires -c/--community", version));
        }
        for (set, opt) in [
            (self.auth_protocol.is_some(), "-a/--auth-protocol"),
            (self.auth_pass.is_some(), "-A/--auth-pass"),
            (self.priv_protocol.is_some(), "-x/--priv-protocol"),
            (self.priv_pass.is_some(), "-X/--priv-pass"),
        ] {
            if set {
                return Err(format!("SNMP {} doesn't support {} option", version, opt));
            }
        }
        Ok(())
    }

    fn validate_usm(&self, version: SnmpVersion) -> Result<(), String> {
        if self.user.is_none() {
            return Err(format!("SNMP {} requires -u/--user", version));
        }
        let rules = [
            (
                self.auth_protocol.is_some() && self.auth_pass.is_none(),
                "-A/--auth-pass is required for -a/--auth-protocol",
            ),
            (
                self.auth_pass.is_some() && self.auth_protocol.is_none(),
                "-a/--auth-protocol is required for -A/--auth-pass",
            ),
            (
                self.priv_protocol.is_some() && self.priv_pass.is_none(),
                "-X/--priv-pass is required for -x/--priv-protocol",
            ),
            (
                self.priv_pass.is_some() && self.priv_protocol.is_none(),
                "-x/--priv-protocol is required for -X/--priv-pass",
            ),
            (
                self.priv_protocol.is_some() && self.auth_protocol.is_none(),
                "-a/--auth-protocol must be set for -x/--priv-protocol",
            ),
        ];
        if let Some((_, msg)) = rules.iter().find(|(broken, _)| *broken) {
            return Err(msg.to_string());
        }
        if self.community.is_some() {
            return Err(format!("SNMP {} doesn't support -c/--community option", version));
        }
        Ok(())
    }

    /// USM user from the v3 options.
    pub fn usm_user(&self) -> Option<User> {
        let name = self.user.clone()?;
        let auth = match (self.auth_protocol, &self.auth_pass) {
            (Some(proto), Some(pass)) => AuthKey::password(proto, pass.as_bytes()),
            _ => return Some(User::new(name)),
        };
        Some(match (self.priv_protocol, &self.priv_pass) {
            (Some(proto), Some(pass)) => {
                User::with_auth_priv(name, auth, PrivKey::password(proto, pass.as_bytes()))
            }
            _ => User::with_auth(name, auth),
        })
    }

    /// Install a stderr subscriber for the crate's logs.
    pub fn init_tracing(&self) {
        use tracing_subscriber::EnvFilter;

        let filter = if self.debug {
            "snmp_session=debug"
        } else {
            "snmp_session=warn"
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(filter))
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Session builder for validated arguments.
    pub fn session_builder(&self) -> Result<SessionBuilder, String> {
        let version = self.version();
        let builder = SessionBuilder::new(self.address.as_str())
            .port(self.port)
            .version(version.into())
            .timeout(self.timeout_duration()?);
        Ok(match version {
            SnmpVersion::V3 => match self.usm_user() {
                Some(user) => builder.user(user),
                None => builder,
            },
            SnmpVersion::V1 | SnmpVersion::V2c => match &self.community {
                Some(community) => builder.community(community),
                None => builder,
            },
        })
    }
}
