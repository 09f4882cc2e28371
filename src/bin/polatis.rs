//! Command-line driver for Polatis switches.
//!
//! This binary is the only place where fatal errors may terminate the
//! process; the library itself only ever returns typed errors.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use polatis_rs::{
    export_connections, import_connections, CrossConnect, ErrorPolicy, FlapInterval, PortSpec,
    PowerMonitor, Session, SwitchConfig, Tl1Error,
};

#[derive(Parser)]
#[command(name = "polatis", version, about = "Drive a Polatis optical cross-connect over TL1")]
struct Cli {
    /// IP address or hostname of the switch
    #[arg(long)]
    host: String,

    /// Username
    #[arg(long)]
    username: String,

    /// Password
    #[arg(long)]
    password: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create cross-connections pairing ingress and egress ports
    Create {
        /// Ingress ports: '1' or '1,2' or '1-5'
        #[arg(long)]
        inports: String,
        /// Egress ports: '49' or '49,50' or '49-53'
        #[arg(long)]
        outports: String,
        /// Create even where APS would object
        #[arg(long)]
        forced: bool,
    },
    /// Retrieve cross-connections
    Retrieve {
        /// Ports: '1' or '49,50' or '1-53' or 'all'
        #[arg(long)]
        ports: String,
    },
    /// Delete cross-connections
    Delete {
        /// Ports: '1' or '49,50' or '1-53' or 'all'
        #[arg(long)]
        ports: String,
        /// Delete even where APS would object
        #[arg(long)]
        forced: bool,
    },
    /// Cycle port shutters
    Shutter {
        /// Ports: '1' or '49,50' or '1-53'
        #[arg(long)]
        ports: String,
        /// 'offintv,onintvl,cycles' in ms; e.g. '10000,300,1'
        #[arg(long)]
        interv: String,
    },
    /// Query shutter cycling state
    ShutterQuery {
        /// Ports: '1' or '49,50' or '1-53'
        #[arg(long)]
        ports: String,
    },
    /// Export the connection table to a JSON file ('.json' added if missing)
    Export {
        /// Output filename, e.g. 'connections'
        #[arg(long)]
        filename: PathBuf,
    },
    /// Import a previously exported JSON file
    Import {
        /// Previously exported file, e.g. 'connections.json'
        #[arg(long)]
        filename: PathBuf,
    },
    /// Read measured power
    Power {
        /// Ports: '1' or '49,50' or '1-53' or 'all'
        #[arg(long)]
        ports: String,
        /// Query the reverse direction
        #[arg(long)]
        reverse: bool,
    },
}

/// `all` (any case) selects every port; anything else must parse as a port
/// specification.
fn parse_ports(text: &str) -> polatis_rs::Result<Option<PortSpec>> {
    if text.eq_ignore_ascii_case("all") {
        Ok(None)
    } else {
        text.parse().map(Some)
    }
}

/// Parse the 'offintv,onintvl,cycles' interval notation, all in ms.
fn parse_interval(text: &str) -> polatis_rs::Result<FlapInterval> {
    let bad = || Tl1Error::InvalidArgument(format!("invalid interval {:?}", text));
    let mut fields = text.split(',');
    let interval = FlapInterval {
        off_ms: fields.next().ok_or_else(bad)?.trim().parse().map_err(|_| bad())?,
        on_ms: fields.next().ok_or_else(bad)?.trim().parse().map_err(|_| bad())?,
        cycles: fields.next().ok_or_else(bad)?.trim().parse().map_err(|_| bad())?,
    };
    if fields.next().is_some() {
        return Err(bad());
    }
    Ok(interval)
}

fn run(cli: Cli) -> polatis_rs::Result<()> {
    let policy = match cli.command {
        Command::Export { .. } | Command::Import { .. } => ErrorPolicy::import_export(),
        _ => ErrorPolicy::interactive(),
    };

    let config = SwitchConfig::new(cli.host, cli.username, cli.password);
    let mut session = Session::connect(config)?;
    session.login(policy)?;

    let result = match &cli.command {
        Command::Create {
            inports,
            outports,
            forced,
        } => {
            let ingress = inports.parse::<PortSpec>()?;
            let egress = outports.parse::<PortSpec>()?;
            CrossConnect::new(&mut session).create(&ingress, &egress, *forced)
        }
        Command::Retrieve { ports } => {
            let ports = parse_ports(ports)?;
            CrossConnect::new(&mut session)
                .connections(ports.as_ref())
                .map(|connections| {
                    for (ingress, egress) in connections {
                        println!("{},{}", ingress, egress);
                    }
                })
        }
        Command::Delete { ports, forced } => {
            let ports = parse_ports(ports)?;
            CrossConnect::new(&mut session).delete(ports.as_ref(), *forced)
        }
        Command::Shutter { ports, interv } => {
            let ports = ports.parse::<PortSpec>()?;
            let interval = parse_interval(interv)?;
            CrossConnect::new(&mut session).set_shutter(&ports, &interval, false)
        }
        Command::ShutterQuery { ports } => {
            let ports = ports.parse::<PortSpec>()?;
            CrossConnect::new(&mut session).shutter(&ports).map(|lines| {
                for line in lines {
                    println!("{}", line);
                }
            })
        }
        Command::Export { filename } => {
            let path = if filename.extension().and_then(|e| e.to_str()) == Some("json") {
                filename.clone()
            } else {
                let mut with_ext = filename.clone().into_os_string();
                with_ext.push(".json");
                PathBuf::from(with_ext)
            };
            export_connections(&mut session, &path)
        }
        Command::Import { filename } => import_connections(&mut session, filename),
        Command::Power { ports, reverse } => {
            let ports = parse_ports(ports)?;
            PowerMonitor::new(&mut session)?
                .power(ports.as_ref(), *reverse)
                .map(|readings| {
                    for reading in readings {
                        println!("{}: {} dBm", reading.port, reading.dbm);
                    }
                })
        }
    };

    // Always attempt a clean logout; the socket closes either way.
    let logout = session.logout(policy);
    result.and(logout)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.is_fatal() {
                error!("fatal: {}", e);
            } else {
                error!("{}", e);
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ports_all_keyword() {
        assert_eq!(parse_ports("all").unwrap(), None);
        assert_eq!(parse_ports("ALL").unwrap(), None);
        assert_eq!(parse_ports("1,2").unwrap(), Some(PortSpec::List(vec![1, 2])));
        assert!(parse_ports("1,2-3").is_err());
    }

    #[test]
    fn test_parse_interval() {
        assert_eq!(
            parse_interval("10000,300,1").unwrap(),
            FlapInterval {
                off_ms: 10000,
                on_ms: 300,
                cycles: 1,
            }
        );
        assert!(parse_interval("10000,300").is_err());
        assert!(parse_interval("10000,300,1,7").is_err());
        assert!(parse_interval("fast").is_err());
    }

    #[test]
    fn test_cli_parses_create_invocation() {
        let cli = Cli::try_parse_from([
            "polatis",
            "--host",
            "10.0.0.5",
            "--username",
            "admin",
            "--password",
            "secret",
            "create",
            "--inports",
            "1,2",
            "--outports",
            "49,50",
        ])
        .unwrap();
        assert_eq!(cli.host, "10.0.0.5");
        assert!(matches!(cli.command, Command::Create { .. }));
    }
}
