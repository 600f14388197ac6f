// SPDX-FileCopyrightText: 2026 Deckhand Authors
// SPDX-License-Identifier: LicenseRef-Deckhand-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deckhand and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Deckhand server entrypoint.
//!
//! By default this serves MCP over streamable HTTP at
//! `http://127.0.0.1:<port>/mcp` until interrupted.
//!
//! Use `--mcp` to serve MCP over stdio instead (intended for tool
//! integrations); logs go to stderr in both modes.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use rmcp::transport::{
    streamable_http_server::session::local::LocalSessionManager, StreamableHttpServerConfig,
    StreamableHttpService,
};
use tracing_subscriber::EnvFilter;

use deckhand::mcp::DeckhandMcp;
use deckhand::store::{
    SessionStore, Sweeper, SweeperConfig, WriteDurability, DEFAULT_RETENTION,
    DEFAULT_SWEEP_INTERVAL,
};

const DEFAULT_MCP_HTTP_PORT: u16 = 27544;
const DATA_DIR_ENV: &str = "DECKHAND_DATA";

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [<data-dir>] [--durable-writes] [--retention-hours <h>] [--sweep-interval-secs <s>] [--mcp-http-port <port>]\n  {program} [--data <dir>] [--durable-writes] [--retention-hours <h>] [--sweep-interval-secs <s>] --mcp\n\nHTTP mode (default) serves MCP at `http://127.0.0.1:<port>/mcp`.\n--mcp-http-port selects the port (0 = ephemeral; default {DEFAULT_MCP_HTTP_PORT}).\n\nIf data-dir/--data is omitted, the {DATA_DIR_ENV} environment variable is\nused, then `./data`.\n\n--retention-hours sets how long idle sessions are kept (default 24).\n--sweep-interval-secs sets how often expired sessions are purged (default 3600).\n\n--durable-writes opts into slower, best-effort durable persistence (fsync/sync where supported)."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    mcp: bool,
    data_dir: Option<String>,
    mcp_http_port: Option<u16>,
    durable_writes: bool,
    retention_hours: Option<u64>,
    sweep_interval_secs: Option<u64>,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--mcp" => {
                if options.mcp {
                    return Err(());
                }
                options.mcp = true;
            }
            "--data" => {
                if options.data_dir.is_some() {
                    return Err(());
                }
                let dir = args.next().ok_or(())?;
                options.data_dir = Some(dir);
            }
            "--mcp-http-port" => {
                if options.mcp_http_port.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                let port: u16 = raw.parse().map_err(|_| ())?;
                options.mcp_http_port = Some(port);
            }
            "--durable-writes" => {
                if options.durable_writes {
                    return Err(());
                }
                options.durable_writes = true;
            }
            "--retention-hours" => {
                if options.retention_hours.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                let hours: u64 = raw.parse().map_err(|_| ())?;
                options.retention_hours = Some(hours);
            }
            "--sweep-interval-secs" => {
                if options.sweep_interval_secs.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                let secs: u64 = raw.parse().map_err(|_| ())?;
                if secs == 0 {
                    return Err(());
                }
                options.sweep_interval_secs = Some(secs);
            }
            _ if arg.starts_with('-') => return Err(()),
            _ => {
                if options.data_dir.is_some() {
                    return Err(());
                }
                options.data_dir = Some(arg);
            }
        }
    }

    if options.mcp && options.mcp_http_port.is_some() {
        return Err(());
    }

    Ok(options)
}

fn resolve_data_dir(options: &CliOptions) -> String {
    options
        .data_dir
        .clone()
        .or_else(|| std::env::var(DATA_DIR_ENV).ok().filter(|dir| !dir.is_empty()))
        .unwrap_or_else(|| "data".to_owned())
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "deckhand".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_writer(std::io::stderr)
            .init();

        let data_dir = resolve_data_dir(&options);
        let durability = if options.durable_writes {
            WriteDurability::Durable
        } else {
            WriteDurability::BestEffort
        };
        let store = Arc::new(SessionStore::open_with_durability(&data_dir, durability)?);

        let sweeper_config = SweeperConfig {
            interval: options
                .sweep_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_SWEEP_INTERVAL),
            retention: options
                .retention_hours
                .map(|hours| Duration::from_secs(hours * 60 * 60))
                .unwrap_or(DEFAULT_RETENTION),
        };

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

        runtime.block_on(async move {
            let sweeper = Sweeper::spawn(store.clone(), sweeper_config);
            let mcp = DeckhandMcp::new(store);

            if options.mcp {
                tracing::info!(data_dir = %data_dir, "serving MCP over stdio");
                mcp.serve_stdio().await?;
                sweeper.shutdown().await;
                return Ok::<(), Box<dyn Error>>(());
            }

            let mcp_http_port = options.mcp_http_port.unwrap_or(DEFAULT_MCP_HTTP_PORT);
            let listener = tokio::net::TcpListener::bind(("127.0.0.1", mcp_http_port)).await?;
            let local_addr = listener.local_addr()?;
            tracing::info!(data_dir = %data_dir, %local_addr, "serving MCP over streamable HTTP");

            let config = StreamableHttpServerConfig {
                stateful_mode: true,
                ..StreamableHttpServerConfig::default()
            };
            let shutdown_token = config.cancellation_token.clone();
            let server_shutdown = shutdown_token.clone();

            let session_manager = Arc::new(LocalSessionManager::default());
            let mcp_service = {
                let mcp = mcp.clone();
                StreamableHttpService::new(move || Ok(mcp.clone()), session_manager, config)
            };

            let router = Router::new().nest_service("/mcp", mcp_service);
            let server_handle = tokio::spawn(async move {
                let serve = axum::serve(listener, router).with_graceful_shutdown(async move {
                    server_shutdown.cancelled().await;
                });
                if let Err(err) = serve.await {
                    tracing::error!(error = %err, "MCP HTTP server error");
                }
            });

            tokio::signal::ctrl_c().await?;
            tracing::info!("shutting down");
            shutdown_token.cancel();
            let _ = server_handle.await;
            sweeper.shutdown().await;

            Ok::<(), Box<dyn Error>>(())
        })?;

        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("deckhand: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_options, resolve_data_dir, CliOptions};

    #[test]
    fn parses_empty_args() {
        let options = parse_options(std::iter::empty()).expect("parse options");
        assert_eq!(options, CliOptions::default());
    }

    #[test]
    fn parses_mcp_flag() {
        let options = parse_options(["--mcp".to_owned()].into_iter()).expect("parse options");
        assert!(options.mcp);
        assert!(options.data_dir.is_none());
        assert_eq!(options.mcp_http_port, None);
    }

    #[test]
    fn parses_data_dir_flag() {
        let options = parse_options(["--data".to_owned(), "some/dir".to_owned()].into_iter())
            .expect("parse options");
        assert_eq!(options.data_dir.as_deref(), Some("some/dir"));
        assert!(!options.mcp);
    }

    #[test]
    fn parses_positional_data_dir() {
        let options = parse_options(["some/dir".to_owned()].into_iter()).expect("parse options");
        assert_eq!(options.data_dir.as_deref(), Some("some/dir"));
    }

    #[test]
    fn parses_positional_data_dir_with_mcp() {
        let options = parse_options(["some/dir".to_owned(), "--mcp".to_owned()].into_iter())
            .expect("parse options");
        assert_eq!(options.data_dir.as_deref(), Some("some/dir"));
        assert!(options.mcp);
    }

    #[test]
    fn parses_mcp_http_port() {
        let options = parse_options(["--mcp-http-port".to_owned(), "1234".to_owned()].into_iter())
            .expect("parse options");
        assert_eq!(options.mcp_http_port, Some(1234));
        assert!(!options.mcp);
    }

    #[test]
    fn rejects_mcp_http_port_with_stdio_mcp_mode() {
        parse_options(
            ["--mcp".to_owned(), "--mcp-http-port".to_owned(), "0".to_owned()].into_iter(),
        )
        .unwrap_err();
    }

    #[test]
    fn parses_retention_and_sweep_interval() {
        let options = parse_options(
            [
                "--retention-hours".to_owned(),
                "48".to_owned(),
                "--sweep-interval-secs".to_owned(),
                "600".to_owned(),
            ]
            .into_iter(),
        )
        .expect("parse options");
        assert_eq!(options.retention_hours, Some(48));
        assert_eq!(options.sweep_interval_secs, Some(600));
    }

    #[test]
    fn rejects_zero_sweep_interval() {
        parse_options(["--sweep-interval-secs".to_owned(), "0".to_owned()].into_iter())
            .unwrap_err();
    }

    #[test]
    fn rejects_non_numeric_values() {
        parse_options(["--retention-hours".to_owned(), "soon".to_owned()].into_iter())
            .unwrap_err();
        parse_options(["--mcp-http-port".to_owned(), "http".to_owned()].into_iter()).unwrap_err();
    }

    #[test]
    fn parses_durable_writes() {
        let options =
            parse_options(["--durable-writes".to_owned()].into_iter()).expect("parse options");
        assert!(options.durable_writes);
    }

    #[test]
    fn rejects_unknown_args() {
        parse_options(["--nope".to_owned()].into_iter()).unwrap_err();
    }

    #[test]
    fn rejects_duplicate_flags() {
        parse_options(["--mcp".to_owned(), "--mcp".to_owned()].into_iter()).unwrap_err();
        parse_options(
            ["--data".to_owned(), ".".to_owned(), "--data".to_owned(), "other".to_owned()]
                .into_iter(),
        )
        .unwrap_err();
        parse_options(["--durable-writes".to_owned(), "--durable-writes".to_owned()].into_iter())
            .unwrap_err();
    }

    #[test]
    fn rejects_multiple_positional_data_dirs() {
        parse_options(["one".to_owned(), "two".to_owned()].into_iter()).unwrap_err();
    }

    #[test]
    fn rejects_missing_flag_values() {
        parse_options(["--data".to_owned()].into_iter()).unwrap_err();
        parse_options(["--retention-hours".to_owned()].into_iter()).unwrap_err();
    }

    #[test]
    fn explicit_data_dir_wins_over_default() {
        let options = CliOptions { data_dir: Some("explicit".to_owned()), ..Default::default() };
        assert_eq!(resolve_data_dir(&options), "explicit");
    }
}
