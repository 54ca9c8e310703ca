//! `cep`: look up Brazilian postal codes from the terminal.
//!
//! Reads config from flags or env vars:
//!   CEP_BASE_URL     : lookup endpoint (default: https://viacep.com.br/ws)
//!   CEP_TIMEOUT_SECS : per-request timeout (default: 10)
//!   RUST_LOG         : log filter, logs go to stderr (default: warn)

mod render;
mod transport;

use std::borrow::Cow;
use std::io::{BufRead, IsTerminal, Write};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use cep_core::{AddressLookupController, LookupState, Transport, ViaCepClient, DEFAULT_BASE_URL};
use clap::Parser;

use crate::render::render;
use crate::transport::UreqTransport;

#[derive(Debug, Parser)]
#[command(name = "cep", version, about = "Look up addresses by CEP")]
struct Cli {
    /// Codes to look up. Without any, one code per line is read from stdin.
    codes: Vec<String>,

    /// Base URL of the lookup service.
    #[arg(long, env = "CEP_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Request timeout in seconds.
    #[arg(
        long,
        env = "CEP_TIMEOUT_SECS",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let transport = UreqTransport::new(Duration::from_secs(cli.timeout));
    let mut controller = AddressLookupController::new(ViaCepClient::new(&cli.base_url));
    tracing::info!(base_url = %controller.client().base_url(), "ready");

    let interactive = std::io::stdin().is_terminal();
    if std::io::stderr().is_terminal() {
        controller.subscribe(|state: &LookupState| {
            if state.is_awaiting() {
                eprintln!("Buscando {}...", state.code().trim());
            }
        });
    }

    let mut stdout = std::io::stdout().lock();

    if !cli.codes.is_empty() {
        let mut failed = false;
        for code in cli.codes {
            controller.update_code(code);
            let state = controller.submit(&transport).await;
            failed = state.error().is_some();
            write!(stdout, "{}", render(state)).context("writing result")?;
        }
        return Ok(if failed {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        });
    }

    let stdin = std::io::stdin().lock();
    run_lines(&mut controller, &transport, stdin, &mut stdout, interactive).await?;

    Ok(ExitCode::SUCCESS)
}

/// Look up one code per input line until EOF.
///
/// Bytes that are not UTF-8 are replaced, so a garbled line is rejected by
/// validation like any other bad code and the session goes on.
async fn run_lines<T: Transport>(
    controller: &mut AddressLookupController,
    transport: &T,
    mut input: impl BufRead,
    output: &mut impl Write,
    prompt: bool,
) -> Result<()> {
    let mut buf = Vec::new();
    loop {
        if prompt {
            eprint!("Digite o CEP: ");
        }
        buf.clear();
        if input.read_until(b'\n', &mut buf).context("reading stdin")? == 0 {
            break;
        }
        let text = String::from_utf8_lossy(&buf);
        if matches!(text, Cow::Owned(_)) {
            tracing::warn!("input line is not valid UTF-8");
        }
        let line = text.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }

        controller.update_code(line);
        let state = controller.submit(transport).await;
        write!(output, "{}", render(state)).context("writing result")?;
        output.flush().context("flushing stdout")?;
    }
    Ok(())
}
