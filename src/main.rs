//! hostrelay: forward every HTTP request to one upstream.
//!
//! ```text
//!     Client ──▶ listener ──▶ interceptor ──▶ forwarding engine ──▶ Upstream
//!            ◀──────────────────────────────  (status, headers, body) ◀──
//! ```
//!
//! Usage: `hostrelay --dest <[http://]host:port> --url <[http://]host:port> [--log <path|stdout>] [--config <file>]`

use std::process::ExitCode;

use hostrelay::cli::Cli;
use hostrelay::config::ConfigError;
use hostrelay::lifecycle::{self, Shutdown};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(ConfigError::Usage(e)) => e.exit(),
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(e.exit_code());
        }
    };

    match lifecycle::launch(cli, Shutdown::new()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.needs_stderr() {
                eprintln!("{e}");
            }
            ExitCode::from(e.exit_code())
        }
    }
}
