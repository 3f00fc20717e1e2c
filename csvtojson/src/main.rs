//! csvtojson CLI - stream CSV from a file or stdin to JSON lines on stdout
//!
//! ```bash
//! cat people.csv | csvtojson
//! csvtojson -f people.csv -s ';'
//! csvtojson -f people.csv -m '{"field1":"id","field2":"name"}' -i '{"source":"crm"}'
//! csvtojson -f huge.csv -t 30s
//! ```

use clap::Parser;
use csvtojson::logs::{log_warning, LOG_BROADCASTER};
use csvtojson::{
    parse_separator, parse_string_map, parse_timeout, transform, CancelError, CancelToken,
    Settings, SettingsBuilder,
};
use std::fs::File;
use std::io::{self, LineWriter, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// How long a cancelled run may take to reach its next cancellation check.
const CANCEL_GRACE: Duration = Duration::from_millis(500);

#[derive(Parser)]
#[command(name = "csvtojson")]
#[command(about = "Stream CSV records as newline-delimited JSON objects", long_about = None)]
struct Cli {
    /// CSV separator, a single character [default: ,]
    #[arg(short, long, env = "CSVTOJSON_SEPARATOR")]
    separator: Option<String>,

    /// Field mapping json object where keys are incoming headers and values are the output keys
    #[arg(short, long, env = "CSVTOJSON_MAPPING")]
    mapping: Option<String>,

    /// Static key/value(s) json object to inject into resulting json objects
    #[arg(short, long, env = "CSVTOJSON_INJECT")]
    inject: Option<String>,

    /// Path to csv file. Must use either this or pipe csv via standard input
    #[arg(short, long, env = "CSVTOJSON_FILEPATH")]
    filepath: Option<PathBuf>,

    /// Stop after this long (e.g. 500ms, 30s, 2m); 0 disables the timeout
    #[arg(short, long, env = "CSVTOJSON_TIMEOUT", default_value = "0")]
    timeout: String,

    /// JSON settings file ({"separator", "mapping", "inject"}); flags override it
    #[arg(short, long, env = "CSVTOJSON_CONFIG")]
    config: Option<PathBuf>,

    /// Do not print progress logs to stderr
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    LOG_BROADCASTER.set_echo(!cli.quiet);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let settings = resolve_settings(&cli)?;
    let timeout = parse_timeout(&cli.timeout)?;
    let source = open_source(cli.filepath.as_deref())?;

    let token = match timeout {
        Some(timeout) => CancelToken::with_timeout(timeout),
        None => CancelToken::new(),
    };

    let worker_token = token.clone();
    let mut job = tokio::task::spawn_blocking(move || {
        // every line reaches stdout before the next read, so an exit on
        // deadline or Ctrl-C keeps what was already converted
        let stdout = io::stdout();
        let sink = LineWriter::new(stdout.lock());
        transform(&worker_token, source, sink, &settings)
    });

    let stop_reason = tokio::select! {
        joined = &mut job => {
            joined??;
            return Ok(());
        }
        _ = tokio::signal::ctrl_c() => {
            log_warning("Interrupted, stopping");
            token.cancel();
            CancelError::Cancelled
        }
        _ = sleep_until(token.deadline()) => CancelError::DeadlineExceeded,
    };

    // The worker notices at its next record; a read blocked on the source
    // cannot be interrupted, so stop waiting after a grace period.
    match tokio::time::timeout(CANCEL_GRACE, job).await {
        Ok(joined) => {
            joined??;
            Ok(())
        }
        Err(_) => Err(stop_reason.into()),
    }
}

/// Settings file first, then flags; a flag overrides the file.
fn resolve_settings(cli: &Cli) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut builder = SettingsBuilder::new();

    if let Some(ref path) = cli.config {
        builder = builder.merge(Settings::from_json_file(path)?);
    }
    if let Some(ref separator) = cli.separator {
        builder = builder.separator(parse_separator(separator)?);
    }
    if let Some(ref mapping) = cli.mapping {
        if let Some(mapping) = parse_string_map("mapping", mapping)? {
            builder = builder.field_mapping(mapping);
        }
    }
    if let Some(ref inject) = cli.inject {
        if let Some(inject) = parse_string_map("inject", inject)? {
            builder = builder.injection(inject);
        }
    }

    Ok(builder.build())
}

/// Piped stdin first, then `--filepath`.
fn open_source(filepath: Option<&Path>) -> Result<Box<dyn Read + Send>, Box<dyn std::error::Error>> {
    if stdin_is_piped() {
        return Ok(Box::new(io::stdin()));
    }

    match filepath {
        Some(path) => {
            let file = File::open(path)
                .map_err(|e| format!("cannot open '{}': {}", path.display(), e))?;
            Ok(Box::new(file))
        }
        None => Err("filepath required if no csv content is piped into standard input".into()),
    }
}

/// Terminals and other character devices (`/dev/null`) do not count as piped.
#[cfg(unix)]
fn stdin_is_piped() -> bool {
    use std::os::fd::AsFd;
    use std::os::unix::fs::FileTypeExt;

    io::stdin()
        .as_fd()
        .try_clone_to_owned()
        .map(File::from)
        .and_then(|file| file.metadata())
        .map(|meta| !meta.file_type().is_char_device())
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn stdin_is_piped() -> bool {
    use std::io::IsTerminal;
    !io::stdin().is_terminal()
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
        None => std::future::pending().await,
    }
}
