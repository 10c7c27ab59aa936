//! Mock REST CLI
//!
//! Serves the mock API, validates payloads offline and checks data directories.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use mock_rest::{check, load_json, FileStatus, MockServer, SchemaValidator, ServerConfig, Severity};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "mock-rest")]
#[command(about = "File-backed mock REST API with JSON Schema validation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// JSON config file (e.g. config/default.json)
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(long, short)]
        port: Option<u16>,

        /// Directory holding <resource>.json and <resource>.schema files
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Directory served for non-API paths
        #[arg(long)]
        static_dir: Option<PathBuf>,

        /// Log every HTTP request
        #[arg(long)]
        access_logs: bool,
    },

    /// Validate a payload against a resource's schema
    Validate {
        /// Resource name (schema is <data-dir>/<resource>.schema)
        resource: String,

        /// Payload file to validate
        payload: PathBuf,

        /// Directory holding schema files
        #[arg(long, default_value = "./mock")]
        data_dir: PathBuf,

        /// Output the validation result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check collections and schemas in a data directory
    Check {
        /// Data directory to check
        #[arg(default_value = "./mock")]
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(matches!(cli.command, Commands::Serve { .. }));

    let result = match cli.command {
        Commands::Serve {
            config,
            host,
            port,
            data_dir,
            static_dir,
            access_logs,
        } => run_serve(ServeArgs {
            config,
            host,
            port,
            data_dir,
            static_dir,
            access_logs,
        }),

        Commands::Validate {
            resource,
            payload,
            data_dir,
            json,
        } => run_validate(&resource, &payload, &data_dir, json),

        Commands::Check {
            path,
            format,
            strict,
            quiet,
        } => run_check(&path, &format, strict, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Log to stderr; the server logs at info, one-shot commands only at warn.
fn init_tracing(serving: bool) {
    let default = if serving { "info,mock_rest=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

struct ServeArgs {
    config: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    data_dir: Option<PathBuf>,
    static_dir: Option<PathBuf>,
    access_logs: bool,
}

fn run_serve(args: ServeArgs) -> Result<(), u8> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::from_file(path).map_err(|e| {
            tracing::error!("{}", e);
            2u8
        })?,
        None => ServerConfig::default(),
    };

    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.listener_port = port;
    }
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = args.static_dir {
        config.static_dir = dir;
    }
    config.enable_access_logs |= args.access_logs;

    if !config.data_dir.is_dir() {
        tracing::warn!(
            "data directory {} does not exist; every request will fail",
            config.data_dir.display()
        );
    }

    let runtime = tokio::runtime::Runtime::new().map_err(|e| {
        tracing::error!("cannot start runtime: {}", e);
        3u8
    })?;

    runtime
        .block_on(MockServer::with_config(config).start())
        .map_err(|e| {
            tracing::error!("server error: {}", e);
            3u8
        })
}

fn run_validate(resource: &str, payload_path: &Path, data_dir: &Path, json_output: bool) -> Result<(), u8> {
    let payload = load_json(payload_path).map_err(|e| {
        report_error(json_output, &format!("loading payload: {}", e));
        e.exit_code() as u8
    })?;

    let result = SchemaValidator::new(data_dir).validate(resource, &payload);

    if json_output {
        match serde_json::to_string(&result) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                report_error(false, &e.to_string());
                return Err(2);
            }
        }
    } else if result.is_valid {
        println!("Valid");
    } else if let Some(errors) = &result.errors {
        eprintln!("Validation failed:");
        for error in errors {
            eprintln!("  {}", error);
        }
    } else if let Some(message) = &result.message {
        eprintln!("Error: {}", message);
    }

    match (result.is_valid, &result.errors) {
        (true, _) => Ok(()),
        (false, Some(_)) => Err(1),
        (false, None) => Err(2),
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "isValid": false, "message": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}

fn run_check(path: &Path, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.is_dir() {
        eprintln!("Error: directory not found: {}", path.display());
        return Err(2);
    }

    let result = check(path, strict);

    if format == "json" {
        match serde_json::to_string_pretty(&result) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("Error: {}", e);
                return Err(2);
            }
        }
    } else {
        if !quiet {
            println!("Checking {} ...\n", path.display());
        }

        for file_result in &result.results {
            let status_icon = match file_result.status {
                FileStatus::Ok => "\x1b[32m✓\x1b[0m",
                FileStatus::Warning => "\x1b[33m⚠\x1b[0m",
                FileStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || file_result.status != FileStatus::Ok {
                println!("  {} {}", status_icon, file_result.file.display());
            }

            for diag in &file_result.diagnostics {
                let (color, label) = match diag.severity {
                    Severity::Error => ("\x1b[31m", "error"),
                    Severity::Warning => ("\x1b[33m", "warning"),
                };
                if !quiet || diag.severity == Severity::Error {
                    println!(
                        "    {}{}[{}]\x1b[0m: {} - {}",
                        color, label, diag.code, diag.path, diag.message
                    );
                }
            }
        }

        println!();
        if result.is_ok() && (!strict || result.warnings == 0) {
            println!(
                "\x1b[32m✓ {} files checked, all passed\x1b[0m",
                result.files_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} files checked: {} passed, {} failed ({} errors, {} warnings)\x1b[0m",
                result.files_checked, result.passed, result.failed, result.errors, result.warnings
            );
        }
    }

    if result.is_ok() && (!strict || result.warnings == 0) {
        Ok(())
    } else {
        Err(1)
    }
}
