use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

use mna::api::ApiClient;
use mna::auth::{self, AuthError, FieldError, LoginForm, RegistrationForm};
use mna::config::{self, MnaConfig};
use mna::export::{self, ExportFormat};
use mna::output::{json as json_out, table};
use mna::report::AnalyticsReport;
use mna::session::SessionStore;
use mna::upload::{FileMeta, UploadSession};

#[derive(Parser)]
#[command(name = "mna", version, about = "Meeting Analytics — upload MP3 recordings for diarization and export the report")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Backend base URL (default: from config, else http://localhost:8000)
    #[arg(long, global = true, env = "MNA_SERVER")]
    server: Option<String>,

    /// State directory (default: ~/.mna)
    #[arg(long, global = true, env = "MNA_HOME")]
    home: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account on the analysis backend
    Register {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Log in and store the session token
    Login {
        #[arg(long)]
        username: String,

        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Clear the local session and notify the server (best-effort)
    Logout,

    /// Show the active session
    Whoami,

    /// Upload an MP3 recording for analysis
    Upload {
        /// Path to the recording (.mp3, up to 20 MiB)
        file: PathBuf,

        /// Also write the raw report JSON here for later `show`/`export`
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Render a saved analytics report
    Show {
        /// Path to a report saved with `upload --save`
        report: PathBuf,
    },

    /// Export a saved report to a file
    Export {
        /// Path to a report saved with `upload --save`
        report: PathBuf,

        /// Output format: text, json, word, pdf
        #[arg(long, default_value = "text")]
        format: String,

        /// Output path (default: meeting-analytics.<ext>)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Manage client configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a config.toml template
    Init,
    /// Print the resolved configuration
    Show,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let json_output = cli.json;

    let home = config::data_dir(cli.home)?;
    let config = MnaConfig::load(&home)?;
    let base_url = config::resolve_base_url(cli.server.as_deref(), &config);
    let store = SessionStore::open(&home);

    match cli.command {
        Commands::Register {
            username,
            email,
            password,
        } => {
            let password = password_or_prompt(password)?;
            let form = RegistrationForm {
                username,
                email,
                password,
            };
            let client = ApiClient::new(&base_url, None);
            match auth::register(&client, &form) {
                Ok(()) => println!("{}", auth::REGISTERED_MESSAGE),
                Err(AuthError::Invalid(errors)) => {
                    print_field_errors(&errors);
                    std::process::exit(1);
                }
                Err(AuthError::Rejected {
                    banner,
                    field_errors,
                }) => {
                    eprintln!("Error: {banner}");
                    print_field_errors(&field_errors);
                    std::process::exit(1);
                }
                Err(AuthError::Transport(e)) => {
                    return Err(e.context("Registration request failed"))
                }
            }
        }

        Commands::Login { username, password } => {
            let password = password_or_prompt(password)?;
            let form = LoginForm { username, password };
            let client = ApiClient::new(&base_url, None);
            match auth::login(&client, &store, &form) {
                Ok(session) => {
                    println!("Logged in as {} (user id {})", session.user_name, session.user_id)
                }
                Err(AuthError::Invalid(errors)) => {
                    print_field_errors(&errors);
                    std::process::exit(1);
                }
                Err(AuthError::Rejected { banner, .. }) => {
                    eprintln!("Error: {banner}");
                    std::process::exit(1);
                }
                Err(AuthError::Transport(e)) => return Err(e.context("Login request failed")),
            }
        }

        Commands::Logout => {
            let client = ApiClient::new(&base_url, None);
            if auth::logout(&client, &store)? {
                println!("Logged out.");
            } else {
                println!("No active session.");
            }
        }

        Commands::Whoami => match store.load()? {
            Some(session) => {
                if json_output {
                    json_out::print_json(&session)?;
                } else {
                    println!(
                        "{} (user id {}), logged in since {}",
                        session.user_name, session.user_id, session.created_at
                    );
                }
            }
            None => println!("Not logged in."),
        },

        Commands::Upload { file, save } => {
            let token = store.load()?.map(|s| s.token);
            let client = ApiClient::new(&base_url, token);

            let meta = FileMeta::from_path(&file)?;
            let mut flow = UploadSession::new();
            if let Err(e) = flow.select(meta) {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
            if let Some(f) = flow.selected_file() {
                table::print_selected_file(&f.name, f.size);
            }

            let report = match flow.run(&client, &file, |pct| {
                eprint!("\r  Uploading... {pct:>3}%");
                std::io::stderr().flush().ok();
            }) {
                Ok(report) => {
                    eprintln!("\r  Uploading... 100%");
                    report
                }
                Err(e) => {
                    eprintln!();
                    eprintln!("{e}");
                    std::process::exit(1);
                }
            };

            if json_output {
                json_out::print_json(&report)?;
            } else {
                table::print_upload_summary(&report);
            }

            if let Some(ref save_path) = save {
                report.save(save_path)?;
                println!("Saved report to {}", save_path.display());
            }
        }

        Commands::Show { report } => {
            let report = AnalyticsReport::load(&report)?;
            if json_output {
                json_out::print_json(&report)?;
            } else {
                table::print_report(&report);
            }
        }

        Commands::Export {
            report,
            format,
            out,
        } => {
            let format = ExportFormat::from_str(&format)
                .with_context(|| format!("Unknown format: {format}. Use: text, json, word, pdf"))?;
            let report = AnalyticsReport::load(&report)?;

            // A render failure is a notice, not a crash; the saved report
            // is left as-is for another attempt.
            let bytes = match export::render(&report, format) {
                Ok(bytes) => bytes,
                Err(e) => {
                    eprintln!("Export failed: {e}. Please try again.");
                    std::process::exit(1);
                }
            };

            let out_path = out.unwrap_or_else(|| PathBuf::from(format.file_name()));
            std::fs::write(&out_path, &bytes)
                .with_context(|| format!("Failed to write: {}", out_path.display()))?;
            debug!(
                "Wrote {} as {}",
                out_path.display(),
                format.content_type()
            );
            println!("Exported {} ({} bytes)", out_path.display(), bytes.len());
        }

        Commands::Config { command } => match command {
            ConfigCommands::Init => {
                if config::init_config(&home)? {
                    println!("Created {}", config::config_path(&home).display());
                } else {
                    println!(
                        "Config already exists: {}",
                        config::config_path(&home).display()
                    );
                }
            }
            ConfigCommands::Show => {
                println!("Server: {base_url}");
                println!("{}", config.display());
            }
        },
    }

    Ok(())
}

// TODO: mask the interactive prompt (rpassword) before 1.0.
fn password_or_prompt(password: Option<String>) -> Result<String> {
    if let Some(p) = password {
        return Ok(p);
    }
    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn print_field_errors(errors: &[FieldError]) {
    for e in errors {
        eprintln!("  {}: {}", e.field.label(), e.message);
    }
}
