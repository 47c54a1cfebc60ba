//! FlowComposer CLI Entry Point
//!
//! Runs the REST service, or generates a single workflow from the
//! command line.
//!
//! # Usage
//!
//! ```bash
//! # Serve the API on the default port (8000)
//! flowcomposer
//!
//! # Serve on a specific address with a frontend directory
//! flowcomposer serve --host 127.0.0.1 --port 9000 --static-dir ./public
//!
//! # Generate one workflow and print it as JSON
//! flowcomposer generate "fetch data every hour and filter it"
//!
//! # Generate as YAML into a file
//! flowcomposer generate "on a webhook, transform the payload" --output flow.yaml
//! ```

use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use colored::Colorize;
use log::{info, warn};

use flowcomposer::api::{self, AppState};
use flowcomposer::config::Config;
use flowcomposer::generation::Generator;
use flowcomposer::storage::WorkflowStore;
use flowcomposer::workflow::save_workflow;
use flowcomposer::{APP_NAME, VERSION};

/// What the process should do.
#[derive(Debug, PartialEq)]
enum Command {
    Serve,
    Generate {
        description: String,
        yaml: bool,
        output: Option<PathBuf>,
    },
}

/// Command-line arguments; unset options fall back to the environment.
#[derive(Debug)]
struct CliArgs {
    command: Command,
    host: Option<IpAddr>,
    port: Option<u16>,
    model: Option<String>,
    static_dir: Option<PathBuf>,
    verbose: bool,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            command: Command::Serve,
            host: None,
            port: None,
            model: None,
            static_dir: None,
            verbose: false,
        }
    }
}

impl CliArgs {
    /// Applies command-line overrides on top of environment configuration.
    fn apply(&self, config: &mut Config) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(ref model) = self.model {
            config.ai.model = model.clone();
        }
        if let Some(ref dir) = self.static_dir {
            config.server.static_dir = Some(dir.clone());
        }
    }
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Prints the application banner with version information.
fn print_banner() {
    println!();
    println!("{} v{}", APP_NAME.bold(), VERSION);
    println!("{}", "Workflow Composition Service".dimmed());
    println!();
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: flowcomposer [serve] [OPTIONS]");
    println!("       flowcomposer generate <DESCRIPTION> [--yaml] [--output FILE]");
    println!();
    println!("Commands:");
    println!("  serve               Run the REST API (default)");
    println!("  generate            Generate one workflow and print or save it");
    println!();
    println!("Options:");
    println!("  --host ADDR         Listening address (env HOST, default 0.0.0.0)");
    println!("  --port N            Listening port (env PORT, default 8000)");
    println!("  --static-dir PATH   Serve frontend files from PATH (env STATIC_DIR)");
    println!("  --model NAME        Language model (env OPENAI_MODEL)");
    println!("  --yaml              Print generated workflow as YAML");
    println!("  --output FILE       Save generated workflow (.json, .yaml or .yml)");
    println!("  --verbose           Enable debug logging");
    println!("  --help              Show this help message");
    println!("  --version           Show version information");
    println!();
    println!("Set OPENAI_API_KEY to generate with a language model; without it the");
    println!("keyword heuristic is used.");
}

/// Returns the value following option `name`, advancing the cursor.
fn option_value<'a>(args: &'a [String], i: &mut usize, name: &str) -> Result<&'a str, String> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| format!("{} requires a value", name))
}

/// Parses command-line arguments into a CliArgs struct.
fn parse_arguments(args: &[String]) -> Result<CliArgs, String> {
    let mut cli = CliArgs::default();
    let mut positionals: Vec<String> = Vec::new();
    let mut yaml = false;
    let mut output = None;
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "--verbose" | "-v" => cli.verbose = true,
            "--yaml" => yaml = true,
            "--host" => {
                let value = option_value(args, &mut i, "--host")?;
                cli.host = Some(
                    value
                        .parse()
                        .map_err(|_| format!("Invalid host address: {}", value))?,
                );
            }
            "--port" => {
                let value = option_value(args, &mut i, "--port")?;
                cli.port = Some(
                    value
                        .parse()
                        .map_err(|_| format!("Invalid port value: {}", value))?,
                );
            }
            "--model" => {
                cli.model = Some(option_value(args, &mut i, "--model")?.to_string());
            }
            "--static-dir" => {
                cli.static_dir = Some(PathBuf::from(option_value(args, &mut i, "--static-dir")?));
            }
            "--output" | "-o" => {
                output = Some(PathBuf::from(option_value(args, &mut i, "--output")?));
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => positionals.push(arg.clone()),
        }
        i += 1;
    }

    let mut positionals = positionals.into_iter();
    cli.command = match positionals.next().as_deref() {
        None | Some("serve") => {
            if yaml || output.is_some() {
                return Err("--yaml and --output only apply to 'generate'".to_string());
            }
            Command::Serve
        }
        Some("generate") => {
            let description = positionals.next().ok_or("generate requires a description")?;
            Command::Generate {
                description,
                yaml,
                output,
            }
        }
        Some(other) => return Err(format!("Unknown command: {}", other)),
    };

    if let Some(extra) = positionals.next() {
        return Err(format!("Unexpected argument: {}", extra));
    }

    Ok(cli)
}

/// Runs the REST API until shutdown.
async fn serve(config: Config, generator: Generator) -> Result<(), Box<dyn std::error::Error>> {
    print_banner();

    info!("Generation mode: {}", generator.label());
    if config.server.static_dir.is_none() {
        info!("No static directory configured; serving API routes only");
    }

    let state = AppState::new(WorkflowStore::new(), generator);
    let app = api::app(state, config.server.static_dir.as_deref());
    api::serve(app, &config.server).await?;
    Ok(())
}

/// Generates a single workflow and prints or saves it.
async fn generate(
    generator: Generator,
    description: &str,
    yaml: bool,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let workflow = generator.generate(description).await?;

    if let Some(path) = output {
        save_workflow(&workflow, &path)?;
        println!("{} {}", "Saved".green(), path.display());
        return Ok(());
    }

    let rendered = if yaml {
        serde_yaml::to_string(&workflow)?
    } else {
        serde_json::to_string_pretty(&workflow)?
    };
    println!("{}", rendered);
    Ok(())
}

/// Main application entry point.
async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    // Parse arguments
    let cli = parse_arguments(&args).map_err(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        e
    })?;

    // Setup logging
    setup_logging(cli.verbose);

    let mut config = Config::from_env()?;
    cli.apply(&mut config);

    if config.ai.credential().is_some() && config.ai.base_url.starts_with("http://") {
        warn!("Language model credential will be sent over plain HTTP");
    }

    let generator = Generator::from_config(&config.ai)?;

    match cli.command {
        Command::Serve => serve(config, generator).await,
        Command::Generate {
            description,
            yaml,
            output,
        } => generate(generator, &description, yaml, output).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
