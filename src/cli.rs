use std::fs;
use std::path::PathBuf;

use agentscope::config::{ConfigLoader, ScopeConfig};
use agentscope::export::{ExportFormat, RequestExport, SessionExport};
use agentscope::http::{Body, ObservedClient, ReqwestClient, Request, Response};
use agentscope::utils::printer::{requests_table, sessions_table, summary_table};
use agentscope::utils::{ResponseFormat, ResponseFormatter};
use agentscope::{Scope, analysis};
use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;

pub type Result<T> = std::result::Result<T, anyhow::Error>;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file, defaults to the nearest agentscope.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the observed domain filter
    #[arg(long, global = true)]
    pub domain: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send one request through the observer and show what was captured
    Send(SendArgs),
    /// Summarise a request export
    Summary { file: PathBuf },
    /// List sessions from a session export
    Sessions { file: PathBuf },
}

#[derive(Args)]
pub struct SendArgs {
    pub method: String,
    pub url: String,

    /// Header as `Name: value`, repeatable
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Request body; JSON is sent as JSON, anything else as text
    #[arg(short, long)]
    pub data: Option<String>,

    #[arg(long)]
    pub bearer: Option<String>,

    /// Dispatch in the background and wait on the completion handle
    #[arg(long)]
    pub dispatch: bool,

    /// Write the captured traffic to the export directory
    #[arg(long, value_enum)]
    pub export: Option<ExportKind>,

    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ExportKind {
    Json,
    Csv,
}

impl From<ExportKind> for ExportFormat {
    fn from(kind: ExportKind) -> Self {
        match kind {
            ExportKind::Json => ExportFormat::Json,
            ExportKind::Csv => ExportFormat::Csv,
        }
    }
}

impl Cli {
    pub fn load_config(&self) -> Result<ScopeConfig> {
        let mut config = match &self.config {
            Some(path) => ConfigLoader::load_from_path(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ConfigLoader::find_and_load()?,
        };
        if let Some(domain) = &self.domain {
            config = config.with_domain_filter(domain);
        }
        config.validate()?;
        Ok(config)
    }
}

fn parse_header(raw: &str) -> Result<(String, String)> {
    raw.split_once(':')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| anyhow!("header must look like `Name: value`, got {:?}", raw))
}

fn parse_body(data: Option<String>) -> Option<Body> {
    data.map(|data| match serde_json::from_str(&data) {
        Ok(value) => Body::Json(value),
        Err(_) => Body::Text(data),
    })
}

async fn issue(
    client: &ObservedClient<ReqwestClient>,
    args: &SendArgs,
) -> Result<agentscope::Result<Response>> {
    let mut headers = args
        .headers
        .iter()
        .map(|h| parse_header(h))
        .collect::<Result<Vec<_>>>()?;
    if let Some(token) = &args.bearer {
        headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
    }
    let body = parse_body(args.data.clone());
    if let Some(Body::Json(_)) = body {
        headers.push(("Content-Type".to_string(), "application/json".to_string()));
    }

    if args.dispatch {
        let mut pending = client.open(args.method.parse()?, &args.url)?;
        for (name, value) in &headers {
            pending = pending.header(name, value)?;
        }
        return Ok(pending.send(body)?.wait().await);
    }

    let mut request = Request::new(&args.method, &args.url)?;
    for (name, value) in &headers {
        request = request.with_header(name, value)?;
    }
    request.body = body;
    Ok(client.fetch(request).await)
}

async fn send(config: ScopeConfig, args: SendArgs) -> Result<()> {
    let scope = Scope::new(config)?;
    let client = scope.instrument(ReqwestClient::new()?);

    let outcome = issue(&client, &args).await?;

    let format = if args.verbose {
        ResponseFormat::Verbose
    } else {
        ResponseFormat::Compact
    };
    let formatter = ResponseFormatter::new(format);

    match &outcome {
        Ok(response) => println!("{}", formatter.format(response)?),
        Err(e) => eprintln!("{}: {}", "Request failed".red().bold(), e),
    }

    match scope.api().get_requests().first() {
        Some(captured) => {
            if let Some(report) = scope.api().analyze(&captured.id).report() {
                println!("\n{}", formatter.format_analysis(report));
            }
        }
        None => println!(
            "\n{}",
            format!(
                "Host not observed (filter {:?})",
                scope.config().domain_filter
            )
            .dimmed()
        ),
    }

    if let Some(kind) = args.export {
        scope.api().export(kind.into());
        scope.auth().export();
        scope.sessions().export();
    }

    outcome?;
    Ok(())
}

fn summary(file: PathBuf) -> Result<()> {
    let content = fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
    let export: RequestExport = serde_json::from_str(&content)?;

    println!("{}", requests_table(&export.requests));
    println!(
        "{}",
        summary_table(&export.summary, &analysis::endpoint_metrics(&export.requests))
    );
    println!("Exported at {}", export.export_time.to_rfc3339());
    Ok(())
}

fn sessions(file: PathBuf) -> Result<()> {
    let content = fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
    let export: SessionExport = serde_json::from_str(&content)?;

    println!("{}", sessions_table(&export.sessions));
    println!(
        "{} sessions, {} messages",
        export.summary.total, export.summary.messages
    );
    Ok(())
}

pub async fn run(cli: Cli, config: ScopeConfig) -> Result<()> {
    match cli.command {
        Commands::Send(args) => send(config, args).await,
        Commands::Summary { file } => summary(file),
        Commands::Sessions { file } => sessions(file),
    }
}
