/*
[INPUT]:  CLI arguments, optional YAML config file, MEFS_* environment variables
[OUTPUT]: JSON tool responses on stdout, logs on stderr
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, config sources, or startup flow
*/

use anyhow::{Context, Result, anyhow};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use mefs_mcp_adapter::{MefsConfig, MefsTools, RetrieveOutput, ToolResponse};

const ENV_PREFIX: &str = "MEFS";

#[derive(Parser, Debug)]
#[command(name = "mefs-mcp-cli", version, about = "Upload and retrieve files on MEFS storage")]
struct Cli {
    /// YAML config file; MEFS_* environment variables override it
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a local file
    Upload {
        path: PathBuf,
        /// Stored filename; defaults to the file's own name
        #[arg(long)]
        name: Option<String>,
        /// Encryption key
        #[arg(long)]
        key: Option<String>,
        #[arg(long)]
        public: bool,
    },
    /// Retrieve a file by CID
    Retrieve {
        cid: String,
        /// Decryption key
        #[arg(long)]
        key: Option<String>,
        /// Write the file here instead of printing base64
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Print the configured wallet address
    Address,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    let config = load_config(args.config_path.as_deref())?;
    info!(api_base_url = %config.api_base_url, chain_id = config.chain_id, "configuration loaded");

    let tools = MefsTools::new(&config).context("build MEFS tools")?;

    match args.command {
        Command::Address => {
            println!("{}", tools.identity().address);
            Ok(())
        }
        Command::Upload {
            path,
            name,
            key,
            public,
        } => {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("read {}", path.display()))?;
            let name = match name {
                Some(name) => name,
                None => file_name(&path)?,
            };
            debug!(path = %path.display(), size = bytes.len(), "read upload source");

            let mut arguments = serde_json::json!({
                "file": BASE64.encode(&bytes),
                "name": name,
            });
            if let Some(key) = key {
                arguments["key"] = key.into();
            }
            if public {
                arguments["public"] = true.into();
            }

            let response = tools.call("upload", arguments).await;
            emit(&response)
        }
        Command::Retrieve { cid, key, output } => {
            let mut arguments = serde_json::json!({ "cid": cid });
            if let Some(key) = key {
                arguments["key"] = key.into();
            }

            let response = tools.call("retrieve", arguments).await;
            match output {
                Some(output) if !response.is_error => write_retrieved(&response, &output),
                _ => emit(&response),
            }
        }
    }
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<MefsConfig> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path).format(config::FileFormat::Yaml));
    }
    let config: MefsConfig = builder
        .add_source(config::Environment::with_prefix(ENV_PREFIX))
        .build()
        .context("read configuration")?
        .try_deserialize()
        .context("parse configuration")?;
    config.validate().context("validate configuration")?;
    Ok(config)
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .with_context(|| format!("cannot derive a filename from {}", path.display()))
}

/// Print the tool response; an error envelope becomes a non-zero exit
fn emit(response: &ToolResponse) -> Result<()> {
    let text = serde_json::to_string_pretty(response).context("serialize tool response")?;
    println!("{text}");
    if response.is_error {
        let name = response
            .error_envelope()
            .map(|envelope| envelope.name)
            .unwrap_or_else(|| "UnknownError".to_string());
        return Err(anyhow!("tool returned {name}"));
    }
    Ok(())
}

fn write_retrieved(response: &ToolResponse, output: &Path) -> Result<()> {
    let payload = response.payload().context("retrieve response has no payload")?;
    let retrieved: RetrieveOutput =
        serde_json::from_value(payload).context("decode retrieve response")?;
    let bytes = BASE64.decode(&retrieved.file).context("decode file contents")?;
    std::fs::write(output, &bytes).with_context(|| format!("write {}", output.display()))?;
    info!(
        cid = %retrieved.cid,
        filename = %retrieved.filename,
        size = retrieved.size,
        output = %output.display(),
        "file written"
    );
    Ok(())
}
