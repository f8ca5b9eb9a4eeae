use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use cvsdk::config::Config;
use cvsdk::resource::{extract_json_value, get_all_collection_keys, get_collection};
use cvsdk::{Context, Gateway, Method, RequestChecks, ResourceCollection, SdkError, ServiceFetcher};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Command line client for CommServe REST APIs
#[derive(Parser, Debug)]
#[command(name = "cvsdk", version, about, long_about = None)]
struct Args {
    /// Web-service base URL (e.g. https://commserve/webconsole/api/)
    #[arg(short, long, global = true)]
    base_url: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    /// Run in read-only mode (block all write operations)
    #[arg(long, global = true)]
    readonly: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the known collection types
    Collections,
    /// List the resolved service addresses
    Services,
    /// List the entries of a collection
    List {
        collection: String,
        /// Extra property columns (dot paths)
        #[arg(short, long)]
        field: Vec<String>,
    },
    /// Show one entry of a collection
    Show { collection: String, name: String },
    /// Create an entry in a collection
    Add {
        collection: String,
        name: String,
        /// Creation parameters as a JSON object
        #[arg(long)]
        params: Option<String>,
    },
    /// Delete an entry from a collection
    Delete { collection: String, name: String },
    /// Call a service endpoint directly
    Call {
        service: String,
        #[arg(short, long, default_value = "GET")]
        method: String,
        /// JSON request body
        #[arg(long)]
        payload: Option<String>,
        /// Values for the service's %s placeholders, in order
        #[arg(short, long)]
        param: Vec<String>,
        /// Fail when the body reports a non-zero errorCode
        #[arg(long)]
        check: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {:?}: {}", log_path, e);
            return None;
        },
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("cvsdk started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("cvsdk").join("cvsdk.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".cvsdk").join("cvsdk.log");
    }
    PathBuf::from("cvsdk.log")
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    if let Err(err) = run(args).await {
        eprintln!("Error: {}", describe_error(&err));
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = Config::load();
    if args.base_url.is_some() {
        config.base_url = args.base_url.clone();
    }

    match args.command {
        Command::Collections => {
            for key in get_all_collection_keys() {
                if let Some(def) = get_collection(key) {
                    println!("{:<20} {}", key, def.display_name);
                }
            }
        },
        Command::Services => {
            let context = Context::from_config(&config)?;
            for key in context.services().keys() {
                println!("{:<28} {}", key, context.resolve(key)?);
            }
        },
        Command::List { collection, field } => {
            let collection_obj = open_collection(&config, &collection).await?;
            if field.is_empty() {
                println!("{}", collection_obj);
            } else {
                print_columns(&collection_obj, &field);
            }
            if collection_obj.skipped() > 0 {
                eprintln!("({} malformed item(s) skipped)", collection_obj.skipped());
            }
            if let Err(e) = config.set_last_collection(&collection) {
                tracing::warn!("Failed to save config: {}", e);
            }
        },
        Command::Show { collection, name } => {
            let collection_obj = open_collection(&config, &collection).await?;
            let descriptor = collection_obj.get(&name)?;
            println!("{}", serde_json::to_string_pretty(descriptor)?);
        },
        Command::Add {
            collection,
            name,
            params,
        } => {
            ensure_writable(args.readonly)?;
            let parameters = parse_json(params.as_deref())?;
            let mut collection_obj = open_collection(&config, &collection).await?;
            let created = collection_obj.add(&name, parameters).await?;
            println!("{}", serde_json::to_string_pretty(&created)?);
        },
        Command::Delete { collection, name } => {
            ensure_writable(args.readonly)?;
            let mut collection_obj = open_collection(&config, &collection).await?;
            collection_obj.delete(&name).await?;
            println!("Deleted {} '{}'", collection_obj.kind(), name);
        },
        Command::Call {
            service,
            method,
            payload,
            param,
            check,
        } => {
            let method: Method = method
                .to_uppercase()
                .parse()
                .with_context(|| format!("Invalid HTTP method: {}", method))?;
            if method != Method::GET {
                ensure_writable(args.readonly)?;
            }

            let payload = match payload.as_deref() {
                Some(raw) => Some(parse_json(Some(raw))?),
                None => None,
            };
            let context = Arc::new(Context::from_config(&config)?);
            let params: Vec<&str> = param.iter().map(|s| s.as_str()).collect();
            let gateway = Gateway::with_params(context, &service, &params)?;

            let body = if check {
                gateway
                    .perform_checked(method.clone(), payload.as_ref(), RequestChecks::for_method(&method))
                    .await?
            } else {
                gateway.perform(method, payload.as_ref()).await?
            };
            println!("{}", serde_json::to_string_pretty(&body)?);
        },
    }

    Ok(())
}

async fn open_collection(config: &Config, key: &str) -> Result<ResourceCollection> {
    let def = get_collection(key).cloned().with_context(|| {
        format!(
            "Unknown collection '{}'. Known: {}",
            key,
            get_all_collection_keys().join(", ")
        )
    })?;
    let context = Arc::new(Context::from_config(config)?);
    Ok(ResourceCollection::open(context, def, ServiceFetcher).await?)
}

fn print_columns(collection: &ResourceCollection, fields: &[String]) {
    let mut header = format!("{:<30}", "NAME");
    for field in fields {
        header.push_str(&format!(" {:<20}", field.to_uppercase()));
    }
    println!("{}", header.trim_end());

    let mut rows: Vec<_> = collection.iter().collect();
    rows.sort_by_key(|d| d.name().to_lowercase());
    for descriptor in rows {
        let record = Value::Object(descriptor.properties().clone());
        let mut line = format!("{:<30}", descriptor.name());
        for field in fields {
            line.push_str(&format!(" {:<20}", extract_json_value(&record, field)));
        }
        println!("{}", line.trim_end());
    }
}

fn parse_json(raw: Option<&str>) -> Result<Value> {
    match raw {
        Some(raw) => serde_json::from_str(raw).context("Invalid JSON argument"),
        None => Ok(Value::Null),
    }
}

fn ensure_writable(readonly: bool) -> Result<()> {
    if readonly {
        anyhow::bail!("Write operations are blocked in read-only mode");
    }
    Ok(())
}

/// Format an error for display, with a hint for common HTTP statuses
fn describe_error(error: &anyhow::Error) -> String {
    let Some(sdk_error) = error.downcast_ref::<SdkError>() else {
        return format!("{:#}", error);
    };

    let hint = match sdk_error.status() {
        Some(401) => Some("Authentication failed. Check auth_token in the config file."),
        Some(403) => Some("Permission denied for the logged-in user."),
        Some(404) => Some("Endpoint not found. Check base_url and service overrides."),
        Some(429) => Some("Rate limit exceeded. Please try again later."),
        Some(500..=599) => Some("Server error. Please try again."),
        _ if sdk_error.is_transient() => Some("Check your network connection and try again."),
        _ => None,
    };

    match hint {
        Some(hint) => format!("{}\n{}", sdk_error, hint),
        None => sdk_error.to_string(),
    }
}
