use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use restkit::{Client, ClientConfig, Media, Method, RestClientError, TaskQueue};

#[derive(Parser)]
#[command(name = "restkit")]
#[command(about = "Build a REST request from the command line and dispatch it")]
#[command(version)]
struct Cli {
    /// Request path, appended to the base URL; may contain {name} placeholders
    #[arg(value_name = "PATH")]
    path: String,

    /// Base URL every path is appended to
    #[arg(short, long, default_value = "http://localhost:8080/")]
    base_url: String,

    /// HTTP method to use
    #[arg(short, long, default_value = "get")]
    method: MethodArg,

    /// Request headers (format: "Name: Value")
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Query parameters, GET only (format: name=value)
    #[arg(short, long = "query")]
    queries: Vec<String>,

    /// Path parameters, GET only (format: name=value)
    #[arg(short, long = "path-param")]
    path_params: Vec<String>,

    /// URL-encoded form fields (format: name=value)
    #[arg(short, long = "field")]
    fields: Vec<String>,

    /// JSON request body
    #[arg(short, long, conflicts_with = "fields")]
    json: Option<String>,

    /// Multipart text parameters (format: name=value)
    #[arg(long = "param")]
    params: Vec<String>,

    /// Multipart files (format: key=path or key=path:mime/type)
    #[arg(long = "file")]
    files: Vec<String>,

    /// Bearer token sent as the Authorization header
    #[arg(long)]
    token: Option<String>,

    /// Timeout in seconds
    #[arg(short, long, default_value = "30")]
    timeout: u64,

    /// Print the body exactly as received instead of unquoting it
    #[arg(long)]
    raw: bool,

    /// Log the request and response
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone)]
enum MethodArg {
    GET,
    POST,
    PUT,
}

impl From<MethodArg> for Method {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::GET => Method::GET,
            MethodArg::POST => Method::POST,
            MethodArg::PUT => Method::PUT,
        }
    }
}

fn split_pair<'a>(raw: &'a str, separator: char, what: &str) -> anyhow::Result<(&'a str, &'a str)> {
    raw.split_once(separator)
        .map(|(name, value)| (name.trim(), value.trim()))
        .ok_or_else(|| anyhow!("invalid {what} {raw:?}"))
}

fn load_media(raw: &str) -> anyhow::Result<Media> {
    let (key, spec) = split_pair(raw, '=', "file")?;
    let (path, mime) = match spec.rsplit_once(':') {
        Some((path, mime)) if mime.contains('/') => (path, Some(mime)),
        _ => (spec, None),
    };
    Media::from_path(key, path, mime).with_context(|| format!("failed to read {path}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    }

    let mut config = ClientConfig::builder()
        .base_url(&cli.base_url)
        .timeout(Duration::from_secs(cli.timeout))
        .unquote_text_responses(!cli.raw);
    if let Some(token) = cli.token.clone() {
        config = config.auth_token_provider(move || format!("Bearer {token}"));
    }
    let config = config.build()?;

    let mut queue = TaskQueue::new();
    let client = Client::builder(config).calling_context(queue.executor()).build();

    let mut builder = client.request(cli.method.clone().into(), &cli.path);
    if let Some(token) = client.config().authorization() {
        builder = builder.add_header("Authorization", token);
    }
    for header in &cli.headers {
        let (name, value) = split_pair(header, ':', "header")?;
        builder = builder.add_header(name, value);
    }
    for query in &cli.queries {
        let (name, value) = split_pair(query, '=', "query parameter")?;
        builder = builder.add_query(name, value);
    }
    for param in &cli.path_params {
        let (name, value) = split_pair(param, '=', "path parameter")?;
        builder = builder.add_path(name, value);
    }
    for field in &cli.fields {
        let (name, value) = split_pair(field, '=', "field")?;
        builder = builder.add_field(name, value);
    }
    if let Some(json) = &cli.json {
        let body: serde_json::Value = serde_json::from_str(json).context("--json is not valid JSON")?;
        builder = builder
            .add_header("Content-Type", "application/json")
            .set_body(&body);
    }
    if !cli.params.is_empty() || !cli.files.is_empty() {
        let mut params = BTreeMap::new();
        for param in &cli.params {
            let (name, value) = split_pair(param, '=', "multipart parameter")?;
            params.insert(name.to_string(), value.to_string());
        }
        let media = cli.files.iter().map(|raw| load_media(raw)).collect::<anyhow::Result<Vec<_>>>()?;
        builder = builder.set_multipart_data(Some(params), Some(media));
    }

    let request = builder.build()?;
    println!("{} {}", request.method().to_string().bold(), request.url());

    client.execute_decoded::<String, _, _>(
        request,
        |body| println!("{}\n{}", "200 OK".green(), body),
        |err: RestClientError| {
            eprintln!("{} {}", format!("{:?}", err.kind()).red().bold(), err.status());
            if !err.message().is_empty() {
                eprintln!("{}", err.message());
            }
        },
    );

    if !queue.run_next().await {
        return Err(anyhow!("dispatcher finished without reporting an outcome"));
    }

    Ok(())
}
