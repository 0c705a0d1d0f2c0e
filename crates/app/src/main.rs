//! Conduit - Command line entry point
//!
//! Runs one endpoint call through a datasource and prints every state it
//! publishes as JSON, one per line.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use conduit_application::{
    CancelOptions, Datasource, EndpointExecutor, LoadOptions, StaticHeaders,
};
use conduit_domain::request::HttpMethod;
use conduit_domain::{CallArguments, DatasourceState, EndpointDescriptor};
use conduit_infrastructure::{ReqwestTransport, TransportSettings};
use serde_json::{Map, Value};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(version, about = "Run one endpoint call and print each published state")]
struct Cli {
    /// HTTP method (GET, POST, PUT, DELETE)
    method: HttpMethod,

    /// URL template, relative to CONDUIT_BASE_URL or absolute, e.g. /users/:id
    url: String,

    /// Parameters as key=value; values are parsed as JSON when possible
    #[arg(value_parser = parse_param)]
    params: Vec<(String, Value)>,

    /// JSON request body
    #[arg(short, long, value_parser = parse_json)]
    data: Option<Value>,

    /// Bearer token sent as the Authorization header
    #[arg(long, env = "CONDUIT_BEARER_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Require authorization for this endpoint
    #[arg(long)]
    secure: bool,

    /// Never send these parameters in the query string
    #[arg(long = "inline", value_name = "NAME")]
    inline_params: Vec<String>,
}

fn parse_param(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {raw}"))?;
    if key.is_empty() {
        return Err(format!("empty parameter name in {raw}"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn parse_json(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid JSON body: {e}"))
}

impl Cli {
    fn endpoint(&self) -> EndpointDescriptor<Value, Value, Value> {
        let mut endpoint = EndpointDescriptor::new(self.method, self.url.as_str());
        if self.secure {
            endpoint = endpoint.secure();
        }
        self.inline_params
            .iter()
            .fold(endpoint, |endpoint, name| endpoint.inline_param(name.as_str()))
    }

    fn arguments(&self) -> CallArguments<Value, Value> {
        let params: Map<String, Value> = self.params.iter().cloned().collect();
        CallArguments {
            params: (!params.is_empty()).then_some(Value::Object(params)),
            data: self.data.clone(),
        }
    }
}

fn print_state(state: &DatasourceState<Value>) {
    match serde_json::to_string(state) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::warn!(error = %e, "state not printable"),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = TransportSettings::from_env()?;
    tracing::debug!(?settings, "transport settings");

    let mut executor = EndpointExecutor::new(Arc::new(ReqwestTransport::new(&settings)?));
    if let Some(token) = &cli.token {
        executor = executor.with_authorization(Arc::new(StaticHeaders::bearer(token)));
    }

    let source = Datasource::new(cli.endpoint(), executor);
    let mut states = source.subscribe();
    let printer = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            print_state(&states.borrow_and_update());
        }
    });

    tokio::select! {
        () = source.load_with(cli.arguments(), LoadOptions::default()) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, cancelling call");
            source.cancel(Some(CancelOptions {
                update_state: true,
                keep_response: false,
            }));
        }
    }

    let failed = source.state().is_error();
    drop(source);
    printer.await?;

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
