//! Export Salesforce records as JSON lines through a Bulk API 2.0 query.
//!
//! ```sh
//! export SF_INSTANCE_URL='https://myorg.my.salesforce.com'
//! export SF_ACCESS_TOKEN='00D...'
//! # or log in with the password grant instead (also --username / --password):
//! # export SF_CLIENT_ID=... SF_CLIENT_SECRET=... SF_USERNAME=... SF_PASSWORD=...
//! cargo run --bin bulk-export -- Account --columns Id,Name,Industry --where "Industry != null" --limit 500
//! ```
//!
//! Logging is controlled with `RUST_LOG` (e.g. `RUST_LOG=quarry_sf_bulk=debug`).

use anyhow::Context;
use clap::Parser;
use std::io::{BufWriter, Write};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use quarry_sf_auth::{OAuthClient, OAuthConfig, SalesforceCredentials};
use quarry_sf_bulk::{BulkApiClient, QueryOperation, QuerySpec};
use quarry_sf_rest::SalesforceRestClient;

/// Export the records of one Salesforce object as JSON lines.
#[derive(Parser, Debug)]
#[command(name = "bulk-export", version)]
struct Args {
    /// Object to export, e.g. `Account`.
    sobject: String,

    /// Fields to select (default: every scalar field).
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,

    /// SOQL WHERE clause.
    #[arg(long = "where", value_name = "PREDICATE")]
    filter: Option<String>,

    /// SOQL ORDER BY clause.
    #[arg(long, value_name = "CLAUSE")]
    order_by: Option<String>,

    /// Maximum number of rows.
    #[arg(long)]
    limit: Option<u64>,

    /// Include deleted and archived rows (queryAll).
    #[arg(long)]
    all: bool,

    /// Job status poll interval in seconds.
    #[arg(long, value_name = "SECONDS", default_value_t = 1)]
    poll: u64,

    /// Log in with the OAuth password grant instead of `SF_ACCESS_TOKEN`.
    #[arg(long, env = "SF_USERNAME", requires = "password")]
    username: Option<String>,

    #[arg(long, env = "SF_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

impl Args {
    /// Requested columns with blanks dropped.
    fn columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let creds = credentials(&args).await?;

    let rest = SalesforceRestClient::from_credentials(&creds)?;
    let bulk = BulkApiClient::from_credentials(&creds)?
        .with_poll_interval(Duration::from_secs(args.poll));

    let describe = rest
        .describe_sobject(&args.sobject)
        .await
        .with_context(|| format!("describing {}", args.sobject))?;

    let mut builder = QuerySpec::builder(&describe);
    let columns = args.columns();
    if !columns.is_empty() {
        builder = builder.columns(columns);
    }
    if let Some(ref filter) = args.filter {
        builder = builder.filter(filter.as_str());
    }
    if let Some(ref order_by) = args.order_by {
        builder = builder.order_by(order_by.as_str());
    }
    if let Some(limit) = args.limit {
        builder = builder.limit(limit);
    }
    if args.all {
        builder = builder.operation(QueryOperation::QueryAll);
    }
    let spec = builder.build()?;
    info!(statement = %spec.statement(), "starting bulk export");

    let mut session = bulk.query(spec);
    let exported = export(&mut session).await;
    let closed = session.close().await;

    let count = exported?;
    closed?;
    info!(count, "export complete");
    Ok(())
}

async fn credentials(args: &Args) -> anyhow::Result<SalesforceCredentials> {
    if let (Some(username), Some(password)) = (&args.username, &args.password) {
        let oauth = OAuthClient::new(OAuthConfig::from_env()?);
        let token = oauth
            .password(username, password)
            .await
            .context("password login failed")?;
        let api_version = std::env::var("SF_API_VERSION")
            .unwrap_or_else(|_| quarry_sf_client::DEFAULT_API_VERSION.to_string());
        return Ok(token.to_credentials(&api_version));
    }
    SalesforceCredentials::from_env().context("set SF_INSTANCE_URL and SF_ACCESS_TOKEN")
}

async fn export(session: &mut quarry_sf_bulk::QuerySession) -> anyhow::Result<u64> {
    session.enter().await?;

    let mut out = BufWriter::new(std::io::stdout().lock());
    let mut count = 0u64;
    while let Some(record) = session.next_record().await? {
        serde_json::to_writer(&mut out, &record)?;
        out.write_all(b"\n")?;
        count += 1;
    }
    out.flush()?;
    Ok(count)
}
