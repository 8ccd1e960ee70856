use clap::{Parser, Subcommand};
use reqwest::Url;
use serde_json::{Map, Value};

#[derive(Parser)]
#[command(name = "issue-cli")]
#[command(about = "Command-line client for the issue tracker API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000", env = "ISSUE_TRACKER_URL")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a project's issues
    List {
        project: String,
        /// Exact-match filter, e.g. `--filter open=true`
        #[arg(short, long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
    },
    /// Create an issue
    Create {
        project: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        text: String,
        #[arg(long)]
        created_by: String,
        #[arg(long)]
        assigned_to: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    /// Update fields of an issue
    Update {
        project: String,
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        created_by: Option<String>,
        #[arg(long)]
        assigned_to: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        open: Option<bool>,
    },
    /// Delete an issue
    Delete { project: String, id: String },
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))
}

/// `{base}/api/issues/{project}` with `project` encoded as one path segment.
fn endpoint(base_url: &str, project: &str) -> Result<Url, Box<dyn std::error::Error>> {
    let mut url = Url::parse(base_url)?;
    url.path_segments_mut()
        .map_err(|_| format!("base URL cannot carry a path: {base_url}"))?
        .pop_if_empty()
        .extend(["api", "issues", project]);
    Ok(url)
}

/// Insert only the fields that were given on the command line.
fn insert_some(body: &mut Map<String, Value>, key: &str, value: Option<String>) {
    if let Some(value) = value {
        body.insert(key.to_string(), Value::String(value));
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base_url = cli.url.as_str();

    let res = match cli.command {
        Commands::List { project, filters } => {
            client.get(endpoint(base_url, &project)?).query(&filters).send().await?
        }
        Commands::Create {
            project,
            title,
            text,
            created_by,
            assigned_to,
            status,
        } => {
            let mut body = Map::new();
            insert_some(&mut body, "issue_title", Some(title));
            insert_some(&mut body, "issue_text", Some(text));
            insert_some(&mut body, "created_by", Some(created_by));
            insert_some(&mut body, "assigned_to", assigned_to);
            insert_some(&mut body, "status_text", status);
            client.post(endpoint(base_url, &project)?).json(&body).send().await?
        }
        Commands::Update {
            project,
            id,
            title,
            text,
            created_by,
            assigned_to,
            status,
            open,
        } => {
            let mut body = Map::new();
            insert_some(&mut body, "_id", Some(id));
            insert_some(&mut body, "issue_title", title);
            insert_some(&mut body, "issue_text", text);
            insert_some(&mut body, "created_by", created_by);
            insert_some(&mut body, "assigned_to", assigned_to);
            insert_some(&mut body, "status_text", status);
            if let Some(open) = open {
                body.insert("open".to_string(), Value::Bool(open));
            }
            client.put(endpoint(base_url, &project)?).json(&body).send().await?
        }
        Commands::Delete { project, id } => {
            client
                .delete(endpoint(base_url, &project)?)
                .json(&serde_json::json!({ "_id": id }))
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: issue tracker returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    if let Some(error) = json.get("error").and_then(Value::as_str) {
        eprintln!("Error: {}", error);
    }
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
