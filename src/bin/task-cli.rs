use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "task-cli")]
#[command(about = "Command-line client for the task API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:3333")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tasks, optionally filtered by a search term
    List {
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Create a task
    Add { title: String, description: String },
    /// Replace a task's title and description
    Update {
        id: String,
        title: String,
        description: String,
    },
    /// Delete a task
    Delete { id: String },
    /// Mark a task completed
    Complete { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let tasks_url = format!("{}/tasks", cli.url.trim_end_matches('/'));

    let res = match cli.command {
        Commands::List { search } => {
            let mut req = client.get(&tasks_url);
            if let Some(search) = search {
                req = req.query(&[("search", search)]);
            }
            req.send().await?
        }
        Commands::Add { title, description } => {
            client
                .post(&tasks_url)
                .json(&json!({ "title": title, "description": description }))
                .send()
                .await?
        }
        Commands::Update {
            id,
            title,
            description,
        } => {
            client
                .put(format!("{}/{}", tasks_url, id))
                .json(&json!({ "title": title, "description": description }))
                .send()
                .await?
        }
        Commands::Delete { id } => client.delete(format!("{}/{}", tasks_url, id)).send().await?,
        Commands::Complete { id } => {
            client
                .patch(format!("{}/{}/complete", tasks_url, id))
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: task API returned status {}", status);
        if let Ok(json) = serde_json::from_str::<Value>(&text) {
            if let Some(message) = json.get("message").and_then(Value::as_str) {
                eprintln!("Message: {}", message);
            }
        }
        std::process::exit(1);
    }

    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }

    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
