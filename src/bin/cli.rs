use clap::{Parser, Subcommand};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::fs;
use std::path::PathBuf;

const TOKEN_FILE: &str = ".launchpad_token";

#[derive(Parser)]
#[command(name = "launchpad-cli")]
#[command(about = "CLI for launchpad", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Signup {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    /// Log in and save a session token next to the current directory
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    /// Deploy local files as a project
    Deploy {
        /// Project name (spaces become hyphens server-side)
        #[arg(short, long)]
        name: String,
        /// Markup fragment for the page body
        #[arg(long)]
        html: PathBuf,
        #[arg(long)]
        css: Option<PathBuf>,
        #[arg(long)]
        js: Option<PathBuf>,
    },
    /// List your deployed projects
    Projects,
    Logout,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Deserialize)]
struct DeployResponse {
    success: bool,
    url: Option<String>,
    error: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = Client::new();

    match cli.command {
        Commands::Signup { username, password } => {
            let res = client
                .post(format!("{}/signup", cli.url))
                .json(&json!({ "username": username, "password": password }))
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::Login { username, password } => {
            let res = client
                .post(format!("{}/login", cli.url))
                .json(&json!({ "username": username, "password": password }))
                .send()
                .await?;
            if res.status().is_success() {
                let body: LoginResponse = res.json().await?;
                fs::write(TOKEN_FILE, body.token)?;
                println!("Logged in. Token saved to {TOKEN_FILE}");
            } else {
                println!("Login failed: {}", res.text().await?);
            }
        }
        Commands::Deploy { name, html, css, js } => {
            let token = fs::read_to_string(TOKEN_FILE).unwrap_or_default();
            let html_code = fs::read_to_string(&html)?;
            let css_code = match &css {
                Some(path) => fs::read_to_string(path)?,
                None => String::new(),
            };
            let js_code = match &js {
                Some(path) => fs::read_to_string(path)?,
                None => String::new(),
            };

            let res = client
                .post(format!("{}/deploy_api", cli.url))
                .header("Authorization", format!("Bearer {}", token.trim()))
                .form(&[
                    ("project_name", name.as_str()),
                    ("html_code", html_code.as_str()),
                    ("css_code", css_code.as_str()),
                    ("js_code", js_code.as_str()),
                ])
                .send()
                .await?;
            if res.status().is_success() {
                let body: DeployResponse = res.json().await?;
                if body.success {
                    println!("Deployed: {}{}", cli.url, body.url.unwrap_or_default());
                } else {
                    println!("Deploy failed: {}", body.error.unwrap_or_default());
                }
            } else {
                println!("Deploy failed: {}", res.text().await?);
            }
        }
        Commands::Projects => {
            let token = fs::read_to_string(TOKEN_FILE).unwrap_or_default();
            let res = client
                .get(format!("{}/projects", cli.url))
                .header("Authorization", format!("Bearer {}", token.trim()))
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::Logout => {
            let _ = fs::remove_file(TOKEN_FILE);
            println!("Logged out (token removed).");
        }
    }

    Ok(())
}
