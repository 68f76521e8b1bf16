//! Seed script for launchpad.
//!
//! Populates local state with a demo account and one published project so the
//! serving routes have something to show immediately.
//! Run: cargo run --bin seed_demo
//! Honors the same LAUNCHPAD_* environment as the server.

use launchpad::config::AppConfig;
use launchpad::publish::Publisher;
use launchpad::storage::Storage;

const DEMO_HTML: &str =
    "<h1>Hello from launchpad</h1>\n<p>This site was deployed by seed_demo.</p>";
const DEMO_CSS: &str =
    "body { font-family: sans-serif; background: #f0f0f0; padding: 20px; }\nh1 { color: #333; }";
const DEMO_JS: &str = "console.log('Hello launchpad');";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    std::fs::create_dir_all(&config.projects_root)?;
    let storage = Storage::open(&config.data_dir)?;
    let publisher = Publisher::new(config.projects_root.clone());

    // Ignore if the account already exists; the original credential wins.
    let demo = match storage.create_user("demo", "demo") {
        Ok(user) => user,
        Err(_) => storage
            .find_user_by_username("demo")?
            .ok_or("demo user missing after create")?,
    };
    println!("✅ Demo account ready (demo / demo)");

    let result = publisher
        .publish(&storage, &demo, "hello", DEMO_HTML, DEMO_CSS, DEMO_JS)
        .await?;
    storage.flush()?;
    println!("✅ Published demo project at {}", result.url);
    println!(
        "   Start the server and open http://localhost:8080{}",
        result.url
    );

    Ok(())
}
