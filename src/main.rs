use repomigrator::presentation::cli::CliApp;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let app = CliApp::new();
    app.init_logging();
    app.run().await
}
