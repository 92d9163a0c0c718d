use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = apiprobe::cli::Cli::parse();
    let app = match apiprobe::app::App::initialize() {
        Ok(app) => app,
        Err(err) => {
            eprintln!("apiprobe: {}", err);
            std::process::exit(1);
        }
    };
    if let Err(err) = app.run(cli).await {
        eprintln!("apiprobe: {}", err);
        std::process::exit(1);
    }
}
