use clap::Parser;
use xiangqi_server::{Config, XiangqiServer};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::parse();

    println!("Starting Chinese Chess Server on {}...", config.bind_addr);
    println!("Server will be available at ws://{}", config.bind_addr);
    println!("Press Ctrl+C to stop the server");

    let server = match XiangqiServer::builder().bind(&config.bind_addr).build().await {
        Ok(server) => server,
        Err(e) => {
            eprintln!("Server error: {e}");
            std::process::exit(1);
        }
    };

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nServer stopped by user");
        }
    }
}
