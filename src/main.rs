use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::info;
use tokio::net::TcpListener;

use docshelf::handlers::build_router;
use docshelf::logger::Logger;
use docshelf::{AppState, Config, DocError, FileService, MarkdownConverter, SearchService, ToolServer};

#[derive(Parser)]
#[command(name = "docshelf", version, about = "Upload, convert and search documents")]
struct Cli {
    /// Shared directory holding uploads (overrides SHARED_UPLOADS_DIR)
    #[arg(long, global = true)]
    shared_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the upload and listing HTTP service
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Serve the search tools as JSON-RPC over stdin/stdout
    Tools,
}

#[tokio::main]
async fn main() -> Result<(), DocError> {
    let cli = Cli::parse();
    if let Err(e) = Logger::init() {
        eprintln!("Failed to initialize logger: {e}");
    }

    let mut config = Config::from_env();
    if let Some(dir) = cli.shared_dir {
        config.shared_dir = Arc::new(dir);
    }

    match cli.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            serve_http(config).await
        }
        Command::Tools => {
            let search = SearchService::new(FileService::new(config.shared_dir.as_ref().clone()));
            info!("Serving tools over stdio for {:?}", config.shared_dir);
            ToolServer::new(search)
                .serve_stdio()
                .await
                .map_err(|e| DocError::server("stdio", e))
        }
    }
}

async fn serve_http(config: Config) -> Result<(), DocError> {
    let state = AppState::new(&config, Arc::new(MarkdownConverter::new()));
    let app = build_router(state, config.max_upload_bytes);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| DocError::server(addr.clone(), e))?;
    info!("Upload service listening on http://{} (shared directory {:?})", addr, config.shared_dir);
    axum::serve(listener, app)
        .await
        .map_err(|e| DocError::server(addr, e))
}
