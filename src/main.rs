use clap::Parser;
use std::path::Path;
use std::sync::Arc;

mod cli;
mod config;
mod content;
mod handler;
mod http;
mod logger;
mod routing;
mod server;
mod template;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::Cli::parse();
    let cfg = config::Config::load_from(&args.config)?;

    // Build the Tokio runtime, sizing the thread pool from workers config
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(&args, cfg))
}

async fn async_main(args: &cli::Cli, cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    logger::init(&cfg)?;

    let content_root = content::ContentRoot::open(Path::new(&cfg.content.root))?;
    let templates =
        template::TemplateSet::load(cfg.content.template_dir.as_deref().map(Path::new))?;

    // --addr asks the OS for a free port instead of the configured one
    let mut addr = cfg.get_socket_addr()?;
    if args.addr {
        addr.set_port(0);
    }

    let listener = server::create_reusable_listener(addr)?;
    let local_addr = listener.local_addr()?;

    if args.addr {
        tokio::fs::write(&cfg.content.port_file, local_addr.port().to_string()).await?;
        logger::log_port_file_written(local_addr.port(), &cfg.content.port_file);
    }

    logger::log_server_start(&local_addr, content_root.base(), &cfg);

    let state = Arc::new(config::AppState::new(cfg, content_root, templates));
    server::start_server_loop(listener, state).await
}
