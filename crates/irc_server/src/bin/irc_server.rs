use clap::Parser;
use flexi_logger::{Duplicate, Logger};
use irc_server::config::Cli;
use irc_server::listener::handle_connection;
use irc_server::server::ServerState;
use log::info;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    Logger::try_with_str("info")
        .and_then(|op| {
            op.log_to_stderr()
                .duplicate_to_stderr(Duplicate::All)
                .start()
        })
        .ok();

    let cli = Cli::parse();
    let config = cli.load_config()?;
    let bind_addr = format!("0.0.0.0:{}", config.port);

    let listener = TcpListener::bind(&bind_addr).await?;
    info!("listening on {bind_addr}");
    let server = ServerState::new(config);

    loop {
        let (socket, addr) = listener.accept().await?;
        info!("client connected: {addr:?}");
        let server = server.clone();
        tokio::spawn(async move {
            handle_connection(socket, addr, server).await;
        });
    }
}
