//! Manual smoke client: a handful of connections exercising register,
//! join, chat, and part against a locally running server.

use std::error::Error;
use tokio::io::{self, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{self, Duration};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    time::sleep(Duration::from_millis(500)).await;
    let server_addr = "127.0.0.1:6667";
    let num_clients = 5;

    println!("connecting {num_clients} clients to {server_addr}...");

    let mut handles = Vec::new();
    for i in 0..num_clients {
        handles.push(tokio::spawn(async move {
            if let Err(e) = run_client(i, server_addr).await {
                eprintln!("client {i} error: {e}");
            }
        }));
        time::sleep(Duration::from_millis(50)).await;
    }

    for handle in handles {
        let _ = handle.await;
    }
    Ok(())
}

async fn run_client(id: usize, addr: &str) -> io::Result<()> {
    let mut stream = TcpStream::connect(addr).await?;
    let nick = format!("smoke{id}");

    let login = format!("NICK {nick}\r\nUSER {nick} 0 * :Smoke Tester\r\n");
    stream.write_all(login.as_bytes()).await?;
    stream.write_all(b"JOIN #smoke\r\n").await?;
    stream
        .write_all(format!("PRIVMSG #smoke :hello from {nick}\r\n").as_bytes())
        .await?;
    stream.write_all(b"PART #smoke :done\r\n").await?;
    stream.write_all(b"QUIT :bye\r\n").await?;
    Ok(())
}
