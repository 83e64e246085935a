//! Fixture server for exercising `rest-core` by hand. Binds `127.0.0.1:$PORT`
//! (default 3000).

use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    println!("mock server listening on http://{addr}");
    mock_server::run(listener).await
}
