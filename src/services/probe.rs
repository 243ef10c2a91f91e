use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

/// Checks that a game server accepts TCP connections from the outside.
///
/// Connecting is the whole test; a first byte sent by the server within
/// `read_window` is logged and otherwise ignored.
pub async fn probe_endpoint(address: SocketAddr, timeout: Duration, read_window: Duration) -> Result<(), String> {
    let mut stream = tokio::time::timeout(timeout, TcpStream::connect(address))
        .await
        .map_err(|_| format!("Connection timed out after {}s", timeout.as_secs()))?
        .map_err(|e| format!("Failed to connect: {}", e))?;

    if !read_window.is_zero() {
        let mut first = [0u8; 1];
        match tokio::time::timeout(read_window, stream.read(&mut first)).await {
            Ok(Ok(n)) if n > 0 => tracing::debug!("{} greeted probe with byte {:#04x}", address, first[0]),
            Ok(Ok(_)) => tracing::debug!("{} closed the probe connection", address),
            Ok(Err(e)) => tracing::debug!("{} probe read failed: {}", address, e),
            Err(_) => tracing::debug!("{} sent nothing to the probe", address),
        }
    }

    Ok(())
}
