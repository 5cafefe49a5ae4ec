//! Test client for line-oriented protocol testing.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// A raw protocol client.
pub struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    pub async fn connect(addr: SocketAddr) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer,
        })
    }

    /// Send one line; the terminator is added here.
    pub async fn send(&mut self, line: &str) -> anyhow::Result<()> {
        self.send_raw(format!("{}\n", line).as_bytes()).await
    }

    /// Write bytes exactly as given.
    pub async fn send_raw(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
        self.writer.write_all(bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Receive the next line without its terminator.
    pub async fn recv(&mut self) -> anyhow::Result<String> {
        self.recv_within(RECV_TIMEOUT).await
    }

    async fn recv_within(&mut self, wait: Duration) -> anyhow::Result<String> {
        let mut line = String::new();
        let n = timeout(wait, self.reader.read_line(&mut line)).await??;
        if n == 0 {
            anyhow::bail!("connection closed");
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Receive the next line and require it to equal `expected`.
    pub async fn expect(&mut self, expected: &str) -> anyhow::Result<()> {
        let line = self.recv().await?;
        anyhow::ensure!(line == expected, "expected {:?}, got {:?}", expected, line);
        Ok(())
    }

    /// Skip lines until one satisfies `pred`, returning it.
    pub async fn recv_until<F>(&mut self, pred: F) -> anyhow::Result<String>
    where
        F: Fn(&str) -> bool,
    {
        loop {
            let line = self.recv().await?;
            if pred(&line) {
                return Ok(line);
            }
        }
    }

    /// Skip lines until `expected` arrives.
    pub async fn expect_eventually(&mut self, expected: &str) -> anyhow::Result<()> {
        self.recv_until(|line| line == expected).await.map(|_| ())
    }

    /// Require that nothing arrives for `wait`.
    pub async fn expect_silence(&mut self, wait: Duration) -> anyhow::Result<()> {
        match self.recv_within(wait).await {
            Ok(line) => anyhow::bail!("expected silence, got {:?}", line),
            Err(e) if e.is::<tokio::time::error::Elapsed>() => Ok(()),
            Err(e) => Err(e),
        }
    }
}
