use anyhow::Context;
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tokio_tungstenite::{connect_async, tungstenite::Message};

pub const BINANCE_STREAM_BASE: &str = "wss://stream.binance.com:9443";
pub const BINANCE_TESTNET_STREAM_BASE: &str = "wss://testnet.binance.vision";

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Live trade stream for one symbol
///
/// The socket is read on its own task and every text frame is pushed,
/// unparsed, into a bounded channel. Nothing is buffered beyond the
/// channel, so a slow consumer slows the reader down.
pub struct BinanceTradeFeed {
    url: String,
}

impl BinanceTradeFeed {
    pub fn new(stream_base: &str, symbol: &str) -> Self {
        Self {
            url: format!(
                "{}/ws/{}@trade",
                stream_base.trim_end_matches('/'),
                symbol.to_lowercase()
            ),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Connect and start forwarding messages
    ///
    /// The receiver yields `None` once the socket closes or errors.
    pub async fn connect(
        &self,
        buffer: usize,
    ) -> anyhow::Result<(mpsc::Receiver<String>, JoinHandle<()>)> {
        let (ws_stream, _) = timeout(
            Duration::from_secs(CONNECT_TIMEOUT_SECS),
            connect_async(self.url.as_str()),
        )
        .await
        .with_context(|| format!("Timed out connecting to {}", self.url))?
        .with_context(|| format!("Failed to connect to {}", self.url))?;

        tracing::info!("✅ Connected to trade stream {}", self.url);

        let (tx, rx) = mpsc::channel(buffer);
        let handle = tokio::spawn(forward_messages(ws_stream, tx));

        Ok((rx, handle))
    }
}

/// Pump text frames from the socket into the channel until either side goes away
async fn forward_messages<S, E>(mut stream: S, tx: mpsc::Sender<String>)
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: std::fmt::Display,
{
    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if tx.send(text).await.is_err() {
                    tracing::debug!("Feed consumer dropped, stopping reader");
                    break;
                }
            }
            Ok(Message::Close(frame)) => {
                tracing::warn!("Trade stream closed by server: {:?}", frame);
                break;
            }
            Ok(_) => {} // Ping/pong/binary frames carry no trades
            Err(e) => {
                tracing::error!("Trade stream error: {}", e);
                break;
            }
        }
    }
}
