//! Tracing setup: human-readable stdout plus optional line-delimited JSON shipped to Logstash.

use std::{env, io, time::Duration};

use tokio::{
    io::AsyncWriteExt,
    net::TcpStream,
    sync::mpsc::{self, Receiver, Sender},
    time::sleep,
};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer, filter::filter_fn, fmt::MakeWriter, layer::SubscriberExt,
    util::SubscriberInitExt,
};

const LOGSTASH_HOST_ENV: &str = "LOGSTASH_HOST";
const CONNECT_ATTEMPTS: u32 = 10;
const CONNECT_DELAY: Duration = Duration::from_secs(5);
/// Records buffered while the connection is down; newer records are dropped beyond this.
const BUFFERED_RECORDS: usize = 1024;

/// Install the global subscriber. Must be called from within the tokio runtime.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let logstash_host = env::var(LOGSTASH_HOST_ENV)
        .ok()
        .filter(|host| !host.trim().is_empty());

    let logstash_layer = logstash_host.as_ref().map(|_| {
        let (sender, receiver) = mpsc::channel(BUFFERED_RECORDS);
        (
            tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(ChannelWriter { sender })
                .with_filter(filter_fn(|metadata| metadata.target() != module_path!())),
            receiver,
        )
    });
    let (logstash_layer, receiver) = match logstash_layer {
        Some((layer, receiver)) => (Some(layer), Some(receiver)),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(logstash_layer)
        .init();

    match (logstash_host, receiver) {
        (Some(host), Some(receiver)) => {
            tokio::spawn(ship_records(host, receiver));
        }
        _ => info!("{LOGSTASH_HOST_ENV} not set; running without Logstash"),
    }
}

/// [`MakeWriter`] handing each formatted record to the shipping task without blocking.
#[derive(Clone)]
struct ChannelWriter {
    sender: Sender<Vec<u8>>,
}

impl io::Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // Full or closed channels drop the record.
        let _ = self.sender.try_send(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for ChannelWriter {
    type Writer = ChannelWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Forward records to Logstash, reconnecting with the same bounded budget after a write error.
///
/// Once a connection budget is exhausted the receiver is dropped and later records are discarded.
async fn ship_records(host: String, mut receiver: Receiver<Vec<u8>>) {
    let Some(mut stream) = connect(&host).await else {
        warn!(host = %host, "cannot connect to Logstash after retries; continuing without it");
        return;
    };
    info!(host = %host, "connected to Logstash");

    while let Some(record) = receiver.recv().await {
        if let Err(err) = stream.write_all(&record).await {
            warn!(host = %host, error = %err, "lost Logstash connection; reconnecting");
            match connect(&host).await {
                Some(reconnected) => stream = reconnected,
                None => {
                    warn!(host = %host, "cannot reconnect to Logstash; continuing without it");
                    return;
                }
            }
        }
    }
}

async fn connect(host: &str) -> Option<TcpStream> {
    for attempt in 1..=CONNECT_ATTEMPTS {
        match TcpStream::connect(host).await {
            Ok(stream) => return Some(stream),
            Err(err) => {
                warn!(host, attempt, error = %err, "Logstash not ready");
                if attempt < CONNECT_ATTEMPTS {
                    sleep(CONNECT_DELAY).await;
                }
            }
        }
    }
    None
}
