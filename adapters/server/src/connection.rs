//! Per-client request loop and the TCP accept loop feeding it.

use std::future::Future;

use roomba_core::Command;
use roomba_session::Store;
use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    net::TcpListener,
    task,
};
use tracing::{debug, info, warn};

use crate::protocol::{self, Frame, ProtocolError, Request, Response};

/// Serves one client until it sends `EXIT`, disconnects or fails.
///
/// Lines that do not decode into a [`Request`], including oversized ones, are
/// skipped without a reply. Primality checks run on the blocking pool.
pub async fn handle_connection<S>(stream: S, store: Store) -> Result<(), ProtocolError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    while let Some(frame) = protocol::read_frame(&mut reader, &mut line).await? {
        if frame == Frame::Oversized {
            debug!(limit = protocol::MAX_FRAME_LEN, "ignoring oversized request");
            continue;
        }

        let request = match protocol::decode(&line) {
            Ok(request) => request,
            Err(error) => {
                debug!(%error, "ignoring request");
                continue;
            }
        };

        let response = match request {
            Request::GetState => Response::State(store.snapshot()),
            Request::Move { direction } => {
                let _ = store.manual_step(direction);
                Response::State(store.snapshot())
            }
            Request::SetMode { mode } => {
                let _ = store.apply(Command::SetControlMode { mode });
                Response::State(store.snapshot())
            }
            Request::CheckPrime { number } => {
                match task::spawn_blocking(move || protocol::prime_verdict(number.as_ref())).await
                {
                    Ok(verdict) => Response::Verdict(verdict),
                    Err(error) => {
                        warn!(%error, "primality check failed");
                        continue;
                    }
                }
            }
            Request::Exit => break,
        };

        writer
            .write_all(protocol::encode(&response)?.as_bytes())
            .await?;
    }

    // the peer may already be gone
    let _ = writer.shutdown().await;
    Ok(())
}

/// Accepts clients until `shutdown` resolves, serving each on its own task.
pub async fn serve<F>(listener: TcpListener, store: Store, shutdown: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        let accepted = tokio::select! {
            () = &mut shutdown => break,
            accepted = listener.accept() => accepted,
        };

        let (stream, peer) = match accepted {
            Ok(connection) => connection,
            Err(error) => {
                warn!(%error, "failed to accept client");
                continue;
            }
        };

        info!(%peer, "client connected");
        let store = store.clone();
        let _ = tokio::spawn(async move {
            match handle_connection(stream, store).await {
                Ok(()) => info!(%peer, "client disconnected"),
                Err(error) => warn!(%peer, %error, "client connection failed"),
            }
        });
    }

    info!("listener closed");
}
