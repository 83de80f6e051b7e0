//! Server-Sent-Events relay for live price ticks.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use super::AppState;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Stream ticks from the feed's broadcast channel as SSE `tick` events.
///
/// Clients that fall behind the channel capacity miss ticks rather than
/// stalling the feed; a heartbeat comment keeps idle connections open
/// through proxies. Left unauthenticated so browser EventSource clients can
/// connect directly.
pub async fn ticks(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.feed.subscribe();

    let stream = futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(tick) => match Event::default().event("tick").json_data(&tick) {
                    Ok(event) => return Some((Ok::<_, Infallible>(event), rx)),
                    Err(e) => {
                        debug!(error = %e, "failed to encode tick event");
                        continue;
                    }
                },
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "sse client lagged behind tick stream");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(HEARTBEAT_INTERVAL)
            .text("heartbeat"),
    )
}
