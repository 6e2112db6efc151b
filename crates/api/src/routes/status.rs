//! The status stream relay.
//!
//! A long-lived SSE response: one `gallery` snapshot event, then one
//! `status` event per live progress update for the caller's subscriber
//! identity, then a `redirect` event once a terminal update arrives.
//! The subscription is torn down on every exit path — terminal event,
//! client disconnect, or channel close — because dropping the stream
//! drops the subscription.

use std::convert::Infallible;

use axum::extract::State;
use axum::http::header::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream};

use huebox_core::progress::ProgressUpdate;
use huebox_events::Subscription;
use huebox_pipeline::topic_for;

use crate::gallery;
use crate::identity::{new_identity, subscriber_id};
use crate::state::AppState;

/// Relay phases, in emission order.
enum Relay {
    Snapshot { snapshot: String, subscription: Subscription },
    Live { subscription: Subscription },
    Redirect { target: String },
    Done,
}

/// GET /status_updates
pub async fn status_updates(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let identity = subscriber_id(&headers).unwrap_or_else(new_identity);
    let subscription = state.jobs.channel.subscribe(&topic_for(&identity)).await;
    let snapshot = gallery::render(&state.config.data_dir).await;

    Sse::new(relay_stream(snapshot, subscription)).keep_alive(KeepAlive::default())
}

/// Build the relay's event stream: snapshot, live updates, redirect.
fn relay_stream(
    snapshot: String,
    subscription: Subscription,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(
        Relay::Snapshot { snapshot, subscription },
        |relay| async move {
            match relay {
                Relay::Snapshot { snapshot, subscription } => Some((
                    Ok(Event::default().event("gallery").data(snapshot)),
                    Relay::Live { subscription },
                )),

                Relay::Live { mut subscription } => match subscription.recv().await {
                    Some(update) => {
                        let event = Event::default()
                            .event("status")
                            .data(update.to_wire().to_string());
                        if update.is_terminal() {
                            subscription.unsubscribe();
                            Some((Ok(event), Relay::Redirect { target: redirect_target(&update) }))
                        } else {
                            Some((Ok(event), Relay::Live { subscription }))
                        }
                    }
                    // Channel closed without a terminal event; send the
                    // client home.
                    None => Some((
                        Ok(Event::default().event("redirect").data("/")),
                        Relay::Done,
                    )),
                },

                Relay::Redirect { target } => Some((
                    Ok(Event::default().event("redirect").data(target)),
                    Relay::Done,
                )),

                Relay::Done => None,
            }
        },
    )
}

/// Where the client goes after the terminal event: the result page on
/// success, the default location on error.
fn redirect_target(update: &ProgressUpdate) -> String {
    match update {
        ProgressUpdate::Complete { video_url, .. } => video_url.clone(),
        _ => "/".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use huebox_events::{ProgressBus, ProgressChannel};

    /// Drain the relay stream into (event kind, data) pairs by driving
    /// it concurrently with a publisher.
    async fn run_relay(publish: Vec<ProgressUpdate>) -> Vec<ProgressUpdate> {
        let bus = ProgressBus::new();
        let subscription = bus.subscribe("user:t").await;
        let stream = relay_stream("<div id='gallery'></div>".to_string(), subscription);
        futures::pin_mut!(stream);

        // Snapshot comes first, before any live event.
        assert!(stream.next().await.is_some());

        for update in &publish {
            bus.publish("user:t", update.clone()).await;
        }

        let mut seen = Vec::new();
        for update in publish {
            assert!(stream.next().await.is_some());
            seen.push(update);
            if seen.last().unwrap().is_terminal() {
                break;
            }
        }
        // Terminal update is followed by a redirect, then the end.
        assert!(stream.next().await.is_some());
        assert!(stream.next().await.is_none());
        seen
    }

    #[tokio::test]
    async fn complete_run_ends_with_redirect() {
        let seen = run_relay(vec![
            ProgressUpdate::FetchingMetadata,
            ProgressUpdate::Complete {
                job_id: "j1".to_string(),
                video_url: "/v/j1".to_string(),
            },
        ])
        .await;
        assert_eq!(seen.len(), 2);
    }

    #[tokio::test]
    async fn error_run_also_ends_with_redirect() {
        let seen = run_relay(vec![ProgressUpdate::Error {
            message: "boom".to_string(),
        }])
        .await;
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn redirect_targets() {
        assert_eq!(
            redirect_target(&ProgressUpdate::Complete {
                job_id: "j".into(),
                video_url: "/v/j".into()
            }),
            "/v/j"
        );
        assert_eq!(
            redirect_target(&ProgressUpdate::Error { message: "m".into() }),
            "/"
        );
    }
}
