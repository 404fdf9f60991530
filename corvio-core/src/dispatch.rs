//! Replica fan-out dispatchers.
//!
//! Both dispatchers launch sub-requests against every replica and share a
//! close-once cancellation signal. Once a decision is reached the signal
//! fires, losing sub-requests stop, and any response they already produced
//! is dropped so its connection is released instead of leaking out of the
//! pool.

use reqwest::{Client, Request, Response};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// How long a read waits on the current replica set before hedging to the
/// next replica.
const NEXT_REPLICA_DELAY: Duration = Duration::from_secs(1);

/// Fan out mutation sub-requests and return the first status whose class
/// reaches a majority of `replica_count`.
///
/// The quorum threshold is computed from the ring's replica count, not
/// from `requests.len()`, so a replica skipped at construction time still
/// weakens the achievable majority. Transport failures count as 500. If
/// every sub-request completes without any class reaching quorum, the
/// result is 503.
pub async fn quorum_response(client: &Client, replica_count: usize, requests: Vec<Request>) -> u16 {
    let quorum = replica_count.div_ceil(2).max(1);
    let cancel = CancellationToken::new();
    let (status_tx, mut status_rx) = mpsc::channel::<u16>(requests.len().max(1));

    for request in requests {
        let client = client.clone();
        let status_tx = status_tx.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let status = tokio::select! {
                outcome = client.execute(request) => match outcome {
                    Ok(response) => response.status().as_u16(),
                    Err(error) => {
                        tracing::debug!("replica request failed: {}", error);
                        500
                    }
                },
                _ = cancel.cancelled() => return,
            };
            let _ = status_tx.send(status).await;
        });
    }
    drop(status_tx);
    let _stop = cancel.drop_guard();

    let mut class_counts = [0usize; 6];
    while let Some(status) = status_rx.recv().await {
        let class = (status / 100) as usize;
        if class <= 5 {
            class_counts[class] += 1;
            if class_counts[class] >= quorum {
                return status;
            }
        }
    }
    503
}

/// Staggered read fan-out: launch one replica, give the race up to one
/// second, then bring the next replica in. The first 2xx response wins and
/// is handed back with its body unread; failed and non-2xx completions are
/// consumed without ending the search. `None` means no replica produced a
/// 2xx, which callers surface as 404.
pub async fn first_response(client: &Client, requests: Vec<Request>) -> Option<Response> {
    let cancel = CancellationToken::new();
    let (response_tx, mut response_rx) = mpsc::channel::<Option<Response>>(requests.len().max(1));
    let _stop = cancel.clone().drop_guard();

    for request in requests {
        let client = client.clone();
        let response_tx = response_tx.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let response = tokio::select! {
                outcome = client.execute(request) => outcome.ok(),
                _ = cancel.cancelled() => return,
            };
            // if the dispatcher already returned, the failed send drops the
            // late response and closes its body
            let _ = response_tx.send(response).await;
        });

        match timeout(NEXT_REPLICA_DELAY, response_rx.recv()).await {
            Ok(Some(Some(response))) if response.status().is_success() => return Some(response),
            Ok(_) => {}  // transport failure or non-2xx: keep searching
            Err(_) => {} // window elapsed: hedge to the next replica
        }
    }
    None
}
