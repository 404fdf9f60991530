//! Proxy operations against the replicated backend tiers.
//!
//! `DirectClient` owns the shared transport and the three placement rings.
//! Mutations go through the quorum dispatcher, reads through the staggered
//! first-response dispatcher, and child-tier writes tell each backend
//! where the parent-tier record lives so it can update the parent listing
//! asynchronously.

use crate::config::ClientConfig;
use crate::dispatch::{first_response, quorum_response};
use crate::error::{CorvioError, Result};
use crate::fanout::{body_pipe, copy_to_pipes};
use crate::query::{backend_path, escape_path, ListingOptions};
use crate::ring::{Device, Ring};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, EXPECT};
use reqwest::{Client, Method, Request, Response};
use std::sync::Arc;
use tokio::io::AsyncRead;

/// Headers and status from the replica that answered a HEAD.
#[derive(Debug)]
pub struct ReplicaHead {
    pub status: u16,
    pub headers: HeaderMap,
}

pub struct DirectClient {
    http: Client,
    account_ring: Arc<dyn Ring>,
    container_ring: Arc<dyn Ring>,
    object_ring: Arc<dyn Ring>,
}

fn replica_url(device: &Device, partition: u64, path: &str, query: &str) -> String {
    format!(
        "http://{}:{}/{}/{}{}{}",
        device.ip, device.port, device.device, partition, path, query
    )
}

/// Set the parent-tier placement hint for child replica `replica_index`,
/// overwriting any caller-supplied value of the same name. Parent sets
/// shorter than the child set wrap around instead of panicking.
fn parent_hints(
    headers: &mut HeaderMap,
    parent: &str,
    parent_partition: u64,
    parent_devices: &[Device],
    replica_index: usize,
) {
    if parent_devices.is_empty() {
        return;
    }
    let device = &parent_devices[replica_index % parent_devices.len()];
    let hints = [
        (
            format!("X-{}-Partition", parent),
            parent_partition.to_string(),
        ),
        (
            format!("X-{}-Host", parent),
            format!("{}:{}", device.ip, device.port),
        ),
        (format!("X-{}-Device", parent), device.device.clone()),
    ];
    for (name, value) in hints {
        let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::try_from(value))
        else {
            tracing::debug!("skipping unrepresentable {} placement hint", parent);
            continue;
        };
        headers.insert(name, value);
    }
}

impl DirectClient {
    pub fn new(
        account_ring: Arc<dyn Ring>,
        container_ring: Arc<dyn Ring>,
        object_ring: Arc<dyn Ring>,
    ) -> Result<Self> {
        Self::with_config(
            &ClientConfig::default(),
            account_ring,
            container_ring,
            object_ring,
        )
    }

    pub fn with_config(
        config: &ClientConfig,
        account_ring: Arc<dyn Ring>,
        container_ring: Arc<dyn Ring>,
        object_ring: Arc<dyn Ring>,
    ) -> Result<Self> {
        // backends are addressed directly; environment proxies and
        // redirects have no place between the proxy and its storage nodes
        let http = Client::builder()
            .connect_timeout(config.connect_timeout())
            .tcp_keepalive(config.keepalive_interval())
            .timeout(config.request_timeout())
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()
            .map_err(|e| CorvioError::Http(e.to_string()))?;

        Ok(Self {
            http,
            account_ring,
            container_ring,
            object_ring,
        })
    }

    /// Build one bodyless sub-request per replica. `customize` edits that
    /// replica's copy of the caller headers, so forced values overwrite
    /// caller-supplied ones instead of stacking a second line. A device
    /// whose URL the client refuses is skipped; quorum math still runs
    /// against the full replica set.
    fn build_requests<F>(
        &self,
        method: Method,
        devices: &[Device],
        partition: u64,
        path: &str,
        query: &str,
        headers: &HeaderMap,
        mut customize: F,
    ) -> Vec<Request>
    where
        F: FnMut(usize, &mut HeaderMap),
    {
        let mut requests = Vec::with_capacity(devices.len());
        for (i, device) in devices.iter().enumerate() {
            let url = replica_url(device, partition, path, query);
            let mut request_headers = headers.clone();
            customize(i, &mut request_headers);
            let builder = self
                .http
                .request(method.clone(), &url)
                .headers(request_headers);
            match builder.build() {
                Ok(request) => requests.push(request),
                Err(error) => {
                    tracing::debug!("skipping replica {}: {}", url, error);
                }
            }
        }
        requests
    }

    // --- account tier ---

    pub async fn put_account(&self, account: &str, headers: &HeaderMap) -> u16 {
        let partition = self.account_ring.partition(account, "", "");
        let devices = self.account_ring.nodes(partition);
        let path = backend_path(account, "", "");
        let requests =
            self.build_requests(Method::PUT, &devices, partition, &path, "", headers, |_, _| {});
        quorum_response(&self.http, devices.len(), requests).await
    }

    pub async fn post_account(&self, account: &str, headers: &HeaderMap) -> u16 {
        let partition = self.account_ring.partition(account, "", "");
        let devices = self.account_ring.nodes(partition);
        let path = backend_path(account, "", "");
        let requests =
            self.build_requests(Method::POST, &devices, partition, &path, "", headers, |_, _| {});
        quorum_response(&self.http, devices.len(), requests).await
    }

    pub async fn get_account(
        &self,
        account: &str,
        options: &ListingOptions,
        headers: &HeaderMap,
    ) -> Option<Response> {
        let partition = self.account_ring.partition(account, "", "");
        let devices = self.account_ring.nodes(partition);
        let path = backend_path(account, "", "");
        let query = options.to_query();
        let requests =
            self.build_requests(Method::GET, &devices, partition, &path, &query, headers, |_, _| {});
        first_response(&self.http, requests).await
    }

    pub async fn head_account(&self, account: &str, headers: &HeaderMap) -> Option<ReplicaHead> {
        let partition = self.account_ring.partition(account, "", "");
        let devices = self.account_ring.nodes(partition);
        let path = backend_path(account, "", "");
        let requests =
            self.build_requests(Method::HEAD, &devices, partition, &path, "", headers, |_, _| {});
        let response = first_response(&self.http, requests).await?;
        Some(ReplicaHead {
            status: response.status().as_u16(),
            headers: response.headers().clone(),
        })
    }

    pub async fn delete_account(&self, account: &str, headers: &HeaderMap) -> u16 {
        let partition = self.account_ring.partition(account, "", "");
        let devices = self.account_ring.nodes(partition);
        let path = backend_path(account, "", "");
        let requests =
            self.build_requests(Method::DELETE, &devices, partition, &path, "", headers, |_, _| {});
        quorum_response(&self.http, devices.len(), requests).await
    }

    // --- container tier ---

    pub async fn put_container(&self, account: &str, container: &str, headers: &HeaderMap) -> u16 {
        let partition = self.container_ring.partition(account, container, "");
        let devices = self.container_ring.nodes(partition);
        let account_partition = self.account_ring.partition(account, "", "");
        let account_devices = self.account_ring.nodes(account_partition);
        let path = backend_path(account, container, "");
        let requests =
            self.build_requests(Method::PUT, &devices, partition, &path, "", headers, |i, h| {
                parent_hints(h, "Account", account_partition, &account_devices, i);
            });
        quorum_response(&self.http, devices.len(), requests).await
    }

    pub async fn post_container(&self, account: &str, container: &str, headers: &HeaderMap) -> u16 {
        let partition = self.container_ring.partition(account, container, "");
        let devices = self.container_ring.nodes(partition);
        let path = backend_path(account, container, "");
        let requests =
            self.build_requests(Method::POST, &devices, partition, &path, "", headers, |_, _| {});
        quorum_response(&self.http, devices.len(), requests).await
    }

    pub async fn get_container(
        &self,
        account: &str,
        container: &str,
        options: &ListingOptions,
        headers: &HeaderMap,
    ) -> Option<Response> {
        let partition = self.container_ring.partition(account, container, "");
        let devices = self.container_ring.nodes(partition);
        let path = backend_path(account, container, "");
        let query = options.to_query();
        let requests =
            self.build_requests(Method::GET, &devices, partition, &path, &query, headers, |_, _| {});
        first_response(&self.http, requests).await
    }

    pub async fn head_container(
        &self,
        account: &str,
        container: &str,
        headers: &HeaderMap,
    ) -> Option<ReplicaHead> {
        let partition = self.container_ring.partition(account, container, "");
        let devices = self.container_ring.nodes(partition);
        let path = backend_path(account, container, "");
        let requests =
            self.build_requests(Method::HEAD, &devices, partition, &path, "", headers, |_, _| {});
        let response = first_response(&self.http, requests).await?;
        Some(ReplicaHead {
            status: response.status().as_u16(),
            headers: response.headers().clone(),
        })
    }

    pub async fn delete_container(
        &self,
        account: &str,
        container: &str,
        headers: &HeaderMap,
    ) -> u16 {
        let partition = self.container_ring.partition(account, container, "");
        let devices = self.container_ring.nodes(partition);
        let account_partition = self.account_ring.partition(account, "", "");
        let account_devices = self.account_ring.nodes(account_partition);
        let path = backend_path(account, container, "");
        let requests =
            self.build_requests(Method::DELETE, &devices, partition, &path, "", headers, |i, h| {
                parent_hints(h, "Account", account_partition, &account_devices, i);
            });
        quorum_response(&self.http, devices.len(), requests).await
    }

    // --- object tier ---

    /// Stream one client body to every object replica under a quorum.
    /// The copy runs concurrently with the dispatch; the slowest replica
    /// paces the source.
    pub async fn put_object<R>(
        &self,
        account: &str,
        container: &str,
        object: &str,
        headers: &HeaderMap,
        source: R,
    ) -> u16
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let partition = self.object_ring.partition(account, container, object);
        let devices = self.object_ring.nodes(partition);
        let container_partition = self.container_ring.partition(account, container, "");
        let container_devices = self.container_ring.nodes(container_partition);
        let path = backend_path(account, container, object);

        let mut writers = Vec::with_capacity(devices.len());
        let mut requests = Vec::with_capacity(devices.len());
        for (i, device) in devices.iter().enumerate() {
            let url = replica_url(device, partition, &path, "");
            let (writer, body) = body_pipe();
            let mut request_headers = headers.clone();
            request_headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            );
            request_headers.insert(EXPECT, HeaderValue::from_static("100-continue"));
            parent_hints(
                &mut request_headers,
                "Container",
                container_partition,
                &container_devices,
                i,
            );
            let builder = self
                .http
                .request(Method::PUT, &url)
                .headers(request_headers)
                .body(body);
            match builder.build() {
                Ok(request) => {
                    requests.push(request);
                    writers.push(writer);
                }
                Err(error) => {
                    tracing::debug!("skipping replica {}: {}", url, error);
                }
            }
        }

        tokio::spawn(copy_to_pipes(source, writers));
        quorum_response(&self.http, devices.len(), requests).await
    }

    pub async fn post_object(
        &self,
        account: &str,
        container: &str,
        object: &str,
        headers: &HeaderMap,
    ) -> u16 {
        let partition = self.object_ring.partition(account, container, object);
        let devices = self.object_ring.nodes(partition);
        let container_partition = self.container_ring.partition(account, container, "");
        let container_devices = self.container_ring.nodes(container_partition);
        let path = backend_path(account, container, object);
        let requests =
            self.build_requests(Method::POST, &devices, partition, &path, "", headers, |i, h| {
                h.insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static("application/octet-stream"),
                );
                parent_hints(h, "Container", container_partition, &container_devices, i);
            });
        quorum_response(&self.http, devices.len(), requests).await
    }

    pub async fn get_object(
        &self,
        account: &str,
        container: &str,
        object: &str,
        headers: &HeaderMap,
    ) -> Option<Response> {
        let partition = self.object_ring.partition(account, container, object);
        let devices = self.object_ring.nodes(partition);
        let path = backend_path(account, container, object);
        let requests =
            self.build_requests(Method::GET, &devices, partition, &path, "", headers, |_, _| {});
        first_response(&self.http, requests).await
    }

    /// Run the `GREP` extension method against the object replicas; the
    /// first replica to answer 2xx streams its matches back.
    pub async fn grep_object(
        &self,
        account: &str,
        container: &str,
        object: &str,
        search: &str,
    ) -> Option<Response> {
        let method = match Method::from_bytes(b"GREP") {
            Ok(method) => method,
            Err(_) => return None,
        };
        let partition = self.object_ring.partition(account, container, object);
        let devices = self.object_ring.nodes(partition);
        let path = backend_path(account, container, object);
        let query = format!("?e={}", escape_path(search));
        let headers = HeaderMap::new();
        let requests =
            self.build_requests(method, &devices, partition, &path, &query, &headers, |_, _| {});
        first_response(&self.http, requests).await
    }

    pub async fn head_object(
        &self,
        account: &str,
        container: &str,
        object: &str,
        headers: &HeaderMap,
    ) -> Option<ReplicaHead> {
        let partition = self.object_ring.partition(account, container, object);
        let devices = self.object_ring.nodes(partition);
        let path = backend_path(account, container, object);
        let requests =
            self.build_requests(Method::HEAD, &devices, partition, &path, "", headers, |_, _| {});
        let response = first_response(&self.http, requests).await?;
        Some(ReplicaHead {
            status: response.status().as_u16(),
            headers: response.headers().clone(),
        })
    }

    pub async fn delete_object(
        &self,
        account: &str,
        container: &str,
        object: &str,
        headers: &HeaderMap,
    ) -> u16 {
        let partition = self.object_ring.partition(account, container, object);
        let devices = self.object_ring.nodes(partition);
        let container_partition = self.container_ring.partition(account, container, "");
        let container_devices = self.container_ring.nodes(container_partition);
        let path = backend_path(account, container, object);
        let requests =
            self.build_requests(Method::DELETE, &devices, partition, &path, "", headers, |i, h| {
                h.insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static("application/octet-stream"),
                );
                parent_hints(h, "Container", container_partition, &container_devices, i);
            });
        quorum_response(&self.http, devices.len(), requests).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::StaticRing;
    use axum::http::StatusCode;
    use axum::routing::any;
    use axum::Router;
    use std::io::Cursor;
    use std::net::SocketAddr;
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    struct CapturedRequest {
        method: String,
        uri: String,
        headers: axum::http::HeaderMap,
        body: Vec<u8>,
    }

    #[derive(Clone, Default)]
    struct Capture {
        requests: Arc<Mutex<Vec<CapturedRequest>>>,
    }

    impl Capture {
        fn take(&self) -> Vec<CapturedRequest> {
            self.requests.lock().unwrap().clone()
        }

        fn len(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    /// Record every request; hold each response until `respond_after`
    /// replicas have checked in, so an early quorum cannot cancel a
    /// sibling before it was captured.
    fn capture_router(
        status: u16,
        body: &'static str,
        capture: Capture,
        respond_after: usize,
    ) -> Router {
        Router::new().route(
            "/*path",
            any(move |request: axum::extract::Request| {
                let capture = capture.clone();
                async move {
                    let (parts, raw_body) = request.into_parts();
                    let bytes = axum::body::to_bytes(raw_body, usize::MAX).await.unwrap();
                    capture.requests.lock().unwrap().push(CapturedRequest {
                        method: parts.method.to_string(),
                        uri: parts.uri.to_string(),
                        headers: parts.headers,
                        body: bytes.to_vec(),
                    });
                    for _ in 0..1000 {
                        if capture.len() >= respond_after {
                            break;
                        }
                        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                    }
                    (StatusCode::from_u16(status).unwrap(), body)
                }
            }),
        )
    }

    async fn spawn_backend(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    /// Spawn `count` capturing backends and wrap them in a ring whose
    /// device names identify the backend they point at.
    async fn backend_ring(
        count: usize,
        status: u16,
        body: &'static str,
        respond_after: usize,
    ) -> (Arc<StaticRing>, Capture) {
        let capture = Capture::default();
        let mut devices = Vec::new();
        for i in 0..count {
            let addr =
                spawn_backend(capture_router(status, body, capture.clone(), respond_after)).await;
            devices.push(Device::new(
                addr.ip().to_string(),
                addr.port(),
                format!("d{}", i),
            ));
        }
        let ring = Arc::new(StaticRing::new(devices, 8, count).unwrap());
        (ring, capture)
    }

    fn offline_ring(count: usize) -> Arc<StaticRing> {
        let devices = (0..count)
            .map(|i| Device::new(format!("10.9.{}.1", i), 6000, format!("p{}", i)))
            .collect();
        Arc::new(StaticRing::new(devices, 8, count).unwrap())
    }

    fn device_name_of(uri: &str) -> String {
        uri.trim_start_matches('/').split('/').next().unwrap().to_string()
    }

    fn header(headers: &axum::http::HeaderMap, name: &str) -> String {
        headers
            .get(name)
            .map(|value| value.to_str().unwrap().to_string())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_put_account_url_shape() {
        let (ring, capture) = backend_ring(3, 201, "", 3).await;
        let client = DirectClient::new(ring.clone(), offline_ring(3), offline_ring(3)).unwrap();

        let status = client.put_account("the acct", &HeaderMap::new()).await;
        assert_eq!(status, 201);

        let partition = ring.partition("the acct", "", "");
        let captured = capture.take();
        assert_eq!(captured.len(), 3);
        for request in &captured {
            assert_eq!(request.method, "PUT");
            let expected = format!("/{}/{}/the%20acct", device_name_of(&request.uri), partition);
            assert_eq!(request.uri, expected);
        }
    }

    #[tokio::test]
    async fn test_put_container_carries_account_hints_by_index() {
        let account_ring = offline_ring(3);
        let (container_ring, capture) = backend_ring(3, 201, "", 3).await;
        let client =
            DirectClient::new(account_ring.clone(), container_ring.clone(), offline_ring(3))
                .unwrap();

        let status = client.put_container("a", "c", &HeaderMap::new()).await;
        assert_eq!(status, 201);

        let partition = container_ring.partition("a", "c", "");
        let replicas = container_ring.nodes(partition);
        let account_partition = account_ring.partition("a", "", "");
        let account_devices = account_ring.nodes(account_partition);

        let captured = capture.take();
        assert_eq!(captured.len(), 3);
        let mut seen_parent_devices = Vec::new();
        for request in &captured {
            let device = device_name_of(&request.uri);
            let index = replicas.iter().position(|r| r.device == device).unwrap();
            let parent = &account_devices[index % account_devices.len()];

            assert_eq!(
                header(&request.headers, "x-account-partition"),
                account_partition.to_string()
            );
            assert_eq!(
                header(&request.headers, "x-account-host"),
                format!("{}:{}", parent.ip, parent.port)
            );
            assert_eq!(header(&request.headers, "x-account-device"), parent.device);
            seen_parent_devices.push(parent.device.clone());
        }
        seen_parent_devices.sort();
        seen_parent_devices.dedup();
        assert_eq!(seen_parent_devices.len(), 3, "hints must differ per replica");
    }

    #[tokio::test]
    async fn test_post_container_has_no_hints() {
        let (container_ring, capture) = backend_ring(3, 202, "", 3).await;
        let client =
            DirectClient::new(offline_ring(3), container_ring, offline_ring(3)).unwrap();

        let status = client.post_container("a", "c", &HeaderMap::new()).await;
        assert_eq!(status, 202);
        for request in capture.take() {
            assert!(request.headers.get("x-account-partition").is_none());
        }
    }

    #[tokio::test]
    async fn test_put_object_streams_body_to_every_replica() {
        let container_ring = offline_ring(3);
        let (object_ring, capture) = backend_ring(3, 201, "", 3).await;
        let client =
            DirectClient::new(offline_ring(3), container_ring.clone(), object_ring.clone())
                .unwrap();

        let payload: Vec<u8> = (0..150_000usize).map(|i| (i % 239) as u8).collect();
        let status = client
            .put_object("a", "c", "o", &HeaderMap::new(), Cursor::new(payload.clone()))
            .await;
        assert_eq!(status, 201);

        let container_partition = container_ring.partition("a", "c", "");
        let captured = capture.take();
        assert_eq!(captured.len(), 3);
        for request in &captured {
            assert_eq!(request.method, "PUT");
            assert_eq!(request.body, payload);
            assert_eq!(
                header(&request.headers, "content-type"),
                "application/octet-stream"
            );
            assert_eq!(header(&request.headers, "expect"), "100-continue");
            assert_eq!(
                header(&request.headers, "x-container-partition"),
                container_partition.to_string()
            );
            assert!(!header(&request.headers, "x-container-host").is_empty());
            assert!(!header(&request.headers, "x-container-device").is_empty());
        }
    }

    #[tokio::test]
    async fn test_get_object_streams_winning_body() {
        let (object_ring, _capture) = backend_ring(3, 200, "object payload", 1).await;
        let client =
            DirectClient::new(offline_ring(3), offline_ring(3), object_ring).unwrap();

        let response = client
            .get_object("a", "c", "o", &HeaderMap::new())
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(response.text().await.unwrap(), "object payload");
    }

    #[tokio::test]
    async fn test_get_object_missing_everywhere() {
        let (object_ring, _capture) = backend_ring(3, 404, "", 1).await;
        let client =
            DirectClient::new(offline_ring(3), offline_ring(3), object_ring).unwrap();

        assert!(client
            .get_object("a", "c", "o", &HeaderMap::new())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_head_object_returns_headers_and_closes_body() {
        let router = Router::new().route(
            "/*path",
            any(|| async { (StatusCode::OK, [("x-object-meta-color", "teal")], "ignored") }),
        );
        let addr = spawn_backend(router).await;
        let devices = vec![Device::new(addr.ip().to_string(), addr.port(), "d0")];
        let object_ring = Arc::new(StaticRing::new(devices, 8, 1).unwrap());
        let client =
            DirectClient::new(offline_ring(3), offline_ring(3), object_ring).unwrap();

        let head = client
            .head_object("a", "c", "o", &HeaderMap::new())
            .await
            .unwrap();
        assert_eq!(head.status, 200);
        assert_eq!(head.headers.get("x-object-meta-color").unwrap(), "teal");
    }

    #[tokio::test]
    async fn test_grep_object_uses_extension_method() {
        let (object_ring, capture) = backend_ring(1, 200, "match line", 1).await;
        let client =
            DirectClient::new(offline_ring(3), offline_ring(3), object_ring).unwrap();

        let response = client.grep_object("a", "c", "o", "needle 1").await.unwrap();
        assert_eq!(response.text().await.unwrap(), "match line");

        let captured = capture.take();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].method, "GREP");
        assert!(captured[0].uri.ends_with("?e=needle%201"));
    }

    #[tokio::test]
    async fn test_delete_object_carries_container_hints() {
        let container_ring = offline_ring(2);
        let (object_ring, capture) = backend_ring(3, 204, "", 3).await;
        let client =
            DirectClient::new(offline_ring(3), container_ring.clone(), object_ring).unwrap();

        let status = client.delete_object("a", "c", "o", &HeaderMap::new()).await;
        assert_eq!(status, 204);

        // two parent devices serve three child replicas: indexes wrap
        let container_partition = container_ring.partition("a", "c", "");
        let parents = container_ring.nodes(container_partition);
        for request in capture.take() {
            assert_eq!(request.method, "DELETE");
            assert_eq!(
                header(&request.headers, "content-type"),
                "application/octet-stream"
            );
            let hinted = header(&request.headers, "x-container-device");
            assert!(parents.iter().any(|p| p.device == hinted));
        }
    }

    #[tokio::test]
    async fn test_unbuildable_replica_is_skipped_but_quorum_holds() {
        let capture = Capture::default();
        let mut devices = Vec::new();
        for i in 0..2 {
            let addr = spawn_backend(capture_router(201, "", capture.clone(), 2)).await;
            devices.push(Device::new(
                addr.ip().to_string(),
                addr.port(),
                format!("d{}", i),
            ));
        }
        // a host reqwest refuses to parse
        devices.push(Device::new("bad host", 6000, "d2"));
        let object_ring = Arc::new(StaticRing::new(devices, 8, 3).unwrap());
        let client =
            DirectClient::new(offline_ring(3), offline_ring(3), object_ring).unwrap();

        let status = client.delete_object("a", "c", "o", &HeaderMap::new()).await;
        assert_eq!(status, 201);
        assert_eq!(capture.take().len(), 2);
    }

    #[tokio::test]
    async fn test_user_headers_pass_through() {
        let (container_ring, capture) = backend_ring(3, 201, "", 3).await;
        let client =
            DirectClient::new(offline_ring(3), container_ring, offline_ring(3)).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("x-container-meta-owner", "ops".parse().unwrap());
        let status = client.put_container("a", "c", &headers).await;
        assert_eq!(status, 201);
        for request in capture.take() {
            assert_eq!(header(&request.headers, "x-container-meta-owner"), "ops");
        }
    }

    #[tokio::test]
    async fn test_put_object_forces_single_content_type_and_expect() {
        let (object_ring, capture) = backend_ring(3, 201, "", 3).await;
        let client =
            DirectClient::new(offline_ring(3), offline_ring(3), object_ring).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("content-type", "text/plain".parse().unwrap());
        headers.insert("expect", "202-upgrade".parse().unwrap());
        let status = client
            .put_object("a", "c", "o", &headers, Cursor::new(b"payload".to_vec()))
            .await;
        assert_eq!(status, 201);

        let captured = capture.take();
        assert_eq!(captured.len(), 3);
        for request in &captured {
            let content_types: Vec<_> =
                request.headers.get_all("content-type").iter().collect();
            assert_eq!(content_types.len(), 1);
            assert_eq!(content_types[0], "application/octet-stream");

            let expects: Vec<_> = request.headers.get_all("expect").iter().collect();
            assert_eq!(expects.len(), 1);
            assert_eq!(expects[0], "100-continue");
        }
    }

    #[tokio::test]
    async fn test_delete_object_forces_single_content_type() {
        let (object_ring, capture) = backend_ring(3, 204, "", 3).await;
        let client =
            DirectClient::new(offline_ring(3), offline_ring(3), object_ring).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("content-type", "text/plain".parse().unwrap());
        let status = client.delete_object("a", "c", "o", &headers).await;
        assert_eq!(status, 204);

        let captured = capture.take();
        assert_eq!(captured.len(), 3);
        for request in &captured {
            let content_types: Vec<_> =
                request.headers.get_all("content-type").iter().collect();
            assert_eq!(content_types.len(), 1);
            assert_eq!(content_types[0], "application/octet-stream");
        }
    }
}
