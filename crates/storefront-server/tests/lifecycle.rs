//! End-to-end tests for serving, draining and stopping.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use storefront_core::{Empty, FnHandler, NoopObserver, RequestContext, ServiceError};
use storefront_server::{
    endpoint, DrainOutcome, Dispatcher, LifecycleState, LifecycleWatch, Router, Server,
    ServerConfig, ShutdownReport, ShutdownSignal,
};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

struct Running {
    addr: SocketAddr,
    watch: LifecycleWatch,
    shutdown: ShutdownSignal,
    handle: JoinHandle<ShutdownReport>,
}

async fn start(router: Router, shutdown_timeout: Duration) -> Running {
    let config = ServerConfig::builder()
        .http_addr("127.0.0.1:0")
        .shutdown_timeout(shutdown_timeout)
        .build();
    let server = Server::new(config, router, Dispatcher::new(Arc::new(NoopObserver)));
    let listening = server.listen().await.expect("bind should succeed");
    let addr = listening.local_addr();
    let mut watch = listening.lifecycle();

    let shutdown = ShutdownSignal::new();
    let handle = tokio::spawn(listening.serve(shutdown.clone()));
    watch.reached(LifecycleState::Listening).await;

    Running {
        addr,
        watch,
        shutdown,
        handle,
    }
}

/// A router whose `/slow` handler signals `started` and then waits `hold`.
fn slow_router(started: Arc<Notify>, hold: Duration) -> Router {
    let dispatcher = Dispatcher::new(Arc::new(NoopObserver)).with_timeout(Duration::from_secs(30));
    let slow = FnHandler::new(move |_ctx: &RequestContext, _req: Empty| {
        let started = Arc::clone(&started);
        async move {
            started.notify_one();
            tokio::time::sleep(hold).await;
            Ok::<_, ServiceError>(serde_json::json!({ "done": true }))
        }
    });

    let mut router = Router::new();
    router.get("/slow", "slow", endpoint(slow, dispatcher));
    router
}

async fn get(addr: SocketAddr, path: &str) -> Result<(StatusCode, String), hyper_util::client::legacy::Error> {
    let client = Client::builder(TokioExecutor::new()).build_http::<Full<Bytes>>();
    let request = Request::builder()
        .method(Method::GET)
        .uri(format!("http://{addr}{path}"))
        .body(Full::new(Bytes::new()))
        .unwrap();

    let response = client.request(request).await?;
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    Ok((status, String::from_utf8(body.to_vec()).unwrap()))
}

#[tokio::test]
async fn in_flight_request_completes_during_drain() {
    let started = Arc::new(Notify::new());
    let running = start(
        slow_router(Arc::clone(&started), Duration::from_millis(200)),
        Duration::from_secs(5),
    )
    .await;

    let addr = running.addr;
    let request = tokio::spawn(async move { get(addr, "/slow").await });
    started.notified().await;

    running.shutdown.trigger();

    let (status, body) = request.await.unwrap().expect("in-flight request should complete");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"done":true}"#);

    let report = running.handle.await.unwrap();
    assert_eq!(report.outcome, DrainOutcome::Completed);
    assert_eq!(running.watch.current(), LifecycleState::Stopped);
}

#[tokio::test]
async fn new_connections_are_refused_after_shutdown() {
    let running = start(Router::new(), Duration::from_secs(1)).await;
    let addr = running.addr;

    let (status, body) = get(addr, "/anything").await.unwrap();
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"route not found"}"#);

    running.shutdown.trigger();
    running.handle.await.unwrap();

    assert!(tokio::net::TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn drain_ceiling_forces_stop() {
    let started = Arc::new(Notify::new());
    let running = start(
        slow_router(Arc::clone(&started), Duration::from_secs(60)),
        Duration::from_millis(100),
    )
    .await;

    let addr = running.addr;
    let request = tokio::spawn(async move { get(addr, "/slow").await });
    started.notified().await;

    running.shutdown.trigger();
    let report = tokio::time::timeout(Duration::from_secs(5), running.handle)
        .await
        .expect("forced stop should not wait for the handler")
        .unwrap();

    assert_eq!(report.outcome, DrainOutcome::Forced { remaining: 1 });
    assert!(report.drain_elapsed >= Duration::from_millis(100));
    assert!(request.await.unwrap().is_err());
}

#[tokio::test]
async fn lifecycle_moves_through_every_state() {
    let running = start(Router::new(), Duration::from_secs(1)).await;
    let mut watch = running.watch.clone();
    assert_eq!(watch.current(), LifecycleState::Listening);

    running.shutdown.trigger();
    assert!(watch.reached(LifecycleState::Draining).await >= LifecycleState::Draining);

    running.handle.await.unwrap();
    assert_eq!(watch.reached(LifecycleState::Stopped).await, LifecycleState::Stopped);
}

#[tokio::test]
async fn wrong_method_on_known_path_is_405() {
    let started = Arc::new(Notify::new());
    let running = start(slow_router(started, Duration::ZERO), Duration::from_secs(1)).await;

    let client = Client::builder(TokioExecutor::new()).build_http::<Full<Bytes>>();
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("http://{}/slow", running.addr))
        .body(Full::new(Bytes::new()))
        .unwrap();
    let response = client.request(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    running.shutdown.trigger();
    running.handle.await.unwrap();
}
