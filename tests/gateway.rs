use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::task::JoinSet;

use sts_gateway::assume_role::{AssumeRole, AssumeRoleOutput, AssumeRoleRequest};
use sts_gateway::context::{Context, ContextError};
use sts_gateway::gateway::{DefaultStsGateway, StsGateway};
use sts_gateway::metrics::{names, MetricsSink};
use sts_gateway_schema::credentials::Credentials;

const ROLE_ARN: &str = "arn:aws:iam::123:role/example";

#[derive(Debug, thiserror::Error)]
#[error("access denied")]
struct AccessDenied;

#[derive(Default)]
struct RecordingSink {
    in_flight: AtomicI64,
    peak: AtomicI64,
    increments: AtomicUsize,
    decrements: AtomicUsize,
    durations: Mutex<Vec<Duration>>,
}

impl MetricsSink for RecordingSink {
    fn record_duration(&self, name: &'static str, elapsed: Duration) {
        assert_eq!(name, names::ASSUME_ROLE_DURATION);
        self.durations.lock().unwrap().push(elapsed);
    }

    fn increment(&self, name: &'static str) {
        assert_eq!(name, names::EXECUTING_REQUESTS);
        self.increments.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn decrement(&self, name: &'static str) {
        assert_eq!(name, names::EXECUTING_REQUESTS);
        self.decrements.fetch_add(1, Ordering::SeqCst);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RecordingSink {
    fn assert_balanced(&self, calls: usize) {
        assert_eq!(self.in_flight.load(Ordering::SeqCst), 0);
        assert_eq!(self.increments.load(Ordering::SeqCst), calls);
        assert_eq!(self.decrements.load(Ordering::SeqCst), calls);
        assert_eq!(self.durations.lock().unwrap().len(), calls);
    }
}

enum Reply {
    Credentials(AssumeRoleOutput),
    AccessDenied,
}

struct StubAssumeRole {
    delay: Option<Duration>,
    reply: Reply,
    requests: Mutex<Vec<AssumeRoleRequest>>,
}

impl StubAssumeRole {
    fn new(reply: Reply) -> Self {
        StubAssumeRole {
            delay: None,
            reply,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn requests(&self) -> Vec<AssumeRoleRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssumeRole for StubAssumeRole {
    async fn assume_role(&self, request: AssumeRoleRequest) -> anyhow::Result<AssumeRoleOutput> {
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.reply {
            Reply::Credentials(output) => Ok(output.clone()),
            Reply::AccessDenied => Err(AccessDenied.into()),
        }
    }
}

fn output() -> AssumeRoleOutput {
    AssumeRoleOutput {
        access_key_id: "AKIAEXAMPLE".to_string(),
        secret_access_key: "secret".to_string(),
        session_token: "token".to_string(),
        expiration: Utc.with_ymd_and_hms(2026, 10, 19, 12, 15, 0).unwrap(),
    }
}

fn gateway(
    stub: StubAssumeRole,
) -> (
    DefaultStsGateway<StubAssumeRole, Arc<RecordingSink>>,
    Arc<RecordingSink>,
) {
    let sink = Arc::new(RecordingSink::default());
    (DefaultStsGateway::new(stub, sink.clone()), sink)
}

#[tokio::test]
async fn issue_maps_provider_credentials() {
    let (gateway, sink) = gateway(StubAssumeRole::new(Reply::Credentials(output())));

    let creds = gateway
        .issue(
            &Context::background(),
            ROLE_ARN,
            "session-a",
            Duration::from_secs(15 * 60),
        )
        .await
        .unwrap();

    assert_eq!(
        creds,
        Credentials::new(
            "AKIAEXAMPLE",
            "secret",
            "token",
            Utc.with_ymd_and_hms(2026, 10, 19, 12, 15, 0).unwrap(),
        )
    );
    assert_eq!(
        gateway.provider().requests(),
        vec![AssumeRoleRequest {
            duration_seconds: 900,
            role_arn: ROLE_ARN.to_string(),
            role_session_name: "session-a".to_string(),
        }]
    );
    sink.assert_balanced(1);
}

#[tokio::test]
async fn issue_returns_provider_error_unchanged() {
    let (gateway, sink) = gateway(StubAssumeRole::new(Reply::AccessDenied));

    let err = gateway
        .issue(
            &Context::background(),
            ROLE_ARN,
            "session-a",
            Duration::from_secs(900),
        )
        .await
        .unwrap_err();

    assert!(err.downcast_ref::<AccessDenied>().is_some());
    assert_eq!(err.to_string(), "access denied");
    assert_eq!(err.chain().count(), 1);
    sink.assert_balanced(1);
}

#[tokio::test]
async fn issue_truncates_sub_second_expiry() {
    let (gateway, _sink) = gateway(StubAssumeRole::new(Reply::Credentials(output())));

    let ctx = Context::background();
    gateway
        .issue(&ctx, ROLE_ARN, "session-a", Duration::from_millis(1500))
        .await
        .unwrap();
    gateway
        .issue(&ctx, ROLE_ARN, "session-a", Duration::from_millis(999))
        .await
        .unwrap();

    let seconds = gateway
        .provider()
        .requests()
        .into_iter()
        .map(|r| r.duration_seconds)
        .collect::<Vec<_>>();
    assert_eq!(seconds, vec![1, 0]);
}

#[tokio::test]
async fn cancellation_aborts_slow_provider() {
    let stub = StubAssumeRole::new(Reply::Credentials(output())).delayed(Duration::from_secs(5));
    let (gateway, sink) = gateway(stub);

    let ctx = Context::background();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        canceller.cancel();
    });

    let started = Instant::now();
    let err = gateway
        .issue(&ctx, ROLE_ARN, "session-a", Duration::from_secs(900))
        .await
        .unwrap_err();

    assert!(started.elapsed() < Duration::from_millis(250));
    assert_eq!(
        err.downcast_ref::<ContextError>(),
        Some(&ContextError::Cancelled)
    );
    sink.assert_balanced(1);
}

#[tokio::test]
async fn already_cancelled_context_skips_provider() {
    let (gateway, sink) = gateway(StubAssumeRole::new(Reply::Credentials(output())));

    let ctx = Context::background();
    ctx.cancel();

    let err = gateway
        .issue(&ctx, ROLE_ARN, "session-a", Duration::from_secs(900))
        .await
        .unwrap_err();

    assert_eq!(
        err.downcast_ref::<ContextError>(),
        Some(&ContextError::Cancelled)
    );
    assert!(gateway.provider().requests().is_empty());
    sink.assert_balanced(1);
}

#[tokio::test]
async fn deadline_aborts_slow_provider() {
    let stub = StubAssumeRole::new(Reply::Credentials(output())).delayed(Duration::from_secs(5));
    let (gateway, sink) = gateway(stub);

    let ctx = Context::background().with_timeout(Duration::from_millis(20));
    let err = gateway
        .issue(&ctx, ROLE_ARN, "session-a", Duration::from_secs(900))
        .await
        .unwrap_err();

    assert_eq!(
        err.downcast_ref::<ContextError>(),
        Some(&ContextError::DeadlineExceeded)
    );
    sink.assert_balanced(1);
}

#[tokio::test]
async fn dropping_the_call_releases_in_flight() {
    let stub = StubAssumeRole::new(Reply::Credentials(output())).delayed(Duration::from_secs(5));
    let (gateway, sink) = gateway(stub);

    let ctx = Context::background();
    let r = tokio::time::timeout(
        Duration::from_millis(10),
        gateway.issue(&ctx, ROLE_ARN, "session-a", Duration::from_secs(900)),
    )
    .await;

    assert!(r.is_err());
    sink.assert_balanced(1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_issues_leave_no_leaked_in_flight() {
    let stub = StubAssumeRole::new(Reply::Credentials(output())).delayed(Duration::from_millis(50));
    let (gateway, sink) = gateway(stub);
    let gateway = Arc::new(gateway);

    let mut tasks = JoinSet::new();
    for i in 0..16 {
        let gateway = gateway.clone();
        tasks.spawn(async move {
            let ctx = Context::background();
            let session_name = format!("session-{}", i);
            if i % 4 == 0 {
                ctx.cancel();
            }
            gateway
                .issue(&ctx, ROLE_ARN, &session_name, Duration::from_secs(900))
                .await
        });
    }

    let mut issued = 0;
    let mut cancelled = 0;
    while let Some(result) = tasks.join_next().await {
        match result.unwrap() {
            Ok(_) => issued += 1,
            Err(_) => cancelled += 1,
        }
    }

    assert_eq!(issued, 12);
    assert_eq!(cancelled, 4);
    assert!(sink.peak.load(Ordering::SeqCst) > 1);
    sink.assert_balanced(16);
}
