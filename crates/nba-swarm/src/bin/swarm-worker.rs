//! Queue Worker
//!
//! Consumes analyst requests from one NATS subject and answers each with
//! a full workflow run. Requests are handled strictly one at a time, and
//! delivery is fire-and-forget: there is no redelivery, so a crash
//! mid-run drops the in-flight request.

use async_nats::ConnectErrorKind;
use futures::StreamExt;
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use nba_analyst::run_analyst;
use nba_swarm::{build_deps, init_tracing, SwarmConfig};

const QUEUE_GROUP: &str = "swarm-workers";

#[derive(Debug, thiserror::Error)]
enum WorkerError {
    #[error("nats connect error: {0}")]
    Connect(#[from] async_nats::error::Error<ConnectErrorKind>),

    #[error("nats subscribe error: {0}")]
    Subscribe(#[from] async_nats::SubscribeError),
}

/// Wire payload of one analyst request
#[derive(Debug, Deserialize)]
struct AnalystRequest {
    message: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let config = SwarmConfig::from_env();
    let deps = build_deps(&config).await?;

    let client = async_nats::connect(config.nats_url.as_str())
        .await
        .map_err(WorkerError::Connect)?;
    let mut requests = client
        .queue_subscribe(config.subject.clone(), QUEUE_GROUP.into())
        .await
        .map_err(WorkerError::Subscribe)?;
    info!(url = %config.nats_url, subject = %config.subject, "worker listening");

    while let Some(msg) = requests.next().await {
        let request: AnalystRequest = match serde_json::from_slice(&msg.payload) {
            Ok(request) => request,
            Err(e) => {
                error!(error = %e, "discarding malformed request payload");
                continue;
            }
        };

        // Each request gets its own conversation record
        let convo_id = Uuid::new_v4().to_string();
        info!(convo_id, "handling analyst request");
        match run_analyst(&deps, &convo_id, &request.message).await {
            Ok(analysis) => info!(convo_id, "analysis complete: {analysis}"),
            Err(e) => error!(convo_id, error = %e, "analyst workflow failed"),
        }
    }

    Ok(())
}
