//! Gateway binary entry point.
//!
//! Wires the platform contracts together: header convention, credential
//! verifier, audit pipeline, and the network module, then serves until
//! interrupted.

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use basegate_core::{AuditClock, HeaderConvention};
use basegate_gateway::audit::{AuditPipeline, AuditSink, HttpSink, TracingSink};
use basegate_gateway::auth::{CredentialVerifier, RemoteVerifier, StaticVerifier};
use basegate_gateway::network::{GatewayServices, NetworkModule};
use basegate_gateway::GatewayArgs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = GatewayArgs::parse();
    init_tracing(args.log_json);

    let sink: Arc<dyn AuditSink> = match &args.audit_url {
        Some(url) => Arc::new(HttpSink::new(url.clone(), args.upstream_timeout())?),
        None => {
            info!("no audit ingest endpoint configured, writing audit records to the log stream");
            Arc::new(TracingSink)
        }
    };
    let mut pipeline = AuditPipeline::spawn(sink, args.audit_config());

    let verifier: Arc<dyn CredentialVerifier> = match &args.verify_url {
        Some(url) => Arc::new(RemoteVerifier::new(url.clone(), args.upstream_timeout())?),
        None => {
            warn!("no identity provider configured, all credentials will be rejected");
            Arc::new(StaticVerifier::default())
        }
    };

    let services = GatewayServices {
        convention: Arc::new(HeaderConvention::bearer()),
        verifier,
        oplog: pipeline.log(),
        clock: Arc::new(AuditClock::new(args.service_id.clone())),
        counters: pipeline.counters(),
    };

    let mut module = NetworkModule::new(args.network_config(), services);
    let port = module.start().await?;
    info!(port, "gateway listening");

    module
        .serve(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    // Flush whatever the audit queue still holds before exiting.
    pipeline.stop().await;
    info!("gateway stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
