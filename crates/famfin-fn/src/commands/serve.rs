//! `famfin-fn serve`: the bridge behind a local HTTP trigger.

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use anyhow::Context;
use famfin_trigger::{Bridge, HttpTrigger};
use tokio::sync::watch;
use tracing::info;

pub fn run(bridge: Bridge, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = resolve_addr(host, port)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    runtime.block_on(async move {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // Graceful shutdown on Ctrl-C.
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
        });

        HttpTrigger::new(addr, Arc::new(bridge))
            .serve(shutdown_rx)
            .await
    })?;

    info!("famfin-fn stopped");
    Ok(())
}

fn resolve_addr(host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()
        .with_context(|| format!("invalid bind address {host}:{port}"))?
        .next()
        .with_context(|| format!("{host} did not resolve to an address"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_literal_address() {
        let addr = resolve_addr("127.0.0.1", 8000).unwrap();
        assert_eq!(addr, "127.0.0.1:8000".parse().unwrap());
    }

    #[test]
    fn rejects_garbage_host() {
        assert!(resolve_addr("not a host", 80).is_err());
    }
}
