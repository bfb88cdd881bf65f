use std::fs::OpenOptions;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use rpcbench_core::{RpcArg, RpcClient};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

/// One remote method plus fixed positional arguments, fanned out every round.
#[derive(Debug, Clone)]
pub struct Workload {
    pub method: String,
    pub args: Vec<RpcArg>,
}

#[derive(Debug, Error)]
#[error("invalid workload '{0}'; expected NAME or NAME=JSON_ARRAY")]
pub struct WorkloadParseError(String);

impl FromStr for Workload {
    type Err = WorkloadParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (method, args) = match s.split_once('=') {
            None => (s, vec![]),
            Some((method, raw)) => {
                let values: Vec<Value> = serde_json::from_str(raw)
                    .map_err(|_| WorkloadParseError(s.to_owned()))?;
                (method, values.into_iter().map(RpcArg::from).collect())
            }
        };
        if method.is_empty() {
            return Err(WorkloadParseError(s.to_owned()));
        }
        Ok(Workload {
            method: method.to_owned(),
            args,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BenchOptions {
    pub workloads: Vec<Workload>,
    pub start: usize,
    pub step: usize,
    pub max_rounds: Option<usize>,
    pub out_file: PathBuf,
}

/// One row of the results file.
#[derive(Debug, Serialize)]
struct BenchRecord {
    timestamp: String,
    status: &'static str,
    concurrent_calls: usize,
    calls_per_second: Option<f64>,
    detail: Option<String>,
}

impl BenchRecord {
    fn now(status: &'static str, concurrent_calls: usize) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            status,
            concurrent_calls,
            calls_per_second: None,
            detail: None,
        }
    }
}

/// Ramps up concurrency until a round fails, appending one CSV record per
/// round and a final summary with the largest fully successful round.
pub async fn run(
    root: &RpcClient,
    options: &BenchOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&options.out_file)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    let handles: Vec<(RpcClient, &Workload)> = options
        .workloads
        .iter()
        .map(|workload| (root.bind(&workload.method), workload))
        .collect();

    let mut concurrency = options.start;
    let mut max_successful = 0usize;
    let mut rounds = 0usize;

    loop {
        let total = concurrency * handles.len();
        let mut calls = Vec::with_capacity(total);
        for (handle, workload) in &handles {
            for _ in 0..concurrency {
                calls.push(handle.call(&workload.args));
            }
        }

        let started = Instant::now();
        let results = join_all(calls).await;
        let elapsed = started.elapsed();

        match results.into_iter().find_map(|r| r.err()) {
            None => {
                let calls_per_second = total as f64 / elapsed.as_secs_f64();
                info!(total, calls_per_second, "completed concurrent rpc calls");
                writer.serialize(BenchRecord {
                    calls_per_second: Some(calls_per_second),
                    ..BenchRecord::now("ok", total)
                })?;
                max_successful = total;
                concurrency += options.step;
            }
            Some(e) => {
                error!(total, %e, "failed round of concurrent rpc calls");
                writer.serialize(BenchRecord {
                    detail: Some(e.to_string()),
                    ..BenchRecord::now("error", total)
                })?;
                writer.flush()?;
                break;
            }
        }
        writer.flush()?;

        rounds += 1;
        if options.max_rounds.is_some_and(|max| rounds >= max) {
            info!(rounds, "stopping at round limit");
            break;
        }
    }

    info!(max_successful, "maximum successful concurrent rpc calls");
    writer.serialize(BenchRecord::now("summary", max_successful))?;
    writer.flush()?;
    Ok(())
}
