//! Flush coordination
//!
//! Broadcasts a deliver-and-drain request to every traced node, then
//! drains local buffering. Flush is advisory: it raises confidence that
//! generated events have been written, but guarantees nothing for a sink
//! that does not acknowledge delivery. Accordingly every per-node
//! failure is swallowed and the caller always sees success.

use crate::debug::ControlDebug;
use crate::protocol::{request_named, Reply, Request};
use adapters_runtime::{Cluster, NodeEngine};
use entities_terms::NodeName;
use std::sync::Arc;
use std::thread;

/// Drain trace output across the traced cluster, best effort
///
/// Obtains the traced-node set through the control protocol (an
/// unreachable control process reads as an empty set), scatters the
/// per-node drains over a bounded pool of worker threads, waits for all
/// of them, then drains the local engine. Single-node setups skip
/// straight to the local drain.
pub fn flush(control_name: &str, cluster: &Arc<Cluster>, local: &Arc<NodeEngine>) {
    let nodes = match request_named(control_name, Request::GetNodes) {
        Ok(Reply::Nodes(nodes)) => nodes,
        _ => Vec::new(),
    };

    if !nodes.is_empty() {
        scatter_drains(cluster, nodes);
    }

    if let Err(reason) = local.drain() {
        ControlDebug::log(&format!("local drain failed: {}", reason));
    }
}

fn scatter_drains(cluster: &Arc<Cluster>, nodes: Vec<NodeName>) {
    let workers = num_cpus::get().clamp(1, nodes.len());
    let mut shards: Vec<Vec<NodeName>> = vec![Vec::new(); workers];
    for (i, node) in nodes.into_iter().enumerate() {
        shards[i % workers].push(node);
    }

    let mut handles = Vec::with_capacity(workers);
    for (i, shard) in shards.into_iter().enumerate() {
        let cluster = Arc::clone(cluster);
        let spawned = thread::Builder::new()
            .name(format!("trace_flush_{}", i + 1))
            .spawn(move || {
                for node in shard {
                    match cluster.get(&node) {
                        Some(engine) => {
                            if let Err(reason) = engine.drain() {
                                ControlDebug::log(&format!(
                                    "drain on {} failed: {}",
                                    node, reason
                                ));
                            }
                        }
                        None => ControlDebug::log(&format!("drain skipped, {} is gone", node)),
                    }
                }
            });
        if let Ok(handle) = spawned {
            handles.push(handle);
        }
    }
    for handle in handles {
        let _ = handle.join();
    }
}
