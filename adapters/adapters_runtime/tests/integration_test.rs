//! Integration tests for the adapters_runtime crate
//!
//! These tests drive a small cluster of engines the way the control
//! process does: flags, filters, recorded calls and drains.

use adapters_runtime::{Cluster, NodeEngine, TraceSink};
use adapters_resolution::RemoteLookup;
use entities_terms::Term;
use entities_trace::{CallTarget, FlagTarget, MatchClause, TraceFlag};
use infrastructure_pattern_store::codec::next_frame;
use std::sync::Arc;

#[test]
fn test_two_node_filter_and_drain() {
    let cluster = Cluster::new();
    let alpha = Arc::new(NodeEngine::new("alpha@host"));
    let beta = Arc::new(NodeEngine::new("beta@host"));
    alpha.define_module("lists", &[("map", 2)]);
    beta.define_module("lists", &[("map", 2), ("seq", 2)]);
    cluster.add(Arc::clone(&alpha)).unwrap();
    cluster.add(Arc::clone(&beta)).unwrap();

    let program = vec![MatchClause::wildcard(vec![])];
    assert_eq!(alpha.install(&CallTarget::module("lists"), program.clone(), false), 1);
    assert_eq!(beta.install(&CallTarget::module("lists"), program, false), 2);

    let pid = beta.spawn_proc();
    beta.apply_flags(&FlagTarget::One(pid.clone()), &[TraceFlag::Call])
        .unwrap();
    assert!(beta.record_call(&pid, "lists", "seq", &[Term::int(1), Term::int(3)]));

    let (sink, buffer) = TraceSink::memory();
    beta.set_sink(Some(sink));
    assert_eq!(beta.drain().unwrap(), 1);

    let bytes = buffer.lock().unwrap().clone();
    let mut index = 0;
    let event = next_frame(&bytes, &mut index).unwrap().unwrap();
    let parts = event.as_tuple().unwrap();
    assert!(parts[0].is_atom("trace"));
    assert!(parts[2].is_atom("call"));
}

#[test]
fn test_cluster_is_the_remote_lookup_transport() {
    let cluster = Cluster::new();
    let beta = Arc::new(NodeEngine::new("beta@host"));
    let pid = beta.spawn_proc();
    beta.registry().register("worker", pid.clone()).unwrap();
    cluster.add(beta).unwrap();

    assert_eq!(
        cluster.whereis_on(&"beta@host".to_string(), "worker"),
        Ok(Some(pid))
    );
    assert!(cluster.whereis_on(&"gone@host".to_string(), "worker").is_err());
}

#[test]
fn test_spawn_inheritance_across_flag_classes() {
    let engine = NodeEngine::new("alpha@host");
    engine
        .apply_flags(&FlagTarget::New, &[TraceFlag::Send, TraceFlag::Timestamp])
        .unwrap();
    let pid = engine.spawn_proc();
    let flags = engine.proc_flags(&pid).unwrap();
    assert_eq!(flags, vec![TraceFlag::Send, TraceFlag::Timestamp]);

    engine.clear_flags(&FlagTarget::All).unwrap();
    let fresh = engine.spawn_proc();
    assert_eq!(engine.proc_flags(&fresh), Some(vec![]));
}
