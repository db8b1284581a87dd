use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use memfuse_backend_eager::{EagerAot, EagerBackend};
use memfuse_core::{
    AotCompiler, AotRequest, CallArgs, DType, Forward, Module, Shape, Signature, StaticRank,
    Tensor, Value,
};
use memfuse_engine::{CompilationCache, FusionEngine};
use tracing_test::traced_test;

const NEW_GRAPH: &str = "[MemoryEfficientFusion] Compiling new graph for";

/// Passes when exactly `expected` new-graph lines were logged in this test.
fn new_graph_lines(expected: usize) -> impl Fn(&[&str]) -> std::result::Result<(), String> {
    move |lines: &[&str]| {
        let found = lines.iter().filter(|l| l.contains(NEW_GRAPH)).count();
        if found == expected {
            Ok(())
        } else {
            Err(format!("expected {expected} new-graph lines, found {found}"))
        }
    }
}

fn t(dims: &[usize]) -> Tensor {
    Tensor::zeros(DType::F32, Shape::from_slice(dims))
}

/// `forward(x, y, alpha=1.0)`; returns `x` and counts invocations.
fn add_module(calls: Arc<AtomicUsize>) -> Module {
    let signature = Signature::new(["x", "y", "alpha"]);
    Module::new("add", signature, move |args: CallArgs| -> Result<Value> {
        calls.fetch_add(1, Ordering::SeqCst);
        ensure_keyword_only(&args)?;
        let x = args.get_kwarg("x").context("x not forwarded")?;
        args.get_kwarg("y").context("y not forwarded")?;
        if args.get_kwarg("alpha").is_some() {
            bail!("scalar alpha should have been dropped");
        }
        Ok(x.clone())
    })
}

fn ensure_keyword_only(args: &CallArgs) -> Result<()> {
    if !args.positional.is_empty() {
        bail!("compiled forward received positional args");
    }
    Ok(())
}

fn eager_engine(module: Module, aot: Arc<EagerAot>) -> FusionEngine {
    FusionEngine::new(
        module,
        aot,
        Arc::new(EagerBackend::new()),
        Arc::new(EagerBackend::new()),
    )
}

fn out_dims(value: &Value) -> Option<Vec<usize>> {
    value.as_tensor().map(|t| t.shape().dims().to_vec())
}

#[test]
#[traced_test]
fn logs_once_per_distinct_shape_but_compiles_every_call() -> Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let aot = Arc::new(EagerAot::new());
    let mut engine = eager_engine(add_module(Arc::clone(&calls)), Arc::clone(&aot));
    engine.fuse();

    let outputs = vec![
        engine.forward(CallArgs::new().arg(t(&[4, 4])).arg(t(&[4, 4])))?,
        engine.forward(CallArgs::new().arg(t(&[4, 4])).arg(t(&[4, 4])))?,
        engine.forward(CallArgs::new().arg(t(&[8, 8])).arg(t(&[8, 8])))?,
    ];

    logs_assert(new_graph_lines(2));
    logs_assert(|lines: &[&str]| {
        let logged: Vec<&&str> = lines.iter().filter(|l| l.contains(NEW_GRAPH)).collect();
        match logged.as_slice() {
            [first, second]
                if first.contains("{'x': Size(4, 4), 'y': Size(4, 4)}")
                    && second.contains("{'x': Size(8, 8), 'y': Size(8, 8)}") =>
            {
                Ok(())
            }
            other => Err(format!("unexpected new-graph lines: {other:?}")),
        }
    });

    assert_eq!(aot.compile_count(), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(engine.cache().len(), 2);
    assert_eq!(out_dims(&outputs[2]), Some(vec![8, 8]));
    Ok(())
}

#[test]
fn scalars_and_keyword_mix_are_reduced_to_tensors() -> Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let aot = Arc::new(EagerAot::new());
    let mut engine = eager_engine(add_module(Arc::clone(&calls)), aot);
    engine.fuse();

    let out = engine.forward(
        CallArgs::new()
            .arg(t(&[2, 3]))
            .kwarg("y", t(&[2, 3]))
            .kwarg("alpha", 0.5),
    )?;
    assert_eq!(out_dims(&out), Some(vec![2, 3]));

    let out = engine.forward(CallArgs::new().arg(t(&[2, 3])).arg(t(&[2, 3])).arg(2.0))?;
    assert_eq!(out_dims(&out), Some(vec![2, 3]));

    // Same tensors either way, so only one shape was ever new.
    assert_eq!(engine.cache().len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[test]
fn dtype_change_is_a_new_shape() -> Result<()> {
    let aot = Arc::new(EagerAot::new());
    let mut engine = eager_engine(add_module(Arc::new(AtomicUsize::new(0))), aot);
    engine.fuse();

    let half = |dims: &[usize]| Tensor::zeros(DType::F16, Shape::from_slice(dims));
    engine.forward(CallArgs::new().arg(t(&[4])).arg(t(&[4])))?;
    engine.forward(CallArgs::new().arg(half(&[4])).arg(half(&[4])))?;
    engine.forward(CallArgs::new().arg(t(&[4])).arg(t(&[4])).kwarg("alpha", 3i64))?;

    assert_eq!(engine.cache().len(), 2);
    Ok(())
}

#[test]
#[traced_test]
fn follower_rank_stays_quiet_but_still_tracks_shapes() -> Result<()> {
    let aot = Arc::new(EagerAot::new());
    let mut engine = eager_engine(add_module(Arc::new(AtomicUsize::new(0))), Arc::clone(&aot))
        .with_coordinator(StaticRank::new(1, 2));
    engine.fuse();

    engine.forward(CallArgs::new().arg(t(&[4, 4])).arg(t(&[4, 4])))?;

    assert!(!logs_contain(NEW_GRAPH));
    assert_eq!(engine.cache().len(), 1);
    assert_eq!(aot.compile_count(), 1);
    Ok(())
}

#[test]
#[traced_test]
fn shared_cache_spans_engines() -> Result<()> {
    let cache = Arc::new(CompilationCache::new());
    let aot = Arc::new(EagerAot::new());
    let mut first = eager_engine(add_module(Arc::new(AtomicUsize::new(0))), Arc::clone(&aot))
        .with_cache(Arc::clone(&cache));
    let mut second = eager_engine(add_module(Arc::new(AtomicUsize::new(0))), Arc::clone(&aot))
        .with_cache(Arc::clone(&cache));
    first.fuse();
    second.fuse();

    first.forward(CallArgs::new().arg(t(&[4, 4])).arg(t(&[4, 4])))?;
    second.forward(CallArgs::new().arg(t(&[4, 4])).arg(t(&[4, 4])))?;

    logs_assert(new_graph_lines(1));
    assert_eq!(cache.len(), 1);
    Ok(())
}

#[test]
fn separate_engines_do_not_share_by_default() -> Result<()> {
    let aot = Arc::new(EagerAot::new());
    let mut first = eager_engine(add_module(Arc::new(AtomicUsize::new(0))), Arc::clone(&aot));
    let mut second = eager_engine(add_module(Arc::new(AtomicUsize::new(0))), aot);
    first.fuse();
    second.fuse();

    first.forward(CallArgs::new().arg(t(&[4, 4])).arg(t(&[4, 4])))?;
    second.forward(CallArgs::new().arg(t(&[4, 4])).arg(t(&[4, 4])))?;

    assert_eq!(first.cache().len(), 1);
    assert_eq!(second.cache().len(), 1);
    Ok(())
}

#[test]
#[traced_test]
fn fusing_twice_nests_dispatch() -> Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let aot = Arc::new(EagerAot::new());
    let mut engine = eager_engine(add_module(Arc::clone(&calls)), Arc::clone(&aot));
    engine.fuse();
    engine.fuse();
    assert_eq!(engine.module().wrap_depth(), 2);

    engine.forward(CallArgs::new().arg(t(&[4, 4])).arg(t(&[4, 4])))?;

    // Outer layer compiles the inner dispatcher, inner layer compiles the original.
    assert_eq!(aot.compile_count(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    // Both layers see the same shape, so only the outer one finds it new.
    logs_assert(new_graph_lines(1));
    assert_eq!(engine.cache().len(), 1);
    Ok(())
}

#[derive(Debug)]
struct BackendRejected(&'static str);

impl std::fmt::Display for BackendRejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "backend rejected graph: {}", self.0)
    }
}

impl std::error::Error for BackendRejected {}

struct FailingAot {
    attempts: AtomicUsize,
}

impl AotCompiler for FailingAot {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn compile(
        &self,
        _forward: Arc<dyn Forward>,
        _request: &AotRequest,
    ) -> Result<Arc<dyn Forward>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(BackendRejected("aten.unknown_op").into())
    }
}

#[test]
fn compile_failure_propagates_without_retry() {
    let calls = Arc::new(AtomicUsize::new(0));
    let aot = Arc::new(FailingAot {
        attempts: AtomicUsize::new(0),
    });
    let mut engine = FusionEngine::new(
        add_module(Arc::clone(&calls)),
        Arc::clone(&aot) as Arc<dyn AotCompiler>,
        Arc::new(EagerBackend::new()),
        Arc::new(EagerBackend::new()),
    );
    engine.fuse();

    let err = engine
        .forward(CallArgs::new().arg(t(&[4, 4])).arg(t(&[4, 4])))
        .err()
        .expect("compile should fail");

    assert_eq!(err.to_string(), "backend rejected graph: aten.unknown_op");
    assert!(err.downcast_ref::<BackendRejected>().is_some());
    assert_eq!(aot.attempts.load(Ordering::SeqCst), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    // Novelty was recorded before the compile attempt.
    assert_eq!(engine.cache().len(), 1);
}

#[test]
fn unfused_module_calls_original_directly() -> Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let aot = Arc::new(EagerAot::new());
    let engine = eager_engine(add_module(Arc::clone(&calls)), Arc::clone(&aot));

    let out = engine.forward(
        CallArgs::new()
            .kwarg("x", t(&[1]))
            .kwarg("y", t(&[1])),
    )?;
    assert_eq!(out_dims(&out), Some(vec![1]));
    assert_eq!(aot.compile_count(), 0);
    assert!(engine.cache().is_empty());
    assert_eq!(engine.module().wrap_depth(), 0);
    Ok(())
}
