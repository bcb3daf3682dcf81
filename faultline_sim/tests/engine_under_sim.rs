//! Engine behavior observed through the simulation journal.

use faultline_core::{
    Anomaly, AnomalyEngine, AnomalyError, AnomalyRegistry, ExecutionPlan, FaultContext, LogLevel, RandomSource,
};
use faultline_sim::scenarios::ScenarioId;
use faultline_sim::{ScenarioRunner, SimContext, SimEvent};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn engine(seed: u64) -> (Arc<SimContext>, Arc<AnomalyRegistry>, AnomalyEngine<SimContext>) {
    let ctx = SimContext::shared(seed);
    let registry = AnomalyRegistry::shared();
    let engine = AnomalyEngine::with_rng(Arc::clone(&ctx), Arc::clone(&registry), RandomSource::seeded(seed));
    (ctx, registry, engine)
}

#[tokio::test]
async fn log_after_exception_still_runs_sequentially() {
    let (ctx, registry, engine) = engine(1);
    registry.register_anomaly(Anomaly::exception("/a"));
    registry.register_anomaly(Anomaly::log("/a", LogLevel::Warning, "still here"));

    let errors = engine.execute_sequentially("/a", false).await;

    assert_eq!(errors, vec![AnomalyError::anomalous("/a")]);
    assert_eq!(ctx.log_messages(), vec!["still here".to_string()]);
}

#[tokio::test]
async fn sequential_plan_aggregates_multiple_faults() {
    let (_ctx, registry, engine) = engine(2);
    registry.register_anomaly(Anomaly::exception("*"));
    registry.register_anomaly(Anomaly::exception("/a"));

    match engine.execute("/a", ExecutionPlan::sequential()).await {
        Err(AnomalyError::Aggregate(errors)) => {
            assert_eq!(errors[0], AnomalyError::anomalous("*"));
            assert_eq!(errors[1], AnomalyError::anomalous("/a"));
        }
        other => panic!("expected aggregate, got {:?}", other),
    }
}

#[tokio::test]
async fn parallel_failure_keeps_sibling_side_effects() {
    let (ctx, registry, engine) = engine(3);
    registry.register_anomaly(Anomaly::delay("/a", Duration::from_millis(15)));
    registry.register_anomaly(Anomaly::exception("/a"));
    registry.register_anomaly(Anomaly::log("/a", LogLevel::Information, "sibling"));

    let result = engine.execute_parallel("/a", false).await;

    assert_eq!(result, Err(AnomalyError::anomalous("/a")));
    assert_eq!(ctx.total_slept(), Duration::from_millis(15));
    assert_eq!(ctx.log_messages(), vec!["sibling".to_string()]);
}

#[tokio::test]
async fn parallel_delays_overlap_on_the_virtual_clock() {
    let (ctx, registry, engine) = engine(8);
    for _ in 0..3 {
        registry.register_anomaly(Anomaly::delay("/a", Duration::from_millis(60)));
    }

    engine.execute_parallel("/a", false).await.unwrap();

    assert_eq!(ctx.now(), Duration::from_millis(60));
    let journal = ctx.journal();
    assert_eq!(journal.len(), 3);
    for event in journal {
        assert!(matches!(event, SimEvent::Slept { at, .. } if at == Duration::ZERO), "{:?}", event);
    }
}

#[tokio::test]
async fn parallel_reports_first_failure_in_list_order() {
    let (_ctx, registry, engine) = engine(4);
    registry.register_anomaly(Anomaly::exception("*"));
    registry.register_anomaly(Anomaly::exception("/a"));

    let result = engine.execute_parallel("/a", false).await;
    assert_eq!(result, Err(AnomalyError::anomalous("*")));
}

#[tokio::test]
async fn empty_route_is_a_no_op() {
    let (ctx, _registry, engine) = engine(5);

    assert!(engine.execute_sequentially("/nothing", true).await.is_empty());
    assert!(engine.execute_parallel("/nothing", true).await.is_ok());
    assert!(ctx.journal().is_empty());
}

async fn shuffled_order(seed: u64) -> Vec<String> {
    let (ctx, registry, engine) = engine(seed);
    for label in ["a", "b", "c", "d", "e"] {
        registry.register_anomaly(Anomaly::log("/a", LogLevel::Debug, label));
    }
    for _ in 0..5 {
        engine.execute_sequentially("/a", true).await;
    }
    ctx.log_messages()
}

#[tokio::test]
async fn shuffled_order_is_reproducible_per_seed() {
    assert_eq!(shuffled_order(11).await, shuffled_order(11).await);
    assert_ne!(shuffled_order(11).await, shuffled_order(12).await);
}

#[tokio::test]
async fn delays_advance_the_virtual_clock_in_order() {
    let (ctx, registry, engine) = engine(6);
    registry.register_anomaly(Anomaly::delay("/a", Duration::from_millis(10)));
    registry.register_anomaly(Anomaly::delay("/a", Duration::from_millis(20)));

    engine.execute_sequentially("/a", false).await;

    assert_eq!(
        ctx.journal(),
        vec![
            SimEvent::Slept { at: Duration::ZERO, duration: Duration::from_millis(10) },
            SimEvent::Slept { at: Duration::from_millis(10), duration: Duration::from_millis(20) },
        ]
    );
}

#[tokio::test]
async fn every_drill_passes_for_a_fixed_seed() {
    let runner = ScenarioRunner::new(2024).with_requests(400);
    for scenario in ScenarioId::all() {
        let result = runner.run(scenario).await;
        assert!(result.passed, "{} failed: {:?}", scenario, result.failure_reason);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn sequential_fault_count_matches_exceptions(kinds in prop::collection::vec(0u8..3, 0..12)) {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        rt.block_on(async {
            let (ctx, registry, engine) = engine(9);
            for kind in &kinds {
                let anomaly = match kind {
                    0 => Anomaly::exception("/p"),
                    1 => Anomaly::log("/p", LogLevel::Information, "x"),
                    _ => Anomaly::delay("/p", Duration::from_millis(1)),
                };
                registry.register_anomaly(anomaly);
            }

            let errors = engine.execute_sequentially("/p", true).await;

            let expected_faults = kinds.iter().filter(|k| **k == 0).count();
            prop_assert_eq!(errors.len(), expected_faults);
            prop_assert_eq!(ctx.journal_len(), kinds.len() - expected_faults);
            Ok(())
        })?;
    }
}
