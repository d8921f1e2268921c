/*!
 * Per-unit pipeline behavior: retry budgets, repair bounds, terminology
 * consistency.
 */

use std::path::PathBuf;
use std::sync::Arc;

use latrans::pipeline::{CancelFlag, UnitPipeline};
use latrans::project::{TranslationUnit, UnitState};
use latrans::providers::mock::MockProvider;
use latrans::translation::TerminologyMap;

use crate::common::{init_test_logging, mock_service, test_config};

fn unit(content: &str) -> TranslationUnit {
    TranslationUnit::new(
        PathBuf::from("/tmp/proj/file.tex"),
        PathBuf::from("file.tex"),
        content.to_string(),
    )
}

#[tokio::test]
async fn test_pipeline_withAlwaysTransientProvider_shouldFailAfterExactBudget() {
    init_test_logging();
    let mut config = test_config();
    config.translation.common.retry_count = 4;

    let mock = MockProvider::transient();
    let counter = mock.call_counter();
    let pipeline = UnitPipeline::new(
        mock_service(mock, &config),
        Arc::new(TerminologyMap::default()),
        &config,
        CancelFlag::new(),
    );

    let mut u = unit("One prose paragraph.");
    let outcome = pipeline.process(&mut u).await;

    assert!(outcome.final_text.is_none());
    match &u.state {
        UnitState::Failed { cause } => {
            assert!(cause.contains("Transient collaborator error"), "{}", cause);
            assert!(cause.contains("4 attempts"), "{}", cause);
        }
        other => panic!("expected Failed, got {:?}", other),
    }
    // Exactly the configured budget of provider calls, not more
    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_pipeline_withUnfixableTranslations_shouldStopAtRepairBound() {
    let mut config = test_config();
    config.pipeline.max_repair_attempts = 2;

    let pipeline = UnitPipeline::new(
        mock_service(MockProvider::dropping_placeholders(), &config),
        Arc::new(TerminologyMap::default()),
        &config,
        CancelFlag::new(),
    );

    let mut u = unit("A paragraph holding $x^2$ math.");
    let outcome = pipeline.process(&mut u).await;

    assert!(outcome.final_text.is_none());
    match &u.state {
        UnitState::Failed { cause } => {
            assert!(cause.contains("Repair exhausted"), "{}", cause);
            assert!(cause.contains("2 attempts"), "{}", cause);
        }
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[test]
fn test_pipeline_withRecoverableDrop_shouldVerifyAfterOneRepair() {
    init_test_logging();
    let config = test_config();
    let pipeline = UnitPipeline::new(
        mock_service(MockProvider::drop_then_fix(), &config),
        Arc::new(TerminologyMap::default()),
        &config,
        CancelFlag::new(),
    );

    let mut u = unit("Prose around \\cite{adam} citation.");
    let outcome = tokio_test::block_on(pipeline.process(&mut u));

    assert_eq!(u.state, UnitState::Done);
    assert!(outcome.final_text.unwrap().contains("\\cite{adam}"));
}

#[tokio::test]
async fn test_pipeline_acrossUnits_shouldUseIdenticalTerminology() {
    let config = test_config();
    let mock = MockProvider::working();
    let request_log = mock.request_log();
    let service = mock_service(mock, &config);

    let mut terminology = TerminologyMap::default();
    terminology.insert("neural network", "réseau de neurones");
    let terminology = Arc::new(terminology);

    let pipeline = UnitPipeline::new(
        service,
        terminology.clone(),
        &config,
        CancelFlag::new(),
    );

    let mut first = unit("A neural network paragraph.");
    let mut second = unit("Another neural network result.");
    pipeline.process(&mut first).await;
    pipeline.process(&mut second).await;

    assert_eq!(first.state, UnitState::Done);
    assert_eq!(second.state, UnitState::Done);

    // Every translation request carried the same immutable terminology
    let seen = request_log.lock();
    assert_eq!(seen.len(), 2);
    let renderings: Vec<&str> = seen
        .iter()
        .map(|r| {
            let start = r.system.find("réseau de neurones").expect("term in prompt");
            &r.system[start..start + "réseau de neurones".len()]
        })
        .collect();
    assert!(renderings.iter().all(|r| *r == "réseau de neurones"));
    let systems: Vec<&String> = seen.iter().map(|r| &r.system).collect();
    assert_eq!(systems[0], systems[1]);
}

#[tokio::test]
async fn test_pipeline_failures_shouldBeIsolatedPerUnit() {
    // A budget of one attempt and a provider that fails exactly once:
    // the first unit fails, the second succeeds on the same pipeline.
    let mut strict = test_config();
    strict.translation.common.retry_count = 1;

    let mock = MockProvider::flaky(1);
    let pipeline = UnitPipeline::new(
        mock_service(mock, &strict),
        Arc::new(TerminologyMap::default()),
        &strict,
        CancelFlag::new(),
    );

    let mut failing = unit("First paragraph.");
    let mut succeeding = unit("Second paragraph.");
    pipeline.process(&mut failing).await;
    pipeline.process(&mut succeeding).await;

    assert!(matches!(failing.state, UnitState::Failed { .. }));
    assert_eq!(succeeding.state, UnitState::Done);
}
