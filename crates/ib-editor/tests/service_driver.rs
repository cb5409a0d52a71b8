//! Integration tests: async driver over a scripted idea service (ib-editor).

use ib_core::NodeKind;
use ib_editor::{
    CanvasEngine, CombineResponse, ExpandResponse, IdeaService, Outcome, ServiceError, TopicsResponse, drive,
};
use pretty_assertions::assert_eq;
use std::cell::{Cell, RefCell};

/// Answers from fixed tables; counts calls.
#[derive(Default)]
struct ScriptedService {
    fail: bool,
    calls: Cell<usize>,
}

impl ScriptedService {
    fn answer<T>(&self, value: T) -> Result<T, ServiceError> {
        self.calls.set(self.calls.get() + 1);
        if self.fail {
            Err(ServiceError::Unavailable("scripted outage".into()))
        } else {
            Ok(value)
        }
    }
}

impl IdeaService for ScriptedService {
    async fn combine(&self, text1: &str, text2: &str, _context: Option<&str>) -> Result<CombineResponse, ServiceError> {
        tokio::task::yield_now().await;
        self.answer(CombineResponse {
            combined_topic: format!("{text1} + {text2}"),
        })
    }

    async fn expand(&self, text: &str, _context: Option<&str>) -> Result<ExpandResponse, ServiceError> {
        tokio::task::yield_now().await;
        self.answer(ExpandResponse {
            expansions: (1..=3).map(|i| format!("{text}.{i}")).collect(),
        })
    }

    async fn generate_topics(&self, context: &str) -> Result<TopicsResponse, ServiceError> {
        tokio::task::yield_now().await;
        self.answer(TopicsResponse {
            topics: vec![format!("{context}: pricing"), format!("{context}: location"), format!("{context}: staff")],
        })
    }
}

fn clock() -> f64 {
    0.0
}

fn engine() -> RefCell<CanvasEngine> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut engine = CanvasEngine::default();
    engine.set_use_case("Bakery").unwrap();
    RefCell::new(engine)
}

#[tokio::test]
async fn drive_generates_then_combines_and_expands() {
    let engine = engine();
    let service = ScriptedService::default();

    engine.borrow_mut().request_generation(0.0).unwrap();
    assert_eq!(drive(&engine, &service, &clock).await, vec![Outcome::Applied]);

    let topics: Vec<_> = engine
        .borrow()
        .graph()
        .nodes()
        .into_iter()
        .filter(|n| n.kind == NodeKind::Topic)
        .map(|n| n.id)
        .collect();
    assert_eq!(topics.len(), 3);

    {
        let mut e = engine.borrow_mut();
        e.request_combine(topics[0], topics[1], 1.0).unwrap();
        e.request_expand(topics[2], 1.0).unwrap();
    }
    assert_eq!(
        drive(&engine, &service, &clock).await,
        vec![Outcome::Applied, Outcome::Applied]
    );
    assert_eq!(service.calls.get(), 3);

    let e = engine.borrow();
    let g = e.graph();
    assert!(g.nodes().iter().any(|n| n.text == "Bakery: pricing + Bakery: location"));
    assert_eq!(g.expansions_of(topics[2]).len(), 3);
    assert!(e.in_flight().next().is_none());
}

#[tokio::test]
async fn drive_reports_failures_and_releases_locks() {
    let engine = engine();
    let service = ScriptedService {
        fail: true,
        ..Default::default()
    };
    let before = engine.borrow().snapshot();

    engine.borrow_mut().request_generation(0.0).unwrap();
    assert_eq!(drive(&engine, &service, &clock).await, vec![Outcome::Failed]);

    let e = engine.borrow();
    assert_eq!(e.snapshot(), before);
    assert_eq!(e.notices().len(), 1);
    assert!(e.in_flight().next().is_none());
}

#[tokio::test]
async fn drive_with_empty_outbox_does_nothing() {
    let engine = engine();
    let service = ScriptedService::default();
    assert!(drive(&engine, &service, &clock).await.is_empty());
    assert_eq!(service.calls.get(), 0);
}
