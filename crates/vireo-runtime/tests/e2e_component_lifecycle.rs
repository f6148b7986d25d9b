#![forbid(unsafe_code)]

//! End-to-end tests for a mounted component.
//!
//! Validates that:
//! 1. A write recomputes each dependent once, however often it read.
//! 2. Dependents recompute in registration order, each to completion.
//! 3. A burst of writes in one turn publishes once, with the last output.
//! 4. Writes separated by an idle turn publish separately.
//! 5. Computations read as unset before the first evaluation.
//! 6. The `created` hook sees every computation populated.
//! 7. The doubled/span scenarios and a missing target behave as documented.

use std::cell::RefCell;
use std::rc::Rc;

use vireo_core::{Document, MemoryTarget, Scheduler};
use vireo_runtime::{Component, Computations, Mounted, Scope, StateMap};

// ============================================================================
// Helpers
// ============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

type Log = Rc<RefCell<Vec<String>>>;

/// Counter component with `doubled` and a `<span>` render.
struct Counter {
    selector: &'static str,
    log: Log,
}

impl Counter {
    fn new(selector: &'static str) -> (Self, Log) {
        let log = Log::default();
        (
            Self {
                selector,
                log: Rc::clone(&log),
            },
            log,
        )
    }
}

impl Component for Counter {
    fn target(&self) -> &str {
        self.selector
    }

    fn initial_state(&self) -> StateMap {
        StateMap::new().with("count", 0i64)
    }

    fn computations(&self) -> Computations {
        let log = Rc::clone(&self.log);
        Computations::new().define("doubled", move |s: &Scope| {
            log.borrow_mut().push("doubled".into());
            s.read::<i64>("count").unwrap_or_default() * 2
        })
    }

    fn created(&self, scope: &Scope) {
        let doubled = scope.read::<i64>("doubled");
        let rendered = scope.read::<String>("render");
        self.log
            .borrow_mut()
            .push(format!("created doubled={doubled:?} render={rendered:?}"));
    }

    fn render(&self, scope: &Scope) -> String {
        self.log.borrow_mut().push("render".into());
        format!("<span>{}</span>", scope.read::<i64>("count").unwrap_or_default())
    }
}

struct Fixture {
    scheduler: Scheduler,
    doc: Document,
    target: Rc<MemoryTarget>,
}

impl Fixture {
    fn new(selector: &str) -> Self {
        init_tracing();
        let (scheduler, _clock) = Scheduler::lab();
        let doc = Document::new();
        let target = Rc::new(MemoryTarget::new());
        doc.attach(selector, target.clone());
        Self {
            scheduler,
            doc,
            target,
        }
    }

    fn mount<C: Component>(&self, component: C) -> Mounted<C> {
        Mounted::mount(component, &self.scheduler, Rc::new(self.doc.clone())).expect("mount")
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn scenario_a_doubled_tracks_count() {
    let fx = Fixture::new("#app");
    let (counter, _log) = Counter::new("#app");
    let mounted = fx.mount(counter);

    mounted.start_deferred().expect("start");
    fx.scheduler.run_microtasks();
    assert_eq!(mounted.scope().read::<i64>("doubled"), Some(0));

    mounted.scope().write("count", 5i64).expect("write");
    assert_eq!(mounted.scope().read::<i64>("doubled"), Some(10));
}

#[test]
fn scenario_b_span_published_after_timer() {
    let fx = Fixture::new("#app");
    let (counter, _log) = Counter::new("#app");
    let mounted = fx.mount(counter);
    mounted.start().expect("start");

    mounted.scope().write("count", 3i64).expect("write");
    fx.scheduler.run_until_idle();

    assert_eq!(fx.target.content().as_deref(), Some("<span>3</span>"));
}

#[test]
fn scenario_c_back_to_back_writes_publish_once() {
    let fx = Fixture::new("#app");
    let (counter, _log) = Counter::new("#app");
    let mounted = fx.mount(counter);
    mounted.start().expect("start");
    fx.scheduler.run_until_idle();
    let before = fx.target.replacements();

    mounted.scope().write("count", 1i64).expect("write");
    mounted.scope().write("count", 2i64).expect("write");
    fx.scheduler.run_until_idle();

    assert_eq!(fx.target.replacements(), before + 1);
    assert_eq!(fx.target.content().as_deref(), Some("<span>2</span>"));
}

#[test]
fn scenario_d_missing_target_is_silent() {
    let fx = Fixture::new("#elsewhere");
    let (counter, _log) = Counter::new("#missing");
    let mounted = fx.mount(counter);
    mounted.start().expect("start");

    mounted.scope().write("count", 9i64).expect("write");
    fx.scheduler.run_until_idle();

    assert_eq!(fx.target.replacements(), 0);
    assert_eq!(mounted.render_scheduler().publishes(), 0);
    assert_eq!(mounted.output().as_deref(), Some("<span>9</span>"));
}

#[test]
fn target_attached_after_mount_receives_output() {
    let fx = Fixture::new("#elsewhere");
    let (counter, _log) = Counter::new("#late");
    let mounted = fx.mount(counter);
    mounted.start().expect("start");

    let late = Rc::new(MemoryTarget::new());
    fx.doc.attach("#late", late.clone());
    fx.scheduler.run_until_idle();

    assert_eq!(late.content().as_deref(), Some("<span>0</span>"));
}

// ============================================================================
// Properties
// ============================================================================

/// Reads `x` three times per evaluation.
struct Greedy {
    evaluations: Rc<RefCell<u32>>,
}

impl Component for Greedy {
    fn target(&self) -> &str {
        "#greedy"
    }

    fn initial_state(&self) -> StateMap {
        StateMap::new().with("x", 1i64)
    }

    fn computations(&self) -> Computations {
        let evaluations = Rc::clone(&self.evaluations);
        Computations::new().define("cubed", move |s: &Scope| {
            *evaluations.borrow_mut() += 1;
            let x = || s.read::<i64>("x").unwrap_or_default();
            x() * x() * x()
        })
    }

    fn created(&self, _scope: &Scope) {}

    fn render(&self, _scope: &Scope) -> String {
        String::new()
    }
}

#[test]
fn p1_one_recomputation_per_write() {
    let fx = Fixture::new("#greedy");
    let evaluations = Rc::new(RefCell::new(0));
    let mounted = fx.mount(Greedy {
        evaluations: Rc::clone(&evaluations),
    });
    mounted.start().expect("start");
    assert_eq!(*evaluations.borrow(), 1);

    mounted.scope().write("x", 2i64).expect("write");
    assert_eq!(*evaluations.borrow(), 2);
    assert_eq!(mounted.scope().read::<i64>("cubed"), Some(8));

    let x = mounted.scope().cell::<i64>("x").expect("declared");
    assert_eq!(x.dependent_count(), 1);
}

/// Two dependents of `x`, both feeding render, logging entry and exit.
struct Ordered {
    log: Log,
}

impl Component for Ordered {
    fn target(&self) -> &str {
        "#ordered"
    }

    fn initial_state(&self) -> StateMap {
        StateMap::new().with("x", 0i64)
    }

    fn computations(&self) -> Computations {
        let (la, lb) = (Rc::clone(&self.log), Rc::clone(&self.log));
        Computations::new()
            .define("a", move |s: &Scope| {
                la.borrow_mut().push("a:start".into());
                let v = s.read::<i64>("x").unwrap_or_default() + 1;
                la.borrow_mut().push("a:end".into());
                v
            })
            .define("b", move |s: &Scope| {
                lb.borrow_mut().push("b:start".into());
                let v = s.read::<i64>("x").unwrap_or_default() + 2;
                lb.borrow_mut().push("b:end".into());
                v
            })
    }

    fn created(&self, _scope: &Scope) {}

    fn render(&self, scope: &Scope) -> String {
        self.log.borrow_mut().push("render".into());
        format!(
            "{}/{}",
            scope.read::<i64>("a").unwrap_or_default(),
            scope.read::<i64>("b").unwrap_or_default()
        )
    }
}

#[test]
fn p2_dependents_recompute_in_registration_order() {
    let fx = Fixture::new("#ordered");
    let log = Log::default();
    let mounted = fx.mount(Ordered {
        log: Rc::clone(&log),
    });
    mounted.start().expect("start");
    log.borrow_mut().clear();

    mounted.scope().write("x", 10i64).expect("write");

    // `a` finishes (and pushes into render) before `b` starts.
    assert_eq!(
        *log.borrow(),
        vec!["a:start", "a:end", "render", "b:start", "b:end", "render"]
    );
    assert_eq!(mounted.output().as_deref(), Some("11/12"));
}

#[test]
fn p3_burst_publishes_last_output_once() {
    let fx = Fixture::new("#app");
    let (counter, _log) = Counter::new("#app");
    let mounted = fx.mount(counter);
    mounted.start().expect("start");
    fx.scheduler.run_until_idle();
    let before = fx.target.replacements();

    for n in 1..=25i64 {
        mounted.scope().write("count", n).expect("write");
    }
    fx.scheduler.run_until_idle();

    assert_eq!(fx.target.replacements(), before + 1);
    assert_eq!(fx.target.content().as_deref(), Some("<span>25</span>"));
}

#[test]
fn p4_idle_turn_separates_publishes() {
    let fx = Fixture::new("#app");
    let (counter, _log) = Counter::new("#app");
    let mounted = fx.mount(counter);
    mounted.start().expect("start");
    fx.scheduler.run_until_idle();

    mounted.scope().write("count", 1i64).expect("write");
    fx.scheduler.run_until_idle();
    mounted.scope().write("count", 2i64).expect("write");
    fx.scheduler.run_until_idle();

    assert_eq!(
        fx.target.history(),
        vec!["<span>0</span>", "<span>1</span>", "<span>2</span>"]
    );
}

#[test]
fn p5_unset_before_first_evaluation() {
    let fx = Fixture::new("#app");
    let (counter, log) = Counter::new("#app");
    let mounted = fx.mount(counter);
    mounted.start_deferred().expect("start");

    assert_eq!(mounted.scope().read::<i64>("doubled"), None);
    assert_eq!(mounted.output(), None);
    assert!(log.borrow().is_empty());
}

#[test]
fn p6_hook_sees_populated_computations() {
    for deferred in [false, true] {
        let fx = Fixture::new("#app");
        let (counter, log) = Counter::new("#app");
        let mounted = fx.mount(counter);
        if deferred {
            mounted.start_deferred().expect("start");
            fx.scheduler.run_microtasks();
        } else {
            mounted.start().expect("start");
        }

        assert_eq!(
            *log.borrow(),
            vec![
                "doubled".to_string(),
                "render".to_string(),
                r#"created doubled=Some(0) render=Some("<span>0</span>")"#.to_string(),
            ],
            "deferred={deferred}"
        );
    }
}

#[test]
fn hook_can_install_interval_driving_state() {
    struct Ticker;

    impl Component for Ticker {
        fn target(&self) -> &str {
            "#ticks"
        }

        fn initial_state(&self) -> StateMap {
            StateMap::new().with("ticks", 0u32)
        }

        fn computations(&self) -> Computations {
            Computations::new()
        }

        fn created(&self, scope: &Scope) {
            let ticks = scope.cell::<u32>("ticks").expect("declared");
            scope
                .scheduler()
                .set_interval(vireo_core::Duration::from_secs(1), move || {
                    ticks.update(|t| *t += 1);
                });
        }

        fn render(&self, scope: &Scope) -> String {
            format!("ticks={}", scope.read::<u32>("ticks").unwrap_or_default())
        }
    }

    let fx = Fixture::new("#ticks");
    let mounted = fx.mount(Ticker);
    mounted.start().expect("start");
    fx.scheduler.run_for(vireo_core::Duration::from_millis(3500));

    assert_eq!(
        fx.target.history(),
        vec!["ticks=0", "ticks=1", "ticks=2", "ticks=3"]
    );
}

#[test]
fn components_are_independent() {
    let fx = Fixture::new("#one");
    let two = Rc::new(MemoryTarget::new());
    fx.doc.attach("#two", two.clone());

    let (c1, _) = Counter::new("#one");
    let (c2, _) = Counter::new("#two");
    let m1 = fx.mount(c1);
    let m2 = fx.mount(c2);
    m1.start().expect("start");
    m2.start().expect("start");

    m1.scope().write("count", 7i64).expect("write");
    fx.scheduler.run_until_idle();

    assert_eq!(fx.target.content().as_deref(), Some("<span>7</span>"));
    assert_eq!(two.content().as_deref(), Some("<span>0</span>"));
    assert_eq!(m2.scope().read::<i64>("doubled"), Some(0));
}
