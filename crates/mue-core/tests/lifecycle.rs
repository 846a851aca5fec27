//! Lifecycle Driver Tests
//!
//! Hook dispatch, configuration and failure handling against the headless backend.

use mue_core::backend::{DrawCommand, HeadlessBackend, SharedBackend};
use mue_core::errors::Stage;
use mue_core::lifecycle::BACKGROUND;
use mue_core::scripting::{EnvironmentOptions, Hook, ScriptEnvironment};
use mue_core::{BackendError, FatalError, Lifecycle, State, WindowConfig};
use rhai::{Array, Map, FLOAT};
use std::cell::RefCell;
use std::rc::Rc;

fn driver(frames: u64) -> (Lifecycle, Rc<RefCell<HeadlessBackend>>) {
    let backend = Rc::new(RefCell::new(HeadlessBackend::new().with_frame_limit(frames)));
    let shared: SharedBackend = backend.clone();
    let env = ScriptEnvironment::create(shared.clone(), &EnvironmentOptions::default())
        .expect("bootstrap");
    (Lifecycle::new(env, shared), backend)
}

fn state_field<T: Clone + 'static>(lifecycle: &Lifecycle, key: &str) -> T {
    let state = lifecycle.environment().state().read_lock::<Map>().unwrap();
    state[key].clone().cast::<T>()
}

#[test]
fn hookless_script_clears_every_frame() {
    let (mut lifecycle, backend) = driver(3);
    lifecycle.execute("let unused = 1;").unwrap();

    assert_eq!(lifecycle.state(), State::Terminated);
    assert_eq!(lifecycle.config(), &WindowConfig::default());
    assert_eq!(lifecycle.frames(), 3);

    let backend = backend.borrow();
    let window = backend.init_calls();
    assert_eq!(window, 1);
    assert_eq!(backend.target_fps(), 120);
    assert!(backend.window().is_none(), "window is closed on shutdown");
    for frame in backend.frames() {
        assert_eq!(frame.commands, vec![DrawCommand::Clear { color: BACKGROUND }]);
    }
    assert!(lifecycle.environment().is_released());
}

#[test]
fn setup_overrides_window_config() {
    let (mut lifecycle, backend) = driver(1);
    lifecycle
        .load(
            r#"
            fn setup(config) {
                #{ title: "demo", targetFps: 30, dimensions: #{ x: 320, y: 240 } }
            }
            "#,
        )
        .unwrap();
    lifecycle.configure().unwrap();

    assert_eq!(lifecycle.config(), &WindowConfig::new("demo", 30, 320.0, 240.0));
    let backend = backend.borrow();
    let window = backend.window().unwrap();
    assert_eq!((window.width, window.height), (320, 240));
    assert_eq!(window.title, "demo");
    assert_eq!(backend.target_fps(), 30);
}

#[test]
fn setup_receives_the_defaults() {
    let (mut lifecycle, _backend) = driver(1);
    lifecycle
        .load(
            r#"
            fn setup(config) {
                this.seen = `${config.title}:${config.targetFps}:${config.dimensions.x}`;
                config.title = "changed";
                config
            }
            "#,
        )
        .unwrap();
    lifecycle.configure().unwrap();

    assert_eq!(state_field::<String>(&lifecycle, "seen"), "window:120:800.0");
    assert_eq!(lifecycle.config().title.as_str(), "changed");
    assert_eq!(lifecycle.config().width(), 800);
}

#[test]
fn setup_returning_a_number_is_a_contract_violation() {
    let (mut lifecycle, backend) = driver(1);
    let err = lifecycle.execute("fn setup(config) { 42 }").unwrap_err();

    assert!(matches!(err, FatalError::ContractViolation { hook: "setup", .. }), "{err}");
    assert_eq!(lifecycle.state(), State::Terminated);
    assert_eq!(backend.borrow().init_calls(), 0, "no window before a valid config");
}

#[test]
fn partial_setup_result_zeroes_missing_fields() {
    let (mut lifecycle, backend) = driver(1);
    let err = lifecycle
        .execute(r#"fn setup(config) { #{ title: "half" } }"#)
        .unwrap_err();

    // Missing dimensions decode to 0x0, which no backend accepts.
    assert!(
        matches!(
            err,
            FatalError::Backend(BackendError::InvalidWindowSize {
                width: 0,
                height: 0
            })
        ),
        "{err}"
    );
    assert_eq!(backend.borrow().init_calls(), 1);
}

#[test]
fn update_receives_previous_frame_time() {
    let (mut lifecycle, _backend) = driver(3);
    lifecycle
        .load(
            r#"
            fn setup(config) { config.targetFps = 50; config }
            fn update(dt) {
                if this.dts == () { this.dts = []; }
                this.dts.push(dt);
            }
            "#,
        )
        .unwrap();
    lifecycle.configure().unwrap();
    lifecycle.run().unwrap();

    let dts: Vec<FLOAT> = state_field::<Array>(&lifecycle, "dts")
        .into_iter()
        .map(|dt| dt.as_float().unwrap())
        .collect();
    assert_eq!(dts.len(), 3);
    assert_eq!(dts[0], 0.0);
    assert!((dts[1] - 0.02).abs() < 1e-6);
    assert!((dts[2] - 0.02).abs() < 1e-6);
}

#[test]
fn draw_hook_runs_inside_the_frame() {
    let (mut lifecycle, backend) = driver(2);
    lifecycle
        .execute(
            r#"
            fn draw() {
                graphics::draw_rectangle(#{x: 0, y: 4}, #{x: 40, y: 40}, #{r: 255, g: 255, b: 255, a: 255});
            }
            "#,
        )
        .unwrap();

    let backend = backend.borrow();
    assert_eq!(backend.frames().len(), 2);
    for frame in backend.frames() {
        assert_eq!(frame.commands.len(), 2);
        assert_eq!(frame.commands[0], DrawCommand::Clear { color: BACKGROUND });
    }
    assert!(backend.stray_commands().is_empty());
}

#[test]
fn update_error_stops_the_loop() {
    let (mut lifecycle, backend) = driver(5);
    let err = lifecycle
        .execute(
            r#"
            fn update(dt) {
                this.frame = if this.frame == () { 1 } else { this.frame + 1 };
                if this.frame == 2 { throw "boom"; }
            }
            "#,
        )
        .unwrap_err();

    match err {
        FatalError::ScriptFault { stage, message } => {
            assert_eq!(stage, Stage::Hook(Hook::Update));
            assert!(message.contains("boom"), "{message}");
        }
        other => panic!("expected a script fault, got {other}"),
    }
    assert_eq!(lifecycle.state(), State::Terminated);
    assert_eq!(backend.borrow().frames_presented(), 1);
}

#[test]
fn draw_error_skips_presentation() {
    let (mut lifecycle, backend) = driver(5);
    let err = lifecycle.execute(r#"fn draw() { throw "bad draw"; }"#).unwrap_err();

    assert!(matches!(
        err,
        FatalError::ScriptFault {
            stage: Stage::Hook(Hook::Draw),
            ..
        }
    ));
    let backend = backend.borrow();
    assert_eq!(backend.frames_started(), 1);
    assert_eq!(backend.frames_presented(), 0);
}

#[test]
fn cleanup_runs_after_the_loop() {
    let (mut lifecycle, backend) = driver(2);
    lifecycle
        .execute(
            r#"
            fn cleanup() {
                graphics::draw_text("bye", #{x: 1, y: 2}, 10, #{r: 0, g: 0, b: 0, a: 255});
            }
            "#,
        )
        .unwrap();

    let backend = backend.borrow();
    assert_eq!(backend.stray_commands().len(), 1);
    assert!(backend.window().is_none());
}

#[test]
fn cleanup_error_is_fatal() {
    let (mut lifecycle, _backend) = driver(1);
    let err = lifecycle.execute(r#"fn cleanup() { throw "late"; }"#).unwrap_err();
    assert!(matches!(
        err,
        FatalError::ScriptFault {
            stage: Stage::Hook(Hook::Cleanup),
            ..
        }
    ));
    assert_eq!(lifecycle.state(), State::Terminated);
}

#[test]
fn wrong_hook_arity_is_a_contract_violation() {
    let (mut lifecycle, backend) = driver(3);
    let err = lifecycle.execute("fn draw(extra) { }").unwrap_err();

    assert!(matches!(err, FatalError::ContractViolation { hook: "draw", .. }), "{err}");
    assert_eq!(backend.borrow().frames_started(), 0);
}

#[test]
fn entry_script_errors_are_fatal() {
    let (mut lifecycle, backend) = driver(1);
    let err = lifecycle.execute("let x = ;").unwrap_err();
    assert!(matches!(
        err,
        FatalError::ScriptFault {
            stage: Stage::EntryScript,
            ..
        }
    ));

    let (mut lifecycle, _) = driver(1);
    assert!(lifecycle.execute(r#"throw "top level";"#).is_err());
    assert_eq!(backend.borrow().init_calls(), 0);
}

#[test]
fn steps_must_run_in_order() {
    let (mut lifecycle, _backend) = driver(1);
    match lifecycle.run() {
        Err(FatalError::InvalidTransition { step, state }) => {
            assert_eq!(step, "run");
            assert_eq!(state, "uninitialized");
        }
        other => panic!("expected an invalid transition, got {:?}", other),
    }
}

#[test]
fn held_keys_are_pressed_once() {
    let (mut lifecycle, backend) = driver(3);
    backend.borrow_mut().hold_key(87);
    lifecycle
        .load(
            r#"
            fn update(dt) {
                if this.pressed == () { this.pressed = 0; this.down = 0; }
                if input::is_key_pressed(KeyboardKey::W) { this.pressed += 1; }
                if input::is_key_down(KeyboardKey::W) { this.down += 1; }
            }
            "#,
        )
        .unwrap();
    lifecycle.configure().unwrap();
    lifecycle.run().unwrap();

    assert_eq!(state_field::<rhai::INT>(&lifecycle, "pressed"), 1);
    assert_eq!(state_field::<rhai::INT>(&lifecycle, "down"), 3);
}
