//! # Native Function Registry
//!
//! Builds the script-facing API in two layers:
//! 1. raw native callables (`natives::register`);
//! 2. bootstrap fragments, each compiled into a static module of the same name.
//!
//! Fragment order is fixed. Module support comes before any fragment that
//! loads files (`fs`) and the `KeyboardKey` table comes last, before the entry
//! script. A fragment that fails to compile or evaluate aborts registration.

use super::natives;
use crate::backend::SharedBackend;
use crate::errors::FatalError;
use rhai::module_resolvers::FileModuleResolver;
use rhai::{Engine, Module, Scope};
use std::path::Path;
use tracing::{debug, instrument};

/// Script source installed as a static module.
#[derive(Copy, Clone, Debug)]
pub struct Fragment {
    pub name: &'static str,
    pub source: &'static str,
}

/// One step of the bootstrap sequence.
#[derive(Copy, Clone, Debug)]
pub enum BootstrapStep {
    Fragment(Fragment),
    /// Installs the file module resolver behind `import`.
    ModuleSupport,
}

const fn fragment(name: &'static str, source: &'static str) -> BootstrapStep {
    BootstrapStep::Fragment(Fragment { name, source })
}

pub const BOOTSTRAP: [BootstrapStep; 9] = [
    fragment("console", include_str!("bootstrap/console.rhai")),
    fragment("stacktrace", include_str!("bootstrap/stacktrace.rhai")),
    BootstrapStep::ModuleSupport,
    fragment("fs", include_str!("bootstrap/fs.rhai")),
    fragment("graphics", include_str!("bootstrap/graphics.rhai")),
    fragment("input", include_str!("bootstrap/input.rhai")),
    fragment("time", include_str!("bootstrap/time.rhai")),
    fragment("collision", include_str!("bootstrap/collision.rhai")),
    fragment("KeyboardKey", include_str!("bootstrap/keys.rhai")),
];

/// Installs the raw bindings, then runs every bootstrap step in order.
#[instrument(level = "debug", skip(engine, backend))]
pub fn register_all(
    engine: &mut Engine,
    backend: SharedBackend,
    module_root: &Path,
) -> Result<(), FatalError> {
    natives::register(engine, backend, module_root);
    run_steps(engine, &BOOTSTRAP, module_root)
}

pub(crate) fn run_steps(
    engine: &mut Engine,
    steps: &[BootstrapStep],
    module_root: &Path,
) -> Result<(), FatalError> {
    for step in steps {
        match step {
            BootstrapStep::Fragment(fragment) => install(engine, fragment)?,
            BootstrapStep::ModuleSupport => {
                engine.set_module_resolver(FileModuleResolver::new_with_path(module_root));
                debug!(root = %module_root.display(), "module resolver installed");
            }
        }
    }
    Ok(())
}

fn install(engine: &mut Engine, fragment: &Fragment) -> Result<(), FatalError> {
    let failed = |message: String| FatalError::Bootstrap {
        fragment: fragment.name,
        message,
    };

    let ast = engine
        .compile(fragment.source)
        .map_err(|e| failed(e.to_string()))?;
    let module =
        Module::eval_ast_as_new(Scope::new(), &ast, engine).map_err(|e| failed(e.to_string()))?;

    engine.register_static_module(fragment.name, module.into());
    debug!(fragment = fragment.name, "bootstrap fragment installed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn engine() -> Engine {
        let mut engine = Engine::new();
        let backend: SharedBackend = Rc::new(RefCell::new(HeadlessBackend::new()));
        let root = std::env::temp_dir();
        register_all(&mut engine, backend, &root).unwrap();
        engine
    }

    #[test]
    fn test_key_table_is_reachable() {
        let engine = engine();
        let w: rhai::INT = engine.eval("KeyboardKey::W").unwrap();
        let escape: rhai::INT = engine.eval("KeyboardKey::Escape").unwrap();
        assert_eq!(w, 87);
        assert_eq!(escape, 256);
    }

    #[test]
    fn test_namespaced_collision() {
        let engine = engine();
        let hit: bool = engine
            .eval(
                r#"collision::check_recs(#{x: 0, y: 0, width: 10, height: 10},
                                         #{x: 5, y: 5, width: 10, height: 10})"#,
            )
            .unwrap();
        assert!(hit);
    }

    #[test]
    fn test_broken_fragment_is_fatal() {
        let mut engine = Engine::new();
        let steps = [
            fragment("console", include_str!("bootstrap/console.rhai")),
            fragment("broken", "fn oops( {"),
            fragment("never", "fn later() { 1 }"),
        ];

        match run_steps(&mut engine, &steps, Path::new(".")) {
            Err(FatalError::Bootstrap { fragment, .. }) => assert_eq!(fragment, "broken"),
            other => panic!("expected a bootstrap failure, got {:?}", other),
        }
    }

    #[test]
    fn test_throwing_fragment_is_fatal() {
        let mut engine = Engine::new();
        let steps = [fragment("thrower", r#"throw "no";"#)];
        assert!(matches!(
            run_steps(&mut engine, &steps, Path::new(".")),
            Err(FatalError::Bootstrap { fragment: "thrower", .. })
        ));
    }
}
