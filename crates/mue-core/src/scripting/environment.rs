//! # Script Environment
//!
//! The single owned scripting runtime: engine, bindings, entry script and the
//! state object hooks share between calls.

use super::hooks::{BoundHook, Hook};
use super::registry;
use crate::backend::SharedBackend;
use crate::errors::{FatalError, Stage};
use rhai::{CallFnOptions, Dynamic, Engine, FuncArgs, Map, Scope, AST};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info, instrument};

/// Engine limits and the root for `import` and `Mue_Read`.
#[derive(Clone, Debug)]
pub struct EnvironmentOptions {
    pub module_root: PathBuf,
    /// Maximum function call depth. `0` keeps the engine default.
    pub max_call_levels: usize,
    /// Maximum operations per evaluation or hook call. `0` is unlimited.
    pub max_operations: u64,
}

impl Default for EnvironmentOptions {
    fn default() -> Self {
        Self {
            module_root: PathBuf::from("."),
            max_call_levels: 0,
            max_operations: 0,
        }
    }
}

pub struct ScriptEnvironment {
    engine: Engine,
    scope: Scope<'static>,
    ast: AST,
    /// Bound as `this` in every hook call.
    state: Dynamic,
    released: bool,
}

impl ScriptEnvironment {
    /// Builds the engine and runs the registry. Bootstrap failures are fatal.
    #[instrument(level = "debug", skip(backend))]
    pub fn create(
        backend: SharedBackend,
        options: &EnvironmentOptions,
    ) -> Result<Self, FatalError> {
        let mut engine = Engine::new();
        if options.max_call_levels > 0 {
            engine.set_max_call_levels(options.max_call_levels);
        }
        engine.set_max_operations(options.max_operations);

        engine.on_print(|text| {
            let _ = writeln!(std::io::stdout().lock(), "{text}");
        });
        engine.on_debug(|text, source, pos| {
            debug!(target: "mue::script", source = source.unwrap_or("?"), %pos, "{text}");
        });

        registry::register_all(&mut engine, backend, &options.module_root)?;

        Ok(Self {
            engine,
            scope: Scope::new(),
            ast: AST::empty(),
            state: Dynamic::from(Map::new()),
            released: false,
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Compiles and runs the entry script once, keeping its functions for hook calls.
    #[instrument(level = "debug", skip(self, source))]
    pub fn evaluate(&mut self, source: &str, name: &str) -> Result<(), FatalError> {
        self.ensure_live()?;
        let mut ast = self
            .engine
            .compile(source)
            .map_err(|e| FatalError::from_script(Stage::EntryScript, e.into()))?;
        ast.set_source(name);

        self.engine
            .run_ast_with_scope(&mut self.scope, &ast)
            .map_err(|e| FatalError::from_script(Stage::EntryScript, e))?;

        info!(script = name, functions = ast.iter_functions().count(), "entry script evaluated");
        self.ast = ast;
        Ok(())
    }

    /// Finds the script definition of `hook`, preferring the expected arity
    /// when the name is overloaded.
    pub fn lookup(&self, hook: Hook) -> Option<BoundHook> {
        let mut arities = self
            .ast
            .iter_functions()
            .filter(|f| f.name == hook.name())
            .map(|f| f.params.len())
            .collect::<Vec<_>>();
        if arities.is_empty() {
            return None;
        }
        if arities.contains(&hook.arity()) {
            arities = vec![hook.arity()];
        }
        Some(BoundHook {
            hook,
            declared_arity: arities[0],
        })
    }

    /// Calls a hook with `this` bound to the shared state object.
    pub fn call(&mut self, bound: &BoundHook, args: impl FuncArgs) -> Result<Dynamic, FatalError> {
        self.ensure_live()?;
        let options = CallFnOptions::new()
            .eval_ast(false)
            .rewind_scope(true)
            .bind_this_ptr(&mut self.state);

        self.engine
            .call_fn_with_options::<Dynamic>(
                options,
                &mut self.scope,
                &self.ast,
                bound.hook.name(),
                args,
            )
            .map_err(|e| FatalError::from_script(Stage::Hook(bound.hook), e))
    }

    /// The object hooks see as `this`.
    pub fn state(&self) -> &Dynamic {
        &self.state
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Drops the entry script and all script-held values. Idempotent.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.scope.clear();
        self.ast = AST::empty();
        self.state = Dynamic::UNIT;
        debug!("script environment released");
    }

    fn ensure_live(&self) -> Result<(), FatalError> {
        if self.released {
            return Err(FatalError::EnginePanic {
                message: "script environment already released".into(),
            });
        }
        Ok(())
    }
}

impl Drop for ScriptEnvironment {
    fn drop(&mut self) {
        self.release();
    }
}
