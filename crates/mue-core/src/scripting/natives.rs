//! # Native Callables
//!
//! The raw bindings installed into the global namespace. Bootstrap fragments
//! re-export them under `fs::`, `graphics::`, `input::`, `time::` and `collision::`;
//! scripts are not expected to call them by these names.
//!
//! ## Pattern
//! Every binding goes through `expose`: the `Signature` is checked first, so a
//! mismatch raises a catchable error before any codec or backend call runs.
//! Backend borrows last for a single call and never span a hook invocation.

use super::codec::{to_number, to_text, Category, ScriptCodec};
use super::validator::Signature;
use crate::backend::SharedBackend;
use crate::errors::BridgeError;
use crate::types::{Color, Rectangle, Vector2D};
use rhai::{Dynamic, Engine, EvalAltResult, FLOAT, INT};
use std::any::TypeId;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

type NativeResult = Result<Dynamic, Box<EvalAltResult>>;

/// Largest argument count accepted by `Mue_Print`.
pub const PRINT_MAX_ARGS: usize = 8;

pub const PRINT: &str = "Mue_Print";

pub const READ: Signature = Signature::new("Mue_Read", &[Category::String]);
pub const DRAW_RECTANGLE: Signature = Signature::new(
    "Mue_Graphics_DrawRectangle",
    &[Category::Object, Category::Object, Category::Object],
);
pub const DRAW_TEXT: Signature = Signature::new(
    "Mue_Graphics_DrawText",
    &[
        Category::String,
        Category::Object,
        Category::Number,
        Category::Object,
    ],
);
pub const MEASURE_TEXT: Signature = Signature::new(
    "Mue_Graphics_MeasureText",
    &[Category::String, Category::Number],
);
pub const IS_KEY_PRESSED: Signature = Signature::new("Mue_Input_IsKeyPressed", &[Category::Number]);
pub const IS_KEY_DOWN: Signature = Signature::new("Mue_Input_IsKeyDown", &[Category::Number]);
pub const IS_KEY_UP: Signature = Signature::new("Mue_Input_IsKeyUp", &[Category::Number]);
pub const CHECK_RECS: Signature = Signature::new(
    "Mue_Collision_CheckRecs",
    &[Category::Object, Category::Object],
);
pub const GET_COLLISION_REC: Signature = Signature::new(
    "Mue_Collision_GetCollisionRec",
    &[Category::Object, Category::Object],
);
pub const GET_TIME: Signature = Signature::new("Mue_Time_GetTime", &[]);

/// Every checked binding, in registration order.
pub const SIGNATURES: [Signature; 10] = [
    READ,
    DRAW_RECTANGLE,
    DRAW_TEXT,
    MEASURE_TEXT,
    IS_KEY_PRESSED,
    IS_KEY_DOWN,
    IS_KEY_UP,
    CHECK_RECS,
    GET_COLLISION_REC,
    GET_TIME,
];

/// Registers `body` under `signature.name`, guarded by `signature.check`.
#[allow(deprecated)]
fn expose<F>(engine: &mut Engine, signature: Signature, body: F)
where
    F: Fn(&mut [&mut Dynamic]) -> NativeResult + 'static,
{
    engine.register_raw_fn(
        signature.name,
        signature.arg_types(),
        move |_ctx, args| {
            signature.check(args)?;
            body(args)
        },
    );
}

/// Installs every raw binding. Relative `Mue_Read` paths resolve against `root`.
pub fn register(engine: &mut Engine, backend: SharedBackend, root: &Path) {
    register_print(engine);
    register_read(engine, root.to_path_buf());
    register_graphics(engine, &backend);
    register_input(engine, &backend);
    register_collision(engine);
    register_time(engine, &backend);
    debug!(count = SIGNATURES.len() + 1, "native callables registered");
}

#[allow(deprecated)]
fn register_print(engine: &mut Engine) {
    for arity in 0..=PRINT_MAX_ARGS {
        engine.register_raw_fn(
            PRINT,
            vec![TypeId::of::<Dynamic>(); arity],
            |_ctx, args| {
                let line = args
                    .iter()
                    .map(|arg| to_text(arg))
                    .collect::<Vec<_>>()
                    .join(" ");
                let mut out = std::io::stdout().lock();
                // A closed stdout is not the script's problem.
                let _ = writeln!(out, "{line}");
                Ok(Dynamic::UNIT)
            },
        );
    }
}

fn register_read(engine: &mut Engine, root: PathBuf) {
    expose(engine, READ, move |args| {
        let path = to_text(&args[0]);
        let contents = read_file(&root.join(&path), &path)?;
        Ok(Dynamic::from(contents))
    });
}

/// Reads a whole file. `shown` is the path as the script wrote it.
pub fn read_file(path: &Path, shown: &str) -> Result<String, BridgeError> {
    let io = |action: &'static str| {
        let shown = shown.to_string();
        move |source: std::io::Error| BridgeError::Io {
            action,
            path: shown,
            source,
        }
    };

    let mut file = File::open(path).map_err(io("open"))?;
    let len = file.seek(SeekFrom::End(0)).map_err(io("seek"))?;
    file.seek(SeekFrom::Start(0)).map_err(io("seek"))?;

    let mut contents = String::with_capacity(len as usize);
    file.read_to_string(&mut contents).map_err(io("read"))?;
    trace!(path = shown, bytes = len, "file read");
    Ok(contents)
}

fn register_graphics(engine: &mut Engine, backend: &SharedBackend) {
    let target = backend.clone();
    expose(engine, DRAW_RECTANGLE, move |args| {
        let pos = Vector2D::decode(&args[0], "pos")?;
        let size = Vector2D::decode(&args[1], "size")?;
        let color = Color::decode(&args[2], "color")?;
        target.borrow_mut().draw_rectangle(
            pos.x as i32,
            pos.y as i32,
            size.x as i32,
            size.y as i32,
            color,
        );
        Ok(Dynamic::UNIT)
    });

    let target = backend.clone();
    expose(engine, DRAW_TEXT, move |args| {
        let text = to_text(&args[0]);
        let pos = Vector2D::decode(&args[1], "pos")?;
        let size = to_number(&args[2]) as i32;
        let color = Color::decode(&args[3], "color")?;
        target
            .borrow_mut()
            .draw_text(&text, pos.x as i32, pos.y as i32, size, color);
        Ok(Dynamic::UNIT)
    });

    let target = backend.clone();
    expose(engine, MEASURE_TEXT, move |args| {
        let text = to_text(&args[0]);
        let size = to_number(&args[1]) as i32;
        let width = target.borrow().measure_text(&text, size);
        Ok(Dynamic::from_int(width as INT))
    });
}

fn key_code(arg: &Dynamic) -> i32 {
    to_number(arg) as i32
}

fn register_input(engine: &mut Engine, backend: &SharedBackend) {
    let target = backend.clone();
    expose(engine, IS_KEY_PRESSED, move |args| {
        Ok(Dynamic::from_bool(
            target.borrow().is_key_pressed(key_code(&args[0])),
        ))
    });

    let target = backend.clone();
    expose(engine, IS_KEY_DOWN, move |args| {
        Ok(Dynamic::from_bool(
            target.borrow().is_key_down(key_code(&args[0])),
        ))
    });

    let target = backend.clone();
    expose(engine, IS_KEY_UP, move |args| {
        Ok(Dynamic::from_bool(target.borrow().is_key_up(key_code(&args[0]))))
    });
}

fn register_collision(engine: &mut Engine) {
    expose(engine, CHECK_RECS, |args| {
        let a = Rectangle::decode(&args[0], "rec1")?;
        let b = Rectangle::decode(&args[1], "rec2")?;
        Ok(Dynamic::from_bool(a.check_collision(&b)))
    });

    expose(engine, GET_COLLISION_REC, |args| {
        let a = Rectangle::decode(&args[0], "rec1")?;
        let b = Rectangle::decode(&args[1], "rec2")?;
        Ok(match a.collision_rec(&b) {
            Some(overlap) => overlap.encode(),
            None => Dynamic::UNIT,
        })
    });
}

fn register_time(engine: &mut Engine, backend: &SharedBackend) {
    let target = backend.clone();
    expose(engine, GET_TIME, move |_args| {
        Ok(Dynamic::from_float(target.borrow().time() as FLOAT))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_file_reports_open_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_file(&dir.path().join("absent.txt"), "absent.txt").unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("cannot open file 'absent.txt'"), "{message}");
    }

    #[test]
    fn test_read_file_returns_contents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "level 1\nlevel 2").unwrap();
        let contents = read_file(file.path(), "levels.txt").unwrap();
        assert_eq!(contents, "level 1\nlevel 2");
    }

    #[test]
    fn test_signature_names_are_unique() {
        let mut names: Vec<_> = SIGNATURES.iter().map(|s| s.name).collect();
        names.push(PRINT);
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SIGNATURES.len() + 1);
    }
}
