//! # Value Codecs
//!
//! Conversion between Rhai `Dynamic` values and the native value types.
//!
//! ## Responsibilities
//! - **Categories**: `Category` classifies a script value as string, number, object or boolean.
//! - **Field tables**: every codec declares its fixed keys through `ScriptCodec::FIELDS`.
//! - **Decode**: reads whatever is present; missing (or unit) fields become zero.
//! - **Encode**: builds a fresh object map with the same keys, readable by `decode`.
//!
//! ## Coercion
//! Numbers pass through, booleans become 1/0, strings are parsed (blank is 0,
//! garbage is NaN) and any other value is NaN. Narrowing to a native field uses
//! `as`: truncation toward zero, saturation at the type bounds, NaN becomes 0.
//! Out-of-range values are therefore implementation-defined, not wrapped.

use crate::errors::BridgeError;
use crate::types::{Color, Rectangle, Vector2D, WindowConfig, WindowTitle};
use rhai::{Dynamic, Map, FLOAT, INT};
use std::fmt;

/// Script-level type category checked at the native boundary.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Category {
    String,
    Number,
    Object,
    Boolean,
}

impl Category {
    /// Classifies a value, or `None` for values outside the four categories
    /// (unit, arrays, function pointers, custom types).
    pub fn of(value: &Dynamic) -> Option<Category> {
        if value.is_string() {
            Some(Category::String)
        } else if value.is_int() || value.is_float() {
            Some(Category::Number)
        } else if value.is_map() {
            Some(Category::Object)
        } else if value.is_bool() {
            Some(Category::Boolean)
        } else {
            None
        }
    }

    pub fn matches(self, value: &Dynamic) -> bool {
        Category::of(value) == Some(self)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::String => "string",
            Category::Number => "number",
            Category::Object => "object",
            Category::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// One entry of a codec's field table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub category: Category,
}

const fn field(name: &'static str, category: Category) -> Field {
    Field { name, category }
}

/// Bidirectional conversion between a script object and a native value type.
pub trait ScriptCodec: Sized {
    /// Fixed keys read by `decode` and written by `encode`.
    const FIELDS: &'static [Field];

    /// Decodes from a script object. `path` names the value in error messages.
    fn decode(value: &Dynamic, path: &str) -> Result<Self, BridgeError>;

    /// Encodes into a new script object map.
    fn encode(&self) -> Dynamic;

    /// Declared fields that `map` does not carry (absent or unit).
    fn missing_fields(map: &Map) -> Vec<&'static str> {
        Self::FIELDS
            .iter()
            .filter(|f| map.get(f.name).map_or(true, Dynamic::is_unit))
            .map(|f| f.name)
            .collect()
    }
}

/// Coerces any script value to a float.
pub fn to_number(value: &Dynamic) -> FLOAT {
    if let Ok(i) = value.as_int() {
        return i as FLOAT;
    }
    if let Ok(f) = value.as_float() {
        return f;
    }
    if let Ok(b) = value.as_bool() {
        return if b { 1.0 } else { 0.0 };
    }
    if value.is_unit() {
        return 0.0;
    }
    if let Ok(s) = value.clone().into_string() {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return 0.0;
        }
        return trimmed.parse().unwrap_or(FLOAT::NAN);
    }
    FLOAT::NAN
}

/// Coerces any script value to text.
pub fn to_text(value: &Dynamic) -> String {
    match value.clone().into_string() {
        Ok(s) => s,
        Err(_) => value.to_string(),
    }
}

fn with_map<T>(value: &Dynamic, path: &str, f: impl FnOnce(&Map) -> T) -> Result<T, BridgeError> {
    match value.read_lock::<Map>() {
        Some(map) => Ok(f(&*map)),
        None => Err(BridgeError::NotAnObject {
            path: path.to_string(),
        }),
    }
}

fn present<'a>(map: &'a Map, key: &str) -> Option<&'a Dynamic> {
    map.get(key).filter(|v| !v.is_unit())
}

fn number(map: &Map, key: &str) -> FLOAT {
    present(map, key).map_or(0.0, to_number)
}

fn text(map: &Map, key: &str) -> String {
    present(map, key).map(to_text).unwrap_or_default()
}

fn float_value(v: FLOAT) -> Dynamic {
    Dynamic::from_float(v)
}

fn int_value(v: INT) -> Dynamic {
    Dynamic::from_int(v)
}

impl ScriptCodec for Vector2D {
    const FIELDS: &'static [Field] = &[field("x", Category::Number), field("y", Category::Number)];

    fn decode(value: &Dynamic, path: &str) -> Result<Self, BridgeError> {
        with_map(value, path, |map| Vector2D {
            x: number(map, "x"),
            y: number(map, "y"),
        })
    }

    fn encode(&self) -> Dynamic {
        let mut map = Map::new();
        map.insert("x".into(), float_value(self.x));
        map.insert("y".into(), float_value(self.y));
        Dynamic::from(map)
    }
}

impl ScriptCodec for Color {
    const FIELDS: &'static [Field] = &[
        field("r", Category::Number),
        field("g", Category::Number),
        field("b", Category::Number),
        field("a", Category::Number),
    ];

    fn decode(value: &Dynamic, path: &str) -> Result<Self, BridgeError> {
        with_map(value, path, |map| Color {
            r: number(map, "r") as u8,
            g: number(map, "g") as u8,
            b: number(map, "b") as u8,
            a: number(map, "a") as u8,
        })
    }

    fn encode(&self) -> Dynamic {
        let mut map = Map::new();
        map.insert("r".into(), int_value(self.r.into()));
        map.insert("g".into(), int_value(self.g.into()));
        map.insert("b".into(), int_value(self.b.into()));
        map.insert("a".into(), int_value(self.a.into()));
        Dynamic::from(map)
    }
}

impl ScriptCodec for Rectangle {
    const FIELDS: &'static [Field] = &[
        field("x", Category::Number),
        field("y", Category::Number),
        field("width", Category::Number),
        field("height", Category::Number),
    ];

    fn decode(value: &Dynamic, path: &str) -> Result<Self, BridgeError> {
        with_map(value, path, |map| Rectangle {
            x: number(map, "x") as f32,
            y: number(map, "y") as f32,
            width: number(map, "width") as f32,
            height: number(map, "height") as f32,
        })
    }

    fn encode(&self) -> Dynamic {
        let mut map = Map::new();
        map.insert("x".into(), float_value(self.x.into()));
        map.insert("y".into(), float_value(self.y.into()));
        map.insert("width".into(), float_value(self.width.into()));
        map.insert("height".into(), float_value(self.height.into()));
        Dynamic::from(map)
    }
}

impl ScriptCodec for WindowConfig {
    const FIELDS: &'static [Field] = &[
        field("title", Category::String),
        field("targetFps", Category::Number),
        field("dimensions", Category::Object),
    ];

    fn decode(value: &Dynamic, path: &str) -> Result<Self, BridgeError> {
        let (title, target_fps, dimensions) = with_map(value, path, |map| {
            (
                WindowTitle::new(&text(map, "title")),
                number(map, "targetFps") as i32,
                present(map, "dimensions").cloned(),
            )
        })?;

        let dimensions = match dimensions {
            Some(v) => Vector2D::decode(&v, &format!("{path}.dimensions"))?,
            None => Vector2D::default(),
        };

        Ok(WindowConfig {
            title,
            target_fps,
            dimensions,
        })
    }

    fn encode(&self) -> Dynamic {
        let mut map = Map::new();
        map.insert("title".into(), Dynamic::from(self.title.to_string()));
        map.insert("targetFps".into(), int_value(self.target_fps.into()));
        map.insert("dimensions".into(), self.dimensions.encode());
        Dynamic::from(map)
    }
}
