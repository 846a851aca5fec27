//! Value Codec Tests
//!
//! Decoding script object maps into native value types and back.

use mue_core::scripting::ScriptCodec;
use mue_core::{BridgeError, Color, Rectangle, Vector2D, WindowConfig, WindowTitle};
use rhai::{Dynamic, Engine};

fn eval(script: &str) -> Dynamic {
    Engine::new().eval::<Dynamic>(script).unwrap()
}

#[test]
fn value_types_survive_encoding() {
    let rect = Rectangle::new(1.5, -2.0, 30.25, 4.0);
    assert_eq!(Rectangle::decode(&rect.encode(), "rect").unwrap(), rect);

    let color = Color::new(10, 20, 30, 255);
    assert_eq!(Color::decode(&color.encode(), "color").unwrap(), color);

    let config = WindowConfig::new("demo", 30, 320.0, 240.0);
    assert_eq!(WindowConfig::decode(&config.encode(), "config").unwrap(), config);
}

#[test]
fn script_literals_decode() {
    let pos = Vector2D::decode(&eval("#{x: 3, y: 4.5}"), "pos").unwrap();
    assert_eq!(pos, Vector2D::new(3.0, 4.5));

    let config = WindowConfig::decode(
        &eval(r#"#{title: "demo", targetFps: 30, dimensions: #{x: 320, y: 240}}"#),
        "config",
    )
    .unwrap();
    assert_eq!(config.title.as_str(), "demo");
    assert_eq!(config.target_fps, 30);
    assert_eq!((config.width(), config.height()), (320, 240));
}

#[test]
fn missing_fields_decode_to_zero() {
    let color = Color::decode(&eval("#{r: 255}"), "color").unwrap();
    assert_eq!(color, Color::new(255, 0, 0, 0));

    let rect = Rectangle::decode(&eval("#{width: 8, height: ()}"), "rect").unwrap();
    assert_eq!(rect, Rectangle::new(0.0, 0.0, 8.0, 0.0));

    let config = WindowConfig::decode(&eval(r#"#{title: "only"}"#), "config").unwrap();
    assert_eq!(config.target_fps, 0);
    assert_eq!(config.dimensions, Vector2D::default());
}

#[test]
fn decode_leaves_input_untouched() {
    let value = eval("#{x: 1, extra: true}");
    let before = value.to_string();
    Vector2D::decode(&value, "pos").unwrap();
    assert_eq!(value.to_string(), before);
}

#[test]
fn non_objects_are_rejected() {
    match Vector2D::decode(&Dynamic::from_int(5), "pos") {
        Err(BridgeError::NotAnObject { path }) => assert_eq!(path, "pos"),
        other => panic!("expected NotAnObject, got {:?}", other),
    }

    let err = WindowConfig::decode(&eval(r#"#{title: "t", dimensions: 12}"#), "setup()").unwrap_err();
    assert_eq!(err.to_string(), "setup().dimensions is not an object");
}

#[test]
fn numbers_narrow_with_truncation_and_saturation() {
    let color = Color::decode(&eval(r#"#{r: 300, g: -5, b: 12.9, a: "abc"}"#), "color").unwrap();
    assert_eq!(color, Color::new(255, 0, 12, 0));

    let rect = Rectangle::decode(&eval(r#"#{x: "7", y: true, width: " ", height: 2}"#), "rect").unwrap();
    assert_eq!(rect, Rectangle::new(7.0, 1.0, 0.0, 2.0));
}

#[test]
fn long_titles_are_truncated() {
    let long = "t".repeat(WindowTitle::CAPACITY * 2);
    let mut map = rhai::Map::new();
    map.insert("title".into(), Dynamic::from(long));

    let config = WindowConfig::decode(&Dynamic::from(map), "config").unwrap();
    assert_eq!(config.title.as_str().len(), WindowTitle::MAX_LEN);

    let encoded = config.encode();
    let title = encoded.read_lock::<rhai::Map>().unwrap()["title"].clone();
    assert_eq!(title.into_string().unwrap().len(), WindowTitle::MAX_LEN);
}

#[test]
fn encoded_config_uses_script_field_names() {
    let encoded = WindowConfig::default().encode();
    let map = encoded.read_lock::<rhai::Map>().unwrap();
    assert_eq!(map["title"].clone().into_string().unwrap(), "window");
    assert_eq!(map["targetFps"].as_int().unwrap(), 120);
    assert!(WindowConfig::missing_fields(&map).is_empty());
}
