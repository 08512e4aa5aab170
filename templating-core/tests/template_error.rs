//! Error-message and trait-object tests for the host-facing contract.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use rstest::rstest;
use serde_json::json;
use templating_core::{Context, TemplateEngine, TemplateError};

// ---------------------------------------------------------------------------
// 1. Error messages
// ---------------------------------------------------------------------------

#[test]
fn not_found_message_names_template() {
    let err = TemplateError::not_found("emails/welcome");
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "template not found: emails/welcome");
}

#[test]
fn configuration_message_includes_reason() {
    let err = TemplateError::configuration("this operation requires a filesystem loader");
    assert!(!err.is_not_found());
    assert!(err.to_string().contains("requires a filesystem loader"), "got: {err}");
}

#[derive(Debug)]
struct SyntaxError {
    line: usize,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unexpected tag on line {}", self.line)
    }
}

impl std::error::Error for SyntaxError {}

#[test]
fn render_error_preserves_original() {
    let err = TemplateError::render(SyntaxError { line: 7 });
    assert!(err.to_string().contains("unexpected tag on line 7"));

    let original = err.render_source::<SyntaxError>().expect("downcast");
    assert_eq!(original.line, 7);

    let source = std::error::Error::source(&err).expect("source chain");
    assert_eq!(source.to_string(), "unexpected tag on line 7");
}

#[rstest]
#[case(TemplateError::not_found("index"))]
#[case(TemplateError::configuration("nope"))]
fn render_source_is_none_for_other_variants(#[case] err: TemplateError) {
    assert!(err.render_source::<SyntaxError>().is_none());
}

// ---------------------------------------------------------------------------
// 2. Trait object usage
// ---------------------------------------------------------------------------

/// In-memory engine used to exercise the trait through `dyn`.
#[derive(Default)]
struct EchoEngine {
    directories: RefCell<Vec<PathBuf>>,
}

impl TemplateEngine for EchoEngine {
    fn add_template_directories(&self, directories: &[PathBuf]) -> Result<(), TemplateError> {
        self.directories.borrow_mut().extend_from_slice(directories);
        Ok(())
    }

    fn render(&self, template_name: &str, context: &Context) -> Result<String, TemplateError> {
        match context.get(template_name) {
            Some(value) => Ok(value.to_string()),
            None => Err(TemplateError::not_found(template_name)),
        }
    }
}

#[test]
fn engine_is_usable_as_trait_object() {
    let engine: Box<dyn TemplateEngine> = Box::new(EchoEngine::default());
    engine
        .add_template_directories(&[PathBuf::from("a"), PathBuf::from("b")])
        .expect("register");

    let mut context: Context = BTreeMap::new();
    context.insert("greeting".to_string(), json!("hi"));

    assert_eq!(engine.render("greeting", &context).unwrap(), "\"hi\"");
    let err = engine.render("missing", &context).unwrap_err();
    assert!(matches!(err, TemplateError::NotFound { ref template } if template == "missing"));
}

#[test]
fn boxed_engine_forwards_directory_registration() {
    let inner = EchoEngine::default();
    let boxed = Box::new(inner);
    boxed.add_template_directories(&[PathBuf::from("one")]).unwrap();
    boxed.add_template_directories(&[PathBuf::from("two")]).unwrap();
    assert_eq!(
        *boxed.directories.borrow(),
        vec![PathBuf::from("one"), PathBuf::from("two")]
    );
}
