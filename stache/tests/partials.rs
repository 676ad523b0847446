use std::cell::Cell;
use std::rc::Rc;

use stache::{Engine, Partials, Value};
use streamtable_testhelpers::IPanic;

#[streamtable_testhelpers::test]
fn map_partials_render_in_the_current_context() -> Result<(), IPanic> {
    let engine = Engine::new();
    let view = Value::object([(
        "people",
        Value::array([Value::object([("name", "a")]), Value::object([("name", "b")])]),
    )]);
    let partials = Partials::map([("row", "<{{name}}>;")]);
    let out = engine.render_with("{{#people}}{{>row}}{{/people}}", &view, &partials)?;
    assert_eq!(out, "<a>;<b>;");
    Ok(())
}

#[streamtable_testhelpers::test]
fn unknown_partials_render_empty() -> Result<(), IPanic> {
    let engine = Engine::new();
    assert_eq!(engine.render("[{{> nope }}]", &Value::Null)?, "[]");
    Ok(())
}

#[streamtable_testhelpers::test]
fn explicit_partials_stay_registered() -> Result<(), IPanic> {
    let engine = Engine::new();
    engine.compile_partial("p", "[{{x}}]")?;
    assert_eq!(engine.render("{{>p}}{{>p}}", &Value::object([("x", 1)]))?, "[1][1]");
    Ok(())
}

#[streamtable_testhelpers::test]
fn loader_partials_compile_once() -> Result<(), IPanic> {
    let engine = Engine::new();
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let partials = Partials::loader(move |name| {
        counter.set(counter.get() + 1);
        (name == "item").then(|| "{{.}}".to_string())
    });

    let view = Value::object([("xs", Value::array([1, 2, 3]))]);
    let out = engine.render_with("{{#xs}}{{>item}}{{/xs}}", &view, &partials)?;
    assert_eq!(out, "123");
    assert_eq!(calls.get(), 1);

    // Misses are asked for again on every reference.
    assert_eq!(engine.render("{{>nope}}{{>nope}}", &view)?, "");
    assert_eq!(calls.get(), 3);
    Ok(())
}

#[streamtable_testhelpers::test]
fn loader_installed_on_the_engine() -> Result<(), IPanic> {
    let engine = Engine::new();
    engine.set_partial_loader(|name| Some(format!("<{name}>")));
    assert_eq!(engine.render("{{>a}}{{>b}}", &Value::Null)?, "<a><b>");
    Ok(())
}

#[streamtable_testhelpers::test]
fn partials_can_recurse_over_trees() -> Result<(), IPanic> {
    let engine = Engine::new();
    engine.compile_partial("node", "{{name}}{{#children}}({{>node}}){{/children}}")?;
    let leaf = |name: &str| {
        Value::object([
            ("name", Value::from(name)),
            ("children", Value::array(Vec::<Value>::new())),
        ])
    };
    let tree = Value::object([
        ("name", Value::from("a")),
        ("children", Value::array([leaf("b"), leaf("c")])),
    ]);
    assert_eq!(engine.render("{{>node}}", &tree)?, "a(b)(c)");
    Ok(())
}

#[streamtable_testhelpers::test]
fn partial_syntax_errors_surface_at_render() {
    let engine = Engine::new();
    engine.set_partial_loader(|_| Some("{{#open}}".to_string()));
    let err = engine.render("{{>broken}}", &Value::Null).unwrap_err();
    assert_eq!(err.to_string(), "Unclosed section `open`");
}
