use stache::{Engine, Tags, Value};
use streamtable_testhelpers::IPanic;

#[streamtable_testhelpers::test]
fn compiling_twice_hits_the_cache() -> Result<(), IPanic> {
    let engine = Engine::new();
    let view = Value::object([("y", "!")]);

    let first = engine.compile("x{{y}}")?;
    let second = engine.compile("x{{y}}")?;
    assert_eq!(engine.cached_templates(), 1);
    assert_eq!(first.render(&view)?, second.render(&view)?);

    // Same text with other delimiters is a different template.
    let other = engine.compile_with_tags("x{{y}}", &Tags::new("<%", "%>"))?;
    assert_eq!(engine.cached_templates(), 2);
    assert_eq!(other.render(&view)?, "x{{y}}");

    engine.clear_cache();
    assert_eq!(engine.cached_templates(), 0);
    // Handles outlive the cache.
    assert_eq!(first.render(&view)?, "x!");
    Ok(())
}

#[streamtable_testhelpers::test]
fn clones_share_caches() -> Result<(), IPanic> {
    let engine = Engine::new();
    let clone = engine.clone();
    clone.compile("{{a}}")?;
    assert_eq!(engine.cached_templates(), 1);
    Ok(())
}

#[streamtable_testhelpers::test]
fn default_engine_is_shared_per_thread() -> Result<(), IPanic> {
    stache::clear_cache();
    let view = Value::object([("who", "world")]);
    assert_eq!(stache::render("hello {{who}}", &view)?, "hello world");
    let template = stache::compile("hello {{who}}")?;
    assert_eq!(template.render(&view)?, "hello world");
    assert_eq!(stache::default_engine().cached_templates(), 1);

    stache::clear_cache();
    assert_eq!(stache::default_engine().cached_templates(), 0);
    Ok(())
}

#[streamtable_testhelpers::test]
fn sections_reuse_their_compiled_body() -> Result<(), IPanic> {
    let engine = Engine::new();
    let items: Vec<Value> = (0..1000).map(Value::from).collect();
    let view = Value::object([("items", Value::array(items))]);
    let out = engine.render("{{#items}}{{.}},{{/items}}", &view)?;
    assert_eq!(out.matches(',').count(), 1000);
    assert!(out.starts_with("0,1,2,"));
    assert_eq!(engine.cached_templates(), 1);
    Ok(())
}
