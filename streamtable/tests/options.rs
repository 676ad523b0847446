use std::io::Write;

use indoc::indoc;
use stache::Value;
use streamtable::{
    FetchError, FetchQuery, JsonFileSource, RowSource, StreamLoader, StreamTable, TableError,
    TableOptions,
};
use streamtable_testhelpers::IPanic;

#[streamtable_testhelpers::test]
fn options_from_json() -> Result<(), IPanic> {
    let options = TableOptions::from_json(indoc! {r#"
        {
            "fields": ["name", "director"],
            "fetch_data_limit": 100,
            "stream_after": 0.5,
            "sorting": ["rating:desc:number", "name"],
            "pagination": { "span": 3, "per_page_options": [5, 20] }
        }
    "#})?;

    assert_eq!(options.fields.as_deref(), Some(&["name".to_string(), "director".to_string()][..]));
    assert_eq!(options.fetch_data_limit, Some(100));
    assert_eq!(options.stream_interval().as_millis(), 500);
    assert_eq!(options.pagination.span, 3);
    assert_eq!(options.pagination.initial_per_page(), 5);
    assert_eq!(options.pagination.next_text, "&raquo;");
    assert_eq!(options.sort_columns()?.len(), 2);
    Ok(())
}

#[streamtable_testhelpers::test]
fn empty_json_is_the_default() -> Result<(), IPanic> {
    assert_eq!(TableOptions::from_json("{}")?, TableOptions::default());
    Ok(())
}

#[streamtable_testhelpers::test]
fn bad_options_are_rejected() {
    assert!(matches!(
        TableOptions::from_json(r#"{"per_page": 10}"#).unwrap_err(),
        TableError::Options(_)
    ));
    assert!(matches!(
        TableOptions::from_json(r#"{"pagination": {"per_page": 0}}"#).unwrap_err(),
        TableError::ZeroPageSize
    ));
    assert!(matches!(
        TableOptions::from_json(r#"{"pagination": {"per_page_options": [10, 0]}}"#).unwrap_err(),
        TableError::ZeroPageSize
    ));
    assert_eq!(
        TableOptions::from_json(r#"{"sorting": [""]}"#)
            .unwrap_err()
            .to_string(),
        "Invalid sort declaration ``"
    );
}

fn json_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[streamtable_testhelpers::test(tokio::test)]
async fn json_file_source_serves_windows() -> Result<(), IPanic> {
    let file = json_file(r#"[{"name": "Heat"}, {"name": "Ran"}, {"name": "Alien"}]"#);
    let source = JsonFileSource::new(file.path());

    let chunk = source
        .fetch(&FetchQuery {
            query: String::new(),
            limit: Some(2),
            offset: 1,
        })
        .await?;
    assert_eq!(chunk.len(), 2);
    assert_eq!(chunk[0].get("name"), Value::from("Ran"));
    assert_eq!(source.read_all().await?.len(), 3);
    Ok(())
}

#[streamtable_testhelpers::test(tokio::test)]
async fn json_file_errors() {
    let file = json_file(r#"{"rows": []}"#);
    let err = JsonFileSource::new(file.path()).read_all().await.unwrap_err();
    assert!(matches!(err, FetchError::NotAnArray { found: "an object" }));

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    let err = JsonFileSource::new(&missing).read_all().await.unwrap_err();
    assert!(matches!(err, FetchError::Io { ref path, .. } if *path == missing));
}

#[streamtable_testhelpers::test(tokio::test)]
async fn file_rows_stream_into_a_table() {
    let rows: Vec<String> = (0..7).map(|i| format!(r#"{{"i": {i}}}"#)).collect();
    let file = json_file(&format!("[{}]", rows.join(",")));

    let options = TableOptions::from_json(r#"{"fetch_data_limit": 3, "stream_after": 0.1}"#).unwrap();
    let table = StreamTable::builder()
        .options(options)
        .view(|row: &Value, _: usize| format!("{},", row.get("i")))
        .build()
        .unwrap()
        .into_shared();

    StreamLoader::new(JsonFileSource::new(file.path()), table.clone())
        .run()
        .await;

    let table = table.borrow();
    assert_eq!(table.len(), 7);
    assert_eq!(table.rendered(), "0,1,2,3,4,5,6,");
}
