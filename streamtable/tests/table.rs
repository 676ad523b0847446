use std::cell::{Cell, RefCell};
use std::rc::Rc;

use stache::{Engine, Value};
use streamtable::{
    Direction, PageLink, PageTarget, PaginationSummary, SortSpec, StreamTable, TableError,
    TableOptions,
};
use streamtable_testhelpers::IPanic;

fn options(per_page: usize) -> TableOptions {
    let mut options = TableOptions::default();
    options.pagination.per_page = Some(per_page);
    options
}

fn sortable(per_page: usize, sorting: &[&str]) -> TableOptions {
    let mut options = options(per_page);
    options.sorting = sorting.iter().map(|s| s.to_string()).collect();
    options
}

fn letters() -> Vec<Value> {
    ["A", "B", "C"]
        .iter()
        .zip(1..)
        .map(|(n, v)| Value::object([("n", Value::from(*n)), ("v", Value::from(v))]))
        .collect()
}

fn name_view(row: &Value, index: usize) -> String {
    format!("{index}:{};", row.get("n"))
}

/// Collects every pagination summary the table reports.
fn recorder() -> (Rc<RefCell<Vec<PaginationSummary>>>, impl FnMut(&PaginationSummary)) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    (seen, move |summary: &PaginationSummary| sink.borrow_mut().push(*summary))
}

#[streamtable_testhelpers::test]
fn end_to_end_page_then_search() -> Result<(), IPanic> {
    let (seen, on_pagination) = recorder();
    let mut table = StreamTable::builder()
        .options(options(2))
        .view(name_view)
        .on_pagination(on_pagination)
        .rows(letters())
        .build()?;

    assert_eq!(table.rendered(), "1:A;2:B;");
    assert_eq!(table.paginate(PageTarget::Next), Some(1));
    assert_eq!(table.rendered(), "3:C;");

    assert!(table.search("c"));
    assert_eq!(table.current_page(), 0);
    assert_eq!(table.rendered(), "1:C;");
    assert_eq!(
        seen.borrow().last(),
        Some(&PaginationSummary { from: 1, to: 1, total: 1, page: 0 })
    );
    Ok(())
}

#[streamtable_testhelpers::test]
fn page_count_and_slice_lengths() -> Result<(), IPanic> {
    for total in [0usize, 1, 9, 10, 11, 25] {
        for per_page in [1usize, 3, 10] {
            let rows = (0..total).map(|i| Value::object([("i", i)]));
            let mut table = StreamTable::builder()
                .options(options(per_page))
                .view(|_: &Value, _: usize| "x".to_string())
                .rows(rows)
                .build()?;

            let pages = table.page_count();
            assert_eq!(pages, total.div_ceil(per_page), "{total}/{per_page}");
            for k in 0..pages {
                if k > 0 {
                    assert_eq!(table.paginate(PageTarget::Page(k + 1)), Some(k));
                }
                let expected = per_page.min(total - k * per_page);
                assert_eq!(table.rendered().len(), expected, "{total}/{per_page} page {k}");
            }
        }
    }
    Ok(())
}

#[streamtable_testhelpers::test]
fn repeated_search_is_a_no_op() -> Result<(), IPanic> {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let mut table = StreamTable::builder()
        .view(name_view)
        .on_pagination(move |_| counter.set(counter.get() + 1))
        .rows(letters())
        .build()?;
    let before = calls.get();

    assert!(table.search("b"));
    assert_eq!(calls.get(), before + 1);
    assert!(!table.search("b"));
    assert!(!table.search("  b "));
    assert_eq!(calls.get(), before + 1);

    assert!(table.search(""));
    assert_eq!(table.visible_len(), 3);
    assert_eq!(table.rendered(), "1:A;2:B;3:C;");
    Ok(())
}

#[streamtable_testhelpers::test]
fn numeric_and_string_sorts() -> Result<(), IPanic> {
    let rows = [("b", 10), ("B", 2), ("a", 33)]
        .map(|(name, n)| Value::object([("name", Value::from(name)), ("n", Value::from(n))]));
    let mut table = StreamTable::builder()
        .options(sortable(10, &["n:asc:number", "name"]))
        .view(|row: &Value, _: usize| format!("{},", row.get("n")))
        .rows(rows)
        .build()?;

    // The first column is applied on build.
    assert_eq!(table.rendered(), "2,10,33,");
    assert!(table.sort(SortSpec::new("n").numeric().direction(Direction::Desc)));
    assert_eq!(table.rendered(), "33,10,2,");

    // "b" and "B" tie, so they keep their current relative order.
    assert!(table.sort(SortSpec::new("name")));
    assert_eq!(table.rendered(), "33,10,2,");
    assert!(table.sort(SortSpec::new("name").direction(Direction::Desc)));
    assert_eq!(table.rendered(), "10,2,33,");
    Ok(())
}

#[streamtable_testhelpers::test]
fn toggling_a_column_flips_its_direction() -> Result<(), IPanic> {
    let rows = [3, 1, 2].map(|n| Value::object([("n", n)]));
    let mut table = StreamTable::builder()
        .options(sortable(10, &["n:asc:number"]))
        .view(|row: &Value, _: usize| row.get("n").to_string())
        .rows(rows)
        .build()?;
    assert_eq!(table.rendered(), "123");

    let applied = table.toggle_sort("n")?;
    assert_eq!(applied.direction, Direction::Desc);
    assert_eq!(table.rendered(), "321");

    table.toggle_sort("n")?;
    assert_eq!(table.rendered(), "123");

    assert!(matches!(
        table.toggle_sort("missing"),
        Err(TableError::UnknownSortColumn { .. })
    ));
    Ok(())
}

#[streamtable_testhelpers::test]
fn search_keeps_the_sort_order_and_new_rows_are_sorted() -> Result<(), IPanic> {
    let rows = [("x1", 5), ("y", 4), ("x2", 1)]
        .map(|(name, n)| Value::object([("name", Value::from(name)), ("n", Value::from(n))]));
    let mut table = StreamTable::builder()
        .options(sortable(10, &["n::number"]))
        .view(|row: &Value, _: usize| format!("{} ", row.get("name")))
        .rows(rows)
        .build()?;

    table.search("x");
    assert_eq!(table.rendered(), "x2 x1 ");

    table.add_rows(vec![Value::object([("name", Value::from("x0")), ("n", Value::from(0))])]);
    assert_eq!(table.rendered(), "x0 x2 x1 ");
    assert_eq!(table.len(), 4);
    assert_eq!(table.visible_len(), 3);

    table.search("");
    assert_eq!(table.rendered(), "x0 x2 y x1 ");
    Ok(())
}

#[streamtable_testhelpers::test]
fn sort_without_declared_columns_is_ignored() -> Result<(), IPanic> {
    let mut table = StreamTable::builder()
        .view(name_view)
        .rows(letters())
        .build()?;
    assert!(!table.sort(SortSpec::new("n").direction(Direction::Desc)));
    assert_eq!(table.rendered(), "1:A;2:B;3:C;");
    assert_eq!(table.active_sort(), None);
    Ok(())
}

#[streamtable_testhelpers::test]
fn paginate_targets() -> Result<(), IPanic> {
    let rows = (0..25).map(|i| Value::object([("i", i)]));
    let mut table = StreamTable::builder()
        .options(options(5))
        .view(|row: &Value, _: usize| format!("{},", row.get("i")))
        .rows(rows)
        .build()?;

    assert_eq!(table.paginate(PageTarget::Previous), None);
    assert_eq!(table.paginate(PageTarget::First), None);
    assert_eq!(table.paginate(PageTarget::Last), Some(4));
    assert_eq!(table.rendered(), "20,21,22,23,24,");
    assert_eq!(table.paginate(PageTarget::Next), None);
    assert_eq!(table.paginate(PageTarget::Page(6)), None);
    assert_eq!(table.paginate(PageTarget::Previous), Some(3));
    assert_eq!(table.paginate(PageTarget::First), Some(0));
    assert_eq!(table.summary(), PaginationSummary { from: 1, to: 5, total: 25, page: 0 });
    Ok(())
}

#[streamtable_testhelpers::test]
fn page_links_follow_the_current_page() -> Result<(), IPanic> {
    let rows = (0..100).map(|i| Value::object([("i", i)]));
    let mut table = StreamTable::builder()
        .options(options(10))
        .view(|_: &Value, _: usize| String::new())
        .rows(rows)
        .build()?;

    let active = |links: &[PageLink]| {
        links.iter().find_map(|link| match link {
            PageLink::Page { index, active: true } => Some(*index),
            _ => None,
        })
    };
    assert_eq!(active(table.pagination_links()), Some(0));
    assert_eq!(table.pagination_links().first(), Some(&PageLink::First));

    table.paginate(PageTarget::Page(6));
    assert_eq!(active(table.pagination_links()), Some(5));
    insta::assert_snapshot!(table.pagination_markup(), @r##"<ul class="pagination"><li><a href="#" class="first">First</a></li><li><a href="#" class="prev">&laquo;</a></li><li data-page="3"><a href="#">4</a></li><li data-page="4"><a href="#">5</a></li><li class="active" data-page="5"><a href="#" class="active">6</a></li><li data-page="6"><a href="#">7</a></li><li data-page="7"><a href="#">8</a></li><li><a href="#" class="next">&raquo;</a></li><li><a href="#" class="last">Last</a></li></ul>"##);
    Ok(())
}

#[streamtable_testhelpers::test]
fn changing_the_page_size_returns_to_page_one() -> Result<(), IPanic> {
    let (seen, on_pagination) = recorder();
    let rows = (0..30).map(|i| Value::object([("i", i)]));
    let mut table = StreamTable::builder()
        .options(options(10))
        .view(|row: &Value, _: usize| format!("{},", row.get("i")))
        .on_pagination(on_pagination)
        .rows(rows)
        .build()?;
    table.paginate(PageTarget::Page(3));

    assert!(!table.set_page_size(10)?);
    assert!(table.set_page_size(25)?);
    assert_eq!(table.current_page(), 0);
    assert_eq!(table.page_count(), 2);
    assert_eq!(
        seen.borrow().last(),
        Some(&PaginationSummary { from: 1, to: 25, total: 30, page: 0 })
    );
    assert!(table.per_page_select_markup().contains(r#"<option value="25" selected>"#));
    assert!(matches!(table.set_page_size(0), Err(TableError::ZeroPageSize)));
    Ok(())
}

#[streamtable_testhelpers::test]
fn before_add_can_replace_the_batch() -> Result<(), IPanic> {
    let mut table = StreamTable::builder()
        .view(name_view)
        .before_add(|batch| {
            Some(
                batch
                    .iter()
                    .filter(|row| row.get("v").as_f64() > 1.0)
                    .cloned()
                    .collect(),
            )
        })
        .build()?;

    assert_eq!(table.add_rows(letters()), 2);
    assert_eq!(table.rendered(), "1:B;2:C;");
    assert_eq!(table.add_rows(vec![Value::object([("n", "Z"), ("v", "0")])]), 0);
    assert_eq!(table.len(), 2);
    Ok(())
}

#[streamtable_testhelpers::test]
fn after_add_sees_counts_and_can_stop_streaming() -> Result<(), IPanic> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    let mut table = StreamTable::builder()
        .view(name_view)
        .after_add(move |event| {
            sink.borrow_mut().push((event.added, event.total_rows));
            if event.total_rows >= 4 {
                event.stop_streaming();
            }
        })
        .build()?;

    assert_eq!(table.add_rows(Vec::new()), 0);
    table.add_rows(letters());
    assert!(!table.is_streaming_stopped());
    table.add_rows(letters());
    assert!(table.is_streaming_stopped());
    assert_eq!(*events.borrow(), [(3, 3), (3, 6)]);
    Ok(())
}

#[streamtable_testhelpers::test]
fn missing_view_is_a_configuration_error() {
    let err = StreamTable::builder().build().unwrap_err();
    assert!(matches!(err, TableError::MissingView));

    let err = StreamTable::builder()
        .view(name_view)
        .options(sortable(10, &["n:sideways"]))
        .build()
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid sort declaration `n:sideways`");
}

#[streamtable_testhelpers::test]
fn template_views_render_records_with_their_index() -> Result<(), IPanic> {
    let engine = Engine::new();
    let mut table = StreamTable::builder()
        .options(options(2))
        .template_view(
            &engine,
            "<tr><td>{{index}}</td><td>{{record.n}}</td><td>{{#record.v}}{{record.v}}{{/record.v}}</td></tr>",
        )?
        .rows(letters())
        .build()?;
    table.paginate(PageTarget::Next);
    insta::assert_snapshot!(table.container_markup(), @r##"
    <input name="search" type="text" id="st_search" class="st_search" placeholder="Search Here" value=""><select size="1" name="per_page" class="st_per_page"><option value="10">10</option><option value="25">25</option><option value="50">50</option></select>
    <tr><td>3</td><td>C</td><td>3</td></tr>
    <div class="st_pagination"><ul class="pagination"><li><a href="#" class="prev">&laquo;</a></li><li data-page="0"><a href="#">1</a></li><li class="active" data-page="1"><a href="#" class="active">2</a></li><li><a href="#" class="next">&raquo;</a></li></ul></div>
    "##);
    Ok(())
}

/// Deterministic pseudo-random values; every `gap`th one is not a number.
fn mixed_values(len: usize, gap: usize) -> Vec<Value> {
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
    (0..len)
        .map(|i| {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            let v = if i % gap == 0 {
                Value::from("n/a")
            } else {
                Value::from(((seed >> 33) % 1000) as i64 - 500)
            };
            Value::object([("v", v)])
        })
        .collect()
}

#[streamtable_testhelpers::test]
fn numeric_sort_places_non_numbers_last() -> Result<(), IPanic> {
    for gap in [3, 5, 10] {
        let rows = mixed_values(400, gap);
        let mut table = StreamTable::builder()
            .options(sortable(1000, &["v:asc:number"]))
            .view(|_: &Value, _: usize| String::new())
            .rows(rows.clone())
            .build()?;

        let numbers = rows.len() - rows.len().div_ceil(gap);
        let ascending: Vec<f64> = table.visible_rows().map(|row| row.get("v").as_f64()).collect();
        assert_eq!(ascending.len(), 400);
        assert!(ascending[..numbers].windows(2).all(|w| w[0] <= w[1]), "gap {gap}");
        assert!(ascending[numbers..].iter().all(|v| v.is_nan()), "gap {gap}");

        table.toggle_sort("v")?;
        let descending: Vec<f64> = table.visible_rows().map(|row| row.get("v").as_f64()).collect();
        let non_numbers = 400 - numbers;
        assert!(descending[..non_numbers].iter().all(|v| v.is_nan()), "gap {gap}");
        assert!(descending[non_numbers..].windows(2).all(|w| w[0] >= w[1]), "gap {gap}");

        table.add_rows(mixed_values(100, gap));
        table.search("n/a");
        assert_eq!(table.visible_len(), non_numbers + 100usize.div_ceil(gap));
    }
    Ok(())
}
