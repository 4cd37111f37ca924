/// Performance Example
///
/// This example demonstrates:
/// - Cost of a full recompute (filter, search, sort) on a large collection
/// - Rendering without changes reuses the computed order
/// - Paging through results
/// - Selecting everything and deleting in bulk

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;
use tableview::{
    Action, ActionButton, Column, FilterDescriptor, FilterOption, Record, SelectionRequirement, SortDirection, Table,
    TableView, ViewOptions,
};

const STATUSES: [&str; 3] = ["Success", "Failed", "Pending"];

fn main() {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    println!("=== TableView Performance Example ===\n");

    let n = 50_000;

    // 1. Build a large collection
    println!("1. Appending {} records", n);
    let start = Instant::now();
    let mut table = Table::keyed_by("events", "id");
    for i in 0..n {
        table
            .append_record(
                Record::new()
                    .with("id", i as i64)
                    .with("user", format!("user{}@company.com", i % 500))
                    .with("status", STATUSES[i % STATUSES.len()])
                    .with("latency", ((i * 7919) % 10_000) as f64 / 10.0),
            )
            .unwrap();
    }
    println!("   took {:?}\n", start.elapsed());
    let table = Rc::new(RefCell::new(table));

    let mut view = TableView::with_options(
        table.clone(),
        vec![
            Column::field("User", "user"),
            Column::field("Status", "status"),
            Column::field("Latency", "latency").default_sort(SortDirection::Descending),
        ],
        vec![FilterDescriptor::select(
            "status",
            "Status",
            STATUSES.iter().map(|s| FilterOption::new(*s, *s)).collect(),
        )],
        ViewOptions::default().with_page_size(50).with_search_fields(["user"]),
    )
    .unwrap();

    // 2. First render sorts everything
    println!("2. First render (sort {} records)", n);
    let start = Instant::now();
    let page = view.render().unwrap();
    println!("   took {:?}, {} pages\n", start.elapsed(), page.page_count);

    println!("3. Re-render without changes");
    let start = Instant::now();
    for _ in 0..100 {
        view.render().unwrap();
    }
    println!("   100 renders took {:?}\n", start.elapsed());

    // 4. Filter plus search
    println!("4. Filter to Failed, search \"user42\"");
    let start = Instant::now();
    view.set_filter_value("status", "Failed").unwrap();
    view.set_search("user42");
    let page = view.render().unwrap();
    println!("   took {:?}, {} matching\n", start.elapsed(), page.total_count);

    // 5. Page through
    println!("5. Paging through all results");
    let start = Instant::now();
    let pages = page.page_count;
    let mut seen = 0;
    for number in 1..=pages {
        view.set_page(number).unwrap();
        seen += view.render().unwrap().items.len();
    }
    println!("   {} pages, {} rows, took {:?}\n", pages, seen, start.elapsed());

    // 6. Bulk delete
    println!("6. Select all matching and delete");
    let delete: Action = ActionButton::new("Delete selected", SelectionRequirement::Multiple, |table, target| {
        let keys = target
            .records()
            .iter()
            .map(|r| table.key_of(r))
            .collect::<tableview::Result<Vec<_>>>()?;
        table.remove_records(&keys);
        Ok(())
    })
    .danger()
    .into();

    let start = Instant::now();
    view.select_all().unwrap();
    view.run_bulk_action(&delete).unwrap();
    println!("   took {:?}, {} records left\n", start.elapsed(), table.borrow().len());

    println!("=== Example Complete ===");
}
