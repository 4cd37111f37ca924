/// Audit Log Example
///
/// This example demonstrates:
/// - Describing toolbar filters in JSON
/// - Default sort (newest first)
/// - Text filters next to select filters
/// - A toolbar action that needs no selection ("Export logs")
///
/// Logs at info by default; run with `RUST_LOG=debug` to see the view recompute.

use std::cell::RefCell;
use std::rc::Rc;
use tableview::{
    export_records, load_or_seed, Action, ActionButton, Column, FilterSet, LocalStore, PageView, Record,
    SelectionRequirement, SortDirection, StoreRepository, Table, TableView, ViewOptions,
};

const FILTERS: &str = r#"[
    {"key": "action", "label": "Action", "type": "select", "placeholder": "Filter by action",
     "options": [
        {"label": "Provider Created", "value": "Provider Created"},
        {"label": "Provider Modified", "value": "Provider Modified"},
        {"label": "Provider Disabled", "value": "Provider Disabled"},
        {"label": "User Login", "value": "User Login"}
     ]},
    {"key": "status", "label": "Status", "type": "select", "placeholder": "Filter by status",
     "options": [{"label": "Success", "value": "Success"}, {"label": "Failed", "value": "Failed"}]},
    {"key": "user", "label": "User", "type": "string", "placeholder": "Search by user"},
    {"key": "providerName", "label": "Provider", "type": "string", "placeholder": "Search by provider name"}
]"#;

fn log_entry(id: i64, timestamp: &str, user: &str, action: &str, provider: &str, status: &str) -> Record {
    Record::new()
        .with("id", id)
        .with("timestamp", timestamp)
        .with("user", user)
        .with("action", action)
        .with("providerName", provider)
        .with("status", status)
}

fn sample_logs() -> Vec<Record> {
    vec![
        log_entry(1, "2024-05-02T09:00:00Z", "admin@company.com", "Provider Created", "Azure AD Production", "Success"),
        log_entry(2, "2024-05-02T08:00:00Z", "alice@company.com", "User Login", "Google Workspace", "Success"),
        log_entry(3, "2024-05-02T07:00:00Z", "bob@company.com", "User Login", "Okta SSO", "Failed"),
        log_entry(4, "2024-05-01T16:30:00Z", "admin@company.com", "Provider Modified", "Okta SSO", "Success"),
        log_entry(5, "2024-05-01T12:10:00Z", "carol@company.com", "User Login", "Azure AD Production", "Success"),
        log_entry(6, "2024-04-30T18:45:00Z", "admin@company.com", "Provider Disabled", "Legacy LDAP", "Success"),
        log_entry(7, "2024-04-30T10:05:00Z", "dave@company.com", "User Login", "Google Workspace", "Success"),
        log_entry(8, "2024-04-29T14:20:00Z", "admin@company.com", "Provider Created", "GitHub OAuth", "Success"),
    ]
}

fn print_page(view: &TableView, page: &PageView) {
    let headers: Vec<&str> = view.columns().iter().map(|c| c.header()).collect();
    println!("   {}", headers.join(" | "));
    for record in &page.items {
        let cells: Vec<String> = view.columns().iter().map(|c| c.render(record)).collect();
        println!("   {}", cells.join(" | "));
    }
    println!(
        "   page {}/{} ({} matching)\n",
        page.page, page.page_count, page.total_count
    );
}

fn main() {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    println!("=== TableView Audit Log Example ===\n");

    // 1. Load logs, seeding the store on first run
    println!("1. Loading audit logs...");
    let repository = StoreRepository::new(LocalStore::new(), "auditLogs");
    let logs = load_or_seed(&repository, sample_logs()).unwrap();

    let mut table = Table::keyed_by("auditLogs", "id");
    table.append_records(logs).unwrap();
    let table = Rc::new(RefCell::new(table));
    println!("   Loaded {} entries\n", table.borrow().len());

    // 2. Build the view, newest first
    println!("2. Newest first, 5 per page");
    let columns = vec![
        Column::field("Timestamp", "timestamp").default_sort(SortDirection::Descending),
        Column::field("User", "user"),
        Column::field("Action", "action"),
        Column::field("Provider", "providerName"),
        Column::field("Status", "status"),
    ];
    let filters = FilterSet::from_json(FILTERS).unwrap();
    let mut view = TableView::with_options(
        table.clone(),
        columns,
        filters.into_descriptors(),
        ViewOptions::default().with_page_size(5),
    )
    .unwrap();

    let page = view.render().unwrap();
    print_page(&view, &page);

    // 3. Select and text filters together
    println!("3. Logins through providers matching \"o\"");
    view.set_filter_value("action", "User Login").unwrap();
    view.set_filter_value("providerName", "o").unwrap();
    let page = view.render().unwrap();
    print_page(&view, &page);

    println!("4. Failed entries only, oldest first");
    view.clear_filters();
    view.set_filter_value("status", "Failed").unwrap();
    view.sort_by(0, SortDirection::Ascending).unwrap();
    let page = view.render().unwrap();
    print_page(&view, &page);

    // 5. Toolbar action: export everything as JSON
    println!("5. Exporting logs...");
    let export: Action = ActionButton::new("Export logs", SelectionRequirement::None, |table, _| {
        let json = export_records(table.records())?;
        println!("   audit-logs.json ({} bytes)", json.len());
        Ok(())
    })
    .pinned()
    .into();
    view.run_bulk_action(&export).unwrap();

    println!("\n=== Example Complete ===");
}
