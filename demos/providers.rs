/// Identity Providers Example
///
/// This example demonstrates:
/// - Persisting a collection through a repository
/// - Sorting by a nested field (`stats.totalLogins`)
/// - Searching by name
/// - Row actions with a record-dependent label ("Enable"/"Disable")
/// - Bulk actions over the selection
///
/// Actions are logged as they run.

use std::cell::RefCell;
use std::rc::Rc;
use tableview::{
    load_or_seed, row_actions, Action, ActionButton, ActionTarget, Column, FilterDescriptor, FilterOption,
    LocalStore, Record, RecordKey, RecordRepository, Result, SelectionRequirement, SortDirection, StoreRepository, Table, TableView,
    ViewOptions,
};

fn provider(id: i64, kind: &str, name: &str, status: &str, logins: i64, active_users: i64) -> Record {
    let stats = Record::new().with("totalLogins", logins).with("activeUsers", active_users);
    Record::new()
        .with("id", id)
        .with("type", kind)
        .with("name", name)
        .with("status", status)
        .with("stats", stats)
}

fn sample_providers() -> Vec<Record> {
    vec![
        provider(1, "azure-ad", "Azure AD Production", "active", 342, 28),
        provider(2, "google", "Google Workspace", "active", 156, 15),
        provider(3, "github", "GitHub Enterprise", "active", 89, 12),
        provider(4, "saml", "Legacy SAML", "inactive", 0, 0),
    ]
}

fn type_name(kind: &str) -> &str {
    match kind {
        "azure-ad" => "Azure AD",
        "google" => "Google Workspace",
        "github" => "GitHub",
        "saml" => "SAML 2.0",
        other => other,
    }
}

fn is_active(record: &Record) -> bool {
    record.get("status").and_then(|v| v.as_str()) == Some("active")
}

/// Set `status` on every target record, then persist the table.
fn set_status(
    repository: &StoreRepository,
    table: &mut Table,
    target: ActionTarget<'_>,
    status: Option<&str>,
) -> Result<()> {
    for record in target.records() {
        let key = table.key_of(record)?;
        let next = match status {
            Some(status) => status,
            None if is_active(record) => "inactive",
            None => "active",
        };
        table.update_record(&key, |r| {
            r.set("status", next);
        })?;
    }
    repository.save_table(table)
}

fn print_page(view: &mut TableView) {
    let page = view.render().unwrap();
    for (key, record) in page.keys.iter().zip(&page.items) {
        let mark = if page.is_selected(key) { "[x]" } else { "[ ]" };
        let cells: Vec<String> = view.columns().iter().map(|c| c.render(record)).collect();
        println!("   {} {}", mark, cells.join(" | "));
    }
    println!("   {} providers\n", page.total_count);
}

fn main() {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    println!("=== TableView Providers Example ===\n");

    let repository = Rc::new(StoreRepository::new(LocalStore::new(), "authProviders"));

    // 1. Load providers (seeded on first run)
    println!("1. Loading providers...");
    let mut table = Table::keyed_by("authProviders", "id");
    table.append_records(load_or_seed(repository.as_ref(), sample_providers()).unwrap()).unwrap();
    let table = Rc::new(RefCell::new(table));

    let columns = vec![
        Column::field("Name", "name"),
        Column::computed("Type", |r| {
            type_name(r.get("type").and_then(|v| v.as_str()).unwrap_or_default()).to_string()
        })
        .sort_by_field("type"),
        Column::field("Status", "status"),
        Column::field("Total Logins", "stats.totalLogins").default_sort(SortDirection::Descending),
        Column::field("Active Users", "stats.activeUsers"),
    ];
    let filters = vec![
        FilterDescriptor::select(
            "status",
            "Status",
            vec![FilterOption::new("Active", "active"), FilterOption::new("Inactive", "inactive")],
        )
        .with_placeholder("Filter by status"),
        FilterDescriptor::multi_select(
            "type",
            "Provider Type",
            vec![
                FilterOption::new("Azure AD", "azure-ad"),
                FilterOption::new("Google Workspace", "google"),
                FilterOption::new("GitHub", "github"),
                FilterOption::new("SAML 2.0", "saml"),
            ],
        ),
    ];
    let mut view = TableView::with_options(
        table.clone(),
        columns,
        filters,
        ViewOptions::default().with_search_fields(["name"]),
    )
    .unwrap();
    print_page(&mut view);

    // 2. Row actions
    let saver = repository.clone();
    let toggle = ActionButton::new("Toggle", SelectionRequirement::Single, move |table, target| {
        set_status(&saver, table, target, None)
    })
    .with_dynamic_label("Toggle", |r| {
        let label = if is_active(r) { "Disable" } else { "Enable" };
        label.to_string()
    });

    let saver = repository.clone();
    let delete = ActionButton::new("Delete", SelectionRequirement::Single, move |table, target| {
        for record in target.records() {
            let key = table.key_of(record)?;
            table.remove_record(&key)?;
        }
        saver.save_table(table)
    })
    .danger();

    let actions: Vec<Action> = vec![
        ActionButton::new("Edit", SelectionRequirement::Single, |_, target| {
            println!("   editing {:?}", target.records().first().and_then(|r| r.get("name")));
            Ok(())
        })
        .into(),
        toggle.into(),
        Action::Separator,
        delete.into(),
    ];

    println!("2. Row menu for Legacy SAML:");
    let legacy = table.borrow().get_by_key(&RecordKey::Int(4)).cloned().unwrap();
    for action in row_actions(&actions) {
        match action.label_for(Some(&legacy)) {
            Some(label) => println!("   - {}", label),
            None => println!("   ---"),
        }
    }
    view.run_row_action(&actions[1], &RecordKey::Int(4)).unwrap();
    println!("   enabled Legacy SAML\n");

    // 3. Search
    println!("3. Searching for \"g\"...");
    view.set_search("g");
    print_page(&mut view);
    view.set_search("");

    // 4. Bulk actions
    println!("4. Disabling two providers at once...");
    let saver = repository.clone();
    let disable_selected: Action = ActionButton::new("Disable selected", SelectionRequirement::Multiple, move |table, target| {
        set_status(&saver, table, target, Some("inactive"))
    })
    .into();

    view.toggle_selection(&RecordKey::Int(2)).unwrap();
    view.toggle_selection(&RecordKey::Int(3)).unwrap();
    view.run_bulk_action(&disable_selected).unwrap();

    view.set_filter_value("status", "inactive").unwrap();
    print_page(&mut view);

    // 5. Delete a selected provider and watch the selection follow
    println!("5. Deleting GitHub Enterprise...");
    view.run_row_action(&actions[3], &RecordKey::Int(3)).unwrap();
    print_page(&mut view);

    let stored = repository.load().unwrap().unwrap_or_default();
    println!("   {} providers in storage", stored.len());

    println!("\n=== Example Complete ===");
}
