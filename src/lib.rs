/// TableView - Client-Side Table Views
///
/// Filtering, sorting, pagination, selection and row/bulk actions over an
/// in-memory collection of records. A page owns its records in a shared
/// `Table`; a `TableView` built from column, filter and action descriptors
/// derives the visible page from it and re-synchronises after every change.
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use tableview::{Column, FilterDescriptor, FilterOption, Record, SortDirection, Table, TableView};
///
/// let mut table = Table::keyed_by("providers", "id");
/// table.append_record(Record::new().with("id", 1).with("name", "GitHub").with("status", "active")).unwrap();
/// table.append_record(Record::new().with("id", 2).with("name", "Okta").with("status", "inactive")).unwrap();
/// let table = Rc::new(RefCell::new(table));
///
/// let mut view = TableView::new(
///     table,
///     vec![Column::field("Name", "name").default_sort(SortDirection::Ascending)],
///     vec![FilterDescriptor::select(
///         "status",
///         "Status",
///         vec![FilterOption::new("Active", "active"), FilterOption::new("Inactive", "inactive")],
///     )],
/// )
/// .unwrap();
///
/// view.set_filter_value("status", "active").unwrap();
/// let page = view.render().unwrap();
/// assert_eq!(page.total_count, 1);
/// assert_eq!(page.items[0].get("name").unwrap().as_str(), Some("GitHub"));
/// ```

pub mod action;
pub mod changeset;
pub mod column;
pub mod config;
pub mod error;
pub mod filter;
pub mod record;
pub mod repository;
pub mod table;
pub mod value;
pub mod view;

pub use action::{row_actions, Action, ActionButton, ActionHandler, ActionKind, ActionLabel, ActionTarget, SelectionRequirement};
pub use changeset::{Changeset, RecordChange};
pub use column::{apply_sort, validate_columns, CellRenderer, Column, SortAccessor, SortDirection};
pub use config::{ViewOptions, DEFAULT_PAGE_SIZE};
pub use error::{ConfigError, Error, Result};
pub use filter::{apply_filters, matches_search, FilterDescriptor, FilterKind, FilterOption, FilterSet, FilterState};
pub use record::{key_by_field, KeyFn, Record, RecordKey};
pub use repository::{export_records, load_or_seed, LocalStore, RecordRepository, StoreRepository};
pub use table::Table;
pub use value::FieldValue;
pub use view::{page_count, paginate, PageView, Paginated, TableView};

#[cfg(test)]
mod integration_tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn provider(id: i64, name: &str, kind: &str, status: &str, logins: i64) -> Record {
        let stats = Record::new().with("totalLogins", logins);
        Record::new()
            .with("id", id)
            .with("name", name)
            .with("type", kind)
            .with("status", status)
            .with("stats", stats)
    }

    fn seed() -> Vec<Record> {
        vec![
            provider(1, "GitHub", "oauth", "active", 120),
            provider(2, "Okta", "saml", "active", 45),
            provider(3, "Google", "oauth", "inactive", 300),
            provider(4, "Azure AD", "saml", "inactive", 0),
            provider(5, "GitLab", "oauth", "active", 80),
        ]
    }

    #[test]
    fn test_complete_workflow() {
        // Persisted collection, seeded on first load
        let repository = Rc::new(StoreRepository::new(LocalStore::new(), "providers"));
        let records = load_or_seed(repository.as_ref(), seed()).unwrap();

        let mut table = Table::keyed_by("providers", "id");
        table.append_records(records).unwrap();
        let table = Rc::new(RefCell::new(table));

        let filters = FilterSet::from_json(
            r#"[
                {"key": "type", "label": "Type", "type": "multi-select",
                 "options": [{"label": "OAuth", "value": "oauth"}, {"label": "SAML", "value": "saml"}]},
                {"key": "status", "label": "Status", "type": "select",
                 "options": [{"label": "Active", "value": "active"}, {"label": "Inactive", "value": "inactive"}]}
            ]"#,
        )
        .unwrap();

        let columns = vec![
            Column::field("Name", "name"),
            Column::field("Type", "type"),
            Column::field("Logins", "stats.totalLogins").default_sort(SortDirection::Descending),
            Column::computed("Status", |r| {
                r.get("status").and_then(|v| v.to_text()).unwrap_or_default().to_uppercase()
            })
            .unsortable(),
        ];

        let mut view = TableView::with_options(
            table.clone(),
            columns,
            filters.into_descriptors(),
            ViewOptions::default().with_page_size(2).with_search_fields(["name"]),
        )
        .unwrap();

        // Sorted by logins, most first
        let page = view.render().unwrap();
        let names: Vec<String> = page.items.iter().map(|r| view.columns()[0].render(r)).collect();
        assert_eq!(names, vec!["Google", "GitHub"]);
        assert_eq!(page.page_count, 3);
        assert_eq!(view.columns()[3].render(&page.items[0]), "INACTIVE");

        // Toggle action persists through the repository
        let saver = repository.clone();
        let toggle: Action = ActionButton::new("Toggle", SelectionRequirement::Single, move |table, target| {
            let key = table.key_of(&target.records()[0])?;
            table.update_record(&key, |r| {
                let next = if r.get("status").and_then(|v| v.as_str()) == Some("active") {
                    "inactive"
                } else {
                    "active"
                };
                r.set("status", next);
            })?;
            saver.save_table(table)
        })
        .with_dynamic_label("Toggle", |r| {
            if r.get("status").and_then(|v| v.as_str()) == Some("active") {
                "Disable".to_string()
            } else {
                "Enable".to_string()
            }
        })
        .into();

        let okta = table.borrow().get_by_key(&RecordKey::Int(2)).cloned().unwrap();
        assert_eq!(toggle.label_for(Some(&okta)).as_deref(), Some("Disable"));
        view.run_row_action(&toggle, &RecordKey::Int(2)).unwrap();

        let stored = repository.load().unwrap().unwrap();
        let okta = stored.iter().find(|r| r.get("id").unwrap().as_i64() == Some(2)).unwrap();
        assert_eq!(okta.get("status").unwrap().as_str(), Some("inactive"));

        // Filter composes with search
        view.set_filter("type", vec!["oauth".to_string(), "saml".to_string()]).unwrap();
        view.set_filter_value("status", "inactive").unwrap();
        let page = view.render().unwrap();
        assert_eq!(page.total_count, 3);

        view.set_search("o");
        let page = view.render().unwrap();
        let ids: Vec<i64> = page.items.iter().map(|r| r.get("id").unwrap().as_i64().unwrap()).collect();
        assert_eq!(ids, vec![3, 2]);

        // Bulk delete of the whole filtered set
        view.select_all().unwrap();
        let saver = repository.clone();
        let delete: Action = ActionButton::new("Delete selected", SelectionRequirement::Multiple, move |table, target| {
            let keys = target
                .records()
                .iter()
                .map(|r| table.key_of(r))
                .collect::<Result<Vec<_>>>()?;
            table.remove_records(&keys);
            saver.save_table(table)
        })
        .danger()
        .into();
        view.run_bulk_action(&delete).unwrap();

        let page = view.render().unwrap();
        assert_eq!(page.total_count, 0);
        assert!(page.selected_keys.is_empty());

        view.clear_filters();
        view.set_search("");
        let page = view.render().unwrap();
        assert_eq!(page.total_count, 3);
        assert_eq!(page.keys, vec![RecordKey::Int(1), RecordKey::Int(5)]);
        assert_eq!(repository.load().unwrap().unwrap().len(), 3);

        let exported = export_records(&view.selected_records()).unwrap();
        assert_eq!(exported, "[]");
    }

    #[test]
    fn test_changes_outside_the_view_are_picked_up() {
        let mut table = Table::keyed_by("providers", "id");
        table.append_records(seed()).unwrap();
        let table = Rc::new(RefCell::new(table));

        let mut view = TableView::new(table.clone(), vec![Column::field("Name", "name")], vec![]).unwrap();
        view.select(&RecordKey::Int(5)).unwrap();
        assert_eq!(view.render().unwrap().total_count, 5);

        table.borrow_mut().append_record(provider(6, "Auth0", "oauth", "active", 1)).unwrap();
        table.borrow_mut().remove_record(&RecordKey::Int(5)).unwrap();

        let page = view.render().unwrap();
        assert_eq!(page.total_count, 5);
        assert!(page.selected_keys.is_empty());
        assert_eq!(page.keys.last(), Some(&RecordKey::Int(6)));
    }
}
