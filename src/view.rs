/// TableView Implementation
///
/// A `TableView` is the state behind one table page: the columns it shows,
/// the filters on its toolbar, the active sort, the current page and the set
/// of selected rows. It reads its records from a shared parent `Table` and
/// never copies them; the filtered, sorted order is kept as a list of record
/// keys and rebuilt lazily whenever the filters, search, sort or the parent
/// table change.
///
/// The pipeline runs in a fixed order:
///
/// 1. toolbar filters (`apply_filters`)
/// 2. free-text search over `ViewOptions::search_fields`
/// 3. sort by the active column (`apply_sort`)
/// 4. pagination (`paginate`)
///
/// Selection is keyed by `RecordKey` and survives filtering, sorting and
/// paging. Keys that leave the parent table are pruned the next time the
/// view syncs with the table's changeset.

use crate::action::{Action, ActionButton, ActionTarget, SelectionRequirement};
use crate::changeset::RecordChange;
use crate::column::{apply_sort, sortable_column, validate_columns, Column, SortDirection};
use crate::config::ViewOptions;
use crate::error::{Error, Result};
use crate::filter::{apply_filters, matches_search, FilterDescriptor, FilterSet, FilterState};
use crate::record::{Record, RecordKey};
use crate::table::Table;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

// === Pagination ===

/// One page of a longer list
#[derive(Debug, Clone, PartialEq)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    /// Length of the whole list, not of `items`
    pub total_count: usize,
}

/// Slice out page `page` (1-based) of `records`.
///
/// Page 0 is treated as page 1. A page past the end, or a zero page size,
/// yields no items; `total_count` is always the full length.
///
/// ```
/// use tableview::paginate;
///
/// let page = paginate(&[1, 2, 3, 4, 5], 2, 2);
/// assert_eq!(page.items, vec![3, 4]);
/// assert_eq!(page.total_count, 5);
/// ```
pub fn paginate<T: Clone>(records: &[T], page: usize, page_size: usize) -> Paginated<T> {
    let total_count = records.len();
    if page_size == 0 {
        return Paginated { items: Vec::new(), total_count };
    }

    let start = page.saturating_sub(1).saturating_mul(page_size);
    let items = if start >= total_count {
        Vec::new()
    } else {
        let end = start.saturating_add(page_size).min(total_count);
        records[start..end].to_vec()
    };

    Paginated { items, total_count }
}

/// Number of pages needed for `total` items; never less than one.
pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    total.div_ceil(page_size).max(1)
}

/// What a page renders: the visible rows plus the counts the paging
/// controls need.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    pub items: Vec<Record>,
    pub keys: Vec<RecordKey>,
    pub total_count: usize,
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub selected_keys: BTreeSet<RecordKey>,
}

impl PageView {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_selected(&self, key: &RecordKey) -> bool {
        self.selected_keys.contains(key)
    }

    /// Are all rows on this page selected? False for an empty page.
    pub fn all_selected(&self) -> bool {
        !self.keys.is_empty() && self.keys.iter().all(|k| self.selected_keys.contains(k))
    }
}

// === TableView ===

pub struct TableView {
    source: Rc<RefCell<Table>>,
    columns: Vec<Column>,
    filters: FilterSet,
    filter_state: FilterState,
    search: String,
    options: ViewOptions,
    sort: Option<(usize, SortDirection)>,
    page: usize,
    page_size: usize,
    selected: BTreeSet<RecordKey>,
    /// Keys of the filtered, searched and sorted records
    ordered: Vec<RecordKey>,
    stale: bool,
    /// Last synced revision of the parent's changeset
    last_synced_revision: u64,
}

impl TableView {
    pub fn new(source: Rc<RefCell<Table>>, columns: Vec<Column>, filters: Vec<FilterDescriptor>) -> Result<Self> {
        Self::with_options(source, columns, filters, ViewOptions::default())
    }

    /// Build a view, validating the column and filter configuration.
    ///
    /// The view starts on page 1, sorted by the column marked as default
    /// sort (if any), with nothing selected.
    pub fn with_options(
        source: Rc<RefCell<Table>>,
        columns: Vec<Column>,
        filters: Vec<FilterDescriptor>,
        options: ViewOptions,
    ) -> Result<Self> {
        options.validate()?;
        let sort = validate_columns(&columns)?;
        let filters = FilterSet::new(filters)?;
        let revision = source.borrow().revision();

        Ok(TableView {
            source,
            columns,
            filters,
            filter_state: FilterState::new(),
            search: String::new(),
            page_size: options.page_size,
            options,
            sort,
            page: 1,
            selected: BTreeSet::new(),
            ordered: Vec::new(),
            stale: true,
            last_synced_revision: revision,
        })
    }

    pub fn source(&self) -> &Rc<RefCell<Table>> {
        &self.source
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn filter_state(&self) -> &FilterState {
        &self.filter_state
    }

    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    // === Filtering and search ===

    /// Set the selected values of filter `key`; an empty list clears it.
    ///
    /// Resets to page 1.
    pub fn set_filter(&mut self, key: &str, values: Vec<String>) -> Result<()> {
        let descriptor = self
            .filters
            .get(key)
            .ok_or_else(|| Error::UnknownFilter(key.to_string()))?;

        let values: Vec<String> = values.into_iter().filter(|v| !v.is_empty()).collect();
        descriptor.validate_values(&values)?;

        self.filter_state.set(key, values);
        self.page = 1;
        self.stale = true;
        Ok(())
    }

    pub fn set_filter_value(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        self.set_filter(key, vec![value.into()])
    }

    pub fn clear_filter(&mut self, key: &str) -> Result<()> {
        self.set_filter(key, Vec::new())
    }

    pub fn clear_filters(&mut self) {
        if !self.filter_state.is_empty() {
            self.filter_state.clear_all();
            self.page = 1;
            self.stale = true;
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Set the search box text. Resets to page 1 when the text changes.
    pub fn set_search(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.search {
            self.search = text;
            self.page = 1;
            self.stale = true;
        }
    }

    // === Sorting ===

    /// Active sort as (column index, direction)
    pub fn sort(&self) -> Option<(usize, SortDirection)> {
        self.sort
    }

    pub fn sort_column(&self) -> Option<&Column> {
        self.sort.and_then(|(index, _)| self.columns.get(index))
    }

    pub fn sort_by(&mut self, column: usize, direction: SortDirection) -> Result<()> {
        sortable_column(&self.columns, column)?;
        self.sort = Some((column, direction));
        self.stale = true;
        Ok(())
    }

    /// Header click: flip the direction of the active column, or sort a new
    /// column ascending. Returns the resulting direction.
    pub fn toggle_sort(&mut self, column: usize) -> Result<SortDirection> {
        let direction = match self.sort {
            Some((active, direction)) if active == column => direction.reversed(),
            _ => SortDirection::Ascending,
        };
        self.sort_by(column, direction)?;
        Ok(direction)
    }

    /// Back to collection order
    pub fn clear_sort(&mut self) {
        if self.sort.take().is_some() {
            self.stale = true;
        }
    }

    // === Paging ===

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Go to page `page` (1-based). Pages past the end are clamped to the
    /// last page on the next refresh.
    pub fn set_page(&mut self, page: usize) -> Result<()> {
        if page == 0 {
            return Err(Error::InvalidPage);
        }
        self.page = page;
        Ok(())
    }

    /// Change the page size and go back to page 1.
    pub fn set_page_size(&mut self, page_size: usize) -> Result<()> {
        if page_size == 0 {
            return Err(Error::InvalidPageSize);
        }
        if page_size != self.page_size {
            self.page_size = page_size;
            self.page = 1;
        }
        Ok(())
    }

    /// Number of records passing the filters and search
    pub fn total_count(&mut self) -> Result<usize> {
        self.refresh()?;
        Ok(self.ordered.len())
    }

    pub fn page_count(&mut self) -> Result<usize> {
        let total = self.total_count()?;
        Ok(page_count(total, self.page_size))
    }

    // === Selection ===

    /// Flip the selection of `key`, returning whether it is now selected.
    pub fn toggle_selection(&mut self, key: &RecordKey) -> Result<bool> {
        self.sync();
        if !self.source.borrow().contains_key(key) {
            return Err(Error::UnknownRecord(key.clone()));
        }
        if self.selected.remove(key) {
            Ok(false)
        } else {
            self.selected.insert(key.clone());
            Ok(true)
        }
    }

    pub fn select(&mut self, key: &RecordKey) -> Result<()> {
        self.sync();
        if !self.source.borrow().contains_key(key) {
            return Err(Error::UnknownRecord(key.clone()));
        }
        self.selected.insert(key.clone());
        Ok(())
    }

    /// Returns true if `key` was selected
    pub fn deselect(&mut self, key: &RecordKey) -> bool {
        self.selected.remove(key)
    }

    /// Header checkbox: select every row on the current page.
    pub fn select_all_on_page(&mut self) -> Result<()> {
        self.refresh()?;
        let visible = paginate(&self.ordered, self.page, self.page_size);
        self.selected.extend(visible.items);
        Ok(())
    }

    /// Select every record passing the current filters and search.
    pub fn select_all(&mut self) -> Result<()> {
        self.refresh()?;
        self.selected.extend(self.ordered.iter().cloned());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, key: &RecordKey) -> bool {
        self.selected.contains(key) && self.source.borrow().contains_key(key)
    }

    /// Selected keys still present in the parent table
    pub fn selected_keys(&self) -> BTreeSet<RecordKey> {
        let table = self.source.borrow();
        self.selected
            .iter()
            .filter(|k| table.contains_key(k))
            .cloned()
            .collect()
    }

    /// Selected records in collection order
    pub fn selected_records(&self) -> Vec<Record> {
        let table = self.source.borrow();
        table
            .iter()
            .filter(|(key, _)| self.selected.contains(*key))
            .map(|(_, record)| record.clone())
            .collect()
    }

    // === Actions ===

    /// Run a row action against the record with `key`.
    ///
    /// Only buttons requiring a single record can run as row actions. The
    /// view refreshes afterwards whether or not the handler succeeded.
    pub fn run_row_action(&mut self, action: &Action, key: &RecordKey) -> Result<()> {
        let button = runnable(action)?;
        if button.selection() != SelectionRequirement::Single {
            return Err(Error::InvalidActionTarget {
                action: action.name().to_string(),
                target: "a single row".to_string(),
            });
        }

        let record = self
            .source
            .borrow()
            .get_by_key(key)
            .cloned()
            .ok_or_else(|| Error::UnknownRecord(key.clone()))?;

        log::info!("running row action '{}' on {}", action.name(), key);
        let result = button.invoke(&mut self.source.borrow_mut(), ActionTarget::Single(&record));
        self.finish_action(action, result)
    }

    /// Run a toolbar or bulk action against the current selection.
    ///
    /// - `None` actions run with no target
    /// - `Single` actions need exactly one selected record
    /// - `Multiple` actions need at least one
    pub fn run_bulk_action(&mut self, action: &Action) -> Result<()> {
        let button = runnable(action)?;
        self.sync();
        let selected = self.selected_records();

        let target = match button.selection() {
            SelectionRequirement::None => ActionTarget::None,
            SelectionRequirement::Single => match selected.as_slice() {
                [record] => ActionTarget::Single(record),
                _ => {
                    return Err(Error::InvalidActionTarget {
                        action: action.name().to_string(),
                        target: format!("{} selected records", selected.len()),
                    })
                }
            },
            SelectionRequirement::Multiple => {
                if selected.is_empty() {
                    return Err(Error::EmptySelection {
                        action: action.name().to_string(),
                    });
                }
                ActionTarget::Multiple(&selected)
            }
        };

        log::info!("running action '{}' on {} records", action.name(), target.records().len());
        let result = button.invoke(&mut self.source.borrow_mut(), target);
        self.finish_action(action, result)
    }

    fn finish_action(&mut self, action: &Action, result: Result<()>) -> Result<()> {
        if let Err(e) = &result {
            log::warn!("action '{}' failed: {}", action.name(), e);
        }
        let refreshed = self.refresh();
        result?;
        refreshed
    }

    // === Rendering ===

    /// Sync with the parent table and rebuild the record order if anything
    /// changed, then clamp the page into range.
    pub fn refresh(&mut self) -> Result<()> {
        self.sync();
        if self.stale {
            self.rebuild_order()?;
        }

        let last_page = page_count(self.ordered.len(), self.page_size);
        if self.page > last_page {
            log::warn!(
                "page {} is past the end of view over '{}', clamping to {}",
                self.page,
                self.source.borrow().name(),
                last_page
            );
            self.page = last_page;
        }
        Ok(())
    }

    /// Compute the visible page. Calling it twice without any change in
    /// between gives equal results.
    pub fn render(&mut self) -> Result<PageView> {
        self.refresh()?;

        let visible = paginate(&self.ordered, self.page, self.page_size);
        let table = self.source.borrow();
        let items = visible
            .items
            .iter()
            .map(|key| {
                table
                    .get_by_key(key)
                    .cloned()
                    .ok_or_else(|| Error::UnknownRecord(key.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(PageView {
            items,
            keys: visible.items,
            total_count: visible.total_count,
            page: self.page,
            page_size: self.page_size,
            page_count: page_count(visible.total_count, self.page_size),
            selected_keys: self.selected.clone(),
        })
    }

    /// Apply the parent's changes since the last sync: mark the order
    /// stale and drop selected keys that left the table.
    fn sync(&mut self) {
        let table = self.source.borrow();
        let revision = table.revision();
        if revision == self.last_synced_revision {
            return;
        }

        let before = self.selected.len();
        match table.changeset().changes_since(self.last_synced_revision) {
            Some(changes) => {
                for change in changes {
                    match change {
                        RecordChange::Removed { key, .. } => {
                            self.selected.remove(key);
                        }
                        RecordChange::Reset => self.selected.retain(|k| table.contains_key(k)),
                        RecordChange::Inserted { .. } | RecordChange::Updated { .. } => {}
                    }
                }
            }
            // Changes were compacted away; check every key
            None => self.selected.retain(|k| table.contains_key(k)),
        }

        let pruned = before - self.selected.len();
        if pruned > 0 {
            log::debug!("pruned {} selected keys no longer in '{}'", pruned, table.name());
        }

        self.last_synced_revision = revision;
        self.stale = true;
    }

    fn rebuild_order(&mut self) -> Result<()> {
        let table = self.source.borrow();

        let filtered = apply_filters(table.records(), &self.filters, &self.filter_state)?;
        let searched: Vec<&Record> = filtered
            .into_iter()
            .filter(|record| matches_search(record, &self.options.search_fields, &self.search))
            .collect();

        let column = self.sort.and_then(|(index, _)| self.columns.get(index));
        let direction = self.sort.map(|(_, direction)| direction).unwrap_or_default();
        let sorted = apply_sort(searched, column, direction);

        self.ordered = sorted
            .into_iter()
            .map(|record| table.key_of(record))
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "view over '{}' recomputed: {} of {} records",
            table.name(),
            self.ordered.len(),
            table.len()
        );
        self.stale = false;
        Ok(())
    }
}

fn runnable(action: &Action) -> Result<&ActionButton> {
    action.as_button().ok_or_else(|| Error::InvalidActionTarget {
        action: action.name().to_string(),
        target: "any record".to_string(),
    })
}
