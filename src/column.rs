/// TableView Column Descriptors
///
/// A Column describes how one table column is displayed and ordered: a
/// header, a cell renderer, and an optional sort accessor (a field path or a
/// computed value). At most one column may be the default sort.
///
/// `apply_sort` orders records by a column's accessor. The sort is stable,
/// and descending order reverses the comparison rather than the result, so
/// records with equal sort values keep their relative order in both
/// directions. Records without a value always sort last.

use crate::error::{ConfigError, Error, Result};
use crate::record::Record;
use crate::value::FieldValue;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc", alias = "ascending")]
    Ascending,
    #[serde(rename = "desc", alias = "descending")]
    Descending,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            _ => Err(format!("Unknown sort direction: '{}'. Use 'asc' or 'desc'", s)),
        }
    }
}

pub type CellRenderer = Rc<dyn Fn(&Record) -> String>;

/// Where a column's sort value comes from
#[derive(Clone)]
pub enum SortAccessor {
    /// Field path, e.g. `name` or `stats.totalLogins`
    Field(String),
    /// Value computed from the whole record
    Computed(Rc<dyn Fn(&Record) -> FieldValue>),
}

impl SortAccessor {
    /// Sort value for `record`; `None` when the value is missing or null.
    pub fn value(&self, record: &Record) -> Option<FieldValue> {
        match self {
            SortAccessor::Field(path) => record.present(path).cloned(),
            SortAccessor::Computed(f) => Some(f(record)).filter(|v| !v.is_null()),
        }
    }
}

impl fmt::Debug for SortAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortAccessor::Field(path) => f.debug_tuple("Field").field(path).finish(),
            SortAccessor::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

#[derive(Clone)]
pub struct Column {
    header: String,
    cell: CellRenderer,
    sort: Option<SortAccessor>,
    default_sort: bool,
    default_sort_direction: SortDirection,
}

impl Column {
    /// Column showing one field, sortable by that field.
    pub fn field(header: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        let cell_path = path.clone();
        Column {
            header: header.into(),
            cell: Rc::new(move |record: &Record| {
                record.lookup(&cell_path).map(|v| v.to_string()).unwrap_or_default()
            }),
            sort: Some(SortAccessor::Field(path)),
            default_sort: false,
            default_sort_direction: SortDirection::Ascending,
        }
    }

    /// Column rendered by a closure; not sortable until given an accessor.
    pub fn computed<F>(header: impl Into<String>, cell: F) -> Self
    where
        F: Fn(&Record) -> String + 'static,
    {
        Column {
            header: header.into(),
            cell: Rc::new(cell),
            sort: None,
            default_sort: false,
            default_sort_direction: SortDirection::Ascending,
        }
    }

    pub fn with_cell<F>(mut self, cell: F) -> Self
    where
        F: Fn(&Record) -> String + 'static,
    {
        self.cell = Rc::new(cell);
        self
    }

    pub fn sort_by_field(mut self, path: impl Into<String>) -> Self {
        self.sort = Some(SortAccessor::Field(path.into()));
        self
    }

    pub fn sort_with<F>(mut self, accessor: F) -> Self
    where
        F: Fn(&Record) -> FieldValue + 'static,
    {
        self.sort = Some(SortAccessor::Computed(Rc::new(accessor)));
        self
    }

    pub fn unsortable(mut self) -> Self {
        self.sort = None;
        self
    }

    /// Mark this column as the view's initial sort.
    pub fn default_sort(mut self, direction: SortDirection) -> Self {
        self.default_sort = true;
        self.default_sort_direction = direction;
        self
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn render(&self, record: &Record) -> String {
        (self.cell)(record)
    }

    pub fn is_sortable(&self) -> bool {
        self.sort.is_some()
    }

    pub fn sort_accessor(&self) -> Option<&SortAccessor> {
        self.sort.as_ref()
    }

    pub fn sort_value(&self, record: &Record) -> Option<FieldValue> {
        self.sort.as_ref().and_then(|s| s.value(record))
    }

    pub fn is_default_sort(&self) -> bool {
        self.default_sort
    }

    pub fn default_sort_direction(&self) -> SortDirection {
        self.default_sort_direction
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("header", &self.header)
            .field("sort", &self.sort)
            .field("default_sort", &self.default_sort)
            .field("default_sort_direction", &self.default_sort_direction)
            .finish()
    }
}

/// Check column descriptors and find the default sort.
///
/// Returns the index and direction of the default-sort column, or `None`
/// when no column is marked (the view then keeps insertion order).
pub fn validate_columns(columns: &[Column]) -> std::result::Result<Option<(usize, SortDirection)>, ConfigError> {
    let mut default: Option<usize> = None;

    for (index, column) in columns.iter().enumerate() {
        if !column.default_sort {
            continue;
        }
        if let Some(first) = default {
            return Err(ConfigError::MultipleDefaultSorts {
                first: columns[first].header.clone(),
                second: column.header.clone(),
            });
        }
        if !column.is_sortable() {
            return Err(ConfigError::DefaultSortNotSortable(column.header.clone()));
        }
        default = Some(index);
    }

    Ok(default.map(|i| (i, columns[i].default_sort_direction)))
}

/// Compare two sort values; absent values go last regardless of direction.
fn compare_sort_values(a: &Option<FieldValue>, b: &Option<FieldValue>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match direction {
            SortDirection::Ascending => a.compare(b),
            SortDirection::Descending => a.compare(b).reverse(),
        },
    }
}

/// Stable sort of `records` by `column`.
///
/// With no column, or an unsortable one, the input order is returned as is.
///
/// # Example
///
/// ```
/// use tableview::{apply_sort, Column, Record, SortDirection};
///
/// let records = vec![
///     Record::new().with("id", 1),
///     Record::new().with("id", 3),
///     Record::new().with("id", 2),
/// ];
/// let by_id = Column::field("ID", "id");
///
/// let sorted = apply_sort(records.iter().collect(), Some(&by_id), SortDirection::Descending);
/// let ids: Vec<i64> = sorted.iter().map(|r| r.get("id").unwrap().as_i64().unwrap()).collect();
/// assert_eq!(ids, vec![3, 2, 1]);
/// ```
pub fn apply_sort<'a>(records: Vec<&'a Record>, column: Option<&Column>, direction: SortDirection) -> Vec<&'a Record> {
    let accessor = match column.and_then(|c| c.sort_accessor()) {
        Some(accessor) => accessor,
        None => return records,
    };

    // Extract each sort value once rather than on every comparison
    let mut keyed: Vec<(Option<FieldValue>, &'a Record)> =
        records.into_iter().map(|r| (accessor.value(r), r)).collect();
    keyed.sort_by(|(a, _), (b, _)| compare_sort_values(a, b, direction));
    keyed.into_iter().map(|(_, r)| r).collect()
}

/// Validate and return the sort target for a column index.
pub(crate) fn sortable_column(columns: &[Column], index: usize) -> Result<&Column> {
    let column = columns
        .get(index)
        .ok_or(Error::UnknownColumn(index))?;
    if !column.is_sortable() {
        return Err(Error::ColumnNotSortable(column.header.clone()));
    }
    Ok(column)
}
