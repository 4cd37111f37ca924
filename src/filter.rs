//! Toolbar filters.
//!
//! A `FilterDescriptor` declares one toolbar filter; `FilterState` holds what
//! the user picked. `apply_filters` keeps the records that satisfy every
//! active filter:
//!
//! - select filters (single or multi) match when the field's text equals one
//!   of the selected option values
//! - text filters match when the field contains the typed text, ignoring case
//!
//! Filters compose with AND; values selected within one multi-select filter
//! compose with OR. A record missing the filtered field never matches.

use crate::error::{ConfigError, Error, Result};
use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// How a filter matches records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FilterKind {
    /// Exact match against one selected option
    SingleSelect,
    /// Exact match against any of several selected options
    MultiSelect,
    /// Case-insensitive substring match
    Text,
}

impl FilterKind {
    pub fn is_select(&self) -> bool {
        matches!(self, FilterKind::SingleSelect | FilterKind::MultiSelect)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::SingleSelect => "single-select",
            FilterKind::MultiSelect => "multi-select",
            FilterKind::Text => "text",
        }
    }
}

impl FromStr for FilterKind {
    type Err = ConfigError;

    /// Accepts: "select", "single-select", "multi-select", "string", "text"
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "select" | "single-select" | "singleselect" => Ok(FilterKind::SingleSelect),
            "multi-select" | "multiselect" => Ok(FilterKind::MultiSelect),
            "string" | "text" => Ok(FilterKind::Text),
            _ => Err(ConfigError::UnknownFilterKind(s.to_string())),
        }
    }
}

impl TryFrom<String> for FilterKind {
    type Error = ConfigError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<FilterKind> for String {
    fn from(kind: FilterKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub label: String,
    pub value: String,
}

impl FilterOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        FilterOption {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Declaration of one toolbar filter.
///
/// `field` is the record path the filter reads; it defaults to `key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDescriptor {
    pub key: String,
    pub label: String,
    #[serde(rename = "type", alias = "kind")]
    pub kind: FilterKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FilterOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl FilterDescriptor {
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: FilterKind) -> Self {
        FilterDescriptor {
            key: key.into(),
            label: label.into(),
            kind,
            field: None,
            options: Vec::new(),
            placeholder: None,
        }
    }

    /// Single-select filter over the given options
    pub fn select(key: impl Into<String>, label: impl Into<String>, options: Vec<FilterOption>) -> Self {
        Self::new(key, label, FilterKind::SingleSelect).with_options(options)
    }

    /// Multi-select filter over the given options
    pub fn multi_select(key: impl Into<String>, label: impl Into<String>, options: Vec<FilterOption>) -> Self {
        Self::new(key, label, FilterKind::MultiSelect).with_options(options)
    }

    /// Free-text substring filter
    pub fn text(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FilterKind::Text)
    }

    pub fn with_options(mut self, options: Vec<FilterOption>) -> Self {
        self.options = options;
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Record path this filter reads
    pub fn field(&self) -> &str {
        self.field.as_deref().unwrap_or(&self.key)
    }

    /// Does `record` satisfy this filter for the given selected values?
    ///
    /// Empty `values` impose no constraint.
    pub fn matches(&self, record: &Record, values: &[String]) -> bool {
        if values.is_empty() {
            return true;
        }

        let text = match record.present(self.field()).and_then(|v| v.to_text()) {
            Some(text) => text,
            None => return false,
        };

        match self.kind {
            FilterKind::SingleSelect | FilterKind::MultiSelect => values.iter().any(|v| *v == text),
            FilterKind::Text => {
                let haystack = text.to_lowercase();
                values.iter().any(|v| haystack.contains(&v.to_lowercase()))
            }
        }
    }

    /// Check a candidate value set against this descriptor.
    pub fn validate_values(&self, values: &[String]) -> Result<()> {
        if self.kind == FilterKind::SingleSelect && values.len() > 1 {
            return Err(Error::InvalidFilterValue {
                key: self.key.clone(),
                value: values.join(","),
            });
        }
        if self.kind.is_select() {
            for value in values {
                if !self.options.iter().any(|o| o.value == *value) {
                    return Err(Error::InvalidFilterValue {
                        key: self.key.clone(),
                        value: value.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// A validated, ordered set of filter descriptors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    descriptors: Vec<FilterDescriptor>,
}

impl FilterSet {
    /// Validate descriptors: keys must be unique and select filters need options.
    pub fn new(descriptors: Vec<FilterDescriptor>) -> std::result::Result<Self, ConfigError> {
        let mut keys = HashSet::new();
        for descriptor in &descriptors {
            if !keys.insert(descriptor.key.as_str()) {
                return Err(ConfigError::DuplicateFilterKey(descriptor.key.clone()));
            }
            if descriptor.kind.is_select() && descriptor.options.is_empty() {
                return Err(ConfigError::MissingFilterOptions(descriptor.key.clone()));
            }
        }
        Ok(FilterSet { descriptors })
    }

    /// Parse and validate descriptors from a JSON array.
    ///
    /// Unknown filter kinds are rejected here, before any record is filtered.
    pub fn from_json(json: &str) -> std::result::Result<Self, ConfigError> {
        let descriptors: Vec<FilterDescriptor> =
            serde_json::from_str(json).map_err(|e| ConfigError::InvalidOptions(e.to_string()))?;
        Self::new(descriptors)
    }

    pub fn get(&self, key: &str) -> Option<&FilterDescriptor> {
        self.descriptors.iter().find(|d| d.key == key)
    }

    pub fn descriptors(&self) -> &[FilterDescriptor] {
        &self.descriptors
    }

    pub fn into_descriptors(self) -> Vec<FilterDescriptor> {
        self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Selected values per filter key. A key with no values is inactive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterState {
    values: BTreeMap<String, Vec<String>>,
}

impl FilterState {
    pub fn new() -> Self {
        FilterState {
            values: BTreeMap::new(),
        }
    }

    /// Builder-style single value
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_value(key, value);
        self
    }

    /// Replace the values for `key`; empty strings are dropped.
    pub fn set(&mut self, key: impl Into<String>, values: Vec<String>) {
        let key = key.into();
        let values: Vec<String> = values.into_iter().filter(|v| !v.is_empty()).collect();
        if values.is_empty() {
            self.values.remove(&key);
        } else {
            self.values.insert(key, values);
        }
    }

    /// Set a single value; an empty string clears the filter.
    pub fn set_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.set(key, vec![value.into()]);
    }

    pub fn clear(&mut self, key: &str) {
        self.values.remove(key);
    }

    pub fn clear_all(&mut self) {
        self.values.clear();
    }

    pub fn values(&self, key: &str) -> &[String] {
        self.values.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_active(&self, key: &str) -> bool {
        !self.values(key).is_empty()
    }

    /// Active `(key, values)` pairs in key order
    pub fn active(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Keep the records that satisfy every active filter in `state`.
///
/// Fails with `UnknownFilter` if `state` names a key that `filters` does not
/// declare; the check runs once, before any record is examined.
///
/// # Example
///
/// ```
/// use tableview::{apply_filters, FilterDescriptor, FilterOption, FilterSet, FilterState, Record};
///
/// let records = vec![
///     Record::new().with("id", 1).with("status", "Success"),
///     Record::new().with("id", 2).with("status", "Failed"),
///     Record::new().with("id", 3).with("status", "Success"),
/// ];
/// let filters = FilterSet::new(vec![FilterDescriptor::select(
///     "status",
///     "Status",
///     vec![FilterOption::new("Success", "Success"), FilterOption::new("Failed", "Failed")],
/// )])
/// .unwrap();
///
/// let state = FilterState::new().with("status", "Success");
/// let kept = apply_filters(&records, &filters, &state).unwrap();
/// assert_eq!(kept.len(), 2);
/// ```
pub fn apply_filters<'a, I>(records: I, filters: &FilterSet, state: &FilterState) -> Result<Vec<&'a Record>>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut active = Vec::new();
    for (key, values) in state.active() {
        let descriptor = filters
            .get(key)
            .ok_or_else(|| Error::UnknownFilter(key.to_string()))?;
        active.push((descriptor, values));
    }

    if active.is_empty() {
        return Ok(records.into_iter().collect());
    }

    Ok(records
        .into_iter()
        .filter(|record| active.iter().all(|(descriptor, values)| descriptor.matches(record, values)))
        .collect())
}

/// Does any of `fields` contain `needle`, ignoring case?
///
/// An empty needle matches everything.
pub fn matches_search(record: &Record, fields: &[String], needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let needle = needle.to_lowercase();
    fields.iter().any(|field| {
        record
            .present(field)
            .and_then(|v| v.to_text())
            .map(|text| text.to_lowercase().contains(&needle))
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FieldValue;

    fn logs() -> Vec<Record> {
        vec![
            Record::new().with("id", 1).with("user", "admin@company.com").with("action", "Provider Created").with("status", "Success"),
            Record::new().with("id", 2).with("user", "alice@company.com").with("action", "User Login").with("status", "Success"),
            Record::new().with("id", 3).with("user", "bob@company.com").with("action", "User Login").with("status", "Failed"),
            Record::new().with("id", 4).with("user", "Admin@Company.com").with("action", "Provider Modified").with("status", "Success"),
            Record::new().with("id", 5).with("action", "User Login").with("status", FieldValue::Null),
        ]
    }

    fn filters() -> FilterSet {
        FilterSet::new(vec![
            FilterDescriptor::select(
                "status",
                "Status",
                vec![FilterOption::new("Success", "Success"), FilterOption::new("Failed", "Failed")],
            ),
            FilterDescriptor::multi_select(
                "action",
                "Action",
                vec![
                    FilterOption::new("Provider Created", "Provider Created"),
                    FilterOption::new("Provider Modified", "Provider Modified"),
                    FilterOption::new("User Login", "User Login"),
                ],
            ),
            FilterDescriptor::text("user", "User").with_placeholder("Search by user"),
        ])
        .unwrap()
    }

    fn ids(records: &[&Record]) -> Vec<i64> {
        records.iter().map(|r| r.get("id").unwrap().as_i64().unwrap()).collect()
    }

    #[test]
    fn test_no_active_filters_is_identity() {
        let records = logs();
        let kept = apply_filters(&records, &filters(), &FilterState::new()).unwrap();
        assert_eq!(ids(&kept), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_select_filter_exact_match() {
        let records = logs();
        let state = FilterState::new().with("status", "Success");
        let kept = apply_filters(&records, &filters(), &state).unwrap();
        assert_eq!(ids(&kept), vec![1, 2, 4]);
    }

    #[test]
    fn test_multi_select_is_or_within_key() {
        let records = logs();
        let mut state = FilterState::new();
        state.set("action", vec!["Provider Created".to_string(), "Provider Modified".to_string()]);
        let kept = apply_filters(&records, &filters(), &state).unwrap();
        assert_eq!(ids(&kept), vec![1, 4]);
    }

    #[test]
    fn test_text_filter_ignores_case() {
        let records = logs();
        let state = FilterState::new().with("user", "ADMIN");
        let kept = apply_filters(&records, &filters(), &state).unwrap();
        assert_eq!(ids(&kept), vec![1, 4]);
    }

    #[test]
    fn test_filters_compose_with_and() {
        let records = logs();
        let state = FilterState::new().with("action", "User Login").with("status", "Success");
        let kept = apply_filters(&records, &filters(), &state).unwrap();
        assert_eq!(ids(&kept), vec![2]);
    }

    #[test]
    fn test_missing_field_never_matches() {
        let records = logs();

        // Record 5 has no user and a null status
        let state = FilterState::new().with("user", "@");
        let kept = apply_filters(&records, &filters(), &state).unwrap();
        assert!(!ids(&kept).contains(&5));

        let state = FilterState::new().with("status", "Failed");
        let kept = apply_filters(&records, &filters(), &state).unwrap();
        assert_eq!(ids(&kept), vec![3]);
    }

    #[test]
    fn test_filtered_is_subset_satisfying_every_predicate() {
        let records = logs();
        let set = filters();
        let states = vec![
            FilterState::new().with("status", "Success"),
            FilterState::new().with("user", "company").with("action", "User Login"),
            FilterState::new().with("user", "nobody"),
        ];

        for state in states {
            let kept = apply_filters(&records, &set, &state).unwrap();
            for record in &kept {
                assert!(records.iter().any(|r| r == *record));
                for (key, values) in state.active() {
                    assert!(set.get(key).unwrap().matches(record, values));
                }
            }
        }
    }

    #[test]
    fn test_unknown_filter_key_is_rejected() {
        let records = logs();
        let state = FilterState::new().with("severity", "high");
        let err = apply_filters(&records, &filters(), &state).unwrap_err();
        assert!(matches!(err, Error::UnknownFilter(key) if key == "severity"));
    }

    #[test]
    fn test_empty_value_clears_filter() {
        let mut state = FilterState::new().with("user", "bob");
        assert!(state.is_active("user"));
        state.set_value("user", "");
        assert!(!state.is_active("user"));
        assert!(state.is_empty());
    }

    #[test]
    fn test_filter_kind_parsing() {
        assert_eq!("select".parse::<FilterKind>().unwrap(), FilterKind::SingleSelect);
        assert_eq!("multi_select".parse::<FilterKind>().unwrap(), FilterKind::MultiSelect);
        assert_eq!("string".parse::<FilterKind>().unwrap(), FilterKind::Text);
        assert_eq!(
            "date-range".parse::<FilterKind>().unwrap_err(),
            ConfigError::UnknownFilterKind("date-range".to_string())
        );
    }

    #[test]
    fn test_filter_set_from_json() {
        let json = r#"[
            {"key": "status", "label": "Status", "type": "select",
             "options": [{"label": "Active", "value": "active"}, {"label": "Inactive", "value": "inactive"}]},
            {"key": "providerName", "label": "Provider", "type": "string", "placeholder": "Search by provider name"}
        ]"#;
        let set = FilterSet::from_json(json).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("status").unwrap().kind, FilterKind::SingleSelect);
        assert_eq!(set.get("providerName").unwrap().field(), "providerName");

        let bad = r#"[{"key": "when", "label": "When", "type": "calendar"}]"#;
        let err = FilterSet::from_json(bad).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOptions(msg) if msg.contains("calendar")));
    }

    #[test]
    fn test_filter_set_validation() {
        let err = FilterSet::new(vec![
            FilterDescriptor::text("name", "Name"),
            FilterDescriptor::text("name", "Name again"),
        ])
        .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateFilterKey("name".to_string()));

        let err = FilterSet::new(vec![FilterDescriptor::select("status", "Status", vec![])]).unwrap_err();
        assert_eq!(err, ConfigError::MissingFilterOptions("status".to_string()));
    }

    #[test]
    fn test_validate_values() {
        let set = filters();
        let status = set.get("status").unwrap();
        assert!(status.validate_values(&["Success".to_string()]).is_ok());
        assert!(status.validate_values(&["Pending".to_string()]).is_err());
        assert!(status
            .validate_values(&["Success".to_string(), "Failed".to_string()])
            .is_err());

        let user = set.get("user").unwrap();
        assert!(user.validate_values(&["anything".to_string()]).is_ok());
    }

    #[test]
    fn test_search_across_fields() {
        let record = Record::new().with("name", "Web Server 01").with("host", "webserver-01.example.com");
        let fields = vec!["name".to_string(), "host".to_string()];
        assert!(matches_search(&record, &fields, "server 01"));
        assert!(matches_search(&record, &fields, "EXAMPLE"));
        assert!(!matches_search(&record, &fields, "database"));
        assert!(matches_search(&record, &fields, ""));
    }

    #[test]
    fn test_select_matches_numeric_field_text() {
        let set = FilterSet::new(vec![FilterDescriptor::select(
            "logins",
            "Logins",
            vec![FilterOption::new("None", "0")],
        )
        .with_field("stats.totalLogins")])
        .unwrap();
        let records = vec![
            Record::new().with("id", 1).with("stats", Record::new().with("totalLogins", 0)),
            Record::new().with("id", 2).with("stats", Record::new().with("totalLogins", 89)),
        ];
        let kept = apply_filters(&records, &set, &FilterState::new().with("logins", "0")).unwrap();
        assert_eq!(ids(&kept), vec![1]);
    }
}
