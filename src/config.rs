/// View configuration
///
/// `ViewOptions` carries the per-page settings a table page is built with.
/// Every field has a default, so a JSON document only needs the fields it
/// changes:
///
/// ```
/// use tableview::ViewOptions;
///
/// let options = ViewOptions::from_json(r#"{"page_size": 10, "search_fields": ["name"]}"#).unwrap();
/// assert_eq!(options.page_size, 10);
/// assert_eq!(options.page_size_options, vec![10, 20, 50, 100]);
/// ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewOptions {
    /// Rows per page when the view opens
    pub page_size: usize,
    /// Choices offered by the per-page control
    pub page_size_options: Vec<usize>,
    /// Fields searched by the free-text search box
    pub search_fields: Vec<String>,
}

impl Default for ViewOptions {
    fn default() -> Self {
        ViewOptions {
            page_size: DEFAULT_PAGE_SIZE,
            page_size_options: vec![10, 20, 50, 100],
            search_fields: Vec::new(),
        }
    }
}

impl ViewOptions {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_search_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Parse and validate options from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let options: ViewOptions =
            serde_json::from_str(json).map_err(|e| ConfigError::InvalidOptions(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::InvalidOptions("page_size must be greater than zero".to_string()));
        }
        if self.page_size_options.contains(&0) {
            return Err(ConfigError::InvalidOptions(
                "page_size_options must all be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
