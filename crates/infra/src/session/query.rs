//! `ExecuteBillQuery` helpers
//!
//! Bill queries return positional rows: one array per record, one cell per
//! requested field key. [`rows_to_objects`] turns them back into keyed
//! objects.

use k3bridge_domain::constants::{BILL_QUERY_PAGE_SIZE, EXECUTE_BILL_QUERY};
use k3bridge_domain::utils::params::split_list;
use k3bridge_domain::{OperationRequest, Result};
use serde_json::{json, Map, Value};
use tracing::{debug, instrument};

use super::client::SessionClient;

/// Parameters of one `ExecuteBillQuery` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BillQuery {
    /// Business object id, e.g. `BD_MATERIAL`.
    pub form_id: String,
    /// Columns to return, in row order.
    pub field_keys: Vec<String>,
    /// Server-side filter expression.
    pub filter_string: String,
    /// Server-side sort expression.
    pub order_string: String,
    /// Zero-based offset of the first row.
    pub start_row: u32,
    /// 0 lets the server decide.
    pub limit: u32,
}

impl BillQuery {
    /// Unfiltered, unpaged query.
    pub fn new(form_id: impl Into<String>, field_keys: Vec<String>) -> Self {
        Self { form_id: form_id.into(), field_keys, ..Self::default() }
    }

    /// Set the filter expression.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter_string = filter.into();
        self
    }

    /// Set the sort expression.
    pub fn with_order(mut self, order: impl Into<String>) -> Self {
        self.order_string = order.into();
        self
    }

    /// Set the row window.
    pub fn with_page(mut self, start_row: u32, limit: u32) -> Self {
        self.start_row = start_row;
        self.limit = limit;
        self
    }

    /// The single positional parameter the service expects.
    pub fn to_parameter(&self) -> Value {
        json!({
            "FormId": self.form_id,
            "FieldKeys": self.field_keys.join(","),
            "FilterString": self.filter_string,
            "OrderString": self.order_string,
            "StartRow": self.start_row,
            "Limit": self.limit,
        })
    }

    /// The `ExecuteBillQuery` call for this query.
    pub fn to_request(&self) -> OperationRequest {
        OperationRequest::dynamic_form(EXECUTE_BILL_QUERY, vec![self.to_parameter()])
    }
}

impl SessionClient {
    /// Run one bill query and return its rows as-is.
    ///
    /// # Errors
    /// Same as [`SessionClient::call`].
    pub async fn bill_query(&self, query: &BillQuery) -> Result<Vec<Value>> {
        Ok(into_rows(self.call(&query.to_request()).await?))
    }

    /// Page through a bill query until the server returns a short page.
    ///
    /// `start_row` of `query` is the first row fetched; `limit` is ignored.
    ///
    /// # Errors
    /// The first failing page aborts the walk.
    #[instrument(skip(self, query), fields(form_id = %query.form_id))]
    pub async fn bill_query_all(&self, query: &BillQuery) -> Result<Vec<Value>> {
        let page_size = BILL_QUERY_PAGE_SIZE;
        let mut rows = Vec::new();
        let mut start_row = query.start_row;

        loop {
            let page_query = query.clone().with_page(start_row, page_size);
            let page = self.bill_query(&page_query).await?;
            let fetched = page.len();
            debug!(start_row, fetched, "fetched bill query page");
            rows.extend(page);

            if fetched < page_size as usize {
                break;
            }
            start_row = start_row.saturating_add(fetched as u32);
        }

        Ok(rows)
    }
}

fn into_rows(payload: Value) -> Vec<Value> {
    match payload {
        Value::Array(rows) => rows,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Key positional rows by `field_keys`.
///
/// A list of rows yields one object per row; a single flat row yields one
/// object. Missing cells and blank strings become `null`. Anything else
/// yields nothing.
pub fn rows_to_objects(rows: &Value, field_keys: &[String]) -> Vec<Value> {
    let Some(items) = rows.as_array().filter(|items| !items.is_empty()) else {
        return Vec::new();
    };

    if items.iter().all(Value::is_array) {
        items
            .iter()
            .filter_map(Value::as_array)
            .map(|row| row_to_object(row, field_keys))
            .collect()
    } else {
        vec![row_to_object(items, field_keys)]
    }
}

fn row_to_object(row: &[Value], field_keys: &[String]) -> Value {
    let object: Map<String, Value> = field_keys
        .iter()
        .enumerate()
        .map(|(position, key)| {
            let cell = match row.get(position) {
                Some(Value::String(text)) if text.trim().is_empty() => Value::Null,
                Some(value) => value.clone(),
                None => Value::Null,
            };
            (key.clone(), cell)
        })
        .collect();
    Value::Object(object)
}

/// Concatenate field-key lists, dropping blanks and repeats. First
/// occurrence wins.
pub fn merge_field_keys<I, S>(lists: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut merged: Vec<String> = Vec::new();
    for list in lists {
        for key in split_list(list.as_ref()) {
            if !merged.contains(&key) {
                merged.push(key);
            }
        }
    }
    merged
}
