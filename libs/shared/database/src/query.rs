//! PostgREST query strings.
//!
//! A [`TableQuery`] names a table and accumulates the horizontal filters,
//! ordering and limit of a request. Filter values are percent-encoded so
//! timestamps with `+` offsets and free-text search terms survive the trip.

use std::fmt::Display;

#[derive(Debug, Clone)]
pub struct TableQuery {
    table: String,
    select: Option<String>,
    params: Vec<(String, String)>,
}

impl TableQuery {
    pub fn table(name: &str) -> Self {
        Self {
            table: name.to_string(),
            select: None,
            params: Vec::new(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Column list, including embedded resources such as
    /// `*,profile:profiles!profile_id(first_name,last_name)`.
    pub fn select(mut self, columns: &str) -> Self {
        let compact: String = columns.split_whitespace().collect();
        self.select = Some(compact);
        self
    }

    fn filter(mut self, column: &str, op: &str, value: impl Display) -> Self {
        self.params.push((column.to_string(), format!("{}.{}", op, value)));
        self
    }

    pub fn eq(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "eq", value)
    }

    pub fn neq(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "neq", value)
    }

    pub fn gte(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "gte", value)
    }

    pub fn lte(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "lte", value)
    }

    /// Case-insensitive pattern match; `*` is the wildcard.
    pub fn ilike(self, column: &str, pattern: &str) -> Self {
        self.filter(column, "ilike", pattern)
    }

    /// Disjunction of raw PostgREST conditions, e.g. `first_name.ilike.*ana*`.
    pub fn or(mut self, conditions: &[String]) -> Self {
        self.params
            .push(("or".to_string(), format!("({})", conditions.join(","))));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.params
            .push(("order".to_string(), format!("{}.{}", column, direction)));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.params.push(("limit".to_string(), limit.to_string()));
        self
    }

    pub fn on_conflict(mut self, columns: &str) -> Self {
        self.params
            .push(("on_conflict".to_string(), columns.to_string()));
        self
    }

    pub fn has_filters(&self) -> bool {
        self.params
            .iter()
            .any(|(key, _)| !matches!(key.as_str(), "order" | "limit" | "on_conflict"))
    }

    /// Path relative to the project URL, e.g. `/rest/v1/appointments?doctor_id=eq.42`.
    pub fn to_path(&self) -> String {
        let mut pairs: Vec<String> = Vec::with_capacity(self.params.len() + 1);

        if let Some(columns) = &self.select {
            pairs.push(format!("select={}", urlencoding::encode(columns)));
        }

        for (key, value) in &self.params {
            pairs.push(format!("{}={}", key, urlencoding::encode(value)));
        }

        if pairs.is_empty() {
            format!("/rest/v1/{}", self.table)
        } else {
            format!("/rest/v1/{}?{}", self.table, pairs.join("&"))
        }
    }
}

/// Strips characters that carry meaning inside a PostgREST `or=(...)` list.
pub fn sanitize_search_term(term: &str) -> String {
    term.chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '*' | '"'))
        .collect::<String>()
        .trim()
        .to_string()
}
