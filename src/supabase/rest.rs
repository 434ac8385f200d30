use std::fmt::Display;

use reqwest::Method;
use serde::{Serialize, de::DeserializeOwned};

use super::{SupabaseClient, check_status};
use crate::error::{AppError, Result};

/// A PostgREST request against one table, built up with filters.
///
/// Mirrors the `from(table).select().eq(...)` chaining of the hosted client
/// libraries. Mutations without a filter are refused.
#[must_use]
pub struct TableQuery<'a> {
    client: &'a SupabaseClient,
    table: &'static str,
    filters: Vec<(String, String)>,
    modifiers: Vec<(String, String)>,
}

impl SupabaseClient {
    pub fn table(&self, table: &'static str) -> TableQuery<'_> {
        TableQuery {
            client: self,
            table,
            filters: Vec::new(),
            modifiers: Vec::new(),
        }
    }
}

impl<'a> TableQuery<'a> {
    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.filters.push((column.to_string(), format!("eq.{}", value)));
        self
    }

    pub fn in_list(mut self, column: &str, values: &[String]) -> Self {
        self.filters
            .push((column.to_string(), format!("in.({})", values.join(","))));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let dir = if ascending { "asc" } else { "desc" };
        self.modifiers
            .push(("order".to_string(), format!("{}.{}", column, dir)));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.modifiers.push(("limit".to_string(), n.to_string()));
        self
    }

    fn path(&self) -> String {
        format!("/rest/v1/{}", self.table)
    }

    fn params(&self) -> Vec<(String, String)> {
        self.filters
            .iter()
            .chain(self.modifiers.iter())
            .cloned()
            .collect()
    }

    fn require_filter(&self, op: &str) -> Result<()> {
        if self.filters.is_empty() {
            return Err(AppError::Internal(format!(
                "refusing unfiltered {} on {}",
                op, self.table
            )));
        }
        Ok(())
    }

    pub async fn select<T: DeserializeOwned>(self) -> Result<Vec<T>> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(self.params());

        let response = self
            .client
            .privileged(Method::GET, &self.path())
            .query(&params)
            .send()
            .await?;
        let response = check_status(response, &format!("select from {}", self.table)).await?;
        Ok(response.json().await?)
    }

    pub async fn maybe_single<T: DeserializeOwned>(self) -> Result<Option<T>> {
        let rows: Vec<T> = self.limit(1).select().await?;
        Ok(rows.into_iter().next())
    }

    /// Insert one row or an array of rows, returning what was stored.
    pub async fn insert<B, T>(self, rows: &B) -> Result<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .privileged(Method::POST, &self.path())
            .header("Prefer", "return=representation")
            .json(rows)
            .send()
            .await?;
        let response = check_status(response, &format!("insert into {}", self.table)).await?;
        Ok(response.json().await?)
    }

    pub async fn insert_one<B, T>(self, row: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let table = self.table;
        self.insert::<B, T>(row)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Upstream(format!("insert into {} returned no row", table)))
    }

    pub async fn update<B, T>(self, patch: &B) -> Result<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.require_filter("update")?;
        let response = self
            .client
            .privileged(Method::PATCH, &self.path())
            .header("Prefer", "return=representation")
            .query(&self.params())
            .json(patch)
            .send()
            .await?;
        let response = check_status(response, &format!("update {}", self.table)).await?;
        Ok(response.json().await?)
    }

    /// Delete matching rows, returning the rows that were removed.
    pub async fn delete<T: DeserializeOwned>(self) -> Result<Vec<T>> {
        self.require_filter("delete")?;
        let response = self
            .client
            .privileged(Method::DELETE, &self.path())
            .header("Prefer", "return=representation")
            .query(&self.params())
            .send()
            .await?;
        let response = check_status(response, &format!("delete from {}", self.table)).await?;
        Ok(response.json().await?)
    }
}
