//! Query builder for the REST row-storage surface.
//!
//! Filters are encoded as `column=operator.value` query parameters, ordering
//! as `order=column.asc`, and embedded relations inside `select`, e.g.
//! `select=*,products(id,name,price,image)`.

use reqwest::Method;
use reqwest::header::{ACCEPT, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use super::{BackendClient, BackendError, handle_empty_response, handle_response};

/// Media type requesting a single JSON object instead of an array.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Filter operators supported by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ilike,
}

impl FilterOp {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ilike => "ilike",
        }
    }
}

/// A pending request against one collection.
#[derive(Debug, Clone)]
pub struct Query {
    client: BackendClient,
    collection: String,
    select: Option<String>,
    filters: Vec<(String, FilterOp, String)>,
    order: Vec<(String, bool)>,
    on_conflict: Option<String>,
}

impl Query {
    pub(crate) fn new(client: BackendClient, collection: &str) -> Self {
        Self {
            client,
            collection: collection.to_owned(),
            select: None,
            filters: Vec::new(),
            order: Vec::new(),
            on_conflict: None,
        }
    }

    /// Columns (and embedded relations) to return.
    #[must_use]
    pub fn select(mut self, columns: &str) -> Self {
        self.select = Some(columns.to_owned());
        self
    }

    /// Keep rows where `column` equals `value`.
    #[must_use]
    pub fn eq(self, column: &str, value: impl std::fmt::Display) -> Self {
        self.filter(column, FilterOp::Eq, value.to_string())
    }

    /// Case-insensitive substring match on `column`.
    ///
    /// `%`, `_` and `\` in the needle are escaped so they match literally.
    /// `*` is the REST surface's alias for `%` and has no literal escape, so it
    /// is dropped from the needle.
    #[must_use]
    pub fn ilike_contains(self, column: &str, needle: &str) -> Self {
        let mut pattern = String::with_capacity(needle.len() + 2);
        pattern.push('*');
        for c in needle.chars() {
            match c {
                '*' => {}
                '%' | '_' | '\\' => {
                    pattern.push('\\');
                    pattern.push(c);
                }
                _ => pattern.push(c),
            }
        }
        pattern.push('*');
        self.filter(column, FilterOp::Ilike, pattern)
    }

    /// Order by `column`; repeated calls add tie-breakers.
    #[must_use]
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order.push((column.to_owned(), ascending));
        self
    }

    /// Columns that identify a duplicate for [`Query::upsert`].
    #[must_use]
    pub fn on_conflict(mut self, columns: &str) -> Self {
        self.on_conflict = Some(columns.to_owned());
        self
    }

    fn filter(mut self, column: &str, op: FilterOp, value: String) -> Self {
        self.filters.push((column.to_owned(), op, value));
        self
    }

    /// Encoded query-string parameters.
    pub(crate) fn params(&self) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(self.filters.len() + 3);
        if let Some(select) = &self.select {
            params.push(("select".to_owned(), select.clone()));
        }
        for (column, op, value) in &self.filters {
            params.push((column.clone(), format!("{}.{value}", op.as_str())));
        }
        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|(column, asc)| format!("{column}.{}", if *asc { "asc" } else { "desc" }))
                .collect::<Vec<_>>()
                .join(",");
            params.push(("order".to_owned(), order));
        }
        if let Some(columns) = &self.on_conflict {
            params.push(("on_conflict".to_owned(), columns.clone()));
        }
        params
    }

    fn request(&self, method: Method) -> Result<reqwest::RequestBuilder, BackendError> {
        let url = self.client.url(&format!("rest/v1/{}", self.collection))?;
        let request = self
            .client
            .http()
            .request(method, url)
            .query(&self.params());
        self.client.authorize(request)
    }

    /// Fetch every matching row.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the request fails or rows do not decode.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn fetch_all<T: DeserializeOwned>(self) -> Result<Vec<T>, BackendError> {
        let response = self.request(Method::GET)?.send().await?;
        handle_response(response).await
    }

    /// Fetch exactly one row.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if zero or several rows match.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn fetch_one<T: DeserializeOwned>(self) -> Result<T, BackendError> {
        let response = self
            .request(Method::GET)?
            .header(ACCEPT, HeaderValue::from_static(SINGLE_OBJECT))
            .send()
            .await?;
        handle_response(response).await
    }

    /// Fetch at most one row, mapping "no row" to `None`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` for any failure other than a missing row.
    pub async fn fetch_optional<T: DeserializeOwned>(self) -> Result<Option<T>, BackendError> {
        match self.fetch_one().await {
            Ok(row) => Ok(Some(row)),
            Err(BackendError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Insert one row and return it as stored.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the insert is rejected.
    #[instrument(skip(self, body), fields(collection = %self.collection))]
    pub async fn insert<B, T>(self, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        self.write(Method::POST, body, "return=representation").await
    }

    /// Insert one row, or overwrite the row matching `on_conflict`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the write is rejected.
    #[instrument(skip(self, body), fields(collection = %self.collection))]
    pub async fn upsert<B, T>(self, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        self.write(
            Method::POST,
            body,
            "resolution=merge-duplicates,return=representation",
        )
        .await
    }

    /// Patch the single matching row and return it.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if no row matches the filters.
    #[instrument(skip(self, body), fields(collection = %self.collection))]
    pub async fn update<B, T>(self, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        self.write(Method::PATCH, body, "return=representation").await
    }

    /// Delete every matching row.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the delete is rejected.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn delete(self) -> Result<(), BackendError> {
        if self.filters.is_empty() {
            return Err(BackendError::InvalidRequest(format!(
                "refusing unfiltered delete on {}",
                self.collection
            )));
        }
        let response = self.request(Method::DELETE)?.send().await?;
        handle_empty_response(response).await
    }

    async fn write<B, T>(self, method: Method, body: &B, prefer: &'static str) -> Result<T, BackendError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .request(method)?
            .header("Prefer", HeaderValue::from_static(prefer))
            .header(ACCEPT, HeaderValue::from_static(SINGLE_OBJECT))
            .json(body)
            .send()
            .await?;
        handle_response(response).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{AdminConfig, TEST_ANON_KEY};
    use crate::session::SessionStore;

    fn client() -> BackendClient {
        let config = AdminConfig::for_tests("https://backend.test/");
        BackendClient::new(&config, SessionStore::new()).unwrap()
    }

    #[test]
    fn test_params_for_filtered_ordered_select() {
        let query = client()
            .from("products")
            .select("*")
            .eq("category_id", 4)
            .ilike_contains("name", "tea")
            .order("name", true);

        assert_eq!(
            query.params(),
            vec![
                ("select".to_owned(), "*".to_owned()),
                ("category_id".to_owned(), "eq.4".to_owned()),
                ("name".to_owned(), "ilike.*tea*".to_owned()),
                ("order".to_owned(), "name.asc".to_owned()),
            ]
        );
    }

    #[test]
    fn test_ilike_escapes_like_wildcards() {
        let query = client().from("products").ilike_contains("name", "50% off_now");
        assert_eq!(
            query.params(),
            vec![("name".to_owned(), r"ilike.*50\% off\_now*".to_owned())]
        );
    }

    #[test]
    fn test_ilike_drops_star_and_escapes_backslash() {
        let query = client().from("products").ilike_contains("name", r"g*reen\tea");
        assert_eq!(
            query.params(),
            vec![("name".to_owned(), r"ilike.*green\\tea*".to_owned())]
        );
    }

    #[test]
    fn test_params_multi_order() {
        let query = client()
            .from("orders")
            .eq("vendor_id", "v1")
            .order("created_at", false)
            .order("id", true);

        assert_eq!(
            query.params(),
            vec![
                ("vendor_id".to_owned(), "eq.v1".to_owned()),
                ("order".to_owned(), "created_at.desc,id.asc".to_owned()),
            ]
        );
    }

    #[test]
    fn test_params_on_conflict() {
        let query = client().from("cart_items").on_conflict("user_id,product_id");
        assert_eq!(
            query.params(),
            vec![("on_conflict".to_owned(), "user_id,product_id".to_owned())]
        );
    }

    #[tokio::test]
    async fn test_unfiltered_delete_is_refused() {
        let err = client().from("cart_items").delete().await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidRequest(_)));
    }

    #[test]
    fn test_bearer_falls_back_to_anon_key() {
        let client = client();
        let header = client.bearer().unwrap();
        assert!(header.is_sensitive());
        assert_eq!(header.to_str().unwrap(), format!("Bearer {TEST_ANON_KEY}"));
    }
}
