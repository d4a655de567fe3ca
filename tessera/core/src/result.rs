use tessera_common::value::ScalarValue;

/// Rows produced by a statement.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct QueryResult {
    pub(crate) columns: Vec<String>,
    pub(crate) rows: Vec<Vec<ScalarValue>>,
}

impl QueryResult {
    pub(crate) fn new(columns: Vec<String>, rows: Vec<Vec<ScalarValue>>) -> Self {
        Self { columns, rows }
    }

    /// A single-row result carrying a status message.
    pub(crate) fn message(message: impl Into<String>) -> Self {
        Self::new(
            vec!["result".into()],
            vec![vec![ScalarValue::from(message.into())]],
        )
    }

    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[inline]
    pub fn rows(&self) -> &[Vec<ScalarValue>] {
        &self.rows
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl IntoIterator for QueryResult {
    type IntoIter = std::vec::IntoIter<Vec<ScalarValue>>;
    type Item = Vec<ScalarValue>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}
