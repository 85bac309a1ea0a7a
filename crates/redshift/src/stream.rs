//! Lazily paged result rows.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::stream::{self, Stream};
use tracing::debug;

use redshift_data_core::error::Result;
use redshift_data_core::StatementHandle;

use crate::api::DataApi;
use crate::dispatcher::Dispatcher;
use crate::result::{ColumnMetadata, Record, ResultPage, StatementResult};

/// Records of a finished statement.
///
/// The first page is fetched up front; later pages are requested through the
/// client's dispatcher only when the buffered records run out.
pub struct RowStream {
    api: Arc<dyn DataApi>,
    dispatcher: Arc<Dispatcher>,
    statement_id: StatementHandle,
    columns: Vec<ColumnMetadata>,
    total_num_rows: i64,
    buffer: VecDeque<Record>,
    next_token: Option<String>,
    pages_fetched: usize,
    failed: bool,
}

impl RowStream {
    pub(crate) fn from_first_page(
        api: Arc<dyn DataApi>,
        dispatcher: Arc<Dispatcher>,
        statement_id: StatementHandle,
        page: ResultPage,
    ) -> Self {
        Self {
            api,
            dispatcher,
            statement_id,
            columns: page.columns,
            total_num_rows: page.total_num_rows,
            buffer: page.records.into(),
            next_token: page.next_token,
            pages_fetched: 1,
            failed: false,
        }
    }

    pub fn statement_id(&self) -> &StatementHandle {
        &self.statement_id
    }

    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    /// Total rows reported by the provider across all pages.
    pub fn total_num_rows(&self) -> i64 {
        self.total_num_rows
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Next record, fetching another page if needed. `None` once every page
    /// has been consumed or after an error has been returned.
    pub async fn next_record(&mut self) -> Option<Result<Record>> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Some(Ok(record));
            }
            if self.failed {
                return None;
            }
            let token = self.next_token.take()?;

            let api = self.api.clone();
            let id = self.statement_id.clone();
            let page = self
                .dispatcher
                .dispatch("get_statement_result", async move {
                    api.get_statement_result(&id, Some(token)).await
                })
                .await;

            match page {
                Ok(page) => {
                    self.pages_fetched += 1;
                    debug!(
                        statement_id = %self.statement_id,
                        page = self.pages_fetched,
                        records = page.records.len(),
                        "Fetched result page"
                    );
                    self.buffer.extend(page.records);
                    self.next_token = page.next_token;
                }
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }

    /// Adapt into a [`Stream`] of records.
    pub fn into_stream(self) -> impl Stream<Item = Result<Record>> + Send {
        stream::unfold(self, |mut rows| async move {
            rows.next_record().await.map(|item| (item, rows))
        })
    }

    /// Drain every page into a [`StatementResult`].
    pub async fn collect(mut self) -> Result<StatementResult> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record().await {
            records.push(record?);
        }
        Ok(StatementResult {
            statement_id: self.statement_id,
            columns: self.columns,
            records,
            total_num_rows: self.total_num_rows,
        })
    }
}
