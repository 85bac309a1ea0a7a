//! Redshift Data API client.
//!
//! Provides [`RedshiftDataClient`], which validates statements on the calling
//! thread and runs every network call on its [`Dispatcher`]. Each operation
//! returns a [`Completion`] immediately.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use redshift_data_core::error::Result;
use redshift_data_core::{
    ConnectionConfig, DatabaseConfig, ParameterizedQuery, PollConfig, RedshiftDataError,
    StatementDescription, StatementHandle,
};

use crate::api::DataApi;
use crate::dispatcher::{Completion, Dispatcher};
use crate::poller::poll_until_terminal;
use crate::request::{build_batch_request, build_execute_request, StatementOptions};
use crate::sdk::SdkDataApi;
use crate::stream::RowStream;

pub struct RedshiftDataClient {
    api: Arc<dyn DataApi>,
    database: DatabaseConfig,
    poll: PollConfig,
    dispatcher: Arc<Dispatcher>,
    closed: AtomicBool,
}

impl RedshiftDataClient {
    /// Validate `config`, resolve credentials, and start the worker pool.
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        config.validate()?;
        let api = SdkDataApi::from_config(&config)?;
        let dispatcher = Dispatcher::new(config.worker_threads)?;

        info!(
            region = %config.region,
            database = %config.database.database,
            worker_threads = config.worker_threads,
            "RedshiftDataClient initialised"
        );

        Self::with_api(Arc::new(api), config.database, config.poll, dispatcher)
    }

    /// Build a client over any [`DataApi`] and dispatcher.
    pub fn with_api(
        api: Arc<dyn DataApi>,
        database: DatabaseConfig,
        poll: PollConfig,
        dispatcher: Dispatcher,
    ) -> Result<Self> {
        database
            .validate()
            .map_err(|e| RedshiftDataError::Configuration(e.to_string()))?;
        poll.validate()?;

        Ok(Self {
            api,
            database,
            poll,
            dispatcher: Arc::new(dispatcher),
            closed: AtomicBool::new(false),
        })
    }

    pub fn database(&self) -> &DatabaseConfig {
        &self.database
    }

    pub fn poll_config(&self) -> &PollConfig {
        &self.poll
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    // -----------------------------------------------------------------------
    // Public API
    // -----------------------------------------------------------------------

    /// Submit one statement. Resolves to its id as soon as the provider
    /// accepts it; use [`Self::wait_for_statement`] to wait for completion.
    pub fn execute_statement(
        &self,
        query: ParameterizedQuery,
        database: Option<DatabaseConfig>,
    ) -> Result<Completion<StatementHandle>> {
        self.execute_statement_with(query, database, StatementOptions::default())
    }

    pub fn execute_statement_with(
        &self,
        query: ParameterizedQuery,
        database: Option<DatabaseConfig>,
        options: StatementOptions,
    ) -> Result<Completion<StatementHandle>> {
        self.ensure_open()?;
        let target = database.as_ref().unwrap_or(&self.database);
        let request = build_execute_request(&query, target, &options)?;

        debug!(
            parameters = request.parameters.len(),
            statement_name = ?request.statement_name,
            "Dispatching execute_statement"
        );

        let api = self.api.clone();
        Ok(self
            .dispatcher
            .dispatch("execute_statement", async move { api.execute_statement(request).await }))
    }

    /// Submit a batch and wait for it to finish. Resolves to one sub-statement
    /// handle per query, in submission order.
    pub fn batch_execute_statement(
        &self,
        queries: Vec<ParameterizedQuery>,
        database: Option<DatabaseConfig>,
    ) -> Result<Completion<Vec<StatementHandle>>> {
        self.batch_execute_statement_with(queries, database, StatementOptions::default())
    }

    pub fn batch_execute_statement_with(
        &self,
        queries: Vec<ParameterizedQuery>,
        database: Option<DatabaseConfig>,
        options: StatementOptions,
    ) -> Result<Completion<Vec<StatementHandle>>> {
        self.ensure_open()?;
        let target = database.as_ref().unwrap_or(&self.database);
        let request = build_batch_request(&queries, target, &options)?;
        let submitted = request.sqls.len();

        let api = self.api.clone();
        let poll = self.poll;
        let cancel = self.dispatcher.cancellation_token();

        Ok(self.dispatcher.dispatch("batch_execute_statement", async move {
            let batch_id = api.batch_execute_statement(request).await?;
            info!(statement_id = %batch_id, statements = submitted, "Batch submitted");

            let description = poll_until_terminal(api.as_ref(), &batch_id, &poll, &cancel)
                .await?
                .into_result()?;

            let handles = description.sub_statement_handles();
            if handles.len() != submitted {
                return Err(RedshiftDataError::Provider(format!(
                    "batch {batch_id} reported {} sub-statements for {submitted} submitted",
                    handles.len()
                )));
            }
            Ok(handles)
        }))
    }

    /// Fresh status read of a statement.
    pub fn describe_statement(
        &self,
        statement_id: StatementHandle,
    ) -> Result<Completion<StatementDescription>> {
        self.ensure_open()?;
        let api = self.api.clone();
        Ok(self.dispatcher.dispatch("describe_statement", async move {
            api.describe_statement(&statement_id).await
        }))
    }

    /// Poll a statement until it reaches a terminal state, using the client's
    /// poll config.
    pub fn wait_for_statement(
        &self,
        statement_id: StatementHandle,
    ) -> Result<Completion<StatementDescription>> {
        self.ensure_open()?;
        let api = self.api.clone();
        let poll = self.poll;
        let cancel = self.dispatcher.cancellation_token();
        Ok(self.dispatcher.dispatch("wait_for_statement", async move {
            poll_until_terminal(api.as_ref(), &statement_id, &poll, &cancel)
                .await?
                .into_result()
        }))
    }

    /// Result rows of a finished statement. The first page is fetched before
    /// the completion resolves; the rest are fetched while iterating.
    pub fn get_statement_result(
        &self,
        statement_id: StatementHandle,
    ) -> Result<Completion<RowStream>> {
        self.ensure_open()?;
        let api = self.api.clone();
        let dispatcher = self.dispatcher.clone();
        Ok(self.dispatcher.dispatch("get_statement_result", async move {
            let first = api.get_statement_result(&statement_id, None).await?;
            debug!(
                statement_id = %statement_id,
                total_num_rows = first.total_num_rows,
                paged = first.next_token.is_some(),
                "Fetched first result page"
            );
            Ok(RowStream::from_first_page(api, dispatcher, statement_id, first))
        }))
    }

    /// Ask the provider to cancel a running statement.
    pub fn cancel_statement(&self, statement_id: StatementHandle) -> Result<Completion<bool>> {
        self.ensure_open()?;
        let api = self.api.clone();
        Ok(self.dispatcher.dispatch("cancel_statement", async move {
            info!(statement_id = %statement_id, "Cancelling statement");
            api.cancel_statement(&statement_id).await
        }))
    }

    /// Release the worker pool and interrupt in-flight calls.
    ///
    /// Idempotent: closing an already closed client is a no-op.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("RedshiftDataClient already closed");
            return Ok(());
        }
        self.dispatcher.shutdown();
        info!("RedshiftDataClient closed");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(RedshiftDataError::Closed)
        } else {
            Ok(())
        }
    }
}
