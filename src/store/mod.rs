pub mod db;

pub use db::CatalogDb;

use crate::errors::StoreError;
use crate::models::ServiceRecord;
use std::thread;
use tokio::sync::{mpsc, oneshot};

/// Commands sent to the store worker thread.
enum StoreCommand {
    Upsert(ServiceRecord, oneshot::Sender<Result<(), StoreError>>),
    List(oneshot::Sender<Result<Vec<ServiceRecord>, StoreError>>),
    Count(oneshot::Sender<Result<u64, StoreError>>),
    Close,
}

/// Cloneable async handle to the database. `rusqlite::Connection` is not
/// `Sync`, so every operation funnels through a single worker thread and
/// writes from concurrent requests apply in arrival order.
#[derive(Clone)]
pub struct StoreHandle {
    tx: mpsc::Sender<StoreCommand>,
}

impl StoreHandle {
    /// Moves the connection onto a dedicated thread and returns the handle.
    pub fn spawn(db: CatalogDb) -> Self {
        let (tx, mut rx) = mpsc::channel::<StoreCommand>(256);

        thread::spawn(move || {
            while let Some(cmd) = rx.blocking_recv() {
                match cmd {
                    StoreCommand::Upsert(record, reply) => {
                        let _ = reply.send(db.upsert(&record));
                    }
                    StoreCommand::List(reply) => {
                        let _ = reply.send(db.list());
                    }
                    StoreCommand::Count(reply) => {
                        let _ = reply.send(db.count());
                    }
                    StoreCommand::Close => {
                        tracing::info!("store worker shutting down");
                        break;
                    }
                }
            }
            // dropping `db` here closes the connection
        });

        Self { tx }
    }

    pub async fn upsert(&self, record: ServiceRecord) -> Result<(), StoreError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::Upsert(record, reply))
            .await
            .map_err(|_| StoreError::Closed)?;
        rx.await.map_err(|_| StoreError::Closed)?
    }

    pub async fn list(&self) -> Result<Vec<ServiceRecord>, StoreError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::List(reply))
            .await
            .map_err(|_| StoreError::Closed)?;
        rx.await.map_err(|_| StoreError::Closed)?
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::Count(reply))
            .await
            .map_err(|_| StoreError::Closed)?;
        rx.await.map_err(|_| StoreError::Closed)?
    }

    /// Stops the worker thread and closes the connection.
    pub async fn close(&self) -> Result<(), StoreError> {
        self.tx
            .send(StoreCommand::Close)
            .await
            .map_err(|_| StoreError::Closed)
    }
}
