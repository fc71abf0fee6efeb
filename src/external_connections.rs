use sqlx::PgConnection;

/// A handle to an active database connection. Abstracted so business logic can receive
/// a connection from either a connection pool or an in-progress transaction without
/// knowing which it has.
pub trait ConnectionHandle {
    fn borrow_connection(&mut self) -> &mut PgConnection;
}

/// The set of clients used to communicate with external systems. Driven adapters borrow
/// one of these rather than a concrete client so the same adapter code runs inside and
/// outside a database transaction.
pub trait ExternalConnectivity: Sync {
    type Handle<'handle>: ConnectionHandle
    where
        Self: 'handle;

    /// Acquires a database connection from this connectivity instance
    async fn database_cxn(&mut self) -> Result<Self::Handle<'_>, anyhow::Error>;
}

/// Implementors can open a database transaction, producing a new [ExternalConnectivity]
/// whose connections all participate in that transaction.
pub trait Transactable: Sync {
    type Handle: ExternalConnectivity + TransactionHandle + Send;

    /// Begins a transaction against the database
    async fn start_transaction(&self) -> Result<Self::Handle, anyhow::Error>;
}

/// A handle to an in-progress database transaction which can be committed. Dropping the
/// handle without calling [commit](TransactionHandle::commit) rolls the transaction back.
pub trait TransactionHandle {
    /// Commits the transaction this handle represents
    async fn commit(self) -> Result<(), anyhow::Error>;
}

#[cfg(test)]
pub mod test_util {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Stand-in for [crate::persistence::ExternalConnectivity] in unit tests. Domain logic
    /// under test talks to in-memory fakes, so any attempt to actually acquire a database
    /// connection is a test bug and panics.
    #[derive(Clone)]
    pub struct FakeExternalConnectivity {
        is_transacting: bool,
        downstream_committed: Arc<AtomicBool>,
    }

    impl FakeExternalConnectivity {
        pub fn new() -> Self {
            FakeExternalConnectivity {
                is_transacting: false,
                downstream_committed: Arc::new(AtomicBool::new(false)),
            }
        }

        /// True if a transaction spawned from this instance was committed
        pub fn is_committed(&self) -> bool {
            self.downstream_committed.load(Ordering::SeqCst)
        }
    }

    pub struct NoDatabase;

    impl ConnectionHandle for NoDatabase {
        fn borrow_connection(&mut self) -> &mut PgConnection {
            panic!("Tried to borrow a real database connection in a unit test!")
        }
    }

    impl ExternalConnectivity for FakeExternalConnectivity {
        type Handle<'handle> = NoDatabase;

        async fn database_cxn(&mut self) -> Result<NoDatabase, anyhow::Error> {
            panic!("Tried to connect to a real database in a unit test!")
        }
    }

    impl Transactable for FakeExternalConnectivity {
        type Handle = FakeExternalConnectivity;

        async fn start_transaction(&self) -> Result<FakeExternalConnectivity, anyhow::Error> {
            Ok(FakeExternalConnectivity {
                is_transacting: true,
                downstream_committed: Arc::clone(&self.downstream_committed),
            })
        }
    }

    impl TransactionHandle for FakeExternalConnectivity {
        async fn commit(self) -> Result<(), anyhow::Error> {
            if !self.is_transacting {
                panic!("Tried to commit a transaction that was never started!")
            }

            self.downstream_committed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }
}
