//! This module provides ways to make a [`MemoryStore`](crate::memory_store::MemoryStore) fail on purpose, for tests

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use crate::error::{Error, Result};

/// The operations of a [`TaskStore`](crate::traits::TaskStore) that can be made to fail
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    DescribeDatabase,
    Query,
    CreateRecord,
    UpdateRecord,
    ArchiveRecord,
    GetRecord,
}

impl StoreOperation {
    pub const ALL: [StoreOperation; 6] = [
        StoreOperation::DescribeDatabase,
        StoreOperation::Query,
        StoreOperation::CreateRecord,
        StoreOperation::UpdateRecord,
        StoreOperation::ArchiveRecord,
        StoreOperation::GetRecord,
    ];
}

impl Display for StoreOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StoreOperation::DescribeDatabase => "describe_database",
            StoreOperation::Query => "query",
            StoreOperation::CreateRecord => "create_record",
            StoreOperation::UpdateRecord => "update_record",
            StoreOperation::ArchiveRecord => "archive_record",
            StoreOperation::GetRecord => "get_record",
        };
        f.write_str(name)
    }
}


/// Failure plans for a mocked store.
///
/// Each operation can be planned to succeed `m` times, then fail `n` times, then succeed forever.
/// Operations without a plan always succeed.
#[derive(Default, Clone, Debug)]
pub struct MockBehaviour {
    /// While this is true, every operation succeeds and plans are left untouched
    pub is_suspended: bool,
    plans: HashMap<StoreOperation, (u32, u32)>,
}

impl MockBehaviour {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation fails at once, `n_fails` times each
    pub fn fail_now(n_fails: u32) -> Self {
        StoreOperation::ALL.iter()
            .fold(Self::new(), |behaviour, op| behaviour.with(*op, 0, n_fails))
    }

    /// Plan `op` to succeed `successes` times, then fail `failures` times
    pub fn with(mut self, op: StoreOperation, successes: u32, failures: u32) -> Self {
        self.plans.insert(op, (successes, failures));
        self
    }

    pub fn suspend(&mut self) {
        self.is_suspended = true;
    }

    pub fn resume(&mut self) {
        self.is_suspended = false;
    }

    /// Consume one step of the plan of `op`
    pub fn check(&mut self, op: StoreOperation) -> Result<()> {
        if self.is_suspended {
            return Ok(());
        }
        let plan = match self.plans.get_mut(&op) {
            None => return Ok(()),
            Some(plan) => plan,
        };

        match plan {
            (successes, _) if *successes > 0 => {
                *successes -= 1;
                Ok(())
            },
            (_, failures) if *failures > 0 => {
                *failures -= 1;
                log::debug!("Mock behaviour: failing a {} ({} more to come)", op, failures);
                Err(Error::ExternalService(format!("Mocked {} failure", op)))
            },
            _ => Ok(()),
        }
    }
}
