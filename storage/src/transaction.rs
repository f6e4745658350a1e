//! A checked-out connection wrapped in an open backend transaction.

use helixtrack_core::{Deadline, EngineResult, Row, Value};

use crate::pool::PoolGuard;

pub struct Transaction<'a> {
    guard: PoolGuard<'a>,
    finished: bool,
}

impl<'a> Transaction<'a> {
    pub(crate) fn begin(mut guard: PoolGuard<'a>, deadline: Deadline) -> EngineResult<Self> {
        guard.connection().exec(deadline, "BEGIN IMMEDIATE", &[]).or_else(|_| {
            guard.connection().exec(deadline, "BEGIN", &[])
        })?;
        Ok(Self {
            guard,
            finished: false,
        })
    }

    pub fn query(&mut self, deadline: Deadline, sql: &str, args: &[Value]) -> EngineResult<Vec<Row>> {
        self.guard.connection().query(deadline, sql, args)
    }

    pub fn query_one(&mut self, deadline: Deadline, sql: &str, args: &[Value]) -> EngineResult<Row> {
        self.guard.connection().query_one(deadline, sql, args)
    }

    pub fn exec(&mut self, deadline: Deadline, sql: &str, args: &[Value]) -> EngineResult<u64> {
        self.guard.connection().exec(deadline, sql, args)
    }

    pub fn commit(mut self, deadline: Deadline) -> EngineResult<()> {
        self.guard.connection().exec(deadline, "COMMIT", &[])?;
        self.finished = true;
        Ok(())
    }

    pub fn rollback(mut self, deadline: Deadline) -> EngineResult<()> {
        self.guard.connection().exec(deadline, "ROLLBACK", &[])?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.guard.connection().exec(Deadline::single_row(), "ROLLBACK", &[]);
        }
    }
}
