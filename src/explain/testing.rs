//! Scripted in-memory backend for exercising the capture protocol without a server.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::BackendError;

use super::backend::{BackendConnector, BackendSession, ExplainBackend, SessionIdentity};
use super::plan::PlanRow;

/// How the fake server behaves.
#[derive(Clone)]
pub(crate) struct FakeScript {
    /// Instance reported by the n-th acquired connection; the last entry repeats.
    pub instances: Vec<String>,
    /// Acquire fails once this many connections have been handed out.
    pub fail_acquire_after: Option<usize>,
    pub open_error: Option<BackendError>,
    pub use_error: Option<BackendError>,
    pub arm_error: Option<BackendError>,
    pub execute_result: Result<(), BackendError>,
    pub explain_result: Result<Vec<PlanRow>, BackendError>,
}

impl Default for FakeScript {
    fn default() -> Self {
        Self {
            instances: vec!["db1".to_string()],
            fail_acquire_after: None,
            open_error: None,
            use_error: None,
            arm_error: None,
            execute_result: Err(BackendError::with_code(
                1969,
                "Query execution was interrupted (max_statement_time exceeded)",
            )),
            explain_result: Ok(vec![PlanRow {
                id: Some(1),
                select_type: Some("SIMPLE".to_string()),
                table: Some("revision".to_string()),
                access_type: Some("ALL".to_string()),
                rows: Some(10),
                extra: Some("Using where".to_string()),
                ..Default::default()
            }]),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct FakeStats {
    pub opened: usize,
    pub acquired: usize,
    pub released: usize,
    pub discarded: usize,
    pub closed: usize,
    /// Every command issued, prefixed with the issuing thread id.
    pub commands: Vec<String>,
}

impl FakeStats {
    /// Connections handed out but never returned or closed.
    pub fn outstanding(&self) -> usize {
        self.acquired - self.released - self.discarded
    }
}

struct Shared {
    script: FakeScript,
    stats: Mutex<FakeStats>,
}

#[derive(Clone)]
pub(crate) struct FakeBackend {
    shared: Arc<Shared>,
}

impl FakeBackend {
    pub fn new(script: FakeScript) -> Self {
        Self {
            shared: Arc::new(Shared { script, stats: Mutex::new(FakeStats::default()) }),
        }
    }

    pub fn stats(&self) -> FakeStats {
        self.shared.stats.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExplainBackend for FakeBackend {
    type Session = FakeSession;

    async fn acquire(&self) -> Result<FakeSession, BackendError> {
        let mut stats = self.shared.stats.lock().unwrap();
        if let Some(limit) = self.shared.script.fail_acquire_after {
            if stats.acquired >= limit {
                return Err(BackendError::new("pool timed out while waiting for an open connection"));
            }
        }
        let index = stats.acquired;
        stats.acquired += 1;
        let instances = &self.shared.script.instances;
        let instance = instances
            .get(index)
            .or_else(|| instances.last())
            .cloned()
            .unwrap_or_default();
        Ok(FakeSession {
            shared: self.shared.clone(),
            instance,
            thread_id: 100 + index as u64,
            discarded: false,
        })
    }

    async fn close(&self) {
        self.shared.stats.lock().unwrap().closed += 1;
    }
}

pub(crate) struct FakeSession {
    shared: Arc<Shared>,
    instance: String,
    thread_id: u64,
    discarded: bool,
}

impl fmt::Debug for FakeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeSession")
            .field("instance", &self.instance)
            .field("thread_id", &self.thread_id)
            .finish()
    }
}

impl FakeSession {
    fn log(&self, command: String) {
        let entry = format!("{}: {}", self.thread_id, command);
        self.shared.stats.lock().unwrap().commands.push(entry);
    }
}

#[async_trait]
impl BackendSession for FakeSession {
    async fn use_schema(&mut self, schema: &str) -> Result<(), BackendError> {
        self.log(format!("USE {}", schema));
        match &self.shared.script.use_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    async fn identify(&mut self) -> Result<SessionIdentity, BackendError> {
        self.log("IDENTIFY".to_string());
        Ok(SessionIdentity { instance: self.instance.clone(), thread_id: self.thread_id })
    }

    async fn arm_statement_time(&mut self, limit: Duration) -> Result<(), BackendError> {
        self.log(format!("SET max_statement_time = {}", limit.as_secs()));
        match &self.shared.script.arm_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    async fn execute(&mut self, sql: &str) -> Result<(), BackendError> {
        self.log(format!("EXECUTE {}", sql));
        self.shared.script.execute_result.clone()
    }

    async fn show_explain(&mut self, thread_id: u64) -> Result<Vec<PlanRow>, BackendError> {
        self.log(format!("SHOW EXPLAIN FOR {}", thread_id));
        self.shared.script.explain_result.clone()
    }

    async fn discard(mut self) -> Result<(), BackendError> {
        self.discarded = true;
        self.shared.stats.lock().unwrap().discarded += 1;
        Ok(())
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        if !self.discarded {
            self.shared.stats.lock().unwrap().released += 1;
        }
    }
}

/// Connector handing out one shared [`FakeBackend`] and counting opens.
#[derive(Clone)]
pub(crate) struct FakeConnector {
    pub backend: FakeBackend,
}

impl FakeConnector {
    pub fn new(script: FakeScript) -> Self {
        Self { backend: FakeBackend::new(script) }
    }

    pub fn stats(&self) -> FakeStats {
        self.backend.stats()
    }
}

impl BackendConnector for FakeConnector {
    type Backend = FakeBackend;

    fn open(&self, _schema: &str) -> Result<FakeBackend, BackendError> {
        if let Some(e) = &self.backend.shared.script.open_error {
            return Err(e.clone());
        }
        self.backend.shared.stats.lock().unwrap().opened += 1;
        Ok(self.backend.clone())
    }
}
