use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use prospect_core::{CompanyIdentifier, ProspectError, RawSourceData, SourceClient};

/// Instruction for how a fetch should behave.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Return the provided payload immediately.
    Return(RawSourceData),
    /// Return the provided payload after a delay (uses `tokio::time`).
    ReturnAfter(Duration, RawSourceData),
    /// Fail immediately with the provided error.
    Fail(ProspectError),
    /// Hang indefinitely (simulate a stalled source).
    Hang,
}

#[derive(Default)]
struct InternalState {
    queued: VecDeque<MockBehavior>,
    rules: HashMap<CompanyIdentifier, MockBehavior>,
    default: Option<MockBehavior>,
    calls: HashMap<CompanyIdentifier, usize>,
}

/// Controller handle used by tests to drive the dynamic mock from the outside.
pub struct DynamicMockController {
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockController {
    /// Set the behavior for every fetch of `company`.
    pub async fn set_behavior(&self, company: &CompanyIdentifier, behavior: MockBehavior) {
        let mut guard = self.state.lock().await;
        guard.rules.insert(company.clone(), behavior);
    }

    /// Set the behavior for companies without a specific rule.
    pub async fn set_default_behavior(&self, behavior: MockBehavior) {
        self.state.lock().await.default = Some(behavior);
    }

    /// Queue one-shot behaviors consumed in order by the next fetches, ahead of any rule.
    pub async fn push_behaviors<I>(&self, behaviors: I)
    where
        I: IntoIterator<Item = MockBehavior>,
    {
        self.state.lock().await.queued.extend(behaviors);
    }

    /// Total number of fetches received.
    pub async fn calls(&self) -> usize {
        self.state.lock().await.calls.values().sum()
    }

    /// Number of fetches received for `company`.
    pub async fn calls_for(&self, company: &CompanyIdentifier) -> usize {
        let guard = self.state.lock().await;
        guard.calls.get(company).copied().unwrap_or(0)
    }

    /// Clear all configured behaviors and call counts.
    pub async fn clear_all_behaviors(&self) {
        let mut guard = self.state.lock().await;
        guard.queued.clear();
        guard.rules.clear();
        guard.default = None;
        guard.calls.clear();
    }
}

/// A source that defers all behavior to an external controller.
///
/// Fetches without a queued behavior, company rule or default answer with
/// `NotFound`.
pub struct DynamicMockSource {
    name: &'static str,
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockSource {
    /// Create a new dynamic mock source and its controller.
    #[must_use]
    pub fn new_with_controller(name: &'static str) -> (Arc<dyn SourceClient>, DynamicMockController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let controller = DynamicMockController {
            state: Arc::clone(&state),
        };
        let me = Arc::new(Self { name, state });
        (me as Arc<dyn SourceClient>, controller)
    }
}

#[async_trait]
impl SourceClient for DynamicMockSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn vendor(&self) -> &'static str {
        "DynamicMock"
    }

    async fn fetch(&self, company: &CompanyIdentifier) -> Result<RawSourceData, ProspectError> {
        // Acquire behavior snapshot without holding the lock across await points
        let behavior = {
            let mut guard = self.state.lock().await;
            *guard.calls.entry(company.clone()).or_insert(0) += 1;
            match guard.queued.pop_front() {
                Some(b) => Some(b),
                None => guard
                    .rules
                    .get(company)
                    .cloned()
                    .or_else(|| guard.default.clone()),
            }
        };

        match behavior {
            Some(MockBehavior::Return(data)) => Ok(data),
            Some(MockBehavior::ReturnAfter(delay, data)) => {
                tokio::time::sleep(delay).await;
                Ok(data)
            }
            Some(MockBehavior::Fail(e)) => Err(e),
            Some(MockBehavior::Hang) => std::future::pending().await,
            None => Err(ProspectError::not_found(format!(
                "{} has no behavior for {company}",
                self.name
            ))),
        }
    }
}
