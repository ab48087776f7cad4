use crate::errors::StorageError;
use crate::models::{Activity, ActivityDraft, AppData};
use async_trait::async_trait;
use std::{path::PathBuf, sync::Arc};
use tokio::{
    fs,
    sync::{broadcast, Mutex},
};
use tracing::{error, info};

const EVENT_CAPACITY: usize = 16;

/// Where the state is read from and written to.
#[async_trait]
pub trait StateBackend: Send + Sync + 'static {
    /// Unreadable or missing state yields the empty state.
    async fn load(&self) -> AppData;

    async fn save(&self, data: &AppData) -> Result<(), StorageError>;
}

/// Pretty-printed JSON file holding the whole state.
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait]
impl StateBackend for JsonFileBackend {
    async fn load(&self) -> AppData {
        match fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(data) => data,
                Err(err) => {
                    error!("failed to parse data file: {err}");
                    AppData::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppData::default(),
            Err(err) => {
                error!("failed to read data file: {err}");
                AppData::default()
            }
        }
    }

    /// Writes a sibling temp file and renames it over the state file, so a
    /// crash mid-write never leaves a truncated state file behind.
    async fn save(&self, data: &AppData) -> Result<(), StorageError> {
        let payload = serde_json::to_vec_pretty(data)?;
        let temp_path = self.temp_path();
        fs::write(&temp_path, payload).await?;
        fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}

/// Keeps the last saved state in memory only.
#[derive(Default)]
pub struct MemoryBackend {
    saved: Mutex<AppData>,
}

#[async_trait]
impl StateBackend for MemoryBackend {
    async fn load(&self) -> AppData {
        self.saved.lock().await.clone()
    }

    async fn save(&self, data: &AppData) -> Result<(), StorageError> {
        *self.saved.lock().await = data.clone();
        Ok(())
    }
}

/// Published after the store has changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    ActivityAdded,
}

impl StoreEvent {
    pub fn name(self) -> &'static str {
        match self {
            StoreEvent::ActivityAdded => "activityUpdated",
        }
    }
}

/// Shared handle on the persisted state.
///
/// Every write works on a copy of the current state and only replaces the
/// in-memory state once the backend has accepted the copy.
#[derive(Clone)]
pub struct ActivityStore {
    data: Arc<Mutex<AppData>>,
    backend: Arc<dyn StateBackend>,
    events: broadcast::Sender<StoreEvent>,
}

impl ActivityStore {
    pub async fn open(backend: impl StateBackend) -> Self {
        let data = backend.load().await;
        info!(activities = data.activities.len(), "state loaded");
        Self::with_data(Arc::new(backend), data)
    }

    pub fn with_data(backend: Arc<dyn StateBackend>, data: AppData) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            data: Arc::new(Mutex::new(data)),
            backend,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub async fn activities(&self) -> Vec<Activity> {
        self.data.lock().await.activities.clone()
    }

    pub async fn append(&self, activity: Activity) -> Result<(), StorageError> {
        self.append_with(activity, false).await
    }

    /// Appends an activity and drops the saved draft in the same write.
    pub async fn append_submitted(&self, activity: Activity) -> Result<(), StorageError> {
        self.append_with(activity, true).await
    }

    async fn append_with(&self, activity: Activity, clear_draft: bool) -> Result<(), StorageError> {
        let name = activity.name.clone();
        let count = self
            .update(move |data| {
                data.activities.push(activity);
                if clear_draft {
                    data.draft = None;
                }
                data.activities.len()
            })
            .await?;

        info!(activity = %name, total = count, "activity recorded");
        // No subscribers is not an error.
        let _ = self.events.send(StoreEvent::ActivityAdded);
        Ok(())
    }

    pub async fn draft(&self) -> Option<ActivityDraft> {
        self.data.lock().await.draft.clone()
    }

    pub async fn save_draft(&self, draft: ActivityDraft) -> Result<(), StorageError> {
        self.update(move |data| data.draft = Some(draft)).await
    }

    pub async fn dark_mode(&self) -> bool {
        self.data.lock().await.dark_mode
    }

    pub async fn set_dark_mode(&self, enabled: bool) -> Result<(), StorageError> {
        self.update(move |data| data.dark_mode = enabled).await
    }

    pub async fn toggle_dark_mode(&self) -> Result<bool, StorageError> {
        self.update(|data| {
            data.dark_mode = !data.dark_mode;
            data.dark_mode
        })
        .await
    }

    async fn update<T>(&self, apply: impl FnOnce(&mut AppData) -> T) -> Result<T, StorageError> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        let result = apply(&mut next);

        if let Err(err) = self.backend.save(&next).await {
            error!("failed to persist state: {err}");
            return Err(err);
        }

        *data = next;
        Ok(result)
    }
}
