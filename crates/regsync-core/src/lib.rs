pub mod engine;
pub use engine::{
    AppCache, AppInspection, EventAction, ReconcilePlan, ReconcileReport, ReconciliationEngine,
    ReconnectPolicy, SessionEnd,
};

mod error;
pub use error::{RunError, SyncError, SyncResult};

pub mod gateway;
pub use gateway::{ByteStream, RegistryGateway, SchedulerGateway};

pub mod metrics;

mod projector;
pub use projector::TaskProjector;

pub mod stream;
pub use stream::EventStreamParser;

mod tagger;
pub use tagger::{
    DEFAULT_PREFIX_LABEL, DEFAULT_SENTINEL_TAG, DEFAULT_TAG_PREFIX, ServiceTagger, TaggerConfig,
};
