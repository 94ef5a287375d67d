pub mod event_bus;
pub mod publisher;

pub use event_bus::{
    EventBusClient, EventBusEntry, HttpEventBusClient, PutEventsOutput, PutEventsRequest,
    PutEventsResponse, PutEventsResultEntry, TransportError,
};
pub use publisher::{DeliveryError, EventPublisher, PublisherSettings, MAX_BATCH_ENTRIES};
