/// Payments are identified by opaque UUIDs assigned at creation.
pub type PaymentId = uuid::Uuid;

/// Users are identified by opaque UUIDs owned by the auth provider.
pub type UserId = uuid::Uuid;

/// Scheduled triggers are identified by UUIDs assigned by the device adapter.
pub type TriggerId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
