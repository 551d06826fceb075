//! Observability for the Room Service.
//!
//! Metric labels are bounded:
//! - `event`: the four inbound wire event names
//! - `status`: token issuance outcome (`success` or an error label)
//!
//! Room IDs, connection IDs and user names never appear in labels.
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Purpose |
//! |--------|------|--------|---------|
//! | `room_rooms_active` | Gauge | none | Rooms currently held in memory |
//! | `room_connections_active` | Gauge | none | Open WebSocket connections |
//! | `room_events_total` | Counter | `event` | Inbound events processed |
//! | `room_authority_denied_total` | Counter | `event` | Host-only actions refused |
//! | `room_broadcast_dropped_total` | Counter | none | Outbound events dropped on a full queue |
//! | `room_tokens_issued_total` | Counter | `status` | Access token requests |

pub mod health;
pub mod metrics;

pub use health::{health_router, HealthState, Phase};
pub use metrics::{
    init_metrics_recorder, record_authority_denied, record_broadcast_dropped, record_event,
    record_token_issued, set_connections_active, set_rooms_active,
};
