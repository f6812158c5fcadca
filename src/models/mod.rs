// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AuditEntry, BusyInterval, CalendarProviderKind, ConnectedAccount, ConnectedCalendarProvider,
    Event, Plan, Preferences, PriceBand, ScoringWeights, SearchResult, TicketSummary, TimeOfDay,
};
pub use requests::{AuthCallbackQuery, PlanCreateRequest, SearchRequest};
pub use responses::{
    ErrorResponse, HealthResponse, MeResponse, ParticipantReadiness, PlanParticipant,
    PlanReadinessResponse, PlanResponse, ReadyChecks, ReadyResponse, SearchResponse,
};
