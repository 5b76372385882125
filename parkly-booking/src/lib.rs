pub mod code;
pub mod lifecycle;
pub mod models;
pub mod orchestrator;
pub mod repository;

pub use lifecycle::LifecycleError;
pub use models::{Booking, BookingStatus, NewBooking, PaymentStatus};
pub use orchestrator::{MockPaymentGateway, PaymentOrchestrator};
pub use repository::BookingRepository;
