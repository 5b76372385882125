pub mod events;
pub mod notify;
pub mod payment;
pub mod signature;
