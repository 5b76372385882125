pub mod billing;
pub mod repository;
pub mod spot;

pub use repository::SpotRepository;
pub use spot::ParkingSpot;
