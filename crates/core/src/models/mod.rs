pub mod holding;
pub mod price;
pub mod settings;
pub mod valuation;
