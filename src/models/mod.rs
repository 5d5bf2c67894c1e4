pub mod dashboard;
pub mod price;
pub mod watchlist;
