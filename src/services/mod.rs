pub mod dashboard_service;
