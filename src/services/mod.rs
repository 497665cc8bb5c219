pub mod table_service;
pub mod convert_service;
pub mod price_service;
pub mod chart_service;
pub mod hover_service;
