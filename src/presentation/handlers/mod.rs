mod analyze;
mod error_response;
mod health;
mod root;
mod task_status;

pub use analyze::{AnalyzeResponse, analyze_handler};
pub use error_response::ErrorResponse;
pub use health::{HealthResponse, health_handler};
pub use root::{RootResponse, root_handler};
pub use task_status::{TaskStatusResponse, task_status_handler};
