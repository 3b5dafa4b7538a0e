pub mod inbox_service;
pub mod thread_service;
