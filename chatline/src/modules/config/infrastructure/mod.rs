// Config Infrastructure Layer
//
// 配置模块的基础设施实现

pub mod file_repository;
pub mod memory_repository;

pub use file_repository::*;
pub use memory_repository::*;
