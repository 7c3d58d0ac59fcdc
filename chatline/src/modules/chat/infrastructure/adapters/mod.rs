// Chat Infrastructure - Adapters
// 托管后端的协议适配器

pub mod graphql;
