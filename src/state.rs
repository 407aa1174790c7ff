use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::MongoDB;
use crate::repositories::{
    FollowRepository, MongoFollowRepository, MongoPermissionRepository, PermissionRepository,
};

/// Shared handles for the follow / capacity workflow.
#[derive(Clone)]
pub struct AppState {
    pub follows: Arc<dyn FollowRepository>,
    pub permissions: Arc<dyn PermissionRepository>,
    pub config: AppConfig,
}

impl AppState {
    pub fn with_mongo(db: &MongoDB, config: AppConfig) -> Self {
        Self {
            follows: Arc::new(MongoFollowRepository::new(db)),
            permissions: Arc::new(MongoPermissionRepository::new(db)),
            config,
        }
    }

    #[cfg(test)]
    pub fn in_memory(config: AppConfig) -> Self {
        use crate::repositories::{InMemoryFollowRepository, InMemoryPermissionRepository};

        Self {
            follows: Arc::new(InMemoryFollowRepository::new()),
            permissions: Arc::new(InMemoryPermissionRepository::new()),
            config,
        }
    }
}

#[cfg(test)]
pub fn test_config() -> AppConfig {
    use crate::config::{AuthConfig, CapacityConfig, PaymentConfig};

    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "mongodb://localhost:27017/swapknowledge_test".to_string(),
        cors_origins: vec![],
        auth: AuthConfig::default(),
        capacity: CapacityConfig::default(),
        payment: PaymentConfig::default(),
    }
}
