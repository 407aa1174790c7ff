use mongodb::bson::{doc, Document};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use std::error::Error;

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        // Connection pool
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));
        client_options.app_name = Some("swapknowledge-service".to_string());

        let client = Client::with_options(client_options)?;

        let db_name = database_name_from_uri(uri);
        let db = client.database(&db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates the indexes the service relies on.
    ///
    /// The unique ones are load-bearing: `follows(student_id, staff_id)` stops
    /// duplicate follows and the partial index on `permissions(staff_id)`
    /// allows a single open batch per staff member.
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        log::info!("🔧 Creating database indexes...");

        let unique = || IndexOptions::builder().unique(true).build();

        self.create_index("follows", doc! { "student_id": 1, "staff_id": 1 }, Some(unique()))
            .await?;
        self.create_index("follows", doc! { "staff_id": 1 }, None).await?;
        self.create_index("follows", doc! { "batch_id": 1 }, None).await?;

        self.create_index("permissions", doc! { "staff_id": 1, "created_at": -1 }, None)
            .await?;
        let one_open_batch = IndexOptions::builder()
            .unique(true)
            .name("one_open_batch_per_staff".to_string())
            .partial_filter_expression(doc! { "batch.state": "Open" })
            .build();
        self.create_index("permissions", doc! { "staff_id": 1 }, Some(one_open_batch))
            .await?;

        self.create_index("users", doc! { "email": 1 }, Some(unique())).await?;
        self.create_index("users", doc! { "user_id": 1 }, Some(unique())).await?;

        self.create_index("posts", doc! { "created_at": -1 }, None).await?;
        self.create_index("messages", doc! { "sender_id": 1, "receiver_id": 1 }, None)
            .await?;
        self.create_index("meetings", doc! { "staff_id": 1, "scheduled_at": 1 }, None)
            .await?;
        self.create_index("feedback", doc! { "staff_id": 1 }, None).await?;
        self.create_index("doubts", doc! { "staff_id": 1 }, None).await?;

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    async fn create_index(
        &self,
        collection: &str,
        keys: Document,
        options: Option<IndexOptions>,
    ) -> Result<(), Box<dyn Error>> {
        let description = format!("{}({:?})", collection, keys.keys().collect::<Vec<_>>());
        let unique = options.as_ref().and_then(|o| o.unique).unwrap_or(false);
        let model = IndexModel::builder().keys(keys).options(options).build();

        match self.collection::<Document>(collection).create_index(model).await {
            Ok(_) => log::info!("   ✅ Index created: {}", description),
            // A unique index that cannot be built means existing data breaks the invariant
            Err(e) if unique => return Err(Box::new(e)),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }
        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub async fn health_check(&self) -> bool {
        self.db.list_collection_names().await.is_ok()
    }
}

/// Database name from the URI path, `swapknowledge` when absent.
fn database_name_from_uri(uri: &str) -> String {
    let without_scheme = uri.split("://").nth(1).unwrap_or(uri);
    without_scheme
        .split_once('/')
        .map(|(_, rest)| rest.split('?').next().unwrap_or(""))
        .filter(|name| !name.is_empty())
        .unwrap_or("swapknowledge")
        .to_string()
}
