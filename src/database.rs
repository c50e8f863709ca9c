use anyhow::{Context, Result};
use sqlx::PgPool;

/// Tables `PgGateway` reads and writes.
pub const REQUIRED_TABLES: [&str; 5] = ["credentials", "profiles", "projects", "revoked_tokens", "tasks"];

pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        log::info!("🔗 Connecting to database...");

        let pool = PgPool::connect(database_url)
            .await
            .context("Failed to connect to the database")?;

        log::info!("✅ Database connection established");
        Ok(Database { pool })
    }

    pub async fn migrate(&self) -> Result<()> {
        log::info!("🛠  Applying migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to apply migrations")?;
        log::info!("✅ Migrations applied");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<()> {
        let one: i32 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Failed to execute health check query")?;
        anyhow::ensure!(one == 1, "Database health check failed");
        Ok(())
    }

    /// Names of required tables that do not exist yet.
    pub async fn missing_tables(&self) -> Result<Vec<&'static str>> {
        let found: Vec<String> = sqlx::query_scalar(
            "SELECT table_name::text FROM information_schema.tables \
             WHERE table_schema = 'public' AND table_name::text = ANY($1)",
        )
        .bind(&REQUIRED_TABLES[..])
        .fetch_all(&self.pool)
        .await
        .context("Failed to check database tables")?;

        Ok(REQUIRED_TABLES
            .iter()
            .copied()
            .filter(|table| !found.iter().any(|f| f == table))
            .collect())
    }

    pub async fn check_tables(&self) -> Result<()> {
        log::info!("📋 Checking database tables...");
        let missing = self.missing_tables().await?;
        if missing.is_empty() {
            log::info!("✅ All required tables exist");
        } else {
            log::warn!("⚠️  Missing tables: {:?}", missing);
            log::warn!("   Start with RUN_MIGRATIONS=true to create them");
        }
        Ok(())
    }

    pub async fn get_stats(&self) -> Result<DatabaseStats> {
        let (profiles, projects, tasks, done): (i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM profiles),
                (SELECT COUNT(*) FROM projects),
                (SELECT COUNT(*) FROM tasks),
                (SELECT COUNT(*) FROM tasks WHERE status = 'done')
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to get database statistics")?;

        Ok(DatabaseStats {
            profiles,
            projects,
            tasks,
            done,
        })
    }
}

#[derive(Debug)]
pub struct DatabaseStats {
    pub profiles: i64,
    pub projects: i64,
    pub tasks: i64,
    pub done: i64,
}

impl DatabaseStats {
    pub fn log_stats(&self) {
        log::info!("📈 Database Statistics:");
        log::info!("   👥 Profiles: {}", self.profiles);
        log::info!("   📁 Projects: {}", self.projects);
        log::info!("   📋 Tasks: {} ({} done)", self.tasks, self.done);
    }
}
