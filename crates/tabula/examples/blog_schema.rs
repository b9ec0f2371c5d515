//! Example: Blog Schema
//!
//! Declares the tables of a small blog and reconciles them against the
//! database in `DATABASE_URL`. Running it twice issues no statements the
//! second time.
//!
//! Run with: DATABASE_URL=mysql://root@localhost/blog cargo run --example blog_schema -p tabula

use tabula::prelude::*;

fn users() -> TableDescriptor {
    TableDescriptor::new()
        .column("id", "BIGINT(20) UNSIGNED", "NOT NULL AUTO_INCREMENT")
        .column("login", "VARCHAR(60)", "NOT NULL")
        .column("email", "VARCHAR(100)", "NOT NULL DEFAULT ''")
        .column("registered_at", "DATETIME", "NOT NULL")
        .primary_key(["id"])
        .index("login", IndexDef::new(["login"]).unique())
}

fn posts() -> TableDescriptor {
    TableDescriptor::new()
        .column("id", "BIGINT(20) UNSIGNED", "NOT NULL AUTO_INCREMENT")
        .column("author_id", "BIGINT(20) UNSIGNED", "")
        .column("title", "VARCHAR(255)", "NOT NULL")
        .column("status", "VARCHAR(20)", "NOT NULL DEFAULT 'draft'")
        .column("content", "LONGTEXT", "")
        .primary_key(["id"])
        .index("title", IndexDef::new(["title($max_index_length)"]))
        .foreign_key(
            "fk_posts_author",
            ForeignKeyDef::new(["author_id"], "users", ["id"]).on_delete(ForeignKeyAction::SetNull),
        )
}

fn comments() -> TableDescriptor {
    TableDescriptor::new()
        .column("id", "BIGINT(20) UNSIGNED", "NOT NULL AUTO_INCREMENT")
        .column("post_id", "BIGINT(20) UNSIGNED", "NOT NULL")
        .column("body", "TEXT", "NOT NULL")
        .primary_key(["id"])
        .index("post_id", IndexDef::new(["post_id"]))
        .foreign_key(
            "fk_comments_post",
            ForeignKeyDef::new(["post_id"], "posts", ["id"]).on_delete(ForeignKeyAction::Cascade),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .without_time()
        .init();

    let url = std::env::var("DATABASE_URL")?;
    let pool = sqlx::MySqlPool::connect(&url).await?;

    let mut registry = SchemaRegistry::new();
    // Registration order does not matter: referenced tables go first.
    registry.register("comments", comments())?;
    registry.register("posts", posts())?;
    registry.register("users", users())?;

    let reconciler = Reconciler::new(
        MySqlCatalog::new(pool),
        EngineConfig::new().table_prefix("blog_"),
    );

    for report in reconciler.reconcile_registry(&registry).await? {
        println!(
            "{:<16} {:?}: {} applied, {} failed",
            report.physical_table,
            report.outcome,
            report.changes_applied().count(),
            report.failures().count()
        );
        for failure in report.failures() {
            println!("  failed: {}", failure.sql);
        }
    }

    Ok(())
}
