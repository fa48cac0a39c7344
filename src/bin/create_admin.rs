//! One-off seeding binary: creates the superadmin account.
//!
//! Usage: set `ADMIN_EMAIL` and `ADMIN_PASSWORD` (plus the usual `.env`) and
//! run `cargo run --bin create_admin`. Re-running with an existing email is a
//! no-op.

use sqlx::PgPool;
use uuid::Uuid;

use workmarket::auth::hash_password;
use workmarket::config::Config;
use workmarket::models::AdminRole;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let name = std::env::var("ADMIN_NAME").unwrap_or_else(|_| "Super Admin".to_string());
    let email = std::env::var("ADMIN_EMAIL")
        .expect("ADMIN_EMAIL must be set")
        .to_lowercase();
    let password = std::env::var("ADMIN_PASSWORD").expect("ADMIN_PASSWORD must be set");

    let pool = PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    let password_hash = hash_password(&password).expect("Failed to hash admin password");

    let result = sqlx::query(
        "INSERT INTO admins (id, name, email, password_hash, role)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (email) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(&name)
    .bind(&email)
    .bind(&password_hash)
    .bind(AdminRole::Superadmin)
    .execute(&pool)
    .await
    .expect("Failed to create admin");

    if result.rows_affected() == 0 {
        println!("Admin {} already exists, nothing to do", email);
    } else {
        println!("Admin {} created", email);
    }
}
