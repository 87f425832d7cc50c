// src/seed.rs

use sqlx::PgPool;

use crate::{
    config::{Config, DEFAULT_ROLES},
    utils::hash::hash_password,
};

/// Inserts the built-in roles that are missing. Existing roles are left untouched.
pub async fn seed_roles(pool: &PgPool) -> Result<(), sqlx::Error> {
    for (name, description) in DEFAULT_ROLES {
        let inserted = sqlx::query(
            "INSERT INTO roles (name, description) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING",
        )
        .bind(name)
        .bind(description)
        .execute(pool)
        .await?
        .rows_affected();

        if inserted > 0 {
            tracing::info!("Seeded role: {}", name);
        }
    }
    Ok(())
}

/// Creates the configured admin account if it does not exist yet.
pub async fn seed_admin_user(pool: &PgPool, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let (Some(username), Some(password), Some(email)) =
        (&config.admin_username, &config.admin_password, &config.admin_email)
    else {
        return Ok(());
    };

    let user_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    if user_exists.is_none() {
        tracing::info!("Seeding admin user: {}", username);
        let hashed_password = hash_password(password)?;

        sqlx::query(
            r#"
            INSERT INTO users (username, email, password, role_id)
            SELECT $1, $2, $3, id FROM roles WHERE name = 'Admin'
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(hashed_password)
        .execute(pool)
        .await?;
        tracing::info!("Admin user created successfully.");
    }
    Ok(())
}
