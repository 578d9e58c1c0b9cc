use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::store::seed::Dataset;

pub async fn connect_pg(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

/// Loads `data` into an empty database. Does nothing if locations already exist.
pub async fn seed_demo(pool: &PgPool, data: &Dataset) -> anyhow::Result<()> {
    let existing: i64 = sqlx::query_scalar("SELECT count(*) FROM location")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        tracing::info!(locations = existing, "database already populated, skipping demo seed");
        return Ok(());
    }

    let mut tx = pool.begin().await?;

    for l in &data.locations {
        sqlx::query("INSERT INTO location (location_id, name, address) VALUES ($1,$2,$3)")
            .bind(l.location_id)
            .bind(&l.name)
            .bind(&l.address)
            .execute(&mut *tx)
            .await?;
    }

    for s in &data.services {
        sqlx::query(
            "INSERT INTO service (service_id, name, duration_min, cost_cents) VALUES ($1,$2,$3,$4)",
        )
        .bind(s.service_id)
        .bind(&s.name)
        .bind(s.duration_min)
        .bind(s.cost_cents)
        .execute(&mut *tx)
        .await?;
    }

    for u in &data.users {
        sqlx::query(
            "INSERT INTO app_user (user_id, name, role, specialization) VALUES ($1,$2,$3,$4)",
        )
        .bind(u.user_id)
        .bind(&u.name)
        .bind(u.role)
        .bind(u.specialization.as_deref())
        .execute(&mut *tx)
        .await?;
    }

    for c in &data.certifications {
        sqlx::query("INSERT INTO therapist_service (user_id, service_id) VALUES ($1,$2)")
            .bind(c.user_id)
            .bind(c.service_id)
            .execute(&mut *tx)
            .await?;
    }

    for s in &data.shifts {
        sqlx::query(
            r#"
            INSERT INTO shift (
              shift_id, therapist_id, location_id, day_of_week, start_minute, end_minute
            )
            VALUES ($1,$2,$3,$4,$5,$6)
            "#,
        )
        .bind(s.shift_id)
        .bind(s.therapist_id)
        .bind(s.location_id)
        .bind(s.day_of_week)
        .bind(s.start_minute)
        .bind(s.end_minute)
        .execute(&mut *tx)
        .await?;
    }

    for a in &data.appointments {
        sqlx::query(
            r#"
            INSERT INTO appointment (
              appointment_id, start_at, duration_min, status,
              patient_id, therapist_id, service_id, location_id
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
            "#,
        )
        .bind(a.appointment_id)
        .bind(a.start_at)
        .bind(a.duration_min)
        .bind(a.status)
        .bind(a.patient_id)
        .bind(a.therapist_id)
        .bind(a.service_id)
        .bind(a.location_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    tracing::info!(
        locations = data.locations.len(),
        shifts = data.shifts.len(),
        appointments = data.appointments.len(),
        "demo data seeded"
    );
    Ok(())
}
