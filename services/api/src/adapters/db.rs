//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete implementation of the
//! storage ports from the `core` crate. It handles all interactions with the
//! PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tutoring_core::domain::{
    AvailabilitySlot, BookingTransition, ExpertListing, ExpertProfile, NewUser, Payment,
    PaymentStatus, Role, StudentProfile, User, UserCredentials, UserUpdate,
};
use tutoring_core::ports::{
    AccountRepository, PaymentRepository, PortError, PortResult, SlotRepository,
};
use uuid::Uuid;

// Keeps each INSERT well below Postgres' 65535 bind-parameter limit.
const SLOT_INSERT_CHUNK: usize = 1000;

const SLOT_COLUMNS: &str = "id, expert_id, date, start_time, end_time, is_booked, student_id";
const USER_COLUMNS: &str =
    "users.id, users.full_name, users.email, users.picture, users.phone, users.hashed_password, users.role, users.created_at";
const STUDENT_COLUMNS: &str =
    "user_id, bio, preparing_for, date_of_birth, city, about_me, skills, sessions, points";
const EXPERT_COLUMNS: &str = "experts.user_id, experts.bio, experts.expertise, experts.specializations, \
     experts.experience_years, experts.education, experts.languages, experts.profile_picture_url, \
     experts.fee_per_session, experts.city, experts.date_of_birth, experts.rating, \
     experts.total_sessions, experts.verification_status, experts.students_mentored, experts.is_available";
const PAYMENT_COLUMNS: &str = "id, order_id, payment_id, status, student_id, expert_id, slot_id, \
     amount, platform_fee, expert_share, currency, created_at, paid_at";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the storage ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Maps constraint violations on writes to `Conflict`.
fn write_error(e: sqlx::Error) -> PortError {
    if let Some(db_err) = e.as_database_error() {
        match db_err.code().as_deref() {
            // unique_violation
            Some("23505") => {
                let message = match db_err.constraint() {
                    Some("users_email_lower_idx") => "email already registered".to_string(),
                    Some("users_phone_key") => "phone number already in use".to_string(),
                    _ => db_err.message().to_string(),
                };
                return PortError::Conflict(message);
            }
            // exclusion_violation (overlapping slots)
            Some("23P01") => {
                return PortError::Conflict("slots overlap existing availability".to_string())
            }
            _ => {}
        }
    }
    PortError::Unexpected(e.to_string())
}

fn not_found(what: &str, id: impl std::fmt::Display) -> impl FnOnce(sqlx::Error) -> PortError {
    let message = format!("{} {} not found", what, id);
    move |e| match e {
        sqlx::Error::RowNotFound => PortError::NotFound(message),
        other => unexpected(other),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct SlotRecord {
    id: Uuid,
    expert_id: Uuid,
    date: NaiveDate,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    is_booked: bool,
    student_id: Option<Uuid>,
}
impl SlotRecord {
    fn to_domain(self) -> AvailabilitySlot {
        AvailabilitySlot {
            id: self.id,
            expert_id: self.expert_id,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            is_booked: self.is_booked,
            student_id: self.student_id,
        }
    }
}

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    full_name: String,
    email: String,
    picture: Option<String>,
    phone: Option<String>,
    hashed_password: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> PortResult<UserCredentials> {
        let role = self.role.parse::<Role>().map_err(PortError::Unexpected)?;
        Ok(UserCredentials {
            user: User {
                id: self.id,
                full_name: self.full_name,
                email: self.email,
                picture: self.picture,
                phone: self.phone,
                role,
                created_at: self.created_at,
            },
            hashed_password: self.hashed_password,
        })
    }
}

#[derive(FromRow)]
struct StudentRecord {
    user_id: Uuid,
    bio: String,
    preparing_for: String,
    date_of_birth: Option<NaiveDate>,
    city: String,
    about_me: String,
    skills: Vec<String>,
    sessions: i32,
    points: i32,
}
impl StudentRecord {
    fn to_domain(self) -> StudentProfile {
        StudentProfile {
            user_id: self.user_id,
            bio: self.bio,
            preparing_for: self.preparing_for,
            date_of_birth: self.date_of_birth,
            city: self.city,
            about_me: self.about_me,
            skills: self.skills,
            sessions: self.sessions,
            points: self.points,
        }
    }
}

#[derive(FromRow)]
struct ExpertRecord {
    user_id: Uuid,
    bio: String,
    expertise: String,
    specializations: Vec<String>,
    experience_years: i32,
    education: String,
    languages: Vec<String>,
    profile_picture_url: String,
    fee_per_session: i64,
    city: String,
    date_of_birth: Option<NaiveDate>,
    rating: f64,
    total_sessions: i32,
    verification_status: String,
    students_mentored: i64,
    is_available: bool,
}
impl ExpertRecord {
    fn to_domain(self) -> ExpertProfile {
        ExpertProfile {
            user_id: self.user_id,
            bio: self.bio,
            expertise: self.expertise,
            specializations: self.specializations,
            experience_years: self.experience_years,
            education: self.education,
            languages: self.languages,
            profile_picture_url: self.profile_picture_url,
            fee_per_session: self.fee_per_session,
            city: self.city,
            date_of_birth: self.date_of_birth,
            rating: self.rating,
            total_sessions: self.total_sessions,
            verification_status: self.verification_status,
            students_mentored: self.students_mentored,
            is_available: self.is_available,
        }
    }
}

#[derive(FromRow)]
struct ExpertListingRecord {
    #[sqlx(flatten)]
    user: UserRecord,
    #[sqlx(flatten)]
    expert: ExpertRecord,
}

#[derive(FromRow)]
struct PaymentRecord {
    id: Uuid,
    order_id: String,
    payment_id: Option<String>,
    status: String,
    student_id: Uuid,
    expert_id: Uuid,
    slot_id: Uuid,
    amount: i64,
    platform_fee: i64,
    expert_share: i64,
    currency: String,
    created_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
}
impl PaymentRecord {
    fn to_domain(self) -> PortResult<Payment> {
        let status = self
            .status
            .parse::<PaymentStatus>()
            .map_err(PortError::Unexpected)?;
        Ok(Payment {
            id: self.id,
            order_id: self.order_id,
            payment_id: self.payment_id,
            status,
            student_id: self.student_id,
            expert_id: self.expert_id,
            slot_id: self.slot_id,
            amount: self.amount,
            platform_fee: self.platform_fee,
            expert_share: self.expert_share,
            currency: self.currency,
            created_at: self.created_at,
            paid_at: self.paid_at,
        })
    }
}

//=========================================================================================
// `SlotRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl SlotRepository for DbAdapter {
    async fn insert_batch(&self, slots: &[AvailabilitySlot]) -> PortResult<Vec<AvailabilitySlot>> {
        if slots.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        let mut stored = Vec::with_capacity(slots.len());

        for chunk in slots.chunks(SLOT_INSERT_CHUNK) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO availability_slots (id, expert_id, date, start_time, end_time, is_booked, student_id) ",
            );
            builder.push_values(chunk, |mut row, slot| {
                row.push_bind(slot.id)
                    .push_bind(slot.expert_id)
                    .push_bind(slot.date)
                    .push_bind(slot.start_time)
                    .push_bind(slot.end_time)
                    .push_bind(slot.is_booked)
                    .push_bind(slot.student_id);
            });
            builder.push(" RETURNING ");
            builder.push(SLOT_COLUMNS);

            let records = builder
                .build_query_as::<SlotRecord>()
                .fetch_all(&mut *tx)
                .await
                .map_err(write_error)?;
            stored.extend(records.into_iter().map(SlotRecord::to_domain));
        }

        tx.commit().await.map_err(write_error)?;

        stored.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));
        Ok(stored)
    }

    async fn get_by_id(&self, slot_id: Uuid) -> PortResult<AvailabilitySlot> {
        let record = sqlx::query_as::<_, SlotRecord>(&format!(
            "SELECT {} FROM availability_slots WHERE id = $1",
            SLOT_COLUMNS
        ))
        .bind(slot_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("Slot", slot_id))?;
        Ok(record.to_domain())
    }

    async fn list_available(
        &self,
        expert_id: Uuid,
        from: DateTime<Utc>,
    ) -> PortResult<Vec<AvailabilitySlot>> {
        let records = sqlx::query_as::<_, SlotRecord>(&format!(
            "SELECT {} FROM availability_slots \
             WHERE expert_id = $1 AND is_booked = FALSE AND start_time >= $2 \
             ORDER BY date ASC, start_time ASC",
            SLOT_COLUMNS
        ))
        .bind(expert_id)
        .bind(from)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(SlotRecord::to_domain).collect())
    }

    async fn list_booked_for_expert(
        &self,
        expert_id: Uuid,
        from: DateTime<Utc>,
    ) -> PortResult<Vec<AvailabilitySlot>> {
        let records = sqlx::query_as::<_, SlotRecord>(&format!(
            "SELECT {} FROM availability_slots \
             WHERE expert_id = $1 AND is_booked = TRUE AND start_time >= $2 \
             ORDER BY date ASC, start_time ASC",
            SLOT_COLUMNS
        ))
        .bind(expert_id)
        .bind(from)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(SlotRecord::to_domain).collect())
    }

    async fn list_booked_for_student(
        &self,
        student_id: Uuid,
        from: DateTime<Utc>,
    ) -> PortResult<Vec<AvailabilitySlot>> {
        let records = sqlx::query_as::<_, SlotRecord>(&format!(
            "SELECT {} FROM availability_slots \
             WHERE student_id = $1 AND is_booked = TRUE AND start_time >= $2 \
             ORDER BY date ASC, start_time ASC",
            SLOT_COLUMNS
        ))
        .bind(student_id)
        .bind(from)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(SlotRecord::to_domain).collect())
    }

    async fn try_mark_booked(
        &self,
        slot_id: Uuid,
        student_id: Uuid,
    ) -> PortResult<BookingTransition> {
        // Compare-and-set: only a row that is still unbooked is updated.
        let updated = sqlx::query_as::<_, SlotRecord>(&format!(
            "UPDATE availability_slots \
             SET is_booked = TRUE, student_id = $2, updated_at = now() \
             WHERE id = $1 AND is_booked = FALSE \
             RETURNING {}",
            SLOT_COLUMNS
        ))
        .bind(slot_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        if let Some(record) = updated {
            return Ok(BookingTransition::Booked(record.to_domain()));
        }

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM availability_slots WHERE id = $1)")
                .bind(slot_id)
                .fetch_one(&self.pool)
                .await
                .map_err(unexpected)?;

        Ok(if exists {
            BookingTransition::AlreadyBooked
        } else {
            BookingTransition::NotFound
        })
    }
}

//=========================================================================================
// `AccountRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl AccountRepository for DbAdapter {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (id, full_name, email, picture, phone, hashed_password, role) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.full_name)
        .bind(&new_user.email)
        .bind(&new_user.picture)
        .bind(&new_user.phone)
        .bind(&new_user.hashed_password)
        .bind(new_user.role.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(write_error)?;
        let user = record.to_domain()?.user;

        match user.role {
            Role::Student => {
                sqlx::query("INSERT INTO students (user_id) VALUES ($1)")
                    .bind(user.id)
                    .execute(&mut *tx)
                    .await
                    .map_err(write_error)?;
            }
            Role::Expert => {
                sqlx::query("INSERT INTO experts (user_id) VALUES ($1)")
                    .bind(user.id)
                    .execute(&mut *tx)
                    .await
                    .map_err(write_error)?;
            }
            Role::Admin => {}
        }

        tx.commit().await.map_err(unexpected)?;
        Ok(user)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("User", user_id))?;
        Ok(record.to_domain()?.user)
    }

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE lower(email) = lower($1)",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("User", email))?;
        record.to_domain()
    }

    async fn get_student_profile(&self, user_id: Uuid) -> PortResult<StudentProfile> {
        let record = sqlx::query_as::<_, StudentRecord>(&format!(
            "SELECT {} FROM students WHERE user_id = $1",
            STUDENT_COLUMNS
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("Student", user_id))?;
        Ok(record.to_domain())
    }

    async fn update_student_profile(
        &self,
        user_id: Uuid,
        user_update: UserUpdate,
        profile: StudentProfile,
    ) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        update_user_row(&mut tx, user_id, &user_update).await?;

        let result = sqlx::query(
            "UPDATE students SET bio = $2, preparing_for = $3, date_of_birth = $4, city = $5, \
             about_me = $6, skills = $7, updated_at = now() WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(&profile.bio)
        .bind(&profile.preparing_for)
        .bind(profile.date_of_birth)
        .bind(&profile.city)
        .bind(&profile.about_me)
        .bind(&profile.skills)
        .execute(&mut *tx)
        .await
        .map_err(write_error)?;
        if result.rows_affected() == 0 {
            // Dropping `tx` rolls back the user-row update.
            return Err(PortError::NotFound(format!("Student {} not found", user_id)));
        }

        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }

    async fn get_expert_profile(&self, user_id: Uuid) -> PortResult<ExpertProfile> {
        let record = sqlx::query_as::<_, ExpertRecord>(&format!(
            "SELECT {} FROM experts WHERE user_id = $1",
            EXPERT_COLUMNS
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("Expert", user_id))?;
        Ok(record.to_domain())
    }

    async fn update_expert_profile(
        &self,
        user_id: Uuid,
        user_update: UserUpdate,
        profile: ExpertProfile,
    ) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        update_user_row(&mut tx, user_id, &user_update).await?;

        let result = sqlx::query(
            "UPDATE experts SET bio = $2, expertise = $3, specializations = $4, \
             experience_years = $5, education = $6, languages = $7, profile_picture_url = $8, \
             fee_per_session = $9, city = $10, date_of_birth = $11, is_available = $12, \
             updated_at = now() WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(&profile.bio)
        .bind(&profile.expertise)
        .bind(&profile.specializations)
        .bind(profile.experience_years)
        .bind(&profile.education)
        .bind(&profile.languages)
        .bind(&profile.profile_picture_url)
        .bind(profile.fee_per_session)
        .bind(&profile.city)
        .bind(profile.date_of_birth)
        .bind(profile.is_available)
        .execute(&mut *tx)
        .await
        .map_err(write_error)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Expert {} not found", user_id)));
        }

        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }

    async fn list_experts(&self) -> PortResult<Vec<ExpertListing>> {
        let records = sqlx::query_as::<_, ExpertListingRecord>(&format!(
            "SELECT {}, {} FROM experts JOIN users ON users.id = experts.user_id \
             ORDER BY users.created_at ASC",
            USER_COLUMNS, EXPERT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records
            .into_iter()
            .map(|r| {
                Ok(ExpertListing {
                    user: r.user.to_domain()?.user,
                    profile: r.expert.to_domain(),
                })
            })
            .collect()
    }

    async fn revoke_token(&self, token_id: &str, expires_at: DateTime<Utc>) -> PortResult<bool> {
        let inserted = sqlx::query(
            "INSERT INTO revoked_tokens (token_id, expires_at) VALUES ($1, $2) \
             ON CONFLICT (token_id) DO NOTHING",
        )
        .bind(token_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?
        .rows_affected()
            == 1;

        // Entries past their expiry can no longer match a valid token.
        sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < now()")
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(inserted)
    }

    async fn is_token_revoked(&self, token_id: &str) -> PortResult<bool> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE token_id = $1)")
            .bind(token_id)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)
    }
}

/// Applies the non-empty fields of `update` to the user row inside `tx`.
async fn update_user_row(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    user_id: Uuid,
    update: &UserUpdate,
) -> PortResult<()> {
    let result = sqlx::query(
        "UPDATE users SET full_name = COALESCE($2, full_name), phone = COALESCE($3, phone), \
         picture = COALESCE($4, picture), updated_at = now() WHERE id = $1",
    )
    .bind(user_id)
    .bind(&update.full_name)
    .bind(&update.phone)
    .bind(&update.picture)
    .execute(&mut **tx)
    .await
    .map_err(write_error)?;

    if result.rows_affected() == 0 {
        return Err(PortError::NotFound(format!("User {} not found", user_id)));
    }
    Ok(())
}

//=========================================================================================
// `PaymentRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl PaymentRepository for DbAdapter {
    async fn create_payment(&self, payment: &Payment) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO payments (id, order_id, payment_id, status, student_id, expert_id, slot_id, \
             amount, platform_fee, expert_share, currency, created_at, paid_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(payment.id)
        .bind(&payment.order_id)
        .bind(&payment.payment_id)
        .bind(payment.status.as_str())
        .bind(payment.student_id)
        .bind(payment.expert_id)
        .bind(payment.slot_id)
        .bind(payment.amount)
        .bind(payment.platform_fee)
        .bind(payment.expert_share)
        .bind(&payment.currency)
        .bind(payment.created_at)
        .bind(payment.paid_at)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(())
    }

    async fn get_by_order_id(&self, order_id: &str) -> PortResult<Payment> {
        let record = sqlx::query_as::<_, PaymentRecord>(&format!(
            "SELECT {} FROM payments WHERE order_id = $1",
            PAYMENT_COLUMNS
        ))
        .bind(order_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("Order", order_id))?;
        record.to_domain()
    }

    async fn mark_paid(
        &self,
        order_id: &str,
        payment_id: &str,
        paid_at: DateTime<Utc>,
    ) -> PortResult<Payment> {
        let updated = sqlx::query_as::<_, PaymentRecord>(&format!(
            "UPDATE payments SET status = 'paid', payment_id = $2, paid_at = $3 \
             WHERE order_id = $1 AND status = 'created' RETURNING {}",
            PAYMENT_COLUMNS
        ))
        .bind(order_id)
        .bind(payment_id)
        .bind(paid_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        match updated {
            Some(record) => record.to_domain(),
            None => {
                let current = self.get_by_order_id(order_id).await?;
                Err(PortError::Conflict(format!(
                    "order {} is already {}",
                    order_id,
                    current.status.as_str()
                )))
            }
        }
    }

    async fn mark_failed(&self, order_id: &str) -> PortResult<()> {
        sqlx::query("UPDATE payments SET status = 'failed' WHERE order_id = $1 AND status = 'created'")
            .bind(order_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}
