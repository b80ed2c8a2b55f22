//! Postgres-backed store. Each write and its version row share a
//! transaction; updates lock the row first.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{
    BankAccountData, EntityKind, Event, EventOrganizer, Invoice, InvoiceAffect,
    NewBankAccountData, NewEvent, NewEventOrganizer, NewInvoice, NewInvoiceAffect, NewOrganizer,
    NewSponsor, NewSponsorCategory, NewSponsoring, NewUser, Organizer, Sponsor, SponsorCategory,
    SponsorScope, Sponsoring, User, Version, Versioned,
};
use crate::store::constraints::{self, violation};
use crate::store::Store;
use crate::utils::error::{AppError, AppResult};

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, password_hash, \
     is_active, is_superuser, permissions, last_login, date_joined";
const AUDIT_COLUMNS: &str = "created_by, created_at, updated_at";
const BANK_ACCOUNT_COLUMNS: &str = "id, document_number, bank_entity, account_number, \
     account_type, organization_name, cbu";
const ORGANIZER_COLUMNS: &str = "id, first_name, last_name, user_id, account_data_id";
const EVENT_COLUMNS: &str = "id, name, commission, start_date, place, category, close";
const EVENT_ORGANIZER_COLUMNS: &str = "id, event_id, organizer_id";
const SPONSOR_CATEGORY_COLUMNS: &str = "id, name, amount, event_id";
const SPONSOR_COLUMNS: &str = "id, enabled, active, organization_name, document_number, \
     contact_info, address, vat_condition, other_vat_condition_text";
const SPONSORING_COLUMNS: &str = "id, sponsor_category_id, sponsor_id, comments";
const INVOICE_COLUMNS: &str = "id, amount, partial_payment, complete_payment, close, \
     observations, document, invoice_ok, sponsoring_id";
const INVOICE_AFFECT_COLUMNS: &str = "id, amount, observations, invoice_id, document, category";
const VERSION_COLUMNS: &str = "id, entity, object_id, revision, data, created_by, created_at";

fn select(columns: &str, table: &str, tail: &str) -> String {
    format!("SELECT {}, {} FROM {} {}", columns, AUDIT_COLUMNS, table, tail)
}

/// Integrity violations become the shared constraint errors; anything else
/// stays a database error.
fn map_db_error(err: sqlx::Error) -> AppError {
    if let Some(db) = err.as_database_error() {
        if db.is_unique_violation() || db.is_foreign_key_violation() || db.is_check_violation() {
            if let Some(constraint) = db.constraint() {
                return violation(constraint);
            }
        }
    }
    AppError::DatabaseError(err)
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn delete_by_id(&self, table: &str, id: Uuid, kind: &str) -> AppResult<()> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", table))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(kind, id));
        }
        tracing::info!(table, %id, "Row deleted");
        Ok(())
    }
}

async fn record_version<T: Versioned>(
    conn: &mut PgConnection,
    record: &T,
    actor: Option<Uuid>,
) -> AppResult<()> {
    let data = serde_json::to_value(record)?;
    sqlx::query(
        r#"
        INSERT INTO versions (id, entity, object_id, revision, data, created_by, created_at)
        SELECT $1, $2, $3, COALESCE(MAX(revision), 0) + 1, $4, $5, $6
        FROM versions
        WHERE entity = $2 AND object_id = $3
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(T::KIND)
    .bind(record.id())
    .bind(data)
    .bind(actor)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_user(conn: &mut PgConnection, user: &User) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO users (id, username, email, first_name, last_name, password_hash,
            is_active, is_superuser, permissions, last_login, date_joined)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.password_hash)
    .bind(user.is_active)
    .bind(user.is_superuser)
    .bind(&user.permissions)
    .bind(user.last_login)
    .bind(user.date_joined)
    .execute(&mut *conn)
    .await
    .map_err(map_db_error)?;
    Ok(())
}

async fn save_bank_account(conn: &mut PgConnection, account: &BankAccountData) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO bank_accounts (id, document_number, bank_entity, account_number, account_type,
            organization_name, cbu, created_by, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (id) DO UPDATE
        SET document_number = EXCLUDED.document_number,
            bank_entity = EXCLUDED.bank_entity,
            account_number = EXCLUDED.account_number,
            account_type = EXCLUDED.account_type,
            organization_name = EXCLUDED.organization_name,
            cbu = EXCLUDED.cbu,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(account.id)
    .bind(&account.document_number)
    .bind(&account.bank_entity)
    .bind(&account.account_number)
    .bind(account.account_type)
    .bind(&account.organization_name)
    .bind(&account.cbu)
    .bind(account.audit.created_by)
    .bind(account.audit.created_at)
    .bind(account.audit.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(map_db_error)?;
    Ok(())
}

async fn save_organizer(conn: &mut PgConnection, organizer: &Organizer) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO organizers (id, first_name, last_name, user_id, account_data_id,
            created_by, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (id) DO UPDATE
        SET first_name = EXCLUDED.first_name,
            last_name = EXCLUDED.last_name,
            user_id = EXCLUDED.user_id,
            account_data_id = EXCLUDED.account_data_id,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(organizer.id)
    .bind(&organizer.first_name)
    .bind(&organizer.last_name)
    .bind(organizer.user_id)
    .bind(organizer.account_data_id)
    .bind(organizer.audit.created_by)
    .bind(organizer.audit.created_at)
    .bind(organizer.audit.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(map_db_error)?;
    Ok(())
}

async fn save_event(conn: &mut PgConnection, event: &Event) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO events (id, name, commission, start_date, place, category, close,
            created_by, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (id) DO UPDATE
        SET name = EXCLUDED.name,
            commission = EXCLUDED.commission,
            start_date = EXCLUDED.start_date,
            place = EXCLUDED.place,
            category = EXCLUDED.category,
            close = EXCLUDED.close,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(event.id)
    .bind(&event.name)
    .bind(event.commission)
    .bind(event.start_date)
    .bind(&event.place)
    .bind(event.category)
    .bind(event.close)
    .bind(event.audit.created_by)
    .bind(event.audit.created_at)
    .bind(event.audit.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(map_db_error)?;
    Ok(())
}

async fn save_sponsor_category(
    conn: &mut PgConnection,
    category: &SponsorCategory,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sponsor_categories (id, name, amount, event_id,
            created_by, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (id) DO UPDATE
        SET name = EXCLUDED.name,
            amount = EXCLUDED.amount,
            event_id = EXCLUDED.event_id,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(category.id)
    .bind(&category.name)
    .bind(category.amount)
    .bind(category.event_id)
    .bind(category.audit.created_by)
    .bind(category.audit.created_at)
    .bind(category.audit.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(map_db_error)?;
    Ok(())
}

async fn save_sponsor(conn: &mut PgConnection, sponsor: &Sponsor) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sponsors (id, enabled, active, organization_name, document_number,
            contact_info, address, vat_condition, other_vat_condition_text,
            created_by, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (id) DO UPDATE
        SET enabled = EXCLUDED.enabled,
            active = EXCLUDED.active,
            organization_name = EXCLUDED.organization_name,
            document_number = EXCLUDED.document_number,
            contact_info = EXCLUDED.contact_info,
            address = EXCLUDED.address,
            vat_condition = EXCLUDED.vat_condition,
            other_vat_condition_text = EXCLUDED.other_vat_condition_text,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(sponsor.id)
    .bind(sponsor.enabled)
    .bind(sponsor.active)
    .bind(&sponsor.organization_name)
    .bind(&sponsor.document_number)
    .bind(&sponsor.contact_info)
    .bind(&sponsor.address)
    .bind(sponsor.vat_condition)
    .bind(&sponsor.other_vat_condition_text)
    .bind(sponsor.audit.created_by)
    .bind(sponsor.audit.created_at)
    .bind(sponsor.audit.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(map_db_error)?;
    Ok(())
}

async fn save_sponsoring(conn: &mut PgConnection, sponsoring: &Sponsoring) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sponsorings (id, sponsor_category_id, sponsor_id, comments,
            created_by, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (id) DO UPDATE
        SET comments = EXCLUDED.comments,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(sponsoring.id)
    .bind(sponsoring.sponsor_category_id)
    .bind(sponsoring.sponsor_id)
    .bind(&sponsoring.comments)
    .bind(sponsoring.audit.created_by)
    .bind(sponsoring.audit.created_at)
    .bind(sponsoring.audit.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(map_db_error)?;
    Ok(())
}

async fn save_invoice(conn: &mut PgConnection, invoice: &Invoice) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO invoices (id, amount, partial_payment, complete_payment, close,
            observations, document, invoice_ok, sponsoring_id,
            created_by, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (id) DO UPDATE
        SET amount = EXCLUDED.amount,
            partial_payment = EXCLUDED.partial_payment,
            complete_payment = EXCLUDED.complete_payment,
            close = EXCLUDED.close,
            observations = EXCLUDED.observations,
            document = EXCLUDED.document,
            invoice_ok = EXCLUDED.invoice_ok,
            sponsoring_id = EXCLUDED.sponsoring_id,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(invoice.id)
    .bind(invoice.amount)
    .bind(invoice.partial_payment)
    .bind(invoice.complete_payment)
    .bind(invoice.close)
    .bind(&invoice.observations)
    .bind(&invoice.document)
    .bind(invoice.invoice_ok)
    .bind(invoice.sponsoring_id)
    .bind(invoice.audit.created_by)
    .bind(invoice.audit.created_at)
    .bind(invoice.audit.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(map_db_error)?;
    Ok(())
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, new: NewUser) -> AppResult<User> {
        let user = User::create(new);
        let mut conn = self.pool.acquire().await?;
        insert_user(&mut conn, &user).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "User created");
        Ok(user)
    }

    async fn register_organizer(&self, new: NewUser) -> AppResult<(User, Organizer)> {
        let user = User::create(new);
        let profile = NewOrganizer {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            user_id: user.id,
            account_data_id: None,
        };
        profile.validate()?;
        let organizer = Organizer::create(profile, Some(user.id));

        let mut tx = self.pool.begin().await?;
        insert_user(&mut tx, &user).await?;
        save_organizer(&mut tx, &organizer).await?;
        record_version(&mut tx, &organizer, Some(user.id)).await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, username = %user.username, "Organizer registered");
        Ok((user, organizer))
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_users_by_email(&self, email: &str) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn save_user(&self, user: &User) -> AppResult<User> {
        let saved = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET email = $2,
                first_name = $3,
                last_name = $4,
                password_hash = $5,
                is_active = $6,
                is_superuser = $7,
                permissions = $8,
                last_login = $9
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.is_superuser)
        .bind(&user.permissions)
        .bind(user.last_login)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;
        saved.ok_or_else(|| AppError::not_found("User", user.id))
    }

    async fn create_bank_account(
        &self,
        new: NewBankAccountData,
        actor: Option<Uuid>,
    ) -> AppResult<BankAccountData> {
        new.validate()?;
        let account = BankAccountData::create(new, actor);
        let mut tx = self.pool.begin().await?;
        save_bank_account(&mut tx, &account).await?;
        record_version(&mut tx, &account, actor).await?;
        tx.commit().await?;
        Ok(account)
    }

    async fn get_bank_account(&self, id: Uuid) -> AppResult<Option<BankAccountData>> {
        let account = sqlx::query_as::<_, BankAccountData>(&select(
            BANK_ACCOUNT_COLUMNS,
            "bank_accounts",
            "WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn list_bank_accounts(&self) -> AppResult<Vec<BankAccountData>> {
        let accounts = sqlx::query_as::<_, BankAccountData>(&select(
            BANK_ACCOUNT_COLUMNS,
            "bank_accounts",
            "ORDER BY created_at",
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(accounts)
    }

    async fn update_bank_account(
        &self,
        id: Uuid,
        new: NewBankAccountData,
        actor: Option<Uuid>,
    ) -> AppResult<BankAccountData> {
        new.validate()?;
        let mut tx = self.pool.begin().await?;
        let mut account = sqlx::query_as::<_, BankAccountData>(&select(
            BANK_ACCOUNT_COLUMNS,
            "bank_accounts",
            "WHERE id = $1 FOR UPDATE",
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Bank account", id))?;
        account.apply(new);
        save_bank_account(&mut tx, &account).await?;
        record_version(&mut tx, &account, actor).await?;
        tx.commit().await?;
        Ok(account)
    }

    async fn delete_bank_account(&self, id: Uuid) -> AppResult<()> {
        self.delete_by_id("bank_accounts", id, "Bank account").await
    }

    async fn bank_account_owners(&self, id: Uuid) -> AppResult<Vec<Organizer>> {
        let owners = sqlx::query_as::<_, Organizer>(&select(
            ORGANIZER_COLUMNS,
            "organizers",
            "WHERE account_data_id = $1 ORDER BY created_at DESC",
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(owners)
    }

    async fn create_organizer(
        &self,
        new: NewOrganizer,
        actor: Option<Uuid>,
    ) -> AppResult<Organizer> {
        new.validate()?;
        let organizer = Organizer::create(new, actor);
        let mut tx = self.pool.begin().await?;
        save_organizer(&mut tx, &organizer).await?;
        record_version(&mut tx, &organizer, actor).await?;
        tx.commit().await?;
        Ok(organizer)
    }

    async fn get_organizer(&self, id: Uuid) -> AppResult<Option<Organizer>> {
        let organizer = sqlx::query_as::<_, Organizer>(&select(
            ORGANIZER_COLUMNS,
            "organizers",
            "WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(organizer)
    }

    async fn find_organizer_by_user(&self, user_id: Uuid) -> AppResult<Option<Organizer>> {
        let organizer = sqlx::query_as::<_, Organizer>(&select(
            ORGANIZER_COLUMNS,
            "organizers",
            "WHERE user_id = $1",
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(organizer)
    }

    async fn list_organizers(&self) -> AppResult<Vec<Organizer>> {
        let organizers = sqlx::query_as::<_, Organizer>(&select(
            ORGANIZER_COLUMNS,
            "organizers",
            "ORDER BY created_at DESC",
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(organizers)
    }

    async fn update_organizer(
        &self,
        id: Uuid,
        new: NewOrganizer,
        actor: Option<Uuid>,
    ) -> AppResult<Organizer> {
        new.validate()?;
        let mut tx = self.pool.begin().await?;
        let mut organizer = sqlx::query_as::<_, Organizer>(&select(
            ORGANIZER_COLUMNS,
            "organizers",
            "WHERE id = $1 FOR UPDATE",
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Organizer", id))?;
        organizer.apply(new);
        save_organizer(&mut tx, &organizer).await?;
        record_version(&mut tx, &organizer, actor).await?;
        tx.commit().await?;
        Ok(organizer)
    }

    async fn delete_organizer(&self, id: Uuid) -> AppResult<()> {
        self.delete_by_id("organizers", id, "Organizer").await
    }

    async fn create_event(&self, new: NewEvent, actor: Option<Uuid>) -> AppResult<Event> {
        new.validate()?;
        let event = Event::create(new, actor);
        let mut tx = self.pool.begin().await?;
        save_event(&mut tx, &event).await?;
        record_version(&mut tx, &event, actor).await?;
        tx.commit().await?;
        tracing::info!(event_id = %event.id, name = %event.name, "Event created");
        Ok(event)
    }

    async fn get_event(&self, id: Uuid) -> AppResult<Option<Event>> {
        let event =
            sqlx::query_as::<_, Event>(&select(EVENT_COLUMNS, "events", "WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(event)
    }

    async fn list_events(&self) -> AppResult<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&select(
            EVENT_COLUMNS,
            "events",
            "ORDER BY start_date DESC NULLS FIRST, created_at DESC",
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn update_event(
        &self,
        id: Uuid,
        new: NewEvent,
        actor: Option<Uuid>,
    ) -> AppResult<Event> {
        new.validate()?;
        let mut tx = self.pool.begin().await?;
        let mut event = sqlx::query_as::<_, Event>(&select(
            EVENT_COLUMNS,
            "events",
            "WHERE id = $1 FOR UPDATE",
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Event", id))?;
        event.apply(new);
        save_event(&mut tx, &event).await?;
        record_version(&mut tx, &event, actor).await?;
        tx.commit().await?;
        Ok(event)
    }

    async fn delete_event(&self, id: Uuid) -> AppResult<()> {
        self.delete_by_id("events", id, "Event").await
    }

    async fn add_event_organizer(
        &self,
        new: NewEventOrganizer,
        actor: Option<Uuid>,
    ) -> AppResult<EventOrganizer> {
        let link = EventOrganizer::create(new, actor);
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO event_organizers (id, event_id, organizer_id,
                created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(link.id)
        .bind(link.event_id)
        .bind(link.organizer_id)
        .bind(link.audit.created_by)
        .bind(link.audit.created_at)
        .bind(link.audit.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;
        record_version(&mut tx, &link, actor).await?;
        tx.commit().await?;
        Ok(link)
    }

    async fn list_event_organizers(&self, event_id: Uuid) -> AppResult<Vec<EventOrganizer>> {
        let links = sqlx::query_as::<_, EventOrganizer>(&select(
            EVENT_ORGANIZER_COLUMNS,
            "event_organizers",
            "WHERE event_id = $1 ORDER BY created_at",
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(links)
    }

    async fn remove_event_organizer(&self, id: Uuid) -> AppResult<()> {
        self.delete_by_id("event_organizers", id, "Event organizer")
            .await
    }

    async fn create_sponsor_category(
        &self,
        new: NewSponsorCategory,
        actor: Option<Uuid>,
    ) -> AppResult<SponsorCategory> {
        new.validate()?;
        let category = SponsorCategory::create(new, actor);
        let mut tx = self.pool.begin().await?;
        save_sponsor_category(&mut tx, &category).await?;
        record_version(&mut tx, &category, actor).await?;
        tx.commit().await?;
        Ok(category)
    }

    async fn get_sponsor_category(&self, id: Uuid) -> AppResult<Option<SponsorCategory>> {
        let category = sqlx::query_as::<_, SponsorCategory>(&select(
            SPONSOR_CATEGORY_COLUMNS,
            "sponsor_categories",
            "WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    async fn list_sponsor_categories(&self, event_id: Uuid) -> AppResult<Vec<SponsorCategory>> {
        let categories = sqlx::query_as::<_, SponsorCategory>(&select(
            SPONSOR_CATEGORY_COLUMNS,
            "sponsor_categories",
            "WHERE event_id = $1 ORDER BY created_at",
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    async fn update_sponsor_category(
        &self,
        id: Uuid,
        new: NewSponsorCategory,
        actor: Option<Uuid>,
    ) -> AppResult<SponsorCategory> {
        new.validate()?;
        let mut tx = self.pool.begin().await?;
        let mut category = sqlx::query_as::<_, SponsorCategory>(&select(
            SPONSOR_CATEGORY_COLUMNS,
            "sponsor_categories",
            "WHERE id = $1 FOR UPDATE",
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Sponsor category", id))?;
        category.apply(new);
        save_sponsor_category(&mut tx, &category).await?;
        record_version(&mut tx, &category, actor).await?;
        tx.commit().await?;
        Ok(category)
    }

    async fn delete_sponsor_category(&self, id: Uuid) -> AppResult<()> {
        self.delete_by_id("sponsor_categories", id, "Sponsor category")
            .await
    }

    async fn create_sponsor(&self, new: NewSponsor, actor: Option<Uuid>) -> AppResult<Sponsor> {
        new.validate()?;
        let sponsor = Sponsor::create(new, actor);
        let mut tx = self.pool.begin().await?;
        save_sponsor(&mut tx, &sponsor).await?;
        record_version(&mut tx, &sponsor, actor).await?;
        tx.commit().await?;
        tracing::info!(sponsor_id = %sponsor.id, "Sponsor created");
        Ok(sponsor)
    }

    async fn get_sponsor(&self, id: Uuid, scope: SponsorScope) -> AppResult<Option<Sponsor>> {
        let sponsor = sqlx::query_as::<_, Sponsor>(&select(
            SPONSOR_COLUMNS,
            "sponsors",
            "WHERE id = $1 AND ($2 OR active)",
        ))
        .bind(id)
        .bind(scope == SponsorScope::All)
        .fetch_optional(&self.pool)
        .await?;
        Ok(sponsor)
    }

    async fn list_sponsors(&self, scope: SponsorScope) -> AppResult<Vec<Sponsor>> {
        let sponsors = sqlx::query_as::<_, Sponsor>(&select(
            SPONSOR_COLUMNS,
            "sponsors",
            "WHERE ($1 OR active) ORDER BY created_at DESC",
        ))
        .bind(scope == SponsorScope::All)
        .fetch_all(&self.pool)
        .await?;
        Ok(sponsors)
    }

    async fn update_sponsor(
        &self,
        id: Uuid,
        new: NewSponsor,
        actor: Option<Uuid>,
    ) -> AppResult<Sponsor> {
        new.validate()?;
        let mut tx = self.pool.begin().await?;
        let mut sponsor = lock_active_sponsor(&mut tx, id).await?;
        sponsor.apply(new);
        save_sponsor(&mut tx, &sponsor).await?;
        record_version(&mut tx, &sponsor, actor).await?;
        tx.commit().await?;
        Ok(sponsor)
    }

    async fn set_sponsor_enabled(
        &self,
        id: Uuid,
        enabled: bool,
        actor: Option<Uuid>,
    ) -> AppResult<Sponsor> {
        let mut tx = self.pool.begin().await?;
        let mut sponsor = lock_active_sponsor(&mut tx, id).await?;
        sponsor.enabled = enabled;
        sponsor.audit.touch();
        save_sponsor(&mut tx, &sponsor).await?;
        record_version(&mut tx, &sponsor, actor).await?;
        tx.commit().await?;
        tracing::info!(sponsor_id = %id, enabled, "Sponsor enabled flag changed");
        Ok(sponsor)
    }

    async fn deactivate_sponsor(&self, id: Uuid, actor: Option<Uuid>) -> AppResult<Sponsor> {
        let mut tx = self.pool.begin().await?;
        let mut sponsor = lock_active_sponsor(&mut tx, id).await?;
        sponsor.active = false;
        sponsor.audit.touch();
        save_sponsor(&mut tx, &sponsor).await?;
        record_version(&mut tx, &sponsor, actor).await?;
        tx.commit().await?;
        tracing::info!(sponsor_id = %id, "Sponsor deactivated");
        Ok(sponsor)
    }

    async fn create_sponsoring(
        &self,
        new: NewSponsoring,
        actor: Option<Uuid>,
    ) -> AppResult<Sponsoring> {
        let mut tx = self.pool.begin().await?;
        let active: Option<bool> =
            sqlx::query_scalar("SELECT active FROM sponsors WHERE id = $1 FOR SHARE")
                .bind(new.sponsor_id)
                .fetch_optional(&mut *tx)
                .await?;
        if active != Some(true) {
            return Err(violation(constraints::SPONSORINGS_SPONSOR_FKEY));
        }
        let sponsoring = Sponsoring::create(new, actor);
        save_sponsoring(&mut tx, &sponsoring).await?;
        record_version(&mut tx, &sponsoring, actor).await?;
        tx.commit().await?;
        Ok(sponsoring)
    }

    async fn get_sponsoring(&self, id: Uuid) -> AppResult<Option<Sponsoring>> {
        let sponsoring = sqlx::query_as::<_, Sponsoring>(&select(
            SPONSORING_COLUMNS,
            "sponsorings",
            "WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(sponsoring)
    }

    async fn list_sponsorings(&self, category_id: Option<Uuid>) -> AppResult<Vec<Sponsoring>> {
        let sponsorings = sqlx::query_as::<_, Sponsoring>(&select(
            SPONSORING_COLUMNS,
            "sponsorings",
            "WHERE ($1::uuid IS NULL OR sponsor_category_id = $1) ORDER BY created_at",
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sponsorings)
    }

    async fn update_sponsoring_comments(
        &self,
        id: Uuid,
        comments: String,
        actor: Option<Uuid>,
    ) -> AppResult<Sponsoring> {
        let mut tx = self.pool.begin().await?;
        let mut sponsoring = sqlx::query_as::<_, Sponsoring>(&select(
            SPONSORING_COLUMNS,
            "sponsorings",
            "WHERE id = $1 FOR UPDATE",
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Sponsoring", id))?;
        sponsoring.comments = comments;
        sponsoring.audit.touch();
        save_sponsoring(&mut tx, &sponsoring).await?;
        record_version(&mut tx, &sponsoring, actor).await?;
        tx.commit().await?;
        Ok(sponsoring)
    }

    async fn delete_sponsoring(&self, id: Uuid) -> AppResult<()> {
        self.delete_by_id("sponsorings", id, "Sponsoring").await
    }

    async fn create_invoice(&self, new: NewInvoice, actor: Option<Uuid>) -> AppResult<Invoice> {
        new.validate()?;
        let invoice = Invoice::create(new, actor);
        let mut tx = self.pool.begin().await?;
        save_invoice(&mut tx, &invoice).await?;
        record_version(&mut tx, &invoice, actor).await?;
        tx.commit().await?;
        Ok(invoice)
    }

    async fn get_invoice(&self, id: Uuid) -> AppResult<Option<Invoice>> {
        let invoice =
            sqlx::query_as::<_, Invoice>(&select(INVOICE_COLUMNS, "invoices", "WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(invoice)
    }

    async fn list_invoices(&self, sponsoring_id: Option<Uuid>) -> AppResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(&select(
            INVOICE_COLUMNS,
            "invoices",
            "WHERE ($1::uuid IS NULL OR sponsoring_id = $1) ORDER BY created_at",
        ))
        .bind(sponsoring_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(invoices)
    }

    async fn update_invoice(
        &self,
        id: Uuid,
        new: NewInvoice,
        actor: Option<Uuid>,
    ) -> AppResult<Invoice> {
        new.validate()?;
        let mut tx = self.pool.begin().await?;
        let mut invoice = sqlx::query_as::<_, Invoice>(&select(
            INVOICE_COLUMNS,
            "invoices",
            "WHERE id = $1 FOR UPDATE",
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Invoice", id))?;
        invoice.apply(new);
        save_invoice(&mut tx, &invoice).await?;
        record_version(&mut tx, &invoice, actor).await?;
        tx.commit().await?;
        Ok(invoice)
    }

    async fn delete_invoice(&self, id: Uuid) -> AppResult<()> {
        self.delete_by_id("invoices", id, "Invoice").await
    }

    async fn create_invoice_affect(
        &self,
        new: NewInvoiceAffect,
        actor: Option<Uuid>,
    ) -> AppResult<InvoiceAffect> {
        new.validate()?;
        let affect = InvoiceAffect::create(new, actor);
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO invoice_affects (id, amount, observations, invoice_id, document, category,
                created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(affect.id)
        .bind(affect.amount)
        .bind(&affect.observations)
        .bind(affect.invoice_id)
        .bind(&affect.document)
        .bind(affect.category)
        .bind(affect.audit.created_by)
        .bind(affect.audit.created_at)
        .bind(affect.audit.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;
        record_version(&mut tx, &affect, actor).await?;
        tx.commit().await?;
        Ok(affect)
    }

    async fn list_invoice_affects(&self, invoice_id: Uuid) -> AppResult<Vec<InvoiceAffect>> {
        let affects = sqlx::query_as::<_, InvoiceAffect>(&select(
            INVOICE_AFFECT_COLUMNS,
            "invoice_affects",
            "WHERE invoice_id = $1 ORDER BY created_at",
        ))
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(affects)
    }

    async fn delete_invoice_affect(&self, id: Uuid) -> AppResult<()> {
        self.delete_by_id("invoice_affects", id, "Invoice affect")
            .await
    }

    async fn list_versions(&self, entity: EntityKind, object_id: Uuid) -> AppResult<Vec<Version>> {
        let versions = sqlx::query_as::<_, Version>(&format!(
            "SELECT {} FROM versions WHERE entity = $1 AND object_id = $2 ORDER BY revision DESC",
            VERSION_COLUMNS
        ))
        .bind(entity)
        .bind(object_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(versions)
    }
}

async fn lock_active_sponsor(conn: &mut PgConnection, id: Uuid) -> AppResult<Sponsor> {
    sqlx::query_as::<_, Sponsor>(&select(
        SPONSOR_COLUMNS,
        "sponsors",
        "WHERE id = $1 AND active FOR UPDATE",
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::not_found("Sponsor", id))
}
