//! Persistence for every entity.
//!
//! [`Store`] is the write boundary: uniqueness, foreign keys and cascades are
//! enforced behind it, and every create or update appends a [`Version`].

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    BankAccountData, EntityKind, Event, EventOrganizer, Invoice, InvoiceAffect,
    NewBankAccountData, NewEvent, NewEventOrganizer, NewInvoice, NewInvoiceAffect, NewOrganizer,
    NewSponsor, NewSponsorCategory, NewSponsoring, NewUser, Organizer, Sponsor, SponsorCategory,
    SponsorScope, Sponsoring, User, Version,
};
use crate::utils::error::AppResult;

pub mod constraints;
pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// `actor` is the user performing the write; it becomes `created_by` on
/// inserts and is stamped on the version row.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(&self, new: NewUser) -> AppResult<User>;
    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;
    async fn find_users_by_email(&self, email: &str) -> AppResult<Vec<User>>;
    /// Persists the mutable account fields of `user`.
    async fn save_user(&self, user: &User) -> AppResult<User>;
    /// Creates `new` together with its organizer profile, named after the
    /// user and created by it. Neither is kept if the other fails.
    async fn register_organizer(&self, new: NewUser) -> AppResult<(User, Organizer)>;

    async fn create_bank_account(
        &self,
        new: NewBankAccountData,
        actor: Option<Uuid>,
    ) -> AppResult<BankAccountData>;
    async fn get_bank_account(&self, id: Uuid) -> AppResult<Option<BankAccountData>>;
    async fn list_bank_accounts(&self) -> AppResult<Vec<BankAccountData>>;
    async fn update_bank_account(
        &self,
        id: Uuid,
        new: NewBankAccountData,
        actor: Option<Uuid>,
    ) -> AppResult<BankAccountData>;
    async fn delete_bank_account(&self, id: Uuid) -> AppResult<()>;
    /// Organizers whose bank account is `id`.
    async fn bank_account_owners(&self, id: Uuid) -> AppResult<Vec<Organizer>>;

    async fn create_organizer(&self, new: NewOrganizer, actor: Option<Uuid>)
        -> AppResult<Organizer>;
    async fn get_organizer(&self, id: Uuid) -> AppResult<Option<Organizer>>;
    async fn find_organizer_by_user(&self, user_id: Uuid) -> AppResult<Option<Organizer>>;
    async fn list_organizers(&self) -> AppResult<Vec<Organizer>>;
    async fn update_organizer(
        &self,
        id: Uuid,
        new: NewOrganizer,
        actor: Option<Uuid>,
    ) -> AppResult<Organizer>;
    async fn delete_organizer(&self, id: Uuid) -> AppResult<()>;

    async fn create_event(&self, new: NewEvent, actor: Option<Uuid>) -> AppResult<Event>;
    async fn get_event(&self, id: Uuid) -> AppResult<Option<Event>>;
    async fn list_events(&self) -> AppResult<Vec<Event>>;
    async fn update_event(&self, id: Uuid, new: NewEvent, actor: Option<Uuid>)
        -> AppResult<Event>;
    async fn delete_event(&self, id: Uuid) -> AppResult<()>;

    async fn add_event_organizer(
        &self,
        new: NewEventOrganizer,
        actor: Option<Uuid>,
    ) -> AppResult<EventOrganizer>;
    async fn list_event_organizers(&self, event_id: Uuid) -> AppResult<Vec<EventOrganizer>>;
    async fn remove_event_organizer(&self, id: Uuid) -> AppResult<()>;

    async fn create_sponsor_category(
        &self,
        new: NewSponsorCategory,
        actor: Option<Uuid>,
    ) -> AppResult<SponsorCategory>;
    async fn get_sponsor_category(&self, id: Uuid) -> AppResult<Option<SponsorCategory>>;
    async fn list_sponsor_categories(&self, event_id: Uuid) -> AppResult<Vec<SponsorCategory>>;
    async fn update_sponsor_category(
        &self,
        id: Uuid,
        new: NewSponsorCategory,
        actor: Option<Uuid>,
    ) -> AppResult<SponsorCategory>;
    async fn delete_sponsor_category(&self, id: Uuid) -> AppResult<()>;

    async fn create_sponsor(&self, new: NewSponsor, actor: Option<Uuid>) -> AppResult<Sponsor>;
    async fn get_sponsor(&self, id: Uuid, scope: SponsorScope) -> AppResult<Option<Sponsor>>;
    async fn list_sponsors(&self, scope: SponsorScope) -> AppResult<Vec<Sponsor>>;
    /// Only active sponsors can be edited.
    async fn update_sponsor(
        &self,
        id: Uuid,
        new: NewSponsor,
        actor: Option<Uuid>,
    ) -> AppResult<Sponsor>;
    async fn set_sponsor_enabled(
        &self,
        id: Uuid,
        enabled: bool,
        actor: Option<Uuid>,
    ) -> AppResult<Sponsor>;
    /// Soft delete: clears `active` and keeps the row.
    async fn deactivate_sponsor(&self, id: Uuid, actor: Option<Uuid>) -> AppResult<Sponsor>;

    async fn create_sponsoring(
        &self,
        new: NewSponsoring,
        actor: Option<Uuid>,
    ) -> AppResult<Sponsoring>;
    async fn get_sponsoring(&self, id: Uuid) -> AppResult<Option<Sponsoring>>;
    async fn list_sponsorings(&self, category_id: Option<Uuid>) -> AppResult<Vec<Sponsoring>>;
    async fn update_sponsoring_comments(
        &self,
        id: Uuid,
        comments: String,
        actor: Option<Uuid>,
    ) -> AppResult<Sponsoring>;
    async fn delete_sponsoring(&self, id: Uuid) -> AppResult<()>;

    async fn create_invoice(&self, new: NewInvoice, actor: Option<Uuid>) -> AppResult<Invoice>;
    async fn get_invoice(&self, id: Uuid) -> AppResult<Option<Invoice>>;
    async fn list_invoices(&self, sponsoring_id: Option<Uuid>) -> AppResult<Vec<Invoice>>;
    async fn update_invoice(
        &self,
        id: Uuid,
        new: NewInvoice,
        actor: Option<Uuid>,
    ) -> AppResult<Invoice>;
    async fn delete_invoice(&self, id: Uuid) -> AppResult<()>;

    async fn create_invoice_affect(
        &self,
        new: NewInvoiceAffect,
        actor: Option<Uuid>,
    ) -> AppResult<InvoiceAffect>;
    async fn list_invoice_affects(&self, invoice_id: Uuid) -> AppResult<Vec<InvoiceAffect>>;
    async fn delete_invoice_affect(&self, id: Uuid) -> AppResult<()>;

    /// Newest first.
    async fn list_versions(&self, entity: EntityKind, object_id: Uuid) -> AppResult<Vec<Version>>;

    async fn is_bank_account_owner(
        &self,
        account: &BankAccountData,
        organizer: &Organizer,
    ) -> AppResult<bool> {
        let linked = self.bank_account_owners(account.id).await?;
        Ok(account.is_owner(organizer, &linked))
    }
}
