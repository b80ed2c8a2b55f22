//! In-process store for local runs and tests. Enforces the same integrity
//! rules and cascades as the Postgres schema.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
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

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Rows are kept in insertion order.
#[derive(Default)]
struct Tables {
    users: Vec<User>,
    bank_accounts: Vec<BankAccountData>,
    organizers: Vec<Organizer>,
    events: Vec<Event>,
    event_organizers: Vec<EventOrganizer>,
    sponsor_categories: Vec<SponsorCategory>,
    sponsors: Vec<Sponsor>,
    sponsorings: Vec<Sponsoring>,
    invoices: Vec<Invoice>,
    invoice_affects: Vec<InvoiceAffect>,
    versions: Vec<Version>,
}

fn find<T: Versioned>(rows: &[T], id: Uuid) -> Option<&T> {
    rows.iter().find(|row| row.id() == id)
}

fn find_mut<T: Versioned>(rows: &mut [T], id: Uuid) -> Option<&mut T> {
    rows.iter_mut().find(|row| row.id() == id)
}

fn exists<T: Versioned>(rows: &[T], id: Uuid) -> bool {
    find(rows, id).is_some()
}

fn newest_first<'a, T: Clone + 'a>(rows: impl DoubleEndedIterator<Item = &'a T>) -> Vec<T> {
    rows.rev().cloned().collect()
}

fn remove<T: Versioned>(rows: &mut Vec<T>, id: Uuid, kind: &str) -> AppResult<()> {
    let before = rows.len();
    rows.retain(|row| row.id() != id);
    if rows.len() == before {
        return Err(AppError::not_found(kind, id));
    }
    Ok(())
}

impl Tables {
    fn record<T: Versioned>(&mut self, record: &T, actor: Option<Uuid>) -> AppResult<()> {
        let object_id = record.id();
        let revision = self
            .versions
            .iter()
            .filter(|v| v.entity == T::KIND && v.object_id == object_id)
            .count() as i32
            + 1;
        self.versions.push(Version {
            id: Uuid::new_v4(),
            entity: T::KIND,
            object_id,
            revision,
            data: serde_json::to_value(record)?,
            created_by: actor,
            created_at: Utc::now(),
        });
        Ok(())
    }

    fn check_organizer(&self, new: &NewOrganizer, current: Option<Uuid>) -> AppResult<()> {
        if !self.users.iter().any(|u| u.id == new.user_id) {
            return Err(violation(constraints::ORGANIZERS_USER_FKEY));
        }
        if let Some(account_id) = new.account_data_id {
            if !exists(&self.bank_accounts, account_id) {
                return Err(violation(constraints::ORGANIZERS_ACCOUNT_FKEY));
            }
        }
        if self
            .organizers
            .iter()
            .any(|o| o.user_id == new.user_id && Some(o.id) != current)
        {
            return Err(violation(constraints::ORGANIZERS_USER_KEY));
        }
        Ok(())
    }

    fn check_sponsor_category(
        &self,
        new: &NewSponsorCategory,
        current: Option<Uuid>,
    ) -> AppResult<()> {
        if !exists(&self.events, new.event_id) {
            return Err(violation(constraints::SPONSOR_CATEGORIES_EVENT_FKEY));
        }
        if self.sponsor_categories.iter().any(|c| {
            c.event_id == new.event_id && c.name == new.name && Some(c.id) != current
        }) {
            return Err(violation(constraints::SPONSOR_CATEGORIES_KEY));
        }
        Ok(())
    }

    fn check_sponsor(&self, new: &NewSponsor, current: Option<Uuid>) -> AppResult<()> {
        if self
            .sponsors
            .iter()
            .any(|s| s.document_number == new.document_number && Some(s.id) != current)
        {
            return Err(violation(constraints::SPONSORS_DOCUMENT_NUMBER_KEY));
        }
        Ok(())
    }

    fn check_invoice(&self, new: &NewInvoice) -> AppResult<()> {
        if let Some(sponsoring_id) = new.sponsoring_id {
            if !exists(&self.sponsorings, sponsoring_id) {
                return Err(violation(constraints::INVOICES_SPONSORING_FKEY));
            }
        }
        Ok(())
    }

    fn remove_bank_account(&mut self, id: Uuid) -> AppResult<()> {
        remove(&mut self.bank_accounts, id, "Bank account")?;
        let owners: Vec<Uuid> = self
            .organizers
            .iter()
            .filter(|o| o.account_data_id == Some(id))
            .map(|o| o.id)
            .collect();
        for organizer_id in owners {
            self.remove_organizer(organizer_id)?;
        }
        Ok(())
    }

    fn remove_organizer(&mut self, id: Uuid) -> AppResult<()> {
        remove(&mut self.organizers, id, "Organizer")?;
        self.event_organizers.retain(|eo| eo.organizer_id != id);
        Ok(())
    }

    fn remove_event(&mut self, id: Uuid) -> AppResult<()> {
        remove(&mut self.events, id, "Event")?;
        self.event_organizers.retain(|eo| eo.event_id != id);
        let categories: Vec<Uuid> = self
            .sponsor_categories
            .iter()
            .filter(|c| c.event_id == id)
            .map(|c| c.id)
            .collect();
        for category_id in categories {
            self.remove_sponsor_category(category_id)?;
        }
        Ok(())
    }

    fn remove_sponsor_category(&mut self, id: Uuid) -> AppResult<()> {
        remove(&mut self.sponsor_categories, id, "Sponsor category")?;
        let sponsorings: Vec<Uuid> = self
            .sponsorings
            .iter()
            .filter(|s| s.sponsor_category_id == id)
            .map(|s| s.id)
            .collect();
        for sponsoring_id in sponsorings {
            self.remove_sponsoring(sponsoring_id)?;
        }
        Ok(())
    }

    fn remove_sponsoring(&mut self, id: Uuid) -> AppResult<()> {
        remove(&mut self.sponsorings, id, "Sponsoring")?;
        for invoice in self
            .invoices
            .iter_mut()
            .filter(|i| i.sponsoring_id == Some(id))
        {
            invoice.sponsoring_id = None;
        }
        Ok(())
    }

    fn remove_invoice(&mut self, id: Uuid) -> AppResult<()> {
        remove(&mut self.invoices, id, "Invoice")?;
        self.invoice_affects.retain(|a| a.invoice_id != id);
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, new: NewUser) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.username == new.username) {
            return Err(violation(constraints::USERS_USERNAME_KEY));
        }
        let user = User::create(new);
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn register_organizer(&self, new: NewUser) -> AppResult<(User, Organizer)> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.username == new.username) {
            return Err(violation(constraints::USERS_USERNAME_KEY));
        }
        let user = User::create(new);
        let profile = NewOrganizer {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            user_id: user.id,
            account_data_id: None,
        };
        profile.validate()?;
        let organizer = Organizer::create(profile, Some(user.id));
        tables.record(&organizer, Some(user.id))?;
        tables.users.push(user.clone());
        tables.organizers.push(organizer.clone());
        Ok((user, organizer))
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_users_by_email(&self, email: &str) -> AppResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .filter(|u| u.email.eq_ignore_ascii_case(email))
            .cloned()
            .collect())
    }

    async fn save_user(&self, user: &User) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| AppError::not_found("User", user.id))?;
        stored.email = user.email.clone();
        stored.first_name = user.first_name.clone();
        stored.last_name = user.last_name.clone();
        stored.password_hash = user.password_hash.clone();
        stored.is_active = user.is_active;
        stored.is_superuser = user.is_superuser;
        stored.permissions = user.permissions.clone();
        stored.last_login = user.last_login;
        Ok(stored.clone())
    }

    async fn create_bank_account(
        &self,
        new: NewBankAccountData,
        actor: Option<Uuid>,
    ) -> AppResult<BankAccountData> {
        new.validate()?;
        let mut tables = self.tables.write().await;
        let account = BankAccountData::create(new, actor);
        tables.record(&account, actor)?;
        tables.bank_accounts.push(account.clone());
        Ok(account)
    }

    async fn get_bank_account(&self, id: Uuid) -> AppResult<Option<BankAccountData>> {
        let tables = self.tables.read().await;
        Ok(find(&tables.bank_accounts, id).cloned())
    }

    async fn list_bank_accounts(&self) -> AppResult<Vec<BankAccountData>> {
        let tables = self.tables.read().await;
        Ok(tables.bank_accounts.clone())
    }

    async fn update_bank_account(
        &self,
        id: Uuid,
        new: NewBankAccountData,
        actor: Option<Uuid>,
    ) -> AppResult<BankAccountData> {
        new.validate()?;
        let mut tables = self.tables.write().await;
        let account = find_mut(&mut tables.bank_accounts, id)
            .ok_or_else(|| AppError::not_found("Bank account", id))?;
        account.apply(new);
        let account = account.clone();
        tables.record(&account, actor)?;
        Ok(account)
    }

    async fn delete_bank_account(&self, id: Uuid) -> AppResult<()> {
        self.tables.write().await.remove_bank_account(id)
    }

    async fn bank_account_owners(&self, id: Uuid) -> AppResult<Vec<Organizer>> {
        let tables = self.tables.read().await;
        Ok(tables
            .organizers
            .iter()
            .filter(|o| o.account_data_id == Some(id))
            .cloned()
            .collect())
    }

    async fn create_organizer(
        &self,
        new: NewOrganizer,
        actor: Option<Uuid>,
    ) -> AppResult<Organizer> {
        new.validate()?;
        let mut tables = self.tables.write().await;
        tables.check_organizer(&new, None)?;
        let organizer = Organizer::create(new, actor);
        tables.record(&organizer, actor)?;
        tables.organizers.push(organizer.clone());
        Ok(organizer)
    }

    async fn get_organizer(&self, id: Uuid) -> AppResult<Option<Organizer>> {
        let tables = self.tables.read().await;
        Ok(find(&tables.organizers, id).cloned())
    }

    async fn find_organizer_by_user(&self, user_id: Uuid) -> AppResult<Option<Organizer>> {
        let tables = self.tables.read().await;
        Ok(tables
            .organizers
            .iter()
            .find(|o| o.user_id == user_id)
            .cloned())
    }

    async fn list_organizers(&self) -> AppResult<Vec<Organizer>> {
        let tables = self.tables.read().await;
        Ok(newest_first(tables.organizers.iter()))
    }

    async fn update_organizer(
        &self,
        id: Uuid,
        new: NewOrganizer,
        actor: Option<Uuid>,
    ) -> AppResult<Organizer> {
        new.validate()?;
        let mut tables = self.tables.write().await;
        if !exists(&tables.organizers, id) {
            return Err(AppError::not_found("Organizer", id));
        }
        tables.check_organizer(&new, Some(id))?;
        let organizer = find_mut(&mut tables.organizers, id)
            .ok_or_else(|| AppError::not_found("Organizer", id))?;
        organizer.apply(new);
        let organizer = organizer.clone();
        tables.record(&organizer, actor)?;
        Ok(organizer)
    }

    async fn delete_organizer(&self, id: Uuid) -> AppResult<()> {
        self.tables.write().await.remove_organizer(id)
    }

    async fn create_event(&self, new: NewEvent, actor: Option<Uuid>) -> AppResult<Event> {
        new.validate()?;
        let mut tables = self.tables.write().await;
        let event = Event::create(new, actor);
        tables.record(&event, actor)?;
        tables.events.push(event.clone());
        Ok(event)
    }

    async fn get_event(&self, id: Uuid) -> AppResult<Option<Event>> {
        let tables = self.tables.read().await;
        Ok(find(&tables.events, id).cloned())
    }

    async fn list_events(&self) -> AppResult<Vec<Event>> {
        let tables = self.tables.read().await;
        let mut events = newest_first(tables.events.iter());
        // Undated events first, then the latest start date, as Postgres
        // sorts NULLs in a descending order.
        events.sort_by(|a, b| match (a.start_date, b.start_date) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => std::cmp::Ordering::Greater,
            (None, Some(_)) => std::cmp::Ordering::Less,
            (None, None) => std::cmp::Ordering::Equal,
        });
        Ok(events)
    }

    async fn update_event(
        &self,
        id: Uuid,
        new: NewEvent,
        actor: Option<Uuid>,
    ) -> AppResult<Event> {
        new.validate()?;
        let mut tables = self.tables.write().await;
        let event =
            find_mut(&mut tables.events, id).ok_or_else(|| AppError::not_found("Event", id))?;
        event.apply(new);
        let event = event.clone();
        tables.record(&event, actor)?;
        Ok(event)
    }

    async fn delete_event(&self, id: Uuid) -> AppResult<()> {
        self.tables.write().await.remove_event(id)
    }

    async fn add_event_organizer(
        &self,
        new: NewEventOrganizer,
        actor: Option<Uuid>,
    ) -> AppResult<EventOrganizer> {
        let mut tables = self.tables.write().await;
        if !exists(&tables.events, new.event_id) {
            return Err(violation(constraints::EVENT_ORGANIZERS_EVENT_FKEY));
        }
        if !exists(&tables.organizers, new.organizer_id) {
            return Err(violation(constraints::EVENT_ORGANIZERS_ORGANIZER_FKEY));
        }
        if tables
            .event_organizers
            .iter()
            .any(|eo| eo.event_id == new.event_id && eo.organizer_id == new.organizer_id)
        {
            return Err(violation(constraints::EVENT_ORGANIZERS_KEY));
        }
        let link = EventOrganizer::create(new, actor);
        tables.record(&link, actor)?;
        tables.event_organizers.push(link.clone());
        Ok(link)
    }

    async fn list_event_organizers(&self, event_id: Uuid) -> AppResult<Vec<EventOrganizer>> {
        let tables = self.tables.read().await;
        Ok(tables
            .event_organizers
            .iter()
            .filter(|eo| eo.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn remove_event_organizer(&self, id: Uuid) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        remove(&mut tables.event_organizers, id, "Event organizer")
    }

    async fn create_sponsor_category(
        &self,
        new: NewSponsorCategory,
        actor: Option<Uuid>,
    ) -> AppResult<SponsorCategory> {
        new.validate()?;
        let mut tables = self.tables.write().await;
        tables.check_sponsor_category(&new, None)?;
        let category = SponsorCategory::create(new, actor);
        tables.record(&category, actor)?;
        tables.sponsor_categories.push(category.clone());
        Ok(category)
    }

    async fn get_sponsor_category(&self, id: Uuid) -> AppResult<Option<SponsorCategory>> {
        let tables = self.tables.read().await;
        Ok(find(&tables.sponsor_categories, id).cloned())
    }

    async fn list_sponsor_categories(&self, event_id: Uuid) -> AppResult<Vec<SponsorCategory>> {
        let tables = self.tables.read().await;
        Ok(tables
            .sponsor_categories
            .iter()
            .filter(|c| c.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn update_sponsor_category(
        &self,
        id: Uuid,
        new: NewSponsorCategory,
        actor: Option<Uuid>,
    ) -> AppResult<SponsorCategory> {
        new.validate()?;
        let mut tables = self.tables.write().await;
        if !exists(&tables.sponsor_categories, id) {
            return Err(AppError::not_found("Sponsor category", id));
        }
        tables.check_sponsor_category(&new, Some(id))?;
        let category = find_mut(&mut tables.sponsor_categories, id)
            .ok_or_else(|| AppError::not_found("Sponsor category", id))?;
        category.apply(new);
        let category = category.clone();
        tables.record(&category, actor)?;
        Ok(category)
    }

    async fn delete_sponsor_category(&self, id: Uuid) -> AppResult<()> {
        self.tables.write().await.remove_sponsor_category(id)
    }

    async fn create_sponsor(&self, new: NewSponsor, actor: Option<Uuid>) -> AppResult<Sponsor> {
        new.validate()?;
        let mut tables = self.tables.write().await;
        tables.check_sponsor(&new, None)?;
        let sponsor = Sponsor::create(new, actor);
        tables.record(&sponsor, actor)?;
        tables.sponsors.push(sponsor.clone());
        Ok(sponsor)
    }

    async fn get_sponsor(&self, id: Uuid, scope: SponsorScope) -> AppResult<Option<Sponsor>> {
        let tables = self.tables.read().await;
        Ok(find(&tables.sponsors, id)
            .filter(|s| scope.includes(s))
            .cloned())
    }

    async fn list_sponsors(&self, scope: SponsorScope) -> AppResult<Vec<Sponsor>> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            tables.sponsors.iter().filter(|s| scope.includes(s)),
        ))
    }

    async fn update_sponsor(
        &self,
        id: Uuid,
        new: NewSponsor,
        actor: Option<Uuid>,
    ) -> AppResult<Sponsor> {
        new.validate()?;
        let mut tables = self.tables.write().await;
        if !find(&tables.sponsors, id).is_some_and(|s| s.active) {
            return Err(AppError::not_found("Sponsor", id));
        }
        tables.check_sponsor(&new, Some(id))?;
        let sponsor = find_mut(&mut tables.sponsors, id)
            .ok_or_else(|| AppError::not_found("Sponsor", id))?;
        sponsor.apply(new);
        let sponsor = sponsor.clone();
        tables.record(&sponsor, actor)?;
        Ok(sponsor)
    }

    async fn set_sponsor_enabled(
        &self,
        id: Uuid,
        enabled: bool,
        actor: Option<Uuid>,
    ) -> AppResult<Sponsor> {
        let mut tables = self.tables.write().await;
        let sponsor = find_mut(&mut tables.sponsors, id)
            .filter(|s| s.active)
            .ok_or_else(|| AppError::not_found("Sponsor", id))?;
        sponsor.enabled = enabled;
        sponsor.audit.touch();
        let sponsor = sponsor.clone();
        tables.record(&sponsor, actor)?;
        Ok(sponsor)
    }

    async fn deactivate_sponsor(&self, id: Uuid, actor: Option<Uuid>) -> AppResult<Sponsor> {
        let mut tables = self.tables.write().await;
        let sponsor = find_mut(&mut tables.sponsors, id)
            .filter(|s| s.active)
            .ok_or_else(|| AppError::not_found("Sponsor", id))?;
        sponsor.active = false;
        sponsor.audit.touch();
        let sponsor = sponsor.clone();
        tables.record(&sponsor, actor)?;
        Ok(sponsor)
    }

    async fn create_sponsoring(
        &self,
        new: NewSponsoring,
        actor: Option<Uuid>,
    ) -> AppResult<Sponsoring> {
        let mut tables = self.tables.write().await;
        if !exists(&tables.sponsor_categories, new.sponsor_category_id) {
            return Err(violation(constraints::SPONSORINGS_CATEGORY_FKEY));
        }
        if !find(&tables.sponsors, new.sponsor_id).is_some_and(|s| s.active) {
            return Err(violation(constraints::SPONSORINGS_SPONSOR_FKEY));
        }
        if tables.sponsorings.iter().any(|s| {
            s.sponsor_category_id == new.sponsor_category_id && s.sponsor_id == new.sponsor_id
        }) {
            return Err(violation(constraints::SPONSORINGS_KEY));
        }
        let sponsoring = Sponsoring::create(new, actor);
        tables.record(&sponsoring, actor)?;
        tables.sponsorings.push(sponsoring.clone());
        Ok(sponsoring)
    }

    async fn get_sponsoring(&self, id: Uuid) -> AppResult<Option<Sponsoring>> {
        let tables = self.tables.read().await;
        Ok(find(&tables.sponsorings, id).cloned())
    }

    async fn list_sponsorings(&self, category_id: Option<Uuid>) -> AppResult<Vec<Sponsoring>> {
        let tables = self.tables.read().await;
        Ok(tables
            .sponsorings
            .iter()
            .filter(|s| category_id.map_or(true, |c| s.sponsor_category_id == c))
            .cloned()
            .collect())
    }

    async fn update_sponsoring_comments(
        &self,
        id: Uuid,
        comments: String,
        actor: Option<Uuid>,
    ) -> AppResult<Sponsoring> {
        let mut tables = self.tables.write().await;
        let sponsoring = find_mut(&mut tables.sponsorings, id)
            .ok_or_else(|| AppError::not_found("Sponsoring", id))?;
        sponsoring.comments = comments;
        sponsoring.audit.touch();
        let sponsoring = sponsoring.clone();
        tables.record(&sponsoring, actor)?;
        Ok(sponsoring)
    }

    async fn delete_sponsoring(&self, id: Uuid) -> AppResult<()> {
        self.tables.write().await.remove_sponsoring(id)
    }

    async fn create_invoice(&self, new: NewInvoice, actor: Option<Uuid>) -> AppResult<Invoice> {
        new.validate()?;
        let mut tables = self.tables.write().await;
        tables.check_invoice(&new)?;
        let invoice = Invoice::create(new, actor);
        tables.record(&invoice, actor)?;
        tables.invoices.push(invoice.clone());
        Ok(invoice)
    }

    async fn get_invoice(&self, id: Uuid) -> AppResult<Option<Invoice>> {
        let tables = self.tables.read().await;
        Ok(find(&tables.invoices, id).cloned())
    }

    async fn list_invoices(&self, sponsoring_id: Option<Uuid>) -> AppResult<Vec<Invoice>> {
        let tables = self.tables.read().await;
        Ok(tables
            .invoices
            .iter()
            .filter(|i| sponsoring_id.map_or(true, |s| i.sponsoring_id == Some(s)))
            .cloned()
            .collect())
    }

    async fn update_invoice(
        &self,
        id: Uuid,
        new: NewInvoice,
        actor: Option<Uuid>,
    ) -> AppResult<Invoice> {
        new.validate()?;
        let mut tables = self.tables.write().await;
        tables.check_invoice(&new)?;
        let invoice = find_mut(&mut tables.invoices, id)
            .ok_or_else(|| AppError::not_found("Invoice", id))?;
        invoice.apply(new);
        let invoice = invoice.clone();
        tables.record(&invoice, actor)?;
        Ok(invoice)
    }

    async fn delete_invoice(&self, id: Uuid) -> AppResult<()> {
        self.tables.write().await.remove_invoice(id)
    }

    async fn create_invoice_affect(
        &self,
        new: NewInvoiceAffect,
        actor: Option<Uuid>,
    ) -> AppResult<InvoiceAffect> {
        new.validate()?;
        let mut tables = self.tables.write().await;
        if !exists(&tables.invoices, new.invoice_id) {
            return Err(violation(constraints::INVOICE_AFFECTS_INVOICE_FKEY));
        }
        let affect = InvoiceAffect::create(new, actor);
        tables.record(&affect, actor)?;
        tables.invoice_affects.push(affect.clone());
        Ok(affect)
    }

    async fn list_invoice_affects(&self, invoice_id: Uuid) -> AppResult<Vec<InvoiceAffect>> {
        let tables = self.tables.read().await;
        Ok(tables
            .invoice_affects
            .iter()
            .filter(|a| a.invoice_id == invoice_id)
            .cloned()
            .collect())
    }

    async fn delete_invoice_affect(&self, id: Uuid) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        remove(&mut tables.invoice_affects, id, "Invoice affect")
    }

    async fn list_versions(&self, entity: EntityKind, object_id: Uuid) -> AppResult<Vec<Version>> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            tables
                .versions
                .iter()
                .filter(|v| v.entity == entity && v.object_id == object_id),
        ))
    }
}
