pub mod audit;
pub mod bank_account;
pub mod choices;
pub mod event;
pub mod invoice;
pub mod organizer;
pub mod sponsor;
pub mod user;
pub mod version;

pub use audit::{Audit, Versioned};
pub use bank_account::{BankAccountData, NewBankAccountData};
pub use choices::{AccountType, AffectCategory, EventCategory, VatCondition};
pub use event::{Event, EventOrganizer, NewEvent, NewEventOrganizer};
pub use invoice::{Invoice, InvoiceAffect, NewInvoice, NewInvoiceAffect};
pub use organizer::{NewOrganizer, Organizer, OrganizerProfile};
pub use sponsor::{
    NewSponsor, NewSponsorCategory, NewSponsoring, Sponsor, SponsorCategory, SponsorScope,
    Sponsoring,
};
pub use user::{NewUser, Permission, PermissionGrant, User};
pub use version::{EntityKind, Version};
