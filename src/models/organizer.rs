use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::audit::Audit;
use crate::models::user::User;
use crate::validation::{FieldErrors, DEFAULT_MAX_LEN};

/// Person assigned to administrate events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Organizer {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub user_id: Uuid,
    pub account_data_id: Option<Uuid>,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub audit: Audit,
}

impl Organizer {
    pub fn create(new: NewOrganizer, actor: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: new.first_name,
            last_name: new.last_name,
            user_id: new.user_id,
            account_data_id: new.account_data_id,
            audit: Audit::new(actor),
        }
    }

    pub fn apply(&mut self, new: NewOrganizer) {
        self.first_name = new.first_name;
        self.last_name = new.last_name;
        self.user_id = new.user_id;
        self.account_data_id = new.account_data_id;
        self.audit.touch();
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewOrganizer {
    pub first_name: String,
    pub last_name: String,
    pub user_id: Uuid,
    #[serde(default)]
    pub account_data_id: Option<Uuid>,
}

impl NewOrganizer {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check_required("first_name", &self.first_name, DEFAULT_MAX_LEN);
        errors.check_required("last_name", &self.last_name, DEFAULT_MAX_LEN);
        errors.finish()
    }
}

/// Organizer joined with the login it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct OrganizerProfile {
    #[serde(flatten)]
    pub organizer: Organizer,
    pub username: String,
    pub email: String,
    pub display: String,
}

impl OrganizerProfile {
    pub fn new(organizer: Organizer, user: &User) -> Self {
        Self {
            organizer,
            username: user.username.clone(),
            email: user.email.clone(),
            display: format!("{} - {}", user.username, user.email),
        }
    }
}
