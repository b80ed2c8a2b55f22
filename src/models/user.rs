use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::choices::choice_enum;

choice_enum! {
    /// Permission codenames granted to users.
    Permission {
        ViewOrganizers => ("view_organizers", "puede ver organizadores"),
        ViewEventOrganizers => ("view_event_organizers", "puede ver organizadores del evento"),
        SetSponsorsEnabled => ("set_sponsors_enabled", "puede habilitar patrocinadores"),
        ViewSponsors => ("view_sponsors", "puede ver patrocinadores"),
    }
}

/// Login account. Organizers hang from one of these.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub permissions: Vec<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub date_joined: DateTime<Utc>,
}

impl User {
    pub fn create(new: NewUser) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            first_name: new.first_name,
            last_name: new.last_name,
            password_hash: new.password_hash,
            is_active: new.is_active,
            is_superuser: new.is_superuser,
            permissions: Vec::new(),
            last_login: None,
            date_joined: Utc::now(),
        }
    }

    pub fn has_perm(&self, permission: Permission) -> bool {
        self.is_active
            && (self.is_superuser || self.permissions.iter().any(|p| p == permission.as_str()))
    }
}

/// Insert payload; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_superuser: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PermissionGrant {
    pub permissions: Vec<Permission>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(is_superuser: bool) -> User {
        User::create(NewUser {
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            password_hash: String::new(),
            is_active: true,
            is_superuser,
        })
    }

    #[test]
    fn test_permissions() {
        let mut plain = user(false);
        assert!(!plain.has_perm(Permission::ViewSponsors));

        plain.permissions = vec![Permission::ViewSponsors.as_str().to_string()];
        assert!(plain.has_perm(Permission::ViewSponsors));
        assert!(!plain.has_perm(Permission::SetSponsorsEnabled));

        assert!(user(true).has_perm(Permission::SetSponsorsEnabled));
    }

    #[test]
    fn test_inactive_users_hold_no_permissions() {
        let mut admin = user(true);
        admin.is_active = false;
        assert!(!admin.has_perm(Permission::ViewOrganizers));
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let mut plain = user(false);
        plain.password_hash = "$argon2id$secret".to_string();
        let json = serde_json::to_value(&plain).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
