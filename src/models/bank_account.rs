use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::audit::Audit;
use crate::models::choices::AccountType;
use crate::models::organizer::Organizer;
use crate::validation::{FieldErrors, CUIT_MAX_LEN, DEFAULT_MAX_LEN};

pub const ACCOUNT_NUMBER_MAX_LEN: usize = 13;

/// Account data for monetary transfers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct BankAccountData {
    pub id: Uuid,
    /// Account owner's CUIT.
    pub document_number: String,
    pub bank_entity: String,
    pub account_number: String,
    pub account_type: AccountType,
    pub organization_name: String,
    pub cbu: String,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub audit: Audit,
}

impl BankAccountData {
    pub fn create(new: NewBankAccountData, actor: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_number: new.document_number,
            bank_entity: new.bank_entity,
            account_number: new.account_number,
            account_type: new.account_type,
            organization_name: new.organization_name,
            cbu: new.cbu,
            audit: Audit::new(actor),
        }
    }

    pub fn apply(&mut self, new: NewBankAccountData) {
        self.document_number = new.document_number;
        self.bank_entity = new.bank_entity;
        self.account_number = new.account_number;
        self.account_type = new.account_type;
        self.organization_name = new.organization_name;
        self.cbu = new.cbu;
        self.audit.touch();
    }

    /// Whether `organizer` is among `linked`, the organizers whose bank
    /// account is this one.
    pub fn is_owner(&self, organizer: &Organizer, linked: &[Organizer]) -> bool {
        linked
            .iter()
            .any(|owner| owner.id == organizer.id && owner.account_data_id == Some(self.id))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBankAccountData {
    pub document_number: String,
    pub bank_entity: String,
    pub account_number: String,
    pub account_type: AccountType,
    pub organization_name: String,
    pub cbu: String,
}

impl NewBankAccountData {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check_max_len("document_number", &self.document_number, CUIT_MAX_LEN);
        errors.check_cuit("document_number", &self.document_number);
        errors.check_required("bank_entity", &self.bank_entity, DEFAULT_MAX_LEN);
        errors.check_required("account_number", &self.account_number, ACCOUNT_NUMBER_MAX_LEN);
        errors.check_required("organization_name", &self.organization_name, DEFAULT_MAX_LEN);
        errors.check_required("cbu", &self.cbu, DEFAULT_MAX_LEN);
        errors.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::organizer::NewOrganizer;

    fn account_payload() -> NewBankAccountData {
        NewBankAccountData {
            document_number: "20-12345678-9".to_string(),
            bank_entity: "Banco Nación".to_string(),
            account_number: "1234567890".to_string(),
            account_type: AccountType::Checking,
            organization_name: "Asociación Civil Python Argentina".to_string(),
            cbu: "0110599520000012345678".to_string(),
        }
    }

    fn organizer(account: Option<Uuid>) -> Organizer {
        Organizer::create(
            NewOrganizer {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                user_id: Uuid::new_v4(),
                account_data_id: account,
            },
            None,
        )
    }

    #[test]
    fn test_valid_payload() {
        assert!(account_payload().validate().is_ok());
    }

    #[test]
    fn test_rejects_malformed_cuit() {
        let mut payload = account_payload();
        payload.document_number = "20123456789".to_string();
        let errors = payload.validate().unwrap_err();
        assert!(errors.has("document_number"));
    }

    #[test]
    fn test_rejects_long_account_number() {
        let mut payload = account_payload();
        payload.account_number = "12345678901234".to_string();
        let errors = payload.validate().unwrap_err();
        assert!(errors.has("account_number"));
    }

    #[test]
    fn test_is_owner() {
        let account = BankAccountData::create(account_payload(), None);
        let owner = organizer(Some(account.id));
        let co_owner = organizer(Some(account.id));
        let stranger = organizer(None);
        let linked = vec![owner.clone(), co_owner.clone()];

        assert!(account.is_owner(&owner, &linked));
        assert!(account.is_owner(&co_owner, &linked));
        assert!(!account.is_owner(&stranger, &linked));
        assert!(!account.is_owner(&owner, &[]));
    }
}
