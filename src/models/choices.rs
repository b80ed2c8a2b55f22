//! Fixed-choice columns stored as short text codes.

use thiserror::Error;

#[derive(Debug, Error)]
#[error("'{value}' is not a valid choice for {kind}")]
pub struct UnknownChoice {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a text-coded choice enum with its serde, display and Postgres
/// TEXT mappings.
macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $variant:ident => ($code:literal, $label:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $code)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $code,)+
                }
            }

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::models::choices::UnknownChoice;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($code => Ok($name::$variant),)+
                    other => Err($crate::models::choices::UnknownChoice {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let code = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                Ok(code.parse::<$name>()?)
            }
        }

        impl<'q> sqlx::Encode<'q, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> sqlx::encode::IsNull {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
            }
        }
    };
}

pub(crate) use choice_enum;

choice_enum! {
    /// Bank account kind.
    AccountType {
        Checking => ("CC", "Cuenta corriente"),
        Savings => ("CA", "Caja de ahorros"),
    }
}

choice_enum! {
    EventCategory {
        PyDay => ("PD", "PyDay"),
        PyCon => ("PCo", "PyCon"),
        PyCamp => ("PCa", "PyCamp"),
        Conference => ("Con", "Conferencia"),
    }
}

choice_enum! {
    /// Sponsor's VAT (IVA) registration.
    VatCondition {
        RegisteredTaxpayer => ("responsable inscripto", "Responsable Inscripto"),
        Monotributo => ("monotributo", "Monotributo"),
        Foreign => ("exterior", "Exterior"),
        Other => ("otro", "Otro"),
    }
}

choice_enum! {
    /// How an affect changes what is still owed on an invoice.
    AffectCategory {
        Payment => ("Pay", "Pago"),
        Withholding => ("Hold", "Retencion"),
        Other => ("Oth", "Otros"),
    }
}
