use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(RoleName {
    Admin => "admin",
    Doctor => "doctor",
    Secretary => "secretary",
    Patient => "patient",
    Labo => "labo",
    Pharmacie => "pharmacie",
    Fournisseur => "fournisseur",
});

str_enum!(SecretaryStatus {
    None => "none",
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

str_enum!(AppointmentStatus {
    Pending => "pending",
    Accepted => "accepted",
    Rejected => "rejected",
    Completed => "completed",
});

str_enum!(CaseType {
    Urgent => "urgent",
    Normal => "normal",
    Control => "control",
});

str_enum!(AppointmentType {
    Detartrage => "detartrage",
    Soin => "soin",
    Extraction => "extraction",
    Blanchiment => "blanchiment",
    Orthodontie => "orthodontie",
});

str_enum!(InterventionStatus {
    Planned => "planned",
    InProgress => "in_progress",
    Completed => "completed",
    Canceled => "canceled",
});

str_enum!(NotificationType {
    NewAppointment => "new_appointment",
    AppointmentUpdated => "appointment_updated",
    SecretaryApplication => "secretary_application",
    SecretaryApplicationResponse => "secretary_application_response",
    SecretaryRemoved => "secretary_removed",
});

str_enum!(VerificationStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

str_enum!(DocumentKind {
    Appointment => "appointment",
    Patient => "patient",
});
