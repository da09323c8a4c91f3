//! Closed choice sets used by record fields.

use serde::{Deserialize, Serialize};

macro_rules! choices {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $code)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $code),+
                }
            }

            pub fn parse(input: &str) -> Option<Self> {
                match input {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

choices!(Gender {
    Male => "M",
    Female => "F",
    Other => "O",
});

choices!(MedicationType {
    Pill => "PILL",
    Liquid => "LIQUID",
    Injection => "INJECTION",
    Inhaler => "INHALER",
    Topical => "TOPICAL",
    Other => "OTHER",
});

choices!(
    /// How often a scheduled medication is taken.
    DoseFrequency {
        OnceDaily => "ONCE_DAILY",
        TwiceDaily => "TWICE_DAILY",
        ThreeTimesDaily => "THREE_TIMES_DAILY",
        Weekly => "WEEKLY",
        AsNeeded => "AS_NEEDED",
    }
);

choices!(AppointmentType {
    Checkup => "CHECKUP",
    Specialist => "SPECIALIST",
    Dental => "DENTAL",
    Therapy => "THERAPY",
    Lab => "LAB",
    Other => "OTHER",
});

choices!(TaskType {
    Medication => "MEDICATION",
    Hygiene => "HYGIENE",
    Meal => "MEAL",
    Exercise => "EXERCISE",
    Housekeeping => "HOUSEKEEPING",
    Other => "OTHER",
});

choices!(TaskFrequency {
    Once => "ONCE",
    Daily => "DAILY",
    Weekly => "WEEKLY",
    Monthly => "MONTHLY",
});

choices!(Priority {
    Low => "LOW",
    Medium => "MEDIUM",
    High => "HIGH",
    Urgent => "URGENT",
});

choices!(IncidentType {
    Fall => "FALL",
    Medication => "MEDICATION",
    Behavioral => "BEHAVIORAL",
    Medical => "MEDICAL",
    Other => "OTHER",
});

choices!(Severity {
    Low => "LOW",
    Medium => "MEDIUM",
    High => "HIGH",
    Critical => "CRITICAL",
});

choices!(Relation {
    Spouse => "SPOUSE",
    Child => "CHILD",
    Sibling => "SIBLING",
    Friend => "FRIEND",
    Neighbor => "NEIGHBOR",
    Other => "OTHER",
});

choices!(NotificationType {
    Medication => "MEDICATION",
    Appointment => "APPOINTMENT",
    Task => "TASK",
    Vitals => "VITALS",
    Incident => "INCIDENT",
    General => "GENERAL",
});

choices!(
    /// Sections the search box can be narrowed to.
    SearchCategory {
        All => "all",
        Elders => "elders",
        Medications => "medications",
        Tasks => "tasks",
        Appointments => "appointments",
    }
);

impl Default for SearchCategory {
    fn default() -> Self {
        SearchCategory::All
    }
}
