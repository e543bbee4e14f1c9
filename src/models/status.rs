// Status vocabularies stored as TEXT columns.

macro_rules! text_status {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn parse(input: &str) -> Option<Self> {
                match input.trim() {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_status! {
    pub enum CheckInStatus {
        NotCheckedIn => "not-checked-in",
        CheckedIn => "checked-in",
    }
}

text_status! {
    /// Directory status of a delegate, independent from check-in.
    pub enum DelegateStatus {
        Active => "active",
        Inactive => "inactive",
        Pending => "pending",
    }
}

text_status! {
    pub enum ConferenceStatus {
        Upcoming => "upcoming",
        Ongoing => "ongoing",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

text_status! {
    pub enum RegistrationStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
        Cancelled => "cancelled",
    }
}

text_status! {
    pub enum PaymentStatus {
        Unpaid => "unpaid",
        Paid => "paid",
        Refunded => "refunded",
    }
}

text_status! {
    pub enum PaymentMethod {
        CreditCard => "credit_card",
        Invoice => "invoice",
        BankTransfer => "bank_transfer",
    }
}

impl PaymentMethod {
    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "Credit card",
            PaymentMethod::Invoice => "Invoice",
            PaymentMethod::BankTransfer => "Bank transfer",
        }
    }
}
