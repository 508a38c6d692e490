//! Domain tags and the stores that back them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One tag per record category owned by the service.
///
/// Used as the key into the interface registry and as the subject of
/// change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainId {
    Contact,
    SmsMessage,
    SmsThread,
    SmsTemplate,
    Alarms,
    Notes,
    Calllog,
    CountryCodes,
    Notifications,
    Quotes,
}

impl DomainId {
    /// Every domain, in registration order.
    pub const ALL: [Self; 10] = [
        Self::Contact,
        Self::SmsMessage,
        Self::SmsThread,
        Self::SmsTemplate,
        Self::Alarms,
        Self::Notes,
        Self::Calllog,
        Self::CountryCodes,
        Self::Notifications,
        Self::Quotes,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::SmsMessage => "sms_message",
            Self::SmsThread => "sms_thread",
            Self::SmsTemplate => "sms_template",
            Self::Alarms => "alarms",
            Self::Notes => "notes",
            Self::Calllog => "calllog",
            Self::CountryCodes => "country_codes",
            Self::Notifications => "notifications",
            Self::Quotes => "quotes",
        }
    }

    /// The store whose file holds this domain's records.
    #[must_use]
    pub const fn store(self) -> StoreKind {
        match self {
            Self::Contact => StoreKind::Contacts,
            Self::SmsMessage | Self::SmsThread | Self::SmsTemplate => StoreKind::Sms,
            Self::Alarms => StoreKind::Alarms,
            Self::Notes => StoreKind::Notes,
            Self::Calllog => StoreKind::Calllog,
            Self::CountryCodes => StoreKind::CountryCodes,
            Self::Notifications => StoreKind::Notifications,
            Self::Quotes => StoreKind::Quotes,
        }
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A durable record store; several domains may share one (SMS).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    Contacts,
    Sms,
    Alarms,
    Notes,
    Calllog,
    CountryCodes,
    Notifications,
    Quotes,
}

impl StoreKind {
    /// Order in which stores are opened at startup.
    pub const OPEN_ORDER: [Self; 8] = [
        Self::Contacts,
        Self::Sms,
        Self::Alarms,
        Self::Notes,
        Self::Calllog,
        Self::CountryCodes,
        Self::Notifications,
        Self::Quotes,
    ];

    /// Order in which stores are snapshotted by a backup. Country codes are a
    /// read-only asset and notifications are transient counters, so neither
    /// is part of a backup.
    pub const BACKUP_ORDER: [Self; 6] = [
        Self::Contacts,
        Self::Sms,
        Self::Alarms,
        Self::Notes,
        Self::Calllog,
        Self::Quotes,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Contacts => "contacts",
            Self::Sms => "sms",
            Self::Alarms => "alarms",
            Self::Notes => "notes",
            Self::Calllog => "calllog",
            Self::CountryCodes => "country_codes",
            Self::Notifications => "notifications",
            Self::Quotes => "quotes",
        }
    }

    /// Fixed file name of the store's backing file.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Contacts => "contacts.db",
            Self::Sms => "sms.db",
            Self::Alarms => "alarms.db",
            Self::Notes => "notes.db",
            Self::Calllog => "calllog.db",
            Self::CountryCodes => "country-codes.db",
            Self::Notifications => "notifications.db",
            Self::Quotes => "quotes.db",
        }
    }

    /// Whether the store lives in the read-only assets directory rather than
    /// the user-data directory.
    #[must_use]
    pub const fn is_asset(self) -> bool {
        matches!(self, Self::CountryCodes)
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn should_list_every_domain_once() {
        let unique: HashSet<DomainId> = DomainId::ALL.into_iter().collect();
        assert_eq!(unique.len(), DomainId::ALL.len());
    }

    #[test]
    fn should_map_all_sms_domains_to_sms_store() {
        assert_eq!(DomainId::SmsMessage.store(), StoreKind::Sms);
        assert_eq!(DomainId::SmsThread.store(), StoreKind::Sms);
        assert_eq!(DomainId::SmsTemplate.store(), StoreKind::Sms);
    }

    #[test]
    fn should_back_up_a_subset_of_opened_stores() {
        for kind in StoreKind::BACKUP_ORDER {
            assert!(StoreKind::OPEN_ORDER.contains(&kind));
        }
        assert!(!StoreKind::BACKUP_ORDER.contains(&StoreKind::CountryCodes));
    }

    #[test]
    fn should_keep_only_country_codes_in_assets() {
        let assets: Vec<StoreKind> = StoreKind::OPEN_ORDER
            .into_iter()
            .filter(|kind| kind.is_asset())
            .collect();
        assert_eq!(assets, vec![StoreKind::CountryCodes]);
    }

    #[test]
    fn should_serialize_as_snake_case() {
        let json = serde_json::to_string(&DomainId::SmsThread).unwrap();
        assert_eq!(json, "\"sms_thread\"");
    }
}
