//! Generic query protocol: one-shot requests for operations that do not
//! warrant a dedicated message type.
//!
//! A [`Query`] names its target domain through its outer variant and its
//! operation tag through [`Query::kind`]. The dispatcher only resolves the
//! domain and forwards the query by value; each record interface matches the
//! variants it serves. Adding a new query kind means adding a variant here
//! and a branch in the matching interface, nothing else.

use serde::{Deserialize, Serialize};

use crate::alarm::AlarmRecord;
use crate::calllog::CalllogRecord;
use crate::contact::ContactRecord;
use crate::country_code::CountryCodeRecord;
use crate::domain_id::DomainId;
use crate::id::RecordId;
use crate::note::NoteRecord;
use crate::notification::OperationKind;
use crate::notifications::{NotificationKey, NotificationRecord};
use crate::quote::QuoteRecord;
use crate::sms::{SmsRecord, SmsTemplateRecord, ThreadRecord};

/// A page of results: skip `offset` rows, return at most `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub offset: u32,
    pub limit: u32,
}

impl Page {
    #[must_use]
    pub const fn new(offset: u32, limit: u32) -> Self {
        Self { offset, limit }
    }

    /// Every row.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            offset: 0,
            limit: u32::MAX,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContactQuery {
    List(Page),
    Count,
    /// Case-insensitive substring search over names and numbers.
    Search(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SmsQuery {
    /// Store a message, creating or updating its thread.
    Add(SmsRecord),
    GetByThread { thread_id: RecordId, page: Page },
    Remove(RecordId),
    Count,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ThreadQuery {
    List(Page),
    GetByNumber(String),
    MarkAsRead { id: RecordId, read: bool },
    /// Remove a thread together with its messages.
    Remove(RecordId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SmsTemplateQuery {
    Add(SmsTemplateRecord),
    Update(SmsTemplateRecord),
    Remove(RecordId),
    List,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AlarmQuery {
    Add(AlarmRecord),
    Update(AlarmRecord),
    Remove(RecordId),
    List,
    TurnOffAll,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NoteQuery {
    Add(NoteRecord),
    Update(NoteRecord),
    Remove(RecordId),
    List(Page),
    Search(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CalllogQuery {
    List(Page),
    Count,
    SetAllRead,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CountryCodeQuery {
    ByMcc(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NotificationsQuery {
    Get(NotificationKey),
    List,
    /// Bump a counter; `number` names the peer that caused it, if any.
    Increment {
        key: NotificationKey,
        number: Option<String>,
    },
    Clear(NotificationKey),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QuoteQuery {
    Add(QuoteRecord),
    Get(RecordId),
    List(Page),
    Remove(RecordId),
}

/// A consume-once request for one domain's record interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Query {
    Contact(ContactQuery),
    Sms(SmsQuery),
    Thread(ThreadQuery),
    SmsTemplate(SmsTemplateQuery),
    Alarm(AlarmQuery),
    Note(NoteQuery),
    Calllog(CalllogQuery),
    CountryCode(CountryCodeQuery),
    Notifications(NotificationsQuery),
    Quote(QuoteQuery),
}

impl Query {
    /// Domain whose interface executes the query.
    #[must_use]
    pub const fn domain(&self) -> DomainId {
        match self {
            Self::Contact(_) => DomainId::Contact,
            Self::Sms(_) => DomainId::SmsMessage,
            Self::Thread(_) => DomainId::SmsThread,
            Self::SmsTemplate(_) => DomainId::SmsTemplate,
            Self::Alarm(_) => DomainId::Alarms,
            Self::Note(_) => DomainId::Notes,
            Self::Calllog(_) => DomainId::Calllog,
            Self::CountryCode(_) => DomainId::CountryCodes,
            Self::Notifications(_) => DomainId::Notifications,
            Self::Quote(_) => DomainId::Quotes,
        }
    }

    /// Operation tag, used to correlate results and to notify subscribers.
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        use OperationKind::{Create, Delete, Read, Update};

        match self {
            Self::Contact(_)
            | Self::Calllog(CalllogQuery::List(_) | CalllogQuery::Count)
            | Self::CountryCode(_)
            | Self::Sms(SmsQuery::GetByThread { .. } | SmsQuery::Count)
            | Self::Thread(ThreadQuery::List(_) | ThreadQuery::GetByNumber(_))
            | Self::SmsTemplate(SmsTemplateQuery::List)
            | Self::Alarm(AlarmQuery::List)
            | Self::Note(NoteQuery::List(_) | NoteQuery::Search(_))
            | Self::Notifications(NotificationsQuery::Get(_) | NotificationsQuery::List)
            | Self::Quote(QuoteQuery::Get(_) | QuoteQuery::List(_)) => Read,

            Self::Sms(SmsQuery::Add(_))
            | Self::SmsTemplate(SmsTemplateQuery::Add(_))
            | Self::Alarm(AlarmQuery::Add(_))
            | Self::Note(NoteQuery::Add(_))
            | Self::Quote(QuoteQuery::Add(_)) => Create,

            Self::Thread(ThreadQuery::MarkAsRead { .. })
            | Self::SmsTemplate(SmsTemplateQuery::Update(_))
            | Self::Alarm(AlarmQuery::Update(_) | AlarmQuery::TurnOffAll)
            | Self::Note(NoteQuery::Update(_))
            | Self::Calllog(CalllogQuery::SetAllRead)
            | Self::Notifications(
                NotificationsQuery::Increment { .. } | NotificationsQuery::Clear(_),
            ) => Update,

            Self::Sms(SmsQuery::Remove(_))
            | Self::Thread(ThreadQuery::Remove(_))
            | Self::SmsTemplate(SmsTemplateQuery::Remove(_))
            | Self::Alarm(AlarmQuery::Remove(_))
            | Self::Note(NoteQuery::Remove(_))
            | Self::Quote(QuoteQuery::Remove(_)) => Delete,
        }
    }

    /// Name of the query variant, for logs and errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Contact(q) => match q {
                ContactQuery::List(_) => "ContactList",
                ContactQuery::Count => "ContactCount",
                ContactQuery::Search(_) => "ContactSearch",
            },
            Self::Sms(q) => match q {
                SmsQuery::Add(_) => "SmsAdd",
                SmsQuery::GetByThread { .. } => "SmsGetByThread",
                SmsQuery::Remove(_) => "SmsRemove",
                SmsQuery::Count => "SmsCount",
            },
            Self::Thread(q) => match q {
                ThreadQuery::List(_) => "ThreadList",
                ThreadQuery::GetByNumber(_) => "ThreadGetByNumber",
                ThreadQuery::MarkAsRead { .. } => "ThreadMarkAsRead",
                ThreadQuery::Remove(_) => "ThreadRemove",
            },
            Self::SmsTemplate(q) => match q {
                SmsTemplateQuery::Add(_) => "SmsTemplateAdd",
                SmsTemplateQuery::Update(_) => "SmsTemplateUpdate",
                SmsTemplateQuery::Remove(_) => "SmsTemplateRemove",
                SmsTemplateQuery::List => "SmsTemplateList",
            },
            Self::Alarm(q) => match q {
                AlarmQuery::Add(_) => "AlarmAdd",
                AlarmQuery::Update(_) => "AlarmUpdate",
                AlarmQuery::Remove(_) => "AlarmRemove",
                AlarmQuery::List => "AlarmList",
                AlarmQuery::TurnOffAll => "AlarmTurnOffAll",
            },
            Self::Note(q) => match q {
                NoteQuery::Add(_) => "NoteAdd",
                NoteQuery::Update(_) => "NoteUpdate",
                NoteQuery::Remove(_) => "NoteRemove",
                NoteQuery::List(_) => "NoteList",
                NoteQuery::Search(_) => "NoteSearch",
            },
            Self::Calllog(q) => match q {
                CalllogQuery::List(_) => "CalllogList",
                CalllogQuery::Count => "CalllogCount",
                CalllogQuery::SetAllRead => "CalllogSetAllRead",
            },
            Self::CountryCode(CountryCodeQuery::ByMcc(_)) => "CountryCodeByMcc",
            Self::Notifications(q) => match q {
                NotificationsQuery::Get(_) => "NotificationsGet",
                NotificationsQuery::List => "NotificationsList",
                NotificationsQuery::Increment { .. } => "NotificationsIncrement",
                NotificationsQuery::Clear(_) => "NotificationsClear",
            },
            Self::Quote(q) => match q {
                QuoteQuery::Add(_) => "QuoteAdd",
                QuoteQuery::Get(_) => "QuoteGet",
                QuoteQuery::List(_) => "QuoteList",
                QuoteQuery::Remove(_) => "QuoteRemove",
            },
        }
    }
}

/// Outcome of executing a [`Query`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryResult {
    Contacts(Vec<ContactRecord>),
    Sms(Vec<SmsRecord>),
    Threads(Vec<ThreadRecord>),
    Thread(Option<ThreadRecord>),
    SmsTemplates(Vec<SmsTemplateRecord>),
    Alarms(Vec<AlarmRecord>),
    Notes(Vec<NoteRecord>),
    Calls(Vec<CalllogRecord>),
    CountryCode(Option<CountryCodeRecord>),
    Notifications(Vec<NotificationRecord>),
    Notification(Option<NotificationRecord>),
    Quotes(Vec<QuoteRecord>),
    Quote(Option<QuoteRecord>),
    /// Identity assigned by an add.
    Id(RecordId),
    Count(u32),
    /// Whether a mutation affected anything.
    Done(bool),
}
