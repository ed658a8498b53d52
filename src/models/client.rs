//! Represents a client record and the attribute whitelist it is built from.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{collections::BTreeMap, fmt};

/// The only attribute names a client may carry.
///
/// Every attribute named in a request body, sort key or filter must map to
/// one of these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Attribute {
    Title,
    Email,
    DateOfBirth,
    Company,
}

impl Attribute {
    pub const ALL: [Attribute; 4] = [
        Attribute::Title,
        Attribute::Email,
        Attribute::DateOfBirth,
        Attribute::Company,
    ];

    /// Public (wire) name of the attribute.
    pub fn name(self) -> &'static str {
        match self {
            Attribute::Title => "title",
            Attribute::Email => "email",
            Attribute::DateOfBirth => "dateOfBirth",
            Attribute::Company => "company",
        }
    }

    /// Column backing the attribute in the `clients` table.
    pub fn column(self) -> &'static str {
        match self {
            Attribute::Title => "title",
            Attribute::Email => "email",
            Attribute::DateOfBirth => "date_of_birth",
            Attribute::Company => "company",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|attr| attr.name() == name)
    }

    /// Whitelist rendered for error messages, e.g. `title|email|dateOfBirth|company`.
    pub fn valid_names() -> String {
        Self::ALL.map(Attribute::name).join("|")
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whitelisted attribute values keyed by attribute.
pub type ClientAttributes = BTreeMap<Attribute, String>;

/// Lightweight reference to a published image, embedded into a client.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ImageRef {
    /// Public path the image is served from (e.g. `/img/clients/abc.png`).
    pub src: String,
    pub mime: Option<String>,
    pub size: i64,
}

/// A stored client.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Opaque identifier assigned by the store on creation.
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
}

impl Client {
    pub fn attribute(&self, attr: Attribute) -> Option<&str> {
        match attr {
            Attribute::Title => self.title.as_deref(),
            Attribute::Email => self.email.as_deref(),
            Attribute::DateOfBirth => self.date_of_birth.as_deref(),
            Attribute::Company => self.company.as_deref(),
        }
    }

    /// All attributes currently set on the client.
    pub fn attributes(&self) -> ClientAttributes {
        Attribute::ALL
            .into_iter()
            .filter_map(|attr| self.attribute(attr).map(|v| (attr, v.to_string())))
            .collect()
    }
}

/// Row shape of the `clients` table.
#[derive(FromRow, Debug)]
pub(crate) struct ClientRow {
    pub id: String,
    pub title: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<String>,
    pub company: Option<String>,
    pub image_src: Option<String>,
    pub image_mime: Option<String>,
    pub image_size: Option<i64>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        let image = row.image_src.map(|src| ImageRef {
            src,
            mime: row.image_mime,
            size: row.image_size.unwrap_or(0),
        });
        Self {
            id: row.id,
            title: row.title,
            email: row.email,
            date_of_birth: row.date_of_birth,
            company: row.company,
            image,
        }
    }
}

/// A client about to be persisted.
///
/// `id == None` inserts a new record; otherwise the supplied attributes (and
/// image, when present) overwrite the stored ones.
#[derive(Clone, Debug, Default)]
pub struct ClientDraft {
    pub id: Option<String>,
    pub attributes: ClientAttributes,
    pub image: Option<ImageRef>,
}

/// A write body after the whitelist check.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClientInput {
    pub attributes: ClientAttributes,
    /// Temporary image to attach, if the body carried `imageId`.
    pub image_id: Option<String>,
}
