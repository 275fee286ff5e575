//! Contact directory with E.164 phone number normalization.
//!
//! The directory is loaded once at startup and read-only afterwards, so
//! request handlers share it by cheap clone. Lookups normalize their
//! input the same way configuration entries are normalized, which means
//! a number submitted with spacing or a `00` prefix still resolves to
//! the same contact.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors from E.164 parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PhoneError {
    #[error("empty phone number")]
    Empty,
    #[error("unexpected character {0:?} in phone number")]
    InvalidCharacter(char),
    #[error("number must start with '+' or '00'")]
    MissingPrefix,
    #[error("country code cannot start with zero")]
    LeadingZero,
    #[error("{0} digits is outside the E.164 range")]
    BadLength(usize),
}

/// A phone number normalized to E.164: `+` followed by 8-15 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse and normalize a phone number.
    ///
    /// Accepts the separators people paste into configuration (spaces,
    /// dashes, dots, parentheses) and the `00` international prefix in
    /// place of `+`.
    pub fn parse(raw: &str) -> Result<Self, PhoneError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PhoneError::Empty);
        }

        let (explicit_plus, rest) = match trimmed.strip_prefix('+') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let mut digits = String::with_capacity(rest.len());
        for ch in rest.chars() {
            match ch {
                '0'..='9' => digits.push(ch),
                ' ' | '-' | '.' | '(' | ')' => {}
                other => return Err(PhoneError::InvalidCharacter(other)),
            }
        }

        if !explicit_plus {
            match digits.strip_prefix("00") {
                Some(stripped) => digits = stripped.to_string(),
                None => return Err(PhoneError::MissingPrefix),
            }
        }

        if digits.is_empty() {
            return Err(PhoneError::Empty);
        }
        if digits.starts_with('0') {
            return Err(PhoneError::LeadingZero);
        }
        if !(8..=15).contains(&digits.len()) {
            return Err(PhoneError::BadLength(digits.len()));
        }

        Ok(Self(format!("+{}", digits)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for PhoneNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PhoneNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        PhoneNumber::parse(&raw).map_err(D::Error::custom)
    }
}

/// What a directory entry is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Greeted by name when they text the service.
    Sender,
    /// Receives the broadcast fan-out for every inbound message.
    Volunteer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub phone: PhoneNumber,
    pub display_name: String,
    pub roles: Vec<Role>,
}

impl Contact {
    pub fn new(phone: PhoneNumber, display_name: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            phone,
            display_name: display_name.into(),
            roles,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Read-only directory of known contacts.
///
/// Backed by `Arc`s so handlers can clone it freely. Role listings keep
/// the order contacts were supplied in; the lookup index is keyed by
/// normalized number, with later entries shadowing earlier duplicates.
#[derive(Debug, Default, Clone)]
pub struct Directory {
    contacts: Arc<Vec<Contact>>,
    index: Arc<HashMap<String, usize>>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion, mainly for tests and static setups.
    pub fn with(self, contact: Contact) -> Self {
        let mut contacts = (*self.contacts).clone();
        contacts.push(contact);
        Self::from_contacts(contacts)
    }

    pub fn from_contacts(contacts: Vec<Contact>) -> Self {
        let mut index = HashMap::with_capacity(contacts.len());
        for (i, contact) in contacts.iter().enumerate() {
            index.insert(contact.phone.as_str().to_string(), i);
        }
        Self {
            contacts: Arc::new(contacts),
            index: Arc::new(index),
        }
    }

    /// Find a contact by phone number in any accepted formatting.
    ///
    /// Input that does not parse as E.164 is a miss, never an error.
    pub fn lookup(&self, raw: &str) -> Option<&Contact> {
        let phone = PhoneNumber::parse(raw).ok()?;
        self.index.get(phone.as_str()).map(|&i| &self.contacts[i])
    }

    /// Contacts holding `role`, in configuration order.
    pub fn list_by_role(&self, role: Role) -> impl Iterator<Item = &Contact> {
        self.contacts.iter().filter(move |c| c.has_role(role))
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone(raw: &str) -> PhoneNumber {
        PhoneNumber::parse(raw).unwrap()
    }

    #[test]
    fn parse_normalizes_separators() {
        for raw in [
            "+447551524625",
            "+44 7551 524625",
            "+44-7551-524-625",
            "+44 (7551) 524.625",
            "  +447551524625  ",
            "00447551524625",
            "00 44 7551 524625",
        ] {
            assert_eq!(phone(raw).as_str(), "+447551524625", "input: {:?}", raw);
        }
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(PhoneNumber::parse(""), Err(PhoneError::Empty));
        assert_eq!(PhoneNumber::parse("   "), Err(PhoneError::Empty));
        assert_eq!(PhoneNumber::parse("+"), Err(PhoneError::Empty));
        assert_eq!(
            PhoneNumber::parse("7551524625"),
            Err(PhoneError::MissingPrefix)
        );
        assert_eq!(
            PhoneNumber::parse("+44x7551524625"),
            Err(PhoneError::InvalidCharacter('x'))
        );
        assert_eq!(PhoneNumber::parse("+07551524625"), Err(PhoneError::LeadingZero));
        assert_eq!(PhoneNumber::parse("+1234567"), Err(PhoneError::BadLength(7)));
        assert_eq!(
            PhoneNumber::parse("+1234567890123456"),
            Err(PhoneError::BadLength(16))
        );
    }

    #[test]
    fn deserializes_through_parser() {
        let ok: PhoneNumber = serde_json::from_str(r#""+44 7551 524625""#).unwrap();
        assert_eq!(ok.as_str(), "+447551524625");
        assert!(serde_json::from_str::<PhoneNumber>(r#""not a number""#).is_err());
    }

    #[test]
    fn lookup_normalizes_input() {
        let dir = Directory::new().with(Contact::new(
            phone("+447551524625"),
            "Eduardito",
            vec![Role::Sender],
        ));

        for raw in ["+447551524625", "+44 7551 524625", "00447551524625"] {
            let found = dir.lookup(raw).expect(raw);
            assert_eq!(found.display_name, "Eduardito");
        }
        assert!(dir.lookup("+15550000000").is_none());
        assert!(dir.lookup("garbage").is_none());
    }

    #[test]
    fn lookup_is_idempotent() {
        let dir = Directory::new().with(Contact::new(
            phone("+447551524625"),
            "Eduardito",
            vec![Role::Sender],
        ));
        let first = dir.lookup("+447551524625").unwrap().phone.clone();
        let second = dir.lookup("+447551524625").unwrap().phone.clone();
        assert_eq!(first, second);
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn list_by_role_keeps_configuration_order() {
        let dir = Directory::from_contacts(vec![
            Contact::new(phone("+15550000001"), "Ana", vec![Role::Volunteer]),
            Contact::new(phone("+15550000002"), "Bea", vec![Role::Sender]),
            Contact::new(
                phone("+15550000003"),
                "Cruz",
                vec![Role::Sender, Role::Volunteer],
            ),
        ]);

        let volunteers: Vec<&str> = dir
            .list_by_role(Role::Volunteer)
            .map(|c| c.display_name.as_str())
            .collect();
        assert_eq!(volunteers, vec!["Ana", "Cruz"]);

        let senders: Vec<&str> = dir
            .list_by_role(Role::Sender)
            .map(|c| c.display_name.as_str())
            .collect();
        assert_eq!(senders, vec!["Bea", "Cruz"]);
    }

    #[test]
    fn later_duplicate_wins_lookup() {
        let dir = Directory::from_contacts(vec![
            Contact::new(phone("+15550000001"), "Old", vec![Role::Sender]),
            Contact::new(phone("+1 555 000 0001"), "New", vec![Role::Sender]),
        ]);
        assert_eq!(dir.lookup("+15550000001").unwrap().display_name, "New");
        // both entries still show up in role listings
        assert_eq!(dir.list_by_role(Role::Sender).count(), 2);
    }

    #[test]
    fn empty_directory_is_valid() {
        let dir = Directory::new();
        assert!(dir.is_empty());
        assert!(dir.lookup("+447551524625").is_none());
        assert_eq!(dir.list_by_role(Role::Volunteer).count(), 0);
    }
}
