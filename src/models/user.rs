//! User model for storage and views.
//!
//! Records in the `users` collection are loosely typed. [`UserDoc`] mirrors
//! the stored shape with every field optional, and [`UserDoc::into_user`] is
//! the single place where a record is validated into a [`User`].

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque account identifier assigned by the identity provider.
///
/// Also used as the document ID in the `users` collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Account role. Anything other than `"admin"` is a plain user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    fn from_stored(raw: Option<&str>) -> Self {
        match raw {
            Some("admin") => Role::Admin,
            _ => Role::User,
        }
    }
}

/// Validated user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    /// Point balance; non-negative by convention only
    pub points: i64,
    /// Redeemed badge names in redemption order (duplicates allowed)
    pub badges: Vec<String>,
    pub role: Role,
}

impl User {
    /// Fresh record written at sign-up.
    pub fn new_account(id: UserId, email: impl Into<String>, initial_points: i64) -> Self {
        Self {
            id,
            email: email.into(),
            points: initial_points,
            badges: Vec::new(),
            role: Role::User,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Why a stored record could not be turned into a [`User`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("record {0} has no document id")]
    MissingId(String),
    #[error("record {0} has no email")]
    MissingEmail(UserId),
}

/// Stored shape of a `users` document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserDoc {
    /// Populated by Firestore on reads; never written as a field
    #[serde(alias = "_firestore_id", default, skip_serializing)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub points: Option<i64>,
    #[serde(
        default,
        deserialize_with = "lenient_badges",
        skip_serializing_if = "Option::is_none"
    )]
    pub badges: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// A stored value that may not have the expected type.
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose<T> {
    Typed(T),
    Other(IgnoredAny),
}

/// Read an optional field, treating a value of the wrong type as absent.
///
/// Records are edited by hand in the console, so `points: 12.5` or
/// `role: 5` must normalise like a missing field instead of failing the
/// whole document.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<Loose<T>>::deserialize(deserializer)? {
        Some(Loose::Typed(value)) => Some(value),
        Some(Loose::Other(_)) | None => None,
    })
}

/// Badge list where non-string entries are dropped.
fn lenient_badges<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries: Option<Vec<Loose<String>>> = lenient(deserializer)?;
    Ok(entries.map(|entries| {
        entries
            .into_iter()
            .filter_map(|entry| match entry {
                Loose::Typed(name) => Some(name),
                Loose::Other(_) => None,
            })
            .collect()
    }))
}

impl UserDoc {
    /// Validate and normalise a stored record.
    ///
    /// `fallback_id` is used when the document itself carries no id
    /// (point reads by id). Missing points/badges default to empty and an
    /// unknown role becomes [`Role::User`]; a missing email rejects the record.
    pub fn into_user(self, fallback_id: Option<&UserId>) -> Result<User, RecordError> {
        let id = match (self.id, fallback_id) {
            (Some(id), _) => UserId::new(id),
            (None, Some(id)) => id.clone(),
            (None, None) => {
                return Err(RecordError::MissingId(
                    self.email.unwrap_or_else(|| "<unknown>".to_string()),
                ))
            }
        };

        let email = match self.email {
            Some(email) if !email.trim().is_empty() => email,
            _ => return Err(RecordError::MissingEmail(id)),
        };

        Ok(User {
            id,
            email,
            points: self.points.unwrap_or(0),
            badges: self.badges.unwrap_or_default(),
            role: Role::from_stored(self.role.as_deref()),
        })
    }
}

impl From<&User> for UserDoc {
    fn from(user: &User) -> Self {
        Self {
            id: None,
            email: Some(user.email.clone()),
            points: Some(user.points),
            badges: Some(user.badges.clone()),
            role: Some(user.role.as_str().to_string()),
        }
    }
}

/// Partial update of a user record. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badges: Option<Vec<String>>,
}

impl UserPatch {
    pub fn points(points: i64) -> Self {
        Self {
            points: Some(points),
            ..Self::default()
        }
    }

    /// Field mask for a partial write.
    pub fn field_paths(&self) -> Vec<&'static str> {
        let mut paths = Vec::new();
        if self.points.is_some() {
            paths.push("points");
        }
        if self.badges.is_some() {
            paths.push("badges");
        }
        paths
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_none() && self.badges.is_none()
    }

    /// Apply to an in-memory record.
    pub fn apply(&self, user: &mut User) {
        if let Some(points) = self.points {
            user.points = points;
        }
        if let Some(badges) = &self.badges {
            user.badges = badges.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_are_normalised() {
        let doc: UserDoc = serde_json::from_str(r#"{"email": "a@b.c"}"#).unwrap();
        let user = doc.into_user(Some(&UserId::from("u1"))).unwrap();

        assert_eq!(user.id.as_str(), "u1");
        assert_eq!(user.points, 0);
        assert!(user.badges.is_empty());
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn test_unknown_role_is_plain_user() {
        let doc: UserDoc =
            serde_json::from_str(r#"{"email": "a@b.c", "points": 3, "role": "owner"}"#).unwrap();
        assert_eq!(doc.into_user(Some(&"x".into())).unwrap().role, Role::User);

        let doc: UserDoc = serde_json::from_str(r#"{"email": "a@b.c", "role": "admin"}"#).unwrap();
        assert!(doc.into_user(Some(&"x".into())).unwrap().is_admin());
    }

    #[test]
    fn test_wrong_typed_fields_are_normalised() {
        let doc: UserDoc =
            serde_json::from_str(r#"{"email": "a@b.c", "points": 12.5, "role": 5}"#).unwrap();
        let user = doc.into_user(Some(&"x".into())).unwrap();
        assert_eq!(user.points, 0);
        assert_eq!(user.role, Role::User);

        let doc: UserDoc =
            serde_json::from_str(r#"{"email": "a@b.c", "points": "lots", "badges": "Rank"}"#)
                .unwrap();
        let user = doc.into_user(Some(&"x".into())).unwrap();
        assert_eq!(user.points, 0);
        assert!(user.badges.is_empty());

        let doc: UserDoc =
            serde_json::from_str(r#"{"email": "a@b.c", "badges": ["Rank", 7, null, "Merch Item #1"]}"#)
                .unwrap();
        let user = doc.into_user(Some(&"x".into())).unwrap();
        assert_eq!(user.badges, vec!["Rank".to_string(), "Merch Item #1".to_string()]);
    }

    #[test]
    fn test_wrong_typed_email_rejected() {
        let doc: UserDoc = serde_json::from_str(r#"{"email": 42, "points": 3}"#).unwrap();
        assert_eq!(
            doc.into_user(Some(&"num".into())),
            Err(RecordError::MissingEmail("num".into()))
        );
    }

    #[test]
    fn test_missing_email_rejected() {
        let doc: UserDoc = serde_json::from_str(r#"{"points": 50}"#).unwrap();
        assert_eq!(
            doc.into_user(Some(&"ghost".into())),
            Err(RecordError::MissingEmail("ghost".into()))
        );

        let doc: UserDoc = serde_json::from_str(r#"{"email": "  "}"#).unwrap();
        assert!(doc.into_user(Some(&"blank".into())).is_err());
    }

    #[test]
    fn test_document_id_wins_over_fallback() {
        let doc: UserDoc =
            serde_json::from_str(r#"{"_firestore_id": "doc-id", "email": "a@b.c"}"#).unwrap();
        let user = doc.into_user(Some(&"other".into())).unwrap();
        assert_eq!(user.id.as_str(), "doc-id");
    }

    #[test]
    fn test_doc_serialization_omits_id() {
        let user = User::new_account("u1".into(), "a@b.c", 10);
        let json = serde_json::to_value(UserDoc::from(&user)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"email": "a@b.c", "points": 10, "badges": [], "role": "user"})
        );
    }

    #[test]
    fn test_patch_field_paths() {
        assert_eq!(UserPatch::points(5).field_paths(), vec!["points"]);
        let patch = UserPatch {
            points: Some(1),
            badges: Some(vec!["Rank".to_string()]),
        };
        assert_eq!(patch.field_paths(), vec!["points", "badges"]);
        assert!(UserPatch::default().is_empty());

        let read_back: UserPatch =
            serde_json::from_value(serde_json::to_value(&patch).unwrap()).unwrap();
        assert_eq!(read_back, patch);
    }
}
