//! Stateless helpers shared across the crate
//!
//! Id generation, input validation predicates, ticket number formatting,
//! and the generic JSON read/write primitives the persistence layer sits on.

use crate::store::error::StoreResult;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

/// Generate a unique entity id
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a ticket number: fixed prefix + 6-digit zero-padded random suffix
///
/// Collisions are astronomically unlikely and not checked.
pub fn ticket_number(prefix: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{}{:06}", prefix, suffix)
}

/// Build the opaque QR-code reference for a ticket number
///
/// This is a deterministic token, not a live external resource.
pub fn qr_code_url(ticket_number: &str) -> String {
    format!("qr://verify/{}", ticket_number)
}

/// Check that an email looks like `local@domain.tld`
///
/// Mirrors the permissive shape check used at signup: non-empty local part,
/// exactly one `@`, and a dot with text on both sides in the domain.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((name, tld)) => !name.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Check that a phone number contains only digits, spaces, dashes,
/// parentheses, and an optional leading `+`
pub fn is_valid_phone(phone: &str) -> bool {
    let trimmed = phone.strip_prefix('+').unwrap_or(phone);
    !trimmed.is_empty()
        && trimmed.chars().any(|c| c.is_ascii_digit())
        && trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')'))
}

/// Read a JSON value from a file, returning `None` if the file does not exist
pub fn load_json<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let value = serde_json::from_str(&content)?;
    Ok(Some(value))
}

/// Write a JSON value to a file, creating parent directories as needed
pub fn store_json<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_ticket_number_format() {
        let number = ticket_number("SMH-");
        assert!(number.starts_with("SMH-"));
        let suffix = &number["SMH-".len()..];
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_qr_code_url() {
        assert_eq!(qr_code_url("SMH-000042"), "qr://verify/SMH-000042");
    }

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("user.name@sante.sn"));

        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("a@nodot"));
        assert!(!is_valid_email("a@.com"));
        assert!(!is_valid_email("a @b.com"));
        assert!(!is_valid_email("@b.com"));
    }

    #[test]
    fn test_valid_phones() {
        assert!(is_valid_phone("+221 33 839 50 50"));
        assert!(is_valid_phone("771234567"));
        assert!(is_valid_phone("(77) 123-45-67"));

        assert!(!is_valid_phone(""));
        assert!(!is_valid_phone("+"));
        assert!(!is_valid_phone("call me"));
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("value.json");

        let missing: Option<Vec<u32>> = load_json(&path).unwrap();
        assert!(missing.is_none());

        store_json(&path, &vec![1u32, 2, 3]).unwrap();
        let restored: Option<Vec<u32>> = load_json(&path).unwrap();
        assert_eq!(restored, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_load_json_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();

        let result: StoreResult<Option<Vec<u32>>> = load_json(&path);
        assert!(result.is_err());
    }
}
