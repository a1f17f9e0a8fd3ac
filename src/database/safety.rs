//! Read-only gate applied before a query leaves the client.
//!
//! Plain substring matching on the upper-cased text. It over-rejects
//! (`OFFSET`, a property value containing `set`) and can be bypassed, so it is
//! a convenience guard and not a security boundary.

use super::DatabaseError;

/// Keywords that mark a query as mutating.
pub const MUTATING_KEYWORDS: [&str; 6] = ["DELETE", "DETACH", "CREATE", "MERGE", "SET", "REMOVE"];

/// Returns the first mutating keyword found in `query`, if any.
pub fn mutating_keyword(query: &str) -> Option<&'static str> {
	let normalized = query.trim().to_uppercase();
	MUTATING_KEYWORDS
		.into_iter()
		.find(|keyword| normalized.contains(keyword))
}

/// Rejects `query` when it looks like it would modify the database.
pub fn ensure_read_only(query: &str) -> Result<(), DatabaseError> {
	if query.trim().is_empty() {
		return Err(DatabaseError::QueryRejected("Query is empty".to_string()));
	}
	match mutating_keyword(query) {
		Some(keyword) => Err(DatabaseError::QueryRejected(format!(
			"Only READ queries are allowed (found {keyword})"
		))),
		None => Ok(()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_detach_delete() {
		let err = ensure_read_only("MATCH (n) DETACH DELETE n").unwrap_err();
		assert!(matches!(err, DatabaseError::QueryRejected(_)));
		assert_eq!(err.status(), 400);
	}

	#[test]
	fn accepts_plain_match() {
		assert!(ensure_read_only("MATCH (n) RETURN n LIMIT 5").is_ok());
	}

	#[test]
	fn matching_is_case_insensitive() {
		assert_eq!(mutating_keyword("match (n) set n.x = 1"), Some("SET"));
		let merge = "  merge (a:Account {id: 1})";
		assert_eq!(mutating_keyword(merge), Some("MERGE"));
	}

	#[test]
	fn substring_matching_over_rejects() {
		// "Asset" contains SET.
		assert_eq!(mutating_keyword("MATCH (a:Asset) RETURN a"), Some("SET"));
	}

	#[test]
	fn blank_query_is_rejected() {
		assert!(ensure_read_only("   \n").is_err());
	}
}
