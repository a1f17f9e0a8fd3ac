use thiserror::Error;

/// Failures reported by the database collaborator.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DatabaseError {
	/// Bad credentials or unreachable database.
	#[error("{0}")]
	Connection(String),

	/// Rejected before execution: read-only gate or malformed input.
	#[error("{0}")]
	QueryRejected(String),

	/// Database-side failure while running a permitted query.
	#[error("{0}")]
	Execution(String),
}

impl DatabaseError {
	/// HTTP-style status class for the failure.
	pub fn status(&self) -> u16 {
		match self {
			DatabaseError::QueryRejected(_) => 400,
			DatabaseError::Connection(_) | DatabaseError::Execution(_) => 500,
		}
	}
}
