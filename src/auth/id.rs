//! Strongly typed identifiers embedded into every minted credential.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (issuer, key).
		kind: &'static str,
	},
	/// The identifier contains whitespace or control characters.
	#[error("{kind} identifier contains whitespace or control characters.")]
	InvalidCharacter {
		/// Kind of identifier (issuer, key).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed byte count.
	#[error("{kind} identifier exceeds {max} bytes.")]
	TooLong {
		/// Kind of identifier (issuer, key).
		kind: &'static str,
		/// Maximum permitted byte count.
		max: usize,
	},
}

def_id! { IssuerId, "Issuer identifier of the team that owns the API key (`iss` claim).", "Issuer" }
def_id! { KeyId, "Identifier of the API key that signs credentials (`kid` header).", "Key" }

/// Issuer/key pair embedded verbatim into every credential minted for one API key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialIdentity {
	/// Value of the `iss` claim.
	pub issuer_id: IssuerId,
	/// Value of the `kid` header.
	pub key_id: KeyId,
}
impl CredentialIdentity {
	/// Pairs an issuer with the key that signs on its behalf.
	pub fn new(issuer_id: IssuerId, key_id: KeyId) -> Self {
		Self { issuer_id, key_id }
	}

	/// Validates raw strings and pairs them.
	pub fn parse(issuer_id: impl AsRef<str>, key_id: impl AsRef<str>) -> Result<Self> {
		Ok(Self::new(IssuerId::new(issuer_id)?, KeyId::new(key_id)?))
	}
}

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(|c| c.is_whitespace() || c.is_control()) {
		return Err(IdentifierError::InvalidCharacter { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::HashMap;
	// self
	use super::*;

	#[test]
	fn identifiers_reject_whitespace_and_empty_values() {
		assert!(IssuerId::new(" 69a6de70").is_err(), "Leading whitespace must be rejected.");
		assert!(IssuerId::new("69a6de70 ").is_err(), "Trailing whitespace must be rejected.");
		assert!(KeyId::new("").is_err());
		assert!(KeyId::new("2X9R\u{0007}4HXF").is_err());

		let key = KeyId::new("2X9R4HXF34").expect("Key fixture should be considered valid.");

		assert_eq!(key.as_ref(), "2X9R4HXF34");
		assert_eq!(format!("{key:?}"), "Key(2X9R4HXF34)");
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let issuer: IssuerId = serde_json::from_str("\"57246542-96fe-1a63-e053-0824d011072a\"")
			.expect("Issuer should deserialize successfully.");

		assert_eq!(issuer.as_ref(), "57246542-96fe-1a63-e053-0824d011072a");
		assert!(serde_json::from_str::<IssuerId>("\"with space\"").is_err());
		assert!(serde_json::from_str::<KeyId>("\"\"").is_err());
	}

	#[test]
	fn length_limit_is_inclusive() {
		let exact = "a".repeat(IDENTIFIER_MAX_LEN);

		KeyId::new(&exact).expect("Exact length should succeed.");

		let too_long = "a".repeat(IDENTIFIER_MAX_LEN + 1);

		assert_eq!(
			KeyId::new(&too_long),
			Err(IdentifierError::TooLong { kind: "Key", max: IDENTIFIER_MAX_LEN })
		);
	}

	#[test]
	fn identity_parse_surfaces_identifier_errors() {
		let identity = CredentialIdentity::parse("issuer-1", "KEY123")
			.expect("Identity fixture should be valid.");
		let map: HashMap<KeyId, CredentialIdentity> =
			HashMap::from_iter([(identity.key_id.clone(), identity)]);

		assert!(map.contains_key("KEY123"));
		assert!(matches!(
			CredentialIdentity::parse("issuer-1", " "),
			Err(Error::Identifier(IdentifierError::InvalidCharacter { kind: "Key" }))
		));
	}
}
