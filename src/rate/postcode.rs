//! Normalized postcode text used as the region lookup key.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::{_prelude::*, rate::IdentifierError};

/// Trimmed, uppercased postcode.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Postcode(String);
impl Postcode {
	/// Normalizes raw user input; returns `None` when nothing remains after trimming.
	pub fn parse(raw: impl AsRef<str>) -> Option<Self> {
		let normalized = raw.as_ref().trim().to_uppercase();

		if normalized.is_empty() { None } else { Some(Self(normalized)) }
	}
}
impl TryFrom<String> for Postcode {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::parse(value).ok_or(IdentifierError::Empty { kind: "Postcode" })
	}
}
impl From<Postcode> for String {
	fn from(value: Postcode) -> Self {
		value.0
	}
}
impl Deref for Postcode {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for Postcode {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for Postcode {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl Debug for Postcode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Postcode({})", self.0)
	}
}
impl Display for Postcode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn parse_trims_and_uppercases() {
		let postcode = Postcode::parse("  sw1a 1aa ").expect("Postcode fixture should normalize.");

		assert_eq!(postcode.as_ref(), "SW1A 1AA");
		assert_eq!(Postcode::parse("SW1A 1AA"), Some(postcode));
		assert!(Postcode::parse("   ").is_none());
	}

	#[test]
	fn deserialization_normalizes_and_rejects_blank_text() {
		let postcode: Postcode =
			serde_json::from_str("\" sw1a 1aa\"").expect("Lowercase postcodes should load.");

		assert_eq!(postcode.as_ref(), "SW1A 1AA");
		assert!(serde_json::from_str::<Postcode>("\"  \"").is_err());

		let regions: BTreeMap<Postcode, String> = serde_json::from_str(r#"{"sw1a 1aa":"C"}"#)
			.expect("Persisted region tables should load.");

		assert_eq!(regions.get("SW1A 1AA").map(String::as_str), Some("C"));
	}
}
