//! Strongly typed identifiers for tariffs and provider regions.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty or whitespace.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (tariff, region).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (tariff, region).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (tariff, region).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
	/// Tariff codes must end with a `-X` region segment.
	#[error("Tariff identifier `{value}` does not end with a single-letter region segment.")]
	MissingRegion {
		/// Rejected identifier.
		value: String,
	},
	/// Region codes are a single uppercase ASCII letter.
	#[error("Region identifier `{value}` is not a single uppercase letter.")]
	InvalidRegion {
		/// Rejected identifier.
		value: String,
	},
}

/// Identifier for a priced product/plan whose rates are tracked, e.g. `E-1R-AGILE-24-10-01-C`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TariffCode(String);
impl TariffCode {
	/// Creates a new tariff code after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		validate_tariff(view)?;

		Ok(Self(view.to_owned()))
	}

	/// Region letter encoded in the final segment of the code.
	pub fn region(&self) -> RegionCode {
		// Validated on construction.
		let letter = self.0.rsplit('-').next().unwrap_or_default();

		RegionCode(letter.to_owned())
	}
}
impl Deref for TariffCode {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for TariffCode {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<TariffCode> for String {
	fn from(value: TariffCode) -> Self {
		value.0
	}
}
impl TryFrom<String> for TariffCode {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_tariff(&value)?;

		Ok(Self(value))
	}
}
impl Borrow<str> for TariffCode {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl Debug for TariffCode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Tariff({})", self.0)
	}
}
impl Display for TariffCode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for TariffCode {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

/// Single-letter provider region (grid supply point group), e.g. `C`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegionCode(String);
impl RegionCode {
	/// Region used by callers when the user has not entered a postcode.
	pub const DEFAULT: &'static str = "H";

	/// Creates a new region code after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		validate_region(view)?;

		Ok(Self(view.to_owned()))
	}

	/// Returns the caller-side fallback region.
	pub fn fallback() -> Self {
		Self(Self::DEFAULT.to_owned())
	}

	/// Derives a region from a supply point `group_id` such as `_C`.
	pub fn from_group_id(group_id: &str) -> Result<Self, IdentifierError> {
		let stripped: String = group_id.chars().filter(|c| *c != '_').collect();

		Self::new(stripped.trim())
	}
}
impl Deref for RegionCode {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for RegionCode {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<RegionCode> for String {
	fn from(value: RegionCode) -> Self {
		value.0
	}
}
impl TryFrom<String> for RegionCode {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_region(&value)?;

		Ok(Self(value))
	}
}
impl Debug for RegionCode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Region({})", self.0)
	}
}
impl Display for RegionCode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

fn validate_tariff(view: &str) -> Result<(), IdentifierError> {
	validate_view("Tariff", view)?;

	match view.rsplit_once('-') {
		Some((head, tail)) if !head.is_empty() && is_region_letter(tail) => Ok(()),
		_ => Err(IdentifierError::MissingRegion { value: view.to_owned() }),
	}
}

fn validate_region(view: &str) -> Result<(), IdentifierError> {
	validate_view("Region", view)?;

	if is_region_letter(view) {
		Ok(())
	} else {
		Err(IdentifierError::InvalidRegion { value: view.to_owned() })
	}
}

fn is_region_letter(view: &str) -> bool {
	let mut chars = view.chars();

	matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_uppercase())
}
