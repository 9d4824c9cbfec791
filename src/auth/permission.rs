//! Permission set modeling shared by accounts and token claims.

// std
use std::{collections::BTreeSet, slice::Iter};
// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError, ser::SerializeSeq};
// self
use crate::_prelude::*;

/// Errors emitted when validating permissions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum PermissionError {
	/// Empty permission entries are not allowed.
	#[error("Permission entries cannot be empty.")]
	Empty,
	/// Permissions cannot contain embedded whitespace characters.
	#[error("Permission contains whitespace: {permission}.")]
	ContainsWhitespace {
		/// The offending permission string.
		permission: String,
	},
}

/// Normalized set of permission strings.
///
/// Entries are deduplicated and sorted so claims minted from the same account always
/// serialize identically.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PermissionSet(Arc<[String]>);
impl PermissionSet {
	/// Creates a normalized permission set from any iterator.
	pub fn new<I, S>(permissions: I) -> Result<Self, PermissionError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		normalize(permissions).map(Self)
	}

	/// Number of distinct permissions.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no permissions are granted.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if the set grants the provided permission.
	pub fn contains(&self, permission: &str) -> bool {
		self.0.binary_search_by(|candidate| candidate.as_str().cmp(permission)).is_ok()
	}

	/// Iterator over normalized permissions.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(|s| s.as_str())
	}

	/// Returns the underlying slice of permission strings.
	pub fn as_slice(&self) -> &[String] {
		&self.0
	}
}
impl Debug for PermissionSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("PermissionSet").field(&self.0).finish()
	}
}
impl Display for PermissionSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0.join(" "))
	}
}

/// Iterator over permission strings.
pub struct PermissionIter<'a> {
	inner: Iter<'a, String>,
}
impl<'a> Iterator for PermissionIter<'a> {
	type Item = &'a str;

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next().map(|s| s.as_str())
	}
}
impl<'a> IntoIterator for &'a PermissionSet {
	type IntoIter = PermissionIter<'a>;
	type Item = &'a str;

	fn into_iter(self) -> Self::IntoIter {
		PermissionIter { inner: self.0.iter() }
	}
}
impl TryFrom<Vec<String>> for PermissionSet {
	type Error = PermissionError;

	fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl Serialize for PermissionSet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut seq = serializer.serialize_seq(Some(self.0.len()))?;

		for permission in self.0.iter() {
			seq.serialize_element(permission)?;
		}

		seq.end()
	}
}
impl<'de> Deserialize<'de> for PermissionSet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let values = <Vec<String>>::deserialize(deserializer)?;

		PermissionSet::new(values).map_err(DeError::custom)
	}
}

fn normalize<I, S>(permissions: I) -> Result<Arc<[String]>, PermissionError>
where
	I: IntoIterator<Item = S>,
	S: Into<String>,
{
	let mut set = BTreeSet::new();

	for permission in permissions {
		let owned: String = permission.into();

		if owned.is_empty() {
			return Err(PermissionError::Empty);
		}
		if owned.chars().any(char::is_whitespace) {
			return Err(PermissionError::ContainsWhitespace { permission: owned });
		}

		set.insert(owned);
	}

	Ok(Arc::from(set.into_iter().collect::<Vec<_>>()))
}
