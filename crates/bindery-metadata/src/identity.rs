use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use ecow::EcoString;
use serde::{Deserialize, Serialize};

use crate::error::IdentityParseError;

/// Four part assembly version, ordered component-wise.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
    pub build: u16,
    pub revision: u16,
}

impl Version {
    pub const ZERO: Self = Self::new(0, 0, 0, 0);

    pub const fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            major,
            minor,
            build,
            revision,
        } = self;
        write!(f, "{major}.{minor}.{build}.{revision}")
    }
}

impl FromStr for Version {
    type Err = IdentityParseError;

    /// Missing trailing parts default to zero, so `2.1` reads as `2.1.0.0`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || IdentityParseError::InvalidVersion(s.to_owned());

        let mut parts = [0u16; 4];
        let mut count = 0;

        for part in s.trim().split('.') {
            let slot = parts.get_mut(count).ok_or_else(invalid)?;
            *slot = part.trim().parse().map_err(|_| invalid())?;
            count += 1;
        }

        let [major, minor, build, revision] = parts;
        Ok(Self::new(major, minor, build, revision))
    }
}

/// Last eight bytes of the hash of a strong name public key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PublicKeyToken([u8; 8]);

impl PublicKeyToken {
    pub const fn new(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl fmt::Display for PublicKeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for PublicKeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKeyToken({self})")
    }
}

impl FromStr for PublicKeyToken {
    type Err = IdentityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || IdentityParseError::InvalidPublicKeyToken(s.to_owned());

        let s = s.trim();
        if s.len() != 16 || !s.is_ascii() {
            return Err(invalid());
        }

        let mut bytes = [0u8; 8];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        }
        Ok(Self(bytes))
    }
}

/// The name an assembly is known by: simple name, version, culture and the
/// public key token of strong named assemblies.
///
/// Equality ignores case in the simple name and culture, everything else is
/// compared exactly. The coarser relations used during binding are
/// [`name_eq`](Self::name_eq), [`version_eq`](Self::version_eq) and
/// [`unifies_with`](Self::unifies_with).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyIdentity {
    name: EcoString,
    version: Version,
    culture: Option<EcoString>,
    public_key_token: Option<PublicKeyToken>,
    retargetable: bool,
}

impl AssemblyIdentity {
    pub fn new(name: impl Into<EcoString>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
            culture: None,
            public_key_token: None,
            retargetable: false,
        }
    }

    /// `neutral` and the empty string both mean "no culture".
    pub fn with_culture(mut self, culture: impl Into<EcoString>) -> Self {
        let culture = culture.into();
        self.culture = if culture.is_empty() || culture.eq_ignore_ascii_case("neutral") {
            None
        } else {
            Some(culture)
        };
        self
    }

    pub fn with_public_key_token(mut self, token: PublicKeyToken) -> Self {
        self.public_key_token = Some(token);
        self
    }

    pub fn with_retargetable(mut self, retargetable: bool) -> Self {
        self.retargetable = retargetable;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn culture(&self) -> Option<&str> {
        self.culture.as_deref()
    }

    pub fn public_key_token(&self) -> Option<PublicKeyToken> {
        self.public_key_token
    }

    pub fn is_retargetable(&self) -> bool {
        self.retargetable
    }

    pub fn is_strong_name(&self) -> bool {
        self.public_key_token.is_some()
    }

    /// Same simple name, ignoring case.
    pub fn name_eq(&self, other: &Self) -> bool {
        eq_ignore_case(&self.name, &other.name)
    }

    /// Same simple name and version.
    pub fn version_eq(&self, other: &Self) -> bool {
        self.name_eq(other) && self.version == other.version
    }

    /// Whether a reference to `self` may bind to an assembly named `other`
    /// when versions are allowed to differ.
    ///
    /// Cultures must match. Public key tokens must match unless either side
    /// is retargetable.
    pub fn unifies_with(&self, other: &Self) -> bool {
        self.name_eq(other)
            && self.culture_eq(other)
            && (self.public_key_token == other.public_key_token
                || self.retargetable
                || other.retargetable)
    }

    fn culture_eq(&self, other: &Self) -> bool {
        match (&self.culture, &other.culture) {
            (None, None) => true,
            (Some(a), Some(b)) => eq_ignore_case(a, b),
            _ => false,
        }
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

impl PartialEq for AssemblyIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.version_eq(other)
            && self.culture_eq(other)
            && self.public_key_token == other.public_key_token
            && self.retargetable == other.retargetable
    }
}

impl Eq for AssemblyIdentity {}

impl Hash for AssemblyIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for c in self.name.chars().flat_map(char::to_lowercase) {
            c.hash(state);
        }
        self.version.hash(state);
        if let Some(culture) = &self.culture {
            for c in culture.chars().flat_map(char::to_lowercase) {
                c.hash(state);
            }
        }
        self.public_key_token.hash(state);
        self.retargetable.hash(state);
    }
}

impl fmt::Display for AssemblyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, Version={}, Culture={}, PublicKeyToken=",
            self.name,
            self.version,
            self.culture.as_deref().unwrap_or("neutral")
        )?;

        match self.public_key_token {
            Some(token) => write!(f, "{token}")?,
            None => write!(f, "null")?,
        }

        if self.retargetable {
            write!(f, ", Retargetable=Yes")?;
        }

        Ok(())
    }
}

impl FromStr for AssemblyIdentity {
    type Err = IdentityParseError;

    /// Parses a display name such as
    /// `Lib, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',');

        let name = parts.next().map(str::trim).unwrap_or_default();
        if name.is_empty() {
            return Err(IdentityParseError::EmptyName);
        }

        let mut identity = AssemblyIdentity::new(name, Version::ZERO);

        for part in parts {
            let Some((key, value)) = part.split_once('=') else {
                return Err(IdentityParseError::UnknownProperty(part.trim().to_owned()));
            };
            let value = value.trim();

            match key.trim().to_ascii_lowercase().as_str() {
                "version" => identity.version = value.parse()?,
                "culture" => identity = identity.with_culture(value),
                "publickeytoken" if value.eq_ignore_ascii_case("null") => {
                    identity.public_key_token = None
                }
                "publickeytoken" => identity.public_key_token = Some(value.parse()?),
                "retargetable" => identity.retargetable = value.eq_ignore_ascii_case("yes"),
                other => return Err(IdentityParseError::UnknownProperty(other.to_owned())),
            }
        }

        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lib(version: Version) -> AssemblyIdentity {
        AssemblyIdentity::new("MTTestLib1", version)
    }

    #[test]
    fn versions_order_component_wise() {
        assert!(Version::new(1, 0, 0, 0) < Version::new(1, 0, 0, 1));
        assert!(Version::new(2, 0, 0, 0) > Version::new(1, 9, 9, 9));
        assert_eq!("3.1".parse::<Version>(), Ok(Version::new(3, 1, 0, 0)));
        assert!("1.2.3.4.5".parse::<Version>().is_err());
        assert!("1.x".parse::<Version>().is_err());
    }

    #[test]
    fn names_compare_case_insensitively() {
        let lower = AssemblyIdentity::new("mscorlib", Version::new(4, 0, 0, 0));
        let upper = AssemblyIdentity::new("MSCORLIB", Version::new(4, 0, 0, 0));

        assert!(lower.name_eq(&upper));
        assert_eq!(lower, upper);
    }

    #[test]
    fn version_eq_requires_same_version() {
        let v1 = lib(Version::new(1, 0, 0, 0));
        let v2 = lib(Version::new(2, 0, 0, 0));

        assert!(v1.name_eq(&v2));
        assert!(!v1.version_eq(&v2));
        assert!(v1.unifies_with(&v2));
        assert_ne!(v1, v2);
    }

    #[test]
    fn culture_and_key_block_unification() {
        let neutral = lib(Version::new(1, 0, 0, 0));
        let german = neutral.clone().with_culture("de-DE");
        let signed = neutral
            .clone()
            .with_public_key_token(PublicKeyToken::new([0xb7, 0x7a, 0x5c, 0x56, 0x19, 0x34, 0xe0, 0x89]));

        assert!(!neutral.unifies_with(&german));
        assert!(!neutral.unifies_with(&signed));
        assert!(neutral.with_retargetable(true).unifies_with(&signed));
    }

    #[test]
    fn display_name_roundtrips() {
        let text = "mscorlib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089";
        let identity: AssemblyIdentity = text.parse().unwrap();

        assert_eq!(identity.name(), "mscorlib");
        assert_eq!(identity.version(), Version::new(4, 0, 0, 0));
        assert_eq!(identity.culture(), None);
        assert!(identity.is_strong_name());
        assert_eq!(identity.to_string(), text);
    }

    #[test]
    fn display_name_errors() {
        assert_eq!(
            "".parse::<AssemblyIdentity>(),
            Err(IdentityParseError::EmptyName)
        );
        assert_eq!(
            "Lib, Flavor=Sweet".parse::<AssemblyIdentity>(),
            Err(IdentityParseError::UnknownProperty("flavor".to_owned()))
        );
        assert!(matches!(
            "Lib, PublicKeyToken=123".parse::<AssemblyIdentity>(),
            Err(IdentityParseError::InvalidPublicKeyToken(_))
        ));
    }
}
