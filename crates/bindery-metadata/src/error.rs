use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum IdentityParseError {
    #[error("assembly display name has no simple name")]
    #[diagnostic(code(metadata::identity::empty_name))]
    EmptyName,
    #[error("invalid assembly version `{0}`")]
    #[diagnostic(
        code(metadata::identity::version),
        help("versions have up to four dot separated parts, each at most 65535")
    )]
    InvalidVersion(String),
    #[error("invalid public key token `{0}`")]
    #[diagnostic(
        code(metadata::identity::public_key_token),
        help("public key tokens are 16 hex digits or `null`")
    )]
    InvalidPublicKeyToken(String),
    #[error("unknown assembly name property `{0}`")]
    #[diagnostic(code(metadata::identity::property))]
    UnknownProperty(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum MetadataError {
    #[error("metadata file `{0}` not found")]
    #[diagnostic(code(metadata::not_found))]
    NotFound(Utf8PathBuf),
    #[error("metadata file `{path}` is corrupt: {reason}")]
    #[diagnostic(code(metadata::corrupt))]
    Corrupt { path: Utf8PathBuf, reason: String },
}
