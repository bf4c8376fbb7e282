//! # urk-vc — Global Passport Credentials
//!
//! - [`credential`]: the W3C-style envelope and its signing input.
//! - [`issuer`]: attempt logging, optional solvency proof, subject
//!   assembly, selective disclosure, Ed25519 signing.
//! - [`verifier`]: trust, schema, signature, revocation, in that order,
//!   then a `VERIFICATION` ledger event.
//!
//! Signing and verification both use the JCS canonical form of the
//! credential without its `proof` member.

pub mod credential;
pub mod disclosure;
pub mod issuer;
pub mod iso20022;
pub mod proof;
pub mod verifier;

pub use credential::{Credential, Evidence, VcError};
pub use disclosure::{apply_disclosure, MANDATORY_FIELDS};
pub use issuer::{CredentialIssuer, IssuanceError, IssuanceRequest, SolvencyRequest};
pub use proof::{Proof, ProofPurpose, ProofType};
pub use verifier::{CredentialVerifier, FailureReason, Rejection, Verdict, VerifiedCredential, VerifyError};
