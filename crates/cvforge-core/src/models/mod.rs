//! Data models for cvforge accounts.
//!
//! This module contains the structures exchanged with the account service:
//!
//! - `Identity`: the minimal authenticated-user record (`id`, `email`, `plan`)
//! - `Profile`, `ProfileUpdate`: the editable profile and its partial update
//! - Wire payloads for the credential exchange and password recovery endpoints

pub mod auth;
pub mod user;

pub use auth::{AuthPayload, Credentials, ForgotPasswordRequest, MessageResponse, RefreshResponse, ResetPasswordRequest};
pub use user::{Identity, Profile, ProfileUpdate};
