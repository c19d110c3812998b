//! Account operations on the auth service.
//!
//! Registration, profile edits, password changes and the address book. Every
//! change that the server accepts is written back into the session's user
//! and the durable snapshot.

use serde::Serialize;
use tracing::{info, instrument};

use shopwire_core::{AddressId, Email};

use crate::error::{ClientError, Result};
use crate::remote::types::{Address, AddressInput, ProfileUpdate, Registration, User};
use crate::remote::{Gateway, Service};
use crate::session::SessionStore;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordChange<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

/// Account service bound to a gateway and a session.
pub struct Account<'a> {
    gateway: &'a Gateway,
    session: &'a SessionStore,
}

impl<'a> Account<'a> {
    #[must_use]
    pub const fn new(gateway: &'a Gateway, session: &'a SessionStore) -> Self {
        Self { gateway, session }
    }

    /// Create an account. Does not sign in.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a malformed email or missing fields, otherwise
    /// whatever the auth service reports.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<()> {
        let email = Email::parse(&registration.email)?;
        if registration.first_name.trim().is_empty() || registration.last_name.trim().is_empty() {
            return Err(ClientError::validation("First and last name are required"));
        }
        if registration.password.is_empty() {
            return Err(ClientError::validation("Password is required"));
        }

        let body = Registration {
            email: email.into_inner(),
            ..registration.clone()
        };
        self.gateway
            .post::<serde_json::Value, _>(self.gateway.url(Service::Auth, &["register"]), &body)
            .await?;

        info!("Account registered");
        Ok(())
    }

    /// Update name, email and phone, then merge them into the cached user.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when signed out or the email is malformed.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
        self.session.require()?;
        let email = Email::parse(&update.email)?;
        let body = ProfileUpdate {
            email: email.into_inner(),
            ..update.clone()
        };

        self.gateway
            .put::<serde_json::Value, _>(self.gateway.url(Service::Auth, &["profile"]), &body)
            .await?;

        let user = self
            .session
            .update_user(|user| {
                user.first_name.clone_from(&body.first_name);
                user.last_name.clone_from(&body.last_name);
                user.email.clone_from(&body.email);
                user.phone = Some(body.phone.clone()).filter(|p| !p.is_empty());
            })
            .ok_or_else(|| ClientError::validation(crate::session::LOGIN_REQUIRED))?;

        info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }

    /// Change the password.
    ///
    /// # Errors
    ///
    /// Returns `Validation` before any request if the new password is empty
    /// or differs from its confirmation.
    #[instrument(skip_all)]
    pub async fn change_password(&self, current: &str, new: &str, confirm: &str) -> Result<()> {
        self.session.require()?;
        if new.is_empty() {
            return Err(ClientError::validation("New password is required"));
        }
        if new != confirm {
            return Err(ClientError::validation("Passwords do not match"));
        }

        let body = PasswordChange {
            current_password: current,
            new_password: new,
        };
        self.gateway
            .put::<serde_json::Value, _>(
                self.gateway.url(Service::Auth, &["change-password"]),
                &body,
            )
            .await?;

        info!("Password changed");
        Ok(())
    }

    /// Fetch the address book and replace the cached one.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when signed out, otherwise gateway errors.
    #[instrument(skip(self))]
    pub async fn load_addresses(&self) -> Result<Vec<Address>> {
        self.session.require()?;
        let addresses = self
            .gateway
            .get::<Vec<Address>>(self.gateway.url(Service::Auth, &["addresses"]))
            .await?
            .data
            .unwrap_or_default();

        Ok(self.replace_addresses(addresses))
    }

    /// Add an address; the returned list replaces the cached one.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if any field is blank.
    #[instrument(skip(self, input), fields(label = %input.label))]
    pub async fn add_address(&self, input: &AddressInput) -> Result<Vec<Address>> {
        self.session.require()?;
        let fields = [
            &input.label,
            &input.street,
            &input.city,
            &input.state,
            &input.zip_code,
            &input.country,
        ];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(ClientError::validation("Please fill in all address fields"));
        }

        let addresses = self
            .gateway
            .post::<Vec<Address>, _>(self.gateway.url(Service::Auth, &["addresses"]), input)
            .await?
            .into_data()?;

        Ok(self.replace_addresses(addresses))
    }

    /// Delete an address; the returned list replaces the cached one.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when signed out, otherwise gateway errors.
    #[instrument(skip(self), fields(address_id = %id))]
    pub async fn delete_address(&self, id: &AddressId) -> Result<Vec<Address>> {
        self.session.require()?;
        let addresses = self
            .gateway
            .delete::<Vec<Address>>(self.gateway.url(Service::Auth, &["addresses", id.as_str()]))
            .await?
            .data
            .unwrap_or_default();

        Ok(self.replace_addresses(addresses))
    }

    fn replace_addresses(&self, addresses: Vec<Address>) -> Vec<Address> {
        self.session
            .update_user(|user| user.addresses.clone_from(&addresses));
        addresses
    }
}
