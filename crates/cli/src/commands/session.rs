//! Sign in, sign out, registration.

use shopwire_client::remote::types::Registration;
use shopwire_client::session::LOGIN_REQUIRED;
use shopwire_client::{ClientError, Storefront};

use crate::output;

pub async fn login(storefront: &Storefront, email: &str, password: &str) -> Result<(), ClientError> {
    let session = storefront.login(email, password).await?;
    output::notice(&format!("Welcome back, {}!", session.user.first_name));

    let badges = storefront.mirror().badges();
    output::notice(&format!(
        "{} item(s) in cart, {} in wishlist",
        badges.cart, badges.wishlist
    ));
    Ok(())
}

pub fn logout(storefront: &Storefront) {
    storefront.logout();
    output::notice("Logged out.");
}

pub async fn register(storefront: &Storefront, registration: Registration) -> Result<(), ClientError> {
    storefront.account().register(&registration).await?;
    output::notice("Registration successful. Please login.");
    Ok(())
}

pub fn whoami(storefront: &Storefront) -> Result<(), ClientError> {
    let user = storefront
        .session()
        .user()
        .ok_or_else(|| ClientError::validation(LOGIN_REQUIRED))?;
    output::user(&user);
    Ok(())
}
