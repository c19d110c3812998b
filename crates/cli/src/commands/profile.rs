//! Profile, password and address book.

use shopwire_client::remote::types::{AddressInput, ProfileUpdate};
use shopwire_client::{ClientError, Storefront};

use crate::ProfileAction;
use crate::output;

pub async fn run(storefront: &Storefront, action: ProfileAction) -> Result<(), ClientError> {
    let account = storefront.account();

    match action {
        ProfileAction::Update {
            first_name,
            last_name,
            email,
            phone,
        } => {
            let user = account
                .update_profile(&ProfileUpdate {
                    first_name,
                    last_name,
                    email,
                    phone,
                })
                .await?;
            output::notice("Profile updated successfully.");
            output::user(&user);
        }
        ProfileAction::Password {
            current,
            new,
            confirm,
        } => {
            account.change_password(&current, &new, &confirm).await?;
            output::notice("Password changed successfully.");
        }
        ProfileAction::Addresses => {
            let addresses = account.load_addresses().await?;
            output::addresses(&addresses);
        }
        ProfileAction::AddAddress {
            label,
            street,
            city,
            state,
            zip,
            country,
            default,
        } => {
            let addresses = account
                .add_address(&AddressInput {
                    label,
                    street,
                    city,
                    state,
                    zip_code: zip,
                    country,
                    is_default: default,
                })
                .await?;
            output::notice("Address added.");
            output::addresses(&addresses);
        }
        ProfileAction::DeleteAddress { id } => {
            let addresses = account.delete_address(&id).await?;
            output::notice("Address deleted.");
            output::addresses(&addresses);
        }
    }
    Ok(())
}
