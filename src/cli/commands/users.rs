use rand::Rng;
use rand::distr::Alphanumeric;

use crate::config::Config;
use crate::domain::{Actor, Role};
use crate::models::user::NewUser;
use crate::state::SharedState;

pub async fn cmd_create_user(
    config: Config,
    email: String,
    role: Role,
    display_name: Option<String>,
    password: Option<String>,
) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;

    let generated = password.is_none();
    let password = password.unwrap_or_else(random_password);

    let user = state
        .auth_service
        .create_user(
            NewUser {
                email,
                display_name,
                password: password.clone(),
                role,
            },
            &Actor::system("cli"),
        )
        .await?;

    println!("Created {} user {} (ID: {})", user.role, user.email, user.id);
    if generated {
        println!("Generated password: {password}");
    }
    println!("API key: {}", user.api_key);

    Ok(())
}

fn random_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(20)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_password_shape() {
        let password = random_password();
        assert_eq!(password.len(), 20);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
