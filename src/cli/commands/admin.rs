//! Bootstrap an admin account

use crate::config::Config;
use crate::state::SharedState;

pub async fn cmd_create_admin(
    config: Config,
    email: &str,
    username: &str,
    password: &str,
) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;

    let user = state
        .accounts
        .bootstrap_admin(email, username, password)
        .await?;

    println!("Created admin '{}' <{}>", user.username, user.email);
    println!("Obtain a token with: POST /api/v1/token");

    Ok(())
}
