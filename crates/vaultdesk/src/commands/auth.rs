//! Auth command handlers.

use secrecy::SecretString;
use vaultdesk_core::password::{confirm_password, validate_password};
use vaultdesk_core::{AuthCredentials, Backoffice, BackofficeConfig, CoreError, Identity};

use crate::cli::{AuthArgs, AuthCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Detail view ─────────────────────────────────────────────────────

fn identity_detail(identity: &Identity, color: bool) -> String {
    let mut lines = vec![
        output::detail_line("ID", identity.id.as_deref().unwrap_or("-"), color),
        output::detail_line("Username", identity.username.as_deref().unwrap_or("-"), color),
        output::detail_line("Name", identity.name.as_deref().unwrap_or("-"), color),
        output::detail_line("Email", identity.email.as_deref().unwrap_or("-"), color),
    ];
    if let Some(ref role) = identity.role {
        lines.push(output::detail_line(
            "Role",
            role.name.as_deref().unwrap_or("-"),
            color,
        ));
        let permissions: Vec<&str> = role.permissions.iter().map(String::as_str).collect();
        lines.push(output::detail_line(
            "Permissions",
            &if permissions.is_empty() {
                "-".to_owned()
            } else {
                permissions.join(", ")
            },
            color,
        ));
    }
    lines.join("\n")
}

fn print_identity(identity: &Identity, global: &GlobalOpts) {
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        identity,
        |i| identity_detail(i, color),
        |i| i.username.clone().unwrap_or_default(),
    );
    output::print_output(&out, global.quiet);
}

fn require_credentials(config: &BackofficeConfig) -> Result<(), CliError> {
    match config.auth {
        AuthCredentials::Credentials { .. } => Ok(()),
        AuthCredentials::Anonymous => Err(CliError::AuthFailed {
            message: "no username configured; pass --username or set VAULTDESK_USERNAME".into(),
        }),
    }
}

/// Prompt for a new password twice and check it against the password rules.
fn prompt_new_password() -> Result<SecretString, CliError> {
    let prompt_err = |e: std::io::Error| CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    };
    let password = rpassword::prompt_password("New password: ").map_err(prompt_err)?;
    let violations = validate_password(&password);
    if !violations.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: violations.join("; "),
        });
    }

    let confirmation = rpassword::prompt_password("Confirm password: ").map_err(prompt_err)?;
    if let Some(mismatch) = confirm_password(&password, &confirmation).first() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: (*mismatch).to_owned(),
        });
    }
    Ok(SecretString::from(password))
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    config: BackofficeConfig,
    args: &AuthArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        AuthCommand::Signin => {
            require_credentials(&config)?;
            let identity = Backoffice::oneshot(config, |bo| async move {
                bo.identity()
                    .map(|i| Identity::clone(&i))
                    .ok_or_else(|| CoreError::AuthenticationFailed {
                        message: "sign-in returned no identity".into(),
                    })
            })
            .await?;
            print_identity(&identity, global);
            if !global.quiet {
                eprintln!("Credentials verified");
            }
            Ok(())
        }

        AuthCommand::Signout => {
            require_credentials(&config)?;
            let bo = Backoffice::new(config)?;
            bo.connect().await?;
            bo.disconnect().await;
            if !global.quiet {
                eprintln!("Signed out");
            }
            Ok(())
        }

        AuthCommand::Me => {
            let identity = Backoffice::oneshot(config, |bo| async move { bo.me().await }).await?;
            print_identity(&identity, global);
            Ok(())
        }

        AuthCommand::Refresh => {
            let identity =
                Backoffice::oneshot(config, |bo| async move { bo.refresh().await }).await?;
            print_identity(&identity, global);
            Ok(())
        }

        AuthCommand::RequestPassword { ref email } => {
            let bo = Backoffice::new(config)?;
            bo.request_password(email).await?;
            if !global.quiet {
                eprintln!("Password reset code sent to {email}");
            }
            Ok(())
        }

        AuthCommand::ResetPassword { ref code } => {
            let password = prompt_new_password()?;
            let bo = Backoffice::new(config)?;
            bo.reset_password(code, &password).await?;
            if !global.quiet {
                eprintln!("Password updated");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use vaultdesk_core::Role;

    use super::*;

    #[test]
    fn detail_lists_role_permissions() {
        let identity = Identity {
            id: Some("u1".into()),
            username: Some("ana".into()),
            name: Some("Ana".into()),
            email: None,
            role: Some(Role {
                id: Some("r1".into()),
                name: Some("admin".into()),
                permissions: BTreeSet::from(["banks:read".to_owned(), "users:read".to_owned()]),
            }),
        };
        let text = identity_detail(&identity, false);
        assert!(text.contains("banks:read, users:read"));
        assert!(text.contains("Email  -"));
    }
}
