// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Password acquisition for `glucolink login`.

use std::io::IsTerminal;

use glucolink_core::GlucolinkError;
use secrecy::SecretString;

/// Environment variable consulted when `--password` is not given.
pub const PASSWORD_ENV_VAR: &str = "LIBRELINKUP_PASSWORD";

/// Resolves the login password.
///
/// Priority: the `--password` flag, then `LIBRELINKUP_PASSWORD`, then an
/// interactive prompt when stdin is a terminal.
pub fn login_password(flag: Option<String>) -> Result<SecretString, GlucolinkError> {
    if let Some(password) = flag.filter(|p| !p.is_empty()) {
        return Ok(SecretString::from(password));
    }

    if let Ok(password) = std::env::var(PASSWORD_ENV_VAR)
        && !password.is_empty()
    {
        return Ok(SecretString::from(password));
    }

    if std::io::stdin().is_terminal() {
        eprint!("Password: ");
        let password = rpassword::read_password()
            .map_err(|e| GlucolinkError::Internal(format!("failed to read password: {e}")))?;
        if password.is_empty() {
            return Err(GlucolinkError::Config("empty password not allowed".into()));
        }
        return Ok(SecretString::from(password));
    }

    Err(GlucolinkError::Config(format!(
        "no password provided. Pass --password, set {PASSWORD_ENV_VAR}, or run interactively"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;

    #[test]
    #[serial]
    fn flag_wins_over_environment() {
        // SAFETY: serialized with the other env-mutating tests.
        unsafe { std::env::set_var(PASSWORD_ENV_VAR, "from-env") };
        let password = login_password(Some("from-flag".into())).unwrap();
        assert_eq!(password.expose_secret(), "from-flag");
        unsafe { std::env::remove_var(PASSWORD_ENV_VAR) };
    }

    #[test]
    #[serial]
    fn environment_is_used_without_flag() {
        // SAFETY: serialized with the other env-mutating tests.
        unsafe { std::env::set_var(PASSWORD_ENV_VAR, "from-env") };
        let password = login_password(None).unwrap();
        assert_eq!(password.expose_secret(), "from-env");
        unsafe { std::env::remove_var(PASSWORD_ENV_VAR) };
    }

    #[test]
    #[serial]
    fn empty_flag_falls_through_to_environment() {
        // SAFETY: serialized with the other env-mutating tests.
        unsafe { std::env::set_var(PASSWORD_ENV_VAR, "from-env") };
        let password = login_password(Some(String::new())).unwrap();
        assert_eq!(password.expose_secret(), "from-env");
        unsafe { std::env::remove_var(PASSWORD_ENV_VAR) };
    }
}
