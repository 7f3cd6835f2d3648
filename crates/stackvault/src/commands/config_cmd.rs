//! Config subcommand handlers.

use std::str::FromStr;

use dialoguer::{Confirm, Input, Select};

use stackvault_config::{api_key_entry, backup_password_entry, store_secret};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Defaults, Profile};
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of `cfg` with every plaintext secret masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.api_key.is_some() {
            profile.api_key = Some(REDACTED.into());
        }
        if profile.backup_password.is_some() {
            profile.backup_password = Some(REDACTED.into());
        }
    }
    cfg
}

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let d = &cfg.defaults;
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", d.output);
    let _ = writeln!(out, "color = \"{}\"", d.color);
    let _ = writeln!(out, "insecure = {}", d.insecure);
    let _ = writeln!(out, "timeout = {}", d.timeout);
    let _ = writeln!(out, "connect_timeout = {}", d.connect_timeout);
    let _ = writeln!(out, "retries = {}", d.retries);
    let _ = writeln!(out, "retry_delay = {}", d.retry_delay);
    let _ = writeln!(out, "retention_days = {}", d.retention_days);
    let _ = write!(out, "concurrency = {}", d.concurrency);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out);
        let _ = write!(out, "[profiles.{name}]\nurl = \"{}\"", p.url);

        let mut line = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                let _ = write!(out, "\n{key} = {value}");
            }
        };
        let quoted = |s: &String| format!("\"{s}\"");
        let masked = format!("\"{REDACTED}\"");
        line("api_key", p.api_key.as_ref().map(|_| masked.clone()));
        line("api_key_env", p.api_key_env.as_ref().map(quoted));
        line(
            "backup_password",
            p.backup_password.as_ref().map(|_| masked.clone()),
        );
        line("backup_password_env", p.backup_password_env.as_ref().map(quoted));
        line("ca_cert", p.ca_cert.as_ref().map(|c| format!("\"{}\"", c.display())));
        line("insecure", p.insecure.map(|v| v.to_string()));
        line(
            "output_dir",
            p.output_dir.as_ref().map(|o| format!("\"{}\"", o.display())),
        );
        line("timeout", p.timeout.map(|v| v.to_string()));
        line("connect_timeout", p.connect_timeout.map(|v| v.to_string()));
        line("retries", p.retries.map(|v| v.to_string()));
        line("retry_delay", p.retry_delay.map(|v| v.to_string()));
        line("retry_all_errors", p.retry_all_errors.map(|v| v.to_string()));
        line("cleanup", p.cleanup.map(|v| v.to_string()));
        line("retention_days", p.retention_days.map(|v| v.to_string()));
        line("concurrency", p.concurrency.map(|v| v.to_string()));
        line(
            "require_platform_backup",
            p.require_platform_backup.map(|v| v.to_string()),
        );
    }

    out
}

/// Delegate to the shared config crate's save function.
fn save_config(cfg: &Config) -> Result<(), CliError> {
    config::save_config(cfg)?;
    Ok(())
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str, expected: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: key.into(),
        reason: format!("must be {expected}"),
    })
}

fn profile_not_found(cfg: &Config, name: String) -> CliError {
    CliError::ProfileNotFound {
        name,
        available: config::available_profiles(cfg),
    }
}

/// Offer to store a secret in the system keyring or return it for plaintext config.
///
/// Returns `Some(secret)` if the user chose plaintext, `None` if stored in keyring.
fn prompt_keyring_storage(
    secret: &str,
    entry_name: &str,
    prompt: &str,
    label: &str,
) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt(prompt)
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        store_secret(entry_name, secret)?;
        eprintln!("   ✓ {label} stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(secret.to_owned()))
    }
}

/// Apply `key = value` to a profile.
fn set_profile_value(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    const BOOL: &str = "'true' or 'false'";
    const SECONDS: &str = "a number (seconds)";
    const COUNT: &str = "a whole number";

    match key {
        "url" => {
            url::Url::parse(&value).map_err(|e| CliError::Validation {
                field: "url".into(),
                reason: e.to_string(),
            })?;
            profile.url = value;
        }
        "api_key" | "api-key" => profile.api_key = Some(value),
        "api_key_env" | "api-key-env" => profile.api_key_env = Some(value),
        "backup_password" | "backup-password" => profile.backup_password = Some(value),
        "backup_password_env" | "backup-password-env" => {
            profile.backup_password_env = Some(value);
        }
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "output_dir" | "output-dir" => profile.output_dir = Some(value.into()),
        "insecure" => profile.insecure = Some(parse_value(key, &value, BOOL)?),
        "timeout" => profile.timeout = Some(parse_value(key, &value, SECONDS)?),
        "connect_timeout" | "connect-timeout" => {
            profile.connect_timeout = Some(parse_value(key, &value, SECONDS)?);
        }
        "retries" => profile.retries = Some(parse_value(key, &value, COUNT)?),
        "retry_delay" | "retry-delay" => {
            profile.retry_delay = Some(parse_value(key, &value, SECONDS)?);
        }
        "retry_all_errors" | "retry-all-errors" => {
            profile.retry_all_errors = Some(parse_value(key, &value, BOOL)?);
        }
        "cleanup" => profile.cleanup = Some(parse_value(key, &value, BOOL)?),
        "retention_days" | "retention-days" => {
            let days: u32 = parse_value(key, &value, COUNT)?;
            stackvault_config::retention_policy(days)?;
            profile.retention_days = Some(days);
        }
        "concurrency" => {
            let n: usize = parse_value(key, &value, COUNT)?;
            if n == 0 {
                return Err(CliError::Validation {
                    field: "concurrency".into(),
                    reason: "must be at least 1".into(),
                });
            }
            profile.concurrency = Some(n);
        }
        "require_platform_backup" | "require-platform-backup" => {
            profile.require_platform_backup = Some(parse_value(key, &value, BOOL)?);
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: url, api_key, api_key_env, \
                     backup_password, backup_password_env, ca_cert, output_dir, insecure, \
                     timeout, connect_timeout, retries, retry_delay, retry_all_errors, \
                     cleanup, retention_days, concurrency, require_platform_backup"
                ),
            });
        }
    }
    Ok(())
}

// ── Init wizard ─────────────────────────────────────────────────────

fn init_wizard() -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("stackvault configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    // 1. Profile name
    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    // 2. Platform URL
    let url: String = Input::new()
        .with_prompt("Platform URL")
        .default("https://localhost:9443".into())
        .validate_with(|input: &String| -> Result<(), String> {
            url::Url::parse(input).map(|_| ()).map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(prompt_err)?;

    // 3. API key
    let key = rpassword::prompt_password("API key: ").map_err(prompt_err)?;
    if key.is_empty() {
        return Err(CliError::Validation {
            field: "api_key".into(),
            reason: "API key cannot be empty".into(),
        });
    }
    let api_key = prompt_keyring_storage(
        &key,
        &api_key_entry(&profile_name),
        "Where to store the API key?",
        "API key",
    )?;

    // 4. Export password (optional)
    let password = rpassword::prompt_password("Backup archive password (empty for none): ")
        .map_err(prompt_err)?;
    let backup_password = if password.is_empty() {
        None
    } else {
        prompt_keyring_storage(
            &password,
            &backup_password_entry(&profile_name),
            "Where to store the archive password?",
            "Archive password",
        )?
    };

    // 5. Output directory
    let output_dir: String = Input::new()
        .with_prompt("Backup directory")
        .default(config::default_output_dir().display().to_string())
        .interact_text()
        .map_err(prompt_err)?;

    // 6. Retention
    let cleanup = Confirm::new()
        .with_prompt("Remove old backups after each run?")
        .default(true)
        .interact()
        .map_err(prompt_err)?;
    let retention_days = if cleanup {
        let days: u32 = Input::new()
            .with_prompt("Keep backups for how many days?")
            .default(Defaults::default().retention_days)
            .validate_with(|d: &u32| if *d == 0 { Err("must be at least 1") } else { Ok(()) })
            .interact_text()
            .map_err(prompt_err)?;
        Some(days)
    } else {
        None
    };

    // 7. Build profile and config, keeping other profiles intact
    let profile = Profile {
        url,
        api_key,
        backup_password,
        output_dir: Some(output_dir.into()),
        cleanup: Some(cleanup),
        retention_days,
        ..Profile::default()
    };

    let mut cfg = config::load_config().unwrap_or_default();
    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());

    // 8. Write config
    save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", config_path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: stackvault endpoints list");

    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init_wizard(),

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config()?);
            let out = output::render_single(global.output, &cfg, format_config_redacted, |_| {
                config::config_path().display().to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config()?;
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();

            set_profile_value(profile, &key, value)?;

            save_config(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}'");
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: stackvault config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;
            if !cfg.profiles.contains_key(&name) {
                return Err(profile_not_found(&cfg, name));
            }

            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        // ── SetKey ─────────────────────────────────────────────────
        ConfigCommand::SetKey {
            profile,
            backup_password,
        } => {
            let cfg = config::load_config()?;
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(profile_not_found(&cfg, profile_name));
            }

            let (entry, label) = if backup_password {
                (backup_password_entry(&profile_name), "Archive password: ")
            } else {
                (api_key_entry(&profile_name), "API key: ")
            };
            let secret = rpassword::prompt_password(label).map_err(prompt_err)?;
            if secret.is_empty() {
                return Err(CliError::Validation {
                    field: "secret".into(),
                    reason: "value cannot be empty".into(),
                });
            }
            store_secret(&entry, &secret)?;

            eprintln!("✓ Secret stored in system keyring for profile '{profile_name}'");
            Ok(())
        }

        // ── Path ───────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }
    }
}
