use serial_test::serial;
use std::{env, panic, time::Duration};
use tutor_gate::{AppConfig, config::Env};

const CONFIG_VARS: [&str; 10] = [
    "APP_ENV",
    "AUTH_API_URL",
    "UPSTREAM_URL",
    "BIND_ADDR",
    "SESSION_JWT_SECRET",
    "SESSION_COOKIE_NAME",
    "SESSION_TIMEOUT_MS",
    "GUARD_INCLUDE_ROOT",
    "MAX_BODY_BYTES",
    "GUARD_DEV_BYPASS",
];

// --- Setup/Teardown Utilities ---

/// Runs `test` with a clean slate of gateway variables and restores them afterwards.
fn run_with_env<T, R>(test: T) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(&str, Option<String>)> = CONFIG_VARS
        .iter()
        .map(|&var| (var, env::var(var).ok()))
        .collect();

    unsafe {
        for var in CONFIG_VARS {
            env::remove_var(var);
        }
    }

    let result = panic::catch_unwind(test);

    for (key, original_value) in originals.into_iter().rev() {
        unsafe {
            match original_value {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }

    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

// --- Tests ---

#[test]
#[serial]
fn test_app_config_local_env_defaults() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("APP_ENV", "local");
        }
        AppConfig::load()
    });

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.auth_api_url, "http://localhost:5000");
    assert_eq!(config.upstream_url, "http://localhost:3000");
    assert_eq!(config.bind_addr, "0.0.0.0:8080");
    assert_eq!(config.session_jwt_secret, None);
    assert_eq!(config.session_cookie_name, "session_token");
    assert_eq!(config.session_timeout, Duration::from_millis(5_000));
    assert!(config.include_root);
    assert!(!config.dev_bypass);
}

#[test]
#[serial]
fn test_app_config_dev_bypass_opt_in() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("GUARD_DEV_BYPASS", "true");
        }
        AppConfig::load()
    });

    // APP_ENV unset defaults to local; the flag alone enables the bypass.
    assert_eq!(config.env, Env::Local);
    assert!(config.dev_bypass);
}

#[test]
#[serial]
fn test_app_config_dev_bypass_off_when_unset() {
    let config = run_with_env(AppConfig::load);

    assert_eq!(config.env, Env::Local);
    assert!(!config.dev_bypass);
}

#[test]
#[serial]
fn test_app_config_dev_bypass_never_in_production() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("APP_ENV", "production");
            env::set_var("AUTH_API_URL", "https://api.example.com");
            env::set_var("UPSTREAM_URL", "http://frontend:3000");
            env::set_var("GUARD_DEV_BYPASS", "true");
        }
        AppConfig::load()
    });

    assert_eq!(config.env, Env::Production);
    assert!(!config.dev_bypass);
}

#[test]
#[serial]
fn test_app_config_production_fail_fast() {
    let result = run_with_env(|| {
        panic::catch_unwind(|| {
            unsafe {
                env::set_var("APP_ENV", "production");
                env::set_var("AUTH_API_URL", "https://api.example.com");
            }
            // UPSTREAM_URL is missing
            AppConfig::load()
        })
    });

    assert!(
        result.is_err(),
        "Production config loading should panic on a missing upstream"
    );
}

#[test]
#[serial]
fn test_app_config_production_values() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("APP_ENV", "production");
            env::set_var("AUTH_API_URL", "https://api.example.com/");
            env::set_var("UPSTREAM_URL", "http://frontend:3000");
            env::set_var("SESSION_JWT_SECRET", "prod-secret");
            env::set_var("SESSION_TIMEOUT_MS", "1500");
            env::set_var("GUARD_INCLUDE_ROOT", "false");
        }
        AppConfig::load()
    });

    assert_eq!(config.env, Env::Production);
    // Trailing slashes are trimmed so paths can be appended directly.
    assert_eq!(config.auth_api_url, "https://api.example.com");
    assert_eq!(config.upstream_url, "http://frontend:3000");
    assert_eq!(config.session_jwt_secret.as_deref(), Some("prod-secret"));
    assert_eq!(config.session_timeout, Duration::from_millis(1_500));
    assert!(!config.include_root);
}

#[test]
#[serial]
fn test_app_config_ignores_unparseable_numbers() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("SESSION_TIMEOUT_MS", "soon");
            env::set_var("MAX_BODY_BYTES", "-1");
            env::set_var("SESSION_JWT_SECRET", "   ");
        }
        AppConfig::load()
    });

    assert_eq!(config.session_timeout, Duration::from_millis(5_000));
    assert_eq!(config.max_body_bytes, 10 * 1024 * 1024);
    assert_eq!(config.session_jwt_secret, None);
}

#[test]
fn test_app_config_default_is_local() {
    let config = AppConfig::default();
    assert_eq!(config.env, Env::Local);
    assert!(config.include_root);
    assert!(!config.dev_bypass);
}
