use super::*;
use serial_test::serial;
use std::env;

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

fn clear_subswap_env() {
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    unsafe {
        env::remove_var("SUBSWAP_PORT");
        env::remove_var("SUBSWAP_BIND_ADDR");
        env::remove_var("SUBSWAP_QDRANT_URL");
        env::remove_var("SUBSWAP_MYSQL_URL");
        env::remove_var("SUBSWAP_EMBED_URL");
        env::remove_var("SUBSWAP_EMBED_MODEL");
        env::remove_var("SUBSWAP_EMBED_DIM");
        env::remove_var("SUBSWAP_RANK_MODEL");
        env::remove_var("SUBSWAP_RESULT_TTL_SECS");
        env::remove_var("SUBSWAP_CANDIDATE_TTL_SECS");
        env::remove_var("SUBSWAP_RATE_LIMIT");
        env::remove_var("SUBSWAP_TOP_K_VECTOR");
        env::remove_var("SUBSWAP_TOP_K_FINAL");
        env::remove_var("SUBSWAP_TIMEOUT_SECS");
        env::remove_var("SUBSWAP_INITIAL_COLLECTION");
    }
}

const MYSQL_URL: (&str, &str) = ("SUBSWAP_MYSQL_URL", "mysql://root@localhost:3306/catalog");

#[test]
#[serial]
fn test_defaults() {
    clear_subswap_env();
    let config = with_env_vars(&[MYSQL_URL], Config::from_env).unwrap();

    assert_eq!(config.port, 8080);
    assert_eq!(config.qdrant_url, DEFAULT_QDRANT_URL);
    assert_eq!(config.rate_limit, 25);
    assert_eq!(config.top_k_vector, 20);
    assert_eq!(config.top_k_final, 5);
    assert_eq!(config.result_ttl, Duration::from_secs(3_600));
    assert_eq!(config.candidate_ttl, Duration::from_secs(1_800));
    assert_eq!(config.initial_collection, None);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_mysql_url_is_required() {
    clear_subswap_env();
    let err = Config::from_env().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::MissingEnvVar {
            name: "SUBSWAP_MYSQL_URL"
        }
    ));
}

#[test]
#[serial]
fn test_env_overrides() {
    clear_subswap_env();
    let config = with_env_vars(
        &[
            MYSQL_URL,
            ("SUBSWAP_PORT", "9000"),
            ("SUBSWAP_RATE_LIMIT", "3"),
            ("SUBSWAP_RESULT_TTL_SECS", "0"),
            ("SUBSWAP_TOP_K_VECTOR", "50"),
            ("SUBSWAP_TOP_K_FINAL", "10"),
            ("SUBSWAP_INITIAL_COLLECTION", "products_boot"),
        ],
        Config::from_env,
    )
    .unwrap();

    assert_eq!(config.port, 9000);
    assert_eq!(config.rate_limit, 3);
    assert_eq!(config.result_ttl, Duration::ZERO);
    assert_eq!(config.top_k_vector, 50);
    assert_eq!(config.top_k_final, 10);
    assert_eq!(config.initial_collection.as_deref(), Some("products_boot"));
}

#[test]
#[serial]
fn test_invalid_port_rejected() {
    clear_subswap_env();
    let result = with_env_vars(&[MYSQL_URL, ("SUBSWAP_PORT", "0")], Config::from_env);
    assert!(matches!(result, Err(ConfigError::InvalidPort { .. })));

    let result = with_env_vars(&[MYSQL_URL, ("SUBSWAP_PORT", "nope")], Config::from_env);
    assert!(matches!(result, Err(ConfigError::PortParseError { .. })));
}

#[test]
#[serial]
fn test_validate_rejects_inconsistent_top_k() {
    clear_subswap_env();
    let mut config = with_env_vars(&[MYSQL_URL], Config::from_env).unwrap();
    config.top_k_final = 50;
    config.top_k_vector = 20;
    assert!(config.validate().is_err());
}

#[test]
#[serial]
fn test_validate_rejects_zero_rate_limit() {
    clear_subswap_env();
    let mut config = with_env_vars(&[MYSQL_URL], Config::from_env).unwrap();
    config.rate_limit = 0;
    assert!(config.validate().is_err());
}

#[test]
#[serial]
fn test_socket_addr_format() {
    clear_subswap_env();
    let config = with_env_vars(&[MYSQL_URL], Config::from_env).unwrap();
    assert_eq!(config.socket_addr(), "127.0.0.1:8080");
}
