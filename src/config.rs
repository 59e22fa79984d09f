use crate::validate::Rules;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_DATA_PATH: &str = "users.json";
const DEFAULT_PUBLIC_URL: &str = "http://localhost:3000";
const DEFAULT_FORBIDDEN_PROVINCE_TERMS: &str = "省,市,自治区,特别行政区";

/// Runtime configuration, read once at startup from `MINGLE_*` env vars.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: String,
    pub data_path: PathBuf,
    pub public_url: String,
    pub similarity_threshold: f64,
    pub rules: Rules,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let host = env::var("MINGLE_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("MINGLE_PORT").unwrap_or_else(|_| "3000".to_string());
        let data_path =
            PathBuf::from(env::var("MINGLE_DATA_PATH").unwrap_or_else(|_| DEFAULT_DATA_PATH.to_string()));
        let public_url =
            env::var("MINGLE_PUBLIC_URL").unwrap_or_else(|_| DEFAULT_PUBLIC_URL.to_string());

        let defaults = Rules::default();
        let rules = Rules {
            interest_count: parse_var("MINGLE_INTEREST_COUNT", defaults.interest_count)?,
            require_province: parse_var("MINGLE_REQUIRE_PROVINCE", defaults.require_province)?,
            distinct_interests: parse_var(
                "MINGLE_DISTINCT_INTERESTS",
                defaults.distinct_interests,
            )?,
            interest_char_len: parse_optional_var("MINGLE_INTEREST_CHAR_LEN")?,
            case_sensitive_nicknames: parse_var(
                "MINGLE_CASE_SENSITIVE_NICKNAMES",
                defaults.case_sensitive_nicknames,
            )?,
            forbidden_province_terms: split_terms(
                &env::var("MINGLE_FORBIDDEN_PROVINCE_TERMS")
                    .unwrap_or_else(|_| DEFAULT_FORBIDDEN_PROVINCE_TERMS.to_string()),
            ),
        };

        Ok(Config {
            host,
            port,
            data_path,
            public_url,
            similarity_threshold: parse_var("MINGLE_SIMILARITY_THRESHOLD", 0.0)?,
            rules,
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, String> {
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| format!("invalid {name}: {raw:?}")),
        Err(_) => Ok(default),
    }
}

fn parse_optional_var<T: FromStr>(name: &str) -> Result<Option<T>, String> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| format!("invalid {name}: {raw:?}")),
        Err(_) => Ok(None),
    }
}

fn split_terms(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_string)
        .collect()
}
