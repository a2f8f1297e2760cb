//! Process-wide defaults, read once from the environment.
use std::{str::FromStr, sync::LazyLock, time::Duration};

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Wall-clock budget of one scheduling slice.
    pub time_slice: Duration,
    /// Maximum number of instructions executed in one scheduling slice.
    pub step_budget: u32,
    /// Upper bound on the number of values on a stack machine's stack.
    pub max_stack_size: usize,
}

fn parse_value<T>(key: &str, val: &str) -> Option<T>
where
    T: FromStr, <T as FromStr>::Err: std::fmt::Display
{
    match val.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(err) => {
            if !val.is_empty() {
                tracing::warn!("Ignoring env var {key} with value {val}: {err}");
            }
            None
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> T
where
    T: FromStr, <T as FromStr>::Err: std::fmt::Display
{
    std::env::var(key).ok().and_then(|val| parse_value(key, &val)).unwrap_or(default)
}

fn create_config() -> RuntimeConfig {
    RuntimeConfig {
        time_slice: Duration::from_millis(parse_env("ESOLANG_TIME_SLICE_MS", 15)),
        step_budget: parse_env("ESOLANG_STEP_BUDGET", 100_000u32).max(1),
        max_stack_size: parse_env("ESOLANG_MAX_STACK_SIZE", 2_097_152),
    }
}

static CELL: LazyLock<RuntimeConfig> = LazyLock::new(create_config);

pub fn get_config() -> &'static RuntimeConfig {
    &CELL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value::<u64>("K", " 25 "), Some(25));
        assert_eq!(parse_value::<u64>("K", "-1"), None);
        assert_eq!(parse_value::<u32>("K", ""), None);
        assert_eq!(parse_value::<usize>("K", "ten"), None);
    }

    #[test]
    fn test_missing_var_uses_default() {
        assert_eq!(parse_env("ESOLANG_TEST_SURELY_UNSET_VARIABLE", 7u32), 7);
    }
}
