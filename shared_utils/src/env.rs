use thiserror::Error;

/// None of the accepted names for a required environment variable is set.
#[derive(Debug, Error)]
#[error("Missing environment variable: {}", .0.join(" | "))]
pub struct MissingEnvVarError(pub Vec<String>);

/// Reads an environment variable, returning a structured error if it's missing
/// or empty.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, MissingEnvVarError> {
    get_first_env_var(&[name])
}

/// Reads the first of several alias names that is set to a non-empty value.
///
/// Useful when a credential is known under more than one name, e.g. `API_KEY`
/// in a dotenv file and `APCA_API_KEY_ID` in a CI environment.
pub fn get_first_env_var(names: &[&str]) -> Result<String, MissingEnvVarError> {
    names
        .iter()
        .find_map(|name| std::env::var(name).ok().filter(|v| !v.trim().is_empty()))
        .ok_or_else(|| MissingEnvVarError(names.iter().map(|n| n.to_string()).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_variable_lists_every_alias() {
        let err = get_first_env_var(&["SHARED_UTILS_TEST_NOPE_A", "SHARED_UTILS_TEST_NOPE_B"])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing environment variable: SHARED_UTILS_TEST_NOPE_A | SHARED_UTILS_TEST_NOPE_B"
        );
    }

    #[test]
    fn path_is_always_present() {
        // PATH is set in every test environment we run in.
        assert!(get_first_env_var(&["SHARED_UTILS_TEST_NOPE", "PATH"]).is_ok());
    }
}
